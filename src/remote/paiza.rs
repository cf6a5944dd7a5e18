//! HTTP client for paiza-compatible runner APIs.
//!
//! - `POST {endpoint}/runners/create` with `{source_code, language, input, api_key}`
//! - `GET {endpoint}/runners/get_details?id=..&api_key=..`

use std::time::Duration;

use serde::Serialize;

use super::service::{CreatedJob, ExecutionService, JobStatus, ServiceError};
use super::Language;
use crate::config::RemoteConfig;

/// Per-request timeout; polling itself is bounded by the attempt budget.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct CreateRequest<'a> {
    source_code: &'a str,
    language: &'a str,
    input: &'a str,
    api_key: &'a str,
}

/// Execution service backed by a paiza.io-style HTTP API.
#[derive(Debug, Clone)]
pub struct PaizaClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl PaizaClient {
    pub fn new(config: &RemoteConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("codepad/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }
}

impl ExecutionService for PaizaClient {
    async fn create_job(
        &self,
        source: &str,
        language: Language,
        stdin: &str,
    ) -> Result<CreatedJob, ServiceError> {
        let body = CreateRequest {
            source_code: source,
            language: language.api_name(),
            input: stdin,
            api_key: &self.api_key,
        };

        let response = self
            .client
            .post(self.url("/runners/create"))
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await?;

        decode(response).await
    }

    async fn job_status(&self, id: &str) -> Result<JobStatus, ServiceError> {
        let response = self
            .client
            .get(self.url("/runners/get_details"))
            .query(&[("id", id), ("api_key", self.api_key.as_str())])
            .header("Accept", "application/json")
            .send()
            .await?;

        decode(response).await
    }
}

async fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::Status {
        status: status.as_u16(),
        body: body.lines().next().unwrap_or_default().trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trailing_slash() {
        let config = RemoteConfig {
            endpoint: "https://runner.example/".to_string(),
            ..RemoteConfig::default()
        };
        let client = PaizaClient::new(&config).unwrap();
        assert_eq!(
            client.url("/runners/create"),
            "https://runner.example/runners/create"
        );
    }

    #[test]
    fn test_create_request_wire_format() {
        let body = CreateRequest {
            source_code: "<?php echo 1;",
            language: Language::Php.api_name(),
            input: "",
            api_key: "guest",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["source_code"], "<?php echo 1;");
        assert_eq!(json["language"], "php");
        assert_eq!(json["api_key"], "guest");
    }
}
