//! `codepad exec`: run a single server script remotely.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use owo_colors::OwoColorize;
use tokio_util::sync::CancellationToken;

use crate::config::CodepadConfig;
use crate::debug;
use crate::remote::{
    Classified, Language, PaizaClient, PollSettings, RemoteExecutionJob, classify, failure_report,
};
use crate::surface::FormBindings;

/// Text to print for a finished run: `(stdout, stderr)`.
#[derive(Debug, Default, PartialEq, Eq)]
struct Printed {
    out: Option<String>,
    err: Option<String>,
}

/// One `codepad exec` invocation.
#[derive(Debug, Clone, Copy)]
pub struct ExecRequest<'a> {
    pub file: &'a Path,
    /// File whose content becomes the script's standard input
    pub stdin: Option<&'a Path>,
    /// Language name overriding the file extension
    pub language: Option<&'a str>,
    /// Python modules added to `[remote] modules`
    pub modules: &'a [String],
}

pub async fn exec_file(request: ExecRequest<'_>, config: &Path) -> Result<()> {
    let ExecRequest {
        file,
        stdin,
        language,
        modules,
    } = request;
    let root = file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut config = CodepadConfig::load(root, config)?;
    config.remote.modules.extend(modules.iter().cloned());
    config.validate()?;

    let source = fs::read_to_string(file)
        .with_context(|| format!("failed to read `{}`", file.display()))?;
    let language = match language {
        Some(name) => {
            Language::from_name(name).with_context(|| format!("unknown language `{name}`"))?
        }
        None => Language::from_path(file).unwrap_or(config.remote.language),
    };
    let input = match stdin {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?,
        None => String::new(),
    };

    let service = PaizaClient::new(&config.remote).context("failed to create HTTP client")?;
    let prepared = language.prepare(&source, &FormBindings::new(), &config.remote.modules);
    let mut job = RemoteExecutionJob::new(prepared, language).with_stdin(input);

    let outcome = job
        .run(&service, PollSettings::from(&config.remote), &CancellationToken::new())
        .await;
    debug!("remote"; "{} after {} status checks", file.display(), job.attempt);

    let printed = match outcome {
        Ok(result) => printed(classify(&result)),
        Err(error) => Printed {
            out: None,
            err: failure_report(&error)
                .and_then(|r| r.error().map(ToString::to_string)),
        },
    };

    if let Some(out) = &printed.out {
        print!("{out}");
        if !out.ends_with('\n') {
            println!();
        }
    }
    if let Some(err) = &printed.err {
        eprintln!("{}", err.red());
        bail!("`{}` failed", file.display());
    }
    Ok(())
}

fn printed(classified: Classified) -> Printed {
    match classified {
        Classified::Document(html) => Printed {
            out: Some(html),
            err: None,
        },
        Classified::Report(report) => Printed {
            out: report.output().map(str::to_string),
            err: report.error().map(ToString::to_string),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{Diagnostic, DiagnosticKind, DiagnosticReport};

    #[test]
    fn test_printed_sections() {
        let report = DiagnosticReport::new(
            Some("partial\n"),
            Some(Diagnostic::new(DiagnosticKind::Runtime, "boom")),
        );
        assert_eq!(
            printed(Classified::Report(report)),
            Printed {
                out: Some("partial\n".to_string()),
                err: Some("Runtime error: boom".to_string()),
            }
        );

        assert_eq!(
            printed(Classified::Document("<html></html>".to_string())),
            Printed {
                out: Some("<html></html>".to_string()),
                err: None,
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_language_is_rejected() {
        let temp = tempfile::Builder::new().prefix("project").tempdir().unwrap();
        let script = temp.path().join("main.rb");
        fs::write(&script, "puts 1").unwrap();

        let request = ExecRequest {
            file: &script,
            stdin: None,
            language: Some("ruby"),
            modules: &[],
        };
        let err = exec_file(request, Path::new("codepad.toml"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unknown language `ruby`"));
    }

    #[tokio::test]
    async fn test_bad_module_name_is_rejected() {
        let temp = tempfile::Builder::new().prefix("project").tempdir().unwrap();
        let script = temp.path().join("main.py");
        fs::write(&script, "print(1)").unwrap();

        let modules = ["os; import shutil".to_string()];
        let request = ExecRequest {
            file: &script,
            stdin: None,
            language: None,
            modules: &modules,
        };
        let err = exec_file(request, Path::new("codepad.toml"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("remote.modules"));
    }
}
