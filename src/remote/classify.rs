//! Turn a finished job into something installable.

use std::sync::LazyLock;

use regex::Regex;

use crate::compiler::{Diagnostic, DiagnosticKind, DiagnosticReport};
use crate::utils::html::{escape, find_head_close, looks_like_document};

use super::{JobResult, RemoteError};

/// Shown when a completed run printed nothing at all.
pub const NO_OUTPUT_HINT: &str = "make sure your code includes echo or print statements";

/// How a completed job should be presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    /// Full markup document, to be styled and installed as-is
    Document(String),
    Report(DiagnosticReport),
}

/// Classify a completed job.
///
/// Standard output that looks like a full markup document, with no error
/// stream, becomes a document. Anything else becomes a report whose output
/// and error sections are each present only when non-empty.
pub fn classify(result: &JobResult) -> Classified {
    let stdout = result.stdout.as_str();
    let error = if !result.build_stderr.trim().is_empty() {
        Some(Diagnostic::new(DiagnosticKind::Build, &result.build_stderr))
    } else if !result.stderr.trim().is_empty() {
        Some(runtime_error(&result.stderr))
    } else {
        None
    };

    match error {
        None if looks_like_document(stdout) => Classified::Document(stdout.to_string()),
        None if stdout.trim().is_empty() => Classified::Report(DiagnosticReport::failure(
            Diagnostic::new(DiagnosticKind::NoOutput, NO_OUTPUT_HINT),
        )),
        error => Classified::Report(DiagnosticReport::new(Some(stdout), error)),
    }
}

/// Runtime diagnostic for `stderr`, naming the module when an import failed.
fn runtime_error(stderr: &str) -> Diagnostic {
    static MISSING: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"ModuleNotFoundError: No module named '([^']+)'").expect("valid regex")
    });

    match MISSING.captures(stderr).and_then(|c| c.get(1)) {
        Some(module) => Diagnostic::new(
            DiagnosticKind::MissingModule,
            format!(
                "`{}` is not available in this execution environment, \
                 and the sandbox cannot install arbitrary packages",
                module.as_str()
            ),
        ),
        None => Diagnostic::new(DiagnosticKind::Runtime, stderr),
    }
}

/// Report for a job that never completed. `None` for cancelled jobs.
pub fn failure_report(error: &RemoteError) -> Option<DiagnosticReport> {
    error.to_diagnostic().map(DiagnosticReport::failure)
}

/// Insert a stylesheet link to `reference` right before `</head>`.
///
/// Documents without a head are returned unchanged.
pub fn splice_style(html: &str, reference: &str) -> String {
    let Some(pos) = find_head_close(html) else {
        return html.to_string();
    };

    let link = format!(r#"<link rel="stylesheet" href="{}">"#, escape(reference));
    let mut out = String::with_capacity(html.len() + link.len());
    out.push_str(&html[..pos]);
    out.push_str(&link);
    out.push_str(&html[pos..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(stdout: &str, stderr: &str, build_stderr: &str) -> JobResult {
        JobResult {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            build_stderr: build_stderr.to_string(),
        }
    }

    #[test]
    fn test_document_output() {
        let html = "\n  <!DOCTYPE html><html><head></head><body>hi</body></html>";
        assert_eq!(
            classify(&result(html, "", "")),
            Classified::Document(html.to_string())
        );
    }

    #[test]
    fn test_document_with_stderr_is_report() {
        let classified = classify(&result("<html></html>", "PHP Notice", ""));
        let Classified::Report(report) = classified else {
            panic!("expected report");
        };
        assert_eq!(report.output(), Some("<html></html>"));
        assert_eq!(report.error().unwrap().kind, DiagnosticKind::Runtime);
    }

    #[test]
    fn test_stderr_only_has_no_output_section() {
        let Classified::Report(report) = classify(&result("", "Traceback ...", "")) else {
            panic!("expected report");
        };
        assert_eq!(report.output(), None);
        assert_eq!(report.error().unwrap().message, "Traceback ...");
    }

    #[test]
    fn test_build_stderr_wins_over_stderr() {
        let Classified::Report(report) = classify(&result("", "later", "parse error")) else {
            panic!("expected report");
        };
        assert_eq!(report.error().unwrap().kind, DiagnosticKind::Build);
    }

    #[test]
    fn test_missing_module_is_named() {
        let stderr = "Traceback (most recent call last):\n  File \"main.py\", line 1, in <module>\n\
                      ModuleNotFoundError: No module named 'pyfiglet'\n";
        let Classified::Report(report) = classify(&result("partial\n", stderr, "")) else {
            panic!("expected report");
        };
        let error = report.error().unwrap();
        assert_eq!(error.kind, DiagnosticKind::MissingModule);
        assert!(error.message.starts_with("`pyfiglet` is not available"));
        assert!(!error.message.contains("Traceback"));
        assert_eq!(report.output(), Some("partial\n"));
    }

    #[test]
    fn test_other_import_errors_stay_runtime() {
        let Classified::Report(report) =
            classify(&result("", "ImportError: cannot import name 'x'", ""))
        else {
            panic!("expected report");
        };
        assert_eq!(report.error().unwrap().kind, DiagnosticKind::Runtime);
    }

    #[test]
    fn test_plain_output() {
        let Classified::Report(report) = classify(&result("42\n", "", "")) else {
            panic!("expected report");
        };
        assert_eq!(report.output(), Some("42\n"));
        assert_eq!(report.error(), None);
    }

    #[test]
    fn test_nothing_printed() {
        let Classified::Report(report) = classify(&result(" \n", "", "")) else {
            panic!("expected report");
        };
        assert_eq!(report.output(), None);
        assert_eq!(report.error().unwrap().kind, DiagnosticKind::NoOutput);
    }

    #[test]
    fn test_failure_report() {
        let report = failure_report(&RemoteError::Timeout { attempts: 10 }).unwrap();
        assert_eq!(report.error().unwrap().kind, DiagnosticKind::Timeout);
        assert!(failure_report(&RemoteError::Cancelled).is_none());
    }

    #[test]
    fn test_splice_style() {
        let html = "<html><HEAD><title>t</title></HEAD><body></body></html>";
        let spliced = splice_style(html, "blob:codepad/3");
        assert_eq!(
            spliced,
            r#"<html><HEAD><title>t</title><link rel="stylesheet" href="blob:codepad/3"></HEAD><body></body></html>"#
        );

        assert_eq!(splice_style("<html><body/>", "x"), "<html><body/>");
    }
}
