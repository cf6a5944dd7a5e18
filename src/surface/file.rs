//! Surface that renders into `<output>/index.html`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::Surface;
use crate::utils::html::escape;

/// Writes every installed artifact to a single HTML file.
#[derive(Debug)]
pub struct FileSurface {
    path: PathBuf,
    live: Option<String>,
}

impl FileSurface {
    /// Surface writing to `dir/index.html`.
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join("index.html"),
            live: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&mut self, html: String) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, &html)?;
        self.live = Some(html);
        Ok(())
    }
}

impl Surface for FileSurface {
    fn set_document(&mut self, html: &str) -> io::Result<()> {
        self.write(html.to_string())
    }

    fn set_diagnostics(&mut self, output: Option<&str>, error: Option<&str>) -> io::Result<()> {
        self.write(diagnostics_page(output, error))
    }

    fn live_document(&self) -> Option<&str> {
        self.live.as_deref()
    }
}

/// Minimal page with one `<pre>` per present section.
fn diagnostics_page(output: Option<&str>, error: Option<&str>) -> String {
    let mut body = String::new();
    if let Some(output) = output {
        body.push_str(&format!(
            "<section class=\"output\"><h2>Output</h2><pre>{}</pre></section>\n",
            escape(output)
        ));
    }
    if let Some(error) = error {
        body.push_str(&format!(
            "<section class=\"error\"><h2>Error</h2><pre style=\"color:#c00\">{}</pre></section>\n",
            escape(error)
        ));
    }

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n<title>codepad</title>\n</head>\n<body>\n{body}</body>\n</html>\n"
    )
}
