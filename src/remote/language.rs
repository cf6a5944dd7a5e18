//! Server-side languages and source preprocessing.
//!
//! Before submission the user's source is prefixed with a preamble that
//! turns on the runtime's error reporting and predefines the harvested
//! form bindings, so a script reading request input sees the values
//! currently shown on the surface. Python scripts can also have modules
//! imported up front: modules the sandbox ships are imported directly,
//! anything else gets a `pip install` fallback.
//!
//! PHP requires `declare(...)` to be the first statement of a file. A
//! leading `declare` in the user's source is moved ahead of the preamble;
//! one appearing later still fails as it would have anyway.

use std::borrow::Cow;
use std::fmt::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::surface::FormBindings;

/// Language understood by the execution service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "php")]
    Php,
    #[serde(rename = "python3", alias = "python")]
    Python,
}

impl Language {
    /// Identifier sent to the service.
    pub const fn api_name(self) -> &'static str {
        match self {
            Self::Php => "php",
            Self::Python => "python3",
        }
    }

    /// Parse a user-supplied language name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "php" => Some(Self::Php),
            "python" | "python3" | "py" => Some(Self::Python),
            _ => None,
        }
    }

    /// Language implied by a file name's extension.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?;
        match ext.to_ascii_lowercase().as_str() {
            "php" => Some(Self::Php),
            "py" => Some(Self::Python),
            _ => None,
        }
    }

    /// Wrap `source` with the error-reporting preamble and form bindings.
    ///
    /// `modules` are Python modules to import before the user's code; PHP
    /// ignores them. Names that are not dotted identifiers are dropped.
    pub fn prepare(self, source: &str, bindings: &FormBindings, modules: &[String]) -> String {
        match self {
            Self::Php => {
                let (declare, rest) = split_declare(source);
                php_preamble(declare, bindings) + &*rest
            }
            Self::Python => python_preamble(bindings, modules) + source,
        }
    }
}

/// Modules the execution sandbox provides without installation.
pub const BUNDLED_MODULES: &[&str] = &[
    "math",
    "random",
    "datetime",
    "json",
    "re",
    "collections",
    "itertools",
    "functools",
    "os",
    "sys",
    "time",
    "string",
    "numpy",
    "pandas",
    "matplotlib",
    "requests",
    "bs4",
];

/// Whether `name` can be spliced into an `import` statement as-is.
pub fn is_module_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            let mut chars = part.chars();
            chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

/// Split a leading `<?php declare(...);` off `source`.
///
/// Returns the declare statement (if any) and the source with it removed;
/// the opening tag is kept so the rest still parses as PHP.
fn split_declare(source: &str) -> (Option<&str>, Cow<'_, str>) {
    let trimmed = source.trim_start();
    let Some(body) = trimmed.strip_prefix("<?php") else {
        return (None, Cow::Borrowed(source));
    };
    let body = body.trim_start();
    let is_declare = body
        .strip_prefix("declare")
        .is_some_and(|rest| rest.trim_start().starts_with('('));
    if !is_declare {
        return (None, Cow::Borrowed(source));
    }
    let Some(end) = body.find(';') else {
        return (None, Cow::Borrowed(source));
    };
    let (declare, rest) = body.split_at(end + 1);
    (Some(declare), Cow::Owned(format!("<?php{rest}")))
}

fn php_preamble(declare: Option<&str>, bindings: &FormBindings) -> String {
    let mut out = String::from("<?php\n");
    if let Some(declare) = declare {
        out.push_str(declare);
        out.push('\n');
    }
    out.push_str("error_reporting(E_ALL);\nini_set('display_errors', '1');\n");

    if !bindings.is_empty() {
        out.push_str("$_POST = array(");
        for (i, binding) in bindings.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(
                out,
                "'{}' => '{}'",
                php_quote(&binding.name),
                php_quote(&binding.value)
            );
        }
        out.push_str(");\n$_REQUEST = $_POST;\n$_SERVER['REQUEST_METHOD'] = 'POST';\n");
    }

    // `?>` swallows the newline that follows it
    out.push_str("?>\n");
    out
}

/// Escape for a single-quoted PHP string.
fn php_quote(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\'', "\\'")
}

fn python_preamble(bindings: &FormBindings, modules: &[String]) -> String {
    let mut out = String::from(
        "import sys, warnings\n\
         sys.stderr.reconfigure(line_buffering=True)\n\
         warnings.simplefilter('default')\n",
    );

    let (bundled, extra): (Vec<&str>, Vec<&str>) = modules
        .iter()
        .map(String::as_str)
        .filter(|m| is_module_name(m))
        .partition(|m| BUNDLED_MODULES.contains(m));

    if !extra.is_empty() {
        out.push_str("import subprocess\n");
    }
    for module in extra {
        let _ = write!(
            out,
            "try:\n    import {module}\nexcept ImportError:\n    \
             subprocess.check_call([sys.executable, '-m', 'pip', 'install', '{module}'])\n    \
             import {module}\n"
        );
    }
    for module in bundled {
        let _ = writeln!(out, "import {module}");
    }

    out.push_str("_POST = {");
    for (i, binding) in bindings.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(
            out,
            "{}: {}",
            python_quote(&binding.name),
            python_quote(&binding.value)
        );
    }
    out.push_str("}\n");
    out
}

/// JSON string literals are valid Python string literals.
fn python_quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "''".to_string())
}
