//! Built-in starter content.

/// Stylesheet reference the starter markup points at.
pub const STYLE_PLACEHOLDER: &str = r#"href="styles.css""#;

/// Script reference the starter markup points at.
pub const SCRIPT_PLACEHOLDER: &str = r#"src="script.js""#;

/// Markup used for new markup files and when a project has none.
pub const DEFAULT_MARKUP: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>My Project</title>
  <meta name="description" content="This is my awesome project">
  <link rel="stylesheet" href="styles.css">
</head>
<body>
  <h1>Hello World</h1>
  <script src="script.js"></script>
</body>
</html>"#;

pub const DEFAULT_STYLE: &str = "body {\n  font-family: -apple-system, system-ui, sans-serif;\n  padding: 2rem;\n}";

pub const DEFAULT_SCRIPT: &str = r#"console.log("Hello from codepad!");"#;
