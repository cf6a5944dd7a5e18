//! Entry-file selection and placeholder substitution.

use super::resource::{ResourceHandle, ResourceStore};
use super::{AssemblyError, Document};
use crate::config::CompileConfig;
use crate::core::FileKind;
use crate::workspace::{Workspace, template};

/// Assemble the workspace's entry files into a document.
///
/// Uses the first markup file (or the built-in template), the first style
/// file and the first script file. Style and script contents are wrapped
/// into fresh handles from `store` and their placeholders replaced by the
/// handle references. A missing style or script leaves its placeholder
/// untouched.
///
/// On failure every handle allocated by this call has already been
/// released; nothing previously installed is touched.
pub fn assemble(
    ws: &Workspace,
    store: &mut dyn ResourceStore,
    config: &CompileConfig,
) -> Result<Document, AssemblyError> {
    let markup = ws
        .first_of_kind(FileKind::Markup)
        .map_or(template::DEFAULT_MARKUP, |f| f.content.as_str());

    let mut html = markup.to_string();
    let mut resources = Vec::with_capacity(2);

    let entries = [
        (FileKind::Style, config.style_placeholder.as_str()),
        (FileKind::Script, config.script_placeholder.as_str()),
    ];

    for (kind, placeholder) in entries {
        let Some(file) = ws.first_of_kind(kind) else {
            continue;
        };

        let handle = match store.allocate(&file.content, kind) {
            Ok(handle) => handle,
            Err(e) => {
                release_all(store, resources);
                return Err(e);
            }
        };

        if !substitute(&mut html, placeholder, &handle) {
            crate::debug!("compile"; "no `{}` in markup, {} not linked", placeholder, file.path());
        }
        resources.push(handle);
    }

    Ok(Document { html, resources })
}

/// Replace the first occurrence of `placeholder` with the handle reference.
///
/// `href="styles.css"` becomes `href="<reference>"`; a placeholder without
/// an attribute name is replaced by the bare reference.
fn substitute(html: &mut String, placeholder: &str, handle: &ResourceHandle) -> bool {
    let Some(pos) = html.find(placeholder) else {
        return false;
    };

    let replacement = match placeholder.split_once('=') {
        Some((attr, _)) => format!(r#"{attr}="{}""#, handle.reference()),
        None => handle.reference().to_string(),
    };
    html.replace_range(pos..pos + placeholder.len(), &replacement);
    true
}

fn release_all(store: &mut dyn ResourceStore, handles: Vec<ResourceHandle>) {
    for handle in handles {
        store.release(handle);
    }
}
