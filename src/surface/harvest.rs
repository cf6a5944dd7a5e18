//! Form-input harvesting.
//!
//! Reads the name and current value of every editable input in a document
//! so a server-side script expecting request-style input sees the same
//! values on every rerun.

use crate::utils::html::unescape;

/// One `name = value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormBinding {
    pub name: String,
    pub value: String,
}

/// Harvested bindings in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormBindings(Vec<FormBinding>);

impl FormBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push(FormBinding {
            name: name.into(),
            value: value.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FormBinding> {
        self.0.iter()
    }
}

impl FromIterator<(String, String)> for FormBindings {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| FormBinding { name, value })
                .collect(),
        )
    }
}

/// Input types that carry no user-editable value.
const SKIPPED_INPUT_TYPES: &[&str] = &["submit", "button", "reset", "image", "file"];

/// Collect bindings from every named `input`, `textarea` and `select`.
///
/// Unchecked checkboxes and radios are skipped, matching what a browser
/// would submit. Unparseable markup yields no bindings.
pub fn harvest(html: &str) -> FormBindings {
    let Ok(dom) = tl::parse(html, tl::ParserOptions::default()) else {
        return FormBindings::new();
    };

    let parser = dom.parser();
    let mut bindings = FormBindings::new();
    for handle in dom.children() {
        visit(*handle, parser, &mut bindings);
    }
    bindings
}

fn visit(handle: tl::NodeHandle, parser: &tl::Parser, out: &mut FormBindings) {
    let Some(tl::Node::Tag(tag)) = handle.get(parser) else {
        return;
    };

    let tag_name = tag.name().as_utf8_str().to_ascii_lowercase();
    let name = attr(tag, "name").flatten().filter(|n| !n.is_empty());

    match (tag_name.as_str(), name) {
        ("input", Some(name)) => {
            if let Some(value) = input_value(tag) {
                out.push(name, value);
            }
        }
        ("textarea", Some(name)) => {
            out.push(name, unescape(&tag.inner_text(parser)).into_owned());
            return;
        }
        ("select", Some(name)) => {
            if let Some(value) = selected_option(tag, parser) {
                out.push(name, value);
            }
            return;
        }
        _ => {}
    }

    // Lenient markup may nest elements under a void `<input>`
    for child in tag.children().top().iter() {
        visit(*child, parser, out);
    }
}

/// Submitted value of an input, `None` if a browser would not submit it.
fn input_value(tag: &tl::HTMLTag) -> Option<String> {
    let kind = attr(tag, "type")
        .flatten()
        .unwrap_or_default()
        .to_ascii_lowercase();
    if SKIPPED_INPUT_TYPES.contains(&kind.as_str()) {
        return None;
    }

    let checkable = kind == "checkbox" || kind == "radio";
    if checkable && attr(tag, "checked").is_none() {
        return None;
    }

    let default = if checkable { "on" } else { "" };
    Some(
        attr(tag, "value")
            .flatten()
            .unwrap_or_else(|| default.to_string()),
    )
}

/// Value of the selected option, falling back to the first option.
fn selected_option(select: &tl::HTMLTag, parser: &tl::Parser) -> Option<String> {
    let mut first = None;
    let mut selected = None;
    collect_options(select, parser, &mut first, &mut selected);
    selected.or(first)
}

fn collect_options(
    tag: &tl::HTMLTag,
    parser: &tl::Parser,
    first: &mut Option<String>,
    selected: &mut Option<String>,
) {
    for child in tag.children().top().iter() {
        let Some(tl::Node::Tag(child)) = child.get(parser) else {
            continue;
        };
        if !child.name().as_utf8_str().eq_ignore_ascii_case("option") {
            collect_options(child, parser, first, selected);
            continue;
        }

        let value = attr(child, "value")
            .flatten()
            .unwrap_or_else(|| unescape(child.inner_text(parser).trim()).into_owned());
        if selected.is_none() && attr(child, "selected").is_some() {
            *selected = Some(value.clone());
        }
        if first.is_none() {
            *first = Some(value);
        }
    }
}

/// Attribute lookup: `None` if absent, `Some(None)` if present without a value.
fn attr(tag: &tl::HTMLTag, key: &str) -> Option<Option<String>> {
    tag.attributes()
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v.map(|v| unescape(&v).into_owned()))
}
