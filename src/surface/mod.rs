//! Rendering Surface
//!
//! The surface is an opaque sink: it accepts a document or a pair of
//! diagnostic sections. It also exposes the live document so form inputs
//! can be harvested before a server-side rerun.
//!
//! - `harvest` - read input/textarea/select values out of markup
//! - `file` - surface that writes `index.html` into an output directory

mod file;
pub mod harvest;

use std::io;

pub use file::FileSurface;
pub use harvest::{FormBinding, FormBindings};

/// Where installed artifacts end up.
///
/// The engine actor is the only writer.
pub trait Surface: Send {
    /// Show a full document.
    fn set_document(&mut self, html: &str) -> io::Result<()>;

    /// Show diagnostics. Absent sections are hidden, not rendered blank.
    fn set_diagnostics(&mut self, output: Option<&str>, error: Option<&str>) -> io::Result<()>;

    /// Markup currently shown, if any.
    fn live_document(&self) -> Option<&str>;

    /// Editable inputs of the live document. Empty before the first render.
    fn form_inputs(&self) -> FormBindings {
        self.live_document()
            .map(harvest::harvest)
            .unwrap_or_default()
    }
}
