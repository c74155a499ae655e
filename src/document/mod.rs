//! Document module - Quotation blocks and the marker pass over them
//!
//! A document is anything that can enumerate its quotation elements in
//! document order, hand out their rendered content, and overwrite their
//! class attribute. `HtmlPage` is the on-disk implementation; tests use
//! in-memory ones.

pub mod html;
pub mod scanner;

use std::borrow::Cow;
use thiserror::Error;

pub use html::HtmlPage;
pub use scanner::{MarkerScanner, ScanReport};

/// Default marker substring
pub const DEFAULT_MARKER: &str = "CODELINK";

/// Default class written onto marked quotations
pub const DEFAULT_CLASS: &str = "code-link";

/// The document cannot provide its quotation elements
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("document is unavailable: {0}")]
    Unavailable(String),

    #[error("</blockquote> at line {line} has no matching <blockquote>")]
    UnmatchedClose { line: u32 },

    #[error("<blockquote> at line {line} is never closed")]
    Unclosed { line: u32 },
}

/// Host document seen by the marker pass
pub trait Document {
    /// Stable reference to one quotation element for the whole pass
    type Handle: Copy;

    /// All quotation elements, in document order
    fn quotations(&self) -> Result<Vec<Self::Handle>, DocumentError>;

    /// Rendered inner content of a quotation element
    fn content(&self, handle: Self::Handle) -> Cow<'_, str>;

    /// Current class attribute, if any
    fn class(&self, handle: Self::Handle) -> Option<Cow<'_, str>>;

    /// Overwrite the class attribute
    fn set_class(&mut self, handle: Self::Handle, class: &str);
}
