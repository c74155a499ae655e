//! Marker scanner
//!
//! One pass over a document: every quotation whose rendered content contains
//! the marker gets the configured class. Quotations without the marker are
//! never touched, so a class set by an earlier pass is not cleared.

use tracing::{debug, trace};

use super::{Document, DocumentError, DEFAULT_CLASS, DEFAULT_MARKER};

/// Outcome of one pass over a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Number of quotation elements in the snapshot
    pub inspected: usize,

    /// Document-order indices of quotations containing the marker
    pub marked: Vec<usize>,

    /// Subset of `marked` whose class attribute actually changed
    pub rewritten: Vec<usize>,
}

impl ScanReport {
    pub fn changed(&self) -> bool {
        !self.rewritten.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerScanner {
    marker: String,
    class: String,
}

impl Default for MarkerScanner {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER, DEFAULT_CLASS)
    }
}

impl MarkerScanner {
    pub fn new(marker: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            class: class.into(),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    /// Exact, case-sensitive substring test
    pub fn is_marked(&self, content: &str) -> bool {
        content.contains(self.marker.as_str())
    }

    /// Run the pass. The element list is taken once, before any mutation.
    pub fn scan<D: Document>(&self, document: &mut D) -> Result<ScanReport, DocumentError> {
        let quotations = document.quotations()?;
        let mut report = ScanReport {
            inspected: quotations.len(),
            ..Default::default()
        };

        for (index, handle) in quotations.into_iter().enumerate() {
            let marked = {
                let content = document.content(handle);
                debug!(index, content = %content, "quotation");
                self.is_marked(&content)
            };
            if !marked {
                continue;
            }
            report.marked.push(index);

            let current = document.class(handle).map(|c| c.into_owned());
            if current.as_deref() == Some(self.class.as_str()) {
                trace!(index, "class already set");
                continue;
            }

            document.set_class(handle, &self.class);
            report.rewritten.push(index);
        }

        Ok(report)
    }
}
