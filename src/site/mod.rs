//! Site module - Run the marker pass over a tree of rendered pages
//!
//! Each page is an independent document: a failure on one page becomes an
//! error item and the pass moves on.

pub mod list;
pub mod mark;
pub mod walk;

use std::fs;
use tracing::warn;

use crate::core::model::{ItemError, ResultItem, ResultSet};
use crate::document::HtmlPage;
use walk::PageFile;

pub const READ_FAILED: &str = "READ_FAILED";
pub const MALFORMED_MARKUP: &str = "MALFORMED_MARKUP";
pub const WRITE_FAILED: &str = "WRITE_FAILED";

/// Read and parse one page
pub(crate) fn load_page(page: &PageFile) -> Result<HtmlPage, ItemError> {
    let source = fs::read_to_string(&page.path)
        .map_err(|e| ItemError::new(READ_FAILED, format!("Failed to read file: {}", e)))?;

    HtmlPage::parse(source).map_err(|e| ItemError::new(MALFORMED_MARKUP, e.to_string()))
}

/// Error item for a page, logged as a warning
pub(crate) fn page_error(page: &PageFile, error: ItemError) -> ResultItem {
    warn!(path = %page.relative, code = %error.code, "{}", error.message);
    ResultItem::error(Some(page.relative.clone()), error)
}

/// Run `f` on every page and collect the items in path order
pub(crate) fn process_pages<F>(pages: &[PageFile], f: F) -> ResultSet
where
    F: Fn(&PageFile) -> Vec<ResultItem> + Sync + Send,
{
    #[cfg(feature = "parallel")]
    let per_page: Vec<Vec<ResultItem>> = {
        use rayon::prelude::*;
        pages.par_iter().map(&f).collect()
    };

    #[cfg(not(feature = "parallel"))]
    let per_page: Vec<Vec<ResultItem>> = pages.iter().map(&f).collect();

    let mut result_set: ResultSet = per_page.into_iter().flatten().collect();
    result_set.sort();
    result_set
}
