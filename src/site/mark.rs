//! Mark command - flag quotations that carry the marker
//!
//! Pages are rewritten only when the pass changed them and the run is
//! neither a dry-run nor a check.

use anyhow::Result;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::Config;
use crate::core::model::{ItemError, Kind, Meta, Range, ResultItem, ResultSet, Status};
use crate::core::util::{hash_bytes, truncate_string};
use crate::document::{Document, MarkerScanner};
use crate::site::walk::{collect_pages, PageFile, WalkOptions};
use crate::site::{load_page, page_error, process_pages, MALFORMED_MARKUP, WRITE_FAILED};

#[derive(Debug, Clone, Copy, Default)]
pub struct MarkOptions {
    /// Report what would change without writing
    pub dry_run: bool,
    /// Like dry-run; the caller fails when anything is pending
    pub check: bool,
    pub walk: WalkOptions,
}

impl MarkOptions {
    fn writes(&self) -> bool {
        !self.dry_run && !self.check
    }
}

/// Outcome of a site pass
#[derive(Debug, Clone)]
pub struct MarkSummary {
    pub pages: usize,
    pub marked: usize,
    pub pending: usize,
    pub failed: usize,
}

impl MarkSummary {
    pub fn from_result_set(result_set: &ResultSet) -> Self {
        Self {
            pages: result_set.count(Kind::Page, Status::Marked)
                + result_set.count(Kind::Page, Status::Pending)
                + result_set.count(Kind::Page, Status::Unchanged),
            marked: result_set.count(Kind::Page, Status::Marked),
            pending: result_set.count(Kind::Page, Status::Pending),
            failed: result_set.count(Kind::Error, Status::Failed),
        }
    }
}

/// Run the pass over one page and report it
pub fn mark_page(
    page: &PageFile,
    scanner: &MarkerScanner,
    config: &Config,
    write: bool,
) -> Vec<ResultItem> {
    let mut html = match load_page(page) {
        Ok(html) => html,
        Err(e) => return vec![page_error(page, e)],
    };

    let report = match scanner.scan(&mut html) {
        Ok(report) => report,
        Err(e) => {
            return vec![page_error(
                page,
                ItemError::new(MALFORMED_MARKUP, e.to_string()),
            )]
        }
    };

    let changed_status = if write { Status::Marked } else { Status::Pending };
    let page_status = if report.changed() {
        changed_status
    } else {
        Status::Unchanged
    };

    if report.changed() && write {
        if let Err(e) = fs::write(&page.path, html.as_str()) {
            return vec![page_error(
                page,
                ItemError::new(WRITE_FAILED, format!("Failed to write file: {}", e)),
            )];
        }
        info!(path = %page.relative, marked = report.rewritten.len(), "page marked");
    } else {
        debug!(
            path = %page.relative,
            quotes = report.inspected,
            pending = report.rewritten.len(),
            "page not written"
        );
    }

    let mut items = Vec::with_capacity(report.marked.len() + 1);
    items.push(
        ResultItem::page(page.relative.clone(), page_status)
            .with_data(json!({
                "quotes": report.inspected,
                "marked": report.marked.len(),
                "rewritten": report.rewritten.len(),
            }))
            .with_meta(Meta {
                size: Some(html.as_str().len() as u64),
                hash: Some(hash_bytes(html.as_str().as_bytes())),
                truncated: false,
            }),
    );

    for id in html.ids().filter(|id| report.marked.contains(&id.index())) {
        let (start, end) = html.lines(id);
        let status = if report.rewritten.contains(&id.index()) {
            changed_status
        } else {
            Status::Unchanged
        };
        let (excerpt, truncated) = truncate_string(html.content(id).trim(), config.max_excerpt);

        let mut item = ResultItem::quote(page.relative.clone(), Range::lines(start, end), status)
            .with_excerpt(excerpt)
            .with_data(json!({ "index": id.index(), "class": scanner.class() }));
        item.meta.truncated = truncated;
        items.push(item);
    }

    items
}

/// Mark every page under the scopes
pub fn mark_site(
    root: &Path,
    scopes: &[PathBuf],
    config: &Config,
    options: MarkOptions,
) -> Result<ResultSet> {
    let pages = collect_pages(root, scopes, &config.extensions, options.walk)?;
    let scanner = MarkerScanner::new(config.marker.clone(), config.class.clone());
    let write = options.writes();

    info!(
        pages = pages.len(),
        marker = %scanner.marker(),
        class = %scanner.class(),
        write,
        "marking pages"
    );

    Ok(process_pages(&pages, |page| mark_page(page, &scanner, config, write)))
}
