//! List command - report every quotation without touching the page

use anyhow::Result;
use serde_json::json;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::core::model::{Range, ResultItem, ResultSet, Status};
use crate::core::util::truncate_string;
use crate::document::{Document, MarkerScanner};
use crate::site::walk::{collect_pages, PageFile, WalkOptions};
use crate::site::{load_page, page_error, process_pages};

/// Status a quotation would get from `mark`
fn listing_status(scanner: &MarkerScanner, has_marker: bool, class: Option<&str>) -> Status {
    match (has_marker, class) {
        (false, _) => Status::Unchanged,
        (true, Some(c)) if c == scanner.class() => Status::Marked,
        (true, _) => Status::Pending,
    }
}

fn list_page(
    page: &PageFile,
    scanner: &MarkerScanner,
    max_excerpt: usize,
    marked_only: bool,
) -> Vec<ResultItem> {
    let html = match load_page(page) {
        Ok(html) => html,
        Err(e) => return vec![page_error(page, e)],
    };

    let mut items = Vec::new();
    for id in html.ids() {
        let content = html.content(id);
        let has_marker = scanner.is_marked(&content);
        if marked_only && !has_marker {
            continue;
        }

        let class = html.class(id);
        let (start, end) = html.lines(id);
        let bytes = html.byte_range(id);
        let (excerpt, truncated) = truncate_string(content.trim(), max_excerpt);

        let mut item = ResultItem::quote(
            page.relative.clone(),
            Range::lines(start, end),
            listing_status(scanner, has_marker, class.as_deref()),
        )
        .with_excerpt(excerpt)
        .with_data(json!({
            "index": id.index(),
            "marker": has_marker,
            "class": class,
            "bytes": { "start": bytes.start, "end": bytes.end },
        }));
        item.meta.truncated = truncated;
        items.push(item);
    }

    items
}

/// List quotations under the scopes
pub fn list_quotes(
    root: &Path,
    scopes: &[PathBuf],
    config: &Config,
    walk: WalkOptions,
    marked_only: bool,
) -> Result<ResultSet> {
    let pages = collect_pages(root, scopes, &config.extensions, walk)?;
    let scanner = MarkerScanner::new(config.marker.clone(), config.class.clone());

    Ok(process_pages(&pages, |page| {
        list_page(page, &scanner, config.max_excerpt, marked_only)
    }))
}
