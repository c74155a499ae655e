//! HTML page document
//!
//! Locates `<blockquote>` elements in an HTML source string and rewrites
//! their `class` attribute in place. Every byte outside the rewritten
//! attribute is preserved, so a pass over an untouched page is a no-op.
//!
//! Comments and the bodies of raw-text elements (`<script>`, `<style>`,
//! `<textarea>`, `<title>` and friends) are skipped. Nesting follows
//! HTML: an end tag closes the innermost open quotation.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

use super::{Document, DocumentError};
use crate::core::util::line_of;

/// Elements whose text is never parsed as markup
const RAW_TEXT_ELEMENTS: [&str; 9] = [
    "script", "style", "textarea", "title", "xmp", "noscript", "iframe", "noembed", "noframes",
];

/// Inside of a tag. Quotes only open a value right after `=`, so an
/// unquoted value may contain an apostrophe.
const TAG_BODY: &str = r#"(?:=\s*"[^"]*"|=\s*'[^']*'|[^">])*"#;

/// Tokens that matter for locating quotations. Group 1 only participates for
/// blockquote tags (`/` for end tags, empty for start tags).
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    let mut alternatives = vec![r"<!--.*?-->".to_string()];
    alternatives.extend(
        RAW_TEXT_ELEMENTS
            .iter()
            .map(|name| format!(r"<{name}\b{TAG_BODY}>.*?</{name}\s*>")),
    );
    alternatives.push(format!(r"<(/?)blockquote(?:[\s/]{TAG_BODY})?>"));

    Regex::new(&format!("(?is){}", alternatives.join("|"))).expect("Invalid TOKEN_RE regex")
});

/// One attribute inside a start tag: name, then an optional value
static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"=<>`]+)))?"#)
        .expect("Invalid ATTR_RE regex")
});

/// Length of `<blockquote`
const OPEN_PREFIX_LEN: usize = "<blockquote".len();

/// Handle to one quotation of an `HtmlPage`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuoteId(usize);

impl QuoteId {
    /// Position in document order
    pub fn index(self) -> usize {
        self.0
    }
}

/// Byte offsets of one quotation's start and end tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct QuoteSpan {
    open_start: usize,
    open_end: usize,
    close_start: usize,
    close_end: usize,
}

impl QuoteSpan {
    fn positions_mut(&mut self) -> [&mut usize; 4] {
        [
            &mut self.open_start,
            &mut self.open_end,
            &mut self.close_start,
            &mut self.close_end,
        ]
    }
}

/// A `class` attribute found in a start tag (absolute offsets)
#[derive(Debug)]
struct ClassAttr<'a> {
    start: usize,
    end: usize,
    value: &'a str,
}

#[derive(Debug, Clone)]
pub struct HtmlPage {
    source: String,
    spans: Vec<QuoteSpan>,
}

impl HtmlPage {
    /// Parse a page, failing on unbalanced blockquote tags
    pub fn parse(source: impl Into<String>) -> Result<Self, DocumentError> {
        let source = source.into();
        let spans = locate_quotations(&source)?;
        Ok(Self { source, spans })
    }

    /// Current page source
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn into_string(self) -> String {
        self.source
    }

    pub fn ids(&self) -> impl Iterator<Item = QuoteId> {
        (0..self.spans.len()).map(QuoteId)
    }

    /// Lines of the start and end tags (1-indexed)
    pub fn lines(&self, id: QuoteId) -> (u32, u32) {
        let span = self.spans[id.0];
        (
            line_of(&self.source, span.open_start),
            line_of(&self.source, span.close_start),
        )
    }

    /// Byte range of the whole element, tags included
    pub fn byte_range(&self, id: QuoteId) -> std::ops::Range<usize> {
        let span = self.spans[id.0];
        span.open_start..span.close_end
    }

    fn class_attr(&self, id: QuoteId) -> Option<ClassAttr<'_>> {
        let span = self.spans[id.0];
        let attrs_start = span.open_start + OPEN_PREFIX_LEN;
        let attrs_end = span.open_end - 1;
        let attrs = self.source.get(attrs_start..attrs_end)?;

        ATTR_RE.captures_iter(attrs).find_map(|caps| {
            let name = caps.get(1)?;
            if !name.as_str().eq_ignore_ascii_case("class") {
                return None;
            }
            let whole = caps.get(0)?;
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str())
                .unwrap_or("");
            Some(ClassAttr {
                start: attrs_start + whole.start(),
                end: attrs_start + whole.end(),
                value,
            })
        })
    }

    /// Replace `start..end` and move every recorded offset at or after `end`
    fn splice(&mut self, start: usize, end: usize, replacement: &str) {
        self.source.replace_range(start..end, replacement);
        let removed = end - start;
        let added = replacement.len();
        for span in &mut self.spans {
            for pos in span.positions_mut() {
                if *pos >= end {
                    *pos = *pos + added - removed;
                }
            }
        }
    }
}

impl Document for HtmlPage {
    type Handle = QuoteId;

    fn quotations(&self) -> Result<Vec<QuoteId>, DocumentError> {
        Ok(self.ids().collect())
    }

    fn content(&self, id: QuoteId) -> Cow<'_, str> {
        let span = self.spans[id.0];
        Cow::Borrowed(&self.source[span.open_end..span.close_start])
    }

    fn class(&self, id: QuoteId) -> Option<Cow<'_, str>> {
        self.class_attr(id)
            .map(|attr| html_escape::decode_html_entities(attr.value))
    }

    fn set_class(&mut self, id: QuoteId, class: &str) {
        let attr = format!(
            "class=\"{}\"",
            html_escape::encode_double_quoted_attribute(class)
        );
        match self.class_attr(id).map(|a| (a.start, a.end)) {
            Some((start, end)) => self.splice(start, end, &attr),
            None => {
                let at = self.spans[id.0].open_start + OPEN_PREFIX_LEN;
                self.splice(at, at, &format!(" {}", attr));
            }
        }
    }
}

/// Pair start and end tags, returning spans in document order
fn locate_quotations(source: &str) -> Result<Vec<QuoteSpan>, DocumentError> {
    let mut opens: Vec<(usize, usize)> = Vec::new();
    let mut closes: Vec<Option<(usize, usize)>> = Vec::new();
    let mut stack: Vec<usize> = Vec::new();

    for caps in TOKEN_RE.captures_iter(source) {
        let (Some(whole), Some(slash)) = (caps.get(0), caps.get(1)) else {
            continue;
        };

        if slash.as_str().is_empty() {
            stack.push(opens.len());
            opens.push((whole.start(), whole.end()));
            closes.push(None);
        } else {
            let index = stack.pop().ok_or(DocumentError::UnmatchedClose {
                line: line_of(source, whole.start()),
            })?;
            closes[index] = Some((whole.start(), whole.end()));
        }
    }

    if let Some(index) = stack.pop() {
        return Err(DocumentError::Unclosed {
            line: line_of(source, opens[index].0),
        });
    }

    Ok(opens
        .into_iter()
        .zip(closes)
        .filter_map(|((open_start, open_end), close)| {
            close.map(|(close_start, close_end)| QuoteSpan {
                open_start,
                open_end,
                close_start,
                close_end,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MarkerScanner;

    fn contents(page: &HtmlPage) -> Vec<String> {
        page.ids().map(|id| page.content(id).into_owned()).collect()
    }

    fn classes(page: &HtmlPage) -> Vec<Option<String>> {
        page.ids()
            .map(|id| page.class(id).map(|c| c.into_owned()))
            .collect()
    }

    #[test]
    fn test_locates_quotations_in_order() {
        let page = HtmlPage::parse(
            "<p>intro</p>\n<blockquote><p>one</p></blockquote>\n<blockquote id=\"b\">two</blockquote>",
        )
        .unwrap();

        assert_eq!(page.ids().count(), 2);
        assert_eq!(contents(&page), vec!["<p>one</p>", "two"]);
        assert_eq!(page.lines(QuoteId(1)), (3, 3));
    }

    #[test]
    fn test_tag_names_are_case_insensitive() {
        let page = HtmlPage::parse("<BLOCKQUOTE Class=x>a</BlockQuote>").unwrap();
        assert_eq!(contents(&page), vec!["a"]);
        assert_eq!(classes(&page), vec![Some("x".to_string())]);
    }

    #[test]
    fn test_similar_tag_names_are_not_quotations() {
        let page = HtmlPage::parse("<blockquotes>CODELINK</blockquotes><q>CODELINK</q>").unwrap();
        assert_eq!(page.ids().count(), 0);
    }

    #[test]
    fn test_nested_quotations() {
        let src = "<blockquote>outer <blockquote>inner CODELINK</blockquote> tail</blockquote>";
        let page = HtmlPage::parse(src).unwrap();

        assert_eq!(
            contents(&page),
            vec![
                "outer <blockquote>inner CODELINK</blockquote> tail",
                "inner CODELINK"
            ]
        );
        assert_eq!(page.byte_range(QuoteId(0)), 0..src.len());
    }

    #[test]
    fn test_comments_scripts_and_styles_are_skipped() {
        let src = "<!-- <blockquote>CODELINK</blockquote> -->\n\
<script>let s = \"<blockquote>\";</script>\n\
<style>blockquote::before { content: '</blockquote>'; }</style>\n\
<blockquote>real</blockquote>";
        let page = HtmlPage::parse(src).unwrap();
        assert_eq!(contents(&page), vec!["real"]);
    }

    #[test]
    fn test_raw_text_elements_are_skipped() {
        let src = "<title>Why </blockquote> matters</title>\n\
<textarea name=\"t\">type </blockquote> here</textarea>\n\
<noscript><blockquote>CODELINK</noscript>\n\
<xmp><blockquote></xmp>\n\
<blockquote>CODELINK</blockquote>";
        let mut page = HtmlPage::parse(src).unwrap();
        assert_eq!(contents(&page), vec!["CODELINK"]);
        assert_eq!(page.lines(QuoteId(0)), (5, 5));

        MarkerScanner::default().scan(&mut page).unwrap();
        assert!(page
            .as_str()
            .starts_with("<title>Why </blockquote> matters</title>\n<textarea name=\"t\">type </blockquote>"));
        assert!(page
            .as_str()
            .ends_with("<blockquote class=\"code-link\">CODELINK</blockquote>"));
    }

    #[test]
    fn test_unquoted_attribute_may_contain_apostrophe() {
        let mut page = HtmlPage::parse("<blockquote title=it's class=old>CODELINK</blockquote>").unwrap();
        assert_eq!(contents(&page), vec!["CODELINK"]);
        assert_eq!(classes(&page), vec![Some("old".to_string())]);

        MarkerScanner::default().scan(&mut page).unwrap();
        assert_eq!(
            page.as_str(),
            "<blockquote title=it's class=\"code-link\">CODELINK</blockquote>"
        );
    }

    #[test]
    fn test_quoted_attribute_may_contain_gt() {
        let page = HtmlPage::parse(r#"<blockquote title="a > b" class='q'>x</blockquote>"#).unwrap();
        assert_eq!(contents(&page), vec!["x"]);
        assert_eq!(classes(&page), vec![Some("q".to_string())]);
    }

    #[test]
    fn test_unmatched_close_reports_line() {
        let err = HtmlPage::parse("<p>a</p>\n\n</blockquote>").unwrap_err();
        assert_eq!(err, DocumentError::UnmatchedClose { line: 3 });
    }

    #[test]
    fn test_unclosed_reports_line() {
        let err = HtmlPage::parse("<blockquote>\n<blockquote>x</blockquote>\n").unwrap_err();
        assert_eq!(err, DocumentError::Unclosed { line: 1 });
    }

    #[test]
    fn test_set_class_inserts_after_tag_name() {
        let mut page = HtmlPage::parse("<blockquote>\n<p>CODELINK</p>\n</blockquote>").unwrap();
        page.set_class(QuoteId(0), "code-link");
        assert_eq!(
            page.as_str(),
            "<blockquote class=\"code-link\">\n<p>CODELINK</p>\n</blockquote>"
        );
    }

    #[test]
    fn test_set_class_replaces_existing_value() {
        for src in [
            r#"<blockquote id="q" class="note warn">x</blockquote>"#,
            r#"<blockquote id="q" class='note warn'>x</blockquote>"#,
            r#"<blockquote id="q" class=note>x</blockquote>"#,
        ] {
            let mut page = HtmlPage::parse(src).unwrap();
            page.set_class(QuoteId(0), "code-link");
            assert_eq!(page.as_str(), r#"<blockquote id="q" class="code-link">x</blockquote>"#);
        }
    }

    #[test]
    fn test_data_class_is_not_class() {
        let mut page =
            HtmlPage::parse(r#"<blockquote data-class="keep" title="class=x">x</blockquote>"#)
                .unwrap();
        assert_eq!(classes(&page), vec![None]);

        page.set_class(QuoteId(0), "code-link");
        assert_eq!(
            page.as_str(),
            r#"<blockquote class="code-link" data-class="keep" title="class=x">x</blockquote>"#
        );
    }

    #[test]
    fn test_offsets_follow_edits() {
        let mut page = HtmlPage::parse(
            "<blockquote>a <blockquote>b</blockquote></blockquote><blockquote>c</blockquote>",
        )
        .unwrap();
        page.set_class(QuoteId(1), "code-link");

        assert_eq!(
            contents(&page),
            vec![
                "a <blockquote class=\"code-link\">b</blockquote>",
                "b",
                "c"
            ]
        );
        assert_eq!(page.byte_range(QuoteId(0)).end, page.as_str().find("<blockquote>c").unwrap());
    }

    #[test]
    fn test_class_value_is_escaped_and_decoded() {
        let mut page = HtmlPage::parse("<blockquote>x</blockquote>").unwrap();
        page.set_class(QuoteId(0), "a\"b");
        assert_eq!(page.as_str(), "<blockquote class=\"a&quot;b\">x</blockquote>");
        assert_eq!(classes(&page), vec![Some("a\"b".to_string())]);
    }

    #[test]
    fn test_scan_html_page_end_to_end() {
        let src = "<h1>CODELINK</h1>\n\
<blockquote>\n<p><strong>CODELINK:</strong> <a href=\"src/main.rs\">main.rs</a></p>\n</blockquote>\n\
<blockquote class=\"aside\">\n<p>plain</p>\n</blockquote>\n\
<blockquote><p>also CODELINK x</p></blockquote>\n";
        let mut page = HtmlPage::parse(src).unwrap();
        let report = MarkerScanner::default().scan(&mut page).unwrap();

        assert_eq!(report.inspected, 3);
        assert_eq!(report.marked, vec![0, 2]);
        assert_eq!(
            classes(&page),
            vec![
                Some("code-link".to_string()),
                Some("aside".to_string()),
                Some("code-link".to_string())
            ]
        );
        assert!(page.as_str().starts_with("<h1>CODELINK</h1>\n<blockquote class=\"code-link\">"));
    }

    #[test]
    fn test_rescanning_output_is_identical() {
        let src = "<blockquote class=old>CODELINK</blockquote><blockquote>no</blockquote>";
        let mut page = HtmlPage::parse(src).unwrap();
        MarkerScanner::default().scan(&mut page).unwrap();
        let once = page.into_string();

        let mut again = HtmlPage::parse(once.clone()).unwrap();
        let report = MarkerScanner::default().scan(&mut again).unwrap();

        assert!(!report.changed());
        assert_eq!(again.as_str(), once);
    }

    #[test]
    fn test_page_without_quotations_is_untouched() {
        let src = "<!DOCTYPE html>\n<html><body><p>CODELINK</p></body></html>\n";
        let mut page = HtmlPage::parse(src).unwrap();
        let report = MarkerScanner::default().scan(&mut page).unwrap();

        assert_eq!(report.inspected, 0);
        assert_eq!(page.as_str(), src);
    }
}
