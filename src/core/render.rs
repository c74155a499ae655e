//! Renderer module
//!
//! Renders ResultSet to different output formats: jsonl, json, md, raw

use crate::core::model::{Kind, ResultItem, ResultSet, Status};
use std::io::Write;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Jsonl,
    Json,
    Markdown,
    Raw,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jsonl" => Ok(OutputFormat::Jsonl),
            "json" => Ok(OutputFormat::Json),
            "md" | "markdown" => Ok(OutputFormat::Markdown),
            "raw" => Ok(OutputFormat::Raw),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Render configuration combining format and options
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderConfig {
    pub format: OutputFormat,
    pub pretty: bool,
}

impl RenderConfig {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            pretty: false,
        }
    }

    pub fn with_pretty(format: OutputFormat, pretty: bool) -> Self {
        Self { format, pretty }
    }
}

/// Renderer for result sets
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            config: RenderConfig::new(format),
        }
    }

    pub fn with_config(config: RenderConfig) -> Self {
        Self { config }
    }

    /// Render a result set to a string
    pub fn render(&self, result_set: &ResultSet) -> String {
        match self.config.format {
            OutputFormat::Jsonl => self.render_jsonl(result_set),
            OutputFormat::Json => self.render_json(result_set),
            OutputFormat::Markdown => self.render_markdown(result_set),
            OutputFormat::Raw => self.render_raw(result_set),
        }
    }

    /// Render to a writer, followed by a newline when there is any output
    pub fn render_to<W: Write>(&self, result_set: &ResultSet, mut writer: W) -> std::io::Result<()> {
        let output = self.render(result_set);
        if output.is_empty() {
            return Ok(());
        }
        writer.write_all(output.as_bytes())?;
        writer.write_all(b"\n")
    }

    /// Render as JSON Lines (one JSON object per line)
    fn render_jsonl(&self, result_set: &ResultSet) -> String {
        result_set
            .items
            .iter()
            .filter_map(|item| {
                if self.config.pretty {
                    serde_json::to_string_pretty(item).ok()
                } else {
                    serde_json::to_string(item).ok()
                }
            })
            .collect::<Vec<_>>()
            .join(if self.config.pretty { "\n\n" } else { "\n" })
    }

    /// Render as a single JSON array
    fn render_json(&self, result_set: &ResultSet) -> String {
        if self.config.pretty {
            serde_json::to_string_pretty(&result_set.items).unwrap_or_else(|_| "[]".to_string())
        } else {
            serde_json::to_string(&result_set.items).unwrap_or_else(|_| "[]".to_string())
        }
    }

    /// Render as Markdown
    fn render_markdown(&self, result_set: &ResultSet) -> String {
        let mut output = String::new();

        let mut pages = Vec::new();
        let mut quotes = Vec::new();
        let mut errors = Vec::new();

        for item in &result_set.items {
            match item.kind {
                Kind::Page => pages.push(item),
                Kind::Quote => quotes.push(item),
                Kind::Error => errors.push(item),
            }
        }

        if !errors.is_empty() {
            output.push_str("## Errors\n\n");
            for item in errors {
                for error in &item.errors {
                    match &item.path {
                        Some(path) => output.push_str(&format!(
                            "- **{}** `{}`: {}\n",
                            error.code, path, error.message
                        )),
                        None => {
                            output.push_str(&format!("- **{}**: {}\n", error.code, error.message))
                        }
                    }
                }
            }
            output.push('\n');
        }

        if !pages.is_empty() {
            output.push_str("## Pages\n\n");
            for item in pages {
                if let Some(path) = &item.path {
                    output.push_str(&format!("- `{}` ({})", path, status_label(item.status)));
                    if let Some(size) = item.meta.size {
                        output.push_str(&format!(" {} bytes", size));
                    }
                    output.push('\n');
                }
            }
            output.push('\n');
        }

        if !quotes.is_empty() {
            output.push_str("## Quotations\n\n");
            for item in quotes {
                self.render_item_md(&mut output, item);
            }
        }

        output
    }

    fn render_item_md(&self, output: &mut String, item: &ResultItem) {
        if let Some(path) = &item.path {
            output.push_str(&format!("### `{}`", path));
            if let Some(range) = &item.range {
                output.push_str(&format!(" (lines {}-{})", range.start, range.end));
            }
            output.push_str(&format!(" {}\n", status_label(item.status)));
        }

        if let Some(excerpt) = &item.excerpt {
            output.push_str("\n```html\n");
            output.push_str(excerpt);
            if !excerpt.ends_with('\n') {
                output.push('\n');
            }
            output.push_str("```\n");
        }

        if item.meta.truncated {
            output.push_str("\n> Content was truncated\n");
        }

        output.push('\n');
    }

    /// Render as raw output (for debugging)
    fn render_raw(&self, result_set: &ResultSet) -> String {
        result_set
            .items
            .iter()
            .filter_map(|item| item.excerpt.clone())
            .collect::<Vec<_>>()
            .join("\n---\n")
    }
}

fn status_label(status: Status) -> &'static str {
    match status {
        Status::Marked => "marked",
        Status::Pending => "pending",
        Status::Unchanged => "unchanged",
        Status::Failed => "failed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{ItemError, Range, ResultItem};

    fn sample_set() -> ResultSet {
        let mut set = ResultSet::new();
        set.push(ResultItem::page("ch01.html", Status::Marked));
        set.push(
            ResultItem::quote("ch01.html", Range::lines(12, 14), Status::Marked)
                .with_excerpt("<p>CODELINK: src/main.rs</p>"),
        );
        set
    }

    #[test]
    fn test_render_jsonl() {
        let renderer = Renderer::new(OutputFormat::Jsonl);
        let output = renderer.render(&sample_set());

        assert_eq!(output.lines().count(), 2);
        assert!(output.lines().all(|l| l.starts_with('{')));
    }

    #[test]
    fn test_render_json() {
        let renderer = Renderer::new(OutputFormat::Json);
        let output = renderer.render(&sample_set());

        assert!(output.starts_with('['));
        assert!(output.ends_with(']'));
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("jsonl".parse::<OutputFormat>().unwrap(), OutputFormat::Jsonl);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("Markdown".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("raw".parse::<OutputFormat>().unwrap(), OutputFormat::Raw);
    }

    #[test]
    fn test_output_format_parse_invalid() {
        let result = "yaml".parse::<OutputFormat>();
        assert!(result.unwrap_err().contains("Unknown format"));
    }

    #[test]
    fn test_render_jsonl_pretty() {
        let config = RenderConfig::with_pretty(OutputFormat::Jsonl, true);
        let output = Renderer::with_config(config).render(&sample_set());

        assert!(output.contains("\n\n"));
        assert!(output.contains("  \"kind\""));
    }

    #[test]
    fn test_render_markdown_empty() {
        let output = Renderer::new(OutputFormat::Markdown).render(&ResultSet::new());
        assert!(output.is_empty());
    }

    #[test]
    fn test_render_markdown_sections() {
        let mut set = sample_set();
        set.push(ResultItem::error(
            Some("bad.html".to_string()),
            ItemError::new("MALFORMED_MARKUP", "unclosed <blockquote> at line 4"),
        ));
        let output = Renderer::new(OutputFormat::Markdown).render(&set);

        assert!(output.contains("## Errors"));
        assert!(output.contains("**MALFORMED_MARKUP** `bad.html`"));
        assert!(output.contains("## Pages"));
        assert!(output.contains("- `ch01.html` (marked)"));
        assert!(output.contains("## Quotations"));
        assert!(output.contains("(lines 12-14) marked"));
        assert!(output.contains("```html"));
    }

    #[test]
    fn test_render_markdown_truncated() {
        let mut set = ResultSet::new();
        let mut item = ResultItem::quote("a.html", Range::lines(1, 40), Status::Unchanged)
            .with_excerpt("long");
        item.meta.truncated = true;
        set.push(item);

        let output = Renderer::new(OutputFormat::Markdown).render(&set);
        assert!(output.contains("truncated"));
    }

    #[test]
    fn test_render_raw() {
        let mut set = sample_set();
        set.push(
            ResultItem::quote("ch02.html", Range::lines(3, 3), Status::Unchanged)
                .with_excerpt("plain"),
        );
        let output = Renderer::new(OutputFormat::Raw).render(&set);

        assert_eq!(output, "<p>CODELINK: src/main.rs</p>\n---\nplain");
    }

    #[test]
    fn test_render_to_writer() {
        let renderer = Renderer::new(OutputFormat::Json);
        let mut buffer = Vec::new();
        renderer.render_to(&sample_set(), &mut buffer).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert!(output.contains("ch01.html"));
        assert!(output.ends_with("]\n"));
    }

    #[test]
    fn test_render_to_writer_skips_empty_output() {
        let renderer = Renderer::new(OutputFormat::Jsonl);
        let mut buffer = Vec::new();
        renderer.render_to(&ResultSet::new(), &mut buffer).unwrap();
        assert!(buffer.is_empty());
    }
}
