//! # Memory Page Module
//!
//! Renders the standalone HTML page of a memory record from a template
//! kept in the templates directory.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use tracing::{debug, info};

pub const TEMPLATE_FILE_NAME: &str = "memory_template.html";

/// Template written to the templates directory when none exists
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/memory_template.html");

/// Values shown on a memory page
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryPage<'a> {
    pub record_id: i64,
    pub name: &'a str,
    pub birth_date: &'a str,
    pub death_date: &'a str,
    pub memory_text: &'a str,
    pub photo_path: Option<&'a str>,
    pub candles_count: i64,
}

/// Escapes text for HTML; line breaks become `<br>`
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '\n' => escaped.push_str("<br>"),
            '\r' => {}
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Substitutes `{{key}}` placeholders in a single pass, so values are never expanded again.
/// Unknown placeholders are left as they are.
pub fn fill_template(template: &str, values: &HashMap<&str, String>) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = after[..end].trim();
                match values.get(key) {
                    Some(value) => output.push_str(value),
                    None => output.push_str(&rest[start..start + 2 + end + 2]),
                }
                rest = &after[end + 2..];
            }
            None => {
                output.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    output.push_str(rest);
    output
}

/// Renders the page HTML
pub fn render_page(template: &str, page: &MemoryPage<'_>, created_at: NaiveDateTime) -> String {
    let name = escape_html(page.name);
    let photo_section = match page.photo_path {
        Some(path) => format!(
            "<div class=\"photo-section\">\n            <img src=\"{}\" alt=\"Фото {}\" class=\"photo\">\n        </div>",
            escape_html(path),
            name
        ),
        None => String::new(),
    };

    let values = HashMap::from([
        ("name", name),
        ("birth_date", escape_html(page.birth_date)),
        ("death_date", escape_html(page.death_date)),
        ("memory_text", escape_html(page.memory_text)),
        ("photo_section", photo_section),
        ("candles_count", page.candles_count.to_string()),
        ("created_at", created_at.format("%d.%m.%Y %H:%M").to_string()),
    ]);

    fill_template(template, &values)
}

/// Writes memory pages into the pages directory
#[derive(Debug, Clone)]
pub struct MemoryPageWriter {
    templates_dir: PathBuf,
    pages_dir: PathBuf,
}

impl MemoryPageWriter {
    pub fn new(templates_dir: impl Into<PathBuf>, pages_dir: impl Into<PathBuf>) -> Self {
        Self {
            templates_dir: templates_dir.into(),
            pages_dir: pages_dir.into(),
        }
    }

    /// Reads the template, writing the default one first when it is missing
    pub async fn load_template(&self) -> Result<String> {
        let path = self.templates_dir.join(TEMPLATE_FILE_NAME);

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tokio::fs::create_dir_all(&self.templates_dir)
                .await
                .with_context(|| format!("Failed to create {}", self.templates_dir.display()))?;
            tokio::fs::write(&path, DEFAULT_TEMPLATE)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "Default memory page template created");
        }

        tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))
    }

    /// Renders and stores the page, returning its path
    pub async fn write_page(&self, page: &MemoryPage<'_>, now: NaiveDateTime) -> Result<PathBuf> {
        let template = self.load_template().await?;
        let html = render_page(&template, page, now);

        tokio::fs::create_dir_all(&self.pages_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.pages_dir.display()))?;

        let file_name = format!("memory_{}_{}.html", page.record_id, now.format("%Y%m%d_%H%M%S"));
        let path = self.pages_dir.join(file_name);
        tokio::fs::write(&path, html)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        debug!(record_id = page.record_id, path = %path.display(), "Memory page written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_page() -> MemoryPage<'static> {
        MemoryPage {
            record_id: 7,
            name: "Иван <Петров>",
            birth_date: "01.02.1940",
            death_date: "03.04.2020",
            memory_text: "Любящий отец\nи дед",
            photo_path: None,
            candles_count: 3,
        }
    }

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 9)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a < b & c\nd"), "a &lt; b &amp; c<br>d");
    }

    #[test]
    fn test_fill_template_single_pass() {
        let values = HashMap::from([("name", "{{created_at}}".to_string()), ("created_at", "x".to_string())]);
        assert_eq!(fill_template("{{name}} {{ created_at }} {{other}}", &values), "{{created_at}} x {{other}}");
        assert_eq!(fill_template("broken {{name", &values), "broken {{name");
    }

    #[test]
    fn test_render_default_template() {
        let html = render_page(DEFAULT_TEMPLATE, &sample_page(), noon());
        assert!(html.contains("Памяти Иван &lt;Петров&gt;"));
        assert!(html.contains("01.02.1940 — 03.04.2020"));
        assert!(html.contains("Любящий отец<br>и дед"));
        assert!(html.contains("Зажжено свечей памяти: 3"));
        assert!(html.contains("09.05.2024 12:30"));
        assert!(!html.contains("photo-section\">"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn test_photo_section_rendered_when_present() {
        let page = MemoryPage {
            photo_path: Some("memory_photos/abc.jpg"),
            ..sample_page()
        };
        let html = render_page(DEFAULT_TEMPLATE, &page, noon());
        assert!(html.contains("<img src=\"memory_photos/abc.jpg\""));
    }

    #[tokio::test]
    async fn test_write_page_creates_template_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let writer = MemoryPageWriter::new(dir.path().join("templates"), dir.path().join("pages"));

        let path = writer.write_page(&sample_page(), noon()).await.unwrap();

        assert_eq!(path.file_name().unwrap(), "memory_7_20240509_123000.html");
        assert!(dir.path().join("templates").join(TEMPLATE_FILE_NAME).exists());
        let html = std::fs::read_to_string(path).unwrap();
        assert!(html.contains("Любящий отец"));
    }
}
