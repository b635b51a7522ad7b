//! Source file parsing for knowledge documents.
//!
//! Two formats are understood:
//! - Markdown with an optional `---` front-matter block of `key: value` lines
//! - JSON objects with `id`, `title`, `url`, `source`, `updated_at`, `content`

use crate::types::Document;
use healthdesk_core::{AppError, AppResult};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Content type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Markdown,
    Json,
    Unknown,
}

impl ContentType {
    /// Detect content type from file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("md") => Self::Markdown,
            Some("json") => Self::Json,
            _ => Self::Unknown,
        }
    }
}

/// Front matter and body of a Markdown file.
#[derive(Debug, Default, PartialEq)]
pub struct FrontMatter {
    pub meta: HashMap<String, String>,
    pub body: String,
}

/// Split an optional leading `---` block off a Markdown text.
///
/// A block without a closing `---` consumes the whole file.
pub fn parse_front_matter(text: &str) -> FrontMatter {
    let lines: Vec<&str> = text.lines().collect();

    if lines.first().map(|l| l.trim()) != Some("---") {
        return FrontMatter {
            meta: HashMap::new(),
            body: text.to_string(),
        };
    }

    let mut meta = HashMap::new();
    let mut body_start = lines.len();
    for (i, line) in lines.iter().enumerate().skip(1) {
        if line.trim() == "---" {
            body_start = i + 1;
            break;
        }
        if let Some((key, value)) = parse_meta_line(line) {
            meta.insert(key.to_string(), value.to_string());
        }
    }

    FrontMatter {
        meta,
        body: lines[body_start..].join("\n"),
    }
}

fn parse_meta_line(line: &str) -> Option<(&str, &str)> {
    let (left, right) = line.split_once(':')?;
    let key = left.trim_end();
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    valid.then(|| (key, right.trim()))
}

/// First level-one `# heading` in a Markdown body.
fn first_heading(body: &str) -> Option<&str> {
    body.lines().find_map(|line| {
        let rest = line.trim_start().strip_prefix('#')?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let title = rest.trim();
        (!title.is_empty()).then_some(title)
    })
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.is_empty()).cloned()
}

/// Build a document from a Markdown file's contents.
pub fn markdown_to_document(path: &Path, text: &str) -> Document {
    let FrontMatter { meta, body } = parse_front_matter(text);

    let id = non_empty(meta.get("id")).unwrap_or_else(|| file_stem(path));
    let title = non_empty(meta.get("title"))
        .or_else(|| first_heading(&body).map(str::to_string))
        .unwrap_or_else(|| id.clone());

    Document {
        title,
        url: meta.get("url").cloned().unwrap_or_default(),
        source: meta.get("source").cloned().unwrap_or_default(),
        updated_at: meta.get("updated_at").cloned().unwrap_or_default(),
        content: body.trim().to_string(),
        id,
    }
}

#[derive(Debug, Deserialize)]
struct RawJsonDocument {
    id: Option<String>,
    title: Option<String>,
    url: Option<String>,
    source: Option<String>,
    updated_at: Option<String>,
    content: Option<String>,
}

/// Build a document from a JSON file's contents.
///
/// Returns `Ok(None)` for well-formed JSON that is not a usable document
/// (no content, or neither title nor id).
pub fn json_to_document(path: &Path, text: &str) -> AppResult<Option<Document>> {
    let raw: RawJsonDocument = serde_json::from_str(text)
        .map_err(|e| AppError::Knowledge(format!("Invalid JSON document {:?}: {}", path, e)))?;

    let id = non_empty(raw.id.as_ref());
    let title = non_empty(raw.title.as_ref());
    let Some(content) = non_empty(raw.content.as_ref()) else {
        return Ok(None);
    };
    if id.is_none() && title.is_none() {
        return Ok(None);
    }

    let id = id.unwrap_or_else(|| file_stem(path));
    Ok(Some(Document {
        title: title.unwrap_or_else(|| id.clone()),
        url: raw.url.unwrap_or_default(),
        source: raw.source.unwrap_or_default(),
        updated_at: raw.updated_at.unwrap_or_default(),
        content,
        id,
    }))
}

/// Parse a knowledge file into a document.
///
/// `Ok(None)` means the file is not a knowledge document and should be skipped.
pub fn parse_file(path: &Path) -> AppResult<Option<Document>> {
    let content_type = ContentType::from_path(path);
    if content_type == ContentType::Unknown {
        return Ok(None);
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| AppError::Knowledge(format!("Failed to read {:?}: {}", path, e)))?;

    match content_type {
        ContentType::Markdown => Ok(Some(markdown_to_document(path, &raw))),
        ContentType::Json => json_to_document(path, &raw),
        ContentType::Unknown => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_front_matter_parsing() {
        let text = "---\nid: fever\ntitle: 発熱について\nurl: https://example.jp\n---\n本文です\n";
        let fm = parse_front_matter(text);

        assert_eq!(fm.meta.get("id").map(String::as_str), Some("fever"));
        assert_eq!(fm.meta.get("title").map(String::as_str), Some("発熱について"));
        assert_eq!(fm.body, "本文です");
    }

    #[test]
    fn test_front_matter_ignores_invalid_keys() {
        let fm = parse_front_matter("---\n  indented: no\nbad key: no\nok_key : yes\n---\nbody");
        assert_eq!(fm.meta.len(), 1);
        assert_eq!(fm.meta.get("ok_key").map(String::as_str), Some("yes"));
    }

    #[test]
    fn test_no_front_matter() {
        let fm = parse_front_matter("# 見出し\n本文");
        assert!(fm.meta.is_empty());
        assert_eq!(fm.body, "# 見出し\n本文");
    }

    #[test]
    fn test_unclosed_front_matter_consumes_file() {
        let fm = parse_front_matter("---\nid: x\nbody line");
        assert_eq!(fm.meta.get("id").map(String::as_str), Some("x"));
        assert_eq!(fm.body, "");
    }

    #[test]
    fn test_markdown_title_fallbacks() {
        let path = Path::new("kb/heat.md");

        let from_heading = markdown_to_document(path, "intro\n# 熱中症の予防\n本文");
        assert_eq!(from_heading.id, "heat");
        assert_eq!(from_heading.title, "熱中症の予防");

        let from_id = markdown_to_document(path, "## not level one\n本文");
        assert_eq!(from_id.title, "heat");
        assert_eq!(from_id.content, "## not level one\n本文");
    }

    #[test]
    fn test_markdown_metadata_fields() {
        let doc = markdown_to_document(
            Path::new("kb/a.md"),
            "---\nid: custom\nsource: 厚生労働省\nupdated_at: 2024-05-01\n---\n\n  内容  \n",
        );
        assert_eq!(doc.id, "custom");
        assert_eq!(doc.source, "厚生労働省");
        assert_eq!(doc.updated_at, "2024-05-01");
        assert_eq!(doc.content, "内容");
    }

    #[test]
    fn test_json_document() {
        let doc = json_to_document(
            Path::new("data/kb/cold.json"),
            r#"{"title": "かぜ", "content": "安静に", "url": "u"}"#,
        )
        .unwrap()
        .unwrap();

        assert_eq!(doc.id, "cold");
        assert_eq!(doc.title, "かぜ");
        assert_eq!(doc.url, "u");
    }

    #[test]
    fn test_json_document_requires_content_and_name() {
        let path = Path::new("x.json");
        assert!(json_to_document(path, r#"{"title": "t"}"#).unwrap().is_none());
        assert!(json_to_document(path, r#"{"content": "c"}"#).unwrap().is_none());
        assert!(json_to_document(path, "not json").is_err());
    }

    #[test]
    fn test_content_type() {
        assert_eq!(ContentType::from_path(Path::new("a.md")), ContentType::Markdown);
        assert_eq!(ContentType::from_path(Path::new("a.json")), ContentType::Json);
        assert_eq!(ContentType::from_path(Path::new("a.txt")), ContentType::Unknown);
    }
}
