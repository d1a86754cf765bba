//! Domain types for representing extracted document content.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// Heading level that opens a new titled section.
pub const TOP_TITLE_LEVEL: u32 = 1;

/// The kind of a content block emitted by the document extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Prose or heading text.
    Text,
    /// A display equation, usually LaTeX.
    Equation,
    /// A figure with an image file on disk.
    Image,
    /// A table rendered as HTML.
    Table,
    /// Anything the extractor emits that we don't know about.
    #[default]
    #[serde(other)]
    Unknown,
}

impl ContentKind {
    /// Whether this block is shown as a visual (figure or table) on slides.
    pub fn is_visual(self) -> bool {
        matches!(self, Self::Image | Self::Table)
    }
}

/// A caption field, which extractors write either as one string or a list of lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Caption {
    One(String),
    Many(Vec<String>),
}

impl Caption {
    /// Join the caption into a single trimmed string.
    pub fn joined(&self) -> String {
        match self {
            Self::One(s) => s.trim().to_string(),
            Self::Many(lines) => lines
                .iter()
                .map(|l| l.trim())
                .filter(|l| !l.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// One element of the extractor's ordered content list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentEntry {
    /// Block type.
    #[serde(rename = "type", default)]
    pub kind: ContentKind,

    /// Text payload for text and equation blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Heading level; `Some(1)` marks a section heading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_level: Option<u32>,

    /// Image path relative to the extractor's output directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img_caption: Option<Caption>,

    /// Table body as HTML.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_body: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_caption: Option<Caption>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_footnote: Option<Caption>,

    /// Zero-based page the block was found on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_idx: Option<u32>,

    /// Any other fields, passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ContentEntry {
    /// Create a plain text entry.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: ContentKind::Text,
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Create a section heading entry.
    pub fn heading(text: impl Into<String>) -> Self {
        Self {
            text_level: Some(TOP_TITLE_LEVEL),
            ..Self::text(text)
        }
    }

    /// Create an equation entry.
    pub fn equation(text: impl Into<String>) -> Self {
        Self {
            kind: ContentKind::Equation,
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Create an image entry.
    pub fn image(path: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            kind: ContentKind::Image,
            img_path: Some(path.into()),
            img_caption: Some(Caption::One(caption.into())),
            ..Self::default()
        }
    }

    /// Create a table entry.
    pub fn table(html: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            kind: ContentKind::Table,
            table_body: Some(html.into()),
            table_caption: Some(Caption::One(caption.into())),
            ..Self::default()
        }
    }

    /// The trimmed text payload, empty when missing.
    pub fn trimmed_text(&self) -> &str {
        self.text.as_deref().unwrap_or_default().trim()
    }

    /// Whether this entry carries the top-level title marker.
    ///
    /// Enough to continue a title run, but only text can open one; see
    /// [`starts_title`](Self::starts_title).
    pub fn is_heading(&self) -> bool {
        self.text_level == Some(TOP_TITLE_LEVEL)
    }

    /// Whether this entry opens a top-level title run.
    pub fn starts_title(&self) -> bool {
        self.kind == ContentKind::Text && self.is_heading()
    }

    /// Whether this entry is body prose (text that is not a heading).
    pub fn is_prose(&self) -> bool {
        self.kind == ContentKind::Text && !self.is_heading()
    }

    /// Caption of a figure or table, empty when missing.
    pub fn caption(&self) -> String {
        let caption = match self.kind {
            ContentKind::Image => self.img_caption.as_ref(),
            ContentKind::Table => self.table_caption.as_ref(),
            _ => None,
        };
        caption.map(Caption::joined).unwrap_or_default()
    }
}

/// The ordered content list produced by the document extractor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentList {
    pub entries: Vec<ContentEntry>,
}

impl ContentList {
    /// Wrap already-built entries.
    pub fn new(entries: Vec<ContentEntry>) -> Self {
        Self { entries }
    }

    /// Parse a content list from JSON text.
    ///
    /// The root must be an array. Elements that fail to decode are replaced
    /// by an empty [`ContentKind::Unknown`] entry so indices stay aligned
    /// with the source file.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let root: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(root)
    }

    /// Parse a content list from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let root: serde_json::Value = serde_json::from_reader(reader)?;
        Self::from_value(root)
    }

    /// Read and parse a content list file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    fn from_value(root: serde_json::Value) -> Result<Self> {
        let serde_json::Value::Array(items) = root else {
            return Err(Error::ContentListError(
                "expected a JSON array of content entries".to_string(),
            ));
        };

        let entries = items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| {
                serde_json::from_value(item).unwrap_or_else(|e| {
                    log::warn!("Malformed content entry {} (treated as empty): {}", idx, e);
                    ContentEntry::default()
                })
            })
            .collect();

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over figure and table entries with their source index.
    pub fn visuals(&self) -> impl Iterator<Item = (usize, &ContentEntry)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.kind.is_visual())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_text_starts_title() {
        assert!(ContentEntry::heading("Intro").starts_title());
        assert!(!ContentEntry::text("body").starts_title());

        let mut equation = ContentEntry::equation("x");
        equation.text_level = Some(1);
        assert!(equation.is_heading());
        assert!(!equation.starts_title());
        assert!(!equation.is_prose());
    }

    #[test]
    fn test_parse_extractor_output() {
        let json = r#"[
            {"type": "text", "text": "Introduction", "text_level": 1, "page_idx": 0},
            {"type": "text", "text": "  Some prose.  ", "page_idx": 0},
            {"type": "equation", "text": "$$E = mc^2$$", "text_format": "latex"},
            {"type": "image", "img_path": "images/a.jpg", "img_caption": ["Figure 1.", "A cat"]},
            {"type": "table", "table_body": "<table></table>", "table_caption": "Table 1"}
        ]"#;

        let list = ContentList::from_json_str(json).unwrap();
        assert_eq!(list.len(), 5);
        assert!(list.entries[0].is_heading());
        assert_eq!(list.entries[1].trimmed_text(), "Some prose.");
        assert!(list.entries[1].is_prose());
        assert_eq!(list.entries[2].kind, ContentKind::Equation);
        assert_eq!(
            list.entries[2].extra.get("text_format"),
            Some(&serde_json::Value::String("latex".to_string()))
        );
        assert_eq!(list.entries[3].caption(), "Figure 1. A cat");
        assert_eq!(list.entries[4].caption(), "Table 1");
    }

    #[test]
    fn test_unknown_type_and_missing_fields() {
        let json = r#"[{"type": "interline_equation"}, {}, {"type": "text"}]"#;
        let list = ContentList::from_json_str(json).unwrap();

        assert_eq!(list.entries[0].kind, ContentKind::Unknown);
        assert_eq!(list.entries[1].kind, ContentKind::Unknown);
        assert_eq!(list.entries[2].kind, ContentKind::Text);
        assert_eq!(list.entries[2].trimmed_text(), "");
    }

    #[test]
    fn test_malformed_element_keeps_index() {
        let json = r#"[{"type": "text", "text": "a"}, 42, {"type": "text", "text": "b"}]"#;
        let list = ContentList::from_json_str(json).unwrap();

        assert_eq!(list.len(), 3);
        assert_eq!(list.entries[1], ContentEntry::default());
        assert_eq!(list.entries[2].trimmed_text(), "b");
    }

    #[test]
    fn test_non_array_root_is_error() {
        assert!(ContentList::from_json_str(r#"{"type": "text"}"#).is_err());
        assert!(ContentList::from_json_str("not json").is_err());
    }

    #[test]
    fn test_visuals_iterates_in_order() {
        let list = ContentList::new(vec![
            ContentEntry::text("a"),
            ContentEntry::image("x.png", ""),
            ContentEntry::equation("y"),
            ContentEntry::table("<table/>", "t"),
        ]);
        let indices: Vec<usize> = list.visuals().map(|(i, _)| i).collect();
        assert_eq!(indices, vec![1, 3]);
    }
}
