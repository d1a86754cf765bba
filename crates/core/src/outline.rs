//! Plain-text slide outline output.
//!
//! Generates a text deck where each slide is a `# Title` line followed by
//! its bullets, slides separated by a blank line, with a configurable
//! number of bullets per slide (default: 5).

use crate::normalize::collapse_whitespace;
use crate::response::bullet_lines;
use crate::summarize::{DeckContent, SummaryBlock, VisualSummary};
use crate::types::ContentKind;
use serde::{Deserialize, Serialize};

/// Formatter for text slide outlines.
#[derive(Debug, Clone)]
pub struct OutlineFormatter {
    /// Maximum number of bullets on one slide.
    bullets_per_slide: usize,
}

impl Default for OutlineFormatter {
    fn default() -> Self {
        Self {
            bullets_per_slide: 5,
        }
    }
}

impl OutlineFormatter {
    /// Create a new formatter with the default 5 bullets per slide.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a formatter with a custom number of bullets per slide.
    pub fn with_bullets_per_slide(mut self, bullets: usize) -> Self {
        self.bullets_per_slide = bullets.max(1); // At least 1 bullet per slide
        self
    }

    /// Lay out a deck as slides.
    ///
    /// The first summary block becomes the title slide (falling back to
    /// `document_name` when it has no heading). Remaining blocks become
    /// content slides, with overflowing bullets moved to continuation
    /// slides. Figure and table summaries follow at the end.
    pub fn slides(&self, deck: &DeckContent, document_name: &str) -> Vec<OutlineSlide> {
        let mut slides = Vec::new();
        let mut blocks = deck.blocks.iter();

        if let Some(first) = blocks.next() {
            let title = one_line(&first.heading);
            slides.push(OutlineSlide {
                title: if title.is_empty() { document_name.to_string() } else { title },
                subtitle: Some(first.text.trim().to_string()).filter(|s| !s.is_empty()),
                bullets: Vec::new(),
                visuals: Vec::new(),
            });
        } else if !document_name.is_empty() {
            slides.push(OutlineSlide::titled(document_name));
        }

        for block in blocks {
            slides.extend(self.block_slides(block));
        }

        slides.extend(deck.figures.iter().map(visual_slide));
        slides.extend(deck.tables.iter().map(visual_slide));

        slides
    }

    fn block_slides(&self, block: &SummaryBlock) -> Vec<OutlineSlide> {
        let heading = one_line(&block.heading);
        let title = match block.sub_heading.as_deref().map(str::trim) {
            Some(sub) if !sub.is_empty() && !heading.is_empty() => format!("{}: {}", heading, sub),
            Some(sub) if !sub.is_empty() => sub.to_string(),
            _ => heading,
        };

        let bullets = bullet_lines(&block.text);
        if bullets.is_empty() {
            if block.visuals.is_empty() {
                return Vec::new();
            }
            let mut slide = OutlineSlide::titled(&title);
            slide.visuals = block.visuals.clone();
            return vec![slide];
        }

        bullets
            .chunks(self.bullets_per_slide)
            .enumerate()
            .map(|(i, group)| OutlineSlide {
                title: if i == 0 { title.clone() } else { format!("{} (cont.)", title) },
                subtitle: None,
                bullets: group.to_vec(),
                visuals: if i == 0 { block.visuals.clone() } else { Vec::new() },
            })
            .collect()
    }

    /// Format a deck as outline text.
    ///
    /// # Example output
    /// ```text
    /// # Attention Is All You Need
    /// We propose the Transformer.
    ///
    /// # Model Architecture
    /// - Encoder and decoder stacks
    /// - Multi-head attention
    /// [Visual: fig1.jpg]
    /// ```
    pub fn format(&self, deck: &DeckContent, document_name: &str) -> String {
        self.slides(deck, document_name)
            .iter()
            .map(OutlineSlide::render)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Format and add a trailing newline.
    pub fn format_with_newline(&self, deck: &DeckContent, document_name: &str) -> String {
        let formatted = self.format(deck, document_name);
        if formatted.is_empty() {
            formatted
        } else {
            format!("{}\n", formatted)
        }
    }
}

/// One slide of the outline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineSlide {
    pub title: String,
    pub subtitle: Option<String>,
    pub bullets: Vec<String>,
    /// File names of figures or tables placed on this slide.
    pub visuals: Vec<String>,
}

impl OutlineSlide {
    fn titled(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Self::default()
        }
    }

    /// Render the slide as text lines.
    pub fn render(&self) -> String {
        let mut lines = vec![format!("# {}", self.title)];
        if let Some(subtitle) = &self.subtitle {
            lines.push(subtitle.clone());
        }
        lines.extend(self.bullets.iter().map(|b| format!("- {}", b)));
        lines.extend(self.visuals.iter().map(|v| format!("[Visual: {}]", v)));
        lines.join("\n")
    }
}

fn visual_slide(visual: &VisualSummary) -> OutlineSlide {
    let label = if visual.kind == ContentKind::Table { "Table" } else { "Figure" };
    let file = visual
        .path
        .as_deref()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let title = if visual.caption.is_empty() {
        label.to_string()
    } else {
        format!("{}: {}", label, visual.caption)
    };

    OutlineSlide {
        title,
        subtitle: None,
        bullets: Some(visual.description.trim().to_string())
            .filter(|d| !d.is_empty())
            .into_iter()
            .collect(),
        visuals: if file.is_empty() { Vec::new() } else { vec![file.to_string()] },
    }
}

/// Multi-line titles are shown on a single line.
fn one_line(title: &str) -> String {
    collapse_whitespace(title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn block(heading: &str, sub: Option<&str>, text: &str, visuals: &[&str]) -> SummaryBlock {
        SummaryBlock {
            heading: heading.to_string(),
            sub_heading: sub.map(str::to_string),
            text: text.to_string(),
            visuals: visuals.iter().map(|v| v.to_string()).collect(),
        }
    }

    #[test]
    fn test_format_empty() {
        let formatter = OutlineFormatter::new();
        assert_eq!(formatter.format(&DeckContent::default(), ""), "");
        assert_eq!(formatter.format(&DeckContent::default(), "paper"), "# paper");
    }

    #[test]
    fn test_title_slide_from_first_block() {
        let deck = DeckContent {
            blocks: vec![block("Deep\nLearning", None, "Authors et al.", &[])],
            ..DeckContent::default()
        };
        let slides = OutlineFormatter::new().slides(&deck, "paper");
        assert_eq!(slides.len(), 1);
        assert_eq!(slides[0].title, "Deep Learning");
        assert_eq!(slides[0].subtitle.as_deref(), Some("Authors et al."));
    }

    #[test]
    fn test_title_slide_falls_back_to_document_name() {
        let deck = DeckContent {
            blocks: vec![block("", None, "abstract", &[])],
            ..DeckContent::default()
        };
        let slides = OutlineFormatter::new().slides(&deck, "paper");
        assert_eq!(slides[0].title, "paper");
    }

    #[test]
    fn test_bullets_split_into_continuation_slides() {
        let deck = DeckContent {
            blocks: vec![
                block("Title", None, "", &[]),
                block("Methods", Some("Training"), "\u{2022} a\n\u{2022} b\n\u{2022} c", &["fig.png"]),
            ],
            ..DeckContent::default()
        };

        let slides = OutlineFormatter::new().with_bullets_per_slide(2).slides(&deck, "doc");
        assert_eq!(slides.len(), 3);
        assert_eq!(slides[1].title, "Methods: Training");
        assert_eq!(slides[1].bullets, vec!["a", "b"]);
        assert_eq!(slides[1].visuals, vec!["fig.png"]);
        assert_eq!(slides[2].title, "Methods: Training (cont.)");
        assert_eq!(slides[2].bullets, vec!["c"]);
        assert!(slides[2].visuals.is_empty());
    }

    #[test]
    fn test_block_without_bullets_or_visuals_dropped() {
        let deck = DeckContent {
            blocks: vec![block("T", None, "x", &[]), block("Empty", None, "  ", &[])],
            ..DeckContent::default()
        };
        assert_eq!(OutlineFormatter::new().slides(&deck, "d").len(), 1);
    }

    #[test]
    fn test_visual_slides_follow_blocks() {
        let deck = DeckContent {
            blocks: vec![block("T", None, "x", &[])],
            figures: vec![VisualSummary {
                source_index: 3,
                kind: ContentKind::Image,
                path: Some(PathBuf::from("/out/images/f.jpg")),
                description: "A plot.".to_string(),
                caption: "Loss curve".to_string(),
            }],
            tables: vec![VisualSummary {
                source_index: 5,
                kind: ContentKind::Table,
                path: None,
                description: String::new(),
                caption: String::new(),
            }],
        };

        let text = OutlineFormatter::new().format(&deck, "d");
        assert_eq!(
            text,
            "# T\nx\n\n# Figure: Loss curve\n- A plot.\n[Visual: f.jpg]\n\n# Table"
        );
    }

    #[test]
    fn test_format_with_trailing_newline() {
        let deck = DeckContent {
            blocks: vec![block("T", None, "x", &[])],
            ..DeckContent::default()
        };
        assert!(OutlineFormatter::new().format_with_newline(&deck, "d").ends_with('\n'));
    }

    #[test]
    fn test_bullets_per_slide_clamped() {
        let deck = DeckContent {
            blocks: vec![block("T", None, "", &[]), block("S", None, "a\nb", &[])],
            ..DeckContent::default()
        };
        let slides = OutlineFormatter::new().with_bullets_per_slide(0).slides(&deck, "d");
        assert_eq!(slides.len(), 3);
    }
}
