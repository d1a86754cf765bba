//! Prompt construction for the summarization model.

use crate::chunker::Chunk;
use crate::types::{ContentEntry, ContentKind};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// An equation referenced by a chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquationRef {
    /// LaTeX or Markdown source.
    pub source: String,
    /// Rendered image file name, empty when the extractor gave none.
    pub file: String,
}

/// A figure or table referenced by a chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualRef {
    pub kind: ContentKind,
    pub caption: String,
    /// Image file name (no directories).
    pub file: String,
}

/// File name component of an extractor path, empty when missing.
pub fn file_name(path: Option<&str>) -> String {
    path.and_then(|p| Path::new(p).file_name())
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string()
}

/// Collect the equations bundled into a chunk.
pub fn chunk_equations(chunk: &Chunk, entries: &[ContentEntry]) -> Vec<EquationRef> {
    chunk
        .equations
        .iter()
        .filter_map(|&idx| entries.get(idx))
        .map(|e| EquationRef {
            source: e.trimmed_text().to_string(),
            file: file_name(e.img_path.as_deref()),
        })
        .collect()
}

/// Collect the figures and tables that fall inside a chunk.
pub fn chunk_visuals(chunk: &Chunk, entries: &[ContentEntry]) -> Vec<VisualRef> {
    chunk
        .visuals
        .iter()
        .filter_map(|&idx| entries.get(idx))
        .map(|e| VisualRef {
            kind: e.kind,
            caption: e.caption(),
            file: file_name(e.img_path.as_deref()),
        })
        .collect()
}

/// Decides between the plain bullet prompt and the sectioned prompt.
#[derive(Debug, Clone)]
pub struct PromptPolicy {
    /// Use sections when a chunk has more visuals than this.
    visual_threshold: usize,
    /// Use sections when a chunk has more equations than this.
    equation_threshold: usize,
}

impl Default for PromptPolicy {
    fn default() -> Self {
        Self {
            visual_threshold: 2,
            equation_threshold: 3,
        }
    }
}

impl PromptPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_visual_threshold(mut self, n: usize) -> Self {
        self.visual_threshold = n;
        self
    }

    pub fn with_equation_threshold(mut self, n: usize) -> Self {
        self.equation_threshold = n;
        self
    }

    /// Whether a chunk is rich enough to be split into several slides.
    pub fn wants_sections(&self, equations: usize, visuals: usize) -> bool {
        visuals > self.visual_threshold || equations > self.equation_threshold
    }

    /// Build the prompt for a chunk.
    pub fn chunk_prompt(&self, chunk: &Chunk, entries: &[ContentEntry]) -> String {
        let equations = chunk_equations(chunk, entries);
        let visuals = chunk_visuals(chunk, entries);
        let text = chunk.text();

        if self.wants_sections(equations.len(), visuals.len()) {
            sectioned_prompt(&text, &equations, &visuals)
        } else {
            text_prompt(&text, &equations)
        }
    }
}

fn equation_list(equations: &[EquationRef]) -> String {
    if equations.is_empty() {
        return "[None]".to_string();
    }
    equations
        .iter()
        .map(|eq| format!("- {} (filename: {})", eq.source, eq.file))
        .collect::<Vec<_>>()
        .join("\n")
}

fn visual_list<'a>(visuals: impl Iterator<Item = &'a VisualRef>) -> String {
    let items: Vec<String> = visuals
        .map(|v| format!("(Caption: {}) - (Filename: {})", v.caption, v.file))
        .collect();
    if items.is_empty() {
        "[None]".to_string()
    } else {
        items.join("\n")
    }
}

/// Bullet-point summary prompt for an ordinary chunk.
pub fn text_prompt(text: &str, equations: &[EquationRef]) -> String {
    format!(
        "You are a scientific assistant helping to summarize and organize technical research documents.

Your task:

1. Summarize the content into no more than 5 short bullet points:
- Each bullet must start with the \u{2022} symbol.
- Use plain English and short, clear sentences.
- Focus only on the main contributions, methods, or findings.
- Each point should convey a unique idea. Do not force 5 bullets if the content is limited.

2. If a bullet is supported by one of the equations below, append (Equation: filename) to that bullet.
Do NOT include math notation or equation content in the bullets.

3. Do NOT refer to images or tables. Avoid LaTeX, symbols, or code.

Output format (strict):
\u{2022} Bullet 1
\u{2022} Bullet 2

Do NOT include any titles, explanations, or extra text.

---

Raw Text:
{}

---

Equations:
{}

Write the summary bullets now.",
        text.trim(),
        equation_list(equations)
    )
}

/// Multi-section prompt for chunks with many visuals or equations.
pub fn sectioned_prompt(text: &str, equations: &[EquationRef], visuals: &[VisualRef]) -> String {
    let max_sections = visuals.len() + 1;
    let figures = visual_list(visuals.iter().filter(|v| v.kind != ContentKind::Table));
    let tables = visual_list(visuals.iter().filter(|v| v.kind == ContentKind::Table));

    format!(
        "You are a scientific assistant helping to summarize and organize technical research documents.

Input: a raw text block from a scientific paper, the equations it contains, and its figures and tables.

Goals:
1. Summarize the text into concise, clear bullet points.
2. Organize the bullets into sections. Each section starts with a header line `### Section N: Title`.
   Each section has at most 5 bullets and references at most 2 visuals.
   The total number of sections must not exceed {max_sections}.
3. Annotate bullets with related visuals or equations using (Image: file.png), (Table: file.png) or (Equation: file.png).
   Use at most 2 references per bullet and never invent filenames.

Every figure, table, and equation should be referenced by at least one bullet when relevant.
Do not include mathematical notation, LaTeX, or special symbols. Start every bullet with `*`.

Raw Text:
{text}

---

Equations:
{equations}

---

Figures:
{figures}

---

Tables:
{tables}

---

Now write the summary bullets, organized by section.",
        max_sections = max_sections,
        text = text.trim(),
        equations = equation_list(equations),
        figures = figures,
        tables = tables,
    )
}

/// Prompt for describing a figure.
pub fn image_prompt(caption: &str) -> String {
    format!(
        "The following image is from a scientific paper, and its caption (if any) is:\n\n\
         {}\n\n\
         Based on both the visual content and the caption, write a concise description of the image \
         in at most 100 words, in a neutral academic tone.\n\n\
         Then write a very short caption (one sentence, 5-15 words) to display below the image on a slide. \
         Always include the short caption.\n\n\
         Return the result in exactly this format:\n\
         **Image Description**: <description>\n\
         **Image Caption**: <short caption>",
        caption.trim()
    )
}

/// Prompt for describing a table.
pub fn table_prompt(caption: &str, html: &str) -> String {
    format!(
        "You are an assistant tasked with analyzing and summarizing tables from scientific papers. \
         The following is an HTML table and its caption (if any).\n\n\
         Table Caption: {}\n\
         Table Data (HTML):\n{}\n\n\
         Summarize the main results, explicitly including key numerical values and which methods \
         performed best on each metric. Use a clear, objective academic tone and do not restate the caption.\n\n\
         Then write a very short caption (one sentence, 5-15 words) that states the key insight of the table.\n\n\
         Return the result in this format:\n\
         **Table Description**: <analysis>\n\
         **Table Caption**: <short caption>",
        caption.trim(),
        html.trim()
    )
}
