//! Summarization of chunks, figures, and tables through a pluggable model backend.
//!
//! One failing item never aborts the batch: it is logged and replaced by a
//! placeholder, and output order always follows document order.

use crate::chunker::Chunk;
use crate::error::Result;
use crate::prompt::{self, PromptPolicy};
use crate::response::{bullet_lines, parse_labeled, parse_sections, LabeledSummary};
use crate::types::{ContentEntry, ContentKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Placeholder text for a chunk whose summary could not be produced.
pub const SUMMARY_FAILED: &str = "[Summary failed]";

/// One request to the summarization backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRequest {
    /// Full prompt text.
    pub prompt: String,
    /// The raw content being summarized (chunk text, caption, or table HTML).
    pub source: String,
    /// Image to send along with the prompt, for figures.
    pub image: Option<PathBuf>,
}

/// A backend that turns a prompt into summary text.
pub trait Summarizer {
    fn summarize(&self, request: &SummaryRequest) -> Result<String>;
}

impl<S: Summarizer + ?Sized> Summarizer for Box<S> {
    fn summarize(&self, request: &SummaryRequest) -> Result<String> {
        (**self).summarize(request)
    }
}

impl<S: Summarizer + ?Sized> Summarizer for &S {
    fn summarize(&self, request: &SummaryRequest) -> Result<String> {
        (**self).summarize(request)
    }
}

/// Offline backend that echoes the source content back.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughSummarizer;

impl Summarizer for PassthroughSummarizer {
    fn summarize(&self, request: &SummaryRequest) -> Result<String> {
        Ok(request.source.clone())
    }
}

/// Summary of one chunk (or one section of a chunk).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryBlock {
    /// Title of the chunk the summary came from.
    pub heading: String,
    /// Section title when the chunk was summarized in several sections.
    pub sub_heading: Option<String>,
    /// Summary text, one bullet per line.
    pub text: String,
    /// File names of figures and tables shown next to the summary.
    pub visuals: Vec<String>,
}

/// Summary of a figure or table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualSummary {
    /// Index of the entry in the content list.
    pub source_index: usize,
    pub kind: ContentKind,
    /// Resolved image path, when the extractor provided one.
    pub path: Option<PathBuf>,
    pub description: String,
    pub caption: String,
}

/// Everything needed to lay out a deck.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckContent {
    pub blocks: Vec<SummaryBlock>,
    pub figures: Vec<VisualSummary>,
    pub tables: Vec<VisualSummary>,
}

/// Drives a [`Summarizer`] over chunks and visuals.
#[derive(Debug, Clone)]
pub struct Pipeline<S> {
    summarizer: S,
    policy: PromptPolicy,
}

impl<S: Summarizer> Pipeline<S> {
    pub fn new(summarizer: S) -> Self {
        Self {
            summarizer,
            policy: PromptPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: PromptPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Summarize chunks, then figures and tables.
    pub fn run(&self, chunks: &[Chunk], entries: &[ContentEntry], images_root: Option<&Path>) -> DeckContent {
        let blocks = self.summarize_chunks(chunks, entries);
        let (figures, tables) = self.summarize_visuals(entries, images_root);
        DeckContent {
            blocks,
            figures,
            tables,
        }
    }

    /// Summarize every chunk, in order.
    pub fn summarize_chunks(&self, chunks: &[Chunk], entries: &[ContentEntry]) -> Vec<SummaryBlock> {
        let mut blocks = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            log::info!(
                "Summarizing chunk {}/{}: {}",
                idx + 1,
                chunks.len(),
                chunk.title.lines().next().unwrap_or_default()
            );
            blocks.extend(self.summarize_chunk(chunk, entries));
        }
        blocks
    }

    fn summarize_chunk(&self, chunk: &Chunk, entries: &[ContentEntry]) -> Vec<SummaryBlock> {
        let visuals: Vec<String> = prompt::chunk_visuals(chunk, entries)
            .into_iter()
            .map(|v| v.file)
            .filter(|f| !f.is_empty())
            .collect();
        let sectioned = self
            .policy
            .wants_sections(chunk.equations.len(), chunk.visuals.len());

        let request = SummaryRequest {
            prompt: self.policy.chunk_prompt(chunk, entries),
            source: chunk.body.clone(),
            image: None,
        };

        let response = match self.summarizer.summarize(&request) {
            Ok(response) => response,
            Err(e) => {
                log::error!("Error summarizing chunk '{}': {}", chunk.title, e);
                return vec![SummaryBlock {
                    heading: chunk.title.clone(),
                    sub_heading: None,
                    text: SUMMARY_FAILED.to_string(),
                    visuals,
                }];
            }
        };

        if response.trim().is_empty() {
            log::warn!("Empty summary for chunk '{}', skipping", chunk.title);
            return Vec::new();
        }

        if sectioned {
            let sections = parse_sections(&response);
            if !sections.is_empty() {
                return sections
                    .into_iter()
                    .map(|section| SummaryBlock {
                        heading: chunk.title.clone(),
                        sub_heading: Some(section.title),
                        text: section.bullets.join("\n"),
                        visuals: section
                            .visuals
                            .into_iter()
                            .filter(|f| visuals.contains(f))
                            .collect(),
                    })
                    .collect();
            }
            log::warn!("No sections found in summary for '{}', using it whole", chunk.title);
        }

        vec![SummaryBlock {
            heading: chunk.title.clone(),
            sub_heading: None,
            text: bullet_lines(&response).join("\n"),
            visuals,
        }]
    }

    /// Summarize figures and tables, in document order.
    ///
    /// Returns `(figures, tables)`.
    pub fn summarize_visuals(
        &self,
        entries: &[ContentEntry],
        images_root: Option<&Path>,
    ) -> (Vec<VisualSummary>, Vec<VisualSummary>) {
        let mut figures = Vec::new();
        let mut tables = Vec::new();

        for (idx, entry) in entries.iter().enumerate() {
            let path = entry.img_path.as_deref().map(|p| match images_root {
                Some(root) => root.join(p),
                None => PathBuf::from(p),
            });
            let caption = entry.caption();

            let (request, label) = match entry.kind {
                ContentKind::Image => (
                    SummaryRequest {
                        prompt: prompt::image_prompt(&caption),
                        source: caption.clone(),
                        image: path.clone(),
                    },
                    "Image",
                ),
                ContentKind::Table => {
                    let html = entry.table_body.as_deref().unwrap_or_default();
                    (
                        SummaryRequest {
                            prompt: prompt::table_prompt(&caption, html),
                            source: html.to_string(),
                            image: None,
                        },
                        "Table",
                    )
                }
                _ => continue,
            };

            let summary = match self.summarizer.summarize(&request) {
                Ok(response) => parse_labeled(&response, label),
                Err(e) => {
                    log::error!("Error processing {} {}: {}", label.to_lowercase(), idx, e);
                    LabeledSummary {
                        description: e.to_string(),
                        caption: String::new(),
                    }
                }
            };

            let visual = VisualSummary {
                source_index: idx,
                kind: entry.kind,
                path,
                description: summary.description,
                caption: summary.caption,
            };

            if entry.kind == ContentKind::Table {
                tables.push(visual);
            } else {
                figures.push(visual);
            }
        }

        (figures, tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::cell::RefCell;

    /// Backend returning canned responses and recording prompts.
    struct Scripted {
        responses: RefCell<Vec<Result<String>>>,
        seen: RefCell<Vec<SummaryRequest>>,
    }

    impl Scripted {
        fn new(responses: Vec<Result<String>>) -> Self {
            Self {
                responses: RefCell::new(responses),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Summarizer for Scripted {
        fn summarize(&self, request: &SummaryRequest) -> Result<String> {
            self.seen.borrow_mut().push(request.clone());
            self.responses.borrow_mut().remove(0)
        }
    }

    fn chunk(title: &str, body: &str) -> Chunk {
        Chunk::new(title, body)
    }

    #[test]
    fn test_passthrough_keeps_order() {
        let chunks = vec![chunk("A", "first"), chunk("B", "second")];
        let pipeline = Pipeline::new(PassthroughSummarizer);

        let blocks = pipeline.summarize_chunks(&chunks, &[]);
        let pairs: Vec<(&str, &str)> = blocks
            .iter()
            .map(|b| (b.heading.as_str(), b.text.as_str()))
            .collect();
        assert_eq!(pairs, vec![("A", "first"), ("B", "second")]);
    }

    #[test]
    fn test_failure_becomes_placeholder() {
        let backend = Scripted::new(vec![
            Err(Error::SummarizerError("quota".to_string())),
            Ok("\u{2022} fine".to_string()),
        ]);
        let chunks = vec![chunk("A", "x"), chunk("B", "y")];

        let blocks = Pipeline::new(&backend).summarize_chunks(&chunks, &[]);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, SUMMARY_FAILED);
        assert_eq!(blocks[1].text, "fine");
    }

    #[test]
    fn test_empty_response_skipped() {
        let backend = Scripted::new(vec![Ok("   ".to_string())]);
        let blocks = Pipeline::new(&backend).summarize_chunks(&[chunk("A", "x")], &[]);
        assert!(blocks.is_empty());
    }

    #[test]
    fn test_sectioned_chunk_expands() {
        let entries = vec![
            ContentEntry::image("images/f1.png", ""),
            ContentEntry::image("images/f2.png", ""),
            ContentEntry::image("images/f3.png", ""),
        ];
        let mut rich = chunk("Experiments", "lots of text");
        rich.visuals = vec![0, 1, 2];

        let backend = Scripted::new(vec![Ok("### Section 1: Setup\n* Data. (Image: f1.png, made_up.png)\n### Section 2: Findings\n* Better. (Image: f3.png)".to_string())]);
        let blocks = Pipeline::new(&backend).summarize_chunks(&[rich], &entries);

        assert!(backend.seen.borrow()[0].prompt.contains("### Section N"));
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].sub_heading.as_deref(), Some("Setup"));
        assert_eq!(blocks[0].visuals, vec!["f1.png"]);
        assert_eq!(blocks[1].heading, "Experiments");
        assert_eq!(blocks[1].visuals, vec!["f3.png"]);
    }

    #[test]
    fn test_sectioned_without_sections_falls_back() {
        let entries: Vec<ContentEntry> = (0..3)
            .map(|i| ContentEntry::image(format!("f{}.png", i), ""))
            .collect();
        let mut rich = chunk("E", "t");
        rich.visuals = vec![0, 1, 2];

        let backend = Scripted::new(vec![Ok("* just bullets".to_string())]);
        let blocks = Pipeline::new(&backend).summarize_chunks(&[rich], &entries);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "just bullets");
        assert_eq!(blocks[0].visuals, vec!["f0.png", "f1.png", "f2.png"]);
    }

    #[test]
    fn test_visuals_summarized_in_order() {
        let entries = vec![
            ContentEntry::text("prose"),
            ContentEntry::image("images/a.jpg", "Figure 1"),
            ContentEntry::table("<table/>", "Table 1"),
            ContentEntry::image("images/b.jpg", ""),
        ];
        let backend = Scripted::new(vec![
            Ok("**Image Description**: first\n**Image Caption**: one".to_string()),
            Ok("**Table Description**: numbers\n**Table Caption**: tab".to_string()),
            Err(Error::SummarizerError("boom".to_string())),
        ]);

        let (figures, tables) =
            Pipeline::new(&backend).summarize_visuals(&entries, Some(Path::new("/out/auto")));

        assert_eq!(figures.len(), 2);
        assert_eq!(figures[0].source_index, 1);
        assert_eq!(figures[0].path, Some(PathBuf::from("/out/auto/images/a.jpg")));
        assert_eq!(figures[0].caption, "one");
        assert_eq!(figures[1].caption, "");
        assert!(figures[1].description.contains("boom"));

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].description, "numbers");

        let seen = backend.seen.borrow();
        assert_eq!(seen[0].image, Some(PathBuf::from("/out/auto/images/a.jpg")));
        assert_eq!(seen[1].source, "<table/>");
    }

    #[test]
    fn test_run_combines_everything() {
        let entries = vec![ContentEntry::heading("T"), ContentEntry::text("body"), ContentEntry::image("i.png", "cap")];
        let chunks = crate::chunker::split(&entries, 1000);

        let deck = Pipeline::new(PassthroughSummarizer).run(&chunks, &entries, None);
        assert_eq!(deck.blocks.len(), 1);
        assert_eq!(deck.blocks[0].visuals, vec!["i.png"]);
        assert_eq!(deck.figures[0].description, "cap");
        assert!(deck.tables.is_empty());
    }
}
