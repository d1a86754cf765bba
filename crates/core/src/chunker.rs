//! Title-scoped, size-bounded chunking of extracted document content.
//!
//! The chunker walks the content list once, left to right. Top-level
//! headings open a new section title; everything between two headings is
//! packed greedily into chunks of at most `max_chunk_len` characters.
//! Equations are kept together with the prose around them, and sections
//! whose title looks like a bibliography are re-split line by line.
//!
//! Cursor policy: every chunk is seeded by the entry at the cursor and then
//! extended by [`merge_lookahead`]. An entry that lookahead scans but
//! rejects is not consumed; it seeds the next chunk. No entry is ever
//! skipped or emitted twice because of lookahead.

use crate::markers::SectionMarkers;
use crate::types::{ContentEntry, ContentKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default upper bound on a chunk body, in characters.
pub const DEFAULT_MAX_CHUNK_LEN: usize = 1000;

/// Chunker settings.
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    max_chunk_len: usize,
    markers: SectionMarkers,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chunk_len: DEFAULT_MAX_CHUNK_LEN,
            markers: SectionMarkers::default(),
        }
    }
}

impl ChunkerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum chunk body length.
    pub fn with_max_chunk_len(mut self, len: usize) -> Self {
        self.max_chunk_len = len.max(1); // At least 1 character
        self
    }

    /// Replace the bibliography title markers.
    pub fn with_markers(mut self, markers: SectionMarkers) -> Self {
        self.markers = markers;
        self
    }

    pub fn max_chunk_len(&self) -> usize {
        self.max_chunk_len
    }

    pub fn markers(&self) -> &SectionMarkers {
        &self.markers
    }
}

/// A title-prefixed unit of text destined for independent summarization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Section title (possibly multi-line), empty before the first heading.
    pub title: String,

    /// Joined body text, never empty.
    pub body: String,

    /// Source indices of equation entries bundled into this chunk.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub equations: Vec<usize>,

    /// Source indices of figure and table entries that fall inside this chunk.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub visuals: Vec<usize>,
}

impl Chunk {
    /// Create a chunk with no attachments.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            equations: Vec::new(),
            visuals: Vec::new(),
        }
    }

    /// The chunk as one string: title line(s), newline, body, trimmed.
    pub fn text(&self) -> String {
        format!("{}\n{}", self.title, self.body).trim().to_string()
    }

    /// Body length in characters.
    pub fn body_len(&self) -> usize {
        self.body.chars().count()
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Fragments accumulated under the current title, waiting to be flushed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkBuffer {
    fragments: Vec<String>,
    len: usize,
    equations: Vec<usize>,
    visuals: Vec<usize>,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment, trimmed. Empty fragments are dropped.
    pub fn push(&mut self, fragment: &str) {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return;
        }
        self.len += fragment.chars().count();
        self.fragments.push(fragment.to_string());
    }

    /// Add everything a contribution carries.
    pub fn absorb(&mut self, contribution: Contribution) {
        for fragment in &contribution.fragments {
            self.push(fragment);
        }
        self.equations.extend(contribution.equation);
        self.visuals.extend(contribution.visual);
    }

    /// Sum of fragment lengths in characters (separators excluded).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// The most recently added fragment.
    pub fn last(&self) -> Option<&str> {
        self.fragments.last().map(String::as_str)
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    /// Fragments joined by newlines, trimmed.
    pub fn joined(&self) -> String {
        self.fragments.join("\n").trim().to_string()
    }
}

/// What one entry, together with any bundled neighbours, adds to a chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contribution {
    /// Trimmed, non-empty text fragments in order.
    pub fragments: Vec<String>,

    /// Source index of the equation, for equation contributions.
    pub equation: Option<usize>,

    /// Source index of the figure or table, for visual contributions.
    pub visual: Option<usize>,

    /// Index of the first entry after this contribution.
    pub next: usize,
}

impl Contribution {
    /// Total fragment length in characters.
    pub fn len(&self) -> usize {
        self.fragments.iter().map(|f| f.chars().count()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    fn push(&mut self, text: &str) {
        if !text.is_empty() {
            self.fragments.push(text.to_string());
        }
    }
}

/// Compute the contribution of the entry at `idx`.
///
/// Equations pull in the prose right before them (unless it is already
/// `last_fragment`) and the prose right after them, which is then consumed.
/// Headings are never bundled. Figures, tables, and unknown entries add no
/// text. Callers handle headings at `idx` themselves.
pub fn contribution_at(
    entries: &[ContentEntry],
    idx: usize,
    last_fragment: Option<&str>,
) -> Contribution {
    let mut contribution = Contribution {
        next: idx + 1,
        ..Contribution::default()
    };
    let Some(entry) = entries.get(idx) else {
        return contribution;
    };

    match entry.kind {
        ContentKind::Equation => {
            if let Some(prev) = idx.checked_sub(1).and_then(|p| entries.get(p)) {
                let prev_text = prev.trimmed_text();
                if prev.is_prose() && last_fragment != Some(prev_text) {
                    contribution.push(prev_text);
                }
            }
            contribution.push(entry.trimmed_text());
            contribution.equation = Some(idx);

            if let Some(next) = entries.get(idx + 1).filter(|e| e.is_prose()) {
                contribution.push(next.trimmed_text());
                contribution.next = idx + 2;
            }
        }
        ContentKind::Text => contribution.push(entry.trimmed_text()),
        ContentKind::Image | ContentKind::Table => contribution.visual = Some(idx),
        ContentKind::Unknown => {}
    }

    contribution
}

/// Greedily extend `buffer` with the entries starting at `start`.
///
/// Each candidate is merged only if the combined length stays within
/// `max_chunk_len`. Scanning stops at the first candidate that would
/// overflow or at the next heading, whichever comes first. Returns the
/// merged buffer and the number of entries consumed from `start`.
pub fn merge_lookahead(
    mut buffer: ChunkBuffer,
    entries: &[ContentEntry],
    start: usize,
    max_chunk_len: usize,
) -> (ChunkBuffer, usize) {
    let mut cursor = start;

    while cursor < entries.len() {
        if entries[cursor].starts_title() {
            break;
        }

        let candidate = contribution_at(entries, cursor, buffer.last());
        if buffer.len() + candidate.len() > max_chunk_len {
            log::trace!(
                "Lookahead stops at entry {}: {} + {} > {}",
                cursor,
                buffer.len(),
                candidate.len(),
                max_chunk_len
            );
            break;
        }

        cursor = candidate.next;
        buffer.absorb(candidate);
    }

    (buffer, cursor.min(entries.len()).saturating_sub(start))
}

/// Read the heading run starting at `start`.
///
/// Returns the joined title and the index of the first non-heading entry.
fn title_run(entries: &[ContentEntry], start: usize) -> (String, usize) {
    let mut cursor = start;
    let mut lines = Vec::new();
    while cursor < entries.len() && entries[cursor].is_heading() {
        lines.push(entries[cursor].trimmed_text());
        cursor += 1;
    }
    (lines.join("\n"), cursor)
}

/// Splits a content list into title-scoped chunks.
#[derive(Debug, Clone, Default)]
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    /// Create a chunker with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ChunkerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Split entries into chunks, in document order.
    pub fn split(&self, entries: &[ContentEntry]) -> Vec<Chunk> {
        let max_chunk_len = self.config.max_chunk_len;
        let mut chunks = Vec::new();
        let mut title = String::new();
        let mut buffer = ChunkBuffer::new();
        let mut cursor = 0;

        while cursor < entries.len() {
            if entries[cursor].starts_title() {
                let (new_title, next) = title_run(entries, cursor);
                self.flush(&title, &mut buffer, &mut chunks);
                title = new_title;
                cursor = next;
                continue;
            }

            let seed = contribution_at(entries, cursor, buffer.last());
            let after_seed = seed.next.min(entries.len());
            buffer.absorb(seed);

            let (merged, consumed) = merge_lookahead(buffer, entries, after_seed, max_chunk_len);
            buffer = merged;
            cursor = after_seed + consumed;

            self.flush(&title, &mut buffer, &mut chunks);
        }

        self.flush(&title, &mut buffer, &mut chunks);

        log::debug!(
            "Split {} entries into {} chunks (max {} chars)",
            entries.len(),
            chunks.len(),
            max_chunk_len
        );

        chunks
    }

    /// Emit the buffer under `title` and clear it.
    fn flush(&self, title: &str, buffer: &mut ChunkBuffer, chunks: &mut Vec<Chunk>) {
        let pending = std::mem::take(buffer);
        let body = pending.joined();
        if body.is_empty() {
            return;
        }

        let title = title.trim();
        if self.config.markers.matches(title) {
            let mut parts = split_reference_lines(title, &body, self.config.max_chunk_len);
            log::debug!(
                "Reference section '{}' re-split into {} chunks",
                title.replace('\n', " "),
                parts.len()
            );
            if let Some(first) = parts.first_mut() {
                first.equations = pending.equations;
                first.visuals = pending.visuals;
            }
            chunks.extend(parts);
        } else {
            log::debug!("Flushing chunk under '{}' ({} chars)", title.replace('\n', " "), pending.len);
            chunks.push(Chunk {
                title: title.to_string(),
                body,
                equations: pending.equations,
                visuals: pending.visuals,
            });
        }
    }
}

/// Re-split a bibliography body line by line.
///
/// Lines are packed until the next one would push the line total past
/// `max_chunk_len`. A single line longer than the cap becomes its own chunk.
fn split_reference_lines(title: &str, body: &str, max_chunk_len: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut lines: Vec<&str> = Vec::new();
    let mut lines_len = 0;

    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let line_len = line.chars().count();
        if !lines.is_empty() && lines_len + line_len > max_chunk_len {
            chunks.push(Chunk::new(title, lines.join("\n")));
            lines.clear();
            lines_len = 0;
        }
        lines.push(line);
        lines_len += line_len;
    }

    if !lines.is_empty() {
        chunks.push(Chunk::new(title, lines.join("\n")));
    }

    chunks
}

/// Split entries with default markers and the given cap.
pub fn split(entries: &[ContentEntry], max_chunk_len: usize) -> Vec<Chunk> {
    Chunker::with_config(ChunkerConfig::new().with_max_chunk_len(max_chunk_len)).split(entries)
}
