//! Parsing of summarization model responses.

use crate::normalize::strip_bullet;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Matches `(Image: a.png, b.png)` and `(Table: t.png)` tags in a bullet.
static VISUAL_TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((?:Image|Table):\s*([^)]+)\)").unwrap());

/// Matches the `Section 2:` prefix of a section header.
static SECTION_PREFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^section\s+\d+\s*[:.\-]?\s*").unwrap());

/// Description and short caption returned for a figure or table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledSummary {
    pub description: String,
    pub caption: String,
}

/// Parse a `**<Label> Description**:` / `**<Label> Caption**:` response.
///
/// When the description label is missing, the whole response is taken as
/// the description so nothing the model said is lost.
pub fn parse_labeled(response: &str, label: &str) -> LabeledSummary {
    let description_tag = format!("**{} Description**:", label);
    let caption_tag = format!("**{} Caption**:", label);
    let mut summary = LabeledSummary::default();
    let mut found_description = false;

    for line in response.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix(&description_tag) {
            summary.description = rest.trim().to_string();
            found_description = true;
        } else if let Some(rest) = line.strip_prefix(&caption_tag) {
            summary.caption = rest.trim().to_string();
        }
    }

    if !found_description {
        summary.description = response.trim().to_string();
    }

    summary
}

/// One section of a sectioned summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarySection {
    /// Section title without the `### Section N:` prefix.
    pub title: String,
    /// Bullet texts with visual tags removed.
    pub bullets: Vec<String>,
    /// Visual file names referenced by the bullets, sorted and deduplicated.
    pub visuals: Vec<String>,
}

impl SummarySection {
    fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Self::default()
        }
    }

    fn finish(mut self, sections: &mut Vec<SummarySection>) {
        if self.bullets.is_empty() {
            return;
        }
        self.visuals.sort();
        self.visuals.dedup();
        sections.push(self);
    }
}

/// Parse a `### Section N: Title` structured response into sections.
///
/// Bullets before the first header and sections without bullets are dropped.
pub fn parse_sections(response: &str) -> Vec<SummarySection> {
    let mut sections = Vec::new();
    let mut current: Option<SummarySection> = None;

    for line in response.lines().map(str::trim) {
        if let Some(header) = line.strip_prefix("###") {
            if let Some(done) = current.take() {
                done.finish(&mut sections);
            }
            let header = header.trim();
            let title = SECTION_PREFIX_REGEX.replace(header, "");
            let title = if title.trim().is_empty() { header } else { title.trim() };
            current = Some(SummarySection::new(title));
        } else if let (Some(section), Some(bullet)) = (current.as_mut(), strip_bullet(line)) {
            for tag in VISUAL_TAG_REGEX.captures_iter(bullet) {
                section.visuals.extend(
                    tag[1]
                        .split(',')
                        .map(str::trim)
                        .filter(|f| !f.is_empty())
                        .map(str::to_string),
                );
            }
            let clean = VISUAL_TAG_REGEX.replace_all(bullet, "");
            let clean = clean.trim();
            if !clean.is_empty() {
                section.bullets.push(clean.to_string());
            }
        }
    }

    if let Some(done) = current.take() {
        done.finish(&mut sections);
    }

    sections
}

/// Extract bullet lines from a plain response.
///
/// Lines without a bullet glyph are kept as-is; blank lines are dropped.
pub fn bullet_lines(response: &str) -> Vec<String> {
    response
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| strip_bullet(l).unwrap_or(l).to_string())
        .filter(|l| !l.is_empty())
        .collect()
}
