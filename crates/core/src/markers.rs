//! Bibliography section detection.

use crate::error::{Error, Result};
use crate::normalize::fold_for_match;

/// Title substrings that mark a bibliography section (English and Vietnamese).
pub const DEFAULT_REFERENCE_MARKERS: &[&str] = &["reference", "t\u{e0}i li\u{1ec7}u tham kh\u{1ea3}o"];

/// A case-insensitive set of title markers.
///
/// A title matches when its folded form contains any folded marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionMarkers {
    folded: Vec<String>,
}

impl Default for SectionMarkers {
    fn default() -> Self {
        Self {
            folded: DEFAULT_REFERENCE_MARKERS
                .iter()
                .map(|m| fold_for_match(m))
                .collect(),
        }
    }
}

impl SectionMarkers {
    /// Build a marker set from user-supplied strings.
    ///
    /// Blank markers are rejected since they would match every title.
    pub fn new<I, S>(markers: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut folded = Vec::new();
        for marker in markers {
            let marker = fold_for_match(marker.as_ref());
            if marker.is_empty() {
                return Err(Error::ConfigError(
                    "section marker must not be blank".to_string(),
                ));
            }
            folded.push(marker);
        }
        Ok(Self { folded })
    }

    /// A marker set that never matches.
    pub fn none() -> Self {
        Self { folded: Vec::new() }
    }

    /// Check whether a section title carries one of the markers.
    pub fn matches(&self, title: &str) -> bool {
        if self.folded.is_empty() {
            return false;
        }
        let title = fold_for_match(title);
        self.folded.iter().any(|m| title.contains(m.as_str()))
    }
}
