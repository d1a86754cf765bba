//! Core domain types, content chunking, summarization prompts, and slide
//! outlining for documents extracted from PDF.

pub mod chunker;
pub mod error;
pub mod markers;
pub mod normalize;
pub mod outline;
pub mod prompt;
pub mod response;
pub mod summarize;
pub mod types;

pub use chunker::{split, Chunk, ChunkBuffer, Chunker, ChunkerConfig, DEFAULT_MAX_CHUNK_LEN};
pub use error::{Error, Result};
pub use markers::SectionMarkers;
pub use outline::{OutlineFormatter, OutlineSlide};
pub use prompt::PromptPolicy;
pub use summarize::{
    DeckContent, PassthroughSummarizer, Pipeline, SummaryBlock, SummaryRequest, Summarizer,
    VisualSummary,
};
pub use types::{Caption, ContentEntry, ContentKind, ContentList};
