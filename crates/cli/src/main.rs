//! CLI tool for turning extracted PDF content into chunks and slide outlines.

mod command;
mod gemini;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use command::CommandSummarizer;
use gemini::{GeminiSummarizer, DEFAULT_GEMINI_MODEL};
use deck_core::{
    Chunk, Chunker, ChunkerConfig, ContentList, OutlineFormatter, PassthroughSummarizer, Pipeline,
    SectionMarkers, Summarizer, DEFAULT_MAX_CHUNK_LEN,
};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Suffix the document extractor appends to its content list files.
const CONTENT_LIST_SUFFIX: &str = "_content_list";

/// Split extracted document content into chunks and slide outlines.
#[derive(Parser, Debug)]
#[command(name = "pdf2deck")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Content list JSON file(s) written by the document extractor
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Output directory (default: same as input file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print output to stdout instead of writing to file
    #[arg(short, long)]
    print: bool,

    /// What to produce
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Chunks)]
    format: OutputFormat,

    /// Maximum chunk body length in characters
    #[arg(short, long, default_value_t = DEFAULT_MAX_CHUNK_LEN)]
    max_chunk_len: usize,

    /// Title marker for bibliography sections (repeatable, replaces the defaults)
    #[arg(long = "marker")]
    markers: Vec<String>,

    /// Program that reads a prompt on stdin and prints a summary (outline format only)
    #[arg(long)]
    summarize_cmd: Option<String>,

    /// Extra argument for the summarize program (repeatable)
    #[arg(long = "summarize-arg", allow_hyphen_values = true)]
    summarize_args: Vec<String>,

    /// Summarize with the Gemini API (outline format only; key from GEMINI_API_KEY)
    #[arg(long, conflicts_with = "summarize_cmd")]
    gemini: bool,

    /// Gemini model name
    #[arg(long, default_value = DEFAULT_GEMINI_MODEL)]
    gemini_model: String,

    /// Directory image paths are relative to (default: input file's directory)
    #[arg(long)]
    images_root: Option<PathBuf>,

    /// Number of bullets per outline slide
    #[arg(short, long, default_value = "5")]
    bullets_per_slide: usize,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Chunk texts separated by `---` lines
    Chunks,
    /// Chunks with their attachments as JSON
    Json,
    /// Summarized text slide outline
    Outline,
}

impl OutputFormat {
    fn file_suffix(self) -> &'static str {
        match self {
            Self::Chunks => "chunks.txt",
            Self::Json => "chunks.json",
            Self::Outline => "outline.txt",
        }
    }
}

/// JSON report for one input file.
#[derive(Serialize)]
struct ChunkReport<'a> {
    source: String,
    max_chunk_len: usize,
    chunks: &'a [Chunk],
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let mut config = ChunkerConfig::new().with_max_chunk_len(args.max_chunk_len);
    if !args.markers.is_empty() {
        let markers = SectionMarkers::new(&args.markers).context("Invalid --marker value")?;
        config = config.with_markers(markers);
    }
    let chunker = Chunker::with_config(config);

    let summarizer = build_summarizer(&args)?;
    let pipeline = Pipeline::new(summarizer);
    let formatter = OutlineFormatter::new().with_bullets_per_slide(args.bullets_per_slide);

    for input_path in &args.input {
        if args.verbose {
            eprintln!("Processing: {}", input_path.display());
        }

        match process_file(input_path, &args, &chunker, &pipeline, &formatter) {
            Ok(output) => {
                if args.print {
                    print!("{}", output);
                } else {
                    match save_output(input_path, args.output.as_ref(), args.format, &output) {
                        Ok(output_path) => {
                            if args.verbose {
                                eprintln!("Written to: {}", output_path.display());
                            }
                        }
                        Err(e) => {
                            eprintln!("Error writing output for {}: {:#}", input_path.display(), e);
                        }
                    }
                }
            }
            Err(e) => {
                eprintln!("Error processing {}: {:#}", input_path.display(), e);
            }
        }
    }

    Ok(())
}

/// Pick the summarization backend from the command line.
fn build_summarizer(args: &Args) -> Result<Box<dyn Summarizer>> {
    if args.gemini {
        let gemini = GeminiSummarizer::from_env(&args.gemini_model)
            .context("Failed to set up the Gemini summarizer")?;
        return Ok(Box::new(gemini));
    }

    Ok(match &args.summarize_cmd {
        Some(program) => Box::new(CommandSummarizer::new(program, args.summarize_args.clone())),
        None => Box::new(PassthroughSummarizer),
    })
}

/// Process a single content list file.
fn process_file<S: Summarizer>(
    input_path: &Path,
    args: &Args,
    chunker: &Chunker,
    pipeline: &Pipeline<S>,
    formatter: &OutlineFormatter,
) -> Result<String> {
    let content = ContentList::from_path(input_path)
        .with_context(|| format!("Failed to load {}", input_path.display()))?;

    let chunks = chunker.split(&content.entries);

    if args.verbose {
        eprintln!(
            "  Found {} entries, {} chunks",
            content.len(),
            chunks.len()
        );
    }

    let output = match args.format {
        OutputFormat::Chunks => format_chunks(&chunks),
        OutputFormat::Json => {
            let report = ChunkReport {
                source: input_path.display().to_string(),
                max_chunk_len: chunker.config().max_chunk_len(),
                chunks: &chunks,
            };
            let mut json = serde_json::to_string_pretty(&report)?;
            json.push('\n');
            json
        }
        OutputFormat::Outline => {
            let images_root = match &args.images_root {
                Some(root) => root.clone(),
                None => input_path.parent().map(Path::to_path_buf).unwrap_or_default(),
            };
            let deck = pipeline.run(&chunks, &content.entries, Some(images_root.as_path()));
            formatter.format_with_newline(&deck, &document_name(input_path))
        }
    };

    Ok(output)
}

/// Chunk texts separated by `---` lines, with a trailing newline.
fn format_chunks(chunks: &[Chunk]) -> String {
    if chunks.is_empty() {
        return String::new();
    }
    let texts: Vec<String> = chunks.iter().map(Chunk::text).collect();
    format!("{}\n", texts.join("\n---\n"))
}

/// Document name from a content list path: file stem minus the extractor suffix.
fn document_name(input_path: &Path) -> String {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    stem.strip_suffix(CONTENT_LIST_SUFFIX)
        .filter(|s| !s.is_empty())
        .unwrap_or(stem)
        .to_string()
}

/// Determine the output path for a processed file.
fn get_output_path(input_path: &Path, output_dir: Option<&PathBuf>, format: OutputFormat) -> Result<PathBuf> {
    let output_filename = format!("{}.{}", document_name(input_path), format.file_suffix());

    let output_path = match output_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            dir.join(output_filename)
        }
        None => {
            if let Some(parent) = input_path.parent() {
                parent.join(output_filename)
            } else {
                PathBuf::from(output_filename)
            }
        }
    };

    Ok(output_path)
}

/// Write the output for one input file, returning where it went.
fn save_output(
    input_path: &Path,
    output_dir: Option<&PathBuf>,
    format: OutputFormat,
    content: &str,
) -> Result<PathBuf> {
    let output_path = get_output_path(input_path, output_dir, format)?;
    write_output(&output_path, content)?;
    Ok(output_path)
}

/// Write output to a file.
fn write_output(path: &Path, content: &str) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_name() {
        assert_eq!(document_name(Path::new("out/paper_content_list.json")), "paper");
        assert_eq!(document_name(Path::new("notes.json")), "notes");
        assert_eq!(document_name(Path::new("_content_list.json")), "_content_list");
    }

    #[test]
    fn test_output_path_next_to_input() {
        let path = get_output_path(Path::new("out/auto/paper_content_list.json"), None, OutputFormat::Outline).unwrap();
        assert_eq!(path, PathBuf::from("out/auto/paper.outline.txt"));
    }

    #[test]
    fn test_save_output_failure_is_per_file() {
        let root = std::env::temp_dir().join(format!("pdf2deck-save-{}", std::process::id()));
        std::fs::create_dir_all(&root).unwrap();
        let blocker = root.join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();

        let inputs = [root.join("a_content_list.json"), root.join("b_content_list.json")];
        let dirs = [Some(blocker.clone()), None];
        let results: Vec<Result<PathBuf>> = inputs
            .iter()
            .zip(dirs.iter())
            .map(|(input, dir)| save_output(input, dir.as_ref(), OutputFormat::Chunks, "body\n"))
            .collect();

        assert!(results[0].is_err());
        let written = results[1].as_ref().unwrap();
        assert_eq!(written, &root.join("b.chunks.txt"));
        assert_eq!(std::fs::read_to_string(written).unwrap(), "body\n");

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_format_chunks() {
        let chunks = vec![Chunk::new("Intro", "a"), Chunk::new("", "b")];
        assert_eq!(format_chunks(&chunks), "Intro\na\n---\nb\n");
        assert_eq!(format_chunks(&[]), "");
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "pdf2deck",
            "a.json",
            "-f",
            "outline",
            "-m",
            "500",
            "--marker",
            "Bibliography",
            "--summarize-cmd",
            "llm",
            "--summarize-arg=-m",
            "--summarize-arg",
            "gemini",
        ])
        .unwrap();
        assert_eq!(args.format, OutputFormat::Outline);
        assert_eq!(args.max_chunk_len, 500);
        assert_eq!(args.markers, vec!["Bibliography"]);
        assert_eq!(args.summarize_args, vec!["-m", "gemini"]);
        assert!(!args.gemini);
    }

    #[test]
    fn test_args_parse_gemini() {
        let args = Args::try_parse_from(["pdf2deck", "a.json", "-f", "outline", "--gemini"]).unwrap();
        assert!(args.gemini);
        assert_eq!(args.gemini_model, DEFAULT_GEMINI_MODEL);

        let conflict = Args::try_parse_from(["pdf2deck", "a.json", "--gemini", "--summarize-cmd", "llm"]);
        assert!(conflict.is_err());
    }
}
