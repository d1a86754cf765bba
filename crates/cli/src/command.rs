//! Summarization backend that shells out to an external program.

use deck_core::{Error, Result, SummaryRequest, Summarizer};
use std::io::Write;
use std::process::{Command, Stdio};

/// Runs a program once per request.
///
/// The prompt is written to the program's stdin and its trimmed stdout is
/// the summary. For figures, the image path is appended as the last argument.
#[derive(Debug, Clone)]
pub struct CommandSummarizer {
    program: String,
    args: Vec<String>,
}

impl CommandSummarizer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl Summarizer for CommandSummarizer {
    fn summarize(&self, request: &SummaryRequest) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(image) = &request.image {
            cmd.arg(image);
        }

        log::debug!("Running summarizer: {} {:?}", self.program, self.args);
        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Feed stdin from another thread so a chatty child can't block us.
        let writer = child.stdin.take().map(|mut stdin| {
            let prompt = request.prompt.clone().into_bytes();
            std::thread::spawn(move || stdin.write_all(&prompt))
        });

        let output = child.wait_with_output()?;

        if let Some(writer) = writer {
            match writer.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => log::warn!("Summarizer closed stdin early: {}", e),
                Err(_) => log::warn!("Summarizer stdin writer panicked"),
            }
        }

        if !output.status.success() {
            return Err(Error::SummarizerError(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn request(prompt: &str) -> SummaryRequest {
        SummaryRequest {
            prompt: prompt.to_string(),
            source: String::new(),
            image: None,
        }
    }

    #[test]
    fn test_prompt_goes_through_stdin() {
        let summarizer = CommandSummarizer::new("cat", Vec::new());
        let out = summarizer.summarize(&request("  hello deck \n")).unwrap();
        assert_eq!(out, "hello deck");
    }

    #[test]
    fn test_failing_command_is_error() {
        let summarizer = CommandSummarizer::new("sh", vec!["-c".to_string(), "exit 3".to_string()]);
        let err = summarizer.summarize(&request("x")).unwrap_err();
        assert!(matches!(err, Error::SummarizerError(_)));
    }

    #[test]
    fn test_missing_program_is_error() {
        let summarizer = CommandSummarizer::new("definitely-not-a-real-binary-1234", Vec::new());
        assert!(summarizer.summarize(&request("x")).is_err());
    }
}
