//! The rich-text editor boundary.
//!
//! Note content is an opaque HTML blob. On the command line it is written in
//! the user's editor as Markdown and converted to HTML on the way in; stored
//! HTML handed back to the editor survives the conversion unchanged because
//! Markdown passes raw HTML blocks through.

use std::{
    fs::{read_to_string, OpenOptions},
    io::Write,
    path::Path,
    process::Command,
};

use log::{debug, info};
use pulldown_cmark::{html, Options, Parser};
use shell_words::split;
use tempfile::Builder;

use crate::{Config, DiaryError, Result};

const TEMPLATE_COMMENT: &str =
    "<!-- Write your entry below in Markdown. Save and close the editor when you're done. -->";

/// Converts Markdown to the HTML blob stored as note content.
pub fn markdown_to_html(markdown: &str) -> String {
    if markdown.trim().is_empty() {
        return String::new();
    }
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out.trim_end().to_string()
}

/// Launches an external editor command on a temporary file.
#[derive(Debug, Clone)]
pub struct ExternalEditor {
    command: String,
}

impl ExternalEditor {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.get_editor_command())
    }

    /// Opens the editor on `initial` and returns the result as HTML.
    pub fn compose(&self, initial: &str) -> Result<String> {
        // Create a temporary file with .md extension
        let temp_file = Builder::new().prefix("diary-").suffix(".md").tempfile()?;
        let temp_path = temp_file.path().to_path_buf();

        write_template(&temp_path, initial)?;

        info!("Opening editor to write note content. Save and exit when done...");
        self.launch(&temp_path)?;

        let content = read_to_string(&temp_path)?;
        Ok(markdown_to_html(&strip_template(&content)))
    }

    fn launch(&self, file_path: &Path) -> Result<()> {
        let path_str = file_path.to_string_lossy();

        // Handle shell-like command parsing
        let args = split(&self.command).map_err(|e| DiaryError::EditorError {
            message: format!("Failed to parse editor command: {}", e),
        })?;

        let Some((program, rest)) = args.split_first() else {
            return Err(DiaryError::EditorError {
                message: "Empty editor command".to_string(),
            });
        };

        debug!("Launching editor {} on {}", program, path_str);
        let status = Command::new(program)
            .args(rest)
            .arg(path_str.as_ref())
            .status()
            .map_err(|e| DiaryError::EditorError {
                message: format!("Failed to start editor '{}': {}", program, e),
            })?;

        if !status.success() {
            return Err(DiaryError::EditorError {
                message: "Editor exited with non-zero status".to_string(),
            });
        }

        Ok(())
    }
}

fn write_template(path: &Path, initial: &str) -> Result<()> {
    let mut file = OpenOptions::new().write(true).truncate(true).open(path)?;
    writeln!(file, "{}", TEMPLATE_COMMENT)?;
    writeln!(file)?;
    if !initial.is_empty() {
        writeln!(file, "{}", initial)?;
    }
    Ok(())
}

/// Drops single-line HTML comments, including the template hint.
fn strip_template(content: &str) -> String {
    content
        .lines()
        .filter(|line| {
            let line = line.trim();
            !(line.starts_with("<!--") && line.ends_with("-->"))
        })
        .collect::<Vec<&str>>()
        .join("\n")
}
