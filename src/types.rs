//! Shared result type and the command set of the `diary` binary.
use std::path::PathBuf;

use clap::Subcommand;

use crate::DiaryError;

/// A specialized Result type for diary operations.
pub type Result<T> = std::result::Result<T, DiaryError>;

/// Available subcommands for the diary application
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in with an email address
    Login {
        /// Email address identifying the journal
        #[clap(short, long)]
        email: String,

        /// Name to greet you with
        #[clap(short, long)]
        name: Option<String>,
    },

    /// Sign out and return to the guest journal
    Logout,

    /// Show who is signed in and which journal is active
    Whoami,

    /// Create a new note
    New {
        /// Title of the note
        #[clap(short = 'T', long)]
        title: Option<String>,

        /// Content of the note, Markdown formatted
        #[clap(short, long)]
        content: Option<String>,

        /// Write the content in the editor
        #[clap(short, long)]
        edit: bool,

        /// Tags to associate with the note (comma-separated)
        #[clap(short = 't', long)]
        tags: Option<String>,

        /// Path to a Markdown file containing the note's content
        #[clap(short, long)]
        file: Option<PathBuf>,
    },

    /// Edit an existing note
    Edit {
        /// ID of the note to edit
        id: String,

        /// New title for the note
        #[clap(short = 'T', long)]
        title: Option<String>,

        /// New content for the note, Markdown formatted
        #[clap(short, long)]
        content: Option<String>,

        /// Rewrite the content in the editor
        #[clap(short, long)]
        edit: bool,

        /// Replace the note's tags (comma-separated)
        #[clap(short = 't', long)]
        tags: Option<String>,

        /// Path to a Markdown file containing the new content
        #[clap(short, long)]
        file: Option<PathBuf>,
    },

    /// Delete a note by ID
    Delete {
        /// ID of the note to delete
        id: String,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// List notes, optionally filtered
    List {
        /// Only notes whose title or content contains this text
        #[clap(short, long)]
        query: Option<String>,

        /// Only notes with a matching tag (e.g. "happy" or "#hap")
        #[clap(short, long)]
        tag: Option<String>,

        /// Limit the number of notes shown
        #[clap(short = 'n', long)]
        limit: Option<usize>,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,

        /// Only show note IDs, titles and tags
        #[clap(short, long)]
        brief: bool,
    },

    /// View a note by ID
    View {
        /// ID of the note to view
        id: String,

        /// Format output as raw JSON
        #[clap(short, long, conflicts_with = "html")]
        json: bool,

        /// Format output as a sanitized HTML fragment
        #[clap(long)]
        html: bool,
    },

    /// List every tag in the active journal
    Tags,

    /// Show or change the light/dark theme
    Theme {
        /// Switch between light and dark
        #[clap(long, conflicts_with = "set")]
        toggle: bool,

        /// Set the theme explicitly
        #[clap(long, value_parser = ["light", "dark"])]
        set: Option<String>,
    },
}
