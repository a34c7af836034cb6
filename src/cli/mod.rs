//! CLI module for the diary application
//!
//! This module handles the command-line interface for interacting with the
//! journal.
mod app;
mod main;

pub use app::*;
pub use main::*;
