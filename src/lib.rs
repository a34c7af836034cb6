//! Personal journal library
//!
//! This library provides a per-identity note collection persisted in local
//! key-value storage, a search/tag filter over it, session and theme state,
//! and the command-line front end built on top of them.

mod cli;
mod config;
mod diagnostics;
mod diary;
pub mod editor;
mod errors;
mod filter;
mod helper;
mod kv;
mod note;
pub mod render;
mod session;
mod storage;
mod theme;
mod types;

// Re-export key components
pub use cli::*;
pub use config::*;
pub use diagnostics::*;
pub use diary::*;
pub use editor::ExternalEditor;
pub use errors::*;
pub use filter::*;
pub use helper::*;
pub use kv::*;
pub use note::*;
pub use render::Palette;
pub use session::*;
pub use storage::*;
pub use theme::*;
pub use types::*;
