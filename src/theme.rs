//! Light/dark preference.
//!
//! [`ThemeState`] is an owned object rather than process-wide state: it loads
//! the persisted preference once, and on every change pushes the new value to
//! its [`DisplayMode`] and writes it back to storage.

use std::{
    fmt,
    str::FromStr,
    sync::{Arc, Mutex},
};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{Diagnostic, DiagnosticSource, DiaryError, KeyValueStore, SharedSink, SharedStore};

/// Key holding the theme as plain text.
pub const THEME_KEY: &str = "diary.theme";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = DiaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(DiaryError::InvalidTheme {
                value: other.to_string(),
            }),
        }
    }
}

/// Whatever presents the journal and needs to follow the theme.
pub trait DisplayMode: Send + Sync {
    fn apply(&self, theme: Theme);
}

/// Display mode that just remembers the last theme it was given.
#[derive(Debug, Default, Clone)]
pub struct SharedDisplayMode {
    current: Arc<Mutex<Theme>>,
}

impl SharedDisplayMode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Theme {
        match self.current.lock() {
            Ok(theme) => *theme,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

impl DisplayMode for SharedDisplayMode {
    fn apply(&self, theme: Theme) {
        match self.current.lock() {
            Ok(mut current) => *current = theme,
            Err(poisoned) => *poisoned.into_inner() = theme,
        }
    }
}

pub struct ThemeState {
    theme: Theme,
    storage: SharedStore,
    display: Arc<dyn DisplayMode>,
    diagnostics: SharedSink,
}

impl ThemeState {
    /// Loads the persisted theme (light when absent or unreadable) and
    /// applies it to `display`.
    pub fn load(
        storage: SharedStore,
        display: Arc<dyn DisplayMode>,
        diagnostics: SharedSink,
    ) -> Self {
        let theme = match storage.get(THEME_KEY) {
            Ok(Some(raw)) => raw.parse::<Theme>().unwrap_or_else(|e: DiaryError| {
                diagnostics.report(Diagnostic::new(DiagnosticSource::StorageRead, &e));
                Theme::default()
            }),
            Ok(None) => Theme::default(),
            Err(e) => {
                diagnostics.report(Diagnostic::new(DiagnosticSource::StorageRead, &e));
                Theme::default()
            }
        };
        debug!("Loaded theme: {}", theme);

        let state = Self {
            theme,
            storage,
            display,
            diagnostics,
        };
        state.display.apply(theme);
        state
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Switches between light and dark, returning the new theme.
    pub fn toggle(&mut self) -> Theme {
        self.set(self.theme.toggled());
        self.theme
    }

    pub fn set(&mut self, theme: Theme) {
        info!("Theme set to {}", theme);
        self.theme = theme;
        self.display.apply(theme);
        if let Err(e) = self.storage.set(THEME_KEY, theme.as_str()) {
            self.diagnostics
                .report(Diagnostic::new(DiagnosticSource::StorageWrite, &e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStore, RecordingSink};

    fn load(storage: &Arc<MemoryStore>) -> (ThemeState, SharedDisplayMode, Arc<RecordingSink>) {
        let display = SharedDisplayMode::new();
        let sink = RecordingSink::new();
        let state = ThemeState::load(storage.clone(), Arc::new(display.clone()), sink.clone());
        (state, display, sink)
    }

    #[test]
    fn defaults_to_light_and_applies_it() {
        let storage = Arc::new(MemoryStore::new());
        let display = SharedDisplayMode::new();
        display.apply(Theme::Dark);

        let state = ThemeState::load(
            storage.clone(),
            Arc::new(display.clone()),
            RecordingSink::new(),
        );
        assert_eq!(state.theme(), Theme::Light);
        assert_eq!(display.current(), Theme::Light);
    }

    #[test]
    fn toggle_updates_display_and_persists() {
        let storage = Arc::new(MemoryStore::new());
        let (mut state, display, _) = load(&storage);

        assert_eq!(state.toggle(), Theme::Dark);
        assert_eq!(display.current(), Theme::Dark);
        assert_eq!(storage.get(THEME_KEY).unwrap().as_deref(), Some("dark"));

        assert_eq!(state.toggle(), Theme::Light);
        assert_eq!(storage.get(THEME_KEY).unwrap().as_deref(), Some("light"));
    }

    #[test]
    fn persisted_preference_is_restored() {
        let storage = Arc::new(MemoryStore::new());
        storage.set(THEME_KEY, "dark").unwrap();

        let (state, display, sink) = load(&storage);
        assert_eq!(state.theme(), Theme::Dark);
        assert_eq!(display.current(), Theme::Dark);
        assert!(sink.is_empty());
    }

    #[test]
    fn unknown_stored_value_falls_back_to_light() {
        let storage = Arc::new(MemoryStore::new());
        storage.set(THEME_KEY, "solarized").unwrap();

        let (state, _, sink) = load(&storage);
        assert_eq!(state.theme(), Theme::Light);
        assert_eq!(sink.count(DiagnosticSource::StorageRead), 1);
    }

    #[test]
    fn independent_instances_do_not_share_state() {
        let (mut a, display_a, _) = load(&Arc::new(MemoryStore::new()));
        let (b, display_b, _) = load(&Arc::new(MemoryStore::new()));

        a.set(Theme::Dark);
        assert_eq!(display_a.current(), Theme::Dark);
        assert_eq!(b.theme(), Theme::Light);
        assert_eq!(display_b.current(), Theme::Light);
    }

    #[test]
    fn parses_plain_text_values() {
        assert_eq!("dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert_eq!("light\n".parse::<Theme>().unwrap(), Theme::Light);
        assert!("Dark!".parse::<Theme>().is_err());
    }
}
