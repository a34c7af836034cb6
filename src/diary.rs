use std::sync::Arc;

use log::{debug, info};

use crate::{
    filter_notes, Clock, Credentials, DisplayMode, IdentityProvider, Note, NoteDraft, NoteFilter,
    NotePatch, NoteStore, Session, SharedSink, SharedStore, SystemClock, Theme, ThemeState,
};

/// The journal for whoever is signed in.
///
/// Owns the session, the note store of the session's scope and the theme.
/// Every note operation first checks the session scope, so a sign-in or
/// sign-out announced by the provider switches the collection before the
/// next read or write.
pub struct Diary {
    session: Session,
    store: NoteStore,
    theme: ThemeState,
}

impl Diary {
    pub fn open(
        storage: SharedStore,
        provider: Arc<dyn IdentityProvider>,
        display: Arc<dyn DisplayMode>,
        diagnostics: SharedSink,
    ) -> Self {
        Self::with_clock(storage, provider, display, diagnostics, Arc::new(SystemClock))
    }

    pub fn with_clock(
        storage: SharedStore,
        provider: Arc<dyn IdentityProvider>,
        display: Arc<dyn DisplayMode>,
        diagnostics: SharedSink,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut session = Session::new(provider, Arc::clone(&diagnostics));
        session.attach();

        let store = NoteStore::with_clock(
            session.scope(),
            Arc::clone(&storage),
            Arc::clone(&diagnostics),
            clock,
        );
        let theme = ThemeState::load(storage, display, diagnostics);

        info!(
            "Diary opened for {} with {} notes",
            session.greeting_name(),
            store.len()
        );
        Self {
            session,
            store,
            theme,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    pub fn theme(&self) -> Theme {
        self.theme.theme()
    }

    /// Points the store at the session's current scope. Returns whether the
    /// collection changed.
    pub fn refresh_scope(&mut self) -> bool {
        let scope = self.session.scope();
        if &scope == self.store.scope() {
            return false;
        }
        debug!("Session scope is now {}", scope);
        self.store.switch_scope(scope);
        true
    }

    pub fn sign_in(&mut self, credentials: &Credentials) -> bool {
        let signed_in = self.session.sign_in(credentials);
        self.refresh_scope();
        signed_in
    }

    pub fn sign_out(&mut self) -> bool {
        let signed_out = self.session.sign_out();
        self.refresh_scope();
        signed_out
    }

    pub fn notes(&mut self) -> &[Note] {
        self.refresh_scope();
        self.store.notes()
    }

    pub fn get(&mut self, id: &str) -> Option<&Note> {
        self.refresh_scope();
        self.store.get(id)
    }

    /// The derived view for `filter`.
    pub fn view(&mut self, filter: &NoteFilter) -> Vec<&Note> {
        self.refresh_scope();
        filter_notes(self.store.notes(), filter)
    }

    pub fn tags(&mut self) -> Vec<String> {
        self.refresh_scope();
        self.store.tags()
    }

    pub fn create(&mut self, draft: NoteDraft) -> String {
        self.refresh_scope();
        self.store.create(draft)
    }

    pub fn update(&mut self, id: &str, patch: NotePatch) -> bool {
        self.refresh_scope();
        self.store.update(id, patch)
    }

    pub fn delete(&mut self, id: &str) -> bool {
        self.refresh_scope();
        self.store.delete(id)
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme.toggle()
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme.set(theme);
    }

    /// Unsubscribes from the identity provider.
    pub fn close(mut self) {
        self.session.detach();
        info!("Diary closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        IdentityProvider, LocalIdentityProvider, MemoryStore, RecordingSink, Scope,
        SharedDisplayMode,
    };

    struct Fixture {
        storage: Arc<MemoryStore>,
        provider: Arc<LocalIdentityProvider>,
        display: SharedDisplayMode,
        sink: Arc<RecordingSink>,
    }

    impl Fixture {
        fn new() -> Self {
            let storage = Arc::new(MemoryStore::new());
            let sink = RecordingSink::new();
            Self {
                provider: Arc::new(LocalIdentityProvider::new(storage.clone(), sink.clone())),
                storage,
                display: SharedDisplayMode::new(),
                sink,
            }
        }

        fn open(&self) -> Diary {
            Diary::open(
                self.storage.clone(),
                self.provider.clone(),
                Arc::new(self.display.clone()),
                self.sink.clone(),
            )
        }
    }

    fn ada() -> Credentials {
        Credentials {
            email: "ada@example.com".to_string(),
            display_name: None,
        }
    }

    #[test]
    fn signing_in_switches_collection() {
        let fx = Fixture::new();
        let mut diary = fx.open();
        diary.create(NoteDraft::new().title("guest thought"));

        assert!(diary.sign_in(&ada()));
        assert_eq!(diary.store().scope(), &Scope::User("ada@example.com".into()));
        assert!(diary.notes().is_empty());

        diary.create(NoteDraft::new().title("ada thought"));
        assert!(diary.sign_out());
        let titles: Vec<_> = diary.notes().iter().map(|n| n.title.clone()).collect();
        assert_eq!(titles, vec!["guest thought"]);
    }

    #[test]
    fn provider_events_outside_the_diary_are_picked_up() {
        let fx = Fixture::new();
        let mut diary = fx.open();

        fx.provider.sign_in(&ada()).unwrap();
        diary.create(NoteDraft::new().title("written after external sign-in"));

        assert_eq!(diary.store().scope(), &Scope::User("ada@example.com".into()));
        assert_eq!(diary.session().greeting_name(), "ada");
    }

    #[test]
    fn view_applies_filter() {
        let fx = Fixture::new();
        let mut diary = fx.open();
        diary.create(NoteDraft::new().title("Morning Run").tags(["fitness"]));
        diary.create(NoteDraft::new().title("Shopping").tags(["errands"]));

        let view = diary.view(&NoteFilter::new("run", ""));
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].title, "Morning Run");
    }

    #[test]
    fn theme_toggle_reaches_display() {
        let fx = Fixture::new();
        let mut diary = fx.open();
        assert_eq!(diary.theme(), Theme::Light);
        assert_eq!(diary.toggle_theme(), Theme::Dark);
        assert_eq!(fx.display.current(), Theme::Dark);

        let reopened = fx.open();
        assert_eq!(reopened.theme(), Theme::Dark);
    }

    #[test]
    fn closing_unsubscribes() {
        let fx = Fixture::new();
        let diary = fx.open();
        diary.close();

        // With nobody listening, signing in must still work.
        fx.provider.sign_in(&ada()).unwrap();
        assert!(fx.provider.current().is_some());
        assert!(fx.sink.is_empty());
    }
}
