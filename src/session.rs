//! Signed-in identity, mirrored from an identity provider.
//!
//! The provider owns authentication entirely. A [`Session`] subscribes to it
//! once with [`Session::attach`], keeps a copy of whatever identity the
//! provider last announced, and unsubscribes in [`Session::detach`] (or when
//! dropped). Sign-in and sign-out failures are reported to the diagnostic
//! sink and otherwise ignored.

use std::sync::{Arc, Mutex};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    email_local_part, Diagnostic, DiagnosticSource, DiaryError, KeyValueStore, Result, Scope,
    SharedSink, SharedStore,
};

/// Key the local provider keeps the signed-in identity under.
pub const SESSION_KEY: &str = "diary.session";

/// Name shown when nobody is signed in.
pub const GUEST_NAME: &str = "Guest";

/// An identity as announced by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub uid: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Identity {
    /// Storage scope for this identity. Identities without an email share
    /// the guest scope.
    pub fn scope(&self) -> Scope {
        match self.email.as_deref().map(str::trim) {
            Some(email) if !email.is_empty() => Scope::User(email.to_string()),
            _ => Scope::Guest,
        }
    }

    /// Display name, else the local part of the email, else [`GUEST_NAME`].
    pub fn greeting_name(&self) -> String {
        if let Some(name) = self.display_name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }
        match self.email.as_deref().filter(|e| !e.trim().is_empty()) {
            Some(email) => email_local_part(email).to_string(),
            None => GUEST_NAME.to_string(),
        }
    }
}

/// What a sign-in request hands to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub display_name: Option<String>,
}

/// Handle returned by [`IdentityProvider::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Callback invoked whenever the current identity changes.
pub type IdentityListener = Arc<dyn Fn(Option<&Identity>) + Send + Sync>;

/// External authentication collaborator.
pub trait IdentityProvider: Send + Sync {
    fn current(&self) -> Option<Identity>;

    fn subscribe(&self, listener: IdentityListener) -> SubscriptionId;

    /// Unsubscribing an unknown id does nothing.
    fn unsubscribe(&self, id: SubscriptionId);

    fn sign_in(&self, credentials: &Credentials) -> Result<()>;

    fn sign_out(&self) -> Result<()>;
}

/// Listener registry shared by provider implementations.
#[derive(Default)]
pub struct Listeners {
    inner: Mutex<ListenersInner>,
}

#[derive(Default)]
struct ListenersInner {
    next_id: u64,
    entries: Vec<(SubscriptionId, IdentityListener)>,
}

impl Listeners {
    pub fn add(&self, listener: IdentityListener) -> SubscriptionId {
        let mut inner = match self.inner.lock() {
            Ok(inner) => inner,
            Err(poisoned) => poisoned.into_inner(),
        };
        inner.next_id += 1;
        let id = SubscriptionId(inner.next_id);
        inner.entries.push((id, listener));
        id
    }

    pub fn remove(&self, id: SubscriptionId) {
        let mut inner = match self.inner.lock() {
            Ok(inner) => inner,
            Err(poisoned) => poisoned.into_inner(),
        };
        inner.entries.retain(|(entry, _)| *entry != id);
    }

    pub fn len(&self) -> usize {
        match self.inner.lock() {
            Ok(inner) => inner.entries.len(),
            Err(poisoned) => poisoned.into_inner().entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls every listener. The registry lock is released first, so a
    /// listener may subscribe or unsubscribe.
    pub fn notify(&self, identity: Option<&Identity>) {
        let listeners: Vec<IdentityListener> = match self.inner.lock() {
            Ok(inner) => inner.entries.iter().map(|(_, l)| Arc::clone(l)).collect(),
            Err(poisoned) => poisoned
                .into_inner()
                .entries
                .iter()
                .map(|(_, l)| Arc::clone(l))
                .collect(),
        };
        for listener in listeners {
            listener(identity);
        }
    }
}

/// Profile-based provider for a single machine.
///
/// Signing in records the given email and name under [`SESSION_KEY`]; no
/// password or token exchange takes place.
pub struct LocalIdentityProvider {
    storage: SharedStore,
    current: Mutex<Option<Identity>>,
    listeners: Listeners,
}

impl LocalIdentityProvider {
    /// Restores the recorded identity, if any. An unreadable record counts
    /// as signed out and is reported to `diagnostics`.
    pub fn new(storage: SharedStore, diagnostics: SharedSink) -> Self {
        let current = match read_session(storage.as_ref()) {
            Ok(identity) => identity,
            Err(e) => {
                diagnostics.report(Diagnostic::new(DiagnosticSource::StorageRead, &e));
                None
            }
        };
        debug!("Local identity provider loaded, signed in: {}", current.is_some());
        Self {
            storage,
            current: Mutex::new(current),
            listeners: Listeners::default(),
        }
    }

    fn replace_current(&self, identity: Option<Identity>) {
        match self.current.lock() {
            Ok(mut current) => *current = identity.clone(),
            Err(poisoned) => *poisoned.into_inner() = identity.clone(),
        }
        self.listeners.notify(identity.as_ref());
    }
}

fn read_session(storage: &dyn KeyValueStore) -> Result<Option<Identity>> {
    match storage.get(SESSION_KEY)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

impl IdentityProvider for LocalIdentityProvider {
    fn current(&self) -> Option<Identity> {
        match self.current.lock() {
            Ok(current) => current.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn subscribe(&self, listener: IdentityListener) -> SubscriptionId {
        self.listeners.add(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.remove(id);
    }

    fn sign_in(&self, credentials: &Credentials) -> Result<()> {
        let email = credentials.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(DiaryError::AuthError {
                message: format!("'{}' is not an email address", credentials.email),
            });
        }

        let identity = Identity {
            uid: email.to_lowercase(),
            display_name: credentials
                .display_name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(String::from),
            email: Some(email.to_string()),
        };

        let json = serde_json::to_string(&identity)?;
        self.storage
            .set(SESSION_KEY, &json)
            .map_err(|e| DiaryError::AuthError {
                message: format!("could not record session: {}", e),
            })?;

        info!("Signed in as {}", email);
        self.replace_current(Some(identity));
        Ok(())
    }

    fn sign_out(&self) -> Result<()> {
        self.storage
            .remove(SESSION_KEY)
            .map_err(|e| DiaryError::AuthError {
                message: format!("could not clear session: {}", e),
            })?;
        info!("Signed out");
        self.replace_current(None);
        Ok(())
    }
}

/// The identity the journal is currently working for.
pub struct Session {
    provider: Arc<dyn IdentityProvider>,
    identity: Arc<Mutex<Option<Identity>>>,
    subscription: Option<SubscriptionId>,
    diagnostics: SharedSink,
}

impl Session {
    /// Creates a detached session. Call [`Session::attach`] to start
    /// following the provider.
    pub fn new(provider: Arc<dyn IdentityProvider>, diagnostics: SharedSink) -> Self {
        Self {
            provider,
            identity: Arc::new(Mutex::new(None)),
            subscription: None,
            diagnostics,
        }
    }

    /// Subscribes to the provider and takes over its current identity.
    /// Attaching twice keeps the first subscription.
    pub fn attach(&mut self) {
        if self.subscription.is_some() {
            return;
        }

        let mirror = Arc::clone(&self.identity);
        let listener: IdentityListener = Arc::new(move |identity: Option<&Identity>| {
            debug!("Identity changed, signed in: {}", identity.is_some());
            match mirror.lock() {
                Ok(mut current) => *current = identity.cloned(),
                Err(poisoned) => *poisoned.into_inner() = identity.cloned(),
            }
        });

        self.subscription = Some(self.provider.subscribe(listener));
        self.set_identity(self.provider.current());
        debug!("Session attached to identity provider");
    }

    /// Unsubscribes from the provider. The last known identity is kept.
    pub fn detach(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.provider.unsubscribe(id);
            debug!("Session detached from identity provider");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn identity(&self) -> Option<Identity> {
        match self.identity.lock() {
            Ok(identity) => identity.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.identity().is_some()
    }

    /// Storage scope for the current identity, guest when signed out.
    pub fn scope(&self) -> Scope {
        self.identity()
            .map(|identity| identity.scope())
            .unwrap_or(Scope::Guest)
    }

    pub fn greeting_name(&self) -> String {
        self.identity()
            .map(|identity| identity.greeting_name())
            .unwrap_or_else(|| GUEST_NAME.to_string())
    }

    /// Asks the provider to sign in. Returns whether the request succeeded;
    /// failures only reach the diagnostic sink.
    pub fn sign_in(&self, credentials: &Credentials) -> bool {
        match self.provider.sign_in(credentials) {
            Ok(()) => true,
            Err(e) => {
                self.diagnostics
                    .report(Diagnostic::new(DiagnosticSource::SignIn, &e));
                false
            }
        }
    }

    pub fn sign_out(&self) -> bool {
        match self.provider.sign_out() {
            Ok(()) => true,
            Err(e) => {
                self.diagnostics
                    .report(Diagnostic::new(DiagnosticSource::SignOut, &e));
                false
            }
        }
    }

    fn set_identity(&self, identity: Option<Identity>) {
        match self.identity.lock() {
            Ok(mut current) => *current = identity,
            Err(poisoned) => *poisoned.into_inner() = identity,
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStore, RecordingSink};

    /// Provider that never completes a sign-in and fails every sign-out.
    #[derive(Default)]
    struct FlakyProvider {
        listeners: Listeners,
    }

    impl IdentityProvider for FlakyProvider {
        fn current(&self) -> Option<Identity> {
            None
        }

        fn subscribe(&self, listener: IdentityListener) -> SubscriptionId {
            self.listeners.add(listener)
        }

        fn unsubscribe(&self, id: SubscriptionId) {
            self.listeners.remove(id);
        }

        fn sign_in(&self, _credentials: &Credentials) -> Result<()> {
            Err(DiaryError::AuthError {
                message: "popup closed by user".to_string(),
            })
        }

        fn sign_out(&self) -> Result<()> {
            Err(DiaryError::AuthError {
                message: "network error".to_string(),
            })
        }
    }

    fn local_provider() -> Arc<LocalIdentityProvider> {
        Arc::new(LocalIdentityProvider::new(
            Arc::new(MemoryStore::new()),
            RecordingSink::new(),
        ))
    }

    fn ada() -> Credentials {
        Credentials {
            email: "ada@example.com".to_string(),
            display_name: Some("Ada".to_string()),
        }
    }

    #[test]
    fn scope_follows_provider_events() {
        let provider = local_provider();
        let mut session = Session::new(provider.clone(), RecordingSink::new());
        session.attach();
        assert_eq!(session.scope(), Scope::Guest);

        assert!(session.sign_in(&ada()));
        assert_eq!(session.scope(), Scope::User("ada@example.com".into()));
        assert_eq!(session.greeting_name(), "Ada");

        assert!(session.sign_out());
        assert_eq!(session.scope(), Scope::Guest);
        assert_eq!(session.greeting_name(), GUEST_NAME);
    }

    #[test]
    fn attach_and_detach_are_paired() {
        let provider = local_provider();
        let mut session = Session::new(provider.clone(), RecordingSink::new());

        session.attach();
        session.attach();
        assert_eq!(provider.listeners.len(), 1);

        session.detach();
        assert!(provider.listeners.is_empty());
        assert!(!session.is_attached());

        // Events after detaching are not mirrored.
        provider.sign_in(&ada()).unwrap();
        assert_eq!(session.scope(), Scope::Guest);
    }

    #[test]
    fn dropping_a_session_unsubscribes() {
        let provider = local_provider();
        {
            let mut session = Session::new(provider.clone(), RecordingSink::new());
            session.attach();
            assert_eq!(provider.listeners.len(), 1);
        }
        assert!(provider.listeners.is_empty());
    }

    #[test]
    fn provider_failures_go_to_diagnostics_only() {
        let sink = RecordingSink::new();
        let mut session = Session::new(Arc::new(FlakyProvider::default()), sink.clone());
        session.attach();

        assert!(!session.sign_in(&ada()));
        assert!(!session.sign_out());
        assert!(!session.is_signed_in());
        assert_eq!(sink.count(DiagnosticSource::SignIn), 1);
        assert_eq!(sink.count(DiagnosticSource::SignOut), 1);
    }

    #[test]
    fn local_provider_restores_persisted_identity() {
        let storage = Arc::new(MemoryStore::new());
        LocalIdentityProvider::new(storage.clone(), RecordingSink::new())
            .sign_in(&ada())
            .unwrap();

        let provider = LocalIdentityProvider::new(storage.clone(), RecordingSink::new());
        let identity = provider.current().unwrap();
        assert_eq!(identity.email.as_deref(), Some("ada@example.com"));
        assert_eq!(identity.uid, "ada@example.com");

        provider.sign_out().unwrap();
        assert_eq!(storage.get(SESSION_KEY).unwrap(), None);
    }

    #[test]
    fn local_provider_rejects_non_email() {
        let provider = local_provider();
        let err = provider
            .sign_in(&Credentials {
                email: "ada".to_string(),
                display_name: None,
            })
            .unwrap_err();
        assert!(matches!(err, DiaryError::AuthError { .. }));
        assert!(provider.current().is_none());
    }

    #[test]
    fn corrupt_session_record_means_signed_out() {
        let storage = Arc::new(MemoryStore::new());
        storage.set(SESSION_KEY, "{not json").unwrap();
        let sink = RecordingSink::new();

        let provider = Arc::new(LocalIdentityProvider::new(storage, sink.clone()));
        assert!(provider.current().is_none());
        assert_eq!(sink.count(DiagnosticSource::StorageRead), 1);

        let mut session = Session::new(provider, sink.clone());
        session.attach();
        assert_eq!(session.scope(), Scope::Guest);
        assert_eq!(sink.entries().len(), 1);
    }

    #[test]
    fn greeting_name_fallbacks() {
        let mut identity = Identity {
            uid: "u".into(),
            display_name: Some("Grace Hopper".into()),
            email: Some("grace@navy.mil".into()),
        };
        assert_eq!(identity.greeting_name(), "Grace Hopper");

        identity.display_name = Some("  ".into());
        assert_eq!(identity.greeting_name(), "grace");

        identity.email = None;
        assert_eq!(identity.greeting_name(), GUEST_NAME);
        assert_eq!(identity.scope(), Scope::Guest);
    }
}
