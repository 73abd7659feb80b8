//! API key gate.
//!
//! The host decides where keys come from (environment, a prompt, a key
//! picker). The studio only asks whether one is available and, if not, asks
//! the host to select one.

use crate::error::{AppError, Result};
use std::sync::{Arc, RwLock};

/// Shared slot holding the current API key.
///
/// The Gemini client reads it on every request, so a key selected mid-session
/// is picked up by the next call.
#[derive(Clone, Debug, Default)]
pub struct CredentialStore {
    key: Arc<RwLock<Option<String>>>,
}

impl CredentialStore {
    pub fn new(key: Option<String>) -> Self {
        Self {
            key: Arc::new(RwLock::new(key.filter(|k| !k.trim().is_empty()))),
        }
    }

    pub fn get(&self) -> Option<String> {
        match self.key.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set(&self, key: impl Into<String>) {
        let key = key.into();
        let value = (!key.trim().is_empty()).then(|| key.trim().to_string());
        match self.key.write() {
            Ok(mut guard) => *guard = value,
            Err(poisoned) => *poisoned.into_inner() = value,
        }
    }

    pub fn clear(&self) {
        match self.key.write() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }

    pub fn is_set(&self) -> bool {
        self.get().is_some()
    }
}

/// Host capability backing the credential gate.
#[allow(async_fn_in_trait)]
pub trait CredentialProvider {
    /// Whether a usable key is available right now.
    async fn has_credential(&self) -> Result<bool>;

    /// Lets the user pick a key. Returning `Ok` opens the gate.
    async fn select_credential(&self) -> Result<()>;
}

/// Provider backed by the environment only; it cannot ask for a new key.
#[derive(Clone, Debug)]
pub struct EnvCredential {
    store: CredentialStore,
}

impl EnvCredential {
    pub fn new(store: CredentialStore) -> Self {
        Self { store }
    }
}

impl CredentialProvider for EnvCredential {
    async fn has_credential(&self) -> Result<bool> {
        Ok(self.store.is_set())
    }

    async fn select_credential(&self) -> Result<()> {
        if self.store.is_set() {
            Ok(())
        } else {
            Err(AppError::MissingEnvVar("GEMINI_API_KEY".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_ignores_blank_keys() {
        let store = CredentialStore::new(Some("   ".into()));
        assert!(!store.is_set());
        store.set(" abc ");
        assert_eq!(store.get().as_deref(), Some("abc"));
        store.set("");
        assert!(!store.is_set());
    }

    #[test]
    fn clones_share_the_key() {
        let store = CredentialStore::default();
        let other = store.clone();
        other.set("k");
        assert!(store.is_set());
        store.clear();
        assert!(!other.is_set());
    }

    #[tokio::test]
    async fn env_provider_reports_store_state() {
        let store = CredentialStore::default();
        let provider = EnvCredential::new(store.clone());
        assert!(!provider.has_credential().await.unwrap());
        assert!(matches!(
            provider.select_credential().await,
            Err(AppError::MissingEnvVar(_))
        ));
        store.set("key");
        assert!(provider.has_credential().await.unwrap());
        assert!(provider.select_credential().await.is_ok());
    }
}
