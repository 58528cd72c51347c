use std::sync::{Mutex, MutexGuard, PoisonError};

use gloo_storage::{SessionStorage, Storage};
use tracing::{debug, info};

use super::errors::{ClientError, ClientResult};
use super::types::SessionSnapshot;
use crate::console_warn;

/// Storage keys for the guest session record
pub const USERNAME_KEY: &str = "guest_session.username";
pub const TOKEN_ISSUED_AT_KEY: &str = "guest_session.token_issued_at";
pub const SESSION_DURATION_KEY: &str = "guest_session.session_duration_ms";

/// Tab-scoped store for the guest session record.
///
/// Every operation is infallible from the caller's point of view: when the
/// backing storage cannot be used, reads return `None` and writes do nothing.
pub trait SessionStore {
    fn get_username(&self) -> Option<String>;
    fn set_username(&self, username: &str);
    fn get_token_issued_at(&self) -> Option<i64>;
    fn set_token_issued_at(&self, issued_at_ms: i64);
    fn get_session_duration(&self) -> Option<u64>;
    fn set_session_duration(&self, duration_ms: u64);
    /// Remove all three session fields.
    fn clear(&self);

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            username: self.get_username(),
            token_issued_at: self.get_token_issued_at(),
            session_duration_ms: self.get_session_duration(),
        }
    }
}

/// `window.sessionStorage` backed store.
///
/// Survives reloads within a tab, cleared when the tab closes. Each access
/// first checks that session storage exists and is usable (it throws in some
/// privacy modes) before handing off to `gloo-storage`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserSessionStore;

impl BrowserSessionStore {
    pub fn new() -> Self {
        Self
    }

    /// Whether `sessionStorage` can be used right now.
    pub fn is_available() -> bool {
        if cfg!(not(target_arch = "wasm32")) {
            return false;
        }

        web_sys::window()
            .and_then(|w| w.session_storage().ok().flatten())
            .is_some()
    }

    /// Capability check run before every access.
    fn ensure_available(operation: &str, key: &str) -> ClientResult<()> {
        if Self::is_available() {
            Ok(())
        } else {
            Err(ClientError::StorageUnavailable {
                operation: format!("{} {}", operation, key),
            })
        }
    }

    fn read<T: serde::de::DeserializeOwned>(key: &str) -> Option<T> {
        Self::ensure_available("read", key).ok()?;
        SessionStorage::get::<T>(key).ok()
    }

    fn write<T: serde::Serialize>(key: &str, value: T) {
        if let Err(e) = Self::ensure_available("write", key) {
            debug!("{}, dropping write", e);
            return;
        }
        if let Err(e) = SessionStorage::set(key, value) {
            console_warn!(
                "{}: {:?}",
                ClientError::StorageUnavailable {
                    operation: format!("write {}", key),
                },
                e
            );
        }
    }

    fn remove(key: &str) {
        if Self::ensure_available("remove", key).is_ok() {
            SessionStorage::delete(key);
        }
    }
}

impl SessionStore for BrowserSessionStore {
    fn get_username(&self) -> Option<String> {
        Self::read(USERNAME_KEY)
    }

    fn set_username(&self, username: &str) {
        Self::write(USERNAME_KEY, username)
    }

    fn get_token_issued_at(&self) -> Option<i64> {
        Self::read(TOKEN_ISSUED_AT_KEY)
    }

    fn set_token_issued_at(&self, issued_at_ms: i64) {
        Self::write(TOKEN_ISSUED_AT_KEY, issued_at_ms)
    }

    fn get_session_duration(&self) -> Option<u64> {
        Self::read(SESSION_DURATION_KEY)
    }

    fn set_session_duration(&self, duration_ms: u64) {
        Self::write(SESSION_DURATION_KEY, duration_ms)
    }

    fn clear(&self) {
        Self::remove(USERNAME_KEY);
        Self::remove(TOKEN_ISSUED_AT_KEY);
        Self::remove(SESSION_DURATION_KEY);
        info!("Guest session cleared from sessionStorage");
    }
}

/// In-process store, used off-browser and in tests.
///
/// `unavailable()` builds a store that behaves like a browser with storage
/// disabled: reads are always `None` and writes vanish.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    record: Mutex<SessionSnapshot>,
    unavailable: bool,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: SessionSnapshot) -> Self {
        Self {
            record: Mutex::new(snapshot),
            unavailable: false,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            record: Mutex::new(SessionSnapshot::default()),
            unavailable: true,
        }
    }

    fn record(&self) -> Option<MutexGuard<'_, SessionSnapshot>> {
        if self.unavailable {
            return None;
        }
        Some(self.record.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl SessionStore for MemorySessionStore {
    fn get_username(&self) -> Option<String> {
        self.record().and_then(|r| r.username.clone())
    }

    fn set_username(&self, username: &str) {
        if let Some(mut r) = self.record() {
            r.username = Some(username.to_string());
        }
    }

    fn get_token_issued_at(&self) -> Option<i64> {
        self.record().and_then(|r| r.token_issued_at)
    }

    fn set_token_issued_at(&self, issued_at_ms: i64) {
        if let Some(mut r) = self.record() {
            r.token_issued_at = Some(issued_at_ms);
        }
    }

    fn get_session_duration(&self) -> Option<u64> {
        self.record().and_then(|r| r.session_duration_ms)
    }

    fn set_session_duration(&self, duration_ms: u64) {
        if let Some(mut r) = self.record() {
            r.session_duration_ms = Some(duration_ms);
        }
    }

    fn clear(&self) {
        if let Some(mut r) = self.record() {
            *r = SessionSnapshot::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_storage_and_retrieval() {
        let store = MemorySessionStore::new();
        assert!(store.snapshot().is_empty());

        store.set_token_issued_at(1_000);
        store.set_username("guest");
        store.set_session_duration(1_800_000);

        assert_eq!(store.get_username().as_deref(), Some("guest"));
        assert_eq!(store.get_token_issued_at(), Some(1_000));
        assert_eq!(store.get_session_duration(), Some(1_800_000));
        assert!(store.snapshot().is_established());

        store.clear();
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn unavailable_storage_reads_absent_and_ignores_writes() {
        let store = MemorySessionStore::unavailable();

        store.set_username("guest");
        store.set_token_issued_at(1_000);
        store.set_session_duration(60_000);
        store.clear();

        assert_eq!(store.get_username(), None);
        assert_eq!(store.get_token_issued_at(), None);
        assert_eq!(store.get_session_duration(), None);
    }

    #[test]
    fn browser_store_degrades_off_browser() {
        let store = BrowserSessionStore::new();
        assert!(!BrowserSessionStore::is_available());

        store.set_username("guest");
        store.clear();
        assert_eq!(store.get_username(), None);
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn browser_store_reports_missing_storage() {
        assert_eq!(
            BrowserSessionStore::ensure_available("write", USERNAME_KEY),
            Err(ClientError::StorageUnavailable {
                operation: "write guest_session.username".to_string(),
            })
        );
    }
}
