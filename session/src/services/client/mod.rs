// Client-side guest session management
//
// This module provides:
// - Session freshness arithmetic (token_clock)
// - Tab-scoped session storage with graceful degradation (session)
// - Guest login against the upstream auth endpoint (auth_gateway, bootstrap)
// - Serialized refresh and the polling monitor (session_refresh, session_monitor)

pub mod auth_gateway;
pub mod bootstrap;
pub mod errors;
pub mod session;
pub mod session_monitor;
pub mod session_refresh;
pub mod token_clock;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

// Re-export core types for easy access
pub use types::{GuestIdentity, SessionEvent, SessionGrant, SessionSnapshot};

// Re-export error types
pub use errors::{ClientError, ClientResult, ErrorSeverity};

pub use auth_gateway::{parse_duration_hint, AuthGateway, HttpAuthGateway};
pub use session::{BrowserSessionStore, MemorySessionStore, SessionStore};
pub use session_monitor::{MonitorHandle, MonitorState, SessionMonitor};
pub use session_refresh::{RefreshOutcome, SessionRefresher};
pub use token_clock::TokenStatus;

use crate::services::config::AppConfig;
use crate::services::fetch::FetchInterceptor;
use crate::utils::{Clock, SystemClock};

/// Convenience bundle of everything a page needs for its guest session
#[derive(Clone)]
pub struct SessionClient {
    pub config: AppConfig,
    pub store: Arc<dyn SessionStore>,
    pub gateway: Arc<dyn AuthGateway>,
    pub clock: Arc<dyn Clock>,
    pub fetch: FetchInterceptor,
}

impl SessionClient {
    /// Browser wiring: `sessionStorage`, HTTP guest login, real clock.
    pub fn new(config: AppConfig) -> Self {
        let gateway = HttpAuthGateway::new(
            config.resolve(&config.session.auth_endpoint),
            config.session.session_duration_header.clone(),
        );
        Self::with_parts(
            config,
            Arc::new(BrowserSessionStore::new()),
            Arc::new(gateway),
            Arc::new(SystemClock),
        )
    }

    pub fn with_parts(
        config: AppConfig,
        store: Arc<dyn SessionStore>,
        gateway: Arc<dyn AuthGateway>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let fetch = FetchInterceptor::new(&config);
        Self {
            config,
            store,
            gateway,
            clock,
            fetch,
        }
    }

    /// Log in as a guest unless the tab already has a session
    pub async fn ensure_session(&self) -> ClientResult<bool> {
        bootstrap::ensure_session(
            self.store.as_ref(),
            self.gateway.as_ref(),
            self.clock.as_ref(),
            &self.config.session.guest_username,
        )
        .await
    }

    /// Start a session monitor bound to this client's store and gateway
    pub fn start_monitor(&self) -> MonitorHandle {
        SessionMonitor::new(
            self.config.session.clone(),
            self.store.clone(),
            self.gateway.clone(),
            self.clock.clone(),
        )
        .start()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.store.snapshot()
    }

    pub fn clear_session(&self) {
        self.store.clear()
    }
}
