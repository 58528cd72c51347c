//! Serialized guest session refresh.
//!
//! `SessionRefresher` makes sure at most one refresh is talking to the auth
//! gateway at a time, and only touches the session store after a successful
//! call made while its owner is still active.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use super::auth_gateway::AuthGateway;
use super::errors::ClientError;
use super::session::SessionStore;
use super::types::{GuestIdentity, SessionGrant};
use crate::utils::Clock;

/// Result of a single refresh attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The gateway granted a new session and the store was updated.
    Refreshed,
    /// The gateway failed or rejected the request; the store is untouched.
    Failed,
    /// Another refresh was already in flight; the gateway was not called.
    AlreadyInFlight,
    /// The refresher was deactivated while the call was outstanding; the
    /// result was thrown away.
    Discarded,
}

impl RefreshOutcome {
    pub fn succeeded(self) -> bool {
        self == RefreshOutcome::Refreshed
    }
}

/// Clears the in-flight flag when dropped, including when the refresh future
/// is dropped mid-call.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Write a granted session into the store.
///
/// The issue time goes first so a reader never sees a username without one.
pub(crate) fn apply_grant(
    store: &dyn SessionStore,
    issued_at: i64,
    grant: &SessionGrant,
    username: Option<&str>,
) {
    store.set_token_issued_at(issued_at);

    match (grant.valid_duration_ms(), grant.session_duration_ms) {
        (Some(duration_ms), _) => store.set_session_duration(duration_ms),
        (None, Some(raw)) => {
            let e = ClientError::MalformedHint {
                value: raw.to_string(),
            };
            warn!("Keeping current session duration: {}", e);
        }
        (None, None) => {}
    }

    if let Some(username) = username {
        store.set_username(username);
    }
}

#[derive(Clone)]
pub struct SessionRefresher {
    store: Arc<dyn SessionStore>,
    gateway: Arc<dyn AuthGateway>,
    clock: Arc<dyn Clock>,
    fallback_username: String,
    refreshing: Arc<AtomicBool>,
    active: Arc<AtomicBool>,
}

impl SessionRefresher {
    pub fn new(
        store: Arc<dyn SessionStore>,
        gateway: Arc<dyn AuthGateway>,
        clock: Arc<dyn Clock>,
        fallback_username: impl Into<String>,
    ) -> Self {
        Self {
            store,
            gateway,
            clock,
            fallback_username: fallback_username.into(),
            refreshing: Arc::new(AtomicBool::new(false)),
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Share an existing liveness flag instead of owning one. Clearing that
    /// flag makes every outstanding refresh discard its result.
    pub fn with_liveness(mut self, active: Arc<AtomicBool>) -> Self {
        self.active = active;
        self
    }

    /// Refresh the guest session. `true` only when a new session was stored.
    pub async fn refresh(&self) -> bool {
        self.try_refresh().await.succeeded()
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Stop applying results. Refreshes already in flight finish without
    /// writing anything.
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }

    fn identity(&self) -> GuestIdentity {
        GuestIdentity::new(
            self.store
                .get_username()
                .unwrap_or_else(|| self.fallback_username.clone()),
        )
    }

    #[instrument(skip(self))]
    pub async fn try_refresh(&self) -> RefreshOutcome {
        if self
            .refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Refresh already in flight, skipping");
            return RefreshOutcome::AlreadyInFlight;
        }
        let _guard = InFlightGuard(&self.refreshing);

        let identity = self.identity();
        let requested_at = self.clock.now_ms();
        let result = self.gateway.acquire_guest_session(&identity).await;

        if !self.is_active() {
            debug!("Refresher deactivated while request was outstanding, discarding result");
            return RefreshOutcome::Discarded;
        }

        match result {
            Ok(grant) => {
                apply_grant(self.store.as_ref(), requested_at, &grant, None);
                info!("Guest session refreshed for {}", identity.username);
                RefreshOutcome::Refreshed
            }
            Err(e @ ClientError::UpstreamRejected { .. }) => {
                warn!("Guest session refresh rejected: {}", e);
                RefreshOutcome::Failed
            }
            Err(e) => {
                error!("Guest session refresh failed: {}", e);
                RefreshOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::client::session::MemorySessionStore;
    use crate::services::client::test_support::ScriptedGateway;
    use crate::services::client::types::SessionSnapshot;
    use crate::utils::ManualClock;

    const NOW: i64 = 1_750_000_000_000;

    fn established() -> SessionSnapshot {
        SessionSnapshot {
            username: Some("guest-42".to_string()),
            token_issued_at: Some(NOW - 3_360_000),
            session_duration_ms: Some(3_600_000),
        }
    }

    fn refresher(
        store: &Arc<MemorySessionStore>,
        gateway: &Arc<ScriptedGateway>,
    ) -> SessionRefresher {
        SessionRefresher::new(
            store.clone(),
            gateway.clone(),
            Arc::new(ManualClock::new(NOW)),
            "guest",
        )
    }

    #[tokio::test]
    async fn success_stamps_call_time_and_duration_hint() {
        let store = Arc::new(MemorySessionStore::with_snapshot(established()));
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push(Ok(SessionGrant::with_duration_hint(1_800_000.0)));

        assert!(refresher(&store, &gateway).refresh().await);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.token_issued_at, Some(NOW));
        assert_eq!(snapshot.session_duration_ms, Some(1_800_000));
        assert_eq!(snapshot.username.as_deref(), Some("guest-42"));
        assert_eq!(gateway.identities(), vec![GuestIdentity::new("guest-42")]);
    }

    #[tokio::test]
    async fn missing_or_bad_hint_keeps_stored_duration() {
        let store = Arc::new(MemorySessionStore::with_snapshot(established()));
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push(Ok(SessionGrant::default()));
        gateway.push(Ok(SessionGrant::with_duration_hint(-10.0)));
        gateway.push(Ok(SessionGrant::with_duration_hint(f64::NAN)));
        let refresher = refresher(&store, &gateway);

        for _ in 0..3 {
            assert_eq!(refresher.try_refresh().await, RefreshOutcome::Refreshed);
            assert_eq!(store.get_session_duration(), Some(3_600_000));
            assert_eq!(store.get_token_issued_at(), Some(NOW));
        }
    }

    #[tokio::test]
    async fn failure_leaves_store_identical() {
        let store = Arc::new(MemorySessionStore::with_snapshot(established()));
        let gateway = Arc::new(ScriptedGateway::new());
        gateway.push(Err(ClientError::UpstreamRejected {
            status: 401,
            message: "no".to_string(),
        }));
        gateway.push(Err(ClientError::NetworkError {
            message: "offline".to_string(),
        }));
        let refresher = refresher(&store, &gateway);
        let before = store.snapshot();

        assert!(!refresher.refresh().await);
        assert_eq!(store.snapshot(), before);
        assert!(!refresher.refresh().await);
        assert_eq!(store.snapshot(), before);
        assert!(!refresher.is_refreshing());
    }

    #[tokio::test]
    async fn concurrent_refreshes_hit_gateway_once() {
        let store = Arc::new(MemorySessionStore::with_snapshot(established()));
        let gateway = Arc::new(ScriptedGateway::gated());
        let refresher = refresher(&store, &gateway);

        let (first, second, _) = tokio::join!(
            refresher.try_refresh(),
            refresher.try_refresh(),
            async { gateway.release() },
        );

        assert_eq!(first, RefreshOutcome::Refreshed);
        assert_eq!(second, RefreshOutcome::AlreadyInFlight);
        assert_eq!(gateway.calls(), 1);
        assert!(!refresher.is_refreshing());
    }

    #[tokio::test]
    async fn dropped_refresh_releases_in_flight_flag() {
        let store = Arc::new(MemorySessionStore::with_snapshot(established()));
        let gateway = Arc::new(ScriptedGateway::gated());
        let refresher = refresher(&store, &gateway);

        {
            let pending = refresher.try_refresh();
            tokio::pin!(pending);
            // poll once so the flag is taken, then drop the future
            assert!(futures::poll!(pending.as_mut()).is_pending());
            assert!(refresher.is_refreshing());
        }

        assert!(!refresher.is_refreshing());
    }

    #[tokio::test]
    async fn deactivated_refresher_discards_late_result() {
        let store = Arc::new(MemorySessionStore::with_snapshot(established()));
        let gateway = Arc::new(ScriptedGateway::gated());
        gateway.push(Ok(SessionGrant::with_duration_hint(1_800_000.0)));
        let refresher = refresher(&store, &gateway);
        let before = store.snapshot();

        let (outcome, _) = tokio::join!(refresher.try_refresh(), async {
            refresher.deactivate();
            gateway.release();
        });

        assert_eq!(outcome, RefreshOutcome::Discarded);
        assert_eq!(store.snapshot(), before);
    }

    #[tokio::test]
    async fn falls_back_to_configured_username() {
        let store = Arc::new(MemorySessionStore::new());
        let gateway = Arc::new(ScriptedGateway::new());

        assert!(refresher(&store, &gateway).refresh().await);
        assert_eq!(gateway.identities(), vec![GuestIdentity::new("guest")]);
        assert_eq!(store.get_username(), None);
    }
}
