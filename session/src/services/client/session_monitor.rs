//! Guest session monitor.
//!
//! A started monitor checks the stored session immediately and then once per
//! tick interval. Each tick either does nothing (`Idle`), refreshes a session
//! that is about to lapse (`RefreshPending`), or clears a lapsed one
//! (`Expired`). Refreshes run as their own tasks, so a slow refresh from one
//! tick can still be outstanding when the next tick fires; the refresher's
//! in-flight flag keeps those from doubling up, and a tick that finds the
//! session lapsed while such a refresh is outstanding leaves the record alone
//! until the refresh settles.
//!
//! The monitor never gives up on its own. Only [`MonitorHandle::stop`], or
//! dropping the last handle, ends it; after that no further ticks run and late
//! refresh results are dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::future::{AbortHandle, Abortable};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::auth_gateway::AuthGateway;
use super::session::SessionStore;
use super::session_refresh::{RefreshOutcome, SessionRefresher};
use super::token_clock::{self, TokenStatus};
use super::types::SessionEvent;
use crate::services::config::SessionConfig;
use crate::utils::timer::{sleep, spawn_local};
use crate::utils::Clock;

const EVENT_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Stopped,
    Idle,
    RefreshPending,
    Expired,
}

/// Everything a monitor needs; `start()` turns it into a running monitor.
pub struct SessionMonitor {
    config: SessionConfig,
    store: Arc<dyn SessionStore>,
    gateway: Arc<dyn AuthGateway>,
    clock: Arc<dyn Clock>,
}

impl SessionMonitor {
    pub fn new(
        config: SessionConfig,
        store: Arc<dyn SessionStore>,
        gateway: Arc<dyn AuthGateway>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            store,
            gateway,
            clock,
        }
    }

    /// Start polling. Must be called from within a local task executor (the
    /// browser event loop, or a tokio `LocalSet` natively).
    ///
    /// A disabled configuration returns a handle that is already stopped.
    pub fn start(self) -> MonitorHandle {
        let active = Arc::new(AtomicBool::new(self.config.enabled));
        let refresher = SessionRefresher::new(
            self.store.clone(),
            self.gateway,
            self.clock.clone(),
            self.config.guest_username.clone(),
        )
        .with_liveness(active.clone());
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let initial = if self.config.enabled {
            MonitorState::Idle
        } else {
            MonitorState::Stopped
        };

        let inner = Arc::new(MonitorInner {
            config: self.config,
            store: self.store,
            clock: self.clock,
            refresher,
            active,
            state: Mutex::new(initial),
            events,
        });

        let (abort, registration) = AbortHandle::new_pair();
        if inner.is_active() {
            info!(
                "Session monitor started (tick every {} ms, refresh threshold {} min)",
                inner.config.tick_interval_ms, inner.config.refresh_threshold_minutes
            );
            let looped = Arc::clone(&inner);
            spawn_local(async move {
                let _ = Abortable::new(run_loop(looped), registration).await;
            });
        } else {
            info!("Session monitor disabled by configuration");
        }

        MonitorHandle {
            run: Arc::new(MonitorRun { inner, abort }),
        }
    }
}

/// Owning handle to a running monitor. Clones refer to the same monitor.
///
/// Dropping the last clone stops the monitor the same way [`stop`] does.
///
/// [`stop`]: MonitorHandle::stop
#[derive(Clone)]
pub struct MonitorHandle {
    run: Arc<MonitorRun>,
}

impl MonitorHandle {
    /// Stop the monitor. No tick runs after this returns, and a refresh that
    /// is still in flight will not write to storage or publish events.
    pub fn stop(&self) {
        self.run.stop();
    }

    pub fn is_running(&self) -> bool {
        self.run.inner.is_active()
    }

    pub fn state(&self) -> MonitorState {
        self.run.inner.state()
    }

    /// Subscribe to session notifications from this monitor.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.run.inner.events.subscribe()
    }

    /// Run one check right now, outside the regular schedule, and wait for
    /// any refresh it starts.
    pub async fn check_now(&self) -> MonitorState {
        self.run.inner.tick().await
    }
}

/// Shared by every clone of a handle. The tick loop holds its own reference
/// to the inner state, so ownership of the loop lives here.
struct MonitorRun {
    inner: Arc<MonitorInner>,
    abort: AbortHandle,
}

impl MonitorRun {
    fn stop(&self) {
        if self.inner.active.swap(false, Ordering::AcqRel) {
            info!("Session monitor stopped");
        }
        self.abort.abort();
        self.inner.set_state(MonitorState::Stopped);
    }
}

impl Drop for MonitorRun {
    fn drop(&mut self) {
        self.stop();
    }
}

struct MonitorInner {
    config: SessionConfig,
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    refresher: SessionRefresher,
    active: Arc<AtomicBool>,
    state: Mutex<MonitorState>,
    events: broadcast::Sender<SessionEvent>,
}

async fn run_loop(inner: Arc<MonitorInner>) {
    let interval = Duration::from_millis(inner.config.tick_interval_ms);
    while inner.is_active() {
        let ticking = Arc::clone(&inner);
        spawn_local(async move {
            ticking.tick().await;
        });
        sleep(interval).await;
    }
}

impl MonitorInner {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn state(&self) -> MonitorState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: MonitorState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn publish(&self, event: SessionEvent) {
        if !self.is_active() {
            return;
        }
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    fn session_duration_ms(&self) -> u64 {
        self.store
            .get_session_duration()
            .unwrap_or(self.config.default_session_duration_ms)
    }

    async fn tick(&self) -> MonitorState {
        if !self.is_active() {
            return MonitorState::Stopped;
        }

        let now = self.clock.now_ms();
        let issued_at = self.store.get_token_issued_at();
        let duration_ms = self.session_duration_ms();

        match token_clock::evaluate(
            now,
            issued_at,
            duration_ms,
            self.config.refresh_threshold_minutes,
        ) {
            TokenStatus::Expired if self.refresher.is_refreshing() => {
                // the outstanding refresh owns the record until it settles
                debug!("Guest session lapsed with a refresh in flight, deferring expiry");
                self.set_state(MonitorState::RefreshPending);
            }
            TokenStatus::Expired => {
                warn!("Guest session expired, clearing stored session");
                self.store.clear();
                self.set_state(MonitorState::Expired);
                self.publish(SessionEvent::Expired);
            }
            TokenStatus::Expiring => {
                if let Some(issued) = issued_at {
                    debug!(
                        "Guest session expires in {:.1} min, refreshing",
                        token_clock::time_until_expiry_minutes(now, issued, duration_ms)
                    );
                }
                self.set_state(MonitorState::RefreshPending);
                self.refresh().await;
            }
            TokenStatus::Valid => self.set_state(MonitorState::Idle),
        }

        self.state()
    }

    async fn refresh(&self) {
        match self.refresher.try_refresh().await {
            RefreshOutcome::Refreshed if self.is_active() => {
                self.set_state(MonitorState::Idle);
                self.publish(SessionEvent::Refreshed);
            }
            RefreshOutcome::Failed if self.is_active() => {
                self.publish(SessionEvent::RefreshFailed);
            }
            RefreshOutcome::AlreadyInFlight => {
                debug!("Refresh from an earlier tick still outstanding");
            }
            _ => {}
        }
    }
}
