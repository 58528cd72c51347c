use std::cell::RefCell;
use std::rc::Rc;

use dioxus::prelude::*;
use tokio::sync::broadcast::error::RecvError;

use crate::services::client::{MonitorHandle, SessionClient, SessionEvent};
use crate::services::config::get_global_config;
use crate::{console_debug, console_error, console_info, console_warn};

/// Guest session state as shown to the rest of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Initializing,
    Active,
    /// Last refresh failed; the current session is still used until it lapses.
    Degraded,
    Expired,
}

impl SessionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SessionStatus::Initializing => "Connecting…",
            SessionStatus::Active => "Connected",
            SessionStatus::Degraded => "Reconnecting…",
            SessionStatus::Expired => "Session expired",
        }
    }
}

/// Establishes the guest session and keeps it alive while mounted.
///
/// Provides a `Signal<SessionStatus>` context to its children. The monitor is
/// stopped when the component unmounts.
#[component]
pub fn AuthInitializer(children: Element) -> Element {
    let status = use_context_provider(|| Signal::new(SessionStatus::Initializing));
    let client = use_hook(|| SessionClient::new(get_global_config()));
    let monitor = use_hook(|| Rc::new(RefCell::new(None::<MonitorHandle>)));

    use_hook({
        let client = client.clone();
        let monitor = monitor.clone();
        move || {
            spawn(async move {
                let mut status = status;

                match client.ensure_session().await {
                    Ok(true) => console_info!("Guest session created"),
                    Ok(false) => console_debug!("Reusing guest session from this tab"),
                    Err(e) => console_warn!("Guest login failed, monitor will retry: {}", e),
                }
                if client.snapshot().is_established() {
                    status.set(SessionStatus::Active);
                }

                let handle = client.start_monitor();
                let mut events = handle.subscribe();
                monitor.borrow_mut().replace(handle);

                loop {
                    match events.recv().await {
                        Ok(SessionEvent::Expired) => {
                            status.set(SessionStatus::Expired);
                            match client.ensure_session().await {
                                Ok(_) => status.set(SessionStatus::Active),
                                Err(e) => console_error!("Guest re-login failed: {}", e),
                            }
                        }
                        Ok(SessionEvent::Refreshed) => status.set(SessionStatus::Active),
                        Ok(SessionEvent::RefreshFailed) => status.set(SessionStatus::Degraded),
                        Err(RecvError::Lagged(skipped)) => {
                            console_debug!("Skipped {} session events", skipped)
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            });
        }
    });

    use_drop(move || {
        if let Some(handle) = monitor.borrow_mut().take() {
            handle.stop();
        }
    });

    rsx! {
        {children}
    }
}
