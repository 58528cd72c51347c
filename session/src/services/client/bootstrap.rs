//! First-visit guest login.

use tracing::{info, instrument};

use super::auth_gateway::AuthGateway;
use super::errors::ClientResult;
use super::session::SessionStore;
use super::session_refresh::apply_grant;
use super::types::GuestIdentity;
use crate::utils::Clock;

/// Make sure the tab holds a guest session, logging in if it does not.
///
/// Returns `true` when a new session was acquired and `false` when an
/// established one was already present. A failed login leaves storage as it
/// was.
#[instrument(skip_all, fields(username = %guest_username))]
pub async fn ensure_session(
    store: &dyn SessionStore,
    gateway: &dyn AuthGateway,
    clock: &dyn Clock,
    guest_username: &str,
) -> ClientResult<bool> {
    if store.snapshot().is_established() {
        return Ok(false);
    }

    let identity = GuestIdentity::new(
        store
            .get_username()
            .unwrap_or_else(|| guest_username.to_string()),
    );
    let requested_at = clock.now_ms();
    let grant = gateway.acquire_guest_session(&identity).await?;

    apply_grant(store, requested_at, &grant, Some(&identity.username));
    info!("Guest session established for {}", identity.username);
    Ok(true)
}
