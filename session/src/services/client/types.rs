use serde::{Deserialize, Serialize};

/// Identity payload sent to the auth endpoint when acquiring a guest session.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GuestIdentity {
    pub username: String,
}

impl GuestIdentity {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

/// A successful guest session acquisition.
///
/// The token itself travels in an HttpOnly cookie and never reaches script;
/// all the client learns is that the call succeeded and, optionally, how long
/// the new session is valid for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionGrant {
    /// Raw numeric duration hint from the response, if one was sent and
    /// parsed as a number. Still subject to the positive/finite check before
    /// it is stored.
    pub session_duration_ms: Option<f64>,
}

impl SessionGrant {
    pub fn with_duration_hint(ms: f64) -> Self {
        Self {
            session_duration_ms: Some(ms),
        }
    }

    /// The hint as a storable duration, if it is a positive finite number.
    pub fn valid_duration_ms(&self) -> Option<u64> {
        match self.session_duration_ms {
            Some(ms) if ms.is_finite() && ms > 0.0 => Some(ms.round().max(1.0) as u64),
            _ => None,
        }
    }
}

/// Everything the session store currently holds.
///
/// Two snapshots compare equal exactly when the store content is identical,
/// which is what callers use to check that a failed refresh wrote nothing.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub username: Option<String>,
    pub token_issued_at: Option<i64>,
    pub session_duration_ms: Option<u64>,
}

impl SessionSnapshot {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.token_issued_at.is_none() && self.session_duration_ms.is_none()
    }

    /// A session counts as established once both the identity and its
    /// freshness are known.
    pub fn is_established(&self) -> bool {
        self.username.is_some() && self.token_issued_at.is_some()
    }
}

/// Notifications published by the session monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// The session ran out (or was never recorded); storage has been cleared.
    Expired,
    /// A refresh succeeded and the stored issue time moved forward.
    Refreshed,
    /// A refresh was attempted and failed; it will be retried next tick.
    RefreshFailed,
}
