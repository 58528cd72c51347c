//! Test doubles for the session client.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Notify;

use super::auth_gateway::AuthGateway;
use super::errors::ClientResult;
use super::types::{GuestIdentity, SessionGrant};

/// Gateway that replays queued results and records who asked.
///
/// An empty queue answers with a plain success. A gated gateway holds every
/// call until `release()` is invoked once per call.
#[derive(Default)]
pub struct ScriptedGateway {
    responses: Mutex<VecDeque<ClientResult<SessionGrant>>>,
    identities: Mutex<Vec<GuestIdentity>>,
    calls: AtomicUsize,
    gate: Option<Notify>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Notify::new()),
            ..Self::default()
        }
    }

    pub fn push(&self, response: ClientResult<SessionGrant>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn identities(&self) -> Vec<GuestIdentity> {
        self.identities.lock().unwrap().clone()
    }
}

#[async_trait(?Send)]
impl AuthGateway for ScriptedGateway {
    async fn acquire_guest_session(&self, identity: &GuestIdentity) -> ClientResult<SessionGrant> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.identities.lock().unwrap().push(identity.clone());

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(SessionGrant::default()))
    }
}
