//! Guest session lifecycle for the travel booking front end.
//!
//! Acquires an anonymous guest session on first visit, keeps it fresh with a
//! polling monitor, and wraps same-origin requests with bounded retries.

pub mod components;
pub mod services;
pub mod utils;

pub use components::{AuthInitializer, SessionStatus, SessionStatusBanner};
pub use services::client::{SessionClient, SessionEvent};
