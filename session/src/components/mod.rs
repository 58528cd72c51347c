//! User Interface Components
//!
//! - **session**: guest session bootstrap and status display
//!
//! Page layout and content live in the host app; these components only wire
//! the session lifecycle into the Dioxus tree.

pub mod session;

pub use session::{AuthInitializer, SessionStatus, SessionStatusBanner};
