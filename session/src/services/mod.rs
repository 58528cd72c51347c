//! Infrastructure Services
//!
//! - **client**: guest session storage, refresh, and the session monitor
//! - **fetch**: retrying wrapper for outbound same-origin requests
//! - **config**: configuration defaults and global settings
//!
//! Like the rest of the crate these are WASM-first: async traits are declared
//! without `Send` bounds and tasks are spawned on the local executor.

pub mod client;
pub mod config;
pub mod fetch;
