//! Outbound request resilience.
//!
//! - **retry**: generic sequential retry with exponential backoff
//! - **interceptor**: reqwest wrapper that replays same-origin requests

pub mod interceptor;
pub mod retry;

pub use interceptor::{is_transient, FetchInterceptor, FetchRequest};
pub use retry::{retry_with_backoff, RetryPolicy};
