//! Utility Functions and Cross-Cutting Concerns
//!
//! - **console_macros**: browser console logging macros
//! - **clock**: wall-clock sources (real and manual)
//! - **platform**: page origin and URL helpers
//! - **timer**: sleep/spawn helpers that work in the browser and natively

pub mod clock;
pub mod console_macros;
pub mod platform;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use platform::*;
