pub mod auth_initializer;
pub mod session_status;

pub use auth_initializer::{AuthInitializer, SessionStatus};
pub use session_status::SessionStatusBanner;
