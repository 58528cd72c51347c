use dioxus::prelude::*;

use super::SessionStatus;

/// One-line guest session indicator. Must be rendered inside `AuthInitializer`.
#[component]
pub fn SessionStatusBanner() -> Element {
    let status = use_context::<Signal<SessionStatus>>();
    let current = status();
    let label = current.label();
    let class = match current {
        SessionStatus::Active => "session-status session-status--ok",
        SessionStatus::Initializing => "session-status",
        SessionStatus::Degraded | SessionStatus::Expired => "session-status session-status--warn",
    };

    rsx! {
        div {
            class: "{class}",
            "{label}"
        }
    }
}
