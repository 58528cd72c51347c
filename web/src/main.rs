use dioxus::prelude::*;
use session::services::config::load_global_config;
use session::{AuthInitializer, SessionStatusBanner};

fn main() {
    // JSON overrides baked in at build time, e.g. a staging auth endpoint
    if let Some(overrides) = option_env!("GUEST_SESSION_CONFIG") {
        load_global_config(overrides);
    }
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    rsx! {
        // Title, meta tags and styling are served by the host page
        AuthInitializer {
            Router::<Route> {}
        }
    }
}

#[derive(Clone, Routable, Debug, PartialEq)]
enum Route {
    #[route("/")]
    Home {},
}

#[component]
fn Home() -> Element {
    rsx! {
        div {
            SessionStatusBanner {}
        }
    }
}
