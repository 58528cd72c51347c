//! Browser environment helpers.

use web_sys::window;

/// Origin of the current page (`https://host:port`), used to build
/// same-origin URLs for `reqwest`, which needs absolute URLs even in the
/// browser. `None` outside a browser.
pub fn page_origin() -> Option<String> {
    if cfg!(not(target_arch = "wasm32")) {
        return None;
    }

    window().and_then(|w| w.location().origin().ok())
}

/// Join a base URL and a path without doubling or dropping the slash.
pub fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }

    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_normalizes_slashes() {
        assert_eq!(join_url("https://a.test/", "/api/x"), "https://a.test/api/x");
        assert_eq!(join_url("https://a.test", "api/x"), "https://a.test/api/x");
        assert_eq!(
            join_url("https://a.test", "https://b.test/y"),
            "https://b.test/y"
        );
    }

    #[test]
    fn no_origin_outside_browser() {
        assert_eq!(page_origin(), None);
    }
}
