//! Timer and task helpers that work on both the browser and native targets.
//!
//! The browser build drives futures with `wasm-bindgen-futures` and sleeps
//! with `gloo-timers`; native builds (tests, tooling) use a tokio
//! current-thread runtime and must run inside a `tokio::task::LocalSet`.

use std::future::Future;
use std::time::Duration;

/// Suspend the current task for `duration`.
pub async fn sleep(duration: Duration) {
    #[cfg(target_arch = "wasm32")]
    gloo_timers::future::sleep(duration).await;

    #[cfg(not(target_arch = "wasm32"))]
    tokio::time::sleep(duration).await;
}

/// Spawn a `!Send` future on the current thread's executor.
pub fn spawn_local<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    #[cfg(target_arch = "wasm32")]
    wasm_bindgen_futures::spawn_local(future);

    #[cfg(not(target_arch = "wasm32"))]
    {
        tokio::task::spawn_local(future);
    }
}
