/// Browser console logging macros.
///
/// Each macro wraps the matching `gloo_console` function and prefixes the
/// message with the page clock (`js_sys::Date::now()`) and a `guest-session`
/// tag so session lifecycle lines are easy to filter in devtools.
///
/// Only call these from code paths that run inside a browser; on native
/// targets the underlying JS bindings are unavailable.
#[doc(hidden)]
#[macro_export]
macro_rules! __console_at {
    ($level:ident, $fmt:expr) => {
        gloo_console::$level!(format!("[{}] [guest-session] {}", js_sys::Date::now(), $fmt))
    };
    ($level:ident, $fmt:expr, $($arg:tt)*) => {
        gloo_console::$level!(format!(
            "[{}] [guest-session] {}",
            js_sys::Date::now(),
            format!($fmt, $($arg)*)
        ))
    };
}

#[macro_export]
macro_rules! console_info {
    ($($t:tt)*) => { $crate::__console_at!(info, $($t)*) };
}

#[macro_export]
macro_rules! console_warn {
    ($($t:tt)*) => { $crate::__console_at!(warn, $($t)*) };
}

#[macro_export]
macro_rules! console_error {
    ($($t:tt)*) => { $crate::__console_at!(error, $($t)*) };
}

#[macro_export]
macro_rules! console_debug {
    ($($t:tt)*) => { $crate::__console_at!(debug, $($t)*) };
}
