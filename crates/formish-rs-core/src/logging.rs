//! Logging setup for applications embedding the form library.
//!
//! The library itself only emits [`tracing`] events; this module wires a
//! subscriber for hosts that do not already install one.

/// Installs a global tracing subscriber with the given filter directive
/// (e.g. `"info"`, `"formish_rs_forms=debug"`).
///
/// With `pretty` set, a human-readable format with file/line locations is
/// used; otherwise output is structured JSON. Installing over an existing
/// subscriber is a no-op.
pub fn init(filter: &str, pretty: bool) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));

    if pretty {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}
