use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber. `RUST_LOG` takes precedence
/// over `default_filter`. Logs go to stderr so they never interleave
/// with chat output on stdout.
pub fn init_tracing(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    // `try_init` so a second call (e.g. from tests) is a no-op
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Default filter for the API server. axum logs rejections from
/// built-in extractors with the `axum::rejection` target, at `TRACE`
/// level.
pub fn server_filter() -> String {
    format!(
        "{}=debug,tower_http=debug,axum::rejection=trace",
        env!("CARGO_CRATE_NAME")
    )
}

pub fn repl_filter() -> String {
    format!("{}=warn", env!("CARGO_CRATE_NAME"))
}
