//! Logging system demonstration
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run --example logging_demo -p core-runtime
//!
//! # JSON format, records mirrored to the console sink
//! cargo run --example logging_demo -p core-runtime -- json sink
//!
//! # Compact format
//! cargo run --example logging_demo -p core-runtime -- compact
//! ```

use std::env;
use std::sync::Arc;

use bridge_traits::logging::{ConsoleLogger, LogLevel};
use core_async::time::{sleep, Duration};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_runtime::SessionConfig;
use tracing::{debug, info, instrument, span, trace, warn, Level};

#[core_async::main]
async fn main() {
    let args: Vec<String> = env::args().collect();

    let format = match args.get(1).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        Some("pretty") => LogFormat::Pretty,
        _ => LogFormat::default(),
    };

    let mut config = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Trace)
        .with_spans(true);
    if args.get(2).map(String::as_str) == Some("sink") {
        config = config.with_logger_sink(Arc::new(ConsoleLogger::default()));
    }

    if let Err(err) = init_logging(config) {
        eprintln!("failed to initialize logging: {err}");
        return;
    }

    info!(format = ?format, "logging initialized");

    match SessionConfig::from_env() {
        Ok(session) => info!(
            mode = ?session.mode,
            debug = session.debug,
            correct_at_pause = session.correct_at_pause,
            "session configuration"
        ),
        Err(err) => warn!(error = %err, "invalid session configuration in environment"),
    }

    demo_session_span().await;
    info!("demo complete");
}

async fn demo_session_span() {
    let span = span!(Level::INFO, "session", source = "loopback");
    let _enter = span.enter();

    debug!(duration = 600_000_000i64, "topology ready");
    dispatch("start").await;
    dispatch("pause").await;
    trace!(pending = "SetPaused", "awaiting confirmation");
}

#[instrument]
async fn dispatch(command: &str) {
    debug!("dispatching");
    sleep(Duration::from_millis(5)).await;
    info!("confirmed");
}
