//! Subscriber setup for the relie binary and benchmarks
//!
//! The library itself only emits `tracing` events: cache population at DEBUG, batch
//! summaries at TRACE and non-finite batch results at WARN. Nothing is printed until one of
//! these functions installs a subscriber. `RUST_LOG` always overrides the default level.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Install the standard subscriber at INFO level
///
/// # Example
/// ```no_run
/// use relie::init_logger;
///
/// init_logger();
/// tracing::info!("converting rotations");
/// ```
///
/// # Environment Variables
/// ```bash
/// RUST_LOG=relie=debug cargo run --bin so3_convert -- 0.1 0.2 0.3
/// RUST_LOG=relie::lie=trace cargo bench --bench so3_benchmark
/// ```
pub fn init_logger() {
    init_logger_with_level(Level::INFO)
}

/// Install the standard subscriber with a custom default level
///
/// Timestamps and module targets are shown from DEBUG down, where events come from the
/// library internals rather than the binary. Calling this more than once keeps the first
/// subscriber.
pub fn init_logger_with_level(default_level: Level) {
    let detailed = default_level >= Level::DEBUG;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_target(detailed)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false);

    let _ = if detailed {
        builder.try_init()
    } else {
        builder.without_time().try_init()
    };
}

/// Logger for the command line: DEBUG when `verbose`, INFO otherwise
pub fn init_cli_logger(verbose: bool) {
    init_logger_with_level(if verbose { Level::DEBUG } else { Level::INFO })
}

fn env_filter(default_level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy()
}
