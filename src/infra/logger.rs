// src/infra/logger.rs — Structured logging with tracing
//
// Filter resolution: AFTERSALES_LOG, then RUST_LOG, then the given default.

use tracing_subscriber::{fmt, EnvFilter};

pub fn init_logging(default_level: &str) {
    let filter = std::env::var("AFTERSALES_LOG")
        .ok()
        .map(EnvFilter::new)
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
