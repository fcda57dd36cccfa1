//! `tracing` subscriber setup. `RUST_LOG` overrides the default directive.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, EnvFilter};

/// How log events are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

fn filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Installs a human-readable subscriber. Returns `false` if one was already installed.
pub fn init(default_directive: &str) -> bool {
    init_with(LogFormat::Pretty, default_directive)
}

pub fn init_with(format: LogFormat, default_directive: &str) -> bool {
    let builder = fmt().with_env_filter(filter(default_directive));
    match format {
        LogFormat::Pretty => builder.with_target(false).try_init().is_ok(),
        LogFormat::Json => builder.json().with_current_span(false).try_init().is_ok(),
    }
}
