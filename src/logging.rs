//! Log setup for the command-line binary.
//!
//! Logs go to stderr so tables and CSV written to stdout stay clean.
//! `RUST_LOG` wins when set; otherwise `--verbose` selects `info` and the
//! default is `warn`.

use anyhow::{Result, anyhow};
use std::io;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose { "tindahero=info" } else { "tindahero=warn" }
}

pub fn init_logging(verbose: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}
