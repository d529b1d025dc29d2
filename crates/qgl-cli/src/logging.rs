use crate::error::{CliError, Result};
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

/// Install the stderr subscriber; `RUST_LOG` wins over `-v` unless quiet
pub fn setup_logging(verbosity: u8, quiet: bool) -> Result<()> {
    let level_filter = if quiet {
        LevelFilter::OFF
    } else {
        match verbosity {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };

    let filter = if quiet {
        EnvFilter::default().add_directive(level_filter.into())
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::default().add_directive(level_filter.into()))
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))
}
