//! Tracing setup.
//!
//! `RUST_LOG` takes precedence over the default level passed to [`init`].

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::FetchError;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing_subscriber::util::TryInitError),

    #[error("failed to parse env filter: {0}")]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),
}

pub fn init(default_level: Level) -> Result<(), LoggingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_level.as_str().to_lowercase())?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .try_init()?;
    Ok(())
}

/// Which lookup of a group fetch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Events,
    GroupInfo,
}

impl Lookup {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lookup::Events => "events",
            Lookup::GroupInfo => "group_info",
        }
    }
}

/// Single reporting hook for absorbed lookup failures. Event failures are
/// errors; a missing group profile only degrades the card header.
pub fn report_failure(source: &str, group_id: &str, lookup: Lookup, err: &FetchError) {
    match lookup {
        Lookup::Events => tracing::error!(
            source,
            group = group_id,
            lookup = lookup.as_str(),
            "{err}"
        ),
        Lookup::GroupInfo => tracing::warn!(
            source,
            group = group_id,
            lookup = lookup.as_str(),
            "{err}"
        ),
    }
}
