use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Errors raised by the message source adapter.
///
/// All variants are treated as transient: a failed poll is retried with
/// backoff and never aborts the other channels.
#[derive(Error, Debug, Clone)]
pub enum SourceError {
    #[error("connection failure: {0}")]
    Connection(String),

    #[error("channel {channel} is not accessible: {reason}")]
    ChannelUnavailable { channel: String, reason: String },

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
}

/// Symbol mapping violations.
///
/// Unlike parse misses (which become a record status), mapping violations
/// carry the offending symbol so callers can report exactly what was blocked.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("symbol {symbol} is excluded by configuration")]
    Excluded { symbol: String },

    #[error("symbol {symbol} is not in the configured allow-list")]
    NotAllowed { symbol: String },
}

/// Failures while delivering a signal line to the output file.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("writer lock not acquired within {timeout_secs}s, write abandoned")]
    LockTimeout { timeout_secs: u64 },

    #[error("output file I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
