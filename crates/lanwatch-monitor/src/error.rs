//! Error types for the lanwatch-monitor crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Nmap not found at path: {path}")]
    NmapNotFound { path: String },

    #[error("Nmap exited with code {code}: {stderr}")]
    NmapFailed { code: i32, stderr: String },

    #[error("Nmap produced no output")]
    EmptyScan,

    #[error("Scan output has no summary line")]
    MissingSummary,

    #[error("Device store error at {path}: {source}")]
    Store {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Device store is not valid JSON: {0}")]
    StoreFormat(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] lanwatch_core::CoreError),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
