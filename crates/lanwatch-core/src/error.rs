//! Error types shared by lanwatch crates.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid MAC address: {0:?}")]
    InvalidMac(String),
}
