//! lanwatch-core: Shared types for the lanwatch presence watchdog.
//!
//! This crate provides the vocabulary used across lanwatch components:
//! - MAC addresses with case-insensitive identity
//! - Device records and their tri-state presence status
//! - Discovered hosts produced by a single scan cycle
//! - Watchlist alert state and notification events

pub mod error;
pub mod events;
pub mod types;

pub use error::CoreError;
