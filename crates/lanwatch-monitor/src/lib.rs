//! lanwatch-monitor: LAN presence watchdog.
//!
//! Sweeps a network segment with nmap, classifies every known device as
//! present, new, absent or dead, persists the result to a JSON device
//! store, and raises notifications on watchlist transitions.

pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod nmap_text;
pub mod notify;
pub mod scanner;
pub mod scheduler;
pub mod store;
pub mod watchlist;
