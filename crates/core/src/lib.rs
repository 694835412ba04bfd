//! Core types and utilities for the spot rate aggregator
//!
//! This crate provides shared types used across all components:
//! - Instrument and provider definitions
//! - Rate snapshots and the scaled wire price
//! - Wire-format price entries
//! - Configuration and error types

pub mod types;
pub mod quotes;
pub mod config;
pub mod errors;

pub use types::*;
pub use quotes::*;
pub use config::*;
pub use errors::*;
