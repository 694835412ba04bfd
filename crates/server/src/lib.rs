//! HTTP facade for the spot rate aggregator
//!
//! Serves `/btc`, `/eth`, `/` and `/health` over the shared aggregator

pub mod conversions;
pub mod server;
pub mod service;
pub mod settings;

pub use server::{HttpServer, HttpServerBuilder, HttpServerConfig};
pub use service::RatesService;
pub use settings::load_config;
