//! PRICEWATCH: product page price monitor.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod scrape;
pub mod journal;
pub mod notify;
pub mod monitor;
