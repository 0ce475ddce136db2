//! Scrapyard — TF2 item-banking arbitrage bot
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod aliases;
pub mod catalog;
pub mod config;
pub mod currency;
pub mod platforms;
pub mod strategy;
pub mod types;
