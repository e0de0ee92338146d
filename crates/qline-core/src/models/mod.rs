//! Data models: quote results and configuration.

pub mod config;
pub mod quote;
