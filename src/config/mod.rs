//! # Configuration Module
//!
//! Job configuration and validation for conversions driven by the CLI and tools.

pub mod config;

pub use config::ScaleConfig;
