//! Shared types, errors, and configuration for Coffer.
//!
//! This crate provides common types used across all other crates:
//! - Numeric typed identifiers for accounts, records and scheduled transfers
//! - Money helpers over `rust_decimal::Decimal`
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
