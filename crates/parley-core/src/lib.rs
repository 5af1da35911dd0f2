//! Core domain types for the Parley chat backend.
//!
//! This crate holds the domain models (conversations, messages, stored files),
//! the unified `AppError` type with its HTTP metadata trait, and the
//! environment-driven configuration. It has no I/O of its own; repositories,
//! storage backends, and HTTP handlers live in sibling crates.

pub mod config;
pub mod error;
pub mod models;

pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
