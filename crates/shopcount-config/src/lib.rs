//! # Shopcount Config
//!
//! Type-safe configuration management for shopcount.
//!
//! This crate provides configuration loading from YAML or TOML files,
//! environment variable overrides, validation, and a lock-free cache
//! shared by request handlers.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod defaults;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cache::*;
pub use loader::*;
pub use schema::*;
