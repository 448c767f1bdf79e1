//! # Shopcount Server
//!
//! HTTP front end for the people-counting backend.
//!
//! Cameras push count records through the batch ingest endpoint; reports
//! are served as JSON documents or CSV downloads. Records live in a SQLite
//! database accessed through [`SqliteCountStore`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod error;
pub mod persistence;

pub use api::*;
pub use error::*;
pub use persistence::*;
