//! # Shopcount Reports
//!
//! Time-bucketed aggregation and reporting for people-count data.
//!
//! Raw [`CountRecord`](shopcount_common::CountRecord)s are grouped into
//! hourly, daily, weekly or monthly [`Bucket`]s, summarized into
//! [`PeriodSummary`] values, compared across periods and rendered as JSON
//! or CSV through the [`formatter`] module. [`ReportService`] ties these
//! together on top of a [`CountRecordStore`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod bucketing;
pub mod comparison;
pub mod formatter;
pub mod reports;
pub mod request;
pub mod service;
pub mod store;
pub mod summary;

pub use bucketing::*;
pub use comparison::*;
pub use formatter::{render, RenderedReport, TabularReport};
pub use reports::*;
pub use service::*;
pub use store::*;
pub use summary::*;
