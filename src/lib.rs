//! This crate provides the aggregation core of a faculty salary dashboard. A dataset of salary
//! records is loaded once, and a set of linked charts is kept in step as filters change: a
//! selection on any chart filters every other chart.
//!
//! The core is a [crossfilter](crossfilter::Crossfilter). Records are sliced into named
//! dimensions, each with its own filter, and aggregated into groups by pluggable
//! [reducers](reducer::Reducer). When a filter changes only the records whose
//! acceptance changed are folded into, or retracted from, the affected groups. The
//! [filter coordinator](coordinator::FilterCoordinator) then redraws every chart.
//!
//! Charts are consumers that produce serialisable [snapshots](charts::ChartSnapshot) of what
//! they would draw. Rendering is left to the front end.
//!
//! The dashboard is built on top of a number of open source components.
//!
//! * [Serde](serde) and [csv] read the dataset and write snapshots as JSON.
//! * [Clap](clap) parses the command line.
//! * [Tracing](tracing) provides structured logging.
//! * [Validator](validator) checks records as they are loaded.

pub mod app;
pub mod charts;
pub mod cli;
pub mod coordinator;
pub mod crossfilter;
pub mod dashboard;
pub mod dimension;
pub mod error;
pub mod group;
pub mod loader;
pub mod models;
pub mod reducer;
pub mod reducers;
pub mod session;
pub mod store;
#[cfg(test)]
pub mod test_utils;
pub mod tracing;
pub mod types;
