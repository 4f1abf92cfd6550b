//! Enrichment pipeline for COVID-19 observations.
//!
//! This crate turns the raw daily table loaded by `covid-owid` into the
//! enriched table the dashboard charts read: trailing weekly case sums,
//! incidence per 100k, multi-window growth, population buckets, and the
//! latest-day snapshot with its incidence rank.
//!
//! Every operation is a pure function of its input rows.

pub mod enrich;
pub mod partition;
pub mod snapshot;
pub mod view;

pub use enrich::{enrich, EnrichedObservation};
pub use snapshot::{latest_snapshot, SnapshotRow};
