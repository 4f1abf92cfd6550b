//! Core types and loader for the Our World in Data COVID-19 table.
//!
//! The loader turns a headered CSV (one row per location per date) into
//! [`observation::Observation`] values. Everything downstream works on
//! those rows; see the `covid-data` crate for the enrichment pipeline.

pub mod cache;
pub mod country_size;
pub mod error;
pub mod loader;
pub mod observation;

pub use error::{OwidError, Result};
