//! Fetches `host`-tagged measurements from an InfluxDB v2 bucket.
//!
//! The store is queried with Flux over the HTTP API and answers with
//! annotated CSV, which [`SampleReader`] decodes into [`common::types::Sample`]s.

pub mod annotated;
pub mod client;
pub mod error;
pub mod query;

pub use annotated::SampleReader;
pub use client::InfluxClient;
pub use error::InfluxError;
pub use query::{AggregateFn, FluxQuery};

pub type Result<T> = std::result::Result<T, InfluxError>;
