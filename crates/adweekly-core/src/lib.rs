//! Domain logic for the adweekly reporting pipeline.
//!
//! Everything in this crate is pure: raw advertising-API payloads go in,
//! canonical metrics, period summaries, insights, and a fully rendered
//! report document come out. All I/O (the insights API, the lead source,
//! the document store, alerting) lives in `adweekly-pipeline`.

pub mod aggregate;
pub mod config;
pub mod insight;
pub mod metrics;
pub mod record;
pub mod report;
