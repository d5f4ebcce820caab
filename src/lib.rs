//! A clinical interpretation and trend-analysis engine for antibiogram
//! laboratory records: EUCAST breakpoint evaluation, an ingestion pipeline
//! from raw spreadsheet/CSV rows to structured isolates and results,
//! resistance-mechanism detection, cumulative resistance reporting with
//! confidence intervals, and temporal trend analysis with forecasting.
//!
//! The modules below mirror the pipeline stages: `text`/`parse` normalize
//! raw cells, `alias_cache` resolves free text against a tenant's catalog,
//! `rules` evaluates EUCAST breakpoints, `mechanism_detector` flags
//! resistance mechanisms, `ingest` wires those into full rows, `reinterpret`
//! re-evaluates stored results against a new EUCAST version, `aggregate`
//! rolls isolates up into cumulative reports, and `trend` fits and forecasts
//! resistance trajectories over time.

pub mod aggregate;
pub mod alias_cache;
pub mod cli;
pub mod config;
pub mod entities;
pub mod error;
pub mod fixtures;
pub mod ingest;
pub mod mechanism_detector;
pub mod parse;
pub mod reinterpret;
pub mod rules;
pub mod store;
pub mod text;
pub mod trend;
