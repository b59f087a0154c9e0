//! Data pipeline layer for linknet.
//!
//! Responsible for reading the uploaded connections archive, normalizing the
//! raw table, consolidating fuzzy job-title variants, computing aggregate and
//! time-bucketed statistics, and running the top-level analysis pipeline.

pub mod aggregator;
pub mod analysis;
pub mod consolidator;
pub mod normalizer;
pub mod reader;
pub mod summary;

pub use linknet_core as core;
