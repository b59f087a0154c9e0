//! Core domain layer for linknet.
//!
//! Defines the record and aggregate data model, the error taxonomy, fuzzy
//! string similarity scoring, number formatting, and the CLI settings shared
//! by the rest of the workspace.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod similarity;
