//! Offline time-series utilities.
//!
//! Modules include:
//! - `join`: correlate two independently captured series on canonical
//!   time keys and compute the derived efficiency metric.

/// Keyed join of two captured series with unmatched-key reporting.
pub mod join;
