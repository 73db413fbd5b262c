//! Readers for the tab-separated annotation tables.
//!
//! Each reader normalizes its source's coordinate convention to 0-based
//! half-open on the way in and isolates malformed rows (drop, count,
//! log) instead of failing the batch.

pub mod copy_number;
pub mod domains;
pub mod gene_table;
pub mod mutations;
