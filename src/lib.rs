//! Remote `tail -f` for AEM as a Cloud Service logs.
//!
//! Polls the Cloud Manager log-download endpoint, incrementally decompresses
//! the growing gzip archive, and prints newly appended lines as they arrive.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
