//! Modules layer - Infrastructure components for external integrations
//!
//! Contains sinks that persist what the reporting service returns.

pub mod storage;
