//! Storage module for report artifacts
//!
//! Provides a local file sink that persists retrieved reports.

mod file_sink;

pub use file_sink::FileSink;
