//! Error types for the meter core
//!
//! Everything below the application shell reports failures through
//! [`MeterError`]; `main` and the terminal plumbing use `anyhow`.

use std::path::PathBuf;

use thiserror::Error;

/// Failures of ingestion, rendering and export
#[derive(Debug, Error)]
pub enum MeterError {
    /// A frame was requested before any measurement arrived
    #[error("no measurements received yet")]
    EmptyWindow,

    /// A sample did not advance the timeline
    #[error("sample at {timestamp}ns is not newer than the last stored sample at {latest}ns")]
    OutOfOrderSample { timestamp: u64, latest: u64 },

    /// The drawable area is too small for a region
    #[error("{region} region is too small to draw")]
    DegenerateGeometry { region: &'static str },

    /// Writing an exported frame failed
    #[error("failed to write frame to {}: {source}", .path.display())]
    ExportWriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
