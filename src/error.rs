//! Error types shared across the catalog, forecast and scheduling layers.

use chrono::NaiveDate;
use thiserror::Error;

/// Malformed load catalog or forecast input.
///
/// Fatal for a scheduling run: no partial assignment is produced when
/// one of these is raised.
#[derive(Debug, Error)]
pub enum DataShapeError {
    /// A required field is absent from a record.
    #[error("{record}: missing required field `{field}`")]
    MissingField {
        /// Record identifier (device name or row number).
        record: String,
        /// Field name as it appears in the input.
        field: &'static str,
    },
    /// A field is present but holds an unusable value.
    #[error("{record}: invalid `{field}`: {message}")]
    InvalidValue {
        /// Record identifier (device name or row number).
        record: String,
        /// Field name as it appears in the input.
        field: &'static str,
        /// Constraint the value violates.
        message: String,
    },
    /// Two catalog records share a name.
    #[error("duplicate device name `{0}`")]
    DuplicateDevice(String),
    /// CSV decoding failed.
    #[error("csv input: {0}")]
    Csv(#[from] csv::Error),
    /// Input file could not be opened.
    #[error("cannot read `{path}`: {source}")]
    Io {
        /// Path that failed to open.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// A device whose window constraint cannot be satisfied.
///
/// Reported per device; the device is left out of the assignment and
/// every other device is still scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidConstraint {
    /// Required run is longer than the allowed window.
    #[error(
        "device `{device}`: duration of {duration_slots} slots exceeds its allowed window of {window_slots} slots"
    )]
    DurationExceedsWindow {
        /// Device name.
        device: String,
        /// Required contiguous run length.
        duration_slots: usize,
        /// Number of slots in the allowed window.
        window_slots: usize,
    },
    /// Window references slots beyond the end of the day.
    #[error("device `{device}`: window [{earliest}, {latest}] is outside slots 0..=47")]
    WindowOutOfRange {
        /// Device name.
        device: String,
        /// Earliest permissible slot (inclusive).
        earliest: usize,
        /// Latest permissible slot (inclusive).
        latest: usize,
    },
    /// Window starts after it ends.
    #[error("device `{device}`: window start {earliest} is after window end {latest}")]
    InvertedWindow {
        /// Device name.
        device: String,
        /// Earliest permissible slot (inclusive).
        earliest: usize,
        /// Latest permissible slot (inclusive).
        latest: usize,
    },
}

impl InvalidConstraint {
    /// Name of the offending device.
    pub fn device(&self) -> &str {
        match self {
            Self::DurationExceedsWindow { device, .. }
            | Self::WindowOutOfRange { device, .. }
            | Self::InvertedWindow { device, .. } => device,
        }
    }
}

/// Failure of a forecast provider.
#[derive(Debug, Error)]
pub enum ForecastError {
    /// The provider returned data that cannot be used.
    #[error(transparent)]
    DataShape(#[from] DataShapeError),
    /// The provider has nothing for the requested day.
    #[error("forecast provider `{provider}` has no data for {day}")]
    Unavailable {
        /// Provider name.
        provider: &'static str,
        /// Requested target day.
        day: NaiveDate,
    },
}
