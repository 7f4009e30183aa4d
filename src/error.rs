//! Error taxonomy for the fallible boundaries of the crate.
//!
//! Geometry, layout, viewport and hit-testing never fail: degenerate input
//! short-circuits to a defined safe result. Errors only surface where data or
//! options cross in from the host (config objects, attendance rows, mode
//! strings), and even there the engine recovers locally where it can.

use thiserror::Error;

/// Errors raised at the data/config boundary.
#[derive(Debug, Error)]
pub enum MosaicError {
    /// The host passed an options object that could not be deserialized.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Initial data acquisition failed (asset, network or parse error).
    #[error("data load failed: {0}")]
    Load(String),

    /// A single source record was missing a required field.
    #[error("malformed record at line {line}: missing {field}")]
    MalformedRecord { line: usize, field: &'static str },

    /// A display/color/orientation mode string was not recognised.
    #[error("unknown {kind} mode: {value}")]
    UnknownMode { kind: &'static str, value: String },
}

impl MosaicError {
    /// Shorthand for an unknown-mode error.
    pub fn unknown_mode(kind: &'static str, value: &str) -> Self {
        Self::UnknownMode {
            kind,
            value: value.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MosaicError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = MosaicError::MalformedRecord { line: 4, field: "event_date" };
        assert_eq!(err.to_string(), "malformed record at line 4: missing event_date");

        let err = MosaicError::unknown_mode("color", "rainbow");
        assert_eq!(err.to_string(), "unknown color mode: rainbow");
    }
}
