//! Error types
//!
//! Volume loading errors are surfaced to the user; curve errors never leave
//! the transfer-function module because they are repaired on the spot.

use std::io;
use std::fmt;

/// A volume file whose size does not match the expected dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatError {
    /// Byte length required by the configured dimensions (`2 * w * h * d`)
    pub expected_bytes: usize,
    /// Byte length actually received
    pub actual_bytes: usize,
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Volume format error: expected {} bytes of 16-bit samples, got {}",
            self.expected_bytes, self.actual_bytes
        )
    }
}

impl std::error::Error for FormatError {}

/// Error type for volume loading
#[derive(Debug)]
pub enum VolumeError {
    /// IO error (file not found, permission denied, etc.)
    Io(io::Error),
    /// Sample data does not match the expected dimensions
    Format(FormatError),
}

impl fmt::Display for VolumeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolumeError::Io(err) => write!(f, "Volume IO error: {}", err),
            VolumeError::Format(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for VolumeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VolumeError::Io(err) => Some(err),
            VolumeError::Format(err) => Some(err),
        }
    }
}

impl From<io::Error> for VolumeError {
    fn from(err: io::Error) -> Self {
        VolumeError::Io(err)
    }
}

impl From<FormatError> for VolumeError {
    fn from(err: FormatError) -> Self {
        VolumeError::Format(err)
    }
}

/// Degenerate transfer-function curve state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurveError {
    /// Two stops share a position, or a stop lies outside [0, 1]
    InvalidCurveState {
        /// Index of the offending stop in the expanded curve
        index: usize,
        /// Its position
        position: f32,
    },
}

impl fmt::Display for CurveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurveError::InvalidCurveState { index, position } => write!(
                f,
                "Invalid curve state: stop {} at position {} breaks ordering",
                index, position
            ),
        }
    }
}

impl std::error::Error for CurveError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_format_error_display() {
        let err = FormatError { expected_bytes: 128, actual_bytes: 127 };
        let msg = format!("{}", err);
        assert!(msg.contains("128"));
        assert!(msg.contains("127"));
    }

    #[test]
    fn test_io_error_source() {
        let err: VolumeError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        assert!(format!("{}", err).contains("missing"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_from_format_error() {
        let err: VolumeError = FormatError { expected_bytes: 2, actual_bytes: 0 }.into();
        match err {
            VolumeError::Format(e) => assert_eq!(e.actual_bytes, 0),
            _ => panic!("Expected Format variant"),
        }
    }

    #[test]
    fn test_curve_error_display() {
        let err = CurveError::InvalidCurveState { index: 3, position: 0.5 };
        assert!(format!("{}", err).contains("stop 3"));
    }
}
