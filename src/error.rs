//! Error taxonomy for the encoder core.
//!
//! Per-request failures (`OutOfRange`, `NoLetters`, `DivisionUndefined`) are
//! returned as values so callers can render a neutral "no result" state.
//! Per-row numeric problems are not errors at all: they are reported as
//! [`crate::entry::ParseSkip`] values and the row is excluded.

use std::fmt;
use std::io;

/// Errors produced by the encoder, library and persistence layers.
#[derive(Debug)]
pub enum EncoderError {
    /// L1 outside `0..=CODE_MAX`.
    OutOfRange { l1: i64 },
    /// The normalized input has no alphabet letters.
    NoLetters,
    /// W = L2C / L1 is undefined for L1 = 0.
    DivisionUndefined,
    /// Filesystem failure while reading or writing a collection.
    Io(io::Error),
    /// Malformed CSV, JSON or snapshot payload.
    Format(String),
    /// Mirroring failed after every retry.
    RemoteSync(String),
    /// A tunable is outside its domain (σ must be finite and positive).
    InvalidConfig(String),
}

impl fmt::Display for EncoderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncoderError::OutOfRange { l1 } => {
                write!(f, "L1 = {l1} is out of range (0..=999999)")
            }
            EncoderError::NoLetters => write!(f, "no alphabet letters in input; enter a word"),
            EncoderError::DivisionUndefined => write!(f, "W is undefined for L1 = 0"),
            EncoderError::Io(err) => write!(f, "i/o error: {err}"),
            EncoderError::Format(msg) => write!(f, "format error: {msg}"),
            EncoderError::RemoteSync(msg) => write!(f, "remote sync failed: {msg}"),
            EncoderError::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for EncoderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EncoderError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for EncoderError {
    fn from(err: io::Error) -> Self {
        EncoderError::Io(err)
    }
}

impl From<serde_json::Error> for EncoderError {
    fn from(err: serde_json::Error) -> Self {
        EncoderError::Format(err.to_string())
    }
}

impl From<csv::Error> for EncoderError {
    fn from(err: csv::Error) -> Self {
        EncoderError::Format(err.to_string())
    }
}

impl From<bincode::Error> for EncoderError {
    fn from(err: bincode::Error) -> Self {
        EncoderError::Format(err.to_string())
    }
}

impl EncoderError {
    /// Plain-language status line for end users.
    pub fn user_message(&self) -> &'static str {
        match self {
            EncoderError::OutOfRange { .. } => "No result: code is out of range.",
            EncoderError::NoLetters | EncoderError::DivisionUndefined => {
                "Enter a word to calculate."
            }
            EncoderError::Io(_) | EncoderError::Format(_) => "Could not read or write the library.",
            EncoderError::RemoteSync(_) => "Saved locally; remote mirror is unavailable.",
            EncoderError::InvalidConfig(_) => "Configuration is invalid; check sigma_Z.",
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, EncoderError>;
