//! Error types.

use thiserror::Error;

/// Errors from packet encoding, the effect model and the transport.
#[derive(Error, Debug)]
pub enum Error {
    /// Read outside of the 64 byte packet frame.
    #[error("unable to read {requested} bytes at offset {offset}")]
    OutOfRange { offset: usize, requested: usize },

    /// Write past the end of the 64 byte packet frame.
    #[error("not enough remaining space ({remaining} bytes) to write {requested} bytes")]
    BufferOverflow { remaining: usize, requested: usize },

    /// Decoded constant differs from the expected protocol value.
    #[error("{field} mismatch - expected {expected}, got {actual}")]
    ValueMismatch { field: &'static str, expected: String, actual: String },

    /// Parameter index outside of its declared range.
    #[error("index {index} out of range {min}..={max}")]
    IndexOutOfRange { index: usize, min: usize, max: usize },

    /// Effect type is not accepted by the zone.
    #[error("effect {effect} is not supported by the {zone} zone")]
    IncompatibleEffect { zone: &'static str, effect: &'static str },

    /// Effect does not expose the requested setting.
    #[error("effect {effect} has no {capability} setting")]
    Unsupported { effect: &'static str, capability: &'static str },

    /// Malformed construction input.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Buffer handed to the codec is not exactly one packet long.
    #[error("expected a {expected} byte packet, got {actual} bytes")]
    InvalidLength { expected: usize, actual: usize },

    /// No reply within the configured timeout.
    #[error("communication timeout")]
    Timeout,

    /// Short transfer or unexpected device reply.
    #[error("I/O error: {0}")]
    Io(String),

    #[error("HID error: {0}")]
    Hid(#[from] hidapi::HidError),
}

/// Result alias using the crate error.
pub type Result<T> = std::result::Result<T, Error>;
