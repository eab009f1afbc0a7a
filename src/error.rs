//! Error types for chatmark rendering.

use thiserror::Error;

/// Errors that can occur while measuring, writing or building markup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("destination too small: need {required} bytes, have {available}")]
    Capacity { required: usize, available: usize },

    #[error("value out of range: {0}")]
    OutOfRange(String),

    #[error("format error: {0}")]
    Format(String),

    #[error("failed to allocate a buffer of {requested} bytes")]
    Allocation { requested: usize },

    #[error("declared {declared} bytes but only {written} were written")]
    Incomplete { declared: usize, written: usize },

    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, Error>;
