//! Error types for archive packaging

use thiserror::Error;

/// Errors returned by [`pack`](crate::pack) and the encoders it drives.
///
/// Every failure is reported before any bytes leave the assembler, so a
/// caller never sees a truncated archive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PackError {
    /// Empty file list or an unusable entry name.
    #[error("invalid input: {0}")]
    Input(String),

    /// The entry name cannot be stored as-is in a ZIP header.
    #[error("cannot encode entry name: {0}")]
    Encoding(String),

    /// A fixed-width header field would overflow (ZIP64 is not produced).
    #[error("{field} of {value} exceeds the format limit of {limit}")]
    SizeOverflow {
        field: &'static str,
        value: u64,
        limit: u64,
    },
}

/// Result type alias for packaging operations
pub type Result<T> = std::result::Result<T, PackError>;

/// Narrow `value` into a 32-bit header field.
pub(crate) fn fit_u32(field: &'static str, value: u64) -> Result<u32> {
    u32::try_from(value).map_err(|_| PackError::SizeOverflow {
        field,
        value,
        limit: u32::MAX as u64,
    })
}

/// Narrow `value` into a 16-bit header field.
pub(crate) fn fit_u16(field: &'static str, value: u64) -> Result<u16> {
    u16::try_from(value).map_err(|_| PackError::SizeOverflow {
        field,
        value,
        limit: u16::MAX as u64,
    })
}
