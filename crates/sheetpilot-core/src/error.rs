use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Addressing errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed A1 cell address
    #[error("invalid cell address: {0}")]
    InvalidAddress(String),

    /// Malformed A1 range
    #[error("invalid cell range: {0}")]
    InvalidRange(String),

    /// Row index past the sheet limit
    #[error("row {0} out of bounds (max {1})")]
    RowOutOfBounds(u32, u32),

    /// Column index past the sheet limit
    #[error("column {0} out of bounds (max {1})")]
    ColumnOutOfBounds(u32, u32),
}
