//! Error types for ucd-io

use std::path::PathBuf;

use thiserror::Error;

use crate::format::UcdFormat;

pub type Result<T> = std::result::Result<T, UcdError>;

#[derive(Error, Debug)]
pub enum UcdError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A binary-only or text-only call made against the other format.
    #[error("{operation} is not available for {format} files")]
    FormatMismatch {
        operation: &'static str,
        format: UcdFormat,
    },

    /// A cursor call made out of the node-data-then-cell-data order.
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Invalid cell type: {0}")]
    InvalidCellType(String),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Buffer size mismatch for {what}: expected {expected}, got {found}")]
    BufferSize {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Packed {field} need {needed} bytes but the field holds {capacity}")]
    FieldOverflow {
        field: &'static str,
        needed: usize,
        capacity: usize,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl UcdError {
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        UcdError::Protocol(message.into())
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        UcdError::InvalidData(message.into())
    }
}

/// Checks that a caller-supplied buffer has exactly the length the file dictates.
pub(crate) fn check_len(what: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(UcdError::BufferSize {
            what,
            expected,
            found,
        });
    }
    Ok(())
}

/// Product of two counts taken from a file, failing instead of overflowing.
pub(crate) fn checked_count(what: &str, a: usize, b: usize) -> Result<usize> {
    a.checked_mul(b)
        .ok_or_else(|| UcdError::invalid(format!("{what} ({a} x {b}) overflows")))
}

/// Zero-filled buffer whose length comes from a file header.
pub(crate) fn alloc_buffer<T: Clone + Default>(what: &str, len: usize) -> Result<Vec<T>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| UcdError::invalid(format!("cannot allocate {len} {what}")))?;
    buffer.resize(len, T::default());
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_that_overflow_are_invalid_data() {
        assert_eq!(checked_count("cells", 8, 3).unwrap(), 24);
        assert!(matches!(
            checked_count("cells", usize::MAX, 8),
            Err(UcdError::InvalidData(_))
        ));
    }

    #[test]
    fn impossible_allocation_is_invalid_data() {
        let ok: Vec<i32> = alloc_buffer("ids", 3).unwrap();
        assert_eq!(ok, vec![0, 0, 0]);
        assert!(matches!(
            alloc_buffer::<f32>("values", usize::MAX / 2),
            Err(UcdError::InvalidData(_))
        ));
    }
}
