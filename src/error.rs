/// Gridview error type
///
/// Errors only surface at the API boundary: decoding payloads, naming a
/// column that is not part of the schema, or asking for selection support
/// when the dataset declares no unique column. The filter, sort, paginate
/// and reconcile stages themselves never fail.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GridError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Column '{0}' not found")]
    UnknownColumn(String),

    #[error("No unique column is defined")]
    NoUniqueColumn,

    #[error("Invalid page size: {0}")]
    InvalidPageSize(String),

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),
}

pub type Result<T> = std::result::Result<T, GridError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            GridError::UnknownColumn("age".to_string()).to_string(),
            "Column 'age' not found"
        );
        assert_eq!(GridError::NoUniqueColumn.to_string(), "No unique column is defined");

        let err: GridError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(err.to_string().starts_with("JSON error:"));
    }
}
