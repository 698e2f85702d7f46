use thiserror::Error;

pub type Result<T> = std::result::Result<T, TriageError>;

/// Failures that abort a run.
///
/// Recoverable conditions (missing config, corrupt state, derived-layer write
/// failures) never surface here; they degrade to defaults plus a warning.
#[derive(Error, Debug)]
pub enum TriageError {
    #[error("invalid timestamp in {field}: {value:?}")]
    InvalidTimestamp { field: String, value: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_timestamp_message_names_field() {
        let err = TriageError::InvalidTimestamp {
            field: "issue #4 createdAt".into(),
            value: "yesterday".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid timestamp in issue #4 createdAt: \"yesterday\""
        );
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: TriageError = io.into();
        assert!(matches!(err, TriageError::Io(_)));
    }
}
