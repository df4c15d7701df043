use std::path::PathBuf;
use thiserror::Error;

/// All errors produced while loading and aggregating chat exports.
#[derive(Error, Debug)]
pub enum StatsError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A JSON document parsed but lacks a field the export format requires.
    #[error("Malformed export {path}: {reason}")]
    MalformedExport { path: PathBuf, reason: String },

    /// The export directory or file does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// The reference time zone is not a recognised IANA identifier.
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),
}

/// Convenience alias used throughout the stats crates.
pub type Result<T> = std::result::Result<T, StatsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = StatsError::FileRead {
            path: PathBuf::from("/some/message_1.json"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/some/message_1.json"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_malformed_export() {
        let err = StatsError::MalformedExport {
            path: PathBuf::from("inbox/bob/message_1.json"),
            reason: "missing participants".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed export inbox/bob/message_1.json: missing participants"
        );
    }

    #[test]
    fn test_error_display_data_path_not_found() {
        let err = StatsError::DataPathNotFound(PathBuf::from("/missing/inbox"));
        assert_eq!(err.to_string(), "Data path not found: /missing/inbox");
    }

    #[test]
    fn test_error_display_invalid_timezone() {
        let err = StatsError::InvalidTimezone("Mars/Olympus".to_string());
        assert_eq!(err.to_string(), "Invalid timezone: Mars/Olympus");
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: StatsError = json_err.into();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }
}
