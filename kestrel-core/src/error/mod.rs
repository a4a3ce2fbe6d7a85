//! Core error types for Kestrel

use thiserror::Error;

/// Main error type for Kestrel operations
#[derive(Error, Debug)]
pub enum KestrelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A column the stage cannot run without is absent from its input
    #[error("Missing required field '{field}' in {source_name}")]
    MissingRequiredField { field: String, source_name: String },

    /// An external program failed or produced unusable output
    #[error("{tool} failed: {message}")]
    ExternalTool { tool: String, message: String },

    /// Too many records were skipped as malformed for the stage to be trusted
    #[error(
        "{stage}: {skipped} of {total} records malformed ({:.1}%), limit is {:.1}%",
        percent(.skipped, .total),
        limit_percent(.limit)
    )]
    MalformedThreshold {
        stage: String,
        skipped: usize,
        total: usize,
        limit: f64,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parsing error: {0}")]
    Parse(String),

    /// One record could not be read; the reader can continue past it
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Other error: {0}")]
    Other(String),
}

/// Result type alias for Kestrel operations
pub type KestrelResult<T> = Result<T, KestrelError>;

fn percent(part: &usize, total: &usize) -> f64 {
    if *total == 0 {
        0.0
    } else {
        *part as f64 / *total as f64 * 100.0
    }
}

fn limit_percent(limit: &f64) -> f64 {
    limit * 100.0
}

impl KestrelError {
    pub fn missing_field(field: impl Into<String>, source_name: impl Into<String>) -> Self {
        KestrelError::MissingRequiredField {
            field: field.into(),
            source_name: source_name.into(),
        }
    }

    pub fn external_tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        KestrelError::ExternalTool {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

// Conversion implementations for common error types
impl From<serde_json::Error> for KestrelError {
    fn from(err: serde_json::Error) -> Self {
        KestrelError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for KestrelError {
    fn from(err: anyhow::Error) -> Self {
        KestrelError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_display() {
        let io_error = KestrelError::Io(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        assert!(format!("{}", io_error).contains("IO error"));

        let config_error = KestrelError::Configuration("missing field".to_string());
        assert_eq!(format!("{}", config_error), "Configuration error: missing field");

        let missing = KestrelError::missing_field("accession", "metadata.csv");
        assert_eq!(
            format!("{}", missing),
            "Missing required field 'accession' in metadata.csv"
        );

        let tool = KestrelError::external_tool("MAFFT", "exit status 1");
        assert_eq!(format!("{}", tool), "MAFFT failed: exit status 1");

        let parse_error = KestrelError::Parse("invalid syntax".to_string());
        assert_eq!(format!("{}", parse_error), "Parsing error: invalid syntax");
    }

    #[test]
    fn test_malformed_threshold_display() {
        let err = KestrelError::MalformedThreshold {
            stage: "filter".to_string(),
            skipped: 3,
            total: 10,
            limit: 0.05,
        };
        assert_eq!(
            err.to_string(),
            "filter: 3 of 10 records malformed (30.0%), limit is 5.0%"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let kestrel_err: KestrelError = io_err.into();

        match kestrel_err {
            KestrelError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::PermissionDenied),
            _ => panic!("Expected Io error variant"),
        }
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let parse_result: Result<serde_json::Value, serde_json::Error> =
            serde_json::from_str("{invalid json}");

        let kestrel_err: KestrelError = parse_result.unwrap_err().into();
        assert!(matches!(kestrel_err, KestrelError::Serialization(_)));
    }

    #[test]
    fn test_anyhow_error_conversion() {
        let kestrel_err: KestrelError = anyhow::anyhow!("custom error message").into();

        match kestrel_err {
            KestrelError::Other(msg) => assert_eq!(msg, "custom error message"),
            _ => panic!("Expected Other error variant"),
        }
    }
}
