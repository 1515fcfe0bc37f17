//! Error types for isd-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use thiserror::Error;

/// Result type alias for isd-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for isd-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Any failure reported by the object store (listing, upload, delete,
    /// metadata fetch, download)
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Metadata specification is not valid structured data nor a usable script
    #[error("Invalid metadata spec: {0}")]
    InvalidMetadataSpec(String),

    /// Metadata script exited non-zero or emitted unparsable output
    #[error("Metadata script failed: {0}")]
    MetadataScriptFailure(String),

    /// Malformed block size string
    #[error("Invalid block size: {0}")]
    InvalidBlockSize(String),

    /// Key filter regex failed to compile
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidPattern(_)
            | Error::InvalidMetadataSpec(_)
            | Error::InvalidUrl(_)
            | Error::Config(_) => 2, // UsageError
            Error::StoreUnavailable(_) => 3,      // StoreError
            Error::MetadataScriptFailure(_) => 4, // MetadataError
            _ => 1,                               // GeneralError
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(Error::Config("test".into()).exit_code(), 2);
        assert_eq!(Error::InvalidMetadataSpec("test".into()).exit_code(), 2);
        assert_eq!(Error::StoreUnavailable("test".into()).exit_code(), 3);
        assert_eq!(Error::MetadataScriptFailure("test".into()).exit_code(), 4);
        assert_eq!(Error::InvalidBlockSize("test".into()).exit_code(), 1);
        assert_eq!(Error::General("test".into()).exit_code(), 1);
    }

    #[test]
    fn test_error_display() {
        let err = Error::StoreUnavailable("connection reset".into());
        assert_eq!(err.to_string(), "Store unavailable: connection reset");

        let err = Error::InvalidBlockSize("5ZZ".into());
        assert_eq!(err.to_string(), "Invalid block size: 5ZZ");
    }

    #[test]
    fn test_regex_error_converts() {
        let err: Error = regex::Regex::new("(").unwrap_err().into();
        assert!(matches!(err, Error::InvalidPattern(_)));
        assert_eq!(err.exit_code(), 2);
    }
}
