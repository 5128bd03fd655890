//! Error types for the prodoc library.
//!
//! Failures fall into three bands (see the error-handling policy in
//! DESIGN.md): configuration-fatal errors surface as `Err` and abort the
//! run, per-entity failures are converted to warnings on the build session,
//! and tokenizer edge cases are resolved silently as best-effort text.

use std::io;

use thiserror::Error;

/// Main result type for prodoc operations.
pub type Result<T> = std::result::Result<T, ProdocError>;

/// Error type for all prodoc operations.
#[derive(Error, Debug)]
pub enum ProdocError {
    /// I/O related errors (reading sources, writing output)
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable error message
        message: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error description
        message: String,
        /// Configuration field that caused the error
        field: Option<String>,
    },

    /// Parsing errors that cannot be downgraded to a warning
    #[error("Parse error: {message}")]
    Parse {
        /// Error description
        message: String,
        /// File path where the error occurred
        file_path: Option<String>,
        /// Line number (if available)
        line: Option<usize>,
    },

    /// An unknown dialect, markup, or output style was requested
    #[error("Unknown {kind} '{name}'")]
    UnknownStyle {
        /// What was looked up ("dialect", "markup", "output style")
        kind: &'static str,
        /// The requested name
        name: String,
    },

    /// Template rendering errors
    #[error("Template error: {message}")]
    Template {
        /// Error description
        message: String,
        /// Underlying template engine error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error description
        message: String,
        /// Underlying serialization error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal {
        /// Error description
        message: String,
    },
}

impl ProdocError {
    /// Create a new I/O error with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new configuration error with field context
    pub fn config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            file_path: None,
            line: None,
        }
    }

    /// Create a new parse error with file context
    pub fn parse_in_file(
        message: impl Into<String>,
        file_path: impl Into<String>,
        line: Option<usize>,
    ) -> Self {
        Self::Parse {
            message: message.into(),
            file_path: Some(file_path.into()),
            line,
        }
    }

    /// Create a new unknown-style error
    pub fn unknown_style(kind: &'static str, name: impl Into<String>) -> Self {
        Self::UnknownStyle {
            kind,
            name: name.into(),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<io::Error> for ProdocError {
    fn from(err: io::Error) -> Self {
        Self::io("I/O operation failed", err)
    }
}

impl From<serde_json::Error> for ProdocError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: format!("JSON serialization failed: {err}"),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_yaml::Error> for ProdocError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: format!("YAML serialization failed: {err}"),
            source: Some(Box::new(err)),
        }
    }
}

impl From<handlebars::TemplateError> for ProdocError {
    fn from(err: handlebars::TemplateError) -> Self {
        Self::Template {
            message: format!("Template registration failed: {err}"),
            source: Some(Box::new(err)),
        }
    }
}

impl From<handlebars::RenderError> for ProdocError {
    fn from(err: handlebars::RenderError) -> Self {
        Self::Template {
            message: format!("Template rendering failed: {err}"),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = ProdocError::config("Invalid configuration");
        assert!(matches!(err, ProdocError::Config { .. }));

        let err = ProdocError::parse("unterminated block");
        assert!(matches!(err, ProdocError::Parse { .. }));
    }

    #[test]
    fn test_config_field_error() {
        let err = ProdocError::config_field("Invalid value", "doc_format");

        if let ProdocError::Config { message, field } = err {
            assert_eq!(message, "Invalid value");
            assert_eq!(field, Some("doc_format".to_string()));
        } else {
            panic!("Expected Config error");
        }
    }

    #[test]
    fn test_parse_in_file() {
        let err = ProdocError::parse_in_file("bad declaration", "mgunits.pro", Some(42));

        if let ProdocError::Parse {
            message,
            file_path,
            line,
        } = err
        {
            assert_eq!(message, "bad declaration");
            assert_eq!(file_path, Some("mgunits.pro".to_string()));
            assert_eq!(line, Some(42));
        } else {
            panic!("Expected Parse error");
        }
    }

    #[test]
    fn test_unknown_style_display() {
        let err = ProdocError::unknown_style("dialect", "texinfo");
        assert_eq!(format!("{err}"), "Unknown dialect 'texinfo'");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let err: ProdocError = io_err.into();
        assert!(matches!(err, ProdocError::Io { .. }));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<i32>("not json").unwrap_err();
        let err: ProdocError = json_err.into();
        assert!(matches!(err, ProdocError::Serialization { .. }));
    }
}
