use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TemplateError>;

/// A single block of a DCF file could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid DCF line ({line}): '{content}'")]
pub struct DcfError {
    /// 1-based line number within the block
    pub line: usize,
    pub content: String,
}

/// A parsed block is missing one or more required fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid project template description: missing or empty fields [{}]", .missing.join(","))]
pub struct ValidationError {
    /// Offending field names, in schema order
    pub missing: Vec<&'static str>,
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Dcf(#[from] DcfError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("package enumeration failed for {path}: {message}")]
    Enumeration { path: PathBuf, message: String },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl TemplateError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TemplateError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_lists_all_fields() {
        let error = ValidationError {
            missing: vec!["title", "description"],
        };
        assert_eq!(
            error.to_string(),
            "invalid project template description: missing or empty fields [title,description]"
        );
    }

    #[test]
    fn test_dcf_error_message() {
        let error = DcfError {
            line: 3,
            content: "garbage".to_string(),
        };
        assert_eq!(error.to_string(), "invalid DCF line (3): 'garbage'");
    }

    #[test]
    fn test_io_error_carries_path() {
        let error = TemplateError::io(
            "/missing/file.dcf",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        let message = error.to_string();
        assert!(message.contains("/missing/file.dcf"));
        assert!(message.contains("not found"));
    }
}
