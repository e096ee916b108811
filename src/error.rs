//! Error types for the cross-validation pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while preparing or splitting a dataset.
///
/// Everything except [`CvError::Io`] is confined to the dataset being
/// processed; the batch driver logs those and moves on.
#[derive(Error, Debug)]
pub enum CvError {
    /// Invalid run parameters (ratio outside [0,1], zero kappa, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Alignment file that could not be parsed
    #[error("Malformed alignment {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    /// Source alignment that could not be opened or read
    #[error("Cannot read alignment {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Expanded encoding is not `kappa` columns per collapsed site
    #[error("Column mismatch: expanded alignment has {expanded} columns, expected {kappa} x {collapsed}")]
    ColumnMismatch {
        expanded: usize,
        kappa: usize,
        collapsed: usize,
    },

    /// Encodings disagree on sequence identifiers or their order
    #[error("Identifier mismatch at row {index}: '{collapsed}' vs '{expanded}'")]
    IdentifierMismatch {
        index: usize,
        collapsed: String,
        expanded: String,
    },

    /// Rows of one alignment with different lengths
    #[error("Ragged alignment: sequence '{id}' has {columns} columns, expected {expected}")]
    RaggedAlignment {
        id: String,
        columns: usize,
        expected: usize,
    },

    /// Identifier that cannot be written in relaxed PHYLIP
    #[error("Invalid sequence identifier '{id}': {reason}")]
    InvalidIdentifier { id: String, reason: String },

    /// Chart rendering failure
    #[error("Plot error: {0}")]
    Plot(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CvError {
    pub fn config(message: impl Into<String>) -> Self {
        CvError::Config(message.into())
    }

    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        CvError::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_identifier(id: impl Into<String>, reason: impl Into<String>) -> Self {
        CvError::InvalidIdentifier {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// True when the failure only invalidates the current dataset.
    pub fn is_dataset_local(&self) -> bool {
        !matches!(self, CvError::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, CvError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_dataset_local_classification() {
        assert!(CvError::config("bad ratio").is_dataset_local());
        assert!(CvError::malformed("a.phy", "short header").is_dataset_local());
        let missing = CvError::Unreadable {
            path: "bin_part_3.phy".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        assert!(missing.is_dataset_local());
        assert!(
            CvError::ColumnMismatch {
                expanded: 7,
                kappa: 2,
                collapsed: 4
            }
            .is_dataset_local()
        );
        assert!(
            CvError::RaggedAlignment {
                id: "b".into(),
                columns: 2,
                expected: 4
            }
            .is_dataset_local()
        );
        let io_err = CvError::from(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        assert!(!io_err.is_dataset_local());
    }

    #[test]
    fn test_error_messages_name_the_problem() {
        let err = CvError::ColumnMismatch {
            expanded: 7,
            kappa: 2,
            collapsed: 4,
        };
        assert_eq!(
            err.to_string(),
            "Column mismatch: expanded alignment has 7 columns, expected 2 x 4"
        );
        let err = CvError::malformed("data/x.phy", "header missing");
        assert_eq!(err.to_string(), "Malformed alignment data/x.phy: header missing");
    }
}
