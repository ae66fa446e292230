//! Unified error handling for the cell-site geometry library.
//!
//! Errors split into two families: configuration errors, which abort a whole
//! batch call, and per-row data errors, which are logged and the row skipped.
//! Only the former normally reach a caller; the latter surface through the
//! row-level parsers so the table builder can decide to skip.

use std::fmt;

/// Unified error type for cell-site geometry operations.
#[derive(Debug, Clone, PartialEq)]
pub enum SiteGeometryError {
    /// A required column is absent from the input table
    MissingColumn { column: String },
    /// Two rows share the same cell name
    DuplicateCell { cell_name: String },
    /// A cell name was requested that is not in the table
    UnknownCell { cell_name: String },
    /// Latitude/longitude outside WGS84 ranges or not finite
    InvalidCoordinates {
        cell_name: String,
        latitude: f64,
        longitude: f64,
    },
    /// A field could not be parsed or is out of range
    InvalidField {
        cell_name: String,
        column: String,
        value: String,
    },
    /// Configuration error
    ConfigError { message: String },
    /// Import/export error
    Io { message: String },
    /// Generic internal error
    Internal { message: String },
}

impl SiteGeometryError {
    /// True for errors that abort a batch rather than skip a single row.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            SiteGeometryError::InvalidCoordinates { .. } | SiteGeometryError::InvalidField { .. }
        )
    }
}

impl fmt::Display for SiteGeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteGeometryError::MissingColumn { column } => {
                write!(f, "Required column '{}' is missing from the input table", column)
            }
            SiteGeometryError::DuplicateCell { cell_name } => {
                write!(f, "Cell '{}' appears more than once in the input table", cell_name)
            }
            SiteGeometryError::UnknownCell { cell_name } => {
                write!(f, "Cell '{}' is not in the table", cell_name)
            }
            SiteGeometryError::InvalidCoordinates {
                cell_name,
                latitude,
                longitude,
            } => {
                write!(
                    f,
                    "Cell '{}' has invalid coordinates ({}, {})",
                    cell_name, latitude, longitude
                )
            }
            SiteGeometryError::InvalidField {
                cell_name,
                column,
                value,
            } => {
                write!(
                    f,
                    "Cell '{}' has invalid value '{}' in column '{}'",
                    cell_name, value, column
                )
            }
            SiteGeometryError::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            SiteGeometryError::Io { message } => {
                write!(f, "I/O error: {}", message)
            }
            SiteGeometryError::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for SiteGeometryError {}

#[cfg(feature = "io")]
impl From<csv::Error> for SiteGeometryError {
    fn from(err: csv::Error) -> Self {
        SiteGeometryError::Io {
            message: err.to_string(),
        }
    }
}

#[cfg(feature = "io")]
impl From<std::io::Error> for SiteGeometryError {
    fn from(err: std::io::Error) -> Self {
        SiteGeometryError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type alias for cell-site geometry operations.
pub type Result<T> = std::result::Result<T, SiteGeometryError>;

/// Extension trait for converting Option to SiteGeometryError.
pub trait OptionExt<T> {
    /// Convert Option to Result with an unknown-cell error.
    fn ok_or_unknown_cell(self, cell_name: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_unknown_cell(self, cell_name: &str) -> Result<T> {
        self.ok_or_else(|| SiteGeometryError::UnknownCell {
            cell_name: cell_name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SiteGeometryError::MissingColumn {
            column: "azimuth".to_string(),
        };
        assert!(err.to_string().contains("azimuth"));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_fatality() {
        assert!(SiteGeometryError::DuplicateCell {
            cell_name: "A1".to_string()
        }
        .is_fatal());
        assert!(!SiteGeometryError::InvalidCoordinates {
            cell_name: "A1".to_string(),
            latitude: 91.0,
            longitude: 0.0,
        }
        .is_fatal());
    }

    #[test]
    fn test_option_ext() {
        let none: Option<i32> = None;
        let result = none.ok_or_unknown_cell("A1");
        assert!(matches!(
            result,
            Err(SiteGeometryError::UnknownCell { .. })
        ));
    }
}
