use thiserror::Error;

/// Main error type for the team dashboard.
/// Aggregates errors from the standard library, dependencies and internal modules.
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    #[error("{0}")]
    ParseFloatError(#[from] std::num::ParseFloatError),

    #[error("{0}")]
    StringEncodingError(#[from] std::str::Utf8Error),

    // Third-party library errors
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    #[error("{0}")]
    RegexError(#[from] regex::Error),

    #[error("{0}")]
    TomlError(#[from] toml::de::Error),

    // Helper module errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    // Spreadsheet module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    // Metrics module errors
    #[error("{0}")]
    RawSheetError(#[from] crate::metrics::raw::RawSheetError),

    #[error("{0}")]
    ResolveError(#[from] crate::metrics::resolver::ResolveError),

    // Configuration errors
    #[error("{0}")]
    ConfigError(#[from] crate::config::ConfigError),

    // Rendering and export errors
    #[error("{0}")]
    ChartError(#[from] crate::chart::ChartError),

    #[error("{0}")]
    ExportError(#[from] crate::export::ExportError),
}

/// Type alias for results produced by this crate
pub type Result<T> = std::result::Result<T, DashboardError>;

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| DashboardError::WithContextError(format!("{}: {}", message, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn error_with_prefix() {
        let result: Result<()> = Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into());
        let error = result.with_prefix("Open 'sprints.xlsx' failed").unwrap_err();
        assert_eq!(error.to_string(), "Open 'sprints.xlsx' failed: gone");
    }

    #[test]
    fn error_from_io_keeps_source() {
        let error = DashboardError::from(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"));
        assert!(matches!(error, DashboardError::IoError(_)));
        assert!(error.source().is_some());
        assert_eq!(error.to_string(), "denied");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DashboardError>();
    }
}
