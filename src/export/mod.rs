//! # Report Export Module
//!
//! Draws a [`Figure`] onto a single PDF page and names the resulting report.
use crate::chart::{check_size, draw_figure, Figure};
use crate::error::DashboardError;
use log::info;
use pdf_writer::Content;
use plotters::prelude::IntoDrawingArea;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod pdf;

pub use pdf::PdfBackend;

/// Content type of an exported report.
pub const CONTENT_TYPE: &str = "application/pdf";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Cannot write report '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Renders the figure into the bytes of a single-page PDF document.
pub fn export(figure: &Figure, size: (u32, u32)) -> Result<Vec<u8>, DashboardError> {
    check_size(size)?;
    let mut content = Content::new();
    {
        let root = PdfBackend::new(&mut content, size).into_drawing_area();
        draw_figure(root, figure)?;
    }
    let bytes = pdf::write_document(content, size, &figure.title);
    info!("Exported '{}' as a {} byte PDF", figure.title, bytes.len());
    Ok(bytes)
}

/// `<team with spaces replaced by underscores>_Dashboard.pdf`
pub fn report_file_name(team: &str) -> String {
    format!("{}_Dashboard.pdf", team.replace(' ', "_"))
}

/// Writes report bytes under `dir`, creating it when needed, and returns the file path.
pub fn write_report(dir: &Path, team: &str, bytes: &[u8]) -> Result<PathBuf, ExportError> {
    let path = dir.join(report_file_name(team));
    let write = || -> std::io::Result<()> {
        std::fs::create_dir_all(dir)?;
        std::fs::write(&path, bytes)
    };
    write().map_err(|source| ExportError::Write {
        path: path.display().to_string(),
        source,
    })?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{render, DEFAULT_SIZE};
    use crate::metrics::raw::{RawSheet, RawValue};
    use crate::metrics::resolver::ColumnMapping;
    use crate::metrics::table::MetricTable;
    use crate::metrics::Metric;

    fn figure() -> Figure {
        let sheet = RawSheet::from_label_rows(
            "Metrics",
            vec!["S1".to_owned(), "S2".to_owned()],
            vec![
                ("Agency Velocity".to_owned(), vec![RawValue::Number(10.0), RawValue::Number(12.0)]),
                ("Agency Bugs created".to_owned(), vec![RawValue::Number(2.0), RawValue::Text("N/A".to_owned())]),
            ],
        )
        .unwrap();
        let mapping: ColumnMapping = [
            (Metric::Velocity, "Agency Velocity".to_owned()),
            (Metric::BugsCreated, "Agency Bugs created".to_owned()),
        ]
        .into_iter()
        .collect();
        render(&MetricTable::build("Agency", &mapping, &sheet).unwrap(), "Agency")
    }

    #[test]
    fn report_file_names() {
        assert_eq!(report_file_name("Agency"), "Agency_Dashboard.pdf");
        assert_eq!(report_file_name("Production Systems"), "Production_Systems_Dashboard.pdf");
        assert_eq!(report_file_name("TPS & DP"), "TPS_&_DP_Dashboard.pdf");
    }

    #[test]
    fn export_produces_a_pdf() {
        let bytes = export(&figure(), DEFAULT_SIZE).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("(Agency - Performance Dashboard) Tj"));
        assert!(text.contains("(Releases missing) Tj"));
        assert!(text.contains("/Count 1"));
    }

    #[test]
    fn export_rejects_tiny_figures() {
        let error = export(&figure(), (0, 0)).unwrap_err();
        assert_eq!(error.to_string(), "Invalid figure size 0x0");
    }

    #[test]
    fn write_report_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("reports");
        let path = write_report(&target, "Production Systems", b"%PDF-1.7").unwrap();
        assert_eq!(path, target.join("Production_Systems_Dashboard.pdf"));
        assert_eq!(std::fs::read(path).unwrap(), b"%PDF-1.7");
    }
}
