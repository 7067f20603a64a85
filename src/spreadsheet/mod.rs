//! # Spreadsheet Reading Module
//!
//! Reads the worksheets of an Excel 2007+ workbook (`.xlsx`, `.xlsm`) straight
//! from its zip package. Workbooks can come from a path on disk or from an
//! uploaded byte buffer; either way the caller gets [`Sheet`]s of typed cells.
use crate::error::DashboardError;
use crate::error::ResultMessage;
use crate::helpers::reader::UnifiedReader;
use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use std::path::Path;
use thiserror::Error;

pub mod cell;
pub(crate) mod reference;
pub mod sheet;
mod xlsx;

pub use cell::{Cell, CellType};
pub use sheet::Sheet;

/// Errors raised while opening or reading a workbook.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    /// The file is not a zip package (wrong format, or password protected)
    #[error("'{0}' is not an xlsx workbook")]
    InvalidFileFormat(String),

    /// A required part is missing from the package
    #[error("Missing workbook part '{0}'")]
    MissingPart(String),

    /// The workbook declares no worksheets
    #[error("Workbook '{0}' contains no sheets")]
    EmptyWorkbook(String),

    /// Requested sheet index does not exist
    #[error("Sheet #{0} not found")]
    SheetNotFound(usize),

    /// A cell holds a value that cannot be decoded
    #[error("Invalid cell value at '{position}': {message}")]
    InvalidCellValue { position: String, message: String },
}

/// Format-specific workbook reader.
pub(crate) trait Spreadsheet {
    /// Returns the file name of this spreadsheet
    fn name(&self) -> &str;

    /// Worksheet names in workbook order
    fn sheet_names(&self) -> Vec<String>;

    /// Reads one worksheet by position
    fn read_sheet(&mut self, index: usize) -> Result<Sheet, DashboardError>;
}

/// An opened workbook.
pub struct Workbook {
    inner: Box<dyn Spreadsheet>,
}

impl Workbook {
    /// Opens a workbook file from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Workbook, DashboardError> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let reader = UnifiedReader::open(path).with_prefix(&format!("Open '{name}' failed"))?;
        Self::from_reader(&name, reader)
    }

    /// Opens a workbook from uploaded bytes; `name` is used in messages only.
    pub fn from_bytes(name: &str, bytes: Vec<u8>) -> Result<Workbook, DashboardError> {
        Self::from_reader(name, UnifiedReader::from_bytes(bytes))
    }

    fn from_reader(name: &str, reader: UnifiedReader) -> Result<Workbook, DashboardError> {
        let spreadsheet = XlsxSpreadsheet::open(name, reader)?;
        log::debug!("Opened '{}' with sheets {:?}", name, spreadsheet.sheet_names());
        Ok(Workbook {
            inner: Box::new(spreadsheet),
        })
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.inner.sheet_names()
    }

    /// Reads the first worksheet, the only one the dashboard looks at.
    pub fn first_sheet(&mut self) -> Result<Sheet, DashboardError> {
        self.inner.read_sheet(0)
    }
}
