use crate::spreadsheet::cell::Cell;
use std::collections::BTreeMap;

/// A worksheet read from a workbook: its populated cells in document order
/// and the bounding box they span.
#[derive(Clone, Debug)]
pub struct Sheet {
    /// Source file name
    pub file_name: String,
    /// Sheet name
    pub name: String,
    /// All populated cells, row-major
    pub cells: Vec<Cell>,
    pub row_lower_bound: Option<usize>,
    pub row_upper_bound: Option<usize>,
    pub col_lower_bound: Option<usize>,
    pub col_upper_bound: Option<usize>,
}

impl Sheet {
    pub(crate) fn new(file_name: &str, name: &str) -> Self {
        Self {
            file_name: file_name.to_owned(),
            name: name.to_owned(),
            cells: Vec::new(),
            row_lower_bound: None,
            row_upper_bound: None,
            col_lower_bound: None,
            col_upper_bound: None,
        }
    }

    /// Returns true if the sheet contains no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Adds a cell, widening the data bounds to include it.
    pub(crate) fn push(&mut self, cell: Cell) {
        self.update_bound(cell.row, cell.col);
        self.cells.push(cell);
    }

    fn update_bound(&mut self, row: usize, col: usize) {
        if self.row_lower_bound.map(|lower| row < lower).unwrap_or(true) {
            self.row_lower_bound = Some(row);
        }
        if self.row_upper_bound.map(|upper| upper < row).unwrap_or(true) {
            self.row_upper_bound = Some(row);
        }
        if self.col_lower_bound.map(|lower| col < lower).unwrap_or(true) {
            self.col_lower_bound = Some(col);
        }
        if self.col_upper_bound.map(|upper| upper < col).unwrap_or(true) {
            self.col_upper_bound = Some(col);
        }
    }

    /// Lays the populated rows out as a table, top to bottom.
    ///
    /// Empty rows are skipped. Column 0 is the leftmost populated column and
    /// every row ends at its own last cell; gaps are `None`.
    pub fn grid(&self) -> Vec<Vec<Option<&Cell>>> {
        let Some(col_lower) = self.col_lower_bound else {
            return Vec::new();
        };
        let mut rows = BTreeMap::<usize, Vec<Option<&Cell>>>::new();
        for cell in &self.cells {
            let row = rows.entry(cell.row).or_default();
            let col = cell.col - col_lower;
            if row.len() <= col {
                row.resize(col + 1, None);
            }
            row[col] = Some(cell);
        }
        rows.into_values().collect()
    }
}
