//! The raw metrics sheet, transposed so that sprints are rows.
use crate::spreadsheet::{Cell, CellType, Sheet};
use log::warn;
use std::collections::HashMap;
use thiserror::Error;

/// Header of the first column of every metrics sheet.
pub const ROW_LABELS: &str = "Row Labels";

/// Errors that make a sheet unusable as a metrics source.
#[derive(Error, Debug, PartialEq)]
pub enum RawSheetError {
    #[error("Missing required column 'Row Labels' in sheet '{0}'")]
    MissingRowLabels(String),

    #[error("Sheet '{0}' has no sprint columns")]
    NoSprints(String),
}

/// A single raw cell value before numeric coercion.
#[derive(Clone, Debug, PartialEq)]
pub enum RawValue {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
}

impl RawValue {
    /// Coerces to a finite number; anything else is missing.
    pub fn to_number(&self) -> Option<f64> {
        let number = match self {
            RawValue::Empty => None,
            RawValue::Number(number) => Some(*number),
            RawValue::Text(text) => text.trim().parse::<f64>().ok(),
            RawValue::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        };
        number.filter(|value| value.is_finite())
    }
}

impl From<Option<&Cell>> for RawValue {
    fn from(cell: Option<&Cell>) -> Self {
        match cell {
            None => RawValue::Empty,
            Some(cell) => match cell.kind {
                CellType::Empty => RawValue::Empty,
                CellType::Boolean => RawValue::Bool(cell.value == "1"),
                kind if kind.is_numeric() => match cell.value.trim().parse::<f64>() {
                    Ok(number) => RawValue::Number(number),
                    Err(_) => RawValue::Text(cell.value.to_owned()),
                },
                _ => RawValue::Text(cell.value.to_owned()),
            },
        }
    }
}

/// One label-major row as it appears in the sheet: a label and one value per sprint.
pub type LabelRow = (String, Vec<RawValue>);

/// The metrics sheet with sprints as rows and raw metric labels as columns.
///
/// `sprints` keeps the original left-to-right column order of the sheet and is
/// the x-axis order of everything built from it. Labels are unique.
#[derive(Clone, Debug, PartialEq)]
pub struct RawSheet {
    name: String,
    sprints: Vec<String>,
    labels: Vec<String>,
    index: HashMap<String, usize>,
    /// `rows[sprint][label]`
    rows: Vec<Vec<RawValue>>,
}

impl RawSheet {
    /// Builds the transposed sheet from label-major rows.
    ///
    /// Rows with a blank label are dropped; a repeated label keeps its first row.
    /// Value rows shorter than `sprints` are padded with [`RawValue::Empty`].
    pub fn from_label_rows(name: &str, sprints: Vec<String>, label_rows: Vec<LabelRow>) -> Result<RawSheet, RawSheetError> {
        if sprints.is_empty() {
            return Err(RawSheetError::NoSprints(name.to_owned()));
        }
        let mut labels = Vec::<String>::new();
        let mut index = HashMap::<String, usize>::new();
        let mut rows = vec![Vec::<RawValue>::new(); sprints.len()];
        for (label, mut values) in label_rows {
            let label = label.trim().to_owned();
            if label.is_empty() {
                continue;
            }
            if index.contains_key(&label) {
                warn!("Duplicate row label '{}' in sheet '{}', keeping the first one", label, name);
                continue;
            }
            values.resize(sprints.len(), RawValue::Empty);
            for (row, value) in rows.iter_mut().zip(values) {
                row.push(value);
            }
            index.insert(label.clone(), labels.len());
            labels.push(label);
        }
        Ok(RawSheet {
            name: name.to_owned(),
            sprints,
            labels,
            index,
            rows,
        })
    }

    /// Builds the transposed sheet from a worksheet grid whose top-left cell is "Row Labels".
    pub fn from_grid(name: &str, grid: &[Vec<Option<&Cell>>]) -> Result<RawSheet, RawSheetError> {
        let header = grid.first().ok_or_else(|| RawSheetError::MissingRowLabels(name.to_owned()))?;
        let first = header.first().copied().flatten().map(|cell| cell.to_string());
        if first.as_deref().map(str::trim) != Some(ROW_LABELS) {
            return Err(RawSheetError::MissingRowLabels(name.to_owned()));
        }
        let width = grid.iter().map(Vec::len).max().unwrap_or_default();
        let sprints = (1..width)
            .map(|col| match header.get(col).copied().flatten() {
                Some(cell) => cell.to_string(),
                None => format!("Unnamed: {col}"),
            })
            .collect::<Vec<_>>();
        let label_rows = grid
            .iter()
            .skip(1)
            .filter_map(|row| {
                let label = row.first().copied().flatten()?.to_string();
                let values = row.iter().skip(1).map(|cell| RawValue::from(*cell)).collect();
                Some((label, values))
            })
            .collect();
        Self::from_label_rows(name, sprints, label_rows)
    }

    /// Builds the transposed sheet from the first worksheet of a workbook.
    pub fn from_sheet(sheet: &Sheet) -> Result<RawSheet, RawSheetError> {
        Self::from_grid(&sheet.name, &sheet.grid())
    }

    /// Restores the label-major layout of the original sheet.
    pub fn transpose(&self) -> Vec<LabelRow> {
        self.labels
            .iter()
            .enumerate()
            .map(|(col, label)| (label.to_owned(), self.rows.iter().map(|row| row[col].clone()).collect()))
            .collect()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sprint identifiers in original column order.
    pub fn sprints(&self) -> &[String] {
        &self.sprints
    }

    /// Raw metric labels in original row order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// All sprint values of one label, `None` for an unknown label.
    pub fn column(&self, label: &str) -> Option<Vec<&RawValue>> {
        let col = *self.index.get(label)?;
        Some(self.rows.iter().map(|row| &row[col]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> RawValue {
        RawValue::Text(value.to_owned())
    }

    fn cell(row: usize, col: usize, kind: CellType, value: &str) -> Cell {
        Cell {
            row,
            col,
            kind,
            value: value.to_owned(),
        }
    }

    #[test]
    fn raw_value_to_number() {
        assert_eq!(RawValue::Number(3.5).to_number(), Some(3.5));
        assert_eq!(text(" 7 ").to_number(), Some(7.0));
        assert_eq!(text("N/A").to_number(), None);
        assert_eq!(text("inf").to_number(), None);
        assert_eq!(RawValue::Number(f64::NAN).to_number(), None);
        assert_eq!(RawValue::Bool(true).to_number(), Some(1.0));
        assert_eq!(RawValue::Empty.to_number(), None);
    }

    #[test]
    fn from_label_rows_transposes() {
        let sheet = RawSheet::from_label_rows(
            "Metrics",
            vec!["S1".to_owned(), "S2".to_owned()],
            vec![
                ("Agency Velocity".to_owned(), vec![RawValue::Number(10.0), RawValue::Number(12.0)]),
                ("Agency Releases".to_owned(), vec![RawValue::Number(1.0)]),
            ],
        )
        .unwrap();

        assert_eq!(sheet.sprints(), ["S1", "S2"]);
        assert_eq!(sheet.labels(), ["Agency Velocity", "Agency Releases"]);
        assert_eq!(
            sheet.column("Agency Velocity").unwrap(),
            vec![&RawValue::Number(10.0), &RawValue::Number(12.0)]
        );
        assert_eq!(sheet.column("Agency Releases").unwrap(), vec![&RawValue::Number(1.0), &RawValue::Empty]);
        assert!(sheet.column("Agency Bugs").is_none());
    }

    #[test]
    fn from_label_rows_skips_blank_and_duplicate_labels() {
        let sheet = RawSheet::from_label_rows(
            "Metrics",
            vec!["S1".to_owned()],
            vec![
                ("Agency Velocity".to_owned(), vec![RawValue::Number(1.0)]),
                ("  ".to_owned(), vec![RawValue::Number(2.0)]),
                ("Agency Velocity ".to_owned(), vec![RawValue::Number(3.0)]),
            ],
        )
        .unwrap();

        assert_eq!(sheet.labels(), ["Agency Velocity"]);
        assert_eq!(sheet.column("Agency Velocity").unwrap(), vec![&RawValue::Number(1.0)]);
    }

    #[test]
    fn transpose_round_trip() {
        let label_rows = vec![
            ("A Velocity".to_owned(), vec![RawValue::Number(1.0), text("N/A"), RawValue::Empty]),
            ("A Releases".to_owned(), vec![RawValue::Bool(false), RawValue::Number(2.0), text("x")]),
        ];
        let sprints = vec!["S3".to_owned(), "S1".to_owned(), "S2".to_owned()];
        let sheet = RawSheet::from_label_rows("Metrics", sprints.clone(), label_rows.clone()).unwrap();

        assert_eq!(sheet.transpose(), label_rows);
        assert_eq!(sheet.sprints(), sprints.as_slice());
    }

    #[test]
    fn no_sprints() {
        let error = RawSheet::from_label_rows("Metrics", Vec::new(), Vec::new()).unwrap_err();
        assert_eq!(error, RawSheetError::NoSprints("Metrics".to_owned()));
    }

    #[test]
    fn from_grid_requires_row_labels() {
        let header = cell(0, 0, CellType::SharedString, "Metric");
        let grid = vec![vec![Some(&header)]];
        assert_eq!(
            RawSheet::from_grid("Metrics", &grid).unwrap_err(),
            RawSheetError::MissingRowLabels("Metrics".to_owned())
        );
        assert_eq!(
            RawSheet::from_grid("Metrics", &[]).unwrap_err().to_string(),
            "Missing required column 'Row Labels' in sheet 'Metrics'"
        );
    }

    #[test]
    fn from_grid_reads_sprints_and_values() {
        let cells = [
            cell(0, 0, CellType::SharedString, "Row Labels"),
            cell(0, 1, CellType::SharedString, "S1"),
            cell(0, 3, CellType::NumberDate1900, "45658"),
            cell(1, 0, CellType::SharedString, "Agency Velocity"),
            cell(1, 1, CellType::Number, "10"),
            cell(1, 2, CellType::SharedString, "N/A"),
            cell(1, 3, CellType::Number, "12.5"),
            cell(2, 1, CellType::Number, "99"),
        ];
        let grid = vec![
            vec![Some(&cells[0]), Some(&cells[1]), None, Some(&cells[2])],
            vec![Some(&cells[3]), Some(&cells[4]), Some(&cells[5]), Some(&cells[6])],
            vec![None, Some(&cells[7]), None, None],
        ];
        let sheet = RawSheet::from_grid("Metrics", &grid).unwrap();

        assert_eq!(sheet.sprints(), ["S1", "Unnamed: 2", "2025-01-01"]);
        assert_eq!(sheet.labels(), ["Agency Velocity"]);
        let values: Vec<Option<f64>> = sheet.column("Agency Velocity").unwrap().iter().map(|value| value.to_number()).collect();
        assert_eq!(values, vec![Some(10.0), None, Some(12.5)]);
    }

    #[test]
    fn from_grid_accepts_ragged_rows() {
        let cells = [
            cell(0, 0, CellType::SharedString, "Row Labels"),
            cell(0, 1, CellType::SharedString, "S1"),
            cell(1, 0, CellType::SharedString, "Agency Velocity"),
            cell(1, 2, CellType::Number, "7"),
            cell(2, 0, CellType::SharedString, "Agency Releases"),
        ];
        let grid = vec![
            vec![Some(&cells[0]), Some(&cells[1])],
            vec![Some(&cells[2]), None, Some(&cells[3])],
            vec![Some(&cells[4])],
        ];
        let sheet = RawSheet::from_grid("Metrics", &grid).unwrap();

        assert_eq!(sheet.sprints(), ["S1", "Unnamed: 2"]);
        let velocity: Vec<Option<f64>> = sheet.column("Agency Velocity").unwrap().iter().map(|value| value.to_number()).collect();
        assert_eq!(velocity, vec![None, Some(7.0)]);
        let releases: Vec<Option<f64>> = sheet.column("Agency Releases").unwrap().iter().map(|value| value.to_number()).collect();
        assert_eq!(releases, vec![None, None]);
    }
}
