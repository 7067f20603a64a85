use crate::spreadsheet::reference::index_to_reference;
use chrono::Duration;
use chrono::NaiveDate;
use std::fmt::Display;

/// Types of cell data in an xlsx worksheet.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum CellType {
    #[default]
    Empty,
    /// Boolean values stored as `0`/`1`
    Boolean,
    /// Plain numeric values
    Number,
    /// Date values stored as day serials from the 1900 epoch
    NumberDate1900,
    /// Date values stored as day serials from the 1904 epoch
    NumberDate1904,
    /// ISO 8601 date/time strings (`t="d"`)
    IsoDateTime,
    /// Inline string values
    InlineString,
    /// Shared string table entries, already resolved to their text
    SharedString,
    /// Error values such as `#N/A`
    Error,
}

impl CellType {
    /// Parses built-in Excel number format IDs that denote dates.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "14" | "15" | "16" | "17" | "22" => Some(Self::date(is_1904)),
            _ => None,
        }
    }

    /// Classifies a custom number format code as date or plain number.
    /// Quoted literals, bracketed sections and escaped characters are ignored;
    /// any remaining `y` or `d` marks the format as a date.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_bracket = false;
        let mut is_date = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_bracket => is_literal = true,

                ']' if is_bracket => is_bracket = false,
                '[' if !is_literal => is_bracket = true,
                _ if is_literal || is_bracket => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                _ => (),
            }
        }

        if is_date {
            Self::date(is_1904)
        } else {
            Self::Number
        }
    }

    fn date(is_1904: bool) -> Self {
        if is_1904 {
            Self::NumberDate1904
        } else {
            Self::NumberDate1900
        }
    }

    pub(crate) fn is_numeric(&self) -> bool {
        matches!(self, Self::Number | Self::NumberDate1900 | Self::NumberDate1904)
    }
}

/// A single populated cell with its 0-based position, type and raw text value.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    pub kind: CellType,
    pub value: String,
}

impl Cell {
    /// Returns the Excel-style cell reference (e.g., "A1", "B2").
    pub fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// Numeric view of the cell, `None` for anything that is not a finite number.
    ///
    /// Text cells holding a number (`" 12.5 "`) count as numbers; booleans map to 1/0.
    pub fn to_number(&self) -> Option<f64> {
        let number = match self.kind {
            CellType::Empty | CellType::Error | CellType::IsoDateTime => None,
            CellType::Boolean => Some(if self.value == "1" { 1.0 } else { 0.0 }),
            _ => self.value.trim().parse::<f64>().ok(),
        };
        number.filter(|value| value.is_finite())
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            CellType::Boolean => write!(f, "{}", if self.value == "1" { "TRUE" } else { "FALSE" }),
            CellType::NumberDate1900 | CellType::NumberDate1904 => {
                match to_date_string(&self.value, self.kind == CellType::NumberDate1904) {
                    Some(date) => write!(f, "{date}"),
                    None => write!(f, "{}", self.value),
                }
            }
            CellType::Number => match self.value.parse::<f64>() {
                Ok(number) if number.fract() == 0.0 && number.abs() < 1e15 => write!(f, "{}", number as i64),
                _ => write!(f, "{}", self.value),
            },
            CellType::IsoDateTime => write!(f, "{}", self.value.replace('T', " ")),
            _ => write!(f, "{}", self.value),
        }
    }
}

/// Converts an Excel day serial to an ISO date string.
/// Serials below 60 are shifted by one day to undo the Lotus 1-2-3 leap year bug.
fn to_date_string(value: &str, is_1904: bool) -> Option<String> {
    let days = value.trim().parse::<f64>().ok()?.trunc() as i64;
    let offset = if is_1904 {
        1462
    } else if days < 60 {
        1
    } else {
        0
    };
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let date = epoch.checked_add_signed(Duration::try_days(days + offset)?)?;
    Some(date.format("%Y-%m-%d").to_string())
}
