//! # Metrics Module
//!
//! Turns a raw "Row Labels" sheet into a per-team metric table:
//!
//! - [`raw`]: the sheet reshaped so that each row is one sprint
//! - [`resolver`]: header matching strategies that find a team's metric columns
//! - [`table`]: numeric coercion and derived metrics
use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod raw;
pub mod resolver;
pub mod table;

/// Canonical and derived metric names shared by every team and chart.
///
/// Declaration order is the display order of a metric table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Velocity,
    BillableTs,
    NonBillableTs,
    BugsCreated,
    BugsClosed,
    Releases,
    SpPerHour,
    TotalTime,
    Efficiency,
    Utilization,
}

impl Metric {
    /// The seven metrics read from the sheet, in exact-list position order.
    pub const CANONICAL: [Metric; 7] = [
        Metric::Velocity,
        Metric::BillableTs,
        Metric::NonBillableTs,
        Metric::BugsCreated,
        Metric::BugsClosed,
        Metric::Releases,
        Metric::SpPerHour,
    ];

    /// Metrics computed from canonical ones.
    pub const DERIVED: [Metric; 3] = [Metric::TotalTime, Metric::Efficiency, Metric::Utilization];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Velocity => "Velocity",
            Self::BillableTs => "Billable TS",
            Self::NonBillableTs => "Non-Billable TS",
            Self::BugsCreated => "Bugs Created",
            Self::BugsClosed => "Bugs Closed",
            Self::Releases => "Releases",
            Self::SpPerHour => "SP/Hour",
            Self::TotalTime => "Total Time",
            Self::Efficiency => "Efficiency",
            Self::Utilization => "Utilization %",
        }
    }

    pub const fn is_derived(&self) -> bool {
        matches!(self, Self::TotalTime | Self::Efficiency | Self::Utilization)
    }
}

impl Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
