//! Per-team numeric metric table.
use crate::metrics::raw::RawSheet;
use crate::metrics::resolver::{ColumnMapping, ResolveError};
use crate::metrics::Metric;
use log::{debug, info};
use std::collections::BTreeMap;
use std::fmt::Display;

/// Sprint-ordered values of the resolved and derived metrics of one team.
///
/// A value is `None` when the source cell is missing or not a number, or when
/// a derived value cannot be computed from it. A metric without a source
/// column is absent from the table altogether.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricTable {
    team: String,
    sprints: Vec<String>,
    columns: BTreeMap<Metric, Vec<Option<f64>>>,
}

impl MetricTable {
    /// Selects the mapped columns of `sheet`, coerces them to numbers and adds derived metrics.
    pub fn build(team: &str, mapping: &ColumnMapping, sheet: &RawSheet) -> Result<MetricTable, ResolveError> {
        let mut columns = BTreeMap::new();
        for (metric, label) in mapping {
            match sheet.column(label) {
                Some(values) => {
                    columns.insert(*metric, values.iter().map(|value| value.to_number()).collect());
                }
                None => debug!("Column '{}' for {} not in sheet '{}'", label, metric, sheet.name()),
            }
        }
        if columns.is_empty() {
            return Err(ResolveError::NoTeamColumns(team.to_owned()));
        }

        let mut table = MetricTable {
            team: team.to_owned(),
            sprints: sheet.sprints().to_vec(),
            columns,
        };
        table.derive();
        info!(
            "Built table for '{}': {} sprint(s), metrics {:?}",
            table.team,
            table.sprints.len(),
            table.metrics().iter().map(Metric::as_str).collect::<Vec<_>>()
        );
        Ok(table)
    }

    fn derive(&mut self) {
        if let (Some(billable), Some(non_billable)) = (self.get(Metric::BillableTs), self.get(Metric::NonBillableTs)) {
            let total = zip_values(billable, non_billable, |b, n| Some(b + n));
            self.columns.insert(Metric::TotalTime, total);
        }
        if let (Some(velocity), Some(billable)) = (self.get(Metric::Velocity), self.get(Metric::BillableTs)) {
            let efficiency = zip_values(velocity, billable, |v, b| ratio(v, b / 100.0));
            self.columns.insert(Metric::Efficiency, efficiency);
        }
        if let (Some(billable), Some(total)) = (self.get(Metric::BillableTs), self.get(Metric::TotalTime)) {
            let utilization = zip_values(billable, total, |b, t| ratio(b, t).map(|share| share * 100.0));
            self.columns.insert(Metric::Utilization, utilization);
        }
    }

    pub fn team(&self) -> &str {
        &self.team
    }

    /// Sprint identifiers, one per table row.
    pub fn sprints(&self) -> &[String] {
        &self.sprints
    }

    /// Values of one metric, `None` if the metric is absent.
    pub fn get(&self, metric: Metric) -> Option<&[Option<f64>]> {
        self.columns.get(&metric).map(Vec::as_slice)
    }

    pub fn contains(&self, metric: Metric) -> bool {
        self.columns.contains_key(&metric)
    }

    /// Present metrics, canonical ones first.
    pub fn metrics(&self) -> Vec<Metric> {
        self.columns.keys().copied().collect()
    }
}

fn zip_values(left: &[Option<f64>], right: &[Option<f64>], f: impl Fn(f64, f64) -> Option<f64>) -> Vec<Option<f64>> {
    left.iter()
        .zip(right)
        .map(|(left, right)| match (left, right) {
            (Some(left), Some(right)) => f(*left, *right).filter(|value| value.is_finite()),
            _ => None,
        })
        .collect()
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

/// Two-decimal text table, missing values shown as `-`.
impl Display for MetricTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let metrics = self.metrics();
        let mut rows = vec![std::iter::once("Sprint".to_owned())
            .chain(metrics.iter().map(|metric| metric.to_string()))
            .collect::<Vec<_>>()];
        for (index, sprint) in self.sprints.iter().enumerate() {
            let mut row = vec![sprint.to_owned()];
            for metric in &metrics {
                row.push(match self.columns[metric].get(index).copied().flatten() {
                    Some(value) => format!("{value:.2}"),
                    None => "-".to_owned(),
                });
            }
            rows.push(row);
        }

        let widths: Vec<usize> = (0..=metrics.len())
            .map(|col| rows.iter().map(|row| row[col].chars().count()).max().unwrap_or(0))
            .collect();
        for row in rows {
            let line = row
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(col, (text, width))| if col == 0 { format!("{text:<width$}") } else { format!("{text:>width$}") })
                .collect::<Vec<_>>()
                .join("  ");
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}
