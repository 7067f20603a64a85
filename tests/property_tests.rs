//! Property-based tests for team_dashboard using proptest
//!
//! These tests generate random sheets and metric selections to check the
//! invariants of the reshape, table and chart steps.

use proptest::prelude::*;
use team_dashboard::chart::{render, PanelKind};
use team_dashboard::metrics::raw::{LabelRow, RawSheet, RawValue};
use team_dashboard::metrics::resolver::ColumnMapping;
use team_dashboard::metrics::table::MetricTable;
use team_dashboard::Metric;

/// Any cell value a sheet can hold, numbers kept finite
fn raw_value_strategy() -> impl Strategy<Value = RawValue> {
    prop_oneof![
        Just(RawValue::Empty),
        (-1.0e6..1.0e6f64).prop_map(RawValue::Number),
        "[a-zA-Z/ ]{0,6}".prop_map(RawValue::Text),
        any::<bool>().prop_map(RawValue::Bool),
    ]
}

/// Sprint identifiers and label-major rows of equal width
fn sheet_strategy() -> impl Strategy<Value = (Vec<String>, Vec<LabelRow>)> {
    (1usize..6, prop::collection::btree_set("[A-Z][a-z]{1,8}( [A-Z][a-z]{1,8})?", 1..6))
        .prop_flat_map(|(width, labels)| {
            let count = labels.len();
            (
                prop::collection::vec("S[0-9]{1,3}", width),
                prop::collection::vec(prop::collection::vec(raw_value_strategy(), width), count),
                Just(labels.into_iter().collect::<Vec<_>>()),
            )
        })
        .prop_map(|(sprints, values, labels)| (sprints, labels.into_iter().zip(values).collect()))
}

/// A table holding `metrics`, each filled with `values`
fn table_with(metrics: &[Metric], values: &[RawValue]) -> MetricTable {
    let sprints = (1..=values.len()).map(|index| format!("S{index}")).collect();
    let rows = metrics
        .iter()
        .map(|metric| (format!("Team {metric}"), values.to_vec()))
        .collect();
    let sheet = RawSheet::from_label_rows("Metrics", sprints, rows).unwrap();
    let mapping: ColumnMapping = metrics.iter().map(|metric| (*metric, format!("Team {metric}"))).collect();
    MetricTable::build("Team", &mapping, &sheet).unwrap()
}

proptest! {
    #[test]
    fn transpose_round_trip_keeps_sprint_order((sprints, rows) in sheet_strategy()) {
        let sheet = RawSheet::from_label_rows("Metrics", sprints.clone(), rows.clone()).unwrap();
        prop_assert_eq!(sheet.sprints(), sprints.as_slice());
        prop_assert_eq!(sheet.transpose(), rows);
    }

    #[test]
    fn non_numeric_text_is_missing(text in "[a-zA-Z/ ]{0,6}", position in 0usize..4) {
        let mut values = vec![RawValue::Number(1.0); 4];
        values[position] = RawValue::Text(text.clone());
        let table = table_with(&[Metric::Velocity], &values);
        let column = table.get(Metric::Velocity).unwrap();
        prop_assert_eq!(column[position], text.trim().parse::<f64>().ok().filter(|value| value.is_finite()));
        prop_assert!(column.iter().enumerate().all(|(index, value)| index == position || *value == Some(1.0)));
    }

    #[test]
    fn derived_metrics_need_their_inputs(
        metrics in prop::sample::subsequence(Metric::CANONICAL.to_vec(), 1..=7),
        values in prop::collection::vec(raw_value_strategy(), 1..5),
    ) {
        let table = table_with(&metrics, &values);
        let present = table.metrics();
        for metric in &present {
            prop_assert!(metrics.contains(metric) || metric.is_derived());
            prop_assert_eq!(table.get(*metric).unwrap().len(), values.len());
        }
        if table.contains(Metric::TotalTime) {
            prop_assert!(table.contains(Metric::BillableTs) && table.contains(Metric::NonBillableTs));
        }
        if table.contains(Metric::Efficiency) {
            prop_assert!(table.contains(Metric::Velocity) && table.contains(Metric::BillableTs));
        }
        if table.contains(Metric::Utilization) {
            prop_assert!(table.contains(Metric::TotalTime));
        }
        for value in table.metrics().iter().flat_map(|metric| table.get(*metric).unwrap()) {
            prop_assert!(value.map_or(true, f64::is_finite));
        }
    }

    #[test]
    fn efficiency_grows_with_velocity(
        billable in 1.0..500.0f64,
        low in 0.0..100.0f64,
        step in 0.5..100.0f64,
    ) {
        let sprints = vec!["S1".to_owned(), "S2".to_owned()];
        let rows = vec![
            ("Team Velocity".to_owned(), vec![RawValue::Number(low), RawValue::Number(low + step)]),
            ("Team Billable TS".to_owned(), vec![RawValue::Number(billable), RawValue::Number(billable)]),
        ];
        let sheet = RawSheet::from_label_rows("Metrics", sprints, rows).unwrap();
        let mapping: ColumnMapping = [
            (Metric::Velocity, "Team Velocity".to_owned()),
            (Metric::BillableTs, "Team Billable TS".to_owned()),
        ]
        .into_iter()
        .collect();
        let table = MetricTable::build("Team", &mapping, &sheet).unwrap();
        let efficiency = table.get(Metric::Efficiency).unwrap();
        prop_assert!(efficiency[0].unwrap() < efficiency[1].unwrap());
    }

    #[test]
    fn renderer_always_returns_four_panels(
        metrics in prop::sample::subsequence(Metric::CANONICAL.to_vec(), 1..=7),
        values in prop::collection::vec(raw_value_strategy(), 1..5),
    ) {
        let table = table_with(&metrics, &values);
        let figure = render(&table, "Team");
        prop_assert_eq!(figure.panels.len(), 4);

        let velocity_missing = !metrics.contains(&Metric::Velocity);
        prop_assert_eq!(figure.panels[0].is_placeholder(), velocity_missing);
        let releases_missing = !metrics.contains(&Metric::Releases);
        prop_assert_eq!(figure.panels[1].is_placeholder(), releases_missing);
        let bugs_missing = !metrics.contains(&Metric::BugsCreated) && !metrics.contains(&Metric::BugsClosed);
        prop_assert_eq!(figure.panels[2].is_placeholder(), bugs_missing);
        if let PanelKind::Line { series, .. } = &figure.panels[3].kind {
            prop_assert_eq!(series.values.len(), values.len());
        }
    }
}

#[test]
fn empty_team_resolution_renders_placeholders_only() {
    let table = table_with(&[Metric::BillableTs], &[RawValue::Number(1.0)]);
    let figure = render(&table, "Team");
    assert!(figure.panels.iter().all(|panel| panel.is_placeholder()));
}
