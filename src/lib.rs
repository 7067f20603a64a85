//! # Team Dashboard
//!
//! Per-team sprint performance dashboards from a spreadsheet export.
//!
//! The input is an Excel workbook whose first sheet has a "Row Labels" column
//! naming one metric of one team per row (`"Agency Velocity"`,
//! `"TPS & DP Bugs closed"`, ...) and one column per sprint. For a selected
//! team the crate:
//!
//! 1. resolves which rows hold the team's canonical metrics ([`metrics::resolver`]),
//! 2. builds a per-sprint numeric table with derived metrics ([`metrics::table`]),
//! 3. lays out a four-panel chart figure ([`chart`]),
//! 4. exports the figure as a single-page PDF ([`export`]).
//!
//! [`Dashboard`] ties the steps together:
//!
//! ```no_run
//! use team_dashboard::{Config, Dashboard};
//!
//! # fn main() -> team_dashboard::Result<()> {
//! let dashboard = Dashboard::load("sprints.xlsx", &Config::default())?;
//! for team in dashboard.teams() {
//!     let report = dashboard.select(&team)?;
//!     std::fs::write(report.file_name(), report.export()?)?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Header matching strategies
//!
//! - `exact`: a fixed list of header strings per team
//! - `keyword`: team name prefix plus case-insensitive metric keywords (default)
//! - `regex`: every header split into a team and a metric phrase
//!
//! A metric whose header cannot be found is left out and its chart panel shows
//! a placeholder; only a team without any matching header is an error.

mod helpers;

pub mod chart;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod logging;
pub mod metrics;
pub mod spreadsheet;

pub use config::Config;
pub use dashboard::{Dashboard, Report};
pub use error::{DashboardError, Result};
pub use helpers::xml::XmlError;
pub use metrics::Metric;
