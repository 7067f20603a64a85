//! Loads a metrics workbook once and runs the resolve, build, render and export
//! steps for every team selection.
use crate::chart::{self, Figure};
use crate::config::Config;
use crate::error::Result;
use crate::export;
use crate::metrics::raw::RawSheet;
use crate::metrics::resolver::{MetricResolver, Resolver};
use crate::metrics::table::MetricTable;
use crate::spreadsheet::Workbook;
use log::info;
use std::path::{Path, PathBuf};

/// A loaded metrics sheet together with the configured header resolver.
///
/// The sheet is never modified; each selection rebuilds its table from it.
pub struct Dashboard {
    sheet: RawSheet,
    resolver: Resolver,
    size: (u32, u32),
}

impl Dashboard {
    pub fn new(sheet: RawSheet, config: &Config) -> Result<Dashboard> {
        let resolver = Resolver::from_config(config)?;
        Ok(Dashboard {
            sheet,
            resolver,
            size: config.figure_size(),
        })
    }

    /// Reads the first worksheet of the workbook at `path`.
    pub fn load<P: AsRef<Path>>(path: P, config: &Config) -> Result<Dashboard> {
        let mut workbook = Workbook::open(path)?;
        Self::from_workbook(&mut workbook, config)
    }

    /// Reads the first worksheet of an uploaded workbook.
    pub fn from_bytes(name: &str, bytes: Vec<u8>, config: &Config) -> Result<Dashboard> {
        let mut workbook = Workbook::from_bytes(name, bytes)?;
        Self::from_workbook(&mut workbook, config)
    }

    fn from_workbook(workbook: &mut Workbook, config: &Config) -> Result<Dashboard> {
        let sheet = RawSheet::from_sheet(&workbook.first_sheet()?)?;
        info!(
            "Loaded '{}': {} sprint(s), {} metric label(s)",
            workbook.name(),
            sheet.sprints().len(),
            sheet.labels().len()
        );
        Self::new(sheet, config)
    }

    pub fn sheet(&self) -> &RawSheet {
        &self.sheet
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Teams offered for selection.
    pub fn teams(&self) -> Vec<String> {
        self.resolver.teams(self.sheet.labels())
    }

    /// Resolves the team's columns and builds its metric table.
    pub fn table(&self, team: &str) -> Result<MetricTable> {
        let team = team.trim();
        let mapping = self.resolver.resolve_team(team, self.sheet.labels())?;
        info!("Resolved {} metric(s) for '{}'", mapping.len(), team);
        Ok(MetricTable::build(team, &mapping, &self.sheet)?)
    }

    /// Runs one full cycle for `team`, up to the rendered figure.
    pub fn select(&self, team: &str) -> Result<Report> {
        let table = self.table(team)?;
        let figure = chart::render(&table, table.team());
        Ok(Report {
            table,
            figure,
            size: self.size,
        })
    }
}

/// The dashboard of one team, ready to export.
#[derive(Clone, Debug)]
pub struct Report {
    pub table: MetricTable,
    pub figure: Figure,
    size: (u32, u32),
}

impl Report {
    pub fn team(&self) -> &str {
        self.table.team()
    }

    /// Single-page PDF bytes.
    pub fn export(&self) -> Result<Vec<u8>> {
        export::export(&self.figure, self.size)
    }

    /// SVG preview of the same figure.
    pub fn svg(&self) -> Result<String> {
        Ok(chart::render_svg(&self.figure, self.size)?)
    }

    pub fn file_name(&self) -> String {
        export::report_file_name(self.team())
    }

    /// Exports the PDF into `dir` and returns its path.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let bytes = self.export()?;
        Ok(export::write_report(dir, self.team(), &bytes)?)
    }
}
