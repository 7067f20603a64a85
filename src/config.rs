use crate::chart::DEFAULT_SIZE;
use crate::metrics::resolver::{ExactTeam, KeywordRule, PhraseRule, Strategy};
use crate::metrics::Metric;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name searched in the working directory and its parents.
pub const CONFIG_FILE_NAME: &str = ".team-dashboard.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Exact header list of team '{team}' has {count} entries, at most 7 are allowed")]
    TooManyHeaders { team: String, count: usize },

    #[error("Keyword rule for {0} has no include keywords")]
    EmptyKeywordRule(Metric),

    #[error("Invalid metric phrase table: {0}")]
    InvalidPhrases(#[from] regex::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Header matching strategy
    pub strategy: Option<Strategy>,

    /// Teams offered by the exact-list and keyword strategies
    pub teams: Option<Vec<String>>,

    /// Exact-list strategy: per-team header strings in canonical metric order
    pub exact: Option<Vec<ExactTeam>>,

    /// Keyword strategy: one rule per canonical metric
    pub keywords: Option<Vec<KeywordRule>>,

    /// Regex-pair strategy: metric phrase lookup table
    pub phrases: Option<Vec<PhraseRule>>,

    /// Directory reports are written to
    pub output_dir: Option<PathBuf>,

    /// Figure width in pixels
    pub width: Option<u32>,

    /// Figure height in pixels
    pub height: Option<u32>,

    /// Enable verbose logging
    pub verbose: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strategy: Some(Strategy::default()),
            teams: Some(default_teams()),
            exact: Some(default_exact_teams()),
            keywords: Some(default_keyword_rules()),
            phrases: Some(default_phrase_rules()),
            output_dir: Some(PathBuf::from(".")),
            width: Some(DEFAULT_SIZE.0),
            height: Some(DEFAULT_SIZE.1),
            verbose: Some(false),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        debug!("Loaded config from '{}'", path.display());
        Ok(config)
    }

    /// Try to find and load a config file in standard locations
    pub fn load_from_standard_locations() -> Self {
        Self::load_from_dir(Path::new("."))
    }

    /// Looks for the config file in `dir` and up to three parent directories.
    pub fn load_from_dir(dir: &Path) -> Self {
        let mut candidate = dir.to_path_buf();
        for _ in 0..=3 {
            let path = candidate.join(CONFIG_FILE_NAME);
            if path.is_file() {
                match Self::load_from_file(&path) {
                    Ok(config) => return config,
                    Err(error) => warn!("Ignoring config file: {}", error),
                }
            }
            candidate.push("..");
        }
        Self::default()
    }

    /// Checks what the types alone cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for team in self.exact.iter().flatten() {
            if team.headers.len() > Metric::CANONICAL.len() {
                return Err(ConfigError::TooManyHeaders {
                    team: team.name.to_owned(),
                    count: team.headers.len(),
                });
            }
        }
        for rule in self.keywords.iter().flatten() {
            if rule.include.iter().all(|keyword| keyword.trim().is_empty()) {
                return Err(ConfigError::EmptyKeywordRule(rule.metric));
            }
        }
        Ok(())
    }

    /// Merge this config with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&mut self, cli_config: &CliConfig) {
        if let Some(strategy) = cli_config.strategy {
            self.strategy = Some(strategy);
        }
        if let Some(ref output_dir) = cli_config.output_dir {
            self.output_dir = Some(output_dir.clone());
        }
        if cli_config.verbose {
            self.verbose = Some(true);
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy.unwrap_or_default()
    }

    /// Configured teams, else the exact-list team names, else the built-in teams.
    pub fn team_names(&self) -> Vec<String> {
        match (&self.teams, &self.exact) {
            (Some(teams), _) => teams.clone(),
            (None, Some(exact)) => exact.iter().map(|team| team.name.to_owned()).collect(),
            (None, None) => default_teams(),
        }
    }

    pub fn exact_teams(&self) -> Vec<ExactTeam> {
        self.exact.clone().unwrap_or_else(default_exact_teams)
    }

    pub fn keyword_rules(&self) -> Vec<KeywordRule> {
        self.keywords.clone().unwrap_or_else(default_keyword_rules)
    }

    pub fn phrase_rules(&self) -> Vec<PhraseRule> {
        self.phrases.clone().unwrap_or_else(default_phrase_rules)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Figure size in pixels
    pub fn figure_size(&self) -> (u32, u32) {
        (self.width.unwrap_or(DEFAULT_SIZE.0), self.height.unwrap_or(DEFAULT_SIZE.1))
    }
}

/// Configuration options that can come from CLI
#[derive(Debug, Default)]
pub struct CliConfig {
    pub strategy: Option<Strategy>,
    pub output_dir: Option<PathBuf>,
    pub verbose: bool,
}

fn default_teams() -> Vec<String> {
    ["Agency", "Production Systems", "TPS & DP"].iter().map(|team| team.to_string()).collect()
}

fn default_exact_teams() -> Vec<ExactTeam> {
    default_teams()
        .into_iter()
        .map(|team| {
            // the Production Systems sheets carry a double space before the releases column
            let releases_gap = if team == "Production Systems" { "  " } else { " " };
            let headers = vec![
                format!("{team} Velocity"),
                format!("{team} Billable TS"),
                format!("{team} Non-Billable TS"),
                format!("{team} Bugs created"),
                format!("{team} Bugs closed"),
                format!("{team}{releases_gap}# Releases in Prod"),
                format!("{team} SP to Hour Ratio"),
            ];
            ExactTeam { name: team, headers }
        })
        .collect()
}

fn default_keyword_rules() -> Vec<KeywordRule> {
    vec![
        KeywordRule::new(Metric::Velocity, &["velocity"], &[]),
        KeywordRule::new(Metric::BillableTs, &["billable"], &["non-billable", "non billable"]),
        KeywordRule::new(Metric::NonBillableTs, &["non-billable", "non billable", "investment"], &[]),
        KeywordRule::new(Metric::BugsCreated, &["bugs created"], &[]),
        KeywordRule::new(Metric::BugsClosed, &["bugs closed"], &[]),
        KeywordRule::new(Metric::Releases, &["releases"], &[]),
        KeywordRule::new(Metric::SpPerHour, &["sp to hour", "sp/hour", "sp per hour"], &[]),
    ]
}

fn default_phrase_rules() -> Vec<PhraseRule> {
    vec![
        PhraseRule::new("Velocity", Metric::Velocity),
        PhraseRule::new("Billable TS", Metric::BillableTs),
        PhraseRule::new("Billable Hours", Metric::BillableTs),
        PhraseRule::new("Non-Billable TS", Metric::NonBillableTs),
        PhraseRule::new("Non Billable TS", Metric::NonBillableTs),
        PhraseRule::new("Investment TS", Metric::NonBillableTs),
        PhraseRule::new("Bugs created", Metric::BugsCreated),
        PhraseRule::new("# Bugs created", Metric::BugsCreated),
        PhraseRule::new("Bugs closed", Metric::BugsClosed),
        PhraseRule::new("# Bugs closed", Metric::BugsClosed),
        PhraseRule::new("# Releases in Prod", Metric::Releases),
        PhraseRule::new("Releases in Prod", Metric::Releases),
        PhraseRule::new("Releases", Metric::Releases),
        PhraseRule::new("SP to Hour Ratio", Metric::SpPerHour),
        PhraseRule::new("SP/Hour", Metric::SpPerHour),
    ]
}
