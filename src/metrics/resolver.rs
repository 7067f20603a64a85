//! Header matching strategies.
//!
//! Sheet headers are written by hand and drift between uploads, so every
//! strategy resolves partially: a canonical metric without a matching header
//! is left out of the mapping, never reported as an error. Only a team with no
//! matching header at all is an error, see [`MetricResolver::resolve_team`].
use crate::config::{Config, ConfigError};
use crate::metrics::Metric;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use thiserror::Error;

/// Canonical metric to raw sheet label.
pub type ColumnMapping = BTreeMap<Metric, String>;

#[derive(Error, Debug, PartialEq)]
pub enum ResolveError {
    #[error("No columns found for team '{0}'")]
    NoTeamColumns(String),
}

/// Resolver strategy names, as used in the config file and on the command line.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Fixed per-team list of exact header strings
    Exact,
    /// Team prefix plus case-insensitive metric keywords
    #[default]
    Keyword,
    /// Team and metric phrase split out of each header
    Regex,
}

impl Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Strategy::Exact => "exact",
            Strategy::Keyword => "keyword",
            Strategy::Regex => "regex",
        })
    }
}

/// Maps raw sheet labels to canonical metrics for one team.
pub trait MetricResolver {
    /// Teams offered for selection.
    fn teams(&self, labels: &[String]) -> Vec<String>;

    /// Resolves as many canonical metrics as the labels allow.
    fn resolve(&self, team: &str, labels: &[String]) -> ColumnMapping;

    /// Like [`MetricResolver::resolve`], but a team without any column is an error.
    fn resolve_team(&self, team: &str, labels: &[String]) -> Result<ColumnMapping, ResolveError> {
        let mapping = self.resolve(team, labels);
        if mapping.is_empty() {
            Err(ResolveError::NoTeamColumns(team.to_owned()))
        } else {
            Ok(mapping)
        }
    }
}

/// Exact header strings for one team; position `i` holds `Metric::CANONICAL[i]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExactTeam {
    pub name: String,
    pub headers: Vec<String>,
}

/// Include/exclude keywords that pick one metric out of a team's headers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub metric: Metric,
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl KeywordRule {
    pub fn new(metric: Metric, include: &[&str], exclude: &[&str]) -> Self {
        KeywordRule {
            metric,
            include: include.iter().map(|keyword| keyword.to_string()).collect(),
            exclude: exclude.iter().map(|keyword| keyword.to_string()).collect(),
        }
    }

    fn matches(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.include.iter().any(|keyword| text.contains(&keyword.to_lowercase()))
            && !self.exclude.iter().any(|keyword| text.contains(&keyword.to_lowercase()))
    }
}

/// A metric phrase as written after the team name, and its canonical metric.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhraseRule {
    pub phrase: String,
    pub metric: Metric,
}

impl PhraseRule {
    pub fn new(phrase: &str, metric: Metric) -> Self {
        PhraseRule {
            phrase: phrase.to_owned(),
            metric,
        }
    }
}

/// Looks up each header of a fixed per-team list.
#[derive(Clone, Debug)]
pub struct ExactListResolver {
    teams: Vec<ExactTeam>,
}

impl ExactListResolver {
    pub fn new(teams: Vec<ExactTeam>) -> Self {
        ExactListResolver { teams }
    }
}

impl MetricResolver for ExactListResolver {
    fn teams(&self, _labels: &[String]) -> Vec<String> {
        self.teams.iter().map(|team| team.name.to_owned()).collect()
    }

    fn resolve(&self, team: &str, labels: &[String]) -> ColumnMapping {
        let mut mapping = ColumnMapping::new();
        let Some(entry) = self.teams.iter().find(|entry| entry.name == team) else {
            debug!("Team '{}' has no exact header list", team);
            return mapping;
        };
        for (metric, header) in Metric::CANONICAL.iter().zip(&entry.headers) {
            let header = header.trim();
            if header.is_empty() {
                continue;
            }
            match labels.iter().find(|label| label.as_str() == header) {
                Some(label) => {
                    mapping.insert(*metric, label.to_owned());
                }
                None => debug!("Header '{}' for {} not in sheet, metric omitted", header, metric),
            }
        }
        mapping
    }
}

/// Selects a team's headers by prefix, then each metric by keyword.
#[derive(Clone, Debug)]
pub struct KeywordResolver {
    teams: Vec<String>,
    rules: Vec<KeywordRule>,
}

impl KeywordResolver {
    pub fn new(teams: Vec<String>, rules: Vec<KeywordRule>) -> Self {
        KeywordResolver { teams, rules }
    }

    /// The part of `label` after the team name, when the label belongs to `team`.
    fn metric_part<'a>(team: &str, label: &'a str) -> Option<&'a str> {
        let rest = label.strip_prefix(team)?;
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            Some(rest)
        } else {
            None
        }
    }
}

impl MetricResolver for KeywordResolver {
    fn teams(&self, _labels: &[String]) -> Vec<String> {
        self.teams.clone()
    }

    fn resolve(&self, team: &str, labels: &[String]) -> ColumnMapping {
        let team_columns: Vec<(&String, &str)> = labels
            .iter()
            .filter_map(|label| Some((label, Self::metric_part(team, label)?)))
            .collect();
        debug!("Team '{}' owns {} column(s)", team, team_columns.len());

        let mut mapping = ColumnMapping::new();
        for rule in &self.rules {
            if mapping.contains_key(&rule.metric) {
                continue;
            }
            match team_columns.iter().find(|(_, rest)| rule.matches(rest)) {
                Some((label, _)) => {
                    mapping.insert(rule.metric, label.to_string());
                }
                None => debug!("No header of team '{}' matches {:?} for {}", team, rule.include, rule.metric),
            }
        }
        mapping
    }
}

/// Splits every header into a (team, metric phrase) pair.
#[derive(Clone, Debug)]
pub struct RegexPairResolver {
    pattern: Regex,
    phrases: Vec<(String, Metric)>,
}

impl RegexPairResolver {
    /// Compiles the header pattern from the phrase table.
    ///
    /// A header is `<team><1-2 spaces><phrase>[ (<unit>)]`; the team is the
    /// shortest prefix after which the rest is a known phrase.
    pub fn new(rules: &[PhraseRule]) -> Result<Self, regex::Error> {
        let mut phrases: Vec<(String, Metric)> = rules
            .iter()
            .map(|rule| (normalize_phrase(&rule.phrase), rule.metric))
            .filter(|(phrase, _)| !phrase.is_empty())
            .collect();
        phrases.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()));
        let alternatives = phrases
            .iter()
            .map(|(phrase, _)| phrase.split(' ').map(regex::escape).collect::<Vec<_>>().join(r"\s+"))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(
            r"(?i)^(?P<team>.*?\S)\s{{1,2}}(?P<metric>(?:{alternatives})(?:\s*\([^()]*\))?)\s*$"
        ))?;
        Ok(RegexPairResolver { pattern, phrases })
    }

    /// Parses one header into its (team, metric phrase) pair.
    pub fn parse_header<'a>(&self, header: &'a str) -> Option<(&'a str, &'a str)> {
        let captures = self.pattern.captures(header)?;
        Some((captures.name("team")?.as_str().trim(), captures.name("metric")?.as_str()))
    }

    /// team -> {metric phrase -> column}, teams in first-appearance order.
    pub fn pairs<'a>(&self, labels: &'a [String]) -> Vec<(String, Vec<(String, &'a String)>)> {
        let mut teams: Vec<(String, Vec<(String, &'a String)>)> = Vec::new();
        for label in labels {
            let Some((team, phrase)) = self.parse_header(label) else {
                debug!("Header '{}' is not a team metric", label);
                continue;
            };
            let position = match teams.iter().position(|(name, _)| name == team) {
                Some(position) => position,
                None => {
                    teams.push((team.to_owned(), Vec::new()));
                    teams.len() - 1
                }
            };
            teams[position].1.push((phrase.to_owned(), label));
        }
        teams
    }

    fn lookup(&self, phrase: &str) -> Option<Metric> {
        let phrase = normalize_phrase(phrase);
        self.phrases
            .iter()
            .find(|(known, _)| *known == phrase)
            .map(|(_, metric)| *metric)
    }
}

impl MetricResolver for RegexPairResolver {
    fn teams(&self, labels: &[String]) -> Vec<String> {
        self.pairs(labels).into_iter().map(|(team, _)| team).collect()
    }

    fn resolve(&self, team: &str, labels: &[String]) -> ColumnMapping {
        let mut mapping = ColumnMapping::new();
        let Some((_, columns)) = self.pairs(labels).into_iter().find(|(name, _)| name == team) else {
            return mapping;
        };
        for (phrase, label) in columns {
            match self.lookup(&phrase) {
                Some(metric) if !mapping.contains_key(&metric) => {
                    mapping.insert(metric, label.to_owned());
                }
                Some(metric) => debug!("Header '{}' repeats {}, ignored", label, metric),
                None => debug!("Metric phrase '{}' has no canonical name, dropped", phrase),
            }
        }
        mapping
    }
}

/// Lowercases, collapses whitespace and drops a trailing parenthetical unit.
fn normalize_phrase(phrase: &str) -> String {
    let phrase = phrase.trim();
    let phrase = match (phrase.ends_with(')'), phrase.rfind('(')) {
        (true, Some(open)) if open > 0 => &phrase[..open],
        _ => phrase,
    };
    phrase.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// The configured strategy, ready to resolve.
#[derive(Clone, Debug)]
pub enum Resolver {
    ExactList(ExactListResolver),
    Keyword(KeywordResolver),
    RegexPair(RegexPairResolver),
}

impl Resolver {
    /// Builds the strategy selected by `config` from its tables.
    pub fn from_config(config: &Config) -> Result<Resolver, ConfigError> {
        config.validate()?;
        let resolver = match config.strategy() {
            Strategy::Exact => Resolver::ExactList(ExactListResolver::new(config.exact_teams())),
            Strategy::Keyword => Resolver::Keyword(KeywordResolver::new(config.team_names(), config.keyword_rules())),
            Strategy::Regex => Resolver::RegexPair(RegexPairResolver::new(&config.phrase_rules())?),
        };
        debug!("Resolving headers with the {} strategy", resolver.strategy());
        Ok(resolver)
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            Resolver::ExactList(_) => Strategy::Exact,
            Resolver::Keyword(_) => Strategy::Keyword,
            Resolver::RegexPair(_) => Strategy::Regex,
        }
    }

    fn inner(&self) -> &dyn MetricResolver {
        match self {
            Resolver::ExactList(resolver) => resolver,
            Resolver::Keyword(resolver) => resolver,
            Resolver::RegexPair(resolver) => resolver,
        }
    }
}

impl MetricResolver for Resolver {
    fn teams(&self, labels: &[String]) -> Vec<String> {
        self.inner().teams(labels)
    }

    fn resolve(&self, team: &str, labels: &[String]) -> ColumnMapping {
        self.inner().resolve(team, labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn sample_labels() -> Vec<String> {
        labels(&[
            "Agency Velocity",
            "Agency Billable TS",
            "Agency Non-Billable TS",
            "Agency Bugs created",
            "Agency Bugs closed",
            "Agency # Releases in Prod",
            "Agency SP to Hour Ratio",
            "Production Systems Velocity",
            "Production Systems  # Releases in Prod",
            "TPS & DP Velocity (SP)",
            "TPS & DP Billable TS",
            "TPS & DP Story Count",
        ])
    }

    fn mapping(pairs: &[(Metric, &str)]) -> ColumnMapping {
        pairs.iter().map(|(metric, label)| (*metric, label.to_string())).collect()
    }

    #[test]
    fn exact_list_resolves_by_position() {
        let resolver = ExactListResolver::new(Config::default().exact_teams());
        let result = resolver.resolve("Agency", &sample_labels());
        assert_eq!(result.len(), 7);
        assert_eq!(result[&Metric::Releases], "Agency # Releases in Prod");
        assert_eq!(result[&Metric::SpPerHour], "Agency SP to Hour Ratio");
    }

    #[test]
    fn exact_list_omits_missing_headers() {
        let resolver = ExactListResolver::new(Config::default().exact_teams());
        let result = resolver.resolve("Production Systems", &sample_labels());
        assert_eq!(
            result,
            mapping(&[
                (Metric::Velocity, "Production Systems Velocity"),
                (Metric::Releases, "Production Systems  # Releases in Prod"),
            ])
        );
        assert!(resolver.resolve("Unknown", &sample_labels()).is_empty());
        assert_eq!(resolver.teams(&[]), vec!["Agency", "Production Systems", "TPS & DP"]);
    }

    #[test]
    fn keyword_prefers_billable_over_non_billable() {
        let config = Config::default();
        let resolver = KeywordResolver::new(config.team_names(), config.keyword_rules());
        let labels = labels(&["Agency Non-Billable TS", "Agency Billable TS", "Agency Investment"]);
        let result = resolver.resolve("Agency", &labels);
        assert_eq!(result[&Metric::BillableTs], "Agency Billable TS");
        assert_eq!(result[&Metric::NonBillableTs], "Agency Non-Billable TS");
    }

    #[test]
    fn keyword_matches_case_insensitively_within_team() {
        let config = Config::default();
        let resolver = KeywordResolver::new(config.team_names(), config.keyword_rules());
        let result = resolver.resolve("Agency", &sample_labels());
        assert_eq!(result.len(), 7);
        assert_eq!(result[&Metric::BugsCreated], "Agency Bugs created");

        let result = resolver.resolve("TPS & DP", &sample_labels());
        assert_eq!(
            result,
            mapping(&[(Metric::Velocity, "TPS & DP Velocity (SP)"), (Metric::BillableTs, "TPS & DP Billable TS")])
        );
    }

    #[test]
    fn keyword_requires_team_name_boundary() {
        let rules = vec![KeywordRule::new(Metric::Velocity, &["velocity"], &[])];
        let resolver = KeywordResolver::new(vec!["Agency".to_owned()], rules);
        assert!(resolver.resolve("Agency", &labels(&["AgencyX Velocity"])).is_empty());
        assert_eq!(
            resolver.resolve_team("Agency", &labels(&["AgencyX Velocity"])),
            Err(ResolveError::NoTeamColumns("Agency".to_owned()))
        );
    }

    #[test]
    fn regex_parses_team_and_phrase() {
        let resolver = RegexPairResolver::new(&Config::default().phrase_rules()).unwrap();
        assert_eq!(resolver.parse_header("Agency Velocity"), Some(("Agency", "Velocity")));
        assert_eq!(
            resolver.parse_header("Production Systems  # Releases in Prod"),
            Some(("Production Systems", "# Releases in Prod"))
        );
        assert_eq!(resolver.parse_header("TPS & DP Velocity (SP)"), Some(("TPS & DP", "Velocity (SP)")));
        assert_eq!(resolver.parse_header("Ops (EU) Bugs closed"), Some(("Ops (EU)", "Bugs closed")));
        assert_eq!(resolver.parse_header("Velocity"), None);
        assert_eq!(resolver.parse_header("Agency Story Count"), None);
    }

    #[test]
    fn regex_discovers_teams_in_order() {
        let resolver = RegexPairResolver::new(&Config::default().phrase_rules()).unwrap();
        assert_eq!(resolver.teams(&sample_labels()), vec!["Agency", "Production Systems", "TPS & DP"]);
    }

    #[test]
    fn regex_resolves_through_phrase_table() {
        let resolver = RegexPairResolver::new(&Config::default().phrase_rules()).unwrap();
        let result = resolver.resolve("TPS & DP", &sample_labels());
        assert_eq!(
            result,
            mapping(&[(Metric::Velocity, "TPS & DP Velocity (SP)"), (Metric::BillableTs, "TPS & DP Billable TS")])
        );
        assert_eq!(resolver.resolve("Agency", &sample_labels()).len(), 7);
        assert!(resolver.resolve("Nobody", &sample_labels()).is_empty());
    }

    #[test]
    fn resolver_dispatches_to_strategy() {
        let config = Config::default();
        let resolver = Resolver::RegexPair(RegexPairResolver::new(&config.phrase_rules()).unwrap());
        assert_eq!(resolver.strategy(), Strategy::Regex);
        assert_eq!(resolver.resolve_team("Agency", &sample_labels()).unwrap().len(), 7);
    }

    #[test]
    fn resolver_from_config() {
        let mut config = Config::default();
        for strategy in [Strategy::Exact, Strategy::Keyword, Strategy::Regex] {
            config.strategy = Some(strategy);
            let resolver = Resolver::from_config(&config).unwrap();
            assert_eq!(resolver.strategy(), strategy);
            assert_eq!(resolver.teams(&sample_labels()), vec!["Agency", "Production Systems", "TPS & DP"]);
            assert_eq!(resolver.resolve("Agency", &sample_labels()).len(), 7);
        }
    }

    #[test]
    fn normalize_phrase_strips_units() {
        assert_eq!(normalize_phrase("  Velocity   (SP) "), "velocity");
        assert_eq!(normalize_phrase("SP to  Hour Ratio"), "sp to hour ratio");
        assert_eq!(normalize_phrase("(SP)"), "(sp)");
    }
}
