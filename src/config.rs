// Configuration loading and parsing (contest.toml).

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use crate::import::parse_game_time;
use crate::pool::{ExclusionRule, Position, ALL_POSITIONS};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// Contest ruleset
// ---------------------------------------------------------------------------

/// Min/max selection count for a single position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PositionBound {
    pub min: u32,
    pub max: u32,
}

/// Static description of the contest ruleset: salary cap, roster size, and
/// per-position and combined-bucket count bounds.
#[derive(Debug, Clone)]
pub struct ContestRules {
    pub salary_cap: u32,
    pub roster_size: usize,
    /// Minimum combined PG+SG count.
    pub guards_min: u32,
    /// Minimum combined SF+PF count.
    pub forwards_min: u32,
    /// Per-position bounds, indexed by `Position::index()`.
    pub bounds: [PositionBound; 5],
}

impl ContestRules {
    pub fn bound(&self, pos: Position) -> PositionBound {
        self.bounds[pos.index()]
    }

    /// Check the ruleset for internal consistency. Infeasible-but-coherent
    /// rulesets (e.g. position minimums summing past the roster size) are
    /// not rejected here; the optimizer reports those as `Infeasible`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.salary_cap == 0 {
            return Err(ConfigError::ValidationError {
                field: "contest.salary_cap".to_string(),
                message: "salary cap must be positive".to_string(),
            });
        }
        if self.roster_size == 0 {
            return Err(ConfigError::ValidationError {
                field: "contest.roster_size".to_string(),
                message: "roster size must be positive".to_string(),
            });
        }
        for pos in ALL_POSITIONS {
            let bound = self.bound(pos);
            if bound.min > bound.max {
                return Err(ConfigError::ValidationError {
                    field: format!("contest.positions.{}", pos),
                    message: format!("min {} exceeds max {}", bound.min, bound.max),
                });
            }
        }
        if self.guards_min as usize > self.roster_size {
            return Err(ConfigError::ValidationError {
                field: "contest.guards_min".to_string(),
                message: "guard bucket minimum exceeds roster size".to_string(),
            });
        }
        if self.forwards_min as usize > self.roster_size {
            return Err(ConfigError::ValidationError {
                field: "contest.forwards_min".to_string(),
                message: "forward bucket minimum exceeds roster size".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for ContestRules {
    /// The reference contest ruleset: cap 200, roster 8,
    /// {PG:1-3, SG:1-3, SF:1-3, PF:1-3, C:1-2}, G>=3, F>=3.
    fn default() -> Self {
        ContestRules {
            salary_cap: 200,
            roster_size: 8,
            guards_min: 3,
            forwards_min: 3,
            bounds: [
                PositionBound { min: 1, max: 3 }, // PG
                PositionBound { min: 1, max: 3 }, // SG
                PositionBound { min: 1, max: 3 }, // SF
                PositionBound { min: 1, max: 3 }, // PF
                PositionBound { min: 1, max: 2 }, // C
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

/// Paths to the prepared input tables.
#[derive(Debug, Clone)]
pub struct DataPaths {
    /// The player export CSV for the contest date.
    pub players: String,
    /// Optional defense-versus-position table.
    pub dvp: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub rules: ContestRules,
    /// Players that must appear in the final lineup.
    pub locks: Vec<String>,
    pub exclusions: Vec<ExclusionRule>,
    pub data_paths: DataPaths,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            rules: ContestRules::default(),
            locks: Vec::new(),
            exclusions: Vec::new(),
            data_paths: DataPaths {
                players: "data/players.csv".to_string(),
                dvp: None,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// contest.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ContestFile {
    contest: Option<RawContest>,
    exclusions: Option<RawExclusions>,
    data: Option<RawData>,
}

#[derive(Debug, Deserialize)]
struct RawContest {
    salary_cap: Option<u32>,
    roster_size: Option<usize>,
    guards_min: Option<u32>,
    forwards_min: Option<u32>,
    #[serde(default)]
    locks: Vec<String>,
    #[serde(default)]
    positions: HashMap<String, PositionBound>,
}

#[derive(Debug, Default, Deserialize)]
struct RawExclusions {
    #[serde(default)]
    names: Vec<String>,
    #[serde(default)]
    time_slots: Vec<String>,
    #[serde(default)]
    injury_statuses: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawData {
    players: Option<String>,
    dvp: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG_PATH: &str = "contest.toml";

/// Load configuration from `contest.toml` in the working directory.
///
/// A missing file is not an error: the built-in reference ruleset is used
/// with a logged warning. A present-but-broken file is always a hard error.
pub fn load_config() -> Result<Config, ConfigError> {
    let path = Path::new(DEFAULT_CONFIG_PATH);
    if !path.exists() {
        warn!(
            "{} not found, using built-in contest rules",
            DEFAULT_CONFIG_PATH
        );
        return Ok(Config::default());
    }
    load_config_from(path)
}

/// Load configuration from an explicit path. The file must exist.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_config(&raw).map_err(|e| match e {
        ParseFailure::Toml(source) => ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        },
        ParseFailure::Config(err) => err,
    })
}

enum ParseFailure {
    Toml(toml::de::Error),
    Config(ConfigError),
}

impl From<ConfigError> for ParseFailure {
    fn from(err: ConfigError) -> Self {
        ParseFailure::Config(err)
    }
}

fn parse_config(raw: &str) -> Result<Config, ParseFailure> {
    let file: ContestFile = toml::from_str(raw).map_err(ParseFailure::Toml)?;

    let mut config = Config::default();

    if let Some(contest) = file.contest {
        if let Some(cap) = contest.salary_cap {
            config.rules.salary_cap = cap;
        }
        if let Some(size) = contest.roster_size {
            config.rules.roster_size = size;
        }
        if let Some(min) = contest.guards_min {
            config.rules.guards_min = min;
        }
        if let Some(min) = contest.forwards_min {
            config.rules.forwards_min = min;
        }
        for (pos_str, bound) in &contest.positions {
            let pos =
                Position::from_str_pos(pos_str).ok_or_else(|| ConfigError::ValidationError {
                    field: format!("contest.positions.{}", pos_str),
                    message: "unknown position".to_string(),
                })?;
            config.rules.bounds[pos.index()] = *bound;
        }
        config.locks = contest.locks;
    }

    if let Some(exclusions) = file.exclusions {
        for name in exclusions.names {
            config.exclusions.push(ExclusionRule::Name(name));
        }
        for slot in &exclusions.time_slots {
            let time = parse_game_time(slot).ok_or_else(|| ConfigError::ValidationError {
                field: "exclusions.time_slots".to_string(),
                message: format!("unparseable time slot '{}'", slot),
            })?;
            config.exclusions.push(ExclusionRule::TimeSlot(time));
        }
        for status in exclusions.injury_statuses {
            config.exclusions.push(ExclusionRule::InjuryStatus(status));
        }
    }

    if let Some(data) = file.data {
        if let Some(players) = data.players {
            config.data_paths.players = players;
        }
        config.data_paths.dvp = data.dvp;
    }

    config.rules.validate()?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn parse(raw: &str) -> Result<Config, ConfigError> {
        parse_config(raw).map_err(|e| match e {
            ParseFailure::Toml(source) => ConfigError::ParseError {
                path: PathBuf::from("<test>"),
                source,
            },
            ParseFailure::Config(err) => err,
        })
    }

    #[test]
    fn default_rules_are_the_reference_contest() {
        let rules = ContestRules::default();
        assert_eq!(rules.salary_cap, 200);
        assert_eq!(rules.roster_size, 8);
        assert_eq!(rules.guards_min, 3);
        assert_eq!(rules.forwards_min, 3);
        assert_eq!(rules.bound(Position::Center), PositionBound { min: 1, max: 2 });
        assert_eq!(
            rules.bound(Position::PointGuard),
            PositionBound { min: 1, max: 3 }
        );
        rules.validate().unwrap();
    }

    #[test]
    fn full_config_parses() {
        let raw = r#"
[contest]
salary_cap = 180
roster_size = 7
guards_min = 2
forwards_min = 2
locks = ["Nikola Jokic"]

[contest.positions]
PG = { min = 1, max = 2 }
C = { min = 1, max = 1 }

[exclusions]
names = ["Bad Pick"]
time_slots = ["7:30PM EDT"]
injury_statuses = ["INJ", "O"]

[data]
players = "pool.csv"
dvp = "dvp.csv"
"#;
        let config = parse(raw).unwrap();
        assert_eq!(config.rules.salary_cap, 180);
        assert_eq!(config.rules.roster_size, 7);
        assert_eq!(
            config.rules.bound(Position::PointGuard),
            PositionBound { min: 1, max: 2 }
        );
        // Unlisted positions keep the defaults.
        assert_eq!(
            config.rules.bound(Position::ShootingGuard),
            PositionBound { min: 1, max: 3 }
        );
        assert_eq!(config.locks, vec!["Nikola Jokic".to_string()]);
        assert_eq!(config.exclusions.len(), 4);
        assert!(config.exclusions.contains(&ExclusionRule::TimeSlot(
            NaiveTime::from_hms_opt(19, 30, 0).unwrap()
        )));
        assert_eq!(config.data_paths.players, "pool.csv");
        assert_eq!(config.data_paths.dvp.as_deref(), Some("dvp.csv"));
    }

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.rules.salary_cap, 200);
        assert!(config.locks.is_empty());
        assert!(config.exclusions.is_empty());
    }

    #[test]
    fn unknown_position_key_rejected() {
        let raw = r#"
[contest.positions]
QB = { min = 1, max = 2 }
"#;
        let err = parse(raw).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref field, .. }
            if field.contains("QB")));
    }

    #[test]
    fn min_above_max_rejected() {
        let raw = r#"
[contest.positions]
PG = { min = 3, max = 1 }
"#;
        let err = parse(raw).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref field, .. }
            if field.contains("PG")));
    }

    #[test]
    fn zero_roster_size_rejected() {
        let raw = "[contest]\nroster_size = 0\n";
        let err = parse(raw).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref field, .. }
            if field == "contest.roster_size"));
    }

    #[test]
    fn bucket_minimum_above_roster_rejected() {
        let raw = "[contest]\nroster_size = 5\nguards_min = 6\n";
        let err = parse(raw).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref field, .. }
            if field == "contest.guards_min"));
    }

    #[test]
    fn bad_time_slot_rejected() {
        let raw = "[exclusions]\ntime_slots = [\"sometime\"]\n";
        let err = parse(raw).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref field, .. }
            if field == "exclusions.time_slots"));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = parse("[contest\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }
}
