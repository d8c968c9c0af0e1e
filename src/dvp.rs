// Defense-versus-position adjustment.
//
// Loads a per-team, per-position table of fantasy production conceded (an
// "ease ranking" table, scraped upstream) and converts it into projection
// multipliers: a team conceding more than the league average at a position
// inflates the projection of opposing players at that position.

use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::warn;

use crate::pool::{Candidate, Position, ALL_POSITIONS};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DvpError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Raw CSV serde struct (private)
// ---------------------------------------------------------------------------

/// One DVP table row: fantasy production conceded per position. Some
/// sources prefix the team cell with "vs" ("vsBOS").
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct RawDvpRow {
    #[serde(rename = "Team")]
    team: String,
    #[serde(rename = "PG")]
    pg: f64,
    #[serde(rename = "SG")]
    sg: f64,
    #[serde(rename = "SF")]
    sf: f64,
    #[serde(rename = "PF")]
    pf: f64,
    #[serde(rename = "C")]
    c: f64,
    /// Absorb any extra columns the source includes.
    #[serde(flatten)]
    _extra: HashMap<String, serde_json::Value>,
}

// ---------------------------------------------------------------------------
// DvpTable
// ---------------------------------------------------------------------------

/// Per-team projection multipliers, normalized against the league mean for
/// each position column at load time.
#[derive(Debug, Clone)]
pub struct DvpTable {
    factors: HashMap<String, [f64; 5]>,
}

impl DvpTable {
    /// Load a DVP table from a CSV file with Team,PG,SG,SF,PF,C columns.
    pub fn load(path: &Path) -> Result<Self, DvpError> {
        let file = std::fs::File::open(path).map_err(|e| DvpError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_reader(file)
    }

    fn from_reader<R: Read>(rdr: R) -> Result<Self, DvpError> {
        let mut reader = csv::Reader::from_reader(rdr);
        let mut raw_values: HashMap<String, [f64; 5]> = HashMap::new();
        for result in reader.deserialize::<RawDvpRow>() {
            let raw = match result {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("skipping malformed DVP row: {}", e);
                    continue;
                }
            };
            let values = [raw.pg, raw.sg, raw.sf, raw.pf, raw.c];
            if values.iter().any(|v| !v.is_finite()) {
                warn!("skipping DVP row for '{}': non-finite value", raw.team);
                continue;
            }
            let team = normalize_team(&raw.team);
            if team.is_empty() {
                warn!("skipping DVP row with no team name");
                continue;
            }
            if raw_values.insert(team.clone(), values).is_some() {
                warn!("duplicate DVP row for '{}', using latest values", team);
            }
        }

        if raw_values.is_empty() {
            return Err(DvpError::Validation(
                "DVP table produced zero valid rows".into(),
            ));
        }

        // Normalize each position column against its league mean.
        let count = raw_values.len() as f64;
        let mut means = [0.0f64; 5];
        for values in raw_values.values() {
            for (mean, value) in means.iter_mut().zip(values) {
                *mean += value / count;
            }
        }

        let mut factors = HashMap::with_capacity(raw_values.len());
        for (team, values) in raw_values {
            let mut row = [1.0f64; 5];
            for pos in ALL_POSITIONS {
                let i = pos.index();
                if means[i] > 0.0 {
                    row[i] = values[i] / means[i];
                } else {
                    warn!("DVP column {} has non-positive mean, left unadjusted", pos);
                }
            }
            factors.insert(team, row);
        }

        Ok(DvpTable { factors })
    }

    /// The projection multiplier against `team` at `pos`, if known.
    pub fn factor(&self, team: &str, pos: Position) -> Option<f64> {
        self.factors
            .get(&normalize_team(team))
            .map(|row| row[pos.index()])
    }

    /// Scale each candidate's projection by its opponent's factor at its
    /// position. Candidates with no opponent, or an opponent missing from
    /// the table, are left unadjusted. Returns the number adjusted.
    pub fn adjust(&self, candidates: &mut [Candidate]) -> usize {
        let mut adjusted = 0;
        for candidate in candidates.iter_mut() {
            let Some(opponent) = candidate.opponent.as_deref() else {
                continue;
            };
            match self.factor(opponent, candidate.position) {
                Some(factor) => {
                    candidate.projected_points *= factor;
                    adjusted += 1;
                }
                None => {
                    warn!(
                        "no DVP entry for '{}' ({}'s opponent), left unadjusted",
                        opponent, candidate.name
                    );
                }
            }
        }
        adjusted
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }
}

/// Strip the "vs" prefix some sources put on the team cell and trim.
fn normalize_team(s: &str) -> String {
    let trimmed = s.trim();
    let stripped = trimmed
        .strip_prefix("vs")
        .or_else(|| trimmed.strip_prefix("VS"))
        .unwrap_or(trimmed);
    stripped.trim().to_uppercase()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
