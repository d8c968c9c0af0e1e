// Player export loading and normalization.
//
// Reads a DFS player-export CSV for the contest date: one row per eligible
// player-slot with position, salary, projected fantasy points, and game
// metadata. The Yahoo export splits the name across First Name/Last Name
// columns; a single Name column is accepted as well.

use chrono::NaiveTime;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::warn;

use crate::pool::{Candidate, Position};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Raw CSV serde struct (private)
// ---------------------------------------------------------------------------

/// One row of the player export. Salary and FPPG are f64 because the export
/// writes them as floats. Extra columns are silently absorbed via
/// `#[serde(flatten)]`.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct RawExportRow {
    #[serde(rename = "First Name", default)]
    first_name: String,
    #[serde(rename = "Last Name", default)]
    last_name: String,
    /// Combined name column, used when the split columns are absent.
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(rename = "Position")]
    position: String,
    #[serde(rename = "Team", default)]
    team: String,
    #[serde(rename = "Opponent", default)]
    opponent: Option<String>,
    #[serde(rename = "Time", default)]
    time: Option<String>,
    #[serde(rename = "Salary")]
    salary: f64,
    #[serde(rename = "FPPG")]
    fppg: f64,
    #[serde(rename = "Injury Status", default)]
    injury_status: Option<String>,
    /// Absorb any extra columns the export includes.
    #[serde(flatten)]
    _extra: HashMap<String, serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse an export game time like "7:30PM EDT" or "19:30".
///
/// The timezone suffix is dropped: all games on a slate are quoted in the
/// same zone, and time slots are only ever compared for equality.
pub fn parse_game_time(s: &str) -> Option<NaiveTime> {
    let token = s.split_whitespace().next()?.to_uppercase();
    NaiveTime::parse_from_str(&token, "%I:%M%p")
        .or_else(|_| NaiveTime::parse_from_str(&token, "%H:%M"))
        .ok()
}

fn none_if_blank(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

// ---------------------------------------------------------------------------
// Reader-based loader (private, enables testing without temp files)
// ---------------------------------------------------------------------------

fn load_candidates_from_reader<R: Read>(rdr: R) -> Result<Vec<Candidate>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut candidates = Vec::new();
    for result in reader.deserialize::<RawExportRow>() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping malformed export row: {}", e);
                continue;
            }
        };

        let name = match none_if_blank(raw.name) {
            Some(name) => name,
            None => format!("{} {}", raw.first_name.trim(), raw.last_name.trim())
                .trim()
                .to_string(),
        };
        if name.is_empty() {
            warn!("skipping export row with no player name");
            continue;
        }

        let position = match Position::from_str_pos(&raw.position) {
            Some(pos) => pos,
            None => {
                warn!("skipping '{}': unknown position '{}'", name, raw.position);
                continue;
            }
        };

        if !raw.fppg.is_finite() || raw.fppg < 0.0 {
            warn!("skipping '{}': bad FPPG value {}", name, raw.fppg);
            continue;
        }

        if !raw.salary.is_finite() || raw.salary.round() < 1.0 {
            warn!("skipping '{}': bad salary value {}", name, raw.salary);
            continue;
        }

        let game_time = raw.time.as_deref().and_then(|t| {
            let parsed = parse_game_time(t);
            if parsed.is_none() && !t.trim().is_empty() {
                warn!("'{}': unparseable game time '{}'", name, t);
            }
            parsed
        });

        candidates.push(Candidate {
            name,
            team: raw.team.trim().to_string(),
            opponent: none_if_blank(raw.opponent),
            position,
            salary: raw.salary.round() as u32,
            projected_points: raw.fppg,
            game_time,
            injury_status: none_if_blank(raw.injury_status),
            eligible: true,
        });
    }
    Ok(candidates)
}

// ---------------------------------------------------------------------------
// Public path-based loader
// ---------------------------------------------------------------------------

/// Load the player export from a CSV file.
///
/// Malformed rows, unknown positions, and bad numeric values are skipped
/// with a warning; an export that produces zero valid candidates is an
/// error.
pub fn load_player_export(path: &Path) -> Result<Vec<Candidate>, ImportError> {
    let file = std::fs::File::open(path).map_err(|e| ImportError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let candidates = load_candidates_from_reader(file).map_err(|e| ImportError::Csv {
        path: path.display().to_string(),
        source: e,
    })?;
    if candidates.is_empty() {
        return Err(ImportError::Validation(format!(
            "player export {} produced zero valid candidates",
            path.display()
        )));
    }
    Ok(candidates)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_roundtrip() {
        let csv_data = "\
First Name,Last Name,Position,Team,Opponent,Time,Salary,FPPG,Injury Status
Stephen,Curry,PG,GSW,LAL,7:30PM EDT,46.0,48.2,
Anthony,Davis,C,LAL,GSW,7:30PM EDT,43.0,51.7,Q";

        let pool = load_candidates_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(pool.len(), 2);

        assert_eq!(pool[0].name, "Stephen Curry");
        assert_eq!(pool[0].team, "GSW");
        assert_eq!(pool[0].opponent.as_deref(), Some("LAL"));
        assert_eq!(pool[0].position, Position::PointGuard);
        assert_eq!(pool[0].salary, 46);
        assert!((pool[0].projected_points - 48.2).abs() < f64::EPSILON);
        assert_eq!(
            pool[0].game_time,
            Some(NaiveTime::from_hms_opt(19, 30, 0).unwrap())
        );
        assert_eq!(pool[0].injury_status, None);
        assert!(pool[0].eligible);

        assert_eq!(pool[1].name, "Anthony Davis");
        assert_eq!(pool[1].position, Position::Center);
        assert_eq!(pool[1].injury_status.as_deref(), Some("Q"));
    }

    #[test]
    fn combined_name_column_accepted() {
        let csv_data = "\
Name,Position,Team,Salary,FPPG
Nikola Jokic,C,DEN,55.0,62.1";

        let pool = load_candidates_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].name, "Nikola Jokic");
    }

    #[test]
    fn fractional_salary_rounded() {
        let csv_data = "\
Name,Position,Team,Salary,FPPG
A Player,PG,BOS,24.6,30.0";

        let pool = load_candidates_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(pool[0].salary, 25);
    }

    #[test]
    fn unknown_position_skipped() {
        let csv_data = "\
Name,Position,Team,Salary,FPPG
Valid Guard,PG,BOS,20.0,30.0
Football Guy,QB,NE,20.0,30.0
Valid Center,C,DEN,20.0,30.0";

        let pool = load_candidates_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool[0].name, "Valid Guard");
        assert_eq!(pool[1].name, "Valid Center");
    }

    #[test]
    fn bad_fppg_skipped() {
        let csv_data = "\
Name,Position,Team,Salary,FPPG
Valid,PG,BOS,20.0,30.0
NaN Player,PG,BOS,20.0,NaN
Negative Player,PG,BOS,20.0,-5.0";

        let pool = load_candidates_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].name, "Valid");
    }

    #[test]
    fn zero_salary_skipped() {
        let csv_data = "\
Name,Position,Team,Salary,FPPG
Free Player,PG,BOS,0.0,30.0";

        let pool = load_candidates_from_reader(csv_data.as_bytes()).unwrap();
        assert!(pool.is_empty());
    }

    #[test]
    fn malformed_row_skipped() {
        let csv_data = "\
Name,Position,Team,Salary,FPPG
Valid,PG,BOS,20.0,30.0
Broken,PG,BOS,not_a_number,30.0
Also Valid,C,DEN,25.0,40.0";

        let pool = load_candidates_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool[1].name, "Also Valid");
    }

    #[test]
    fn extra_columns_ignored() {
        let csv_data = "\
Name,Position,Team,Salary,FPPG,Starting,Game,ID
Valid,PG,BOS,20.0,30.0,Yes,BOS@NYK,12345";

        let pool = load_candidates_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].name, "Valid");
    }

    #[test]
    fn names_trimmed() {
        let csv_data = "\
First Name,Last Name,Position,Team,Salary,FPPG
  Stephen , Curry ,PG, GSW ,46.0,48.2";

        let pool = load_candidates_from_reader(csv_data.as_bytes()).unwrap();
        assert_eq!(pool[0].name, "Stephen Curry");
        assert_eq!(pool[0].team, "GSW");
    }

    #[test]
    fn empty_export_returns_empty_vec() {
        let csv_data = "Name,Position,Team,Salary,FPPG";
        let pool = load_candidates_from_reader(csv_data.as_bytes()).unwrap();
        assert!(pool.is_empty());
    }

    // -- Game time parsing --

    #[test]
    fn game_time_with_timezone_suffix() {
        assert_eq!(
            parse_game_time("7:30PM EDT"),
            Some(NaiveTime::from_hms_opt(19, 30, 0).unwrap())
        );
    }

    #[test]
    fn game_time_twenty_four_hour() {
        assert_eq!(
            parse_game_time("19:30"),
            Some(NaiveTime::from_hms_opt(19, 30, 0).unwrap())
        );
    }

    #[test]
    fn game_time_lowercase_meridiem() {
        assert_eq!(
            parse_game_time("10:00pm ET"),
            Some(NaiveTime::from_hms_opt(22, 0, 0).unwrap())
        );
    }

    #[test]
    fn game_time_garbage_is_none() {
        assert_eq!(parse_game_time("sometime"), None);
        assert_eq!(parse_game_time(""), None);
    }
}
