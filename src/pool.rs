// Candidate pool: positions, candidates, and exclusion rules.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Basketball positions used for lineup slot constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    PointGuard,
    ShootingGuard,
    SmallForward,
    PowerForward,
    Center,
}

/// All positions in constraint order (PG, SG, SF, PF, C).
pub const ALL_POSITIONS: [Position; 5] = [
    Position::PointGuard,
    Position::ShootingGuard,
    Position::SmallForward,
    Position::PowerForward,
    Position::Center,
];

impl Position {
    /// Parse a position string into a Position enum.
    ///
    /// Handles the abbreviations used by DFS player exports:
    /// "PG", "SG", "SF", "PF", "C" (case-insensitive).
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PG" => Some(Position::PointGuard),
            "SG" => Some(Position::ShootingGuard),
            "SF" => Some(Position::SmallForward),
            "PF" => Some(Position::PowerForward),
            "C" => Some(Position::Center),
            _ => None,
        }
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::PointGuard => "PG",
            Position::ShootingGuard => "SG",
            Position::SmallForward => "SF",
            Position::PowerForward => "PF",
            Position::Center => "C",
        }
    }

    /// Whether this position counts toward the combined Guard bucket.
    pub fn is_guard(&self) -> bool {
        matches!(self, Position::PointGuard | Position::ShootingGuard)
    }

    /// Whether this position counts toward the combined Forward bucket.
    pub fn is_forward(&self) -> bool {
        matches!(self, Position::SmallForward | Position::PowerForward)
    }

    /// Index into per-position arrays, matching `ALL_POSITIONS` order.
    pub fn index(&self) -> usize {
        match self {
            Position::PointGuard => 0,
            Position::ShootingGuard => 1,
            Position::SmallForward => 2,
            Position::PowerForward => 3,
            Position::Center => 4,
        }
    }

    /// Deterministic ordering index for lineup display.
    pub fn sort_order(&self) -> u8 {
        self.index() as u8
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

// ---------------------------------------------------------------------------
// Candidate
// ---------------------------------------------------------------------------

/// One eligible player-slot for a contest date.
///
/// Candidates are constructed fresh per run from the imported player export;
/// the optimizer treats them as immutable input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub team: String,
    /// Opposing team abbreviation, when the export carries one. Used only
    /// for the DVP projection adjustment.
    #[serde(default)]
    pub opponent: Option<String>,
    pub position: Position,
    /// Contest currency cost. Always positive for a valid candidate.
    pub salary: u32,
    /// Projected fantasy points for the contest date.
    pub projected_points: f64,
    /// Scheduled tip-off time, when the export carries one.
    #[serde(default)]
    pub game_time: Option<NaiveTime>,
    /// Raw injury designation from the export ("INJ", "O", "Q", ...).
    #[serde(default)]
    pub injury_status: Option<String>,
    /// Ineligible candidates never enter the solve.
    pub eligible: bool,
}

impl Candidate {
    /// Construct an eligible candidate with no game metadata. Primarily a
    /// convenience for callers that build pools programmatically.
    pub fn new(name: &str, position: Position, salary: u32, projected_points: f64) -> Self {
        Candidate {
            name: name.to_string(),
            team: String::new(),
            opponent: None,
            position,
            salary,
            projected_points,
            game_time: None,
            injury_status: None,
            eligible: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Exclusion rules
// ---------------------------------------------------------------------------

/// An enumerated reason to pin a candidate out of the solve.
///
/// Rules mark candidates ineligible rather than zeroing their projection,
/// so an excluded player can never be selected even as cheap filler.
#[derive(Debug, Clone, PartialEq)]
pub enum ExclusionRule {
    /// Exclude a specific player by exact name.
    Name(String),
    /// Exclude every player whose game tips off at this time.
    TimeSlot(NaiveTime),
    /// Exclude every player carrying this injury designation.
    InjuryStatus(String),
}

impl ExclusionRule {
    fn matches(&self, candidate: &Candidate) -> bool {
        match self {
            ExclusionRule::Name(name) => candidate.name == *name,
            ExclusionRule::TimeSlot(time) => candidate.game_time == Some(*time),
            ExclusionRule::InjuryStatus(status) => candidate
                .injury_status
                .as_deref()
                .map(|s| s.eq_ignore_ascii_case(status))
                .unwrap_or(false),
        }
    }
}

/// Apply exclusion rules to a pool, marking matches ineligible.
///
/// Returns the number of candidates newly marked ineligible.
pub fn apply_exclusions(candidates: &mut [Candidate], rules: &[ExclusionRule]) -> usize {
    let mut excluded = 0;
    for candidate in candidates.iter_mut() {
        if !candidate.eligible {
            continue;
        }
        if let Some(rule) = rules.iter().find(|r| r.matches(candidate)) {
            debug!("excluding '{}': matched {:?}", candidate.name, rule);
            candidate.eligible = false;
            excluded += 1;
        }
    }
    excluded
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn position_parsing() {
        assert_eq!(Position::from_str_pos("PG"), Some(Position::PointGuard));
        assert_eq!(Position::from_str_pos("sg"), Some(Position::ShootingGuard));
        assert_eq!(Position::from_str_pos(" C "), Some(Position::Center));
        assert_eq!(Position::from_str_pos("G"), None);
        assert_eq!(Position::from_str_pos(""), None);
    }

    #[test]
    fn position_display_roundtrip() {
        for pos in ALL_POSITIONS {
            assert_eq!(Position::from_str_pos(pos.display_str()), Some(pos));
        }
    }

    #[test]
    fn guard_and_forward_buckets() {
        assert!(Position::PointGuard.is_guard());
        assert!(Position::ShootingGuard.is_guard());
        assert!(!Position::SmallForward.is_guard());
        assert!(Position::SmallForward.is_forward());
        assert!(Position::PowerForward.is_forward());
        assert!(!Position::Center.is_guard());
        assert!(!Position::Center.is_forward());
    }

    #[test]
    fn exclusion_by_name() {
        let mut pool = vec![
            Candidate::new("A", Position::PointGuard, 20, 30.0),
            Candidate::new("B", Position::Center, 25, 35.0),
        ];
        let excluded =
            apply_exclusions(&mut pool, &[ExclusionRule::Name("B".to_string())]);
        assert_eq!(excluded, 1);
        assert!(pool[0].eligible);
        assert!(!pool[1].eligible);
    }

    #[test]
    fn exclusion_by_time_slot() {
        let mut pool = vec![
            Candidate::new("A", Position::PointGuard, 20, 30.0),
            Candidate::new("B", Position::Center, 25, 35.0),
        ];
        pool[0].game_time = Some(time(19, 30));
        pool[1].game_time = Some(time(22, 0));

        let excluded = apply_exclusions(&mut pool, &[ExclusionRule::TimeSlot(time(19, 30))]);
        assert_eq!(excluded, 1);
        assert!(!pool[0].eligible);
        assert!(pool[1].eligible);
    }

    #[test]
    fn exclusion_by_injury_status_case_insensitive() {
        let mut pool = vec![
            Candidate::new("A", Position::PointGuard, 20, 30.0),
            Candidate::new("B", Position::Center, 25, 35.0),
        ];
        pool[0].injury_status = Some("inj".to_string());

        let excluded =
            apply_exclusions(&mut pool, &[ExclusionRule::InjuryStatus("INJ".to_string())]);
        assert_eq!(excluded, 1);
        assert!(!pool[0].eligible);
    }

    #[test]
    fn no_time_means_no_time_slot_match() {
        let mut pool = vec![Candidate::new("A", Position::PointGuard, 20, 30.0)];
        let excluded = apply_exclusions(&mut pool, &[ExclusionRule::TimeSlot(time(19, 0))]);
        assert_eq!(excluded, 0);
        assert!(pool[0].eligible);
    }

    #[test]
    fn already_ineligible_not_double_counted() {
        let mut pool = vec![Candidate::new("A", Position::PointGuard, 20, 30.0)];
        pool[0].eligible = false;
        let excluded =
            apply_exclusions(&mut pool, &[ExclusionRule::Name("A".to_string())]);
        assert_eq!(excluded, 0);
    }
}
