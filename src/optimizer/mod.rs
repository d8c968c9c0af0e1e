// Lineup optimization: input validation, pre-selection reduction, and the
// integer-program solve.

mod ilp;

use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ContestRules;
use crate::pool::{Candidate, ALL_POSITIONS};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("invalid candidate `{name}`: {reason}")]
    InvalidCandidate { name: String, reason: String },

    #[error("invalid candidate pool: {0}")]
    InvalidPool(String),

    #[error("pre-selection conflicts with contest rules: {0}")]
    ConstraintViolation(String),

    #[error("solver failure: {0}")]
    Solver(String),
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// A complete lineup satisfying every contest constraint.
#[derive(Debug, Clone)]
pub struct Lineup {
    /// Selected candidates in position order (PG, SG, SF, PF, C).
    pub players: Vec<Candidate>,
    pub total_salary: u32,
    pub total_points: f64,
}

/// Outcome of a solve. Infeasibility is a normal result, not an error:
/// it means the well-formed problem has no satisfying assignment.
#[derive(Debug, Clone)]
pub enum LineupResult {
    Optimal(Lineup),
    Infeasible,
}

impl LineupResult {
    pub fn lineup(&self) -> Option<&Lineup> {
        match self {
            LineupResult::Optimal(lineup) => Some(lineup),
            LineupResult::Infeasible => None,
        }
    }

    pub fn is_infeasible(&self) -> bool {
        matches!(self, LineupResult::Infeasible)
    }
}

// ---------------------------------------------------------------------------
// Reduced ruleset (after pre-selection)
// ---------------------------------------------------------------------------

/// The contest rules with pre-selected players already accounted for.
/// This is what the integer program is actually built against.
#[derive(Debug, Clone)]
pub(crate) struct ReducedRules {
    pub(crate) salary_cap: u32,
    pub(crate) roster_size: usize,
    pub(crate) guards_min: u32,
    pub(crate) forwards_min: u32,
    pub(crate) bounds: [crate::config::PositionBound; 5],
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Select the point-maximizing lineup from `candidates` under `rules`.
///
/// `preselected` names must appear in the final lineup; each recognized
/// lock reduces the remaining cap, roster count, and position bounds
/// before solving. Unknown or ineligible locked names are skipped with a
/// diagnostic. The call is pure: same inputs give lineups of equal total
/// points (the specific lineup among ties is solver-determined).
pub fn optimize(
    candidates: &[Candidate],
    rules: &ContestRules,
    preselected: &HashSet<String>,
) -> Result<LineupResult, OptimizeError> {
    validate_pool(candidates)?;

    // Partition locked players out of the solvable pool.
    let mut locked: Vec<&Candidate> = Vec::new();
    for name in preselected {
        match candidates.iter().find(|c| c.name == *name) {
            Some(c) if c.eligible => locked.push(c),
            Some(_) => warn!("preselected '{}' is ineligible, skipping", name),
            None => warn!("preselected '{}' not in the candidate pool, skipping", name),
        }
    }
    let locked_names: HashSet<&str> = locked.iter().map(|c| c.name.as_str()).collect();
    let pool: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| c.eligible && !locked_names.contains(c.name.as_str()))
        .collect();

    let reduced = reduce_rules(rules, &locked)?;
    debug!(
        "solving for {} slots over {} candidates ({} locked)",
        reduced.roster_size,
        pool.len(),
        locked.len()
    );

    // Cheap infeasibility screens. These also guarantee the integer program
    // never carries a minimum constraint with no matching variables.
    if pool.len() < reduced.roster_size {
        return Ok(LineupResult::Infeasible);
    }
    for pos in ALL_POSITIONS {
        let available = pool.iter().filter(|c| c.position == pos).count();
        if (reduced.bounds[pos.index()].min as usize) > available {
            return Ok(LineupResult::Infeasible);
        }
    }
    if (reduced.guards_min as usize) > pool.iter().filter(|c| c.position.is_guard()).count() {
        return Ok(LineupResult::Infeasible);
    }
    if (reduced.forwards_min as usize) > pool.iter().filter(|c| c.position.is_forward()).count() {
        return Ok(LineupResult::Infeasible);
    }

    if reduced.roster_size == 0 {
        // Locks fill the roster; any minimum still outstanding is unsatisfiable.
        let outstanding: u32 = reduced.bounds.iter().map(|b| b.min).sum::<u32>()
            + reduced.guards_min
            + reduced.forwards_min;
        if outstanding > 0 {
            return Ok(LineupResult::Infeasible);
        }
        return Ok(LineupResult::Optimal(build_lineup(&locked, &[])));
    }

    match ilp::solve(&pool, &reduced)? {
        Some(indices) => {
            let chosen: Vec<&Candidate> = indices.iter().map(|&i| pool[i]).collect();
            Ok(LineupResult::Optimal(build_lineup(&locked, &chosen)))
        }
        None => Ok(LineupResult::Infeasible),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_pool(candidates: &[Candidate]) -> Result<(), OptimizeError> {
    if candidates.is_empty() {
        return Err(OptimizeError::InvalidPool(
            "candidate pool is empty".to_string(),
        ));
    }
    let mut seen: HashSet<&str> = HashSet::with_capacity(candidates.len());
    for c in candidates {
        if c.salary == 0 {
            return Err(OptimizeError::InvalidCandidate {
                name: c.name.clone(),
                reason: "salary must be positive".to_string(),
            });
        }
        if !c.projected_points.is_finite() {
            return Err(OptimizeError::InvalidCandidate {
                name: c.name.clone(),
                reason: "projected points must be finite".to_string(),
            });
        }
        if c.projected_points < 0.0 {
            return Err(OptimizeError::InvalidCandidate {
                name: c.name.clone(),
                reason: "projected points must be non-negative".to_string(),
            });
        }
        if !seen.insert(c.name.as_str()) {
            return Err(OptimizeError::InvalidCandidate {
                name: c.name.clone(),
                reason: "duplicate name in pool".to_string(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Pre-selection reduction
// ---------------------------------------------------------------------------

/// Subtract the locked players from the cap, roster count, and bounds.
/// Reductions that would drive any of them negative are a hard
/// `ConstraintViolation`: the pre-selection itself breaks the ruleset.
fn reduce_rules(
    rules: &ContestRules,
    locked: &[&Candidate],
) -> Result<ReducedRules, OptimizeError> {
    let locked_salary: u32 = locked.iter().map(|c| c.salary).sum();
    if locked_salary > rules.salary_cap {
        return Err(OptimizeError::ConstraintViolation(format!(
            "preselected salaries total {} against a cap of {}",
            locked_salary, rules.salary_cap
        )));
    }
    if locked.len() > rules.roster_size {
        return Err(OptimizeError::ConstraintViolation(format!(
            "{} preselected players for a roster of {}",
            locked.len(),
            rules.roster_size
        )));
    }

    let mut bounds = rules.bounds;
    let mut guards_min = rules.guards_min;
    let mut forwards_min = rules.forwards_min;
    for c in locked {
        let bound = &mut bounds[c.position.index()];
        if bound.max == 0 {
            return Err(OptimizeError::ConstraintViolation(format!(
                "too many preselected players at {} (max {})",
                c.position,
                rules.bound(c.position).max
            )));
        }
        bound.max -= 1;
        bound.min = bound.min.saturating_sub(1);
        if c.position.is_guard() {
            guards_min = guards_min.saturating_sub(1);
        }
        if c.position.is_forward() {
            forwards_min = forwards_min.saturating_sub(1);
        }
    }

    Ok(ReducedRules {
        salary_cap: rules.salary_cap - locked_salary,
        roster_size: rules.roster_size - locked.len(),
        guards_min,
        forwards_min,
        bounds,
    })
}

// ---------------------------------------------------------------------------
// Lineup assembly
// ---------------------------------------------------------------------------

fn build_lineup(locked: &[&Candidate], chosen: &[&Candidate]) -> Lineup {
    let mut players: Vec<Candidate> = locked
        .iter()
        .chain(chosen.iter())
        .map(|c| (*c).clone())
        .collect();
    players.sort_by(|a, b| {
        a.position
            .sort_order()
            .cmp(&b.position.sort_order())
            .then_with(|| a.name.cmp(&b.name))
    });
    let total_salary = players.iter().map(|c| c.salary).sum();
    let total_points = players.iter().map(|c| c.projected_points).sum();
    Lineup {
        players,
        total_salary,
        total_points,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
