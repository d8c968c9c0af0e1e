// 0/1 integer-program formulation over the candidate pool.
//
// One binary variable per candidate; maximize total projected points
// subject to the salary cap, the exact roster count, per-position bounds,
// and the combined guard/forward bucket minimums. Caller guarantees that
// every minimum constraint has at least that many matching candidates, so
// no constraint here is ever built over an empty expression.

use good_lp::{
    constraint, default_solver, variable, variables, Expression, ResolutionError, Solution,
    SolverModel, Variable,
};
use tracing::debug;

use super::{OptimizeError, ReducedRules};
use crate::pool::{Candidate, ALL_POSITIONS};

/// Solve the reduced problem. Returns the selected indices into `pool`,
/// or `None` when no feasible assignment exists.
pub(crate) fn solve(
    pool: &[&Candidate],
    rules: &ReducedRules,
) -> Result<Option<Vec<usize>>, OptimizeError> {
    let mut problem = variables!();
    let picks: Vec<Variable> = pool
        .iter()
        .map(|_| problem.add(variable().binary()))
        .collect();

    let objective: Expression = pool
        .iter()
        .zip(&picks)
        .map(|(c, v)| c.projected_points * *v)
        .sum();
    let mut model = problem.maximise(objective).using(default_solver);

    let total_salary: Expression = pool
        .iter()
        .zip(&picks)
        .map(|(c, v)| c.salary as f64 * *v)
        .sum();
    model = model.with(constraint!(total_salary <= rules.salary_cap as f64));

    let total_picked: Expression = picks.iter().map(|v| Expression::from(*v)).sum();
    model = model.with(constraint!(total_picked == rules.roster_size as f64));

    for pos in ALL_POSITIONS {
        let bound = rules.bounds[pos.index()];
        let at_position: Vec<Variable> = pool
            .iter()
            .zip(&picks)
            .filter(|(c, _)| c.position == pos)
            .map(|(_, v)| *v)
            .collect();
        if at_position.is_empty() {
            continue;
        }
        let count: Expression = at_position.iter().map(|v| Expression::from(*v)).sum();
        if bound.min > 0 {
            model = model.with(constraint!(count.clone() >= bound.min as f64));
        }
        model = model.with(constraint!(count <= bound.max as f64));
    }

    if rules.guards_min > 0 {
        let guards: Expression = pool
            .iter()
            .zip(&picks)
            .filter(|(c, _)| c.position.is_guard())
            .map(|(_, v)| Expression::from(*v))
            .sum();
        model = model.with(constraint!(guards >= rules.guards_min as f64));
    }
    if rules.forwards_min > 0 {
        let forwards: Expression = pool
            .iter()
            .zip(&picks)
            .filter(|(c, _)| c.position.is_forward())
            .map(|(_, v)| Expression::from(*v))
            .sum();
        model = model.with(constraint!(forwards >= rules.forwards_min as f64));
    }

    match model.solve() {
        Ok(solution) => {
            let selected: Vec<usize> = picks
                .iter()
                .enumerate()
                .filter(|(_, v)| solution.value(**v) > 0.5)
                .map(|(i, _)| i)
                .collect();
            debug!(
                "solver selected {} of {} candidates",
                selected.len(),
                pool.len()
            );
            Ok(Some(selected))
        }
        Err(ResolutionError::Infeasible) => Ok(None),
        Err(e) => Err(OptimizeError::Solver(e.to_string())),
    }
}
