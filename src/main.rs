// Lineup builder entry point.
//
// Run sequence:
// 1. Initialize tracing
// 2. Load config (contest.toml)
// 3. Import the player export for the contest date
// 4. Apply the DVP projection adjustment, if a table is configured
// 5. Apply exclusion rules
// 6. Optimize with the configured locks
// 7. Print the lineup (or the infeasibility notice)

use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use tracing::info;

use lineup_optimizer::config;
use lineup_optimizer::dvp::DvpTable;
use lineup_optimizer::import;
use lineup_optimizer::optimizer::{self, Lineup, LineupResult};
use lineup_optimizer::pool;

fn main() -> anyhow::Result<()> {
    init_tracing()?;

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Contest rules: cap {}, roster {}, G>={}, F>={}",
        config.rules.salary_cap,
        config.rules.roster_size,
        config.rules.guards_min,
        config.rules.forwards_min
    );

    // 3. Import the player export
    let mut candidates = import::load_player_export(Path::new(&config.data_paths.players))
        .context("failed to load player export")?;
    info!(
        "Imported {} candidates from {}",
        candidates.len(),
        config.data_paths.players
    );

    // 4. DVP adjustment
    if let Some(dvp_path) = &config.data_paths.dvp {
        let table = DvpTable::load(Path::new(dvp_path)).context("failed to load DVP table")?;
        let adjusted = table.adjust(&mut candidates);
        info!(
            "DVP-adjusted {} of {} projections ({} teams in table)",
            adjusted,
            candidates.len(),
            table.len()
        );
    }

    // 5. Exclusions
    let excluded = pool::apply_exclusions(&mut candidates, &config.exclusions);
    if excluded > 0 {
        info!("Excluded {} candidates by rule", excluded);
    }

    // 6. Optimize
    let locks: HashSet<String> = config.locks.iter().cloned().collect();
    let result =
        optimizer::optimize(&candidates, &config.rules, &locks).context("optimization failed")?;

    // 7. Report
    match result {
        LineupResult::Optimal(lineup) => print_lineup(&lineup),
        LineupResult::Infeasible => {
            println!("No feasible lineup exists under the configured contest rules.");
        }
    }

    Ok(())
}

fn print_lineup(lineup: &Lineup) {
    println!(
        "{:<4} {:<24} {:<5} {:>7} {:>8}",
        "POS", "PLAYER", "TEAM", "SALARY", "PROJ"
    );
    for player in &lineup.players {
        println!(
            "{:<4} {:<24} {:<5} {:>7} {:>8.1}",
            player.position,
            player.name,
            player.team,
            player.salary,
            player.projected_points
        );
    }
    println!();
    println!("Total salary used: {}", lineup.total_salary);
    println!("Projected points:  {:.1}", lineup.total_points);
}

/// Initialize tracing to stderr so the lineup report on stdout stays clean.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("lineup=info,lineup_optimizer=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
