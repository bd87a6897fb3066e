//! Model building and solution decoding.
//!
//! One binary variable per eligible player, named by the player id:
//!
//! ```text
//! maximize   Σ (projection[p] + boost[p]) · x[p]
//! subject to Σ salary[p] · x[p] <= cap            ("cost")
//!            Σ x[p]             == roster_size    ("totalPlayers")
//!            x[p]               == 1   for locks  ("<id> Locked")
//! ```

use super::config::RosterRules;
use super::portfolio::Lineup;
use crate::ip::{Bound, IpModel, IpSolution, Objective};
use crate::pool::Player;
use std::collections::HashSet;
use tracing::debug;

/// Builds the single-lineup model over `eligible`.
///
/// Locks naming a player outside `eligible` are dropped: a player that was
/// filtered out (eliminated, unprojected, excluded) cannot also be forced in.
pub fn build_model(eligible: &[&Player], locks: &HashSet<String>, roster: &RosterRules) -> IpModel {
    let mut model = IpModel::new("LP");
    let mut points = Vec::with_capacity(eligible.len());
    let mut costs = Vec::with_capacity(eligible.len());
    let mut count = Vec::with_capacity(eligible.len());

    for player in eligible {
        // Callers filter on projection; treat a stray None as worthless.
        let coef = player.points().unwrap_or(0.0);
        model.add_binary(player.id.clone());
        points.push((player.id.clone(), coef));
        costs.push((player.id.clone(), player.salary as f64));
        count.push((player.id.clone(), 1.0));
    }

    model.add_constraint("cost", costs, Bound::Upper(roster.salary_cap as f64));
    model.add_constraint(
        "totalPlayers",
        count,
        Bound::Fixed(roster.roster_size as f64),
    );

    let mut applied = 0;
    for player in eligible {
        if locks.contains(&player.id) {
            model.fix(format!("{} Locked", player.id), player.id.clone(), 1.0);
            applied += 1;
        }
    }
    if applied < locks.len() {
        debug!(
            requested = locks.len(),
            applied, "ignoring locks on ineligible players"
        );
    }

    model.set_objective(Objective::Maximize { terms: points });
    model
}

/// Reads the selected players back out of a solution.
///
/// Members are listed in `eligible` order. Score and salary are recomputed
/// from the player data rather than trusted from the solver.
pub fn decode_lineup(solution: &IpSolution, eligible: &[&Player]) -> Lineup {
    let mut players = Vec::new();
    let mut score = 0.0;
    let mut salary = 0u64;
    for player in eligible {
        if solution.is_selected(&player.id) {
            players.push(player.id.clone());
            score += player.points().unwrap_or(0.0);
            salary += player.salary as u64;
        }
    }
    Lineup::new(players, score, salary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ip::SolverStatus;

    fn players() -> Vec<Player> {
        vec![
            Player::new("a", 10.0, 2, 9000),
            Player::new("b", 8.0, 0, 7000),
            Player::new("c", 5.5, -1, 4000),
        ]
    }

    #[test]
    fn test_model_shape() {
        let owned = players();
        let eligible: Vec<&Player> = owned.iter().collect();
        let locks: HashSet<String> = ["b".to_string()].into_iter().collect();
        let model = build_model(&eligible, &locks, &RosterRules::default());

        assert_eq!(model.binaries, vec!["a", "b", "c"]);
        assert_eq!(model.constraint_count(), 3);
        assert!(model.validate().is_ok());

        let cost = &model.constraints[0];
        assert_eq!(cost.name, "cost");
        assert_eq!(cost.bound, Bound::Upper(50_000.0));
        assert_eq!(cost.terms[0], ("a".to_string(), 9000.0));

        let total = &model.constraints[1];
        assert_eq!(total.name, "totalPlayers");
        assert_eq!(total.bound, Bound::Fixed(6.0));

        let lock = &model.constraints[2];
        assert_eq!(lock.name, "b Locked");
        assert_eq!(lock.bound, Bound::Fixed(1.0));

        match model.objective.unwrap() {
            Objective::Maximize { terms } => {
                assert_eq!(terms[0], ("a".to_string(), 12.0));
                assert_eq!(terms[2], ("c".to_string(), 4.5));
            }
            other => panic!("expected maximize, got {other:?}"),
        }
    }

    #[test]
    fn test_locks_outside_pool_dropped() {
        let owned = players();
        let eligible: Vec<&Player> = owned.iter().collect();
        let locks: HashSet<String> = ["ghost".to_string()].into_iter().collect();
        let model = build_model(&eligible, &locks, &RosterRules::default());

        assert_eq!(model.constraint_count(), 2);
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_decode_lineup() {
        let owned = players();
        let eligible: Vec<&Player> = owned.iter().collect();
        let mut solution = IpSolution::empty(SolverStatus::Optimal);
        solution.assignment.insert("a".into(), true);
        solution.assignment.insert("b".into(), false);
        solution.assignment.insert("c".into(), true);

        let lineup = decode_lineup(&solution, &eligible);
        assert_eq!(lineup.players, vec!["a", "c"]);
        assert!((lineup.score - 16.5).abs() < 1e-12);
        assert_eq!(lineup.salary, 13_000);
    }
}
