//! Exposure tracking.
//!
//! Exposure is derived state: every function here recomputes it from the
//! accepted lineups. The denominator is always the *requested* lineup
//! count, not the number accepted so far, so exposure ramps up toward its
//! final value as the portfolio fills.

use super::portfolio::Lineup;
use crate::pool::PlayerPool;
use std::collections::{HashMap, HashSet};

const TOL: f64 = 1e-9;

/// A player short of their minimum exposure target.
#[derive(Debug, Clone, PartialEq)]
pub struct ExposureDeficit {
    pub player_id: String,
    /// Current exposure.
    pub exposure: f64,
    /// Minimum exposure target.
    pub target: f64,
}

impl ExposureDeficit {
    /// How far below target the player is (always positive).
    pub fn deficit(&self) -> f64 {
        self.target - self.exposure
    }

    /// Further lineups this player must appear in to reach the target.
    pub fn lineups_needed(&self, target_count: usize) -> usize {
        (self.deficit() * target_count as f64 - TOL).ceil().max(0.0) as usize
    }
}

/// Fraction of `target_count` lineups containing each player seen so far.
///
/// Players absent from every lineup are not in the map (exposure 0).
pub fn exposure(lineups: &[Lineup], target_count: usize) -> HashMap<String, f64> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for lineup in lineups {
        for id in &lineup.players {
            *counts.entry(id.clone()).or_default() += 1;
        }
    }
    let denom = target_count.max(1) as f64;
    counts
        .into_iter()
        .map(|(id, n)| (id, n as f64 / denom))
        .collect()
}

/// Players whose exposure exceeds the tighter of `global_max` and their own cap.
///
/// These are excluded from the next model.
pub fn overexposed(
    lineups: &[Lineup],
    target_count: usize,
    global_max: f64,
    pool: &PlayerPool,
) -> HashSet<String> {
    exposure(lineups, target_count)
        .into_iter()
        .filter(|(id, e)| {
            let cap = pool
                .get(id)
                .map_or(global_max, |p| p.exposure_cap(global_max));
            *e > cap + TOL
        })
        .map(|(id, _)| id)
        .collect()
}

/// Selectable players whose exposure is below their minimum target.
///
/// Sorted most-deficient first; ties broken by identifier so the order is
/// reproducible. Eliminated and unprojected players are never reported,
/// since they can never be locked.
pub fn underexposed(
    lineups: &[Lineup],
    target_count: usize,
    pool: &PlayerPool,
) -> Vec<ExposureDeficit> {
    let current = exposure(lineups, target_count);
    let mut deficits: Vec<ExposureDeficit> = pool
        .iter()
        .filter(|p| p.is_selectable() && p.min_exposure > 0.0)
        .filter_map(|p| {
            let e = current.get(&p.id).copied().unwrap_or(0.0);
            (e + TOL < p.min_exposure).then(|| ExposureDeficit {
                player_id: p.id.clone(),
                exposure: e,
                target: p.min_exposure,
            })
        })
        .collect();

    deficits.sort_by(|a, b| {
        b.deficit()
            .total_cmp(&a.deficit())
            .then_with(|| a.player_id.cmp(&b.player_id))
    });
    deficits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Player;
    use proptest::prelude::*;

    fn lineup(ids: &[&str]) -> Lineup {
        Lineup::new(ids.iter().map(|s| s.to_string()).collect(), 0.0, 0)
    }

    fn pool() -> PlayerPool {
        let mut a = Player::new("a", 10.0, 0, 1000);
        a.min_exposure = 0.5;
        let mut b = Player::new("b", 10.0, 0, 1000);
        b.min_exposure = 1.0;
        b.max_exposure = Some(0.25);
        let mut c = Player::new("c", 10.0, 0, 1000);
        c.min_exposure = 0.75;
        let mut d = Player::new("d", 10.0, 0, 1000);
        d.min_exposure = 1.0;
        d.eliminate = true;
        PlayerPool::new(vec![a, b, c, d, Player::new("e", 1.0, 0, 1000)])
    }

    #[test]
    fn test_exposure_uses_target_denominator() {
        let lineups = vec![lineup(&["a", "b"]), lineup(&["a", "c"])];
        let map = exposure(&lineups, 4);

        assert!((map["a"] - 0.5).abs() < 1e-12);
        assert!((map["b"] - 0.25).abs() < 1e-12);
        assert!(!map.contains_key("e"));
    }

    #[test]
    fn test_overexposed_uses_tighter_cap() {
        let lineups = vec![lineup(&["a", "b"]), lineup(&["a", "b"]), lineup(&["c"])];
        // a: 0.5, b: 0.5 (own cap 0.25), c: 0.25
        let over = overexposed(&lineups, 4, 0.4, &pool());

        assert!(over.contains("a"));
        assert!(over.contains("b"));
        assert!(!over.contains("c"));
    }

    #[test]
    fn test_overexposed_at_cap_is_not_over() {
        let lineups = vec![lineup(&["a"]), lineup(&["a"])];
        let over = overexposed(&lineups, 4, 0.5, &pool());
        assert!(over.is_empty());
    }

    #[test]
    fn test_underexposed_most_deficient_first() {
        let lineups = vec![lineup(&["a", "c"])];
        // a: 0.25 of 0.5, b: 0 of 1.0, c: 0.25 of 0.75
        let under = underexposed(&lineups, 4, &pool());
        let ids: Vec<&str> = under.iter().map(|d| d.player_id.as_str()).collect();

        assert_eq!(ids, vec!["b", "c", "a"]);
        assert!((under[0].deficit() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_underexposed_skips_eliminated_and_met_targets() {
        let lineups = vec![lineup(&["a"]), lineup(&["a"])];
        let under = underexposed(&lineups, 4, &pool());

        assert!(under.iter().all(|d| d.player_id != "d"));
        assert!(under.iter().all(|d| d.player_id != "a"));
        assert!(under.iter().all(|d| d.player_id != "e"));
    }

    #[test]
    fn test_lineups_needed() {
        let under = underexposed(&[lineup(&["a", "c"])], 4, &pool());
        let needed: Vec<(&str, usize)> = under
            .iter()
            .map(|d| (d.player_id.as_str(), d.lineups_needed(4)))
            .collect();

        // b: 4 of 4, c: 2 of 3 (0.75 · 4), a: 1 of 2
        assert_eq!(needed, vec![("b", 4), ("c", 2), ("a", 1)]);
    }

    proptest! {
        #[test]
        fn prop_exposure_monotone(
            with_p in 0usize..10,
            without_p in 0usize..10,
            extra in 1usize..5,
        ) {
            let target = 20;
            let mut lineups: Vec<Lineup> = (0..with_p).map(|_| lineup(&["p", "q"])).collect();
            lineups.extend((0..without_p).map(|_| lineup(&["q"])));
            let before = exposure(&lineups, target).get("p").copied().unwrap_or(0.0);

            lineups.extend((0..extra).map(|_| lineup(&["p"])));
            let after = exposure(&lineups, target).get("p").copied().unwrap_or(0.0);

            prop_assert!(after > before);
            prop_assert!(((after - before) - extra as f64 / target as f64).abs() < 1e-12);
        }
    }
}
