//! Diversity exclusion.
//!
//! If at least `U` members of an earlier lineup are unavailable to the
//! next solve, the new lineup shares at most `K - U` players with it and
//! therefore differs from it by at least `U`. The generator picks those
//! members at random, per prior lineup, and unions the picks.

use super::portfolio::Lineup;
use rand::Rng;
use std::collections::HashSet;

/// Computes a random exclusion set that keeps the next lineup at least
/// `min_uniqueness` players away from every lineup in `prior`.
///
/// Players in `exempt` (locks) are never excluded. When a lineup has fewer
/// than `min_uniqueness` excludable members, all of them are excluded and
/// the guarantee for that lineup is partial; this is not an error.
///
/// Members already excluded on behalf of an earlier lineup count toward
/// the threshold of later ones, which keeps the set small.
pub fn diversity_exclusions<R: Rng>(
    prior: &[Lineup],
    min_uniqueness: usize,
    exempt: &HashSet<String>,
    rng: &mut R,
) -> HashSet<String> {
    let mut excluded: HashSet<String> = HashSet::new();

    for lineup in prior {
        let mut covered = lineup
            .players
            .iter()
            .filter(|p| excluded.contains(*p))
            .count();

        let mut candidates: Vec<&String> = lineup
            .players
            .iter()
            .filter(|p| !excluded.contains(*p) && !exempt.contains(*p))
            .collect();

        while covered < min_uniqueness && !candidates.is_empty() {
            let pick = candidates.swap_remove(rng.random_range(0..candidates.len()));
            excluded.insert(pick.clone());
            covered += 1;
        }
    }

    excluded
}
