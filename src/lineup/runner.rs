//! Lineup generation loop.
//!
//! # Algorithm
//!
//! 1. Seed: run one step against the empty portfolio. No diversity or
//!    overexposure applies yet, but exposure targets already force locks
//! 2. While fewer than `lineup_count` lineups and budget remains, step:
//!    a. Recompute exposure from the accepted lineups
//!    b. Force a random-sized prefix of the most underexposed players that
//!       are not hard-locked. Players who need every remaining lineup to
//!       reach their target are always in that prefix
//!    c. Exclude players at random so every accepted lineup is at least
//!       `min_uniqueness` away, plus every overexposed player
//!    d. Solve; accept an optimal, in-cap, full-size, new lineup
//! 3. Deduplicate, sort by score, truncate
//!
//! Precedence when filters disagree about a player:
//! elimination > lock > diversity exclusion > overexposure exclusion.

use super::builder::{build_model, decode_lineup};
use super::config::GeneratorConfig;
use super::diversity::diversity_exclusions;
use super::exposure::{exposure, overexposed, underexposed, ExposureDeficit};
use super::portfolio::{Lineup, Portfolio};
use crate::error::LineupResult;
use crate::ip::{IpSolver, SolverStatus};
use crate::pool::PlayerPool;
use crate::random::rng_from_seed;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a lineup generation run.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    /// Accepted lineups, best score first, at most `lineup_count` long.
    pub lineups: Vec<Lineup>,

    /// Final exposure of every player appearing in an accepted lineup.
    pub exposure: HashMap<String, f64>,

    /// Loop iterations executed (the seed solve is not counted).
    pub iterations: usize,

    /// Solver calls made, including the seed.
    pub solves: usize,

    /// Solves that ended in any status other than optimal.
    pub infeasible: usize,

    /// Optimal solves rejected for wrong size or salary overrun.
    pub invalid: usize,

    /// Valid lineups rejected because they were already accepted.
    pub duplicates: usize,

    /// Whether cancelled externally.
    pub cancelled: bool,
}

/// Executes the lineup generation loop.
pub struct LineupGenerator;

impl LineupGenerator {
    /// Generates a portfolio, seeding the RNG from `config.seed`.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid configuration or when the solver
    /// adapter fails outright. Infeasible iterations and an exhausted
    /// budget are not errors; the result is simply shorter.
    pub fn run<S: IpSolver + ?Sized>(
        pool: &PlayerPool,
        solver: &S,
        config: &GeneratorConfig,
    ) -> LineupResult<GenerationResult> {
        Self::run_with_cancel(pool, solver, config, None)
    }

    /// Generates a portfolio with an optional cancellation token.
    pub fn run_with_cancel<S: IpSolver + ?Sized>(
        pool: &PlayerPool,
        solver: &S,
        config: &GeneratorConfig,
        cancel: Option<Arc<AtomicBool>>,
    ) -> LineupResult<GenerationResult> {
        let mut rng = rng_from_seed(config.seed);
        Self::run_with_rng(pool, solver, config, &mut rng, cancel.as_deref())
    }

    /// Generates a portfolio drawing all randomness from `rng`.
    ///
    /// `config.seed` is ignored. The cancellation flag is polled at the top
    /// of each iteration and around every solver call.
    pub fn run_with_rng<S: IpSolver + ?Sized, R: Rng>(
        pool: &PlayerPool,
        solver: &S,
        config: &GeneratorConfig,
        rng: &mut R,
        cancel: Option<&AtomicBool>,
    ) -> LineupResult<GenerationResult> {
        config.validate()?;

        let mut run = Run {
            pool,
            solver,
            config,
            cancel,
            portfolio: Portfolio::new(),
            hard_locks: pool.locked_ids(),
            eliminated: pool.eliminated_ids(),
            iterations: 0,
            solves: 0,
            infeasible: 0,
            invalid: 0,
            duplicates: 0,
            cancelled: false,
        };

        if run.hard_locks.len() > config.roster.roster_size {
            warn!(
                locks = run.hard_locks.len(),
                roster_size = config.roster.roster_size,
                "more locked players than roster slots; every solve will be infeasible"
            );
        }

        run.step(rng)?;

        while run.portfolio.len() < config.lineup_count && run.iterations < config.max_iterations {
            if run.is_cancelled() {
                break;
            }
            run.iterations += 1;
            run.step(rng)?;
        }

        Ok(run.finish())
    }

    /// Runs several independent requests in parallel.
    ///
    /// Each request owns its portfolio and an RNG seeded from its own
    /// config, so nothing is shared between runs except the read-only pool.
    #[cfg(feature = "parallel")]
    pub fn run_batch<S: IpSolver + Sync + ?Sized>(
        pool: &PlayerPool,
        solver: &S,
        configs: &[GeneratorConfig],
    ) -> Vec<LineupResult<GenerationResult>> {
        use rayon::prelude::*;

        configs
            .par_iter()
            .map(|config| Self::run(pool, solver, config))
            .collect()
    }
}

/// Number of underexposed players to force into the next solve.
///
/// Drawn uniformly from `ceil(d / remaining_slots) ..= max(5, d)` and
/// capped at `d` (and at `room`, the roster slots not already taken by
/// hard locks), where `d` is the number of underexposed players.
pub fn forced_lock_count<R: Rng>(
    deficit_count: usize,
    remaining_slots: usize,
    room: usize,
    rng: &mut R,
) -> usize {
    if deficit_count == 0 || room == 0 {
        return 0;
    }
    let low = deficit_count.div_ceil(remaining_slots.max(1));
    let high = deficit_count.max(5);
    rng.random_range(low..=high).min(deficit_count).min(room)
}

/// Mutable state of one generation run.
struct Run<'a, S: IpSolver + ?Sized> {
    pool: &'a PlayerPool,
    solver: &'a S,
    config: &'a GeneratorConfig,
    cancel: Option<&'a AtomicBool>,
    portfolio: Portfolio,
    hard_locks: HashSet<String>,
    eliminated: HashSet<String>,
    iterations: usize,
    solves: usize,
    infeasible: usize,
    invalid: usize,
    duplicates: usize,
    cancelled: bool,
}

impl<S: IpSolver + ?Sized> Run<'_, S> {
    fn is_cancelled(&mut self) -> bool {
        if !self.cancelled && self.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            debug!(iteration = self.iterations, "generation cancelled");
            self.cancelled = true;
        }
        self.cancelled
    }

    /// Builds the next model from the current portfolio and solves it.
    fn step<R: Rng>(&mut self, rng: &mut R) -> LineupResult<()> {
        let config = self.config;
        let accepted = self.portfolio.lineups();

        let over = overexposed(accepted, config.lineup_count, config.max_exposure, self.pool);
        let under: Vec<ExposureDeficit> = underexposed(accepted, config.lineup_count, self.pool)
            .into_iter()
            .filter(|d| !self.hard_locks.contains(&d.player_id))
            .collect();

        let room = config
            .roster
            .roster_size
            .saturating_sub(self.hard_locks.len());
        let remaining = config.lineup_count - accepted.len();
        // Deficits are sorted, so these form a prefix of `under`
        let urgent = under
            .iter()
            .take_while(|d| d.lineups_needed(config.lineup_count) >= remaining)
            .count();
        let forced_count =
            forced_lock_count(under.len(), remaining, room, rng).max(urgent.min(room));

        let mut locks = self.hard_locks.clone();
        locks.extend(under.iter().take(forced_count).map(|d| d.player_id.clone()));

        let diversity = diversity_exclusions(accepted, config.min_uniqueness, &locks, rng);
        let mut excluded: HashSet<String> = diversity
            .iter()
            .chain(over.iter())
            .filter(|id| !locks.contains(*id))
            .cloned()
            .collect();
        excluded.extend(self.eliminated.iter().cloned());

        debug!(
            iteration = self.iterations,
            accepted = accepted.len(),
            forced = forced_count,
            diversity = diversity.len(),
            overexposed = over.len(),
            "solving next lineup"
        );

        if let Some(lineup) = self.solve_once(&excluded, &locks)? {
            self.accept(lineup);
        }
        Ok(())
    }

    /// Builds and solves one model. `Ok(None)` means "nothing usable".
    fn solve_once(
        &mut self,
        excluded: &HashSet<String>,
        locks: &HashSet<String>,
    ) -> LineupResult<Option<Lineup>> {
        let pool = self.pool;
        let eligible = pool.eligible(excluded);
        let model = build_model(&eligible, locks, &self.config.roster);

        if self.is_cancelled() {
            return Ok(None);
        }
        self.solves += 1;
        let solution = self.solver.solve(&model, &self.config.solver)?;
        if self.is_cancelled() {
            return Ok(None);
        }

        if solution.status != SolverStatus::Optimal {
            self.infeasible += 1;
            debug!(
                iteration = self.iterations,
                status = ?solution.status,
                eligible = eligible.len(),
                "no lineup this iteration"
            );
            return Ok(None);
        }

        let lineup = decode_lineup(&solution, &eligible);
        let config = self.config;
        let roster = &config.roster;
        let salary = pool.salary_of(&lineup.players);
        if lineup.len() != roster.roster_size || salary > roster.salary_cap as u64 {
            self.invalid += 1;
            warn!(
                iteration = self.iterations,
                size = lineup.len(),
                salary,
                cap = roster.salary_cap,
                "solver returned a lineup violating roster rules"
            );
            return Ok(None);
        }

        Ok(Some(lineup))
    }

    fn accept(&mut self, lineup: Lineup) {
        let score = lineup.score;
        if self.portfolio.insert(lineup) {
            debug!(
                iteration = self.iterations,
                score,
                accepted = self.portfolio.len(),
                "lineup accepted"
            );
        } else {
            self.duplicates += 1;
        }
    }

    fn finish(self) -> GenerationResult {
        let count = self.config.lineup_count;
        let exposure = exposure(self.portfolio.lineups(), count);
        let lineups = self.portfolio.into_ranked(count);

        info!(
            requested = count,
            produced = lineups.len(),
            iterations = self.iterations,
            solves = self.solves,
            infeasible = self.infeasible,
            invalid = self.invalid,
            duplicates = self.duplicates,
            cancelled = self.cancelled,
            "lineup generation finished"
        );

        GenerationResult {
            lineups,
            exposure,
            iterations: self.iterations,
            solves: self.solves,
            infeasible: self.infeasible,
            invalid: self.invalid,
            duplicates: self.duplicates,
            cancelled: self.cancelled,
        }
    }
}
