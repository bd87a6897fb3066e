//! Generator configuration.

use crate::error::{LineupError, LineupResult};
use crate::ip::SolverConfig;

/// Shape of a legal lineup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RosterRules {
    /// Exact number of players per lineup.
    pub roster_size: usize,
    /// Maximum total salary of one lineup.
    pub salary_cap: u32,
}

impl Default for RosterRules {
    fn default() -> Self {
        Self {
            roster_size: 6,
            salary_cap: 50_000,
        }
    }
}

/// Configuration for a lineup generation run.
///
/// # Examples
///
/// ```
/// use u_lineup::lineup::GeneratorConfig;
///
/// let config = GeneratorConfig::default()
///     .with_lineup_count(20)
///     .with_min_uniqueness(2)
///     .with_max_exposure(0.6)
///     .with_seed(7);
/// assert_eq!(config.lineup_count, 20);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeneratorConfig {
    /// Number of lineups requested.
    pub lineup_count: usize,

    /// Minimum number of players by which every pair of lineups must differ.
    pub min_uniqueness: usize,

    /// Global cap on the fraction of lineups containing any one player.
    ///
    /// Individual players may tighten (never loosen) this with their own
    /// `max_exposure`.
    pub max_exposure: f64,

    /// Iteration budget for the generation loop, not counting the seed solve.
    ///
    /// When exhausted the run returns whatever it has; a short portfolio is
    /// not an error.
    pub max_iterations: usize,

    /// Roster size and salary cap.
    pub roster: RosterRules,

    /// Limits forwarded to the solver on every solve.
    pub solver: SolverConfig,

    /// Random seed for reproducibility.
    ///
    /// `None` uses a random seed.
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            lineup_count: 1,
            min_uniqueness: 1,
            max_exposure: 1.0,
            max_iterations: 10_000,
            roster: RosterRules::default(),
            solver: SolverConfig::default(),
            seed: None,
        }
    }
}

impl GeneratorConfig {
    /// Sets the number of lineups requested.
    pub fn with_lineup_count(mut self, n: usize) -> Self {
        self.lineup_count = n;
        self
    }

    /// Sets the minimum uniqueness between any two lineups.
    pub fn with_min_uniqueness(mut self, u: usize) -> Self {
        self.min_uniqueness = u;
        self
    }

    /// Sets the global maximum exposure.
    pub fn with_max_exposure(mut self, fraction: f64) -> Self {
        self.max_exposure = fraction;
        self
    }

    /// Sets the iteration budget.
    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    /// Sets the roster rules.
    pub fn with_roster(mut self, roster: RosterRules) -> Self {
        self.roster = roster;
        self
    }

    /// Sets the solver limits.
    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> LineupResult<()> {
        if self.lineup_count == 0 {
            return Err(invalid("lineup_count", "must be at least 1".into()));
        }
        if self.roster.roster_size == 0 {
            return Err(invalid("roster.roster_size", "must be at least 1".into()));
        }
        if self.roster.salary_cap == 0 {
            return Err(invalid("roster.salary_cap", "must be positive".into()));
        }
        if self.min_uniqueness == 0 || self.min_uniqueness > self.roster.roster_size {
            return Err(invalid(
                "min_uniqueness",
                format!(
                    "must be in 1..={}, got {}",
                    self.roster.roster_size, self.min_uniqueness
                ),
            ));
        }
        if !(0.0..=1.0).contains(&self.max_exposure) {
            return Err(invalid(
                "max_exposure",
                format!("must be in [0, 1], got {}", self.max_exposure),
            ));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> LineupError {
    LineupError::InvalidConfig { field, reason }
}
