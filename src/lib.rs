//! Daily-fantasy lineup portfolio generation.
//!
//! Builds a set of distinct lineups that maximize projected points under a
//! salary cap while respecting per-player exposure targets and a minimum
//! pairwise difference between lineups.
//!
//! - **Pool**: validated player data ([`pool::PlayerPool`]).
//! - **IP**: binary integer-programming models and the solver seam
//!   ([`ip::IpSolver`]), with an exact branch-and-bound reference solver.
//! - **Lineup**: model building, exposure tracking, diversity exclusion,
//!   deduplication and the iteration controller
//!   ([`lineup::LineupGenerator`]).
//!
//! # Example
//!
//! ```
//! use u_lineup::ip::BranchBoundSolver;
//! use u_lineup::lineup::{GeneratorConfig, LineupGenerator};
//! use u_lineup::pool::{PlayerPool, PlayerRecord};
//!
//! let records: Vec<PlayerRecord> = (0..12)
//!     .map(|i| PlayerRecord::new(format!("p{i}"), format!("{}", 30 - i), "0", "6000"))
//!     .collect();
//! let pool = PlayerPool::from_records(records);
//! let config = GeneratorConfig::default()
//!     .with_lineup_count(3)
//!     .with_min_uniqueness(2)
//!     .with_seed(42);
//!
//! let result = LineupGenerator::run(&pool, &BranchBoundSolver::new(), &config).unwrap();
//! assert_eq!(result.lineups.len(), 3);
//! assert!(result.lineups.iter().all(|l| l.salary <= 50_000));
//! ```

pub mod error;
pub mod ip;
pub mod lineup;
pub mod pool;
pub mod random;

pub use error::{LineupError, LineupResult, RecordError, SolverError};
