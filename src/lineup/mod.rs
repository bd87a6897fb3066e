//! Lineup portfolio generation.
//!
//! Produces several distinct high-scoring lineups by solving one
//! single-lineup model per iteration and steering each model with what
//! the previous iterations accepted.
//!
//! # Key Components
//!
//! - **Config**: [`GeneratorConfig`], [`RosterRules`]
//! - **Model builder**: [`build_model`], [`decode_lineup`]
//! - **Exposure**: [`exposure`], [`overexposed`], [`underexposed`]
//! - **Diversity**: [`diversity_exclusions`]
//! - **Portfolio**: [`Lineup`], [`Portfolio`], [`dedup`], [`rank`]
//! - **Controller**: [`LineupGenerator`]
//!
//! The result is a greedy, randomized heuristic: neither global optimality
//! of the portfolio nor reaching `lineup_count` is guaranteed.

mod builder;
mod config;
mod diversity;
mod exposure;
mod portfolio;
mod runner;

pub use builder::{build_model, decode_lineup};
pub use config::{GeneratorConfig, RosterRules};
pub use diversity::diversity_exclusions;
pub use exposure::{exposure, overexposed, underexposed, ExposureDeficit};
pub use portfolio::{dedup, rank, Lineup, Portfolio};
pub use runner::{forced_lock_count, GenerationResult, LineupGenerator};
