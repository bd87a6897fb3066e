//! Integer-programming (IP) layer.
//!
//! Provides a small modeling vocabulary for pure-binary linear programs
//! and the solver seam the lineup controller talks to.
//!
//! # Key Components
//!
//! - **Model**: [`IpModel`]: binary variables, [`LinearConstraint`]s with
//!   a [`Bound`], and a linear [`Objective`]
//! - **Solver**: [`IpSolver`] trait: interface for solver adapters
//! - **Reference solver**: [`BranchBoundSolver`]: exact search for small
//!   binary models, used when no external solver is plugged in
//!
//! # Design
//!
//! The solve itself is an external concern. Adapters for GLPK, CBC or
//! HiGHS implement [`IpSolver`]; the controller only consumes the returned
//! [`SolverStatus`], assignment and objective value.

mod model;
mod solver;

pub use model::{Bound, IpModel, LinearConstraint, Objective};
pub use solver::{BranchBoundSolver, IpSolution, IpSolver, SolverConfig, SolverStatus};
