//! IP solver interface and reference branch-and-bound implementation.

use super::model::IpModel;
use crate::error::SolverError;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

const TOL: f64 = 1e-9;

/// Golden-section ratio used to search the Lagrange multiplier.
const GOLDEN: f64 = 0.618_033_988_749_895;

/// Golden-section iterations per node when the cheap bound fails to prune.
const LAGRANGE_STEPS: usize = 12;

/// Status of the solver after execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolverStatus {
    /// Proven optimal solution found.
    Optimal,
    /// Feasible (but not necessarily optimal) solution found.
    Feasible,
    /// No feasible solution exists.
    Infeasible,
    /// Model is invalid or malformed.
    ModelInvalid,
    /// Solver exceeded a time or node limit without finding a solution.
    Timeout,
    /// No solution found for unknown reasons.
    Unknown,
}

/// Solution from an IP solver.
#[derive(Debug, Clone)]
pub struct IpSolution {
    /// Solver status.
    pub status: SolverStatus,
    /// Objective function value (if any).
    pub objective_value: Option<f64>,
    /// Binary variable assignments.
    pub assignment: HashMap<String, bool>,
    /// Search nodes explored (0 for adapters that do not report it).
    pub nodes: u64,
    /// Solve time in milliseconds.
    pub solve_time_ms: i64,
}

impl IpSolution {
    /// Creates an empty solution with the given status.
    pub fn empty(status: SolverStatus) -> Self {
        Self {
            status,
            objective_value: None,
            assignment: HashMap::new(),
            nodes: 0,
            solve_time_ms: 0,
        }
    }

    /// Whether a feasible solution was found.
    pub fn is_solution_found(&self) -> bool {
        matches!(self.status, SolverStatus::Optimal | SolverStatus::Feasible)
    }

    /// Whether `var` is set to 1.
    pub fn is_selected(&self, var: &str) -> bool {
        self.assignment.get(var).copied().unwrap_or(false)
    }
}

/// Solver configuration.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolverConfig {
    /// Maximum solve time in milliseconds.
    pub time_limit_ms: u64,
    /// Maximum number of search nodes (None for unlimited).
    pub node_limit: Option<u64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: 60_000,
            node_limit: None,
        }
    }
}

impl SolverConfig {
    /// Sets the time limit.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.time_limit_ms = ms;
        self
    }

    /// Sets the node limit.
    pub fn with_node_limit(mut self, nodes: u64) -> Self {
        self.node_limit = Some(nodes);
        self
    }
}

/// Trait for IP solver implementations.
///
/// Implementors wrap an external solver (GLPK, CBC, HiGHS, ...) or provide
/// their own search. The call blocks until the solver finishes; limits in
/// [`SolverConfig`] are the adapter's responsibility.
///
/// Return `Err` only when the solver itself cannot run. Infeasible models,
/// timeouts and invalid models are reported through [`SolverStatus`].
pub trait IpSolver {
    /// Solves the model and returns a solution.
    fn solve(&self, model: &IpModel, config: &SolverConfig) -> Result<IpSolution, SolverError>;
}

/// Exact depth-first branch-and-bound for pure-binary models.
///
/// Variables are branched in order of decreasing objective coefficient,
/// trying 1 before 0. A node is pruned when some constraint can no longer
/// reach its bound, or when an optimistic objective cannot beat the
/// incumbent. The optimistic objective is computed in two stages:
///
/// 1. If a row with unit coefficients on every variable caps the number of
///    picks (a roster size), only the best `r` remaining coefficients are
///    counted, where `r` is the picks that row still allows.
/// 2. If that is not enough to prune and a non-negative row with a finite
///    upper bound exists (a salary cap), that row is relaxed with a
///    multiplier `λ`: `λ·room + top r of (c - λ·w)`. Any `λ >= 0` gives a
///    valid bound; a short golden-section search looks for the tightest.
///
/// # Limitations
///
/// - Exponential in the worst case; one budget row is relaxed, others are
///   only used for feasibility pruning
pub struct BranchBoundSolver;

impl BranchBoundSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BranchBoundSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl IpSolver for BranchBoundSolver {
    fn solve(&self, model: &IpModel, config: &SolverConfig) -> Result<IpSolution, SolverError> {
        if let Err(e) = model.validate() {
            debug!(model = %model.name, error = %e, "rejecting invalid model");
            return Ok(IpSolution::empty(SolverStatus::ModelInvalid));
        }

        let start_time = Instant::now();
        let n = model.binaries.len();
        let position: HashMap<&str, usize> = model
            .binaries
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();

        // Normalize to maximization
        let sign = match &model.objective {
            Some(o) if !o.is_maximize() => -1.0,
            _ => 1.0,
        };
        let mut coefs = vec![0.0; n];
        if let Some(objective) = &model.objective {
            for (var, coef) in objective.terms() {
                coefs[position[var.as_str()]] += sign * coef;
            }
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| coefs[b].total_cmp(&coefs[a]).then(a.cmp(&b)));
        let mut rank = vec![0; n];
        for (depth, &var) in order.iter().enumerate() {
            rank[var] = depth;
        }

        let obj: Vec<f64> = order.iter().map(|&v| coefs[v]).collect();
        let mut obj_prefix = vec![0.0; n + 1];
        for (i, c) in obj.iter().enumerate() {
            obj_prefix[i + 1] = obj_prefix[i] + c.max(0.0);
        }

        let rows: Vec<Row> = model
            .constraints
            .iter()
            .map(|c| {
                let mut dense = vec![0.0; n];
                for (var, coef) in &c.terms {
                    dense[rank[position[var.as_str()]]] += coef;
                }
                let (lb, ub) = c.bound.limits();
                Row {
                    suffix_min: suffix_sums(&dense, |c| c.min(0.0)),
                    suffix_max: suffix_sums(&dense, |c| c.max(0.0)),
                    coefs: dense,
                    lb,
                    ub,
                }
            })
            .collect();

        let cardinality = cardinality_row(&rows);
        let budget = budget_row(&rows, cardinality);
        let lambda_max = budget.map_or(0.0, |b| {
            obj.iter()
                .zip(&rows[b].coefs)
                .filter(|&(&c, &w)| c > 0.0 && w > 0.0)
                .map(|(&c, &w)| c / w)
                .fold(0.0, f64::max)
        });

        let mut search = Search {
            activity: vec![0.0; rows.len()],
            obj,
            obj_prefix,
            rows,
            cardinality,
            budget,
            lambda_max,
            lambda_hint: 0.0,
            scratch: Vec::new(),
            current: vec![false; n],
            best: None,
            nodes: 0,
            node_limit: config.node_limit,
            deadline: start_time + Duration::from_millis(config.time_limit_ms),
            aborted: false,
        };
        search.dfs(0, 0.0);

        let status = match (search.best.is_some(), search.aborted) {
            (true, false) => SolverStatus::Optimal,
            (true, true) => SolverStatus::Feasible,
            (false, false) => SolverStatus::Infeasible,
            (false, true) => SolverStatus::Timeout,
        };

        let mut solution = IpSolution::empty(status);
        solution.nodes = search.nodes;
        if let Some((value, picks)) = search.best {
            solution.objective_value = Some(sign * value);
            solution.assignment = order
                .iter()
                .zip(picks)
                .map(|(&var, on)| (model.binaries[var].clone(), on))
                .collect();
        }
        solution.solve_time_ms = start_time.elapsed().as_millis() as i64;

        debug!(
            model = %model.name,
            ?status,
            nodes = solution.nodes,
            "branch-and-bound finished"
        );
        Ok(solution)
    }
}

/// A constraint in dense search order with remaining-activity envelopes.
struct Row {
    coefs: Vec<f64>,
    lb: f64,
    ub: f64,
    /// `suffix_min[d]`: smallest activity still addable from depth `d` on.
    suffix_min: Vec<f64>,
    /// `suffix_max[d]`: largest activity still addable from depth `d` on.
    suffix_max: Vec<f64>,
}

struct Search {
    obj: Vec<f64>,
    /// `obj_prefix[d]`: sum of the positive coefficients before depth `d`.
    obj_prefix: Vec<f64>,
    rows: Vec<Row>,
    /// Row bounding the number of picks, if any.
    cardinality: Option<usize>,
    /// Row relaxed into the objective bound, if any.
    budget: Option<usize>,
    /// Multiplier beyond which every reduced coefficient is non-positive.
    lambda_max: f64,
    /// Multiplier that pruned most recently; tried first.
    lambda_hint: f64,
    scratch: Vec<f64>,
    activity: Vec<f64>,
    current: Vec<bool>,
    best: Option<(f64, Vec<bool>)>,
    nodes: u64,
    node_limit: Option<u64>,
    deadline: Instant,
    aborted: bool,
}

impl Search {
    fn dfs(&mut self, depth: usize, value: f64) {
        if self.aborted {
            return;
        }
        self.nodes += 1;
        let over_nodes = self.node_limit.is_some_and(|limit| self.nodes > limit);
        if over_nodes || (self.nodes % 1024 == 0 && Instant::now() >= self.deadline) {
            self.aborted = true;
            return;
        }

        if let Some(best) = self.best.as_ref().map(|(v, _)| *v) {
            if self.optimistic(depth, value, best) <= best + TOL {
                return;
            }
        }

        for (r, row) in self.rows.iter().enumerate() {
            let a = self.activity[r];
            if a + row.suffix_min[depth] > row.ub + TOL || a + row.suffix_max[depth] < row.lb - TOL {
                return;
            }
        }

        if depth == self.obj.len() {
            self.best = Some((value, self.current.clone()));
            return;
        }

        self.assign(depth, true);
        self.dfs(depth + 1, value + self.obj[depth]);
        self.assign(depth, false);
        self.dfs(depth + 1, value);
    }

    /// Upper bound on any completion of the current partial assignment.
    ///
    /// Stops refining as soon as the bound drops to `best`.
    fn optimistic(&mut self, depth: usize, value: f64, best: f64) -> f64 {
        let remaining = self.obj.len() - depth;
        let picks = match self.cardinality {
            Some(r) => {
                let left = self.rows[r].ub - self.activity[r] + TOL;
                if left < 0.0 {
                    return f64::NEG_INFINITY;
                }
                (left.floor() as usize).min(remaining)
            }
            None => remaining,
        };
        let relaxed = value + self.obj_prefix[depth + picks] - self.obj_prefix[depth];
        let Some(b) = self.budget else {
            return relaxed;
        };
        if relaxed <= best + TOL || picks == 0 || self.lambda_max <= 0.0 {
            return relaxed;
        }

        let room = (self.rows[b].ub - self.activity[b]).max(0.0);
        let obj = &self.obj[depth..];
        let weights = &self.rows[b].coefs[depth..];
        let scratch = &mut self.scratch;
        let mut lagrangian =
            |lambda: f64| lambda * room + top_reduced_sum(obj, weights, lambda, picks, scratch);

        let target = best + TOL - value;
        let hinted = lagrangian(self.lambda_hint);
        if hinted <= target {
            return value + hinted;
        }

        let mut bound = (relaxed - value).min(hinted);
        let (mut lo, mut hi) = (0.0, self.lambda_max);
        let mut x1 = hi - GOLDEN * (hi - lo);
        let mut x2 = lo + GOLDEN * (hi - lo);
        let mut f1 = lagrangian(x1);
        let mut f2 = lagrangian(x2);
        let mut pruned_at = None;
        for _ in 0..LAGRANGE_STEPS {
            if f1 <= target {
                pruned_at = Some(x1);
                break;
            }
            if f2 <= target {
                pruned_at = Some(x2);
                break;
            }
            // The Lagrangian is convex in λ
            if f1 <= f2 {
                hi = x2;
                x2 = x1;
                f2 = f1;
                x1 = hi - GOLDEN * (hi - lo);
                f1 = lagrangian(x1);
            } else {
                lo = x1;
                x1 = x2;
                f1 = f2;
                x2 = lo + GOLDEN * (hi - lo);
                f2 = lagrangian(x2);
            }
        }
        bound = bound.min(f1).min(f2);
        if let Some(lambda) = pruned_at {
            self.lambda_hint = lambda;
        }
        value + bound
    }

    fn assign(&mut self, depth: usize, on: bool) {
        if self.current[depth] == on {
            return;
        }
        self.current[depth] = on;
        let sign = if on { 1.0 } else { -1.0 };
        for (r, row) in self.rows.iter().enumerate() {
            self.activity[r] += sign * row.coefs[depth];
        }
    }
}

/// Sum of the `picks` largest positive values of `obj[i] - lambda * weights[i]`.
fn top_reduced_sum(
    obj: &[f64],
    weights: &[f64],
    lambda: f64,
    picks: usize,
    top: &mut Vec<f64>,
) -> f64 {
    let reduced = obj.iter().zip(weights).map(|(&c, &w)| c - lambda * w);
    if picks == 0 {
        return 0.0;
    }
    if picks >= obj.len() {
        return reduced.filter(|&v| v > 0.0).sum();
    }

    // `top` stays sorted in decreasing order
    top.clear();
    for v in reduced.filter(|&v| v > 0.0) {
        if top.len() == picks {
            if top.last().is_some_and(|&low| v <= low) {
                continue;
            }
            top.pop();
        }
        let at = top.iter().position(|&x| x < v).unwrap_or(top.len());
        top.insert(at, v);
    }
    top.iter().sum()
}

/// Tightest row with a unit coefficient on every variable and a finite upper bound.
fn cardinality_row(rows: &[Row]) -> Option<usize> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| {
            !row.coefs.is_empty()
                && row.ub.is_finite()
                && row.coefs.iter().all(|&c| (c - 1.0).abs() < TOL)
        })
        .min_by(|(_, a), (_, b)| a.ub.total_cmp(&b.ub))
        .map(|(r, _)| r)
}

/// Non-negative row with a finite upper bound touching the most variables.
fn budget_row(rows: &[Row], cardinality: Option<usize>) -> Option<usize> {
    rows.iter()
        .enumerate()
        .filter(|&(r, row)| {
            Some(r) != cardinality && row.ub.is_finite() && row.coefs.iter().all(|&c| c >= 0.0)
        })
        .map(|(r, row)| (r, row.coefs.iter().filter(|&&c| c > 0.0).count()))
        .filter(|&(_, support)| support > 1)
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        .map(|(r, _)| r)
}

fn suffix_sums(values: &[f64], f: impl Fn(f64) -> f64) -> Vec<f64> {
    let mut out = vec![0.0; values.len() + 1];
    for i in (0..values.len()).rev() {
        out[i] = out[i + 1] + f(values[i]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ip::{Bound, Objective};

    fn knapsack(values: &[f64], weights: &[f64], cap: f64, count: Option<f64>) -> IpModel {
        let mut model = IpModel::new("knapsack");
        let names: Vec<String> = (0..values.len()).map(|i| format!("x{i}")).collect();
        for name in &names {
            model.add_binary(name.clone());
        }
        model.add_constraint(
            "cost",
            names.iter().cloned().zip(weights.iter().copied()).collect(),
            Bound::Upper(cap),
        );
        if let Some(k) = count {
            model.add_constraint(
                "count",
                names.iter().map(|n| (n.clone(), 1.0)).collect(),
                Bound::Fixed(k),
            );
        }
        model.set_objective(Objective::Maximize {
            terms: names.iter().cloned().zip(values.iter().copied()).collect(),
        });
        model
    }

    fn brute_force(values: &[f64], weights: &[f64], cap: f64, count: Option<usize>) -> Option<f64> {
        let n = values.len();
        let mut best: Option<f64> = None;
        for mask in 0u32..(1 << n) {
            if count.is_some_and(|k| mask.count_ones() as usize != k) {
                continue;
            }
            let (mut v, mut w) = (0.0, 0.0);
            for i in 0..n {
                if mask & (1 << i) != 0 {
                    v += values[i];
                    w += weights[i];
                }
            }
            if w <= cap + TOL && best.map_or(true, |b| v > b) {
                best = Some(v);
            }
        }
        best
    }

    #[test]
    fn test_solves_knapsack_optimally() {
        let values = [10.0, 13.0, 7.0, 8.0, 2.0, 9.0];
        let weights = [5.0, 8.0, 3.0, 4.0, 1.0, 6.0];
        let model = knapsack(&values, &weights, 12.0, None);

        let solution = BranchBoundSolver::new()
            .solve(&model, &SolverConfig::default())
            .unwrap();

        assert_eq!(solution.status, SolverStatus::Optimal);
        let expected = brute_force(&values, &weights, 12.0, None).unwrap();
        assert!((solution.objective_value.unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_cardinality_matches_brute_force() {
        let values = [4.0, 9.0, 3.0, 8.0, 7.0, 1.0, 6.0, 5.0, 2.0];
        let weights = [2.0, 9.0, 1.0, 7.0, 6.0, 1.0, 5.0, 3.0, 2.0];
        for cap in [8.0, 12.0, 20.0] {
            let model = knapsack(&values, &weights, cap, Some(3.0));
            let solution = BranchBoundSolver::new()
                .solve(&model, &SolverConfig::default())
                .unwrap();
            let expected = brute_force(&values, &weights, cap, Some(3)).unwrap();

            assert_eq!(solution.status, SolverStatus::Optimal);
            assert!(
                (solution.objective_value.unwrap() - expected).abs() < 1e-9,
                "cap {cap}: got {:?}, expected {expected}",
                solution.objective_value
            );
            let picked = solution.assignment.values().filter(|&&on| on).count();
            assert_eq!(picked, 3);
        }
    }

    #[test]
    fn test_fixed_variable_respected() {
        let values = [10.0, 1.0, 9.0];
        let weights = [1.0, 1.0, 1.0];
        let mut model = knapsack(&values, &weights, 10.0, Some(2.0));
        model.fix("x1 Locked", "x1", 1.0);

        let solution = BranchBoundSolver::new()
            .solve(&model, &SolverConfig::default())
            .unwrap();

        assert_eq!(solution.status, SolverStatus::Optimal);
        assert!(solution.is_selected("x1"));
        assert!(solution.is_selected("x0"));
        assert!(!solution.is_selected("x2"));
    }

    #[test]
    fn test_infeasible() {
        let model = knapsack(&[1.0, 1.0], &[5.0, 5.0], 4.0, Some(1.0));
        let solution = BranchBoundSolver::new()
            .solve(&model, &SolverConfig::default())
            .unwrap();

        assert_eq!(solution.status, SolverStatus::Infeasible);
        assert!(!solution.is_solution_found());
        assert!(solution.assignment.is_empty());
    }

    #[test]
    fn test_cardinality_larger_than_pool_is_infeasible() {
        let model = knapsack(&[1.0, 2.0], &[1.0, 1.0], 10.0, Some(3.0));
        let solution = BranchBoundSolver::new()
            .solve(&model, &SolverConfig::default())
            .unwrap();

        assert_eq!(solution.status, SolverStatus::Infeasible);
    }

    #[test]
    fn test_minimize() {
        let mut model = IpModel::new("min");
        model.add_binary("a");
        model.add_binary("b");
        model.add_binary("c");
        model.add_constraint(
            "at least two",
            vec![("a".into(), 1.0), ("b".into(), 1.0), ("c".into(), 1.0)],
            Bound::Lower(2.0),
        );
        model.set_objective(Objective::Minimize {
            terms: vec![("a".into(), 5.0), ("b".into(), 1.0), ("c".into(), 2.0)],
        });

        let solution = BranchBoundSolver::new()
            .solve(&model, &SolverConfig::default())
            .unwrap();

        assert_eq!(solution.status, SolverStatus::Optimal);
        assert!((solution.objective_value.unwrap() - 3.0).abs() < 1e-9);
        assert!(!solution.is_selected("a"));
    }

    #[test]
    fn test_invalid_model() {
        let mut model = IpModel::new("bad");
        model.add_constraint("c", vec![("ghost".into(), 1.0)], Bound::Upper(1.0));

        let solution = BranchBoundSolver::new()
            .solve(&model, &SolverConfig::default())
            .unwrap();

        assert_eq!(solution.status, SolverStatus::ModelInvalid);
    }

    #[test]
    fn test_node_limit_cuts_search() {
        let values: Vec<f64> = (0..16).map(|i| i as f64).collect();
        let weights = vec![1.0; 16];
        let model = knapsack(&values, &weights, 8.0, Some(8.0));
        let config = SolverConfig::default().with_node_limit(3);

        let solution = BranchBoundSolver::new().solve(&model, &config).unwrap();

        assert!(matches!(
            solution.status,
            SolverStatus::Timeout | SolverStatus::Feasible
        ));
        assert_ne!(solution.status, SolverStatus::Optimal);
    }

    /// Exact best value of `k` items within `cap`, by DP over integer weights.
    fn best_of_k(values: &[f64], units: &[usize], cap: usize, k: usize) -> Option<f64> {
        let mut dp: Vec<Vec<Option<f64>>> = vec![vec![None; cap + 1]; k + 1];
        dp[0][0] = Some(0.0);
        for (&v, &w) in values.iter().zip(units) {
            for j in (1..=k).rev() {
                for c in (w..=cap).rev() {
                    if let Some(prev) = dp[j - 1][c - w] {
                        if dp[j][c].map_or(true, |cur| prev + v > cur) {
                            dp[j][c] = Some(prev + v);
                        }
                    }
                }
            }
        }
        dp[k].iter().flatten().copied().reduce(f64::max)
    }

    #[test]
    fn test_full_slate_solved_to_optimality() {
        use crate::random::create_rng;
        use rand::Rng;

        let mut rng = create_rng(2024);
        let units: Vec<usize> = (0..100).map(|_| rng.random_range(60..=120)).collect();
        let weights: Vec<f64> = units.iter().map(|&u| (u * 100) as f64).collect();
        // Projections track salary, as on a real slate
        let values: Vec<f64> = weights
            .iter()
            .map(|&w| w / 400.0 + rng.random_range(-4.0..4.0))
            .collect();
        let model = knapsack(&values, &weights, 50_000.0, Some(6.0));
        let config = SolverConfig::default().with_time_limit_ms(20_000);

        let solution = BranchBoundSolver::new().solve(&model, &config).unwrap();

        assert_eq!(solution.status, SolverStatus::Optimal);
        let expected = best_of_k(&values, &units, 500, 6).unwrap();
        assert!(
            (solution.objective_value.unwrap() - expected).abs() < 1e-6,
            "got {:?}, expected {expected}",
            solution.objective_value
        );
        assert_eq!(solution.assignment.values().filter(|&&on| on).count(), 6);
    }

    #[test]
    fn test_top_reduced_sum() {
        let mut top = Vec::new();
        let obj = [9.0, 7.0, 5.0, 1.0];
        let weights = [4.0, 1.0, 2.0, 0.0];

        assert!((top_reduced_sum(&obj, &weights, 0.0, 2, &mut top) - 16.0).abs() < 1e-12);
        // Reduced: 1, 5, 1, 1
        assert!((top_reduced_sum(&obj, &weights, 2.0, 2, &mut top) - 6.0).abs() < 1e-12);
        assert!((top_reduced_sum(&obj, &weights, 2.0, 9, &mut top) - 8.0).abs() < 1e-12);
        assert_eq!(top_reduced_sum(&obj, &weights, 0.0, 0, &mut top), 0.0);
    }

    #[test]
    fn test_solver_config_default() {
        let config = SolverConfig::default();
        assert_eq!(config.time_limit_ms, 60_000);
        assert!(config.node_limit.is_none());
    }
}
