//! IP model definition.

use std::collections::HashSet;

/// Bound applied to the activity (left-hand side) of a linear constraint.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Bound {
    /// `activity <= ub`
    Upper(f64),
    /// `activity >= lb`
    Lower(f64),
    /// `activity == value`
    Fixed(f64),
    /// `lb <= activity <= ub`
    Range(f64, f64),
}

impl Bound {
    /// Lower and upper limits of the bound (infinite where open).
    pub fn limits(&self) -> (f64, f64) {
        match *self {
            Bound::Upper(ub) => (f64::NEG_INFINITY, ub),
            Bound::Lower(lb) => (lb, f64::INFINITY),
            Bound::Fixed(v) => (v, v),
            Bound::Range(lb, ub) => (lb, ub),
        }
    }

    /// Whether `activity` satisfies the bound within `tol`.
    pub fn contains(&self, activity: f64, tol: f64) -> bool {
        let (lb, ub) = self.limits();
        activity >= lb - tol && activity <= ub + tol
    }
}

/// A named linear constraint `bound(Σ coef · var)`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinearConstraint {
    pub name: String,
    /// (variable_name, coefficient) pairs.
    pub terms: Vec<(String, f64)>,
    pub bound: Bound,
}

/// Objective function for the IP model.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Objective {
    /// Minimize a linear combination of variables.
    Minimize {
        /// (variable_name, coefficient) pairs.
        terms: Vec<(String, f64)>,
    },

    /// Maximize a linear combination of variables.
    Maximize {
        /// (variable_name, coefficient) pairs.
        terms: Vec<(String, f64)>,
    },
}

impl Objective {
    pub fn terms(&self) -> &[(String, f64)] {
        match self {
            Objective::Minimize { terms } | Objective::Maximize { terms } => terms,
        }
    }

    pub fn is_maximize(&self) -> bool {
        matches!(self, Objective::Maximize { .. })
    }
}

/// A pure-binary integer-programming model.
///
/// Every variable is a 0/1 decision; constraints are linear with a
/// [`Bound`] on their activity.
///
/// # Examples
///
/// ```
/// use u_lineup::ip::{Bound, IpModel, Objective};
///
/// let mut model = IpModel::new("pick-two");
/// for name in ["a", "b", "c"] {
///     model.add_binary(name);
/// }
/// model.add_constraint(
///     "count",
///     vec![("a".into(), 1.0), ("b".into(), 1.0), ("c".into(), 1.0)],
///     Bound::Fixed(2.0),
/// );
/// model.set_objective(Objective::Maximize {
///     terms: vec![("a".into(), 3.0), ("b".into(), 1.0), ("c".into(), 2.0)],
/// });
/// assert!(model.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IpModel {
    /// Model name.
    pub name: String,
    /// Binary variables in declaration order.
    pub binaries: Vec<String>,
    /// Constraints.
    pub constraints: Vec<LinearConstraint>,
    /// Objective function.
    pub objective: Option<Objective>,
}

impl IpModel {
    /// Creates a new empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            binaries: Vec::new(),
            constraints: Vec::new(),
            objective: None,
        }
    }

    /// Declares a binary variable.
    pub fn add_binary(&mut self, name: impl Into<String>) {
        self.binaries.push(name.into());
    }

    /// Adds a linear constraint.
    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        terms: Vec<(String, f64)>,
        bound: Bound,
    ) {
        self.constraints.push(LinearConstraint {
            name: name.into(),
            terms,
            bound,
        });
    }

    /// Convenience: fix a single variable to `value`.
    pub fn fix(&mut self, name: impl Into<String>, var: impl Into<String>, value: f64) {
        self.add_constraint(name, vec![(var.into(), 1.0)], Bound::Fixed(value));
    }

    /// Sets the objective function.
    pub fn set_objective(&mut self, objective: Objective) {
        self.objective = Some(objective);
    }

    /// Validates the model for consistency.
    ///
    /// Checks that variables are unique, that all referenced variable
    /// names exist, and that range bounds are ordered.
    pub fn validate(&self) -> Result<(), String> {
        let mut declared = HashSet::with_capacity(self.binaries.len());
        for name in &self.binaries {
            if !declared.insert(name.as_str()) {
                return Err(format!("duplicate variable: {name}"));
            }
        }

        for c in &self.constraints {
            for (var, _) in &c.terms {
                if !declared.contains(var.as_str()) {
                    return Err(format!("constraint {}: undefined variable: {var}", c.name));
                }
            }
            let (lb, ub) = c.bound.limits();
            if lb.is_nan() || ub.is_nan() || lb > ub {
                return Err(format!("constraint {}: empty bound [{lb}, {ub}]", c.name));
            }
        }

        if let Some(objective) = &self.objective {
            for (var, _) in objective.terms() {
                if !declared.contains(var.as_str()) {
                    return Err(format!("objective: undefined variable: {var}"));
                }
            }
        }
        Ok(())
    }

    /// Returns the number of variables.
    pub fn variable_count(&self) -> usize {
        self.binaries.len()
    }

    /// Returns the number of constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }
}
