//! An exact-rational feasibility solver: phase-one simplex with Bland's
//! rule, plus branch-and-bound on the integer-constrained dimensions.
//!
//! This is the engine behind `contains_integer_point`: the caller
//! tightens every constraint to integer bounds and asks for
//! satisfiability. Everything is computed over `BigRational`, with no
//! floating point anywhere.

use crate::constraint::{Constraint, ConstraintKind, Rel};
use crate::error::{Error, Result};
use hedra_num::{Coefficient, Variable};
use num::{BigRational, One, Signed, Zero};
use std::collections::BTreeSet;

/// The outcome of a feasibility query.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MipStatus {
    Satisfiable,
    Unfeasible,
}

/// A feasibility problem: a conjunction of linear equalities and
/// non-strict inequalities, with a subset of dimensions constrained to
/// take integer values.
#[derive(Clone, Debug, Default)]
pub struct MipProblem {
    space_dim: usize,
    constraints: Vec<Constraint>,
    integer_dims: BTreeSet<usize>,
}

impl MipProblem {
    pub fn new(space_dim: usize) -> Self {
        Self {
            space_dim,
            constraints: Vec::new(),
            integer_dims: BTreeSet::new(),
        }
    }

    pub fn space_dimension(&self) -> usize {
        self.space_dim
    }

    /// Adds an equality or non-strict inequality.
    pub fn add_constraint(&mut self, c: Constraint) -> Result<()> {
        const OP: &str = "MipProblem::add_constraint";
        if c.space_dimension() > self.space_dim {
            return Err(Error::DimensionIncompatible {
                op: OP,
                receiver_dim: self.space_dim,
                operand_dim: c.space_dimension(),
            });
        }
        if c.kind() == ConstraintKind::StrictInequality {
            return Err(Error::InvalidArgument {
                op: OP,
                reason: "strict inequalities must be tightened away by the caller",
            });
        }
        self.constraints.push(c);
        Ok(())
    }

    /// Requires dimension `v` to take integer values.
    pub fn add_integer_dimension(&mut self, v: Variable) -> Result<()> {
        if v.id() >= self.space_dim {
            return Err(Error::DimensionIncompatible {
                op: "MipProblem::add_integer_dimension",
                receiver_dim: self.space_dim,
                operand_dim: v.space_dimension(),
            });
        }
        self.integer_dims.insert(v.id());
        Ok(())
    }

    /// Decides satisfiability.
    pub fn solve(&self) -> Result<MipStatus> {
        let mut extra: Vec<Constraint> = Vec::new();
        Ok(self.branch(&mut extra))
    }

    fn branch(&self, extra: &mut Vec<Constraint>) -> MipStatus {
        let Some(solution) = self.lp_solve(extra) else {
            return MipStatus::Unfeasible;
        };
        let fractional = self
            .integer_dims
            .iter()
            .find(|&&d| !solution[d].is_integer());
        let Some(&d) = fractional else {
            return MipStatus::Satisfiable;
        };
        let floor = solution[d].floor().to_integer();
        let v = Variable(d);
        extra.push(v.le(Coefficient::from(floor.clone())));
        if self.branch(extra) == MipStatus::Satisfiable {
            extra.pop();
            return MipStatus::Satisfiable;
        }
        extra.pop();
        extra.push(v.ge(Coefficient::from(floor + 1)));
        let status = self.branch(extra);
        extra.pop();
        status
    }

    /// Phase-one simplex: a rational point satisfying every constraint,
    /// or `None`. Bland's rule makes the pivoting finite.
    fn lp_solve(&self, extra: &[Constraint]) -> Option<Vec<BigRational>> {
        let n = self.space_dim;
        let all: Vec<&Constraint> = self
            .constraints
            .iter()
            .chain(extra.iter())
            .filter(|c| !c.is_tautological())
            .collect();
        if all.iter().any(|c| c.is_inconsistent()) {
            return None;
        }
        let m = all.len();
        if m == 0 {
            return Some(vec![BigRational::zero(); n]);
        }
        let num_slacks = all.iter().filter(|c| c.is_inequality()).count();
        // Columns: x+ and x- pairs, slacks, artificials.
        let num_cols = 2 * n + num_slacks + m;
        let mut tableau = vec![vec![BigRational::zero(); num_cols]; m];
        let mut rhs = vec![BigRational::zero(); m];
        let mut slack = 0;
        for (i, c) in all.iter().enumerate() {
            for j in 0..n {
                let a = BigRational::from_integer(c.coefficient(Variable(j)));
                tableau[i][2 * j] = a.clone();
                tableau[i][2 * j + 1] = -a;
            }
            if c.is_inequality() {
                // sum a_j x_j + b >= 0 becomes sum a_j x_j - s = -b.
                tableau[i][2 * n + slack] = -BigRational::one();
                slack += 1;
            }
            rhs[i] = -BigRational::from_integer(c.inhomogeneous_term().clone());
            if rhs[i].is_negative() {
                for cell in &mut tableau[i] {
                    *cell = -cell.clone();
                }
                rhs[i] = -rhs[i].clone();
            }
            tableau[i][2 * n + num_slacks + i] = BigRational::one();
        }
        let mut basis: Vec<usize> = (0..m).map(|i| 2 * n + num_slacks + i).collect();
        let artificial_start = 2 * n + num_slacks;

        loop {
            // Reduced costs for the phase-one objective (the sum of the
            // artificial variables).
            let mut entering = None;
            for j in 0..artificial_start {
                if basis.contains(&j) {
                    continue;
                }
                let mut z = BigRational::zero();
                for i in 0..m {
                    if basis[i] >= artificial_start {
                        z += &tableau[i][j];
                    }
                }
                // c_j = 0, so the reduced cost is -z.
                if z.is_positive() {
                    entering = Some(j);
                    break;
                }
            }
            let Some(enter) = entering else {
                break;
            };
            // Ratio test, ties broken by the smallest basis index.
            let mut leaving: Option<usize> = None;
            let mut best: Option<BigRational> = None;
            for i in 0..m {
                if tableau[i][enter].is_positive() {
                    let ratio = &rhs[i] / &tableau[i][enter];
                    let better = match &best {
                        None => true,
                        Some(b) => {
                            ratio < *b || (ratio == *b && basis[i] < basis[leaving.unwrap()])
                        }
                    };
                    if better {
                        best = Some(ratio);
                        leaving = Some(i);
                    }
                }
            }
            let leave = leaving.expect("a bounded phase-one objective always admits a pivot");
            // Pivot.
            let pivot = tableau[leave][enter].clone();
            for cell in &mut tableau[leave] {
                *cell /= &pivot;
            }
            rhs[leave] /= &pivot;
            for i in 0..m {
                if i != leave && !tableau[i][enter].is_zero() {
                    let factor = tableau[i][enter].clone();
                    for j in 0..num_cols {
                        let delta = &factor * &tableau[leave][j];
                        tableau[i][j] -= delta;
                    }
                    let delta = &factor * &rhs[leave];
                    rhs[i] -= delta;
                }
            }
            basis[leave] = enter;
        }

        // Optimal: feasible exactly when every artificial sits at zero.
        let infeasibility = (0..m)
            .filter(|&i| basis[i] >= artificial_start)
            .fold(BigRational::zero(), |acc, i| acc + &rhs[i]);
        if !infeasibility.is_zero() {
            return None;
        }
        let mut solution = vec![BigRational::zero(); n];
        for j in 0..n {
            let plus = basis
                .iter()
                .position(|&b| b == 2 * j)
                .map(|i| rhs[i].clone())
                .unwrap_or_else(BigRational::zero);
            let minus = basis
                .iter()
                .position(|&b| b == 2 * j + 1)
                .map(|i| rhs[i].clone())
                .unwrap_or_else(BigRational::zero);
            solution[j] = plus - minus;
        }
        Some(solution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconstrained_problems_are_satisfiable() {
        let mip = MipProblem::new(2);
        assert_eq!(mip.solve().unwrap(), MipStatus::Satisfiable);
    }

    #[test]
    fn plain_lp_feasibility() {
        let a = Variable(0);
        let b = Variable(1);
        let mut mip = MipProblem::new(2);
        mip.add_constraint(a.ge(1)).unwrap();
        mip.add_constraint(b.ge(2)).unwrap();
        mip.add_constraint((a + b).le(10)).unwrap();
        assert_eq!(mip.solve().unwrap(), MipStatus::Satisfiable);
        mip.add_constraint((a + b).ge(11)).unwrap();
        assert_eq!(mip.solve().unwrap(), MipStatus::Unfeasible);
    }

    #[test]
    fn equalities_pin_the_solution() {
        let a = Variable(0);
        let b = Variable(1);
        let mut mip = MipProblem::new(2);
        mip.add_constraint((a + b).eq(3)).unwrap();
        mip.add_constraint((a - b).eq(1)).unwrap();
        mip.add_constraint(a.ge(2)).unwrap();
        assert_eq!(mip.solve().unwrap(), MipStatus::Satisfiable);
        mip.add_constraint(a.ge(3)).unwrap();
        assert_eq!(mip.solve().unwrap(), MipStatus::Unfeasible);
    }

    #[test]
    fn negative_solutions_are_found() {
        let a = Variable(0);
        let mut mip = MipProblem::new(1);
        mip.add_constraint(a.le(-5)).unwrap();
        assert_eq!(mip.solve().unwrap(), MipStatus::Satisfiable);
    }

    #[test]
    fn branching_finds_integer_points() {
        let a = Variable(0);
        let b = Variable(1);
        // 1/2 <= a <= 5/2, 2/3 <= b <= 7/3.
        let mut mip = MipProblem::new(2);
        mip.add_constraint((2 * a).ge(1)).unwrap();
        mip.add_constraint((2 * a).le(5)).unwrap();
        mip.add_constraint((3 * b).ge(2)).unwrap();
        mip.add_constraint((3 * b).le(7)).unwrap();
        mip.add_integer_dimension(a).unwrap();
        mip.add_integer_dimension(b).unwrap();
        assert_eq!(mip.solve().unwrap(), MipStatus::Satisfiable);
    }

    #[test]
    fn branching_rules_out_fractional_slivers() {
        let a = Variable(0);
        // 1/3 <= a <= 2/3 has no integer solution.
        let mut mip = MipProblem::new(1);
        mip.add_constraint((3 * a).ge(1)).unwrap();
        mip.add_constraint((3 * a).le(2)).unwrap();
        assert_eq!(mip.solve().unwrap(), MipStatus::Satisfiable);
        mip.add_integer_dimension(a).unwrap();
        assert_eq!(mip.solve().unwrap(), MipStatus::Unfeasible);
    }

    #[test]
    fn strict_inequalities_are_rejected() {
        let a = Variable(0);
        let mut mip = MipProblem::new(1);
        assert!(mip.add_constraint(a.gt(0)).is_err());
    }
}
