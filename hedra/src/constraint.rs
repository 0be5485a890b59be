//! Constraints and constraint systems.

use crate::congruence::Congruence;
use crate::error::{Error, Result};
use crate::generator::Generator;
use crate::linear_system::{LinearSystem, SystemRow};
use crate::row::{LinearRow, RowKind, Topology};
use crate::scalar_products;
use hedra_num::coefficient::sgn;
use hedra_num::{Coefficient, LinearExpr, Variable};
use num::Zero;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A relation symbol for the generalized affine transfer functions.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum RelSymbol {
    LessThan,
    LessOrEqual,
    Equal,
    GreaterOrEqual,
    GreaterThan,
    /// Never accepted; listed so callers can be told apart from typos.
    NotEqual,
}

impl RelSymbol {
    /// The symbol with its sides exchanged.
    pub fn reversed(self) -> RelSymbol {
        match self {
            RelSymbol::LessThan => RelSymbol::GreaterThan,
            RelSymbol::LessOrEqual => RelSymbol::GreaterOrEqual,
            RelSymbol::Equal => RelSymbol::Equal,
            RelSymbol::GreaterOrEqual => RelSymbol::LessOrEqual,
            RelSymbol::GreaterThan => RelSymbol::LessThan,
            RelSymbol::NotEqual => RelSymbol::NotEqual,
        }
    }

    pub fn is_strict(self) -> bool {
        matches!(self, RelSymbol::LessThan | RelSymbol::GreaterThan)
    }
}

/// The relation a [`Constraint`] imposes on its affine form.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// `e = 0`.
    Equality,
    /// `e >= 0`.
    NonstrictInequality,
    /// `e > 0`; only representable in the NNC topology.
    StrictInequality,
}

/// A linear constraint: `e = 0`, `e >= 0` or `e > 0`.
///
/// Built from affine forms through the [`Rel`] methods:
/// `(3 * a - b).ge(2)` is `3*a - b >= 2`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    row: LinearRow,
}

impl SystemRow for Constraint {
    fn from_row(row: LinearRow) -> Self {
        Self { row }
    }
    fn row(&self) -> &LinearRow {
        &self.row
    }
    fn row_mut(&mut self) -> &mut LinearRow {
        &mut self.row
    }
    fn into_row(self) -> LinearRow {
        self.row
    }
}

/// Relational constructors for constraints and congruences.
///
/// Implemented for everything convertible to a [`LinearExpr`], so both
/// `v.ge(0)` and `(2 * v + w).lt(5)` read naturally.
pub trait Rel: Into<LinearExpr> + Sized {
    /// `self = rhs`.
    fn eq(self, rhs: impl Into<LinearExpr>) -> Constraint {
        Constraint::build(self.into() - rhs.into(), ConstraintKind::Equality)
    }

    /// `self >= rhs`.
    fn ge(self, rhs: impl Into<LinearExpr>) -> Constraint {
        Constraint::build(self.into() - rhs.into(), ConstraintKind::NonstrictInequality)
    }

    /// `self <= rhs`.
    fn le(self, rhs: impl Into<LinearExpr>) -> Constraint {
        Constraint::build(rhs.into() - self.into(), ConstraintKind::NonstrictInequality)
    }

    /// `self > rhs`.
    fn gt(self, rhs: impl Into<LinearExpr>) -> Constraint {
        Constraint::build(self.into() - rhs.into(), ConstraintKind::StrictInequality)
    }

    /// `self < rhs`.
    fn lt(self, rhs: impl Into<LinearExpr>) -> Constraint {
        Constraint::build(rhs.into() - self.into(), ConstraintKind::StrictInequality)
    }

    /// `self = rhs (mod modulus)`; a zero modulus denotes an equality.
    fn congruent(
        self,
        rhs: impl Into<LinearExpr>,
        modulus: impl Into<Coefficient>,
    ) -> Congruence {
        Congruence::build(self.into() - rhs.into(), modulus.into())
    }
}

impl<T: Into<LinearExpr>> Rel for T {}

impl Constraint {
    fn build(e: LinearExpr, kind: ConstraintKind) -> Self {
        let columns = e.as_slice().to_vec();
        let mut row = match kind {
            ConstraintKind::Equality => {
                LinearRow::from_columns(columns, RowKind::LineOrEquality, Topology::Closed)
            }
            ConstraintKind::NonstrictInequality => LinearRow::from_columns(
                columns,
                RowKind::RayOrPointOrInequality,
                Topology::Closed,
            ),
            ConstraintKind::StrictInequality => {
                let mut columns = columns;
                columns.push(Coefficient::from(-1));
                LinearRow::from_columns(columns, RowKind::RayOrPointOrInequality, Topology::Nnc)
            }
        };
        row.strong_normalize();
        Self { row }
    }

    /// The `epsilon >= 0` constraint of an NNC system with the given space
    /// dimension.
    pub(crate) fn epsilon_geq_zero(space_dim: usize) -> Self {
        let mut row = LinearRow::zero(space_dim + 2, RowKind::RayOrPointOrInequality, Topology::Nnc);
        row[space_dim + 1] = Coefficient::from(1);
        Self { row }
    }

    /// The `epsilon <= 1` constraint of an NNC system with the given space
    /// dimension.
    pub(crate) fn epsilon_leq_one(space_dim: usize) -> Self {
        let mut row = LinearRow::zero(space_dim + 2, RowKind::RayOrPointOrInequality, Topology::Nnc);
        row[0] = Coefficient::from(1);
        row[space_dim + 1] = Coefficient::from(-1);
        Self { row }
    }

    /// The unsatisfiable constraint `1 = 0` over `space_dim` dimensions.
    pub(crate) fn false_constraint(topology: Topology, space_dim: usize) -> Self {
        let mut row = LinearRow::zero(
            space_dim + topology.extra_columns(),
            RowKind::LineOrEquality,
            topology,
        );
        row[0] = Coefficient::from(1);
        Self { row }
    }

    pub fn kind(&self) -> ConstraintKind {
        if self.row.is_line_or_equality() {
            ConstraintKind::Equality
        } else if self.row.topology() == Topology::Nnc && sgn(&self.row.eps_coefficient()) < 0 {
            ConstraintKind::StrictInequality
        } else {
            ConstraintKind::NonstrictInequality
        }
    }

    pub fn is_equality(&self) -> bool {
        self.row.is_line_or_equality()
    }

    pub fn is_inequality(&self) -> bool {
        !self.is_equality()
    }

    pub fn is_nonstrict_inequality(&self) -> bool {
        self.kind() == ConstraintKind::NonstrictInequality
    }

    pub fn is_strict_inequality(&self) -> bool {
        self.kind() == ConstraintKind::StrictInequality
    }

    pub fn topology(&self) -> Topology {
        self.row.topology()
    }

    pub fn is_necessarily_closed(&self) -> bool {
        self.row.is_necessarily_closed()
    }

    pub fn space_dimension(&self) -> usize {
        self.row.space_dimension()
    }

    /// The coefficient of `v`, zero when `v` lies beyond the constraint.
    pub fn coefficient(&self, v: Variable) -> Coefficient {
        if v.id() + 1 <= self.space_dimension() {
            self.row[v.id() + 1].clone()
        } else {
            Coefficient::zero()
        }
    }

    pub fn inhomogeneous_term(&self) -> &Coefficient {
        &self.row[0]
    }

    /// The homogeneous part plus inhomogeneous term as an expression.
    pub fn to_expr(&self) -> LinearExpr {
        LinearExpr::from_columns(self.row.as_slice()[..=self.space_dimension()].to_vec())
    }

    /// Whether the constraint holds everywhere: `0 = 0`, `b >= 0` with
    /// `b >= 0`, `b > 0` with `b > 0`. The internal `epsilon >= 0`
    /// combinations are never tautological.
    pub fn is_tautological(&self) -> bool {
        if !self.row.all_homogeneous_terms_are_zero() {
            return false;
        }
        let b = sgn(&self.row[0]);
        match self.row.topology() {
            Topology::Closed => {
                if self.is_equality() {
                    b == 0
                } else {
                    b >= 0
                }
            }
            Topology::Nnc => {
                let eps = sgn(&self.row.eps_coefficient());
                if self.is_equality() {
                    eps == 0 && b == 0
                } else if eps > 0 {
                    false
                } else if eps < 0 {
                    b > 0
                } else {
                    b >= 0
                }
            }
        }
    }

    /// Whether the constraint holds nowhere: `b = 0` with `b != 0`,
    /// `b >= 0` with `b < 0`, `b > 0` with `b <= 0`.
    pub fn is_inconsistent(&self) -> bool {
        if !self.row.all_homogeneous_terms_are_zero() {
            return false;
        }
        let b = sgn(&self.row[0]);
        if self.is_equality() {
            return b != 0;
        }
        match self.row.topology() {
            Topology::Closed => b < 0,
            Topology::Nnc => {
                let eps = sgn(&self.row.eps_coefficient());
                if eps < 0 {
                    b <= 0
                } else if eps == 0 {
                    b < 0
                } else {
                    false
                }
            }
        }
    }

    /// Whether the generator satisfies this constraint, under the
    /// topology-adjusted rules: lines must saturate; rays and closure
    /// points must give a nonnegative product; points must give a
    /// nonnegative product, strictly positive for a strict inequality.
    pub fn is_satisfied_by(&self, g: &Generator) -> bool {
        let sp = scalar_products::topology_adjusted_sign(self.row(), g.row());
        match self.kind() {
            ConstraintKind::Equality => sp == 0,
            ConstraintKind::NonstrictInequality => {
                if g.row().is_line_or_equality() {
                    sp == 0
                } else {
                    sp >= 0
                }
            }
            ConstraintKind::StrictInequality => {
                if g.row().is_line_or_equality() {
                    sp == 0
                } else if g.is_point() {
                    sp > 0
                } else {
                    sp >= 0
                }
            }
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.space_dimension();
        let mut lhs = LinearExpr::with_space_dimension(n);
        for i in 0..n {
            lhs.set_coefficient(Variable(i), self.row[i + 1].clone());
        }
        let rel = match self.kind() {
            ConstraintKind::Equality => "=",
            ConstraintKind::NonstrictInequality => ">=",
            ConstraintKind::StrictInequality => ">",
        };
        write!(f, "{lhs} {rel} {}", -&self.row[0])
    }
}

/// A system of constraints of one topology.
pub type ConstraintSystem = LinearSystem<Constraint>;

impl ConstraintSystem {
    /// Adjusts `c` to this system's column layout and appends it.
    ///
    /// A closed constraint entering an NNC system gains a zero epsilon
    /// column; a trivially inconsistent strict inequality entering a
    /// closed system is stored as the unsatisfiable constraint `1 = 0`; a
    /// tautological strict inequality entering a closed system is dropped.
    ///
    /// # Panics
    ///
    /// Panics when a non-trivial strict inequality is inserted into a
    /// closed system.
    pub fn insert(&mut self, c: Constraint) {
        self.insert_at(c, false);
    }

    /// Like [`ConstraintSystem::insert`], but appends to the pending
    /// segment.
    pub fn insert_pending(&mut self, c: Constraint) {
        self.insert_at(c, true);
    }

    fn insert_at(&mut self, c: Constraint, pending: bool) {
        let c = match (c.topology(), self.topology()) {
            (Topology::Nnc, Topology::Closed) if c.is_strict_inequality() => {
                if c.is_tautological() {
                    return;
                }
                assert!(
                    c.is_inconsistent(),
                    "strict inequality inserted into a closed constraint system"
                );
                Constraint::false_constraint(Topology::Closed, c.space_dimension())
            }
            _ => c,
        };
        let row = self.fit_row(c.into_row());
        if pending {
            self.add_pending_row(Constraint::from_row(row));
        } else {
            self.add_row(Constraint::from_row(row));
            self.set_sorted(false);
        }
    }

    /// Reshapes `row` (and, if needed, the system) so their column layouts
    /// agree.
    fn fit_row(&mut self, mut row: LinearRow) -> LinearRow {
        let row_dim = row.space_dimension();
        if self.num_columns() == 0 {
            // First row: establish the column count outright.
            self.add_zero_columns(row_dim + self.topology().extra_columns());
        } else if row_dim > self.space_dimension() {
            let at = self.num_columns() - (self.topology().extra_columns() - 1);
            self.insert_zero_columns(at, row_dim - self.space_dimension());
        }
        match (row.topology(), self.topology()) {
            (Topology::Closed, Topology::Closed) | (Topology::Nnc, Topology::Nnc) => {
                if row.topology() == Topology::Nnc {
                    // Keep the epsilon coefficient in the last column.
                    let eps = row.remove_column(row.size() - 1);
                    row.resize(self.num_columns());
                    let last = row.size() - 1;
                    row[last] = eps;
                } else {
                    row.resize(self.num_columns());
                }
            }
            (Topology::Closed, Topology::Nnc) => {
                row = LinearRow::from_columns(
                    {
                        let mut cols = row.as_slice().to_vec();
                        cols.resize(self.num_columns() - 1, Coefficient::zero());
                        cols.push(Coefficient::zero());
                        cols
                    },
                    row.kind(),
                    Topology::Nnc,
                );
            }
            (Topology::Nnc, Topology::Closed) => {
                // Only reachable for non-strict rows; drop the epsilon
                // column.
                let eps = row.remove_column(row.size() - 1);
                debug_assert!(eps.is_zero());
                row = LinearRow::from_columns(
                    {
                        let mut cols = row.as_slice().to_vec();
                        cols.resize(self.num_columns(), Coefficient::zero());
                        cols
                    },
                    row.kind(),
                    Topology::Closed,
                );
            }
        }
        row
    }

    /// The number of equality rows.
    pub fn num_equalities(&self) -> usize {
        self.iter().filter(|c| c.is_equality()).count()
    }

    pub fn has_strict_inequalities(&self) -> bool {
        self.iter().any(Constraint::is_strict_inequality)
    }

    /// Whether `g` satisfies every constraint of the system, pending rows
    /// included.
    pub fn satisfies_all_constraints(&self, g: &Generator) -> bool {
        self.iter().all(|c| c.is_satisfied_by(g))
    }

    /// Embeds the system in `space_dim` dimensions and converts it to
    /// `topology`. Fails when the conversion would lose information, i.e.
    /// when a strict inequality must become closed.
    pub fn adjust_topology_and_space_dimension(
        &mut self,
        topology: Topology,
        space_dim: usize,
    ) -> Result<()> {
        if space_dim < self.space_dimension() {
            return Err(Error::InvalidArgument {
                op: "ConstraintSystem::adjust_topology_and_space_dimension",
                reason: "the space dimension of a system cannot shrink",
            });
        }
        if topology == Topology::Closed && self.has_strict_inequalities() {
            return Err(Error::TopologyMismatch {
                op: "ConstraintSystem::adjust_topology_and_space_dimension",
            });
        }
        let mut adjusted = ConstraintSystem::with_columns(
            topology,
            space_dim + topology.extra_columns(),
        );
        let first_pending = self.first_pending_row();
        for (i, c) in self.iter().enumerate() {
            if i < first_pending {
                adjusted.insert(c.clone());
            } else {
                adjusted.insert_pending(c.clone());
            }
        }
        *self = adjusted;
        Ok(())
    }
}

impl fmt::Display for ConstraintSystem {
    /// The comma-separated constraint list, `true` when empty.
    ///
    /// Tautologies and the internal epsilon bounds are not part of the
    /// mathematical description and are skipped.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut printed = false;
        for c in self.iter() {
            if c.is_tautological()
                || (c.row().all_homogeneous_terms_are_zero() && !c.is_inconsistent())
            {
                continue;
            }
            if printed {
                write!(f, ", ")?;
            }
            write!(f, "{c}")?;
            printed = true;
        }
        if !printed {
            write!(f, "true")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_kinds_and_normalization() {
        let a = Variable(0);
        let b = Variable(1);
        let c = (2 * a + 2 * b).ge(4);
        assert_eq!(c.kind(), ConstraintKind::NonstrictInequality);
        // 2*A + 2*B >= 4 normalizes to A + B >= 2.
        assert_eq!(c.coefficient(a), Coefficient::from(1));
        assert_eq!(*c.inhomogeneous_term(), Coefficient::from(-2));

        assert!(a.gt(0).is_strict_inequality());
        assert!(a.eq(b).is_equality());
        assert!(a.lt(1).is_strict_inequality());
    }

    #[test]
    fn trivial_classification() {
        assert!(LinearExpr::new().ge(0).is_tautological());
        assert!(LinearExpr::new().gt(0).is_inconsistent());
        assert!(LinearExpr::from(1).ge(0).is_tautological());
        assert!(LinearExpr::from(1).eq(0).is_inconsistent());
        assert!(LinearExpr::from(1).gt(0).is_tautological());
        assert!(!Variable(0).ge(0).is_tautological());
        assert!(!Variable(0).ge(0).is_inconsistent());
    }

    #[test]
    fn display_moves_the_constant_to_the_right() {
        let a = Variable(0);
        let b = Variable(1);
        assert_eq!((a + 2 * b).ge(0).to_string(), "A + 2*B >= 0");
        assert_eq!((a - b).eq(-2).to_string(), "A - B = -2");
        assert_eq!(a.lt(1).to_string(), "-A > -1");
    }

    #[test]
    fn closed_into_nnc_gains_an_epsilon_column() {
        let a = Variable(0);
        let mut cs = ConstraintSystem::new(Topology::Nnc);
        cs.insert(a.ge(0));
        cs.insert(a.lt(1));
        assert_eq!(cs.num_columns(), 3);
        assert_eq!(cs.space_dimension(), 1);
        assert!(cs.has_strict_inequalities());
    }

    #[test]
    fn growing_an_nnc_system_keeps_epsilon_last() {
        let a = Variable(0);
        let b = Variable(1);
        let mut cs = ConstraintSystem::new(Topology::Nnc);
        cs.insert(a.gt(0));
        cs.insert(b.ge(1));
        assert_eq!(cs.num_columns(), 4);
        // The strict row's epsilon coefficient must still sit in the last
        // column after the system grew.
        assert_eq!(cs.row(0).row().eps_coefficient(), Coefficient::from(-1));
        assert!(cs.row(0).is_strict_inequality());
    }

    #[test]
    fn trivially_false_strict_into_closed_marks_inconsistency() {
        let mut cs = ConstraintSystem::new(Topology::Closed);
        cs.insert(LinearExpr::new().gt(0));
        assert_eq!(cs.num_rows(), 1);
        assert!(cs.row(0).is_inconsistent());
    }

    #[test]
    fn closed_conversion_of_strict_systems_fails() {
        let a = Variable(0);
        let mut cs = ConstraintSystem::new(Topology::Nnc);
        cs.insert(a.gt(0));
        assert!(cs
            .adjust_topology_and_space_dimension(Topology::Closed, 2)
            .is_err());
        assert!(cs
            .adjust_topology_and_space_dimension(Topology::Nnc, 3)
            .is_ok());
        assert_eq!(cs.space_dimension(), 3);
    }
}
