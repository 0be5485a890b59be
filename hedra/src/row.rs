//! The primitive row shared by constraints, generators and congruences.

use hedra_num::coefficient::{self, Coefficient};
use num::{One, Zero};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::ops::{Index, IndexMut};

/// Whether an object admits strict inequalities.
///
/// Not-necessarily-closed rows carry one extra trailing column, the
/// epsilon column, at index `space_dimension() + 1`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topology {
    /// Only non-strict inequalities: closed polyhedra.
    Closed,
    /// Strict inequalities admitted, encoded through the epsilon column.
    Nnc,
}

impl Topology {
    /// The number of columns beyond the space dimension: the inhomogeneous
    /// column, plus the epsilon column for NNC rows.
    pub const fn extra_columns(self) -> usize {
        match self {
            Topology::Closed => 1,
            Topology::Nnc => 2,
        }
    }
}

/// The structural kind of a row, before its typed interpretation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum RowKind {
    /// A line (generator side) or an equality (constraint side).
    LineOrEquality,
    /// A ray, point or closure point (generator side), or an inequality
    /// (constraint side).
    RayOrPointOrInequality,
}

/// A dense vector of coefficients with a topology and a structural kind.
///
/// Column 0 is the inhomogeneous term for constraints and the divisor for
/// generators; columns `1..=space_dim` hold the variable coefficients; NNC
/// rows carry the epsilon coefficient in the final column.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LinearRow {
    coeffs: Vec<Coefficient>,
    kind: RowKind,
    topology: Topology,
}

impl LinearRow {
    /// An all-zero row with the given number of columns.
    pub fn zero(columns: usize, kind: RowKind, topology: Topology) -> Self {
        Self {
            coeffs: vec![Coefficient::zero(); columns],
            kind,
            topology,
        }
    }

    /// A row from raw columns.
    pub fn from_columns(coeffs: Vec<Coefficient>, kind: RowKind, topology: Topology) -> Self {
        Self {
            coeffs,
            kind,
            topology,
        }
    }

    /// The number of columns.
    pub fn size(&self) -> usize {
        self.coeffs.len()
    }

    /// The space dimension: columns minus the inhomogeneous column and,
    /// for NNC rows, the epsilon column.
    pub fn space_dimension(&self) -> usize {
        self.coeffs.len() - self.topology.extra_columns()
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn is_necessarily_closed(&self) -> bool {
        self.topology == Topology::Closed
    }

    pub fn kind(&self) -> RowKind {
        self.kind
    }

    pub fn is_line_or_equality(&self) -> bool {
        self.kind == RowKind::LineOrEquality
    }

    pub fn set_is_line_or_equality(&mut self) {
        self.kind = RowKind::LineOrEquality;
    }

    pub fn set_is_ray_or_point_or_inequality(&mut self) {
        self.kind = RowKind::RayOrPointOrInequality;
    }

    /// The index of the epsilon column.
    ///
    /// Meaningful only for NNC rows.
    pub fn eps_index(&self) -> usize {
        debug_assert_eq!(self.topology, Topology::Nnc);
        self.coeffs.len() - 1
    }

    /// The epsilon coefficient, or zero for a closed row.
    pub fn eps_coefficient(&self) -> Coefficient {
        match self.topology {
            Topology::Closed => Coefficient::zero(),
            Topology::Nnc => self.coeffs[self.coeffs.len() - 1].clone(),
        }
    }

    /// The underlying columns.
    pub fn as_slice(&self) -> &[Coefficient] {
        &self.coeffs
    }

    /// Grows or shrinks the row to `columns`, zero-filling new columns.
    pub fn resize(&mut self, columns: usize) {
        self.coeffs.resize(columns, Coefficient::zero());
    }

    /// Inserts a zero column at `index`, shifting later columns right.
    pub fn insert_zero_column(&mut self, index: usize) {
        self.coeffs.insert(index, Coefficient::zero());
    }

    /// Removes the column at `index`, shifting later columns left.
    pub fn remove_column(&mut self, index: usize) -> Coefficient {
        self.coeffs.remove(index)
    }

    pub fn swap_columns(&mut self, i: usize, j: usize) {
        self.coeffs.swap(i, j);
    }

    /// Whether every column is zero.
    pub fn is_zero(&self) -> bool {
        self.coeffs.iter().all(Zero::is_zero)
    }

    /// Whether every variable coefficient is zero (the inhomogeneous and
    /// epsilon columns are not considered).
    pub fn all_homogeneous_terms_are_zero(&self) -> bool {
        let n = self.space_dimension();
        self.coeffs[1..=n].iter().all(Zero::is_zero)
    }

    /// Negates every column.
    pub fn negate(&mut self) {
        for c in &mut self.coeffs {
            coefficient::neg_assign(c);
        }
    }

    /// Divides the row by the gcd of the absolute values of its columns.
    pub fn normalize(&mut self) {
        let g = coefficient::gcd_of(&self.coeffs);
        if !g.is_zero() && !g.is_one() {
            for c in &mut self.coeffs {
                coefficient::exact_div_assign(c, &g);
            }
        }
    }

    /// For lines and equalities, whose sign is immaterial, flips the row so
    /// the first nonzero column is positive.
    pub fn sign_normalize(&mut self) {
        if self.kind == RowKind::LineOrEquality {
            let first = self.coeffs.iter().find(|c| !c.is_zero());
            if let Some(first) = first {
                if coefficient::sgn(first) < 0 {
                    self.negate();
                }
            }
        }
    }

    /// [`LinearRow::normalize`] followed by [`LinearRow::sign_normalize`].
    pub fn strong_normalize(&mut self) {
        self.normalize();
        self.sign_normalize();
    }

    /// `self := a * self + b * other`, column by column.
    pub fn linear_combine(&mut self, a: &Coefficient, other: &LinearRow, b: &Coefficient) {
        debug_assert_eq!(self.size(), other.size());
        for (l, r) in self.coeffs.iter_mut().zip(&other.coeffs) {
            *l *= a;
            *l += r * b;
        }
        self.strong_normalize();
    }

    /// The canonical row order: lines and equalities first, then
    /// column-lexicographic.
    pub fn compare(&self, other: &LinearRow) -> Ordering {
        let rank = |k: RowKind| match k {
            RowKind::LineOrEquality => 0,
            RowKind::RayOrPointOrInequality => 1,
        };
        rank(self.kind).cmp(&rank(other.kind)).then_with(|| {
            let columns = self.size().max(other.size());
            let zero = Coefficient::zero();
            for i in 0..columns {
                let l = self.coeffs.get(i).unwrap_or(&zero);
                let r = other.coeffs.get(i).unwrap_or(&zero);
                match l.cmp(r) {
                    Ordering::Equal => {}
                    other => return other,
                }
            }
            Ordering::Equal
        })
    }
}

impl Index<usize> for LinearRow {
    type Output = Coefficient;

    fn index(&self, i: usize) -> &Coefficient {
        &self.coeffs[i]
    }
}

impl IndexMut<usize> for LinearRow {
    fn index_mut(&mut self, i: usize) -> &mut Coefficient {
        &mut self.coeffs[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cols: &[i64], kind: RowKind) -> LinearRow {
        LinearRow::from_columns(
            cols.iter().map(|&c| Coefficient::from(c)).collect(),
            kind,
            Topology::Closed,
        )
    }

    #[test]
    fn normalization_divides_by_gcd() {
        let mut r = row(&[4, -6, 2], RowKind::RayOrPointOrInequality);
        r.normalize();
        assert_eq!(r, row(&[2, -3, 1], RowKind::RayOrPointOrInequality));
    }

    #[test]
    fn sign_normalization_only_touches_lines() {
        let mut eq = row(&[0, -2, 4], RowKind::LineOrEquality);
        eq.strong_normalize();
        assert_eq!(eq, row(&[0, 1, -2], RowKind::LineOrEquality));

        let mut ineq = row(&[0, -2, 4], RowKind::RayOrPointOrInequality);
        ineq.strong_normalize();
        assert_eq!(ineq, row(&[0, -1, 2], RowKind::RayOrPointOrInequality));
    }

    #[test]
    fn combination_saturates_the_target() {
        // 1*(0, 1, -1) + 1*(0, 1, 1) = (0, 2, 0), normalized to (0, 1, 0).
        let mut r = row(&[0, 1, -1], RowKind::RayOrPointOrInequality);
        let other = row(&[0, 1, 1], RowKind::RayOrPointOrInequality);
        r.linear_combine(&Coefficient::from(1), &other, &Coefficient::from(1));
        assert_eq!(r, row(&[0, 1, 0], RowKind::RayOrPointOrInequality));
    }

    #[test]
    fn ordering_puts_equalities_first() {
        let eq = row(&[1, 0], RowKind::LineOrEquality);
        let ineq = row(&[0, 1], RowKind::RayOrPointOrInequality);
        assert_eq!(eq.compare(&ineq), Ordering::Less);
        assert_eq!(ineq.compare(&ineq), Ordering::Equal);
    }

    #[test]
    fn nnc_rows_count_the_eps_column() {
        let r = LinearRow::zero(4, RowKind::RayOrPointOrInequality, Topology::Nnc);
        assert_eq!(r.space_dimension(), 2);
        assert_eq!(r.eps_index(), 3);
    }
}
