//! Congruences and congruence systems.

use crate::error::{Error, Result};
use crate::grid_generator::GridGenerator;
use hedra_num::coefficient::{self, sgn, Coefficient};
use hedra_num::{LinearExpr, Variable};
use num::{Integer, Signed, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The congruence `e = 0 (mod m)` for `m >= 0`; a zero modulus denotes
/// the equality `e = 0`.
///
/// Canonical form: the columns and the modulus share no common factor, the
/// first nonzero variable coefficient is positive and, for a proper
/// congruence, the inhomogeneous term is reduced into `[0, m)`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Congruence {
    /// Columns `[b, a_1, ..., a_n]`.
    columns: Vec<Coefficient>,
    modulus: Coefficient,
}

impl Congruence {
    pub(crate) fn build(e: LinearExpr, modulus: Coefficient) -> Self {
        let mut cg = Self {
            columns: e.as_slice().to_vec(),
            modulus: modulus.abs(),
        };
        cg.normalize();
        cg
    }

    /// A congruence from raw columns `[b, a_1, ..., a_n]`.
    pub(crate) fn from_columns(columns: Vec<Coefficient>, modulus: Coefficient) -> Self {
        let mut cg = Self {
            columns,
            modulus: modulus.abs(),
        };
        if cg.columns.is_empty() {
            cg.columns.push(Coefficient::zero());
        }
        cg.normalize();
        cg
    }

    fn normalize(&mut self) {
        let mut g = coefficient::gcd_of(&self.columns);
        if !self.modulus.is_zero() {
            coefficient::gcd_assign(&mut g, &self.modulus);
        }
        if !g.is_zero() && !num::One::is_one(&g) {
            for c in &mut self.columns {
                coefficient::exact_div_assign(c, &g);
            }
            if !self.modulus.is_zero() {
                coefficient::exact_div_assign(&mut self.modulus, &g);
            }
        }
        // Sign: a congruence and its negation define the same set.
        if let Some(first) = self.columns[1..].iter().find(|c| !c.is_zero()) {
            if sgn(first) < 0 {
                for c in &mut self.columns {
                    coefficient::neg_assign(c);
                }
            }
        } else if sgn(&self.columns[0]) < 0 {
            coefficient::neg_assign(&mut self.columns[0]);
        }
        // Strong reduction of the inhomogeneous term.
        if !self.modulus.is_zero() {
            self.columns[0] = self.columns[0].mod_floor(&self.modulus);
        }
    }

    pub fn modulus(&self) -> &Coefficient {
        &self.modulus
    }

    pub fn is_equality(&self) -> bool {
        self.modulus.is_zero()
    }

    pub fn is_proper_congruence(&self) -> bool {
        !self.is_equality()
    }

    pub fn space_dimension(&self) -> usize {
        self.columns.len() - 1
    }

    pub fn as_slice(&self) -> &[Coefficient] {
        &self.columns
    }

    /// The coefficient of `v`, zero when `v` lies beyond the congruence.
    pub fn coefficient(&self, v: Variable) -> Coefficient {
        self.columns
            .get(v.id() + 1)
            .cloned()
            .unwrap_or_else(Coefficient::zero)
    }

    pub fn inhomogeneous_term(&self) -> &Coefficient {
        &self.columns[0]
    }

    /// The homogeneous part plus inhomogeneous term as an expression.
    pub fn to_expr(&self) -> LinearExpr {
        LinearExpr::from_columns(self.columns.clone())
    }

    pub fn all_homogeneous_terms_are_zero(&self) -> bool {
        self.columns[1..].iter().all(Zero::is_zero)
    }

    /// `0 = 0 (mod m)` or `k*m = 0 (mod m)`.
    pub fn is_tautological(&self) -> bool {
        if !self.all_homogeneous_terms_are_zero() {
            return false;
        }
        if self.is_equality() {
            self.columns[0].is_zero()
        } else {
            self.columns[0].mod_floor(&self.modulus).is_zero()
        }
    }

    /// A trivially unsatisfiable congruence such as `1 = 0 (mod 2)`.
    pub fn is_inconsistent(&self) -> bool {
        self.all_homogeneous_terms_are_zero() && !self.is_tautological()
    }

    /// Whether the coefficient at `dim` agrees with `other`'s, modulo the
    /// scaling freedom of the two moduli. Used by the congruence
    /// widening to compare aligned pivot rows.
    pub fn is_equal_at_dimension(&self, dim: usize, other: &Congruence) -> bool {
        let zero = Coefficient::zero();
        let mine = self.columns.get(dim).unwrap_or(&zero);
        let theirs = other.columns.get(dim).unwrap_or(&zero);
        mine * other.modulus() == theirs * self.modulus()
    }

    /// Whether the point `g` (with its divisor) satisfies the congruence.
    pub fn is_satisfied_by_point(&self, g: &GridGenerator) -> bool {
        let d = g.divisor();
        let mut v = self.inhomogeneous_term() * d;
        for i in 1..self.columns.len() {
            v += &self.columns[i] * &g.as_slice().get(i).cloned().unwrap_or_else(Coefficient::zero);
        }
        if self.is_equality() {
            v.is_zero()
        } else {
            v.mod_floor(&(&self.modulus * d)).is_zero()
        }
    }

    /// Whether translating by the parameter `g` preserves the congruence.
    pub fn is_satisfied_by_parameter(&self, g: &GridGenerator) -> bool {
        let d = g.divisor();
        let mut v = Coefficient::zero();
        for i in 1..self.columns.len() {
            v += &self.columns[i] * &g.as_slice().get(i).cloned().unwrap_or_else(Coefficient::zero);
        }
        if self.is_equality() {
            v.is_zero()
        } else {
            v.mod_floor(&(&self.modulus * d)).is_zero()
        }
    }

    /// Whether moving along the line `g` preserves the congruence, which
    /// requires exact orthogonality.
    pub fn is_satisfied_by_line(&self, g: &GridGenerator) -> bool {
        let mut v = Coefficient::zero();
        for i in 1..self.columns.len() {
            v += &self.columns[i] * &g.as_slice().get(i).cloned().unwrap_or_else(Coefficient::zero);
        }
        v.is_zero()
    }

    /// Whether the grid generator `g` satisfies the congruence, per its
    /// kind.
    pub fn is_satisfied_by(&self, g: &GridGenerator) -> bool {
        use crate::grid_generator::GridGeneratorKind::*;
        match g.kind() {
            Point => self.is_satisfied_by_point(g),
            Parameter => self.is_satisfied_by_parameter(g),
            Line => self.is_satisfied_by_line(g),
        }
    }
}

impl fmt::Display for Congruence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.space_dimension();
        let mut lhs = LinearExpr::with_space_dimension(n);
        for i in 0..n {
            lhs.set_coefficient(Variable(i), self.columns[i + 1].clone());
        }
        if self.is_equality() {
            write!(f, "{lhs} = {}", -&self.columns[0])
        } else {
            let rhs = (-&self.columns[0]).mod_floor(&self.modulus);
            write!(f, "{lhs} = {rhs} (mod {})", self.modulus)
        }
    }
}

/// A system of congruences.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct CongruenceSystem {
    rows: Vec<Congruence>,
    space_dim: usize,
}

impl CongruenceSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_space_dimension(space_dim: usize) -> Self {
        Self {
            rows: Vec::new(),
            space_dim,
        }
    }

    pub fn space_dimension(&self) -> usize {
        self.space_dim
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn has_no_rows(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn num_equalities(&self) -> usize {
        self.rows.iter().filter(|cg| cg.is_equality()).count()
    }

    pub fn num_proper_congruences(&self) -> usize {
        self.rows.iter().filter(|cg| cg.is_proper_congruence()).count()
    }

    pub fn rows(&self) -> &[Congruence] {
        &self.rows
    }

    pub fn row(&self, i: usize) -> &Congruence {
        &self.rows[i]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Congruence> {
        self.rows.iter()
    }

    /// Appends a congruence, growing the space dimension if needed.
    pub fn insert(&mut self, cg: Congruence) {
        self.space_dim = self.space_dim.max(cg.space_dimension());
        self.rows.push(cg);
    }

    pub(crate) fn clear_rows(&mut self) {
        self.rows.clear();
    }

    pub(crate) fn set_rows(&mut self, rows: Vec<Congruence>) {
        self.rows = rows;
    }

    /// Substitutes `x[v] := (expr . x) / denominator` into every
    /// congruence; moduli scale with the denominator, which must be
    /// positive.
    pub(crate) fn affine_preimage(
        &mut self,
        v: Variable,
        expr: &[Coefficient],
        denominator: &Coefficient,
    ) {
        debug_assert!(sgn(denominator) > 0);
        let v_col = v.id() + 1;
        let rows = std::mem::take(&mut self.rows);
        for cg in rows {
            let mut cols = cg.columns;
            cols.resize(
                cols.len().max(v_col + 1).max(expr.len()),
                Coefficient::zero(),
            );
            let old_v = cols[v_col].clone();
            for (j, c) in cols.iter_mut().enumerate() {
                let e_j = expr.get(j).cloned().unwrap_or_else(Coefficient::zero);
                if j == v_col {
                    *c = e_j * &old_v;
                } else {
                    *c *= denominator;
                    *c += e_j * &old_v;
                }
            }
            let modulus = &cg.modulus * denominator;
            self.rows.push(Congruence::from_columns(cols, modulus));
        }
    }

    /// Embeds the system in a space of dimension `space_dim`.
    pub fn adjust_space_dimension(&mut self, space_dim: usize) -> Result<()> {
        if space_dim < self.space_dim {
            return Err(Error::InvalidArgument {
                op: "CongruenceSystem::adjust_space_dimension",
                reason: "the space dimension of a system cannot shrink",
            });
        }
        self.space_dim = space_dim;
        Ok(())
    }

    /// Whether `g` satisfies every congruence.
    pub fn is_satisfied_by(&self, g: &GridGenerator) -> bool {
        self.rows.iter().all(|cg| cg.is_satisfied_by(g))
    }
}

impl fmt::Display for CongruenceSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut printed = false;
        for cg in &self.rows {
            if cg.is_tautological() {
                continue;
            }
            if printed {
                write!(f, ", ")?;
            }
            write!(f, "{cg}")?;
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
    use crate::constraint::Rel;

    #[test]
    fn canonical_form() {
        let a = Variable(0);
        // 2A = 6 (mod 4) reduces to A = 1 (mod 2), i.e. A + 1 = 0 (mod 2).
        let cg = (2 * a).congruent(6, 4);
        assert_eq!(*cg.modulus(), Coefficient::from(2));
        assert_eq!(cg.coefficient(a), Coefficient::from(1));
        assert_eq!(*cg.inhomogeneous_term(), Coefficient::from(1));
        assert_eq!(cg.to_string(), "A = 1 (mod 2)");
    }

    #[test]
    fn equalities_have_zero_modulus() {
        let a = Variable(0);
        let b = Variable(1);
        let cg = (a - b).congruent(3, 0);
        assert!(cg.is_equality());
        assert_eq!(cg.to_string(), "A - B = 3");
    }

    #[test]
    fn trivial_classification() {
        assert!(LinearExpr::from(4).congruent(0, 2).is_tautological());
        assert!(LinearExpr::from(3).congruent(0, 2).is_inconsistent());
        assert!(LinearExpr::new().congruent(0, 0).is_tautological());
        assert!(LinearExpr::from(1).congruent(0, 0).is_inconsistent());
        assert!(!Variable(0).congruent(0, 2).is_tautological());
    }

    #[test]
    fn satisfaction_by_grid_generators() {
        use crate::grid_generator::GridGenerator;
        let a = Variable(0);
        let cg = a.congruent(0, 4);
        assert!(cg.is_satisfied_by(&GridGenerator::grid_point(8 * a, 1)));
        assert!(!cg.is_satisfied_by(&GridGenerator::grid_point(3 * a, 1)));
        // The point (1/2, 0) satisfies A = 0 (mod 4) only if 1/2 is a
        // multiple of 4, which it is not.
        assert!(!cg.is_satisfied_by(&GridGenerator::grid_point(a, 2)));
        assert!(cg.is_satisfied_by(&GridGenerator::parameter(4 * a, 1)));
        assert!(!cg.is_satisfied_by(&GridGenerator::parameter(2 * a, 1)));
        assert!(!cg.is_satisfied_by(&GridGenerator::grid_line(a)));
    }
}
