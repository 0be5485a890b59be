//! Grid generators and grid generator systems.

use crate::error::{Error, Result};
use hedra_num::coefficient::{self, sgn, Coefficient};
use hedra_num::{LinearExpr, Variable};
use num::{One, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kinds of grid generator.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum GridGeneratorKind {
    /// A direction along which every rational multiple stays in the grid.
    Line,
    /// A period vector: only integral multiples stay in the grid.
    Parameter,
    /// The base point, scaled by a positive divisor.
    Point,
}

/// A grid generator: line, parameter or point.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GridGenerator {
    kind: GridGeneratorKind,
    /// Columns `[d, a_1, ..., a_n]`: the vector `(a_1, ..., a_n) / d` for
    /// points and parameters, `d = 0` for lines.
    columns: Vec<Coefficient>,
}

impl GridGenerator {
    /// The grid point `e / divisor`; the inhomogeneous term of `e` is
    /// ignored.
    ///
    /// # Panics
    ///
    /// Panics when the divisor is not positive.
    pub fn grid_point(e: impl Into<LinearExpr>, divisor: impl Into<Coefficient>) -> Self {
        let divisor = divisor.into();
        assert!(
            sgn(&divisor) > 0,
            "the divisor of a grid point must be positive"
        );
        let e = e.into();
        let mut columns = e.as_slice().to_vec();
        columns[0] = divisor;
        let mut g = Self {
            kind: GridGeneratorKind::Point,
            columns,
        };
        g.normalize();
        g
    }

    /// The parameter `e / divisor`.
    ///
    /// # Panics
    ///
    /// Panics when `e` has no nonzero variable coefficient or the divisor
    /// is not positive.
    pub fn parameter(e: impl Into<LinearExpr>, divisor: impl Into<Coefficient>) -> Self {
        let divisor = divisor.into();
        assert!(
            sgn(&divisor) > 0,
            "the divisor of a parameter must be positive"
        );
        let e = e.into();
        assert!(
            !e.all_homogeneous_terms_are_zero(),
            "a parameter needs a nonzero direction"
        );
        let mut columns = e.as_slice().to_vec();
        columns[0] = divisor;
        let mut g = Self {
            kind: GridGeneratorKind::Parameter,
            columns,
        };
        g.normalize();
        g
    }

    /// The grid line with direction `e`.
    ///
    /// # Panics
    ///
    /// Panics when `e` has no nonzero variable coefficient.
    pub fn grid_line(e: impl Into<LinearExpr>) -> Self {
        let e = e.into();
        assert!(
            !e.all_homogeneous_terms_are_zero(),
            "a grid line needs a nonzero direction"
        );
        let mut columns = e.as_slice().to_vec();
        columns[0] = Coefficient::zero();
        let mut g = Self {
            kind: GridGeneratorKind::Line,
            columns,
        };
        g.normalize();
        g
    }

    pub(crate) fn from_parts(kind: GridGeneratorKind, columns: Vec<Coefficient>) -> Self {
        let mut g = Self { kind, columns };
        if g.columns.is_empty() {
            g.columns.push(Coefficient::zero());
        }
        g.normalize();
        g
    }

    fn normalize(&mut self) {
        match self.kind {
            GridGeneratorKind::Line => {
                let g = coefficient::gcd_of(&self.columns);
                if !g.is_zero() && !g.is_one() {
                    for c in &mut self.columns {
                        coefficient::exact_div_assign(c, &g);
                    }
                }
                if let Some(first) = self.columns[1..].iter().find(|c| !c.is_zero()) {
                    if sgn(first) < 0 {
                        for c in &mut self.columns {
                            coefficient::neg_assign(c);
                        }
                    }
                }
            }
            GridGeneratorKind::Point | GridGeneratorKind::Parameter => {
                let g = coefficient::gcd_of(&self.columns);
                if !g.is_zero() && !g.is_one() {
                    for c in &mut self.columns {
                        coefficient::exact_div_assign(c, &g);
                    }
                }
            }
        }
    }

    pub fn kind(&self) -> GridGeneratorKind {
        self.kind
    }

    pub fn is_point(&self) -> bool {
        self.kind == GridGeneratorKind::Point
    }

    pub fn is_parameter(&self) -> bool {
        self.kind == GridGeneratorKind::Parameter
    }

    pub fn is_line(&self) -> bool {
        self.kind == GridGeneratorKind::Line
    }

    pub fn space_dimension(&self) -> usize {
        self.columns.len() - 1
    }

    pub fn as_slice(&self) -> &[Coefficient] {
        &self.columns
    }

    /// The coefficient of `v`, zero when `v` lies beyond the generator.
    pub fn coefficient(&self, v: Variable) -> Coefficient {
        self.columns
            .get(v.id() + 1)
            .cloned()
            .unwrap_or_else(Coefficient::zero)
    }

    /// The divisor of a point or parameter.
    ///
    /// # Panics
    ///
    /// Panics for lines, which carry no divisor.
    pub fn divisor(&self) -> &Coefficient {
        assert!(!self.is_line(), "grid lines have no divisor");
        &self.columns[0]
    }

    pub fn all_homogeneous_terms_are_zero(&self) -> bool {
        self.columns[1..].iter().all(Zero::is_zero)
    }

    /// Whether the coefficient at `dim` agrees with `other`'s, modulo the
    /// scaling freedom of the two divisors. Used by the generator
    /// widening to compare aligned pivot rows.
    pub fn is_equal_at_dimension(&self, dim: usize, other: &GridGenerator) -> bool {
        let zero = Coefficient::zero();
        let mine = self.columns.get(dim).unwrap_or(&zero);
        let theirs = other.columns.get(dim).unwrap_or(&zero);
        mine * other.divisor() == theirs * self.divisor()
    }

    /// The homogeneous part as an expression.
    pub fn to_expr(&self) -> LinearExpr {
        let mut e = LinearExpr::with_space_dimension(self.space_dimension());
        for i in 0..self.space_dimension() {
            e.set_coefficient(Variable(i), self.columns[i + 1].clone());
        }
        e
    }
}

impl fmt::Display for GridGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.kind {
            GridGeneratorKind::Line => "l",
            GridGeneratorKind::Parameter => "q",
            GridGeneratorKind::Point => "p",
        };
        let e = self.to_expr();
        if self.is_line() || self.columns[0].is_one() {
            write!(f, "{tag}({e})")
        } else {
            write!(f, "{tag}(({e})/{})", self.columns[0])
        }
    }
}

/// A system of grid generators.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct GridGeneratorSystem {
    rows: Vec<GridGenerator>,
    space_dim: usize,
}

impl GridGeneratorSystem {
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

    pub fn has_points(&self) -> bool {
        self.rows.iter().any(GridGenerator::is_point)
    }

    pub fn num_lines(&self) -> usize {
        self.rows.iter().filter(|g| g.is_line()).count()
    }

    pub fn num_parameters(&self) -> usize {
        self.rows.iter().filter(|g| g.is_parameter()).count()
    }

    pub fn rows(&self) -> &[GridGenerator] {
        &self.rows
    }

    pub fn row(&self, i: usize) -> &GridGenerator {
        &self.rows[i]
    }

    pub fn iter(&self) -> impl Iterator<Item = &GridGenerator> {
        self.rows.iter()
    }

    /// Appends a generator, growing the space dimension if needed.
    pub fn insert(&mut self, g: GridGenerator) {
        self.space_dim = self.space_dim.max(g.space_dimension());
        self.rows.push(g);
    }

    pub(crate) fn clear_rows(&mut self) {
        self.rows.clear();
    }

    pub(crate) fn set_rows(&mut self, rows: Vec<GridGenerator>) {
        self.rows = rows;
    }

    /// Applies `x[v] := (expr . x) / denominator` to every generator: the
    /// base point takes the full affine map, parameters and lines only
    /// its linear part. The denominator must be positive.
    pub(crate) fn affine_image(
        &mut self,
        v: Variable,
        expr: &[Coefficient],
        denominator: &Coefficient,
    ) {
        debug_assert!(sgn(denominator) > 0);
        let v_col = v.id() + 1;
        for g in &mut self.rows {
            g.columns.resize(
                g.columns.len().max(v_col + 1).max(expr.len()),
                Coefficient::zero(),
            );
            let mut new_v = Coefficient::zero();
            for (j, e) in expr.iter().enumerate() {
                if j == 0 && !g.is_point() {
                    // The translation part does not move directions.
                    continue;
                }
                new_v += e * &g.columns[j];
            }
            for (j, c) in g.columns.iter_mut().enumerate() {
                if j != v_col {
                    *c *= denominator;
                }
            }
            g.columns[v_col] = new_v;
            g.normalize();
        }
        self.space_dim = self.space_dim.max(v.space_dimension());
    }

    /// Removes the given dimensions (0-based, strictly decreasing order);
    /// parameters and lines left without a direction are dropped.
    pub(crate) fn remove_dimensions(&mut self, dims_desc: &[usize]) {
        for g in &mut self.rows {
            for &d in dims_desc {
                if d + 1 < g.columns.len() {
                    g.columns.remove(d + 1);
                }
            }
        }
        self.rows.retain(|g| {
            g.is_point() || !g.all_homogeneous_terms_are_zero()
        });
        self.space_dim -= dims_desc.len();
    }

    /// Exchanges two dimensions in every row.
    pub(crate) fn swap_dimensions(&mut self, i: Variable, j: Variable) {
        let hi = i.id().max(j.id()) + 1;
        for g in &mut self.rows {
            if g.columns.len() <= hi {
                g.columns.resize(hi + 1, Coefficient::zero());
            }
            g.columns.swap(i.id() + 1, j.id() + 1);
        }
    }

    /// Embeds the system in a space of dimension `space_dim`.
    pub fn adjust_space_dimension(&mut self, space_dim: usize) -> Result<()> {
        if space_dim < self.space_dim {
            return Err(Error::InvalidArgument {
                op: "GridGeneratorSystem::adjust_space_dimension",
                reason: "the space dimension of a system cannot shrink",
            });
        }
        self.space_dim = space_dim;
        Ok(())
    }
}

impl fmt::Display for GridGeneratorSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut printed = false;
        for g in &self.rows {
            if printed {
                write!(f, ", ")?;
            }
            write!(f, "{g}")?;
            printed = true;
        }
        if !printed {
            write!(f, "false")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_and_normalization() {
        let a = Variable(0);
        let b = Variable(1);
        let p = GridGenerator::grid_point(2 * a + 4 * b, 2);
        assert!(p.is_point());
        assert_eq!(*p.divisor(), Coefficient::from(1));
        let q = GridGenerator::parameter(4 * a, 2);
        assert!(q.is_parameter());
        assert_eq!(q.coefficient(a), Coefficient::from(2));
        let l = GridGenerator::grid_line(-2 * b);
        assert_eq!(l.coefficient(b), Coefficient::from(1));
    }

    #[test]
    fn display_forms() {
        let a = Variable(0);
        assert_eq!(GridGenerator::grid_point(a, 1).to_string(), "p(A)");
        assert_eq!(GridGenerator::grid_point(a, 3).to_string(), "p((A)/3)");
        assert_eq!(GridGenerator::parameter(2 * a, 1).to_string(), "q(2*A)");
        assert_eq!(GridGenerator::grid_line(a).to_string(), "l(A)");
    }

    #[test]
    fn insert_tracks_the_space_dimension() {
        let a = Variable(0);
        let c = Variable(2);
        let mut gs = GridGeneratorSystem::new();
        gs.insert(GridGenerator::grid_point(a, 1));
        assert_eq!(gs.space_dimension(), 1);
        gs.insert(GridGenerator::grid_line(c));
        assert_eq!(gs.space_dimension(), 3);
        assert_eq!(gs.num_lines(), 1);
        assert!(gs.has_points());
    }
}
