//! Generators and generator systems.

use crate::constraint::{Constraint, ConstraintKind};
use crate::error::{Error, Result};
use crate::linear_system::{LinearSystem, SystemRow};
use crate::relation::PolyConRelation;
use crate::row::{LinearRow, RowKind, Topology};
use crate::scalar_products;
use hedra_num::coefficient::sgn;
use hedra_num::{Coefficient, LinearExpr, Variable};
use num::Zero;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kinds of generator.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum GeneratorKind {
    /// A bidirectional direction of unboundedness.
    Line,
    /// A half-direction of unboundedness.
    Ray,
    /// A point of the set, scaled by a positive divisor.
    Point,
    /// A point of the topological closure that may not belong to the set;
    /// NNC only.
    ClosurePoint,
}

/// A generator: line, ray, point or closure point.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Generator {
    row: LinearRow,
}

impl SystemRow for Generator {
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

impl Generator {
    /// The line through the origin with direction `e`.
    ///
    /// # Panics
    ///
    /// Panics when `e` has no nonzero variable coefficient; the
    /// inhomogeneous term of `e` is ignored.
    pub fn line(e: impl Into<LinearExpr>) -> Self {
        Self::homogeneous(e.into(), RowKind::LineOrEquality, "line")
    }

    /// The ray from the origin with direction `e`.
    ///
    /// # Panics
    ///
    /// Panics when `e` has no nonzero variable coefficient; the
    /// inhomogeneous term of `e` is ignored.
    pub fn ray(e: impl Into<LinearExpr>) -> Self {
        Self::homogeneous(e.into(), RowKind::RayOrPointOrInequality, "ray")
    }

    /// The point `e / divisor`; the inhomogeneous term of `e` is ignored.
    ///
    /// # Panics
    ///
    /// Panics when the divisor is not positive.
    pub fn point(e: impl Into<LinearExpr>, divisor: impl Into<Coefficient>) -> Self {
        let divisor = divisor.into();
        assert!(sgn(&divisor) > 0, "the divisor of a point must be positive");
        let e = e.into();
        let mut columns = e.as_slice().to_vec();
        columns[0] = divisor;
        let mut row =
            LinearRow::from_columns(columns, RowKind::RayOrPointOrInequality, Topology::Closed);
        row.strong_normalize();
        Self { row }
    }

    /// The closure point `e / divisor`, in the NNC topology.
    ///
    /// # Panics
    ///
    /// Panics when the divisor is not positive.
    pub fn closure_point(e: impl Into<LinearExpr>, divisor: impl Into<Coefficient>) -> Self {
        let divisor = divisor.into();
        assert!(
            sgn(&divisor) > 0,
            "the divisor of a closure point must be positive"
        );
        let e = e.into();
        let mut columns = e.as_slice().to_vec();
        columns[0] = divisor;
        columns.push(Coefficient::zero());
        let mut row =
            LinearRow::from_columns(columns, RowKind::RayOrPointOrInequality, Topology::Nnc);
        row.strong_normalize();
        Self { row }
    }

    fn homogeneous(e: LinearExpr, kind: RowKind, what: &str) -> Self {
        assert!(
            !e.all_homogeneous_terms_are_zero(),
            "a {what} needs a nonzero direction"
        );
        let mut columns = e.as_slice().to_vec();
        columns[0] = Coefficient::zero();
        let mut row = LinearRow::from_columns(columns, kind, Topology::Closed);
        row.strong_normalize();
        Self { row }
    }

    pub fn kind(&self) -> GeneratorKind {
        if self.row.is_line_or_equality() {
            GeneratorKind::Line
        } else if self.row[0].is_zero() {
            GeneratorKind::Ray
        } else {
            match self.row.topology() {
                Topology::Closed => GeneratorKind::Point,
                Topology::Nnc => {
                    if sgn(&self.row.eps_coefficient()) > 0 {
                        GeneratorKind::Point
                    } else {
                        GeneratorKind::ClosurePoint
                    }
                }
            }
        }
    }

    pub fn is_line(&self) -> bool {
        self.kind() == GeneratorKind::Line
    }

    pub fn is_ray(&self) -> bool {
        self.kind() == GeneratorKind::Ray
    }

    pub fn is_line_or_ray(&self) -> bool {
        matches!(self.kind(), GeneratorKind::Line | GeneratorKind::Ray)
    }

    pub fn is_point(&self) -> bool {
        self.kind() == GeneratorKind::Point
    }

    pub fn is_closure_point(&self) -> bool {
        self.kind() == GeneratorKind::ClosurePoint
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

    /// The coefficient of `v`, zero when `v` lies beyond the generator.
    pub fn coefficient(&self, v: Variable) -> Coefficient {
        if v.id() + 1 <= self.space_dimension() {
            self.row[v.id() + 1].clone()
        } else {
            Coefficient::zero()
        }
    }

    /// The divisor of a point or closure point.
    ///
    /// # Panics
    ///
    /// Panics for lines and rays, which carry no divisor.
    pub fn divisor(&self) -> &Coefficient {
        assert!(
            !self.is_line_or_ray(),
            "lines and rays have no divisor"
        );
        &self.row[0]
    }

    /// The homogeneous part as an expression.
    pub fn to_expr(&self) -> LinearExpr {
        let mut e = LinearExpr::with_space_dimension(self.space_dimension());
        for i in 0..self.space_dimension() {
            e.set_coefficient(Variable(i), self.row[i + 1].clone());
        }
        e
    }

    pub fn all_homogeneous_terms_are_zero(&self) -> bool {
        self.row.all_homogeneous_terms_are_zero()
    }

    /// Whether `self` is a closure point with exactly the coordinates of
    /// the point `p`.
    pub fn is_matching_closure_point(&self, p: &Generator) -> bool {
        if !self.is_closure_point() || !p.is_point() {
            return false;
        }
        let n = self.space_dimension().max(p.space_dimension());
        let zero = Coefficient::zero();
        (1..=n).all(|j| {
            let mine = self.row.as_slice().get(j).unwrap_or(&zero);
            let theirs = p.row.as_slice().get(j).unwrap_or(&zero);
            mine * &p.row[0] == theirs * &self.row[0]
        })
    }
}

impl fmt::Display for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.kind() {
            GeneratorKind::Line => "l",
            GeneratorKind::Ray => "r",
            GeneratorKind::Point => "p",
            GeneratorKind::ClosurePoint => "cp",
        };
        let e = self.to_expr();
        if self.is_line_or_ray() {
            write!(f, "{tag}({e})")
        } else {
            let d = &self.row[0];
            if num::One::is_one(d) {
                write!(f, "{tag}({e})")
            } else {
                write!(f, "{tag}(({e})/{d})")
            }
        }
    }
}

/// A system of generators of one topology.
pub type GeneratorSystem = LinearSystem<Generator>;

impl GeneratorSystem {
    /// Adjusts `g` to this system's column layout and appends it.
    ///
    /// A closed point entering an NNC system gets its epsilon coefficient
    /// set to the divisor.
    ///
    /// # Panics
    ///
    /// Panics when a closure point is inserted into a closed system.
    pub fn insert(&mut self, g: Generator) {
        self.insert_at(g, false);
    }

    /// Like [`GeneratorSystem::insert`], but appends to the pending
    /// segment.
    pub fn insert_pending(&mut self, g: Generator) {
        self.insert_at(g, true);
    }

    fn insert_at(&mut self, g: Generator, pending: bool) {
        assert!(
            !(self.is_necessarily_closed() && g.is_closure_point()),
            "closure point inserted into a closed generator system"
        );
        let was_point = g.is_point();
        let row = self.fit_row(g.into_row(), was_point);
        if pending {
            self.add_pending_row(Generator::from_row(row));
        } else {
            self.add_row(Generator::from_row(row));
        }
    }

    fn fit_row(&mut self, mut row: LinearRow, is_point: bool) -> LinearRow {
        let row_dim = row.space_dimension();
        if self.num_columns() == 0 {
            self.add_zero_columns(row_dim + self.topology().extra_columns());
        } else if row_dim > self.space_dimension() {
            let at = self.num_columns() - (self.topology().extra_columns() - 1);
            self.insert_zero_columns(at, row_dim - self.space_dimension());
        }
        match (row.topology(), self.topology()) {
            (Topology::Closed, Topology::Closed) => {
                row.resize(self.num_columns());
                row
            }
            (Topology::Nnc, Topology::Nnc) => {
                let eps = row.remove_column(row.size() - 1);
                row.resize(self.num_columns());
                let last = row.size() - 1;
                row[last] = eps;
                row
            }
            (Topology::Closed, Topology::Nnc) => {
                let mut cols = row.as_slice().to_vec();
                cols.resize(self.num_columns() - 1, Coefficient::zero());
                let eps = if is_point {
                    cols[0].clone()
                } else {
                    Coefficient::zero()
                };
                cols.push(eps);
                LinearRow::from_columns(cols, row.kind(), Topology::Nnc)
            }
            (Topology::Nnc, Topology::Closed) => {
                row.remove_column(row.size() - 1);
                let mut cols = row.as_slice().to_vec();
                cols.resize(self.num_columns(), Coefficient::zero());
                LinearRow::from_columns(cols, row.kind(), Topology::Closed)
            }
        }
    }

    /// Whether the system contains a point. In the NNC topology only rows
    /// with a positive epsilon coefficient qualify.
    pub fn has_points(&self) -> bool {
        self.iter().any(Generator::is_point)
    }

    pub fn num_lines(&self) -> usize {
        self.iter().filter(|g| g.is_line()).count()
    }

    pub fn num_rays(&self) -> usize {
        self.iter().filter(|g| g.is_ray()).count()
    }

    /// Appends, for every point lacking one, a closure point with the same
    /// coordinates. Meaningful for NNC systems only.
    pub fn add_corresponding_closure_points(&mut self) {
        debug_assert!(!self.is_necessarily_closed());
        let mut to_add = Vec::new();
        for g in self.iter() {
            if g.is_point()
                && !self
                    .iter()
                    .any(|cp| cp.is_matching_closure_point(g))
            {
                let mut row = g.row().clone();
                let eps = row.eps_index();
                row[eps] = Coefficient::zero();
                row.strong_normalize();
                to_add.push(Generator::from_row(row));
            }
        }
        for g in to_add {
            self.add_row(g);
        }
    }

    /// Appends, for every closure point lacking one, a point with the same
    /// coordinates. This is how the topological closure materializes on
    /// the generator side.
    pub fn add_corresponding_points(&mut self) {
        debug_assert!(!self.is_necessarily_closed());
        let mut to_add = Vec::new();
        for g in self.iter() {
            if g.is_closure_point()
                && !self.iter().any(|p| g.is_matching_closure_point(p))
            {
                let mut row = g.row().clone();
                let eps = row.eps_index();
                row[eps] = row[0].clone();
                row.strong_normalize();
                to_add.push(Generator::from_row(row));
            }
        }
        for g in to_add {
            self.add_row(g);
        }
    }

    /// The relation between the set these generators span and the set
    /// defined by `c`. The system must be non-empty.
    pub fn relation_with(&self, c: &Constraint) -> PolyConRelation {
        // What signs the product can reach over the spanned set: closure
        // points reach their sign in the limit, which is enough to witness
        // strictly positive or negative values but not zero.
        let mut can_pos = false;
        let mut can_neg = false;
        let mut point_hits_zero = false;
        for g in self.iter() {
            let sp = scalar_products::topology_adjusted_sign(c.row(), g.row());
            match g.kind() {
                GeneratorKind::Line => {
                    if sp != 0 {
                        can_pos = true;
                        can_neg = true;
                    }
                }
                GeneratorKind::Ray => {
                    if sp > 0 {
                        can_pos = true;
                    } else if sp < 0 {
                        can_neg = true;
                    }
                }
                GeneratorKind::Point | GeneratorKind::ClosurePoint => {
                    if sp > 0 {
                        can_pos = true;
                    } else if sp < 0 {
                        can_neg = true;
                    } else if g.is_point() {
                        point_hits_zero = true;
                    }
                }
            }
        }
        let can_zero = point_hits_zero || (can_pos && can_neg);
        let saturates = !can_pos && !can_neg;
        match c.kind() {
            ConstraintKind::Equality => {
                if saturates {
                    PolyConRelation::SATURATES | PolyConRelation::IS_INCLUDED
                } else if !can_zero {
                    PolyConRelation::IS_DISJOINT
                } else {
                    PolyConRelation::STRICTLY_INTERSECTS
                }
            }
            ConstraintKind::NonstrictInequality => {
                if saturates {
                    PolyConRelation::SATURATES | PolyConRelation::IS_INCLUDED
                } else if !can_neg {
                    PolyConRelation::IS_INCLUDED
                } else if !can_pos && !can_zero {
                    PolyConRelation::IS_DISJOINT
                } else {
                    PolyConRelation::STRICTLY_INTERSECTS
                }
            }
            ConstraintKind::StrictInequality => {
                if saturates {
                    PolyConRelation::SATURATES | PolyConRelation::IS_DISJOINT
                } else if !can_neg && !can_zero {
                    PolyConRelation::IS_INCLUDED
                } else if !can_pos {
                    PolyConRelation::IS_DISJOINT
                } else {
                    PolyConRelation::STRICTLY_INTERSECTS
                }
            }
        }
    }

    /// Embeds the system in `space_dim` dimensions and converts it to
    /// `topology`. Fails when closure points would be lost.
    pub fn adjust_topology_and_space_dimension(
        &mut self,
        topology: Topology,
        space_dim: usize,
    ) -> Result<()> {
        if space_dim < self.space_dimension() {
            return Err(Error::InvalidArgument {
                op: "GeneratorSystem::adjust_topology_and_space_dimension",
                reason: "the space dimension of a system cannot shrink",
            });
        }
        if topology == Topology::Closed && self.iter().any(Generator::is_closure_point) {
            return Err(Error::TopologyMismatch {
                op: "GeneratorSystem::adjust_topology_and_space_dimension",
            });
        }
        let mut adjusted =
            GeneratorSystem::with_columns(topology, space_dim + topology.extra_columns());
        let first_pending = self.first_pending_row();
        for (i, g) in self.iter().enumerate() {
            if i < first_pending {
                adjusted.insert(g.clone());
            } else {
                adjusted.insert_pending(g.clone());
            }
        }
        *self = adjusted;
        Ok(())
    }
}

impl fmt::Display for GeneratorSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut printed = false;
        for g in self.iter() {
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
    use crate::constraint::Rel;

    #[test]
    fn kinds_and_divisors() {
        let a = Variable(0);
        let b = Variable(1);
        assert_eq!(Generator::line(a).kind(), GeneratorKind::Line);
        assert_eq!(Generator::ray(a + b).kind(), GeneratorKind::Ray);
        let p = Generator::point(2 * a + 4 * b, 2);
        assert_eq!(p.kind(), GeneratorKind::Point);
        // (2A + 4B)/2 normalizes to (A + 2B)/1.
        assert_eq!(*p.divisor(), Coefficient::from(1));
        assert_eq!(p.coefficient(b), Coefficient::from(2));
    }

    #[test]
    fn display_forms() {
        let a = Variable(0);
        let b = Variable(1);
        assert_eq!(Generator::point(a + b, 1).to_string(), "p(A + B)");
        assert_eq!(Generator::point(a + b, 2).to_string(), "p((A + B)/2)");
        assert_eq!(Generator::ray(a).to_string(), "r(A)");
        assert_eq!(Generator::line(b).to_string(), "l(B)");
        assert_eq!(
            Generator::closure_point(a, 1).to_string(),
            "cp(A)"
        );
        assert_eq!(
            Generator::point(LinearExpr::new(), 1).to_string(),
            "p(0)"
        );
    }

    #[test]
    fn closed_point_in_nnc_system_gets_eps_equal_to_divisor() {
        let a = Variable(0);
        let mut gs = GeneratorSystem::new(Topology::Nnc);
        gs.insert(Generator::point(3 * a, 2));
        let g = gs.row(0);
        assert!(g.is_point());
        assert_eq!(g.row().eps_coefficient(), *g.divisor());
    }

    #[test]
    fn matching_closure_points() {
        let a = Variable(0);
        let mut gs = GeneratorSystem::new(Topology::Nnc);
        gs.insert(Generator::point(a, 2));
        gs.add_corresponding_closure_points();
        assert_eq!(gs.num_rows(), 2);
        let cp = gs.row(1);
        assert!(cp.is_closure_point());
        assert!(cp.is_matching_closure_point(gs.row(0)));
        // Running it again adds nothing.
        gs.add_corresponding_closure_points();
        assert_eq!(gs.num_rows(), 2);
    }

    #[test]
    fn relation_with_a_square() {
        let a = Variable(0);
        let b = Variable(1);
        let mut gs = GeneratorSystem::new(Topology::Closed);
        gs.insert(Generator::point(LinearExpr::new(), 1));
        gs.insert(Generator::point(a, 1));
        gs.insert(Generator::point(b, 1));
        gs.insert(Generator::point(a + b, 1));

        let included = gs.relation_with(&(a + b).ge(0));
        assert!(included.implies(PolyConRelation::IS_INCLUDED));
        assert!(!included.implies(PolyConRelation::SATURATES));

        let crossing = gs.relation_with(&a.ge(1));
        assert!(crossing.implies(PolyConRelation::STRICTLY_INTERSECTS));

        let disjoint = gs.relation_with(&a.le(-1));
        assert!(disjoint.implies(PolyConRelation::IS_DISJOINT));

        let boundary = gs.relation_with(&a.ge(0));
        assert!(boundary.implies(PolyConRelation::IS_INCLUDED));
    }
}
