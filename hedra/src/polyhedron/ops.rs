//! Refinement and lattice operations.

use super::status::Status;
use super::Polyhedron;
use crate::congruence::{Congruence, CongruenceSystem};
use crate::constraint::{Constraint, ConstraintKind, ConstraintSystem, Rel};
use crate::error::{Error, Result};
use crate::generator::{Generator, GeneratorSystem};
use crate::linear_system::SystemRow;
use crate::relation::PolyConRelation;
use hedra_num::coefficient::Coefficient;
use hedra_num::LinearExpr;
use num::Zero;

impl Polyhedron {
    /// Refines the polyhedron with `c`, intersecting it with the
    /// constraint's solution set. An empty polyhedron absorbs everything.
    pub fn add_constraint(&mut self, c: Constraint) -> Result<()> {
        if c.is_strict_inequality() && self.is_necessarily_closed() {
            if c.is_tautological() {
                return Ok(());
            }
            if c.is_inconsistent() {
                self.set_empty();
                return Ok(());
            }
            return Err(Error::TopologyMismatch {
                op: "Polyhedron::add_constraint",
            });
        }
        self.check_operand_dimension(c.space_dimension(), "Polyhedron::add_constraint")?;
        if self.marked_empty() {
            return Ok(());
        }
        if self.space_dimension() == 0 {
            if c.is_inconsistent() {
                self.set_empty();
            }
            return Ok(());
        }
        self.refine_no_check(c)
    }

    /// Adds every constraint of `cs`.
    pub fn add_constraints(&mut self, cs: &ConstraintSystem) -> Result<()> {
        if self.is_necessarily_closed() && cs.has_strict_inequalities() {
            if cs
                .iter()
                .any(|c| c.is_strict_inequality() && !c.is_inconsistent())
            {
                return Err(Error::TopologyMismatch {
                    op: "Polyhedron::add_constraints",
                });
            }
            // Every strict inequality is trivially false.
            self.check_operand_dimension(cs.space_dimension(), "Polyhedron::add_constraints")?;
            self.set_empty();
            return Ok(());
        }
        self.check_operand_dimension(cs.space_dimension(), "Polyhedron::add_constraints")?;
        if cs.has_no_rows() || self.marked_empty() {
            return Ok(());
        }
        if self.space_dimension() == 0 {
            if cs.iter().any(Constraint::is_inconsistent) {
                self.set_empty();
            }
            return Ok(());
        }
        self.obtain_constraints()?;
        let adding_pending = self.can_have_something_pending();
        for c in cs.iter() {
            if c.is_tautological() {
                continue;
            }
            if adding_pending {
                self.con_sys.insert_pending(c.clone());
            } else {
                self.con_sys.insert(c.clone());
            }
        }
        if adding_pending {
            if self.con_sys.num_pending_rows() > 0 {
                self.set_flags(Status::C_PENDING);
            }
        } else {
            self.clear_flags(
                Status::C_MINIMIZED
                    | Status::G_UP_TO_DATE
                    | Status::G_MINIMIZED
                    | Status::SAT_C_UP_TO_DATE
                    | Status::SAT_G_UP_TO_DATE,
            );
        }
        debug_assert!(self.ok());
        Ok(())
    }

    /// Adds `g` to the generator system. Into an empty polyhedron only a
    /// point may be added.
    pub fn add_generator(&mut self, g: Generator) -> Result<()> {
        if g.is_closure_point() && self.is_necessarily_closed() {
            return Err(Error::TopologyMismatch {
                op: "Polyhedron::add_generator",
            });
        }
        self.check_operand_dimension(g.space_dimension(), "Polyhedron::add_generator")?;
        if self.space_dimension() == 0 {
            // No rays or lines exist in a zero-dimensional space.
            debug_assert!(!g.is_line_or_ray());
            if self.marked_empty() {
                if !g.is_point() {
                    return Err(Error::InvalidArgument {
                        op: "Polyhedron::add_generator",
                        reason: "only a point can enter an empty polyhedron",
                    });
                }
                self.set_zero_dim_univ();
            }
            return Ok(());
        }
        if !self.obtain_generators()? {
            // The polyhedron is empty.
            if !g.is_point() {
                return Err(Error::InvalidArgument {
                    op: "Polyhedron::add_generator",
                    reason: "only a point can enter an empty polyhedron",
                });
            }
            self.gen_sys.insert(g);
            if !self.is_necessarily_closed() {
                self.gen_sys.add_corresponding_closure_points();
            }
            self.set_status(Status::G_UP_TO_DATE | Status::G_MINIMIZED);
            debug_assert!(self.ok());
            return Ok(());
        }
        let pending = self.can_have_something_pending();
        let is_point = g.is_point();
        if pending {
            self.gen_sys.insert_pending(g.clone());
        } else {
            self.gen_sys.insert(g.clone());
        }
        if !self.is_necessarily_closed() && is_point {
            // Every point needs its matching closure point.
            let mut cp = self.gen_sys.row(self.gen_sys.num_rows() - 1).clone();
            {
                let row = crate::linear_system::SystemRow::row_mut(&mut cp);
                let eps = row.eps_index();
                row[eps] = Coefficient::zero();
                row.strong_normalize();
            }
            if pending {
                self.gen_sys.add_pending_row(cp);
            } else {
                self.gen_sys.add_row(cp);
            }
        }
        if pending {
            self.set_flags(Status::G_PENDING);
        } else {
            self.clear_flags(
                Status::G_MINIMIZED
                    | Status::C_UP_TO_DATE
                    | Status::C_MINIMIZED
                    | Status::SAT_C_UP_TO_DATE
                    | Status::SAT_G_UP_TO_DATE,
            );
        }
        debug_assert!(self.ok());
        Ok(())
    }

    /// Adds every generator of `gs`.
    pub fn add_generators(&mut self, gs: &GeneratorSystem) -> Result<()> {
        if self.is_necessarily_closed() && gs.iter().any(Generator::is_closure_point) {
            return Err(Error::TopologyMismatch {
                op: "Polyhedron::add_generators",
            });
        }
        self.check_operand_dimension(gs.space_dimension(), "Polyhedron::add_generators")?;
        if gs.has_no_rows() {
            return Ok(());
        }
        if self.space_dimension() == 0 {
            if self.marked_empty() && !gs.has_points() {
                return Err(Error::InvalidArgument {
                    op: "Polyhedron::add_generators",
                    reason: "an empty polyhedron can only receive a system with points",
                });
            }
            self.set_zero_dim_univ();
            return Ok(());
        }
        let mut gs = gs.clone();
        gs.adjust_topology_and_space_dimension(self.topology(), self.space_dimension())?;
        if !self.is_necessarily_closed() {
            gs.add_corresponding_closure_points();
        }
        gs.unset_pending_rows();
        if !self.obtain_generators()? {
            // The polyhedron is empty.
            if !gs.has_points() {
                return Err(Error::InvalidArgument {
                    op: "Polyhedron::add_generators",
                    reason: "an empty polyhedron can only receive a system with points",
                });
            }
            self.gen_sys = gs;
            self.set_status(Status::G_UP_TO_DATE);
            debug_assert!(self.ok());
            return Ok(());
        }
        let pending = self.can_have_something_pending();
        for g in gs.iter() {
            if pending {
                self.gen_sys.insert_pending(g.clone());
            } else {
                self.gen_sys.insert(g.clone());
            }
        }
        if pending {
            self.set_flags(Status::G_PENDING);
        } else {
            self.clear_flags(
                Status::G_MINIMIZED
                    | Status::C_UP_TO_DATE
                    | Status::C_MINIMIZED
                    | Status::SAT_C_UP_TO_DATE
                    | Status::SAT_G_UP_TO_DATE,
            );
        }
        debug_assert!(self.ok());
        Ok(())
    }

    /// Adds a congruence: equalities are admitted as equality constraints,
    /// trivial proper congruences vanish or empty the polyhedron, and any
    /// other proper congruence is rejected.
    pub fn add_congruence(&mut self, cg: &Congruence) -> Result<()> {
        self.check_operand_dimension(cg.space_dimension(), "Polyhedron::add_congruence")?;
        if cg.is_proper_congruence() {
            if cg.is_tautological() {
                return Ok(());
            }
            if cg.is_inconsistent() {
                self.set_empty();
                return Ok(());
            }
            return Err(Error::InvalidArgument {
                op: "Polyhedron::add_congruence",
                reason: "a non-trivial proper congruence cannot constrain a polyhedron",
            });
        }
        if self.marked_empty() {
            return Ok(());
        }
        if self.space_dimension() == 0 {
            if cg.is_inconsistent() {
                self.set_empty();
            }
            return Ok(());
        }
        self.refine_no_check(cg.to_expr().eq(0))
    }

    /// Adds every congruence of `cgs`.
    pub fn add_congruences(&mut self, cgs: &CongruenceSystem) -> Result<()> {
        self.check_operand_dimension(cgs.space_dimension(), "Polyhedron::add_congruences")?;
        for cg in cgs.iter() {
            self.add_congruence(cg)?;
        }
        Ok(())
    }

    /// Refines with `c` without ever reporting a topology mismatch: a
    /// strict inequality refining a closed polyhedron is weakened to its
    /// non-strict relaxation.
    pub fn refine_with_constraint(&mut self, c: &Constraint) -> Result<()> {
        self.check_operand_dimension(c.space_dimension(), "Polyhedron::refine_with_constraint")?;
        if self.marked_empty() {
            return Ok(());
        }
        if c.is_tautological() {
            return Ok(());
        }
        if c.is_inconsistent() {
            self.set_empty();
            return Ok(());
        }
        if self.space_dimension() == 0 {
            return Ok(());
        }
        let c = if self.is_necessarily_closed() && c.is_strict_inequality() {
            c.to_expr().ge(0)
        } else {
            c.clone()
        };
        self.refine_no_check(c)
    }

    /// Refines with `cg`; a proper congruence contributes only when it is
    /// trivial, otherwise the refinement is a no-op over-approximation.
    pub fn refine_with_congruence(&mut self, cg: &Congruence) -> Result<()> {
        self.check_operand_dimension(cg.space_dimension(), "Polyhedron::refine_with_congruence")?;
        if self.marked_empty() {
            return Ok(());
        }
        if cg.is_inconsistent() {
            self.set_empty();
            return Ok(());
        }
        if cg.is_equality() && self.space_dimension() > 0 {
            return self.refine_no_check(cg.to_expr().eq(0));
        }
        Ok(())
    }

    /// The unchecked core of constraint refinement: the caller has ruled
    /// out trivial and dimension-mismatched inputs.
    pub(crate) fn refine_no_check(&mut self, c: Constraint) -> Result<()> {
        debug_assert!(!self.marked_empty());
        debug_assert!(self.space_dimension() > 0);
        if c.is_tautological() {
            return Ok(());
        }
        if c.is_inconsistent() {
            self.set_empty();
            return Ok(());
        }
        self.obtain_constraints()?;
        if self.can_have_something_pending() {
            self.con_sys.insert_pending(c);
            self.set_flags(Status::C_PENDING);
        } else {
            self.con_sys.insert(c);
            self.clear_flags(
                Status::C_MINIMIZED
                    | Status::G_UP_TO_DATE
                    | Status::G_MINIMIZED
                    | Status::SAT_C_UP_TO_DATE
                    | Status::SAT_G_UP_TO_DATE,
            );
        }
        debug_assert!(self.ok());
        Ok(())
    }

    /// `self := self ∩ y`.
    pub fn intersection_assign(&mut self, y: &Polyhedron) -> Result<()> {
        self.check_topologies(y, "Polyhedron::intersection_assign")?;
        self.check_same_dimension(y, "Polyhedron::intersection_assign")?;
        if self.marked_empty() {
            return Ok(());
        }
        if y.marked_empty() {
            self.set_empty();
            return Ok(());
        }
        if self.space_dimension() == 0 {
            return Ok(());
        }
        self.obtain_constraints()?;
        let y_cons = match y.constraints_view()? {
            Some(cs) => cs,
            None => {
                self.set_empty();
                return Ok(());
            }
        };
        if self.can_have_something_pending() {
            self.con_sys.add_pending_rows(&y_cons);
            self.set_flags(Status::C_PENDING);
        } else {
            self.con_sys.add_rows(&y_cons);
            self.clear_flags(
                Status::C_MINIMIZED
                    | Status::G_UP_TO_DATE
                    | Status::G_MINIMIZED
                    | Status::SAT_C_UP_TO_DATE
                    | Status::SAT_G_UP_TO_DATE,
            );
        }
        debug_assert!(self.ok());
        Ok(())
    }

    /// `self := convex_hull(self ∪ y)`.
    pub fn poly_hull_assign(&mut self, y: &Polyhedron) -> Result<()> {
        self.check_topologies(y, "Polyhedron::poly_hull_assign")?;
        self.check_same_dimension(y, "Polyhedron::poly_hull_assign")?;
        if y.marked_empty() {
            return Ok(());
        }
        if self.marked_empty() {
            *self = y.clone();
            return Ok(());
        }
        if self.space_dimension() == 0 {
            return Ok(());
        }
        if !self.obtain_generators()? {
            *self = y.clone();
            return Ok(());
        }
        let y_gens = match y.generators_view()? {
            Some(gs) => gs,
            None => return Ok(()),
        };
        if self.can_have_something_pending() {
            self.gen_sys.add_pending_rows(&y_gens);
            self.set_flags(Status::G_PENDING);
        } else {
            self.gen_sys.add_rows(&y_gens);
            self.clear_flags(
                Status::G_MINIMIZED
                    | Status::C_UP_TO_DATE
                    | Status::C_MINIMIZED
                    | Status::SAT_C_UP_TO_DATE
                    | Status::SAT_G_UP_TO_DATE,
            );
        }
        debug_assert!(self.ok());
        Ok(())
    }

    /// `self := self \ y`, the poly-difference: the smallest polyhedron
    /// containing the set difference. When both polyhedra are closed and
    /// an equality of `y` splits `self`, the exact difference is not
    /// closed and `self` is left unchanged as a safe over-approximation.
    pub fn poly_difference_assign(&mut self, y: &Polyhedron) -> Result<()> {
        self.check_topologies(y, "Polyhedron::poly_difference_assign")?;
        self.check_same_dimension(y, "Polyhedron::poly_difference_assign")?;
        if y.marked_empty() || self.marked_empty() {
            return Ok(());
        }
        if self.space_dimension() == 0 {
            self.set_empty();
            return Ok(());
        }
        if y.contains(self)? {
            self.set_empty();
            return Ok(());
        }
        let mut y = y.clone();
        if !y.minimize()? {
            return Ok(());
        }
        self.minimize()?;
        let mut difference = Polyhedron::empty(self.topology(), self.space_dimension());
        for c in y.con_sys.iter() {
            if c.is_tautological() {
                continue;
            }
            if self
                .relation_with(c)?
                .implies(PolyConRelation::IS_INCLUDED)
            {
                continue;
            }
            let e = c.to_expr();
            let mut z = self.clone();
            match c.kind() {
                ConstraintKind::NonstrictInequality => {
                    if self.is_necessarily_closed() {
                        z.refine_no_check(e.le(0))?;
                    } else {
                        z.refine_no_check(e.lt(0))?;
                    }
                }
                ConstraintKind::StrictInequality => {
                    z.refine_no_check(e.le(0))?;
                }
                ConstraintKind::Equality => {
                    if self.is_necessarily_closed() {
                        // The complement of a hyperplane is open: leave the
                        // receiver unchanged rather than lose soundness.
                        return Ok(());
                    }
                    let mut w = self.clone();
                    w.refine_no_check(e.clone().lt(0))?;
                    difference.poly_hull_assign(&w)?;
                    z.refine_no_check(e.gt(0))?;
                }
            }
            difference.poly_hull_assign(&z)?;
        }
        *self = difference;
        debug_assert!(self.ok());
        Ok(())
    }

    /// `self := { x + t*r : x in self, r in rec(y), t >= 0 }`: the rays
    /// and lines of `y`, with its points demoted to rays, widen `self`
    /// along every direction `y` can move in.
    pub fn time_elapse_assign(&mut self, y: &Polyhedron) -> Result<()> {
        self.check_topologies(y, "Polyhedron::time_elapse_assign")?;
        self.check_same_dimension(y, "Polyhedron::time_elapse_assign")?;
        if self.space_dimension() == 0 {
            if y.marked_empty() {
                self.set_empty();
            }
            return Ok(());
        }
        if self.marked_empty() || y.marked_empty() || !self.obtain_generators()? {
            self.set_empty();
            return Ok(());
        }
        let y_gens = match y.generators_view()? {
            Some(gs) => gs,
            None => {
                self.set_empty();
                return Ok(());
            }
        };
        let mut directions = GeneratorSystem::with_columns(self.topology(), y_gens.num_columns());
        for g in y_gens.iter() {
            match g.kind() {
                crate::generator::GeneratorKind::Line | crate::generator::GeneratorKind::Ray => {
                    directions.add_row(g.clone());
                }
                crate::generator::GeneratorKind::Point
                    if self.is_necessarily_closed() && !g.all_homogeneous_terms_are_zero() =>
                {
                    let mut row = g.row().clone();
                    row[0] = Coefficient::zero();
                    row.strong_normalize();
                    directions.add_row(Generator::from_row(row));
                }
                crate::generator::GeneratorKind::ClosurePoint
                    if !g.all_homogeneous_terms_are_zero() =>
                {
                    // In the NNC topology closure points take over the role
                    // of points when recession directions are extracted.
                    let mut row = g.row().clone();
                    row[0] = Coefficient::zero();
                    row.strong_normalize();
                    directions.add_row(Generator::from_row(row));
                }
                _ => {}
            }
        }
        if directions.has_no_rows() {
            return Ok(());
        }
        if self.can_have_something_pending() {
            self.gen_sys.add_pending_rows(&directions);
            self.set_flags(Status::G_PENDING);
        } else {
            self.gen_sys.add_rows(&directions);
            self.clear_flags(
                Status::G_MINIMIZED
                    | Status::C_UP_TO_DATE
                    | Status::C_MINIMIZED
                    | Status::SAT_C_UP_TO_DATE
                    | Status::SAT_G_UP_TO_DATE,
            );
        }
        debug_assert!(self.ok());
        Ok(())
    }

    /// Turns every strict inequality into its non-strict counterpart.
    pub fn topological_closure_assign(&mut self) -> Result<()> {
        if self.is_necessarily_closed() || self.marked_empty() || self.space_dimension() == 0 {
            return Ok(());
        }
        if self.has_pending_constraints() && !self.process_pending_constraints()? {
            return Ok(());
        }
        if !self.has_pending_generators() && self.constraints_are_up_to_date() {
            let eps_index = self.space_dimension() + 1;
            let mut changed = false;
            for i in 0..self.con_sys.num_rows() {
                let c = self.con_sys.row_mut(i);
                let row = crate::linear_system::SystemRow::row_mut(c);
                if row[eps_index] < Coefficient::zero() {
                    row[eps_index] = Coefficient::zero();
                    row.strong_normalize();
                    changed = true;
                }
            }
            if changed {
                self.con_sys.insert(Constraint::epsilon_leq_one(self.space_dimension()));
                self.clear_flags(
                    Status::C_MINIMIZED
                        | Status::G_UP_TO_DATE
                        | Status::G_MINIMIZED
                        | Status::SAT_C_UP_TO_DATE
                        | Status::SAT_G_UP_TO_DATE,
                );
            }
        } else {
            debug_assert!(self.generators_are_up_to_date());
            self.gen_sys.add_corresponding_points();
            self.gen_sys.unset_pending_rows();
            self.clear_flags(
                Status::G_PENDING
                    | Status::G_MINIMIZED
                    | Status::C_UP_TO_DATE
                    | Status::C_MINIMIZED
                    | Status::SAT_C_UP_TO_DATE
                    | Status::SAT_G_UP_TO_DATE,
            );
        }
        debug_assert!(self.ok());
        Ok(())
    }

    /// Existentially quantifies away the dimension of `v` by adding the
    /// corresponding line.
    pub fn unconstrain(&mut self, v: hedra_num::Variable) -> Result<()> {
        if v.id() >= self.space_dimension() {
            return Err(Error::DimensionIncompatible {
                op: "Polyhedron::unconstrain",
                receiver_dim: self.space_dimension(),
                operand_dim: v.space_dimension(),
            });
        }
        if !self.obtain_generators()? {
            return Ok(());
        }
        let line = Generator::line(LinearExpr::from(v));
        if self.can_have_something_pending() {
            self.gen_sys.insert_pending(line);
            self.set_flags(Status::G_PENDING);
        } else {
            self.gen_sys.insert(line);
            self.clear_flags(
                Status::G_MINIMIZED
                    | Status::C_UP_TO_DATE
                    | Status::C_MINIMIZED
                    | Status::SAT_C_UP_TO_DATE
                    | Status::SAT_G_UP_TO_DATE,
            );
        }
        debug_assert!(self.ok());
        Ok(())
    }

    /// Existentially quantifies away every dimension in `vars`.
    pub fn unconstrain_set(&mut self, vars: &[hedra_num::Variable]) -> Result<()> {
        for &v in vars {
            self.unconstrain(v)?;
        }
        Ok(())
    }

    /// A universe grid generator system of this polyhedron's space
    /// dimension: a point at the origin plus one grid line per dimension.
    pub fn grid_generators(&self) -> crate::grid_generator::GridGeneratorSystem {
        use crate::grid_generator::GridGenerator;
        let mut ggs =
            crate::grid_generator::GridGeneratorSystem::with_space_dimension(self.space_dimension());
        ggs.insert(GridGenerator::grid_point(LinearExpr::new(), 1));
        for dim in 0..self.space_dimension() {
            ggs.insert(GridGenerator::grid_line(LinearExpr::from(
                hedra_num::Variable(dim),
            )));
        }
        ggs
    }
}

// Internal helpers shared by the lattice operations.
impl Polyhedron {
    /// The constraint system of `self`, materializing a lazy state on a
    /// clone when necessary; `None` when the polyhedron is empty.
    pub(crate) fn constraints_view(&self) -> Result<Option<ConstraintSystem>> {
        if self.marked_empty() {
            return Ok(None);
        }
        if self.constraints_are_up_to_date() && !self.has_pending_generators() {
            return Ok(Some(self.con_sys.clone()));
        }
        let mut tmp = self.clone();
        tmp.obtain_constraints()?;
        if tmp.marked_empty() {
            return Ok(None);
        }
        Ok(Some(tmp.con_sys))
    }

    /// The generator system of `self`, materializing a lazy state on a
    /// clone when necessary; `None` when the polyhedron is empty.
    pub(crate) fn generators_view(&self) -> Result<Option<GeneratorSystem>> {
        if self.marked_empty() {
            return Ok(None);
        }
        if self.generators_are_up_to_date() && !self.has_pending_constraints() {
            return Ok(Some(self.gen_sys.clone()));
        }
        let mut tmp = self.clone();
        if !tmp.obtain_generators()? {
            return Ok(None);
        }
        Ok(Some(tmp.gen_sys))
    }

    /// A minimized copy of `self`, or `None` when empty.
    pub(crate) fn minimized_view(&self) -> Result<Option<Polyhedron>> {
        if self.marked_empty() {
            return Ok(None);
        }
        let mut tmp = self.clone();
        if !tmp.minimize()? {
            return Ok(None);
        }
        Ok(Some(tmp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::Topology;
    use hedra_num::Variable;

    fn boxed(ax: i64, bx: i64, ay: i64, by: i64) -> Polyhedron {
        let a = Variable(0);
        let b = Variable(1);
        let mut p = Polyhedron::universe(Topology::Closed, 2);
        p.add_constraint(a.ge(ax)).unwrap();
        p.add_constraint(a.le(bx)).unwrap();
        p.add_constraint(b.ge(ay)).unwrap();
        p.add_constraint(b.le(by)).unwrap();
        p
    }

    #[test]
    fn add_constraint_refines() {
        let a = Variable(0);
        let mut p = boxed(0, 2, 0, 2);
        p.add_constraint(a.le(1)).unwrap();
        let q = boxed(0, 1, 0, 2);
        assert_eq!(p, q);
    }

    #[test]
    fn strict_constraints_are_rejected_by_closed_polyhedra() {
        let a = Variable(0);
        let mut p = Polyhedron::universe(Topology::Closed, 1);
        assert!(matches!(
            p.add_constraint(a.gt(0)),
            Err(Error::TopologyMismatch { .. })
        ));
        // Trivially false strict inequalities are legal and empty it.
        p.add_constraint(LinearExpr::new().gt(0)).unwrap();
        assert!(p.is_empty().unwrap());
    }

    #[test]
    fn intersection_of_overlapping_boxes() {
        let mut p = boxed(0, 2, 0, 2);
        let q = boxed(1, 3, 1, 3);
        p.intersection_assign(&q).unwrap();
        assert_eq!(p, boxed(1, 2, 1, 2));
    }

    #[test]
    fn intersection_can_discover_emptiness() {
        let mut p = boxed(0, 1, 0, 1);
        let q = boxed(5, 6, 5, 6);
        p.intersection_assign(&q).unwrap();
        assert!(p.is_empty().unwrap());
    }

    #[test]
    fn hull_contains_both_arguments() {
        let mut p = boxed(0, 1, 0, 1);
        let p0 = p.clone();
        let q = boxed(2, 3, 2, 3);
        p.poly_hull_assign(&q).unwrap();
        assert!(p.contains(&p0).unwrap());
        assert!(p.contains(&q).unwrap());
        // The hull of the two boxes is bounded by the outer box and the
        // two diagonals.
        let a = Variable(0);
        let b = Variable(1);
        let mut expected = boxed(0, 3, 0, 3);
        expected.add_constraint(a.le(b + 1)).unwrap();
        expected.add_constraint(b.le(a + 1)).unwrap();
        assert_eq!(p, expected);
    }

    #[test]
    fn adding_a_generator_grows_the_set() {
        let a = Variable(0);
        let b = Variable(1);
        let mut p = boxed(0, 1, 0, 1);
        p.add_generator(Generator::point(3 * a + 3 * b, 1)).unwrap();
        assert!(p.contains(&boxed(0, 1, 0, 1)).unwrap());
        let vertex = Generator::point(3 * a + 3 * b, 1);
        assert!(p
            .relation_with_generator(&vertex)
            .unwrap()
            .implies(crate::PolyGenRelation::SUBSUMES));
    }

    #[test]
    fn only_points_enter_an_empty_polyhedron() {
        let a = Variable(0);
        let mut p = Polyhedron::empty(Topology::Closed, 2);
        assert!(p.add_generator(Generator::ray(a)).is_err());
        p.add_generator(Generator::point(a, 1)).unwrap();
        assert!(!p.is_empty().unwrap());
        p.add_generator(Generator::ray(a)).unwrap();
        assert!(!p.is_bounded().unwrap());
    }

    #[test]
    fn difference_of_boxes() {
        let mut p = boxed(0, 4, 0, 1);
        let q = boxed(2, 4, 0, 1);
        p.poly_difference_assign(&q).unwrap();
        // The closed difference over-approximates to [0, 2] x [0, 1].
        assert_eq!(p, boxed(0, 2, 0, 1));
    }

    #[test]
    fn difference_with_equality_returns_receiver() {
        let a = Variable(0);
        let mut q = Polyhedron::universe(Topology::Closed, 2);
        q.add_constraint(a.eq(1)).unwrap();
        let mut p = boxed(0, 2, 0, 2);
        let before = p.clone();
        p.poly_difference_assign(&q).unwrap();
        assert_eq!(p, before);
    }

    #[test]
    fn time_elapse_adds_recession_directions() {
        let a = Variable(0);
        let b = Variable(1);
        let mut p = boxed(0, 1, 0, 1);
        let mut y = Polyhedron::empty(Topology::Closed, 2);
        y.add_generator(Generator::point(a + b, 1)).unwrap();
        p.time_elapse_assign(&y).unwrap();
        // Moving along (1, 1) forever keeps A - B within [-1, 1].
        assert!(!p.is_bounded().unwrap());
        let mut expected = Polyhedron::universe(Topology::Closed, 2);
        expected.add_constraint(a.ge(0)).unwrap();
        expected.add_constraint(b.ge(0)).unwrap();
        expected.add_constraint((a - b).le(1)).unwrap();
        expected.add_constraint((b - a).le(1)).unwrap();
        assert_eq!(p, expected);
    }

    #[test]
    fn unconstrain_cylindrifies() {
        let a = Variable(0);
        let b = Variable(1);
        let mut p = boxed(0, 1, 0, 1);
        p.unconstrain(a).unwrap();
        let mut expected = Polyhedron::universe(Topology::Closed, 2);
        expected.add_constraint(b.ge(0)).unwrap();
        expected.add_constraint(b.le(1)).unwrap();
        assert_eq!(p, expected);
    }

    #[test]
    fn nnc_topological_closure() {
        let a = Variable(0);
        let b = Variable(1);
        let mut p = Polyhedron::universe(Topology::Nnc, 2);
        p.add_constraint(a.gt(0)).unwrap();
        p.add_constraint(a.lt(1)).unwrap();
        p.add_constraint(b.gt(0)).unwrap();
        p.add_constraint(b.lt(1)).unwrap();
        assert!(!p.is_topologically_closed().unwrap());
        p.topological_closure_assign().unwrap();
        assert!(p.is_topologically_closed().unwrap());
        let mut expected = Polyhedron::universe(Topology::Nnc, 2);
        expected.add_constraint(a.ge(0)).unwrap();
        expected.add_constraint(a.le(1)).unwrap();
        expected.add_constraint(b.ge(0)).unwrap();
        expected.add_constraint(b.le(1)).unwrap();
        assert_eq!(p, expected);
    }

    #[test]
    fn congruences_on_polyhedra() {
        let a = Variable(0);
        let b = Variable(1);
        let mut p = Polyhedron::universe(Topology::Closed, 2);
        p.add_congruence(&a.congruent(b, 0)).unwrap();
        assert!(p.constrains(a).unwrap());
        assert!(matches!(
            p.add_congruence(&a.congruent(0, 2)),
            Err(Error::InvalidArgument { .. })
        ));
        p.add_congruence(&LinearExpr::from(4).congruent(0, 2)).unwrap();
        assert!(!p.is_empty().unwrap());
        p.add_congruence(&LinearExpr::from(3).congruent(0, 2)).unwrap();
        assert!(p.is_empty().unwrap());
    }

    #[test]
    fn grid_generators_span_the_universe_grid() {
        let p = Polyhedron::universe(Topology::Closed, 3);
        let ggs = p.grid_generators();
        assert_eq!(ggs.space_dimension(), 3);
        assert_eq!(ggs.num_lines(), 3);
        assert!(ggs.has_points());
    }
}
