//! Lazy-state transitions: full minimization, incremental absorption of
//! pending rows, and the helpers public operations use to demand one
//! representation or the other.
//!
//! Every path that can fail (only through the cooperative deadline) works
//! on copies and commits at the end, so a failed call leaves the
//! polyhedron exactly as it was.

use super::conversion;
use super::simplify::simplify;
use super::status::Status;
use super::Polyhedron;
use crate::error::Result;
use hedra_util::BitMatrix;

impl Polyhedron {
    /// Brings both representations up to date and minimized, converting
    /// and draining pending rows as needed. Returns `false` exactly when
    /// the polyhedron turns out to be empty.
    pub fn minimize(&mut self) -> Result<bool> {
        if self.marked_empty() {
            return Ok(false);
        }
        if self.space_dimension() == 0 {
            return Ok(true);
        }
        if self.has_pending_constraints() {
            return self.process_pending_constraints();
        }
        if self.has_pending_generators() {
            self.process_pending_generators()?;
        }
        if self.constraints_are_minimized() && self.generators_are_minimized() {
            return Ok(true);
        }
        if self.constraints_are_up_to_date() {
            self.update_generators()
        } else {
            debug_assert!(self.generators_are_up_to_date());
            self.update_constraints()?;
            Ok(true)
        }
    }

    /// Recomputes the generators from the constraints, minimizing both
    /// and refreshing the saturation matrices. Returns `false` and marks
    /// the polyhedron empty when the constraints are unsatisfiable.
    pub(crate) fn update_generators(&mut self) -> Result<bool> {
        debug_assert!(self.constraints_are_up_to_date());
        debug_assert!(!self.has_something_pending());
        let topology = self.topology();
        let columns = self.space_dimension() + topology.extra_columns();
        let mut source = self.con_sys.clone();
        source.unset_pending_rows();
        let (mut dest, lines) = conversion::full_space_dest(topology, columns);
        let mut sat = BitMatrix::zeros(dest.num_rows(), 0);
        conversion::conversion(
            &source,
            0,
            &mut dest,
            &mut sat,
            lines,
            "Polyhedron::minimize",
        )?;
        if !dest.has_points() {
            self.set_empty();
            return Ok(false);
        }
        let mut sat_g = sat.transpose();
        simplify(&mut source, &mut sat_g);
        self.con_sys = source;
        self.gen_sys = dest;
        self.sat_c = sat_g.transpose();
        self.sat_g = sat_g;
        self.set_status(
            Status::C_UP_TO_DATE
                | Status::G_UP_TO_DATE
                | Status::C_MINIMIZED
                | Status::G_MINIMIZED
                | Status::SAT_C_UP_TO_DATE
                | Status::SAT_G_UP_TO_DATE,
        );
        debug_assert!(self.ok());
        Ok(true)
    }

    /// Recomputes the constraints from the generators, minimizing both
    /// and refreshing the saturation matrices. A well-formed generator
    /// system is always satisfiable, so this cannot discover emptiness.
    pub(crate) fn update_constraints(&mut self) -> Result<()> {
        debug_assert!(self.generators_are_up_to_date());
        debug_assert!(!self.has_something_pending());
        let topology = self.topology();
        let columns = self.space_dimension() + topology.extra_columns();
        let mut source = self.gen_sys.clone();
        source.unset_pending_rows();
        let (mut dest, lines) = conversion::zero_cone_dest(topology, columns);
        let mut sat = BitMatrix::zeros(dest.num_rows(), 0);
        conversion::conversion(
            &source,
            0,
            &mut dest,
            &mut sat,
            lines,
            "Polyhedron::minimize",
        )?;
        let mut sat_c = sat.transpose();
        simplify(&mut source, &mut sat_c);
        self.gen_sys = source;
        self.con_sys = dest;
        self.sat_g = sat_c.transpose();
        self.sat_c = sat_c;
        self.set_status(
            Status::C_UP_TO_DATE
                | Status::G_UP_TO_DATE
                | Status::C_MINIMIZED
                | Status::G_MINIMIZED
                | Status::SAT_C_UP_TO_DATE
                | Status::SAT_G_UP_TO_DATE,
        );
        debug_assert!(self.ok());
        Ok(())
    }

    /// Classifies the pending constraints against the minimized prefix,
    /// absorbing them incrementally. Returns `false` and marks the
    /// polyhedron empty when they are jointly unsatisfiable.
    pub(crate) fn process_pending_constraints(&mut self) -> Result<bool> {
        debug_assert!(self.has_pending_constraints());
        debug_assert!(self.can_have_something_pending());
        let mut con_sys = self.con_sys.clone();
        con_sys.sort_pending_and_remove_duplicates();
        if con_sys.num_pending_rows() == 0 {
            self.con_sys = con_sys;
            self.clear_flags(Status::C_PENDING);
            debug_assert!(self.ok());
            return Ok(true);
        }
        let first_pending = con_sys.first_pending_row();
        let mut gen_sys = self.gen_sys.clone();
        let mut sat_c = self.sat_c.clone();
        let num_lines = gen_sys.num_lines();
        conversion::conversion(
            &con_sys,
            first_pending,
            &mut gen_sys,
            &mut sat_c,
            num_lines,
            "Polyhedron::add_constraints",
        )?;
        con_sys.unset_pending_rows();
        if !gen_sys.has_points() {
            self.set_empty();
            return Ok(false);
        }
        let mut sat_g = sat_c.transpose();
        simplify(&mut con_sys, &mut sat_g);
        self.con_sys = con_sys;
        self.gen_sys = gen_sys;
        self.sat_c = sat_g.transpose();
        self.sat_g = sat_g;
        self.set_status(
            Status::C_UP_TO_DATE
                | Status::G_UP_TO_DATE
                | Status::C_MINIMIZED
                | Status::G_MINIMIZED
                | Status::SAT_C_UP_TO_DATE
                | Status::SAT_G_UP_TO_DATE,
        );
        debug_assert!(self.ok());
        Ok(true)
    }

    /// Absorbs the pending generators into the minimized prefix. Adding
    /// generators can only grow the set, so emptiness cannot arise.
    pub(crate) fn process_pending_generators(&mut self) -> Result<()> {
        debug_assert!(self.has_pending_generators());
        debug_assert!(self.can_have_something_pending());
        let mut gen_sys = self.gen_sys.clone();
        gen_sys.sort_pending_and_remove_duplicates();
        if gen_sys.num_pending_rows() == 0 {
            self.gen_sys = gen_sys;
            self.clear_flags(Status::G_PENDING);
            debug_assert!(self.ok());
            return Ok(());
        }
        let first_pending = gen_sys.first_pending_row();
        let mut con_sys = self.con_sys.clone();
        let mut sat_g = self.sat_g.clone();
        let num_equalities = con_sys.num_equalities();
        conversion::conversion(
            &gen_sys,
            first_pending,
            &mut con_sys,
            &mut sat_g,
            num_equalities,
            "Polyhedron::add_generators",
        )?;
        gen_sys.unset_pending_rows();
        let mut sat_c = sat_g.transpose();
        simplify(&mut gen_sys, &mut sat_c);
        self.gen_sys = gen_sys;
        self.con_sys = con_sys;
        self.sat_g = sat_c.transpose();
        self.sat_c = sat_c;
        self.set_status(
            Status::C_UP_TO_DATE
                | Status::G_UP_TO_DATE
                | Status::C_MINIMIZED
                | Status::G_MINIMIZED
                | Status::SAT_C_UP_TO_DATE
                | Status::SAT_G_UP_TO_DATE,
        );
        debug_assert!(self.ok());
        Ok(())
    }

    /// Makes the generators usable: drains pending rows and converts if
    /// needed. Returns `false` when the polyhedron is (or turns out to
    /// be) empty.
    pub(crate) fn obtain_generators(&mut self) -> Result<bool> {
        if self.marked_empty() {
            return Ok(false);
        }
        if self.has_pending_constraints() && !self.process_pending_constraints()? {
            return Ok(false);
        }
        if !self.generators_are_up_to_date() && !self.update_generators()? {
            return Ok(false);
        }
        Ok(true)
    }

    /// Makes the constraints usable: drains pending generators and
    /// converts if needed. On a marked-empty polyhedron this is a no-op.
    pub(crate) fn obtain_constraints(&mut self) -> Result<()> {
        if self.marked_empty() {
            return Ok(());
        }
        if self.has_pending_generators() {
            self.process_pending_generators()?;
        } else if !self.constraints_are_up_to_date() {
            self.update_constraints()?;
        }
        Ok(())
    }

    /// Clears the pending machinery while keeping the generators usable:
    /// pending constraints are processed for real, pending generators are
    /// simply promoted, losing minimality.
    pub(crate) fn remove_pending_to_obtain_generators(&mut self) -> Result<bool> {
        if self.has_pending_constraints() {
            return self.process_pending_constraints();
        }
        debug_assert!(self.has_pending_generators());
        self.gen_sys.unset_pending_rows();
        self.clear_flags(
            Status::G_PENDING
                | Status::G_MINIMIZED
                | Status::C_UP_TO_DATE
                | Status::C_MINIMIZED
                | Status::SAT_C_UP_TO_DATE
                | Status::SAT_G_UP_TO_DATE,
        );
        debug_assert!(self.ok());
        Ok(true)
    }

    /// The dual of [`Polyhedron::remove_pending_to_obtain_generators`].
    pub(crate) fn remove_pending_to_obtain_constraints(&mut self) -> Result<()> {
        if self.has_pending_generators() {
            return self.process_pending_generators();
        }
        debug_assert!(self.has_pending_constraints());
        self.con_sys.unset_pending_rows();
        self.clear_flags(
            Status::C_PENDING
                | Status::C_MINIMIZED
                | Status::G_UP_TO_DATE
                | Status::G_MINIMIZED
                | Status::SAT_C_UP_TO_DATE
                | Status::SAT_G_UP_TO_DATE,
        );
        debug_assert!(self.ok());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{ConstraintSystem, Rel};
    use crate::row::Topology;
    use hedra_num::Variable;

    fn square() -> Polyhedron {
        let a = Variable(0);
        let b = Variable(1);
        let mut cs = ConstraintSystem::new(Topology::Closed);
        cs.insert(a.ge(0));
        cs.insert(a.le(1));
        cs.insert(b.ge(0));
        cs.insert(b.le(1));
        Polyhedron::from_constraints(Topology::Closed, cs).unwrap()
    }

    #[test]
    fn minimize_builds_both_systems() {
        let mut p = square();
        assert!(p.minimize().unwrap());
        assert!(p.constraints_are_minimized());
        assert!(p.generators_are_minimized());
        assert_eq!(p.gen_sys().num_rows(), 4);
        // Four facets; the positivity row is implied and dropped.
        assert_eq!(p.con_sys().num_rows(), 4);
        assert!(p.ok());
    }

    #[test]
    fn unsatisfiable_constraints_collapse_to_empty() {
        let a = Variable(0);
        let mut cs = ConstraintSystem::new(Topology::Closed);
        cs.insert(a.ge(1));
        cs.insert(a.le(0));
        let mut p = Polyhedron::from_constraints(Topology::Closed, cs).unwrap();
        assert!(!p.minimize().unwrap());
        assert!(p.marked_empty());
        assert!(p.ok());
    }

    #[test]
    fn saturation_matches_products_after_minimize() {
        use crate::linear_system::SystemRow;
        use crate::scalar_products::scalar_product;
        use num::Zero;
        let mut p = square();
        p.minimize().unwrap();
        for (i, g) in p.gen_sys().iter().enumerate() {
            for (j, c) in p.con_sys().iter().enumerate() {
                let nonzero = !scalar_product(c.row(), g.row()).is_zero();
                assert_eq!(p.sat_c().get(i, j), nonzero);
                assert_eq!(p.sat_g().get(j, i), nonzero);
            }
        }
    }

    #[test]
    fn nnc_minimization_keeps_a_point() {
        let a = Variable(0);
        let mut cs = ConstraintSystem::new(Topology::Nnc);
        cs.insert(a.gt(0));
        cs.insert(a.lt(1));
        let mut p = Polyhedron::from_constraints(Topology::Nnc, cs).unwrap();
        assert!(p.minimize().unwrap());
        assert!(p.gen_sys().has_points());
        assert!(p.ok());
    }

    #[test]
    fn deadline_failure_leaves_the_polyhedron_untouched() {
        let engine = crate::Engine::new();
        let mut p = square();
        let before = p.con_sys().clone();
        engine.set_deadline(|| true);
        assert!(p.minimize().is_err());
        engine.clear_deadline();
        assert_eq!(p.con_sys().num_rows(), before.num_rows());
        assert!(!p.constraints_are_minimized());
        assert!(p.minimize().unwrap());
    }
}
