//! Predicates, relation probes and representation accessors.

use super::status::Status;
use super::Polyhedron;
use crate::congruence::Congruence;
use crate::constraint::{Constraint, ConstraintSystem, Rel};
use crate::error::Result;
use crate::generator::GeneratorSystem;
use crate::linear_system::SystemRow;
use crate::mip::{MipProblem, MipStatus};
use crate::relation::{PolyConRelation, PolyGenRelation};
use crate::row::Topology;
use hedra_num::coefficient::{div_ceil, div_floor, divides, gcd_of, Coefficient};
use hedra_num::{LinearExpr, Variable};
use num::{One, Zero};
use std::fmt;

impl Polyhedron {
    /// Whether the polyhedron contains no point.
    pub fn is_empty(&self) -> Result<bool> {
        if self.marked_empty() {
            return Ok(true);
        }
        if self.space_dimension() == 0 {
            return Ok(false);
        }
        Ok(self.generators_view()?.is_none())
    }

    /// Whether the polyhedron is the whole space.
    pub fn is_universe(&self) -> Result<bool> {
        if self.marked_empty() {
            return Ok(false);
        }
        if self.space_dimension() == 0 {
            return Ok(true);
        }
        if self.constraints_are_up_to_date() && !self.has_pending_generators() {
            // Tautologies only: certainly the universe.
            if self.con_sys().iter().all(Constraint::is_tautological) {
                return Ok(true);
            }
        }
        let Some(minimized) = self.minimized_view()? else {
            return Ok(false);
        };
        // In minimal form the universe is cut by nothing: every remaining
        // row involves only the positivity or epsilon columns.
        let result = minimized
            .con_sys()
            .iter()
            .all(|c| c.row().all_homogeneous_terms_are_zero());
        Ok(result)
    }

    /// Whether the polyhedron contains no ray or line.
    pub fn is_bounded(&self) -> Result<bool> {
        if self.marked_empty() || self.space_dimension() == 0 {
            return Ok(true);
        }
        match self.generators_view()? {
            None => Ok(true),
            Some(gs) => Ok(!gs.iter().any(|g| g.is_line_or_ray())),
        }
    }

    /// Whether every closure point is matched by a point, i.e. whether the
    /// set equals its topological closure. Closed polyhedra are trivially
    /// closed.
    pub fn is_topologically_closed(&self) -> Result<bool> {
        if self.is_necessarily_closed() {
            return Ok(true);
        }
        if self.marked_empty() || self.space_dimension() == 0 {
            return Ok(true);
        }
        let Some(minimized) = self.minimized_view()? else {
            return Ok(true);
        };
        let gs = minimized.gen_sys();
        for cp in gs.iter() {
            if cp.is_closure_point() && !gs.iter().any(|p| cp.is_matching_closure_point(p)) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// The dimension of the affine hull: the space dimension minus the
    /// number of irredundant equalities; zero for the empty polyhedron.
    pub fn affine_dimension(&self) -> Result<usize> {
        let Some(minimized) = self.minimized_view()? else {
            return Ok(0);
        };
        Ok(minimized.space_dimension() - minimized.con_sys().num_equalities())
    }

    /// Whether `v` is constrained: whether some irredundant constraint
    /// mentions it. The empty polyhedron constrains every variable.
    pub fn constrains(&self, v: Variable) -> Result<bool> {
        self.check_operand_dimension(v.space_dimension(), "Polyhedron::constrains")?;
        let Some(minimized) = self.minimized_view()? else {
            return Ok(true);
        };
        let result = minimized
            .con_sys()
            .iter()
            .any(|c| !c.coefficient(v).is_zero());
        Ok(result)
    }

    /// Whether the polyhedron contains a point with all-integer
    /// coordinates, decided by tightening each constraint to integer
    /// bounds and running the exact simplex.
    pub fn contains_integer_point(&self) -> Result<bool> {
        if self.marked_empty() {
            return Ok(false);
        }
        if self.space_dimension() == 0 {
            return Ok(true);
        }
        let Some(minimized) = self.minimized_view()? else {
            return Ok(false);
        };
        for g in minimized.gen_sys().iter() {
            if g.is_point() && g.divisor().is_one() {
                return Ok(true);
            }
        }
        let space_dim = self.space_dimension();
        let mut mip = MipProblem::new(space_dim);
        for c in minimized.con_sys().iter() {
            if c.row().all_homogeneous_terms_are_zero() {
                if c.is_inconsistent() {
                    return Ok(false);
                }
                // Tautologies and the epsilon bounds say nothing about the
                // space coordinates.
                continue;
            }
            let homogeneous: Vec<Coefficient> =
                (0..space_dim).map(|i| c.coefficient(Variable(i))).collect();
            let g = gcd_of(&homogeneous);
            debug_assert!(!g.is_zero());
            let b = c.inhomogeneous_term().clone();
            // s = sum (a_i/g) x_i is an integer on integer points.
            let mut scaled = LinearExpr::new();
            for (i, a) in homogeneous.iter().enumerate() {
                scaled.add_mul_assign(&(a / &g), Variable(i));
            }
            match c.kind() {
                crate::constraint::ConstraintKind::Equality => {
                    if !divides(&g, &b) {
                        return Ok(false);
                    }
                    let rhs = -&b / &g;
                    mip.add_constraint(scaled.eq(rhs))?;
                }
                crate::constraint::ConstraintKind::NonstrictInequality => {
                    // g*s + b >= 0 tightens to s >= ceil(-b/g).
                    let rhs = div_ceil(&-&b, &g);
                    mip.add_constraint(scaled.ge(rhs))?;
                }
                crate::constraint::ConstraintKind::StrictInequality => {
                    // g*s + b > 0 tightens to s >= floor(-b/g) + 1.
                    let rhs = div_floor(&-&b, &g) + Coefficient::one();
                    mip.add_constraint(scaled.ge(rhs))?;
                }
            }
        }
        for i in 0..space_dim {
            mip.add_integer_dimension(Variable(i))?;
        }
        Ok(mip.solve()? == MipStatus::Satisfiable)
    }

    /// Whether `self` includes `y`.
    pub fn contains(&self, y: &Polyhedron) -> Result<bool> {
        self.check_topologies(y, "Polyhedron::contains")?;
        self.check_same_dimension(y, "Polyhedron::contains")?;
        let Some(y_gens) = y.generators_view()? else {
            return Ok(true);
        };
        if self.marked_empty() {
            return Ok(false);
        }
        if self.space_dimension() == 0 {
            return Ok(true);
        }
        let Some(x_cons) = self.constraints_view()? else {
            return Ok(false);
        };
        let result = y_gens.iter().all(|g| x_cons.satisfies_all_constraints(g));
        Ok(result)
    }

    /// Whether `self` includes `y` and differs from it.
    pub fn strictly_contains(&self, y: &Polyhedron) -> Result<bool> {
        Ok(self.contains(y)? && !y.contains(self)?)
    }

    /// Whether `self` is included in `y`.
    pub fn is_included_in(&self, y: &Polyhedron) -> Result<bool> {
        y.contains(self)
    }

    /// Whether the two polyhedra share no point.
    pub fn is_disjoint_from(&self, y: &Polyhedron) -> Result<bool> {
        self.check_topologies(y, "Polyhedron::is_disjoint_from")?;
        self.check_same_dimension(y, "Polyhedron::is_disjoint_from")?;
        let mut z = self.clone();
        z.intersection_assign(y)?;
        z.is_empty()
    }

    /// The relation between the polyhedron and the set `c` defines.
    pub fn relation_with(&self, c: &Constraint) -> Result<PolyConRelation> {
        self.check_operand_dimension(c.space_dimension(), "Polyhedron::relation_with")?;
        if self.marked_empty() {
            return Ok(PolyConRelation::SATURATES
                | PolyConRelation::IS_INCLUDED
                | PolyConRelation::IS_DISJOINT);
        }
        if self.space_dimension() == 0 {
            return Ok(Self::zero_dim_relation_with(c));
        }
        match self.generators_view()? {
            None => Ok(PolyConRelation::SATURATES
                | PolyConRelation::IS_INCLUDED
                | PolyConRelation::IS_DISJOINT),
            Some(gs) => Ok(gs.relation_with(c)),
        }
    }

    fn zero_dim_relation_with(c: &Constraint) -> PolyConRelation {
        if c.is_inconsistent() {
            if c.is_strict_inequality() && c.inhomogeneous_term().is_zero() {
                // 0 > 0 implicitly defines the hyperplane 0 = 0, which the
                // zero-dimensional point saturates.
                PolyConRelation::SATURATES | PolyConRelation::IS_DISJOINT
            } else {
                PolyConRelation::IS_DISJOINT
            }
        } else if c.is_equality() || c.inhomogeneous_term().is_zero() {
            PolyConRelation::SATURATES | PolyConRelation::IS_INCLUDED
        } else {
            PolyConRelation::IS_INCLUDED
        }
    }

    /// The relation between the polyhedron and a single generator:
    /// whether adding it would change anything.
    pub fn relation_with_generator(
        &self,
        g: &crate::generator::Generator,
    ) -> Result<PolyGenRelation> {
        self.check_operand_dimension(g.space_dimension(), "Polyhedron::relation_with_generator")?;
        if self.marked_empty() {
            return Ok(PolyGenRelation::nothing());
        }
        if self.space_dimension() == 0 {
            return Ok(PolyGenRelation::subsumes());
        }
        let Some(cs) = self.constraints_view()? else {
            return Ok(PolyGenRelation::nothing());
        };
        Ok(if cs.satisfies_all_constraints(g) {
            PolyGenRelation::subsumes()
        } else {
            PolyGenRelation::nothing()
        })
    }

    /// The relation between the polyhedron and the points satisfying a
    /// congruence: an equality behaves as the constraint it is, a proper
    /// congruence is reduced to its two supporting hyperplanes nearest to
    /// a sample point of the polyhedron.
    pub fn relation_with_congruence(&self, cg: &Congruence) -> Result<PolyConRelation> {
        self.check_operand_dimension(
            cg.space_dimension(),
            "Polyhedron::relation_with_congruence",
        )?;
        if cg.is_equality() {
            return self.relation_with(&cg.to_expr().eq(0));
        }
        if self.marked_empty() {
            return Ok(PolyConRelation::SATURATES
                | PolyConRelation::IS_INCLUDED
                | PolyConRelation::IS_DISJOINT);
        }
        if self.space_dimension() == 0 {
            return Ok(if cg.is_inconsistent() {
                PolyConRelation::IS_DISJOINT
            } else {
                PolyConRelation::SATURATES | PolyConRelation::IS_INCLUDED
            });
        }
        let Some(gs) = self.generators_view()? else {
            return Ok(PolyConRelation::SATURATES
                | PolyConRelation::IS_INCLUDED
                | PolyConRelation::IS_DISJOINT);
        };
        // Evaluate the congruence expression at a sample point.
        let expr = cg.to_expr();
        let point = gs
            .iter()
            .find(|g| g.is_point())
            .expect("a non-empty generator system has a point");
        let divisor = point.divisor().clone();
        let mut value = expr.inhomogeneous_term() * &divisor;
        for i in 0..self.space_dimension() {
            value += expr.coefficient(Variable(i)) * point.coefficient(Variable(i));
        }
        let modulus = cg.modulus();
        let step = modulus * &divisor;
        let k = div_floor(&value, &step);
        if value == &k * &step {
            // The sample point lies on a hyperplane of the congruence.
            let shift = &k * modulus;
            return self.relation_with(&(expr - shift).eq(0));
        }
        // Strictly between e = k*m and e = (k+1)*m.
        let lower = expr.clone() - &k * modulus;
        let relation = self.relation_with(&lower.ge(0))?;
        if relation.implies(PolyConRelation::STRICTLY_INTERSECTS) {
            return Ok(PolyConRelation::STRICTLY_INTERSECTS);
        }
        debug_assert!(relation.implies(PolyConRelation::IS_INCLUDED));
        let upper = expr - (&k + Coefficient::one()) * modulus;
        let relation = self.relation_with(&upper.le(0))?;
        if relation.implies(PolyConRelation::STRICTLY_INTERSECTS) {
            return Ok(PolyConRelation::STRICTLY_INTERSECTS);
        }
        debug_assert!(relation.implies(PolyConRelation::IS_INCLUDED));
        Ok(PolyConRelation::IS_DISJOINT)
    }

    /// The constraint system describing the polyhedron. For a marked
    /// empty polyhedron this is the single unsatisfiable constraint of
    /// the right dimension.
    pub fn constraints(&mut self) -> Result<&ConstraintSystem> {
        if self.marked_empty() {
            if self.con_sys.has_no_rows() {
                let columns = self.space_dimension() + self.topology().extra_columns();
                let mut cs = ConstraintSystem::with_columns(self.topology(), columns);
                cs.insert(Constraint::false_constraint(
                    self.topology(),
                    self.space_dimension(),
                ));
                self.con_sys = cs;
            }
            return Ok(&self.con_sys);
        }
        if self.space_dimension() == 0 {
            return Ok(&self.con_sys);
        }
        self.obtain_constraints()?;
        Ok(&self.con_sys)
    }

    /// The constraint system in minimal form; strict inequalities of NNC
    /// polyhedra are additionally strong-minimized.
    pub fn minimized_constraints(&mut self) -> Result<&ConstraintSystem> {
        if self.is_necessarily_closed() {
            self.minimize()?;
        } else {
            self.strongly_minimize_constraints()?;
        }
        self.constraints()
    }

    /// The generator system describing the polyhedron; empty of rows for
    /// an empty polyhedron.
    pub fn generators(&mut self) -> Result<&GeneratorSystem> {
        if self.marked_empty() || self.space_dimension() == 0 {
            return Ok(&self.gen_sys);
        }
        self.obtain_generators()?;
        Ok(&self.gen_sys)
    }

    /// The generator system in minimal form.
    pub fn minimized_generators(&mut self) -> Result<&GeneratorSystem> {
        self.minimize()?;
        self.generators()
    }

    /// Weakens every strict inequality whose strictness adds nothing.
    ///
    /// This is the executable specification of strong minimization: each
    /// candidate relaxation is adopted exactly when it describes the same
    /// set. The result is not tracked in the status word; callers that
    /// need it run it again.
    pub(crate) fn strongly_minimize_constraints(&mut self) -> Result<()> {
        if self.is_necessarily_closed() || self.marked_empty() || self.space_dimension() == 0 {
            self.minimize()?;
            return Ok(());
        }
        if !self.minimize()? {
            return Ok(());
        }
        loop {
            let mut changed = false;
            for i in 0..self.con_sys.num_rows() {
                let c = self.con_sys.row(i);
                if !c.is_strict_inequality() || c.row().all_homogeneous_terms_are_zero() {
                    continue;
                }
                let mut candidate = self.clone();
                {
                    let row =
                        crate::linear_system::SystemRow::row_mut(candidate.con_sys.row_mut(i));
                    let eps = row.eps_index();
                    row[eps] = Coefficient::zero();
                    row.strong_normalize();
                }
                candidate.clear_flags(
                    Status::C_MINIMIZED
                        | Status::G_UP_TO_DATE
                        | Status::G_MINIMIZED
                        | Status::SAT_C_UP_TO_DATE
                        | Status::SAT_G_UP_TO_DATE,
                );
                if !candidate.minimize()? {
                    continue;
                }
                if candidate.contains(self)? && self.contains(&candidate)? {
                    *self = candidate;
                    changed = true;
                    break;
                }
            }
            if !changed {
                return Ok(());
            }
        }
    }
}

impl PartialEq for Polyhedron {
    /// Set equality; dimension- or topology-mismatched operands simply
    /// compare unequal. A firing deadline makes the comparison answer
    /// `false`.
    fn eq(&self, other: &Self) -> bool {
        if self.topology() != other.topology()
            || self.space_dimension() != other.space_dimension()
        {
            return false;
        }
        self.contains(other).unwrap_or(false) && other.contains(self).unwrap_or(false)
    }
}

impl Eq for Polyhedron {}

impl fmt::Display for Polyhedron {
    /// `false` for the empty polyhedron, `true` for the universe,
    /// otherwise the minimized constraints.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.minimized_view().map_err(|_| fmt::Error)? {
            None => write!(f, "false"),
            Some(minimized) => write!(f, "{}", minimized.con_sys()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::Generator;

    fn strip() -> Polyhedron {
        // 1 <= 3A - 3B <= 2: a rational strip with no integer point.
        let a = Variable(0);
        let b = Variable(1);
        let mut p = Polyhedron::universe(Topology::Closed, 2);
        p.add_constraint((3 * a - 3 * b).ge(1)).unwrap();
        p.add_constraint((3 * a - 3 * b).le(2)).unwrap();
        p
    }

    #[test]
    fn emptiness_and_universality() {
        let p = Polyhedron::universe(Topology::Closed, 2);
        assert!(p.is_universe().unwrap());
        assert!(!p.is_empty().unwrap());
        let e = Polyhedron::empty(Topology::Closed, 2);
        assert!(e.is_empty().unwrap());
        assert!(!e.is_universe().unwrap());
        let mut q = Polyhedron::universe(Topology::Closed, 2);
        q.add_constraint(Variable(0).ge(0)).unwrap();
        assert!(!q.is_universe().unwrap());
        assert!(!q.is_bounded().unwrap());
    }

    #[test]
    fn reflexivity_and_equality() {
        let p = strip();
        assert!(p.contains(&p).unwrap());
        assert_eq!(p, p.clone());
        let q = Polyhedron::universe(Topology::Closed, 2);
        assert!(q.strictly_contains(&p).unwrap());
        assert_ne!(p, q);
        // Mismatched dimensions are unequal, not an error.
        assert_ne!(p, Polyhedron::universe(Topology::Closed, 3));
    }

    #[test]
    fn affine_dimension_counts_equalities() {
        let a = Variable(0);
        let b = Variable(1);
        let mut p = Polyhedron::universe(Topology::Closed, 3);
        p.add_constraint(a.eq(b)).unwrap();
        assert_eq!(p.affine_dimension().unwrap(), 2);
        p.add_constraint(a.eq(7)).unwrap();
        assert_eq!(p.affine_dimension().unwrap(), 1);
        assert!(p.constrains(a).unwrap());
        assert!(!p.constrains(Variable(2)).unwrap());
    }

    #[test]
    fn integer_point_in_a_degenerate_strip() {
        assert!(!strip().contains_integer_point().unwrap());
        let mut p = Polyhedron::universe(Topology::Closed, 2);
        p.add_constraint((2 * Variable(0)).eq(1)).unwrap();
        assert!(!p.contains_integer_point().unwrap());
        let wide = Polyhedron::universe(Topology::Closed, 2);
        assert!(wide.contains_integer_point().unwrap());
    }

    #[test]
    fn integer_point_via_simplex_on_a_shifted_box() {
        let a = Variable(0);
        let b = Variable(1);
        let mut p = Polyhedron::universe(Topology::Closed, 2);
        p.add_constraint((2 * a).ge(1)).unwrap();
        p.add_constraint((2 * a).le(5)).unwrap();
        p.add_constraint((3 * b).ge(2)).unwrap();
        p.add_constraint((3 * b).le(7)).unwrap();
        assert!(p.contains_integer_point().unwrap());
    }

    #[test]
    fn relation_probes() {
        let a = Variable(0);
        let p = strip();
        let r = p.relation_with(&(3 * a - 3 * Variable(1)).ge(1)).unwrap();
        assert!(r.implies(PolyConRelation::IS_INCLUDED));
        let r = p.relation_with(&a.ge(100)).unwrap();
        assert!(r.implies(PolyConRelation::STRICTLY_INTERSECTS));
        let origin = Generator::point(LinearExpr::new(), 1);
        assert!(!p
            .relation_with_generator(&origin)
            .unwrap()
            .implies(PolyGenRelation::SUBSUMES));
    }

    #[test]
    fn relation_with_congruences() {
        let a = Variable(0);
        let b = Variable(1);
        let mut p = Polyhedron::universe(Topology::Closed, 2);
        p.add_constraint(a.ge(1)).unwrap();
        p.add_constraint(a.le(1)).unwrap();
        p.add_constraint(b.ge(0)).unwrap();
        // A = 1 within A = 1 (mod 2): included.
        let r = p.relation_with_congruence(&a.congruent(1, 2)).unwrap();
        assert!(r.implies(PolyConRelation::IS_INCLUDED));
        // A = 1 against A = 0 (mod 2): disjoint.
        let r = p.relation_with_congruence(&a.congruent(0, 2)).unwrap();
        assert!(r.implies(PolyConRelation::IS_DISJOINT));
        // B >= 0 crosses B = 0 (mod 5).
        let r = p.relation_with_congruence(&b.congruent(0, 5)).unwrap();
        assert!(r.implies(PolyConRelation::STRICTLY_INTERSECTS));
    }

    #[test]
    fn display_forms() {
        let a = Variable(0);
        assert_eq!(Polyhedron::universe(Topology::Closed, 2).to_string(), "true");
        assert_eq!(Polyhedron::empty(Topology::Closed, 2).to_string(), "false");
        let mut p = Polyhedron::universe(Topology::Closed, 1);
        p.add_constraint(a.ge(0)).unwrap();
        assert_eq!(p.to_string(), "A >= 0");
    }
}
