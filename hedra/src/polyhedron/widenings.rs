//! Widening and extrapolation operators.
//!
//! Both widenings assume the argument is included in the receiver (the
//! argument is the previous, smaller iterate). The H79 widening keeps the
//! argument's constraints that the receiver satisfies, plus receiver
//! constraints exchangeable with them; BHRZ03 tries cheaper enlargements
//! first and only falls back to H79 when no candidate passes its
//! termination certificate.

use super::Polyhedron;
use crate::constraint::{Constraint, ConstraintSystem};
use crate::error::Result;
use crate::generator::{Generator, GeneratorSystem};
use crate::linear_system::SystemRow;
use crate::relation::PolyConRelation;
use crate::scalar_products;
use hedra_num::coefficient::{sgn, Coefficient};
use hedra_util::BitRow;
use num::Zero;

/// The termination certificate of the H79 widening: a lexicographic
/// measure that strictly improves on every non-stabilizing step.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct H79Certificate {
    affine_dim: usize,
    num_constraints: usize,
}

impl H79Certificate {
    pub fn new(p: &Polyhedron) -> Result<Self> {
        Ok(match p.minimized_view()? {
            None => Self {
                affine_dim: 0,
                num_constraints: usize::MAX,
            },
            Some(m) => Self {
                affine_dim: m.space_dimension() - m.con_sys().num_equalities(),
                num_constraints: m.con_sys().num_rows(),
            },
        })
    }

    /// Whether `candidate` strictly improves over the measured iterate.
    pub fn is_stabilizing(&self, candidate: &Polyhedron) -> Result<bool> {
        let c = Self::new(candidate)?;
        Ok(c.affine_dim > self.affine_dim
            || (c.affine_dim == self.affine_dim && c.num_constraints < self.num_constraints))
    }
}

/// The BHRZ03 termination certificate; it refines [`H79Certificate`] with
/// the lineality dimension, the point count and the multiset of zero
/// coordinates across rays, so that each improvement technique has a
/// component it can strictly decrease.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Bhrz03Certificate {
    affine_dim: usize,
    lin_space_dim: usize,
    num_constraints: usize,
    num_points: usize,
    num_rays_null_coord: Vec<usize>,
}

impl Bhrz03Certificate {
    pub fn new(p: &Polyhedron) -> Result<Self> {
        let Some(m) = p.minimized_view()? else {
            return Ok(Self {
                affine_dim: 0,
                lin_space_dim: 0,
                num_constraints: usize::MAX,
                num_points: usize::MAX,
                num_rays_null_coord: Vec::new(),
            });
        };
        let space_dim = m.space_dimension();
        let mut num_points = 0;
        let mut num_rays_null_coord = vec![0; space_dim + 1];
        for g in m.gen_sys().iter() {
            match g.kind() {
                crate::generator::GeneratorKind::Point
                | crate::generator::GeneratorKind::ClosurePoint => num_points += 1,
                crate::generator::GeneratorKind::Ray => {
                    let nulls = (0..space_dim)
                        .filter(|&i| g.coefficient(hedra_num::Variable(i)).is_zero())
                        .count();
                    num_rays_null_coord[nulls] += 1;
                }
                crate::generator::GeneratorKind::Line => {}
            }
        }
        Ok(Self {
            affine_dim: space_dim - m.con_sys().num_equalities(),
            lin_space_dim: m.gen_sys().num_lines(),
            num_constraints: m.con_sys().num_rows(),
            num_points,
            num_rays_null_coord,
        })
    }

    /// Whether `candidate` strictly improves over the measured iterate in
    /// the lexicographic order.
    pub fn is_stabilizing(&self, candidate: &Polyhedron) -> Result<bool> {
        let c = Self::new(candidate)?;
        if c.affine_dim != self.affine_dim {
            return Ok(c.affine_dim > self.affine_dim);
        }
        if c.lin_space_dim != self.lin_space_dim {
            return Ok(c.lin_space_dim > self.lin_space_dim);
        }
        if c.num_constraints != self.num_constraints {
            return Ok(c.num_constraints < self.num_constraints);
        }
        if c.num_points != self.num_points {
            return Ok(c.num_points < self.num_points);
        }
        // Rays with many null coordinates are "more axis-aligned": the
        // evolution techniques push rays toward the axes, so compare the
        // null-coordinate histogram from the high end.
        let mine = &self.num_rays_null_coord;
        let theirs = &c.num_rays_null_coord;
        for i in (0..mine.len().min(theirs.len())).rev() {
            if theirs[i] != mine[i] {
                return Ok(theirs[i] < mine[i]);
            }
        }
        Ok(false)
    }
}

impl Polyhedron {
    /// The H79 widening: `self := self widen y`, with `y` included in
    /// `self`. With `tokens`, the first available token is consumed
    /// instead of widening whenever the result would differ from `self`.
    pub fn h79_widening_assign(
        &mut self,
        y: &Polyhedron,
        mut tokens: Option<&mut u32>,
    ) -> Result<()> {
        self.check_topologies(y, "Polyhedron::h79_widening_assign")?;
        self.check_same_dimension(y, "Polyhedron::h79_widening_assign")?;
        debug_assert!(self.contains(y).unwrap_or(true));
        if self.space_dimension() == 0 || self.marked_empty() || y.marked_empty() {
            return Ok(());
        }
        let Some(y_min) = y.minimized_view()? else {
            return Ok(());
        };
        if !self.minimize()? {
            return Ok(());
        }
        let result = self.h79_result(&y_min)?;
        self.commit_widening(result, &mut tokens)
    }

    /// The BHRZ03 widening: tries the combining-constraints and
    /// evolving-rays techniques before falling back to H79, certifying
    /// each candidate against the previous iterate's certificate.
    pub fn bhrz03_widening_assign(
        &mut self,
        y: &Polyhedron,
        mut tokens: Option<&mut u32>,
    ) -> Result<()> {
        self.check_topologies(y, "Polyhedron::bhrz03_widening_assign")?;
        self.check_same_dimension(y, "Polyhedron::bhrz03_widening_assign")?;
        debug_assert!(self.contains(y).unwrap_or(true));
        if self.space_dimension() == 0 || self.marked_empty() || y.marked_empty() {
            return Ok(());
        }
        let Some(y_min) = y.minimized_view()? else {
            return Ok(());
        };
        if !self.minimize()? {
            return Ok(());
        }
        let h79 = self.h79_result(&y_min)?;
        if h79 == *self {
            // Already stable; nothing to improve.
            *self = h79;
            return Ok(());
        }
        let y_cert = Bhrz03Certificate::new(&y_min)?;
        if let Some(candidate) = self.combining_constraints(&y_min, &y_cert, &h79)? {
            return self.commit_widening(candidate, &mut tokens);
        }
        if let Some(candidate) = self.evolving_rays(&y_min, &y_cert, &h79)? {
            return self.commit_widening(candidate, &mut tokens);
        }
        self.commit_widening(h79, &mut tokens)
    }

    /// The default widening.
    pub fn widening_assign(&mut self, y: &Polyhedron, tokens: Option<&mut u32>) -> Result<()> {
        self.h79_widening_assign(y, tokens)
    }

    /// H79 widening followed by the reintroduction of every constraint of
    /// `cs` that the pre-widening receiver satisfies.
    pub fn limited_h79_extrapolation_assign(
        &mut self,
        y: &Polyhedron,
        cs: &ConstraintSystem,
        tokens: Option<&mut u32>,
    ) -> Result<()> {
        let keep = self.limited_selection(cs, "Polyhedron::limited_h79_extrapolation_assign")?;
        self.h79_widening_assign(y, tokens)?;
        for c in keep {
            self.refine_with_constraint(&c)?;
        }
        Ok(())
    }

    /// BHRZ03 widening followed by the reintroduction of every constraint
    /// of `cs` that the pre-widening receiver satisfies.
    pub fn limited_bhrz03_extrapolation_assign(
        &mut self,
        y: &Polyhedron,
        cs: &ConstraintSystem,
        tokens: Option<&mut u32>,
    ) -> Result<()> {
        let keep = self.limited_selection(cs, "Polyhedron::limited_bhrz03_extrapolation_assign")?;
        self.bhrz03_widening_assign(y, tokens)?;
        for c in keep {
            self.refine_with_constraint(&c)?;
        }
        Ok(())
    }

    fn limited_selection(
        &self,
        cs: &ConstraintSystem,
        op: &'static str,
    ) -> Result<Vec<Constraint>> {
        self.check_operand_dimension(cs.space_dimension(), op)?;
        let mut keep = Vec::new();
        for c in cs.iter() {
            if self.relation_with(c)?.implies(PolyConRelation::IS_INCLUDED) {
                keep.push(c.clone());
            }
        }
        Ok(keep)
    }

    fn commit_widening(
        &mut self,
        result: Polyhedron,
        tokens: &mut Option<&mut u32>,
    ) -> Result<()> {
        if let Some(t) = tokens {
            if **t > 0 && result != *self {
                **t -= 1;
                return Ok(());
            }
        }
        *self = result;
        debug_assert!(self.ok());
        Ok(())
    }

    /// The H79 result proper, with `self` and `y` both minimized.
    fn h79_result(&self, y: &Polyhedron) -> Result<Polyhedron> {
        let mut selected: Vec<Constraint> = Vec::new();
        // Constraints of the previous iterate still satisfied by the new
        // one.
        for c in y.con_sys().iter() {
            if self
                .gen_sys()
                .iter()
                .all(|g| c.is_satisfied_by(g))
            {
                selected.push(c.clone());
            }
        }
        // Constraints of the new iterate exchangeable with a constraint of
        // the old one: same nonempty saturation pattern on the old
        // generators.
        let y_patterns: Vec<BitRow> = y
            .con_sys()
            .iter()
            .map(|c| saturation_pattern(c, y.gen_sys()))
            .collect();
        for c in self.con_sys().iter() {
            if c.row().all_homogeneous_terms_are_zero() {
                continue;
            }
            let pattern = saturation_pattern(c, y.gen_sys());
            if pattern.count_ones() == 0 {
                // No supporting generator of the previous iterate: the
                // constraint is not exchangeable.
                continue;
            }
            if y_patterns.iter().any(|p| *p == pattern)
                && !selected.iter().any(|s| s.row() == c.row())
            {
                selected.push(c.clone());
            }
        }
        let mut result = Polyhedron::universe(self.topology(), self.space_dimension());
        for c in selected {
            result.refine_no_check(c)?;
        }
        log::debug!(
            "h79: kept {} constraints",
            result.con_sys().num_rows()
        );
        Ok(result)
    }

    /// The combining-constraints technique: at every boundary point of
    /// the previous iterate, the inequalities of the new iterate
    /// saturated there are summed into a single combined inequality; the
    /// candidate refines the H79 result with those combinations.
    fn combining_constraints(
        &self,
        y: &Polyhedron,
        y_cert: &Bhrz03Certificate,
        h79: &Polyhedron,
    ) -> Result<Option<Polyhedron>> {
        let mut combos: Vec<Constraint> = Vec::new();
        for g in y.gen_sys().iter() {
            if g.is_line_or_ray() {
                continue;
            }
            let mut combined: Option<crate::row::LinearRow> = None;
            let mut count = 0;
            for c in self.con_sys().iter() {
                if c.is_equality() || c.row().all_homogeneous_terms_are_zero() {
                    continue;
                }
                if scalar_products::topology_adjusted_sign(c.row(), g.row()) == 0 {
                    count += 1;
                    match &mut combined {
                        None => combined = Some(c.row().clone()),
                        Some(row) => {
                            row.linear_combine(&Coefficient::from(1), c.row(), &Coefficient::from(1));
                        }
                    }
                }
            }
            if count >= 2 {
                let mut row = combined.unwrap();
                row.set_is_ray_or_point_or_inequality();
                row.strong_normalize();
                let combo = Constraint::from_row(row);
                if !combo.is_tautological() {
                    combos.push(combo);
                }
            }
        }
        if combos.is_empty() {
            return Ok(None);
        }
        let mut candidate = h79.clone();
        for c in combos {
            candidate.refine_no_check(c)?;
        }
        if candidate == *h79 {
            return Ok(None);
        }
        debug_assert!(candidate.contains(self).unwrap_or(true));
        if y_cert.is_stabilizing(&candidate)? {
            Ok(Some(candidate))
        } else {
            Ok(None)
        }
    }

    /// The evolving-rays technique: each ray of the new iterate evolves
    /// against each ray of the previous one, rotating toward the nearest
    /// axes (the two rotation senses give the two sub-techniques); the
    /// candidate adds the evolved rays and clips to the H79 result.
    fn evolving_rays(
        &self,
        y: &Polyhedron,
        y_cert: &Bhrz03Certificate,
        h79: &Polyhedron,
    ) -> Result<Option<Polyhedron>> {
        let space_dim = self.space_dimension();
        let mut evolved_rays: Vec<Generator> = Vec::new();
        for x_ray in self.gen_sys().iter().filter(|g| g.is_ray()) {
            for y_ray in y.gen_sys().iter().filter(|g| g.is_ray()) {
                if let Some(ray) = evolve_ray(x_ray, y_ray, space_dim) {
                    if !evolved_rays.iter().any(|r| r.row() == ray.row()) {
                        evolved_rays.push(ray);
                    }
                }
            }
        }
        if evolved_rays.is_empty() {
            return Ok(None);
        }
        let mut candidate = self.clone();
        for ray in evolved_rays {
            candidate.add_generator(ray)?;
        }
        candidate.intersection_assign(h79)?;
        if &candidate == h79 || candidate == *self {
            return Ok(None);
        }
        debug_assert!(candidate.contains(self).unwrap_or(true));
        if y_cert.is_stabilizing(&candidate)? {
            Ok(Some(candidate))
        } else {
            Ok(None)
        }
    }
}

/// The saturation pattern of `c` against the rows of `gs`: bit `j` set
/// when generator `j` saturates `c`.
fn saturation_pattern(c: &Constraint, gs: &GeneratorSystem) -> BitRow {
    let mut bits = BitRow::new();
    for (j, g) in gs.iter().enumerate() {
        if scalar_products::topology_adjusted_sign(c.row(), g.row()) == 0 {
            bits.set(j);
        }
    }
    bits
}

/// Evolves `x_ray` with respect to `y_ray`: in every coordinate plane
/// where the ray rotated, the trailing coordinate is pushed to zero.
/// Returns the evolved ray when it differs from `x_ray`.
fn evolve_ray(x_ray: &Generator, y_ray: &Generator, space_dim: usize) -> Option<Generator> {
    let mut to_zero = vec![false; space_dim + 1];
    let mut any = false;
    for h1 in 1..=space_dim {
        for h2 in (h1 + 1)..=space_dim {
            let d = &x_ray.row()[h1] * &y_ray.row()[h2] - &x_ray.row()[h2] * &y_ray.row()[h1];
            match sgn(&d) {
                // Counterclockwise rotation in this plane: relax the
                // second coordinate (type 1).
                1 => {
                    to_zero[h2] = true;
                    any = true;
                }
                // Clockwise rotation: relax the first (type 2).
                -1 => {
                    to_zero[h1] = true;
                    any = true;
                }
                _ => {}
            }
        }
    }
    if !any {
        return None;
    }
    let mut row = x_ray.row().clone();
    for (h, zero) in to_zero.iter().enumerate() {
        if *zero {
            row[h] = Coefficient::zero();
        }
    }
    if row.as_slice()[1..=space_dim].iter().all(Zero::is_zero) {
        return None;
    }
    row.set_is_ray_or_point_or_inequality();
    row.strong_normalize();
    let evolved = Generator::from_row(row);
    if evolved.row() == x_ray.row() {
        None
    } else {
        Some(evolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::Rel;
    use crate::row::Topology;
    use hedra_num::Variable;

    fn segment(k: i64) -> Polyhedron {
        // { 0 <= A <= k, B = 0 }
        let a = Variable(0);
        let b = Variable(1);
        let mut p = Polyhedron::universe(Topology::Closed, 2);
        p.add_constraint(a.ge(0)).unwrap();
        p.add_constraint(a.le(k)).unwrap();
        p.add_constraint(b.eq(0)).unwrap();
        p
    }

    #[test]
    fn h79_stabilizes_a_linear_chain() {
        let a = Variable(0);
        let b = Variable(1);
        let mut w = segment(2);
        w.h79_widening_assign(&segment(1), None).unwrap();
        let mut expected = Polyhedron::universe(Topology::Closed, 2);
        expected.add_constraint(a.ge(0)).unwrap();
        expected.add_constraint(b.eq(0)).unwrap();
        assert_eq!(w, expected);

        // Further steps no longer change anything.
        let mut next = w.clone();
        next.poly_hull_assign(&segment(3)).unwrap();
        next.h79_widening_assign(&w, None).unwrap();
        assert_eq!(next, expected);
    }

    #[test]
    fn widening_contains_the_receiver() {
        let mut w = segment(5);
        let before = w.clone();
        w.h79_widening_assign(&segment(1), None).unwrap();
        assert!(w.contains(&before).unwrap());
        assert!(w.contains(&segment(1)).unwrap());
    }

    #[test]
    fn tokens_delay_the_widening() {
        let mut w = segment(2);
        let mut tokens = 1;
        w.h79_widening_assign(&segment(1), Some(&mut tokens)).unwrap();
        assert_eq!(tokens, 0);
        assert_eq!(w, segment(2));
        w.h79_widening_assign(&segment(1), Some(&mut tokens)).unwrap();
        let a = Variable(0);
        let b = Variable(1);
        let mut expected = Polyhedron::universe(Topology::Closed, 2);
        expected.add_constraint(a.ge(0)).unwrap();
        expected.add_constraint(b.eq(0)).unwrap();
        assert_eq!(w, expected);
    }

    #[test]
    fn bhrz03_is_at_most_h79() {
        let mut bhrz = segment(2);
        bhrz.bhrz03_widening_assign(&segment(1), None).unwrap();
        let mut h79 = segment(2);
        h79.h79_widening_assign(&segment(1), None).unwrap();
        assert!(h79.contains(&bhrz).unwrap());
        assert!(bhrz.contains(&segment(2)).unwrap());
    }

    #[test]
    fn bhrz03_stabilizes_too() {
        let mut w = segment(1);
        for k in 2..8 {
            let mut next = w.clone();
            next.poly_hull_assign(&segment(k)).unwrap();
            next.bhrz03_widening_assign(&w, None).unwrap();
            if next == w {
                return;
            }
            w = next;
        }
        panic!("the ascending chain did not stabilize");
    }

    #[test]
    fn limited_extrapolation_keeps_satisfied_bounds() {
        let a = Variable(0);
        let mut cs = ConstraintSystem::new(Topology::Closed);
        cs.insert(a.le(10));
        cs.insert(a.le(1));
        let mut w = segment(2);
        w.limited_h79_extrapolation_assign(&segment(1), &cs, None)
            .unwrap();
        // A <= 10 holds on the receiver and is reinstated after widening;
        // A <= 1 does not hold and is dropped.
        let b = Variable(1);
        let mut expected = Polyhedron::universe(Topology::Closed, 2);
        expected.add_constraint(a.ge(0)).unwrap();
        expected.add_constraint(a.le(10)).unwrap();
        expected.add_constraint(b.eq(0)).unwrap();
        assert_eq!(w, expected);
    }

    #[test]
    fn certificates_order_the_chain() {
        let cert = Bhrz03Certificate::new(&segment(1)).unwrap();
        // The widened element has fewer constraints.
        let a = Variable(0);
        let b = Variable(1);
        let mut widened = Polyhedron::universe(Topology::Closed, 2);
        widened.add_constraint(a.ge(0)).unwrap();
        widened.add_constraint(b.eq(0)).unwrap();
        assert!(cert.is_stabilizing(&widened).unwrap());
        assert!(!cert.is_stabilizing(&segment(1)).unwrap());

        let h79 = H79Certificate::new(&segment(1)).unwrap();
        assert!(h79.is_stabilizing(&widened).unwrap());
    }
}
