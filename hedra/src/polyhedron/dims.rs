//! Space-dimension surgery: embedding, projecting, removing, renaming,
//! expanding and folding dimensions.

use super::status::Status;
use super::Polyhedron;
use crate::constraint::{Constraint, Rel};
use crate::error::{Error, Result};
use crate::generator::Generator;
use crate::linear_system::SystemRow;
use crate::row::{LinearRow, RowKind};
use hedra_num::coefficient::Coefficient;
use hedra_num::{LinearExpr, Variable};
use num::Zero;

impl Polyhedron {
    /// Appends `k` dimensions, each unconstrained.
    pub fn add_space_dimensions_and_embed(&mut self, k: usize) -> Result<()> {
        if k == 0 {
            return Ok(());
        }
        let old_dim = self.space_dimension();
        if self.marked_empty() {
            *self = Polyhedron::empty(self.topology(), old_dim + k);
            return Ok(());
        }
        if old_dim == 0 {
            *self = Polyhedron::universe(self.topology(), k);
            return Ok(());
        }
        let eps = self.topology().extra_columns() - 1;
        if self.constraints_are_up_to_date() {
            let at = self.con_sys.num_columns() - eps;
            self.con_sys.insert_zero_columns(at, k);
        }
        if self.generators_are_up_to_date() {
            let at = self.gen_sys.num_columns() - eps;
            self.gen_sys.insert_zero_columns(at, k);
            // The new dimensions are left free: one line each.
            for d in 0..k {
                let mut row = LinearRow::zero(
                    self.gen_sys.num_columns(),
                    RowKind::LineOrEquality,
                    self.topology(),
                );
                row[old_dim + d + 1] = Coefficient::from(1);
                self.gen_sys.add_row(Generator::from_row(row));
                if self.sat_c_is_up_to_date() {
                    // A line saturates every constraint.
                    self.sat_c.push_row(hedra_util::BitRow::new());
                }
            }
            if self.sat_g_is_up_to_date() {
                self.sat_g.set_num_columns(self.gen_sys.first_pending_row());
            }
        }
        self.space_dim += k;
        debug_assert!(self.ok());
        Ok(())
    }

    /// Appends `k` dimensions, each constrained to zero.
    pub fn add_space_dimensions_and_project(&mut self, k: usize) -> Result<()> {
        if k == 0 {
            return Ok(());
        }
        let old_dim = self.space_dimension();
        if self.marked_empty() {
            *self = Polyhedron::empty(self.topology(), old_dim + k);
            return Ok(());
        }
        if old_dim == 0 {
            let mut p = Polyhedron::universe(self.topology(), k);
            for d in 0..k {
                p.add_constraint(Variable(d).eq(0))?;
            }
            *self = p;
            return Ok(());
        }
        let eps = self.topology().extra_columns() - 1;
        if self.constraints_are_up_to_date() {
            let at = self.con_sys.num_columns() - eps;
            self.con_sys.insert_zero_columns(at, k);
            for d in 0..k {
                let mut row = LinearRow::zero(
                    self.con_sys.num_columns(),
                    RowKind::LineOrEquality,
                    self.topology(),
                );
                row[old_dim + d + 1] = Coefficient::from(1);
                self.con_sys.add_row(Constraint::from_row(row));
                if self.sat_g_is_up_to_date() {
                    // Every generator keeps a zero in the new columns, so
                    // it saturates the new equalities.
                    self.sat_g.push_row(hedra_util::BitRow::new());
                }
            }
            if self.sat_c_is_up_to_date() {
                self.sat_c.set_num_columns(self.con_sys.first_pending_row());
            }
        }
        if self.generators_are_up_to_date() {
            let at = self.gen_sys.num_columns() - eps;
            self.gen_sys.insert_zero_columns(at, k);
        }
        self.space_dim += k;
        debug_assert!(self.ok());
        Ok(())
    }

    /// Existentially quantifies away the given dimensions, removing their
    /// columns; the surviving dimensions slide down, keeping their order.
    pub fn remove_space_dimensions(&mut self, vars: &[Variable]) -> Result<()> {
        if vars.is_empty() {
            return Ok(());
        }
        let max_dim = vars.iter().map(|v| v.space_dimension()).max().unwrap();
        self.check_operand_dimension(max_dim, "Polyhedron::remove_space_dimensions")?;
        let mut to_remove: Vec<usize> = vars.iter().map(|v| v.id()).collect();
        to_remove.sort_unstable();
        to_remove.dedup();
        let new_dim = self.space_dimension() - to_remove.len();
        if self.marked_empty() {
            *self = Polyhedron::empty(self.topology(), new_dim);
            return Ok(());
        }
        if new_dim == 0 {
            *self = if self.is_empty()? {
                Polyhedron::empty(self.topology(), 0)
            } else {
                Polyhedron::universe(self.topology(), 0)
            };
            return Ok(());
        }
        if !self.obtain_generators()? {
            *self = Polyhedron::empty(self.topology(), new_dim);
            return Ok(());
        }
        self.gen_sys.unset_pending_rows();
        for &dim in to_remove.iter().rev() {
            self.gen_sys.remove_column(dim + 1);
        }
        self.drop_degenerate_generator_rows();
        self.space_dim = new_dim;
        self.con_sys = crate::constraint::ConstraintSystem::with_columns(
            self.topology(),
            new_dim + self.topology().extra_columns(),
        );
        self.sat_c.clear();
        self.sat_g.clear();
        self.set_status(Status::G_UP_TO_DATE);
        debug_assert!(self.ok());
        Ok(())
    }

    /// Keeps only the first `new_dim` dimensions.
    pub fn remove_higher_space_dimensions(&mut self, new_dim: usize) -> Result<()> {
        if new_dim > self.space_dimension() {
            return Err(Error::DimensionIncompatible {
                op: "Polyhedron::remove_higher_space_dimensions",
                receiver_dim: self.space_dimension(),
                operand_dim: new_dim,
            });
        }
        if new_dim == self.space_dimension() {
            return Ok(());
        }
        let vars: Vec<Variable> = (new_dim..self.space_dimension()).map(Variable).collect();
        self.remove_space_dimensions(&vars)
    }

    /// Renames and removes dimensions according to a partial injection:
    /// `map[d] = Some(d')` sends dimension `d` to `d'`, `None` removes
    /// it. The targets must be exactly `0..k` for `k` mapped dimensions.
    pub fn map_space_dimensions(&mut self, map: &[Option<usize>]) -> Result<()> {
        const OP: &str = "Polyhedron::map_space_dimensions";
        if map.len() != self.space_dimension() {
            return Err(Error::InvalidMap {
                op: OP,
                reason: "the map must cover every dimension of the polyhedron",
            });
        }
        let mut targets: Vec<usize> = map.iter().filter_map(|&t| t).collect();
        let new_dim = targets.len();
        targets.sort_unstable();
        targets.dedup();
        if targets.len() != new_dim || targets.iter().enumerate().any(|(i, &t)| i != t) {
            return Err(Error::InvalidMap {
                op: OP,
                reason: "the targets of a dimension map must be exactly 0..k",
            });
        }
        let removed: Vec<Variable> = map
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_none())
            .map(|(d, _)| Variable(d))
            .collect();
        // Record where each survivor lands before the removal shifts them.
        let survivors: Vec<usize> = map.iter().filter_map(|&t| t).collect();
        self.remove_space_dimensions(&removed)?;
        if self.marked_empty() || self.space_dimension() == 0 {
            return Ok(());
        }
        // survivors[i] is the target of the dimension now at index i.
        debug_assert!(self.generators_are_up_to_date());
        let mut permuted: Vec<Option<usize>> = vec![None; new_dim];
        for (i, &t) in survivors.iter().enumerate() {
            permuted[t] = Some(i);
        }
        // Rebuild each generator row with its columns in target order.
        for i in 0..self.gen_sys.num_rows() {
            let row = self.gen_sys.row_mut(i).row_mut();
            let old = row.as_slice().to_vec();
            for (t, &src) in permuted.iter().enumerate() {
                let src = src.expect("a bijection on the survivors");
                row[t + 1] = old[src + 1].clone();
            }
        }
        self.gen_sys.set_sorted(false);
        debug_assert!(self.ok());
        Ok(())
    }

    /// Appends `m` copies of dimension `v`: every constraint on `v` is
    /// replicated on each copy.
    pub fn expand_space_dimension(&mut self, v: Variable, m: usize) -> Result<()> {
        self.check_operand_dimension(v.space_dimension(), "Polyhedron::expand_space_dimension")?;
        if m == 0 {
            return Ok(());
        }
        let old_dim = self.space_dimension();
        let snapshot = match self.constraints_view()? {
            Some(cs) => cs,
            None => {
                *self = Polyhedron::empty(self.topology(), old_dim + m);
                return Ok(());
            }
        };
        self.add_space_dimensions_and_embed(m)?;
        for c in snapshot.iter() {
            let v_coeff = c.coefficient(v);
            if v_coeff.is_zero() {
                continue;
            }
            for copy in 0..m {
                let mut e = c.to_expr();
                e.set_coefficient(v, Coefficient::zero());
                e.set_coefficient(Variable(old_dim + copy), v_coeff.clone());
                let refined = match c.kind() {
                    crate::constraint::ConstraintKind::Equality => e.eq(0),
                    crate::constraint::ConstraintKind::NonstrictInequality => e.ge(0),
                    crate::constraint::ConstraintKind::StrictInequality => e.gt(0),
                };
                self.refine_no_check(refined)?;
            }
        }
        debug_assert!(self.ok());
        Ok(())
    }

    /// Folds the dimensions in `vars` into `dest`: the result, living in
    /// the smaller space, joins the projections onto each folded
    /// dimension.
    pub fn fold_space_dimensions(&mut self, vars: &[Variable], dest: Variable) -> Result<()> {
        const OP: &str = "Polyhedron::fold_space_dimensions";
        if vars.is_empty() {
            return Ok(());
        }
        if vars.contains(&dest) {
            return Err(Error::InvalidArgument {
                op: OP,
                reason: "the destination cannot be one of the folded dimensions",
            });
        }
        let max_dim = vars
            .iter()
            .chain(std::iter::once(&dest))
            .map(|v| v.space_dimension())
            .max()
            .unwrap();
        self.check_operand_dimension(max_dim, OP)?;
        let mut result = self.clone();
        result.remove_space_dimensions(vars)?;
        for &w in vars {
            let mut copy = self.clone();
            copy.swap_dimensions(w, dest)?;
            copy.remove_space_dimensions(vars)?;
            result.poly_hull_assign(&copy)?;
        }
        *self = result;
        debug_assert!(self.ok());
        Ok(())
    }

    /// Exchanges two dimensions in whichever representations are up to
    /// date; the saturation information is unaffected.
    pub(crate) fn swap_dimensions(&mut self, i: Variable, j: Variable) -> Result<()> {
        if i == j || self.marked_empty() {
            return Ok(());
        }
        debug_assert!(i.id() < self.space_dimension() && j.id() < self.space_dimension());
        if self.constraints_are_up_to_date() {
            self.con_sys.swap_columns(i.id() + 1, j.id() + 1);
        }
        if self.generators_are_up_to_date() {
            self.gen_sys.swap_columns(i.id() + 1, j.id() + 1);
        }
        Ok(())
    }

    /// Rays and lines can lose their direction when their only nonzero
    /// columns are removed; such rows are dropped.
    fn drop_degenerate_generator_rows(&mut self) {
        let mut i = self.gen_sys.num_rows();
        while i > 0 {
            i -= 1;
            let g = self.gen_sys.row(i);
            if g.row().is_zero()
                || (g.is_line_or_ray() && g.all_homogeneous_terms_are_zero())
            {
                self.gen_sys.remove_row(i);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::Topology;

    fn square() -> Polyhedron {
        let a = Variable(0);
        let b = Variable(1);
        let mut p = Polyhedron::universe(Topology::Closed, 2);
        p.add_constraint(a.ge(0)).unwrap();
        p.add_constraint(a.le(1)).unwrap();
        p.add_constraint(b.ge(0)).unwrap();
        p.add_constraint(b.le(1)).unwrap();
        p
    }

    #[test]
    fn embed_leaves_new_dimensions_free() {
        let mut p = square();
        p.add_space_dimensions_and_embed(1).unwrap();
        assert_eq!(p.space_dimension(), 3);
        assert!(!p.constrains(Variable(2)).unwrap());
        assert!(!p.is_bounded().unwrap());
    }

    #[test]
    fn project_pins_new_dimensions_to_zero() {
        let mut p = square();
        p.add_space_dimensions_and_project(1).unwrap();
        assert_eq!(p.space_dimension(), 3);
        let c = Variable(2);
        let r = p.relation_with(&c.eq(0)).unwrap();
        assert!(r.implies(crate::PolyConRelation::SATURATES));
        assert!(p.is_bounded().unwrap());
    }

    #[test]
    fn removing_a_dimension_projects() {
        let a = Variable(0);
        let mut p = square();
        p.add_constraint(a.le(Variable(1) - 1)).unwrap();
        // Now 0 <= a <= b - 1 <= 0, so a = 0, b = 1.
        p.remove_space_dimensions(&[a]).unwrap();
        assert_eq!(p.space_dimension(), 1);
        let mut expected = Polyhedron::universe(Topology::Closed, 1);
        expected.add_constraint(Variable(0).eq(1)).unwrap();
        assert_eq!(p, expected);
    }

    #[test]
    fn removing_all_dimensions_gives_the_point_universe() {
        let mut p = square();
        p.remove_higher_space_dimensions(0).unwrap();
        assert_eq!(p.space_dimension(), 0);
        assert!(!p.is_empty().unwrap());
        let mut e = Polyhedron::empty(Topology::Closed, 2);
        e.remove_higher_space_dimensions(0).unwrap();
        assert!(e.is_empty().unwrap());
    }

    #[test]
    fn unbounded_directions_survive_projection() {
        let a = Variable(0);
        let b = Variable(1);
        let mut p = Polyhedron::universe(Topology::Closed, 2);
        p.add_constraint(a.ge(0)).unwrap();
        p.add_constraint(b.ge(0)).unwrap();
        p.remove_space_dimensions(&[b]).unwrap();
        let mut expected = Polyhedron::universe(Topology::Closed, 1);
        expected.add_constraint(Variable(0).ge(0)).unwrap();
        assert_eq!(p, expected);
    }

    #[test]
    fn mapping_swaps_and_drops() {
        let a = Variable(0);
        let b = Variable(1);
        let c = Variable(2);
        let mut p = Polyhedron::universe(Topology::Closed, 3);
        p.add_constraint(a.ge(1)).unwrap();
        p.add_constraint(b.ge(2)).unwrap();
        p.add_constraint(c.ge(3)).unwrap();
        // Drop b, swap a and c.
        p.map_space_dimensions(&[Some(1), None, Some(0)]).unwrap();
        let mut expected = Polyhedron::universe(Topology::Closed, 2);
        expected.add_constraint(Variable(0).ge(3)).unwrap();
        expected.add_constraint(Variable(1).ge(1)).unwrap();
        assert_eq!(p, expected);
        assert!(matches!(
            p.map_space_dimensions(&[Some(0), Some(0)]),
            Err(Error::InvalidMap { .. })
        ));
    }

    #[test]
    fn expansion_copies_the_constraints_on_a_dimension() {
        let a = Variable(0);
        let b = Variable(1);
        let mut p = square();
        p.expand_space_dimension(a, 1).unwrap();
        let c = Variable(2);
        let mut expected = Polyhedron::universe(Topology::Closed, 3);
        expected.add_constraint(a.ge(0)).unwrap();
        expected.add_constraint(a.le(1)).unwrap();
        expected.add_constraint(b.ge(0)).unwrap();
        expected.add_constraint(b.le(1)).unwrap();
        expected.add_constraint(c.ge(0)).unwrap();
        expected.add_constraint(c.le(1)).unwrap();
        assert_eq!(p, expected);
    }

    #[test]
    fn folding_joins_projections() {
        let a = Variable(0);
        let b = Variable(1);
        let c = Variable(2);
        let d = Variable(3);
        let mut p = Polyhedron::universe(Topology::Closed, 4);
        p.add_constraint(a.ge(2)).unwrap();
        p.add_constraint(b.ge(1)).unwrap();
        p.add_constraint(c.ge(0)).unwrap();
        p.add_constraint(d.eq(0)).unwrap();
        p.fold_space_dimensions(&[a], b).unwrap();
        // The folded dimension joins the ranges of a and b; c and d slide
        // down.
        let mut expected = Polyhedron::universe(Topology::Closed, 3);
        expected.add_constraint(Variable(0).ge(1)).unwrap();
        expected.add_constraint(Variable(1).ge(0)).unwrap();
        expected.add_constraint(Variable(2).eq(0)).unwrap();
        assert_eq!(p, expected);
    }

    #[test]
    fn folding_with_an_equality_keeps_the_tighter_bound() {
        let a = Variable(0);
        let b = Variable(1);
        let mut p = Polyhedron::universe(Topology::Closed, 2);
        p.add_constraint(a.ge(2)).unwrap();
        p.add_constraint(b.ge(1)).unwrap();
        p.add_constraint(a.eq(b)).unwrap();
        p.fold_space_dimensions(&[a], b).unwrap();
        // With a = b the two projections coincide at [2, oo).
        let mut expected = Polyhedron::universe(Topology::Closed, 1);
        expected.add_constraint(Variable(0).ge(2)).unwrap();
        assert_eq!(p, expected);
    }
}
