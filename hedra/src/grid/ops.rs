//! Grid operations: minimization, refinement, lattice operations,
//! transfer functions, dimension surgery and probes.

use super::conversion::{congruences_to_generators, generators_to_congruences};
use super::simplify::{echelon_congruences, echelon_generators};
use super::{Grid, GridStatus};
use crate::congruence::{Congruence, CongruenceSystem};
use crate::error::{Error, Result};
use crate::grid_generator::{GridGenerator, GridGeneratorSystem};
use crate::relation::{PolyConRelation, PolyGenRelation};
use hedra_num::coefficient::{self, sgn, Coefficient};
use hedra_num::{LinearExpr, Variable};
use num::{Integer, One, Zero};
use std::fmt;

impl Grid {
    /// Brings both representations to minimal echelon form. Returns
    /// `false` exactly when the grid is empty.
    pub fn minimize(&mut self) -> bool {
        if self.marked_empty() {
            return false;
        }
        if self.space_dimension() == 0 {
            return true;
        }
        if self.congruences_are_minimized() && self.generators_are_minimized() {
            return true;
        }
        if self.congruences_are_up_to_date() {
            let Some(ech) = echelon_congruences(self.con_sys(), self.space_dimension()) else {
                self.set_empty();
                return false;
            };
            let gens = congruences_to_generators(&ech);
            self.set_con_sys(ech.to_congruence_system());
            self.set_gen_sys(gens.to_generator_system());
            self.set_dim_kinds(ech.dim_kinds);
        } else {
            debug_assert!(self.generators_are_up_to_date());
            let Some(ech) = echelon_generators(self.gen_sys(), self.space_dimension()) else {
                self.set_empty();
                return false;
            };
            let cgs = generators_to_congruences(&ech);
            self.set_gen_sys(ech.to_generator_system());
            self.set_con_sys(cgs.to_congruence_system());
            self.set_dim_kinds(cgs.dim_kinds);
        }
        self.set_status(
            GridStatus::C_UP_TO_DATE
                | GridStatus::G_UP_TO_DATE
                | GridStatus::C_MINIMIZED
                | GridStatus::G_MINIMIZED,
        );
        debug_assert!(self.ok());
        true
    }

    /// Makes the congruences usable; `false` when the grid is empty.
    pub(crate) fn obtain_congruences(&mut self) -> bool {
        if self.marked_empty() {
            return false;
        }
        if self.congruences_are_up_to_date() {
            return true;
        }
        self.minimize()
    }

    /// Makes the generators usable; `false` when the grid is empty.
    pub(crate) fn obtain_generators(&mut self) -> bool {
        if self.marked_empty() {
            return false;
        }
        if self.generators_are_up_to_date() {
            return true;
        }
        self.minimize()
    }

    /// The congruences of `self`, on a materialized clone when the lazy
    /// state requires it; `None` for the empty grid.
    pub(crate) fn congruences_view(&self) -> Option<CongruenceSystem> {
        if self.marked_empty() {
            return None;
        }
        if self.congruences_are_up_to_date() {
            return Some(self.con_sys().clone());
        }
        let mut tmp = self.clone();
        if !tmp.obtain_congruences() {
            return None;
        }
        Some(tmp.con_sys().clone())
    }

    /// The generators of `self`; `None` for the empty grid.
    pub(crate) fn generators_view(&self) -> Option<GridGeneratorSystem> {
        if self.marked_empty() {
            return None;
        }
        if self.generators_are_up_to_date() {
            return Some(self.gen_sys().clone());
        }
        let mut tmp = self.clone();
        if !tmp.obtain_generators() {
            return None;
        }
        Some(tmp.gen_sys().clone())
    }

    /// A minimized copy, or `None` for the empty grid.
    pub(crate) fn minimized_view(&self) -> Option<Grid> {
        let mut tmp = self.clone();
        if !tmp.minimize() {
            return None;
        }
        Some(tmp)
    }

    /// The congruence system describing the grid.
    pub fn congruences(&mut self) -> &CongruenceSystem {
        if !self.marked_empty() && self.space_dimension() > 0 {
            self.obtain_congruences();
        }
        self.con_sys()
    }

    /// The congruence system in minimal echelon form.
    pub fn minimized_congruences(&mut self) -> &CongruenceSystem {
        self.minimize();
        self.con_sys()
    }

    /// The grid generator system describing the grid; empty of rows for
    /// the empty grid.
    pub fn grid_generators(&mut self) -> &GridGeneratorSystem {
        if !self.marked_empty() && self.space_dimension() > 0 {
            self.obtain_generators();
        }
        self.gen_sys()
    }

    /// The grid generator system in minimal echelon form.
    pub fn minimized_grid_generators(&mut self) -> &GridGeneratorSystem {
        self.minimize();
        self.gen_sys()
    }

    /// Refines the grid with a congruence.
    pub fn add_congruence(&mut self, cg: &Congruence) -> Result<()> {
        self.check_operand_dimension(cg.space_dimension(), "Grid::add_congruence")?;
        if self.marked_empty() {
            return Ok(());
        }
        if cg.is_tautological() {
            return Ok(());
        }
        if cg.is_inconsistent() {
            self.set_empty();
            return Ok(());
        }
        if self.space_dimension() == 0 {
            return Ok(());
        }
        if !self.obtain_congruences() {
            return Ok(());
        }
        self.set_con_sys({
            let mut cgs = self.con_sys().clone();
            cgs.insert(cg.clone());
            cgs
        });
        self.set_status(GridStatus::C_UP_TO_DATE);
        debug_assert!(self.ok());
        Ok(())
    }

    /// Adds every congruence of `cgs`.
    pub fn add_congruences(&mut self, cgs: &CongruenceSystem) -> Result<()> {
        self.check_operand_dimension(cgs.space_dimension(), "Grid::add_congruences")?;
        for cg in cgs.iter() {
            self.add_congruence(cg)?;
        }
        Ok(())
    }

    /// Adds a grid generator; into an empty grid only a point may go.
    pub fn add_grid_generator(&mut self, g: &GridGenerator) -> Result<()> {
        const OP: &str = "Grid::add_grid_generator";
        self.check_operand_dimension(g.space_dimension(), OP)?;
        if self.space_dimension() == 0 {
            debug_assert!(g.is_point());
            if self.marked_empty() {
                *self = Grid::universe(0);
            }
            return Ok(());
        }
        if !self.obtain_generators() {
            if !g.is_point() {
                return Err(Error::InvalidArgument {
                    op: OP,
                    reason: "only a point can enter an empty grid",
                });
            }
            let space_dim = self.space_dimension();
            let mut ggs = GridGeneratorSystem::with_space_dimension(space_dim);
            ggs.insert(g.clone());
            let mut grid = Grid::empty(space_dim);
            grid.set_gen_sys(ggs);
            grid.set_status(GridStatus::G_UP_TO_DATE);
            *self = grid;
            debug_assert!(self.ok());
            return Ok(());
        }
        self.insert_generator_raw(g.clone());
        self.set_status(GridStatus::G_UP_TO_DATE);
        debug_assert!(self.ok());
        Ok(())
    }

    /// Adds every generator of `ggs`.
    pub fn add_grid_generators(&mut self, ggs: &GridGeneratorSystem) -> Result<()> {
        self.check_operand_dimension(ggs.space_dimension(), "Grid::add_grid_generators")?;
        for g in ggs.iter() {
            self.add_grid_generator(g)?;
        }
        Ok(())
    }

    /// `self := self ∩ y`.
    pub fn intersection_assign(&mut self, y: &Grid) -> Result<()> {
        self.check_same_dimension(y, "Grid::intersection_assign")?;
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
        let Some(y_cgs) = y.congruences_view() else {
            self.set_empty();
            return Ok(());
        };
        if !self.obtain_congruences() {
            return Ok(());
        }
        let mut cgs = self.con_sys().clone();
        for cg in y_cgs.iter() {
            cgs.insert(cg.clone());
        }
        self.set_con_sys(cgs);
        self.set_status(GridStatus::C_UP_TO_DATE);
        debug_assert!(self.ok());
        Ok(())
    }

    /// `self := the smallest grid containing self and y`.
    pub fn join_assign(&mut self, y: &Grid) -> Result<()> {
        self.check_same_dimension(y, "Grid::join_assign")?;
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
        let Some(y_gens) = y.generators_view() else {
            return Ok(());
        };
        if !self.obtain_generators() {
            *self = y.clone();
            return Ok(());
        }
        let mut ggs = self.gen_sys().clone();
        for g in y_gens.iter() {
            ggs.insert(g.clone());
        }
        self.set_gen_sys(ggs);
        self.set_status(GridStatus::G_UP_TO_DATE);
        debug_assert!(self.ok());
        Ok(())
    }

    /// `self := { x[v := (expr . x) / denominator] : x in self }`.
    pub fn affine_image(
        &mut self,
        v: Variable,
        expr: &LinearExpr,
        denominator: &Coefficient,
    ) -> Result<()> {
        const OP: &str = "Grid::affine_image";
        if denominator.is_zero() {
            return Err(Error::DivisionByZero { op: OP });
        }
        self.check_operand_dimension(expr.space_dimension(), OP)?;
        self.check_operand_dimension(v.space_dimension(), OP)?;
        if !self.obtain_generators() {
            return Ok(());
        }
        let mut ggs = self.gen_sys().clone();
        if sgn(denominator) > 0 {
            ggs.affine_image(v, expr.as_slice(), denominator);
        } else {
            let negated: Vec<Coefficient> = expr.as_slice().iter().map(|c| -c).collect();
            ggs.affine_image(v, &negated, &-denominator);
        }
        self.set_gen_sys(ggs);
        self.set_status(GridStatus::G_UP_TO_DATE);
        debug_assert!(self.ok());
        Ok(())
    }

    /// The inverse of [`Grid::affine_image`].
    pub fn affine_preimage(
        &mut self,
        v: Variable,
        expr: &LinearExpr,
        denominator: &Coefficient,
    ) -> Result<()> {
        const OP: &str = "Grid::affine_preimage";
        if denominator.is_zero() {
            return Err(Error::DivisionByZero { op: OP });
        }
        self.check_operand_dimension(expr.space_dimension(), OP)?;
        self.check_operand_dimension(v.space_dimension(), OP)?;
        if self.marked_empty() || self.space_dimension() == 0 {
            return Ok(());
        }
        if !self.obtain_congruences() {
            return Ok(());
        }
        let mut cgs = self.con_sys().clone();
        if sgn(denominator) > 0 {
            cgs.affine_preimage(v, expr.as_slice(), denominator);
        } else {
            let negated: Vec<Coefficient> = expr.as_slice().iter().map(|c| -c).collect();
            cgs.affine_preimage(v, &negated, &-denominator);
        }
        self.set_con_sys(cgs);
        self.set_status(GridStatus::C_UP_TO_DATE);
        debug_assert!(self.ok());
        Ok(())
    }

    /// Appends `k` unconstrained dimensions.
    pub fn add_space_dimensions_and_embed(&mut self, k: usize) -> Result<()> {
        if k == 0 {
            return Ok(());
        }
        let new_dim = self.space_dimension() + k;
        if self.marked_empty() {
            *self = Grid::empty(new_dim);
            return Ok(());
        }
        if self.space_dimension() == 0 {
            *self = Grid::universe(new_dim);
            return Ok(());
        }
        if !self.obtain_generators() {
            *self = Grid::empty(new_dim);
            return Ok(());
        }
        let mut ggs = self.gen_sys().clone();
        ggs.adjust_space_dimension(new_dim)?;
        for d in self.space_dimension()..new_dim {
            ggs.insert(GridGenerator::grid_line(LinearExpr::from(Variable(d))));
        }
        self.space_dim = new_dim;
        self.set_gen_sys(ggs);
        self.set_con_sys(CongruenceSystem::with_space_dimension(new_dim));
        self.set_status(GridStatus::G_UP_TO_DATE);
        debug_assert!(self.ok());
        Ok(())
    }

    /// Appends `k` dimensions, each pinned to zero.
    pub fn add_space_dimensions_and_project(&mut self, k: usize) -> Result<()> {
        if k == 0 {
            return Ok(());
        }
        let old_dim = self.space_dimension();
        let new_dim = old_dim + k;
        if self.marked_empty() {
            *self = Grid::empty(new_dim);
            return Ok(());
        }
        if !self.obtain_congruences() {
            *self = Grid::empty(new_dim);
            return Ok(());
        }
        let mut cgs = self.con_sys().clone();
        cgs.adjust_space_dimension(new_dim)?;
        for d in old_dim..new_dim {
            cgs.insert(crate::constraint::Rel::congruent(Variable(d), 0, 0));
        }
        self.space_dim = new_dim;
        self.set_con_sys(cgs);
        self.set_gen_sys(GridGeneratorSystem::with_space_dimension(new_dim));
        self.set_status(GridStatus::C_UP_TO_DATE);
        debug_assert!(self.ok());
        Ok(())
    }

    /// Existentially quantifies away the given dimensions.
    pub fn remove_space_dimensions(&mut self, vars: &[Variable]) -> Result<()> {
        if vars.is_empty() {
            return Ok(());
        }
        let max_dim = vars.iter().map(|v| v.space_dimension()).max().unwrap();
        self.check_operand_dimension(max_dim, "Grid::remove_space_dimensions")?;
        let mut dims: Vec<usize> = vars.iter().map(|v| v.id()).collect();
        dims.sort_unstable();
        dims.dedup();
        dims.reverse();
        let new_dim = self.space_dimension() - dims.len();
        if self.marked_empty() {
            *self = Grid::empty(new_dim);
            return Ok(());
        }
        if new_dim == 0 {
            *self = if self.is_empty() {
                Grid::empty(0)
            } else {
                Grid::universe(0)
            };
            return Ok(());
        }
        if !self.obtain_generators() {
            *self = Grid::empty(new_dim);
            return Ok(());
        }
        let mut ggs = self.gen_sys().clone();
        ggs.remove_dimensions(&dims);
        self.space_dim = new_dim;
        self.set_gen_sys(ggs);
        self.set_con_sys(CongruenceSystem::with_space_dimension(new_dim));
        self.set_status(GridStatus::G_UP_TO_DATE);
        debug_assert!(self.ok());
        Ok(())
    }

    /// Keeps only the first `new_dim` dimensions.
    pub fn remove_higher_space_dimensions(&mut self, new_dim: usize) -> Result<()> {
        if new_dim > self.space_dimension() {
            return Err(Error::DimensionIncompatible {
                op: "Grid::remove_higher_space_dimensions",
                receiver_dim: self.space_dimension(),
                operand_dim: new_dim,
            });
        }
        let vars: Vec<Variable> = (new_dim..self.space_dimension()).map(Variable).collect();
        self.remove_space_dimensions(&vars)
    }

    /// Appends `m` copies of dimension `v`: every congruence on `v` is
    /// replicated on each copy.
    pub fn expand_space_dimension(&mut self, v: Variable, m: usize) -> Result<()> {
        self.check_operand_dimension(v.space_dimension(), "Grid::expand_space_dimension")?;
        if m == 0 {
            return Ok(());
        }
        let old_dim = self.space_dimension();
        let Some(snapshot) = self.congruences_view() else {
            *self = Grid::empty(old_dim + m);
            return Ok(());
        };
        self.add_space_dimensions_and_embed(m)?;
        for cg in snapshot.iter() {
            let v_coeff = cg.coefficient(v);
            if v_coeff.is_zero() {
                continue;
            }
            for copy in 0..m {
                let mut e = cg.to_expr();
                e.set_coefficient(v, Coefficient::zero());
                e.set_coefficient(Variable(old_dim + copy), v_coeff.clone());
                self.add_congruence(&crate::constraint::Rel::congruent(
                    e,
                    0,
                    cg.modulus().clone(),
                ))?;
            }
        }
        debug_assert!(self.ok());
        Ok(())
    }

    /// Folds the dimensions in `vars` into `dest`, joining the
    /// projections.
    pub fn fold_space_dimensions(&mut self, vars: &[Variable], dest: Variable) -> Result<()> {
        const OP: &str = "Grid::fold_space_dimensions";
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
            if copy.obtain_generators() {
                let mut ggs = copy.gen_sys().clone();
                ggs.swap_dimensions(w, dest);
                copy.set_gen_sys(ggs);
                copy.set_status(GridStatus::G_UP_TO_DATE);
            }
            copy.remove_space_dimensions(vars)?;
            result.join_assign(&copy)?;
        }
        *self = result;
        debug_assert!(self.ok());
        Ok(())
    }

    /// Whether the grid has no point.
    pub fn is_empty(&self) -> bool {
        if self.marked_empty() {
            return true;
        }
        if self.space_dimension() == 0 {
            return false;
        }
        self.generators_view().is_none()
    }

    /// Whether the grid covers all of rational space.
    pub fn is_universe(&self) -> bool {
        if self.marked_empty() {
            return false;
        }
        if self.space_dimension() == 0 {
            return true;
        }
        match self.minimized_view() {
            None => false,
            Some(m) => m.con_sys().iter().all(Congruence::is_tautological),
        }
    }

    /// Whether every grid point is isolated: no line survives
    /// minimization.
    pub fn is_discrete(&self) -> bool {
        match self.minimized_view() {
            None => true,
            Some(m) => m.gen_sys().num_lines() == 0,
        }
    }

    /// Whether the grid is a single point or empty.
    pub fn is_bounded(&self) -> bool {
        match self.minimized_view() {
            None => true,
            Some(m) => m.gen_sys().num_lines() == 0 && m.gen_sys().num_parameters() == 0,
        }
    }

    /// Whether `self` includes `y`.
    pub fn contains(&self, y: &Grid) -> Result<bool> {
        self.check_same_dimension(y, "Grid::contains")?;
        let Some(y_gens) = y.generators_view() else {
            return Ok(true);
        };
        if self.marked_empty() {
            return Ok(false);
        }
        if self.space_dimension() == 0 {
            return Ok(true);
        }
        let Some(cgs) = self.congruences_view() else {
            return Ok(false);
        };
        let result = y_gens.iter().all(|g| cgs.is_satisfied_by(g));
        Ok(result)
    }

    /// Whether `self` includes `y` and differs from it.
    pub fn strictly_contains(&self, y: &Grid) -> Result<bool> {
        Ok(self.contains(y)? && !y.contains(self)?)
    }

    /// Whether the two grids share no point.
    pub fn is_disjoint_from(&self, y: &Grid) -> Result<bool> {
        self.check_same_dimension(y, "Grid::is_disjoint_from")?;
        let mut z = self.clone();
        z.intersection_assign(y)?;
        Ok(z.is_empty())
    }

    /// Whether adding `g` would change the grid.
    pub fn relation_with_grid_generator(&self, g: &GridGenerator) -> Result<PolyGenRelation> {
        self.check_operand_dimension(g.space_dimension(), "Grid::relation_with_grid_generator")?;
        if self.marked_empty() {
            return Ok(PolyGenRelation::nothing());
        }
        if self.space_dimension() == 0 {
            return Ok(PolyGenRelation::subsumes());
        }
        let Some(cgs) = self.congruences_view() else {
            return Ok(PolyGenRelation::nothing());
        };
        Ok(if cgs.is_satisfied_by(g) {
            PolyGenRelation::subsumes()
        } else {
            PolyGenRelation::nothing()
        })
    }

    /// The relation between the grid and the set of points satisfying
    /// `cg`.
    pub fn relation_with(&self, cg: &Congruence) -> Result<PolyConRelation> {
        self.check_operand_dimension(cg.space_dimension(), "Grid::relation_with")?;
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
        let Some(gens) = self.generators_view() else {
            return Ok(PolyConRelation::SATURATES
                | PolyConRelation::IS_INCLUDED
                | PolyConRelation::IS_DISJOINT);
        };
        // Work over a common scale: the value of the congruence expression
        // across the grid is v + G.Z (+ the line contributions), all
        // multiplied by the scale.
        let point = gens
            .iter()
            .find(|g| g.is_point())
            .expect("a non-empty grid has a base point");
        let mut scale = point.divisor().clone();
        for g in gens.iter() {
            if g.is_parameter() {
                coefficient::lcm_assign(&mut scale, g.divisor());
            }
        }
        let eval = |g: &GridGenerator, with_inhomogeneous: bool| -> Coefficient {
            let mut v = if with_inhomogeneous {
                cg.inhomogeneous_term() * &scale
            } else {
                Coefficient::zero()
            };
            let row_scale = if g.is_line() {
                Coefficient::one()
            } else {
                &scale / g.divisor()
            };
            for i in 0..self.space_dimension() {
                v += cg.coefficient(Variable(i)) * g.coefficient(Variable(i)) * &row_scale;
            }
            v
        };
        // A line not orthogonal to the expression sweeps every value.
        for g in gens.iter() {
            if g.is_line() && !eval(g, false).is_zero() {
                return Ok(PolyConRelation::STRICTLY_INTERSECTS);
            }
        }
        let value = eval(point, true);
        let mut step = Coefficient::zero();
        for g in gens.iter() {
            if g.is_parameter() {
                coefficient::gcd_assign(&mut step, &eval(g, false));
            }
        }
        if cg.is_equality() {
            if value.is_zero() && step.is_zero() {
                return Ok(PolyConRelation::SATURATES | PolyConRelation::IS_INCLUDED);
            }
            let hits = if step.is_zero() {
                value.is_zero()
            } else {
                value.mod_floor(&step).is_zero()
            };
            return Ok(if hits {
                PolyConRelation::STRICTLY_INTERSECTS
            } else {
                PolyConRelation::IS_DISJOINT
            });
        }
        let modulus = cg.modulus() * &scale;
        let included =
            value.mod_floor(&modulus).is_zero() && (step.is_zero() || step.mod_floor(&modulus).is_zero());
        if included {
            return Ok(PolyConRelation::IS_INCLUDED);
        }
        let mut reach = step;
        coefficient::gcd_assign(&mut reach, &modulus);
        let hits = if reach.is_zero() {
            value.is_zero()
        } else {
            value.mod_floor(&reach).is_zero()
        };
        Ok(if hits {
            PolyConRelation::STRICTLY_INTERSECTS
        } else {
            PolyConRelation::IS_DISJOINT
        })
    }
}

impl PartialEq for Grid {
    fn eq(&self, other: &Self) -> bool {
        if self.space_dimension() != other.space_dimension() {
            return false;
        }
        self.contains(other).unwrap_or(false) && other.contains(self).unwrap_or(false)
    }
}

impl Eq for Grid {}

impl fmt::Display for Grid {
    /// `false` for the empty grid, `true` for the universe, otherwise the
    /// minimized congruences.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.minimized_view() {
            None => write!(f, "false"),
            Some(m) => write!(f, "{}", m.con_sys()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::Rel;

    fn lattice() -> Grid {
        // A = 0 (mod 4), B = 0 (mod 2).
        let a = Variable(0);
        let b = Variable(1);
        let mut g = Grid::universe(2);
        g.add_congruence(&a.congruent(0, 4)).unwrap();
        g.add_congruence(&b.congruent(0, 2)).unwrap();
        g
    }

    #[test]
    fn parametric_shift() {
        let a = Variable(0);
        let b = Variable(1);
        let mut g = lattice();
        g.affine_image(a, &(a + 3), &Coefficient::from(1)).unwrap();
        let mut expected = Grid::universe(2);
        expected.add_congruence(&a.congruent(3, 4)).unwrap();
        expected.add_congruence(&b.congruent(0, 2)).unwrap();
        assert_eq!(g, expected);
    }

    #[test]
    fn preimage_of_a_shift() {
        let a = Variable(0);
        let mut g = lattice();
        g.affine_preimage(a, &(a + 4), &Coefficient::from(1)).unwrap();
        // A + 4 = 0 (mod 4) is the same lattice.
        assert_eq!(g, lattice());
        g.affine_preimage(a, &(a + 1), &Coefficient::from(1)).unwrap();
        let b = Variable(1);
        let mut expected = Grid::universe(2);
        expected.add_congruence(&a.congruent(3, 4)).unwrap();
        expected.add_congruence(&b.congruent(0, 2)).unwrap();
        assert_eq!(g, expected);
    }

    #[test]
    fn intersection_tightens_the_lattice() {
        let a = Variable(0);
        let mut g = Grid::universe(1);
        g.add_congruence(&a.congruent(0, 2)).unwrap();
        let mut h = Grid::universe(1);
        h.add_congruence(&a.congruent(0, 3)).unwrap();
        g.intersection_assign(&h).unwrap();
        let mut expected = Grid::universe(1);
        expected.add_congruence(&a.congruent(0, 6)).unwrap();
        assert_eq!(g, expected);
    }

    #[test]
    fn join_coarsens_the_lattice() {
        let a = Variable(0);
        let mut g = Grid::universe(1);
        g.add_congruence(&a.congruent(0, 4)).unwrap();
        let mut h = Grid::universe(1);
        h.add_congruence(&a.congruent(2, 4)).unwrap();
        g.join_assign(&h).unwrap();
        // 4Z joined with 2 + 4Z is 2Z.
        let mut expected = Grid::universe(1);
        expected.add_congruence(&a.congruent(0, 2)).unwrap();
        assert_eq!(g, expected);
    }

    #[test]
    fn containment_and_emptiness() {
        let g = lattice();
        assert!(g.contains(&g).unwrap());
        let mut tighter = Grid::universe(2);
        tighter
            .add_congruence(&Variable(0).congruent(0, 8))
            .unwrap();
        tighter
            .add_congruence(&Variable(1).congruent(0, 2))
            .unwrap();
        assert!(g.contains(&tighter).unwrap());
        assert!(!tighter.contains(&g).unwrap());
        assert!(g.strictly_contains(&tighter).unwrap());

        let mut e = Grid::universe(1);
        e.add_congruence(&Variable(0).congruent(0, 0)).unwrap();
        e.add_congruence(&Variable(0).congruent(1, 0)).unwrap();
        assert!(e.is_empty());
    }

    #[test]
    fn discreteness_and_universality() {
        assert!(lattice().is_discrete());
        assert!(!lattice().is_universe());
        assert!(Grid::universe(2).is_universe());
        assert!(!Grid::universe(2).is_discrete());
        assert!(!lattice().is_bounded());
        let mut point = Grid::universe(1);
        point.add_congruence(&Variable(0).congruent(5, 0)).unwrap();
        assert!(point.is_bounded());
    }

    #[test]
    fn relations_with_congruences() {
        let a = Variable(0);
        let g = lattice();
        // 4Z x 2Z within A = 0 (mod 2): included.
        let r = g.relation_with(&a.congruent(0, 2)).unwrap();
        assert!(r.implies(PolyConRelation::IS_INCLUDED));
        // Against A = 1 (mod 2): disjoint.
        let r = g.relation_with(&a.congruent(1, 2)).unwrap();
        assert!(r.implies(PolyConRelation::IS_DISJOINT));
        // Against A = 0 (mod 3): some lattice points hit, some miss.
        let r = g.relation_with(&a.congruent(0, 3)).unwrap();
        assert!(r.implies(PolyConRelation::STRICTLY_INTERSECTS));
        // Equality through the base point.
        let r = g.relation_with(&a.congruent(0, 0)).unwrap();
        assert!(r.implies(PolyConRelation::STRICTLY_INTERSECTS));
    }

    #[test]
    fn dimension_surgery() {
        let a = Variable(0);
        let mut g = lattice();
        g.add_space_dimensions_and_embed(1).unwrap();
        assert_eq!(g.space_dimension(), 3);
        assert!(!g.is_discrete());
        g.remove_space_dimensions(&[Variable(2)]).unwrap();
        assert_eq!(g, lattice());
        g.add_space_dimensions_and_project(1).unwrap();
        let c = Variable(2);
        let r = g.relation_with(&c.congruent(0, 0)).unwrap();
        assert!(r.implies(PolyConRelation::IS_INCLUDED));
        let _ = a;
    }

    #[test]
    fn expansion_copies_congruences() {
        let a = Variable(0);
        let mut g = Grid::universe(1);
        g.add_congruence(&a.congruent(1, 3)).unwrap();
        g.expand_space_dimension(a, 1).unwrap();
        let b = Variable(1);
        let mut expected = Grid::universe(2);
        expected.add_congruence(&a.congruent(1, 3)).unwrap();
        expected.add_congruence(&b.congruent(1, 3)).unwrap();
        assert_eq!(g, expected);
    }

    #[test]
    fn folding_joins_lattices() {
        let a = Variable(0);
        let b = Variable(1);
        let mut g = Grid::universe(2);
        g.add_congruence(&a.congruent(0, 4)).unwrap();
        g.add_congruence(&b.congruent(0, 6)).unwrap();
        g.fold_space_dimensions(&[a], b).unwrap();
        // The join of 4Z and 6Z is 2Z.
        let mut expected = Grid::universe(1);
        expected.add_congruence(&Variable(0).congruent(0, 2)).unwrap();
        assert_eq!(g, expected);
    }
}
