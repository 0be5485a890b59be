//! The capability trait shared by the numerical abstract domains.
//!
//! The domains share method names but no implementation: each concrete
//! type implements the trait over its own engine, and cross-domain
//! conversions are free functions demanding only these capabilities.

use crate::error::Result;
use crate::grid::Grid;
use crate::polyhedron::Polyhedron;

/// The operations every numerical abstract domain offers: lattice
/// structure, emptiness and universality tests, dimension surgery and a
/// widening for fixpoint iteration.
pub trait NumericalDomain: Clone + PartialEq {
    fn space_dimension(&self) -> usize;

    fn is_empty_element(&self) -> Result<bool>;

    fn is_universe_element(&self) -> Result<bool>;

    fn contains_element(&self, other: &Self) -> Result<bool>;

    /// The lattice meet: set intersection.
    fn meet_assign(&mut self, other: &Self) -> Result<()>;

    /// The lattice join, possibly over-approximated (the convex hull for
    /// polyhedra, the grid join for grids).
    fn upper_bound_assign(&mut self, other: &Self) -> Result<()>;

    /// The domain's default widening; `other` must be included in `self`.
    fn widen_assign(&mut self, other: &Self, tokens: Option<&mut u32>) -> Result<()>;

    fn add_space_dimensions_and_embed(&mut self, k: usize) -> Result<()>;

    fn remove_higher_space_dimensions(&mut self, new_dim: usize) -> Result<()>;
}

impl NumericalDomain for Polyhedron {
    fn space_dimension(&self) -> usize {
        Polyhedron::space_dimension(self)
    }

    fn is_empty_element(&self) -> Result<bool> {
        self.is_empty()
    }

    fn is_universe_element(&self) -> Result<bool> {
        self.is_universe()
    }

    fn contains_element(&self, other: &Self) -> Result<bool> {
        self.contains(other)
    }

    fn meet_assign(&mut self, other: &Self) -> Result<()> {
        self.intersection_assign(other)
    }

    fn upper_bound_assign(&mut self, other: &Self) -> Result<()> {
        self.poly_hull_assign(other)
    }

    fn widen_assign(&mut self, other: &Self, tokens: Option<&mut u32>) -> Result<()> {
        self.widening_assign(other, tokens)
    }

    fn add_space_dimensions_and_embed(&mut self, k: usize) -> Result<()> {
        Polyhedron::add_space_dimensions_and_embed(self, k)
    }

    fn remove_higher_space_dimensions(&mut self, new_dim: usize) -> Result<()> {
        Polyhedron::remove_higher_space_dimensions(self, new_dim)
    }
}

impl NumericalDomain for Grid {
    fn space_dimension(&self) -> usize {
        Grid::space_dimension(self)
    }

    fn is_empty_element(&self) -> Result<bool> {
        Ok(self.is_empty())
    }

    fn is_universe_element(&self) -> Result<bool> {
        Ok(self.is_universe())
    }

    fn contains_element(&self, other: &Self) -> Result<bool> {
        self.contains(other)
    }

    fn meet_assign(&mut self, other: &Self) -> Result<()> {
        self.intersection_assign(other)
    }

    fn upper_bound_assign(&mut self, other: &Self) -> Result<()> {
        self.join_assign(other)
    }

    fn widen_assign(&mut self, other: &Self, tokens: Option<&mut u32>) -> Result<()> {
        self.widening_assign(other, tokens)
    }

    fn add_space_dimensions_and_embed(&mut self, k: usize) -> Result<()> {
        Grid::add_space_dimensions_and_embed(self, k)
    }

    fn remove_higher_space_dimensions(&mut self, new_dim: usize) -> Result<()> {
        Grid::remove_higher_space_dimensions(self, new_dim)
    }
}

/// The smallest grid containing a polyhedron's affine hull: the equality
/// constraints carry over as equality congruences, everything else is
/// existentially forgotten. A cross-domain conversion built purely from
/// the exposed capabilities of the two types.
pub fn grid_from_polyhedron(ph: &Polyhedron) -> Result<Grid> {
    let Some(cs) = ph.constraints_view()? else {
        return Ok(Grid::empty(ph.space_dimension()));
    };
    let mut grid = Grid::universe(ph.space_dimension());
    for c in cs.iter() {
        if c.is_equality() {
            grid.add_congruence(&crate::constraint::Rel::congruent(c.to_expr(), 0, 0))?;
        }
    }
    Ok(grid)
}

/// The smallest polyhedron containing a grid: its equality congruences
/// become equality constraints.
pub fn polyhedron_from_grid(grid: &Grid) -> Result<Polyhedron> {
    let Some(cgs) = grid.congruences_view() else {
        return Ok(Polyhedron::empty(
            crate::row::Topology::Closed,
            grid.space_dimension(),
        ));
    };
    let mut ph = Polyhedron::universe(crate::row::Topology::Closed, grid.space_dimension());
    for cg in cgs.iter() {
        if cg.is_equality() {
            ph.add_congruence(cg)?;
        }
    }
    Ok(ph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::Rel;
    use crate::row::Topology;
    use hedra_num::Variable;

    fn exercise<D: NumericalDomain + std::fmt::Debug>(universe: D, smaller: D) -> Result<()> {
        assert!(universe.contains_element(&smaller)?);
        assert!(universe.is_universe_element()?);
        let mut meet = universe.clone();
        meet.meet_assign(&smaller)?;
        assert_eq!(meet, smaller);
        let mut join = smaller.clone();
        join.upper_bound_assign(&universe)?;
        assert_eq!(join, universe);
        let mut widened = universe.clone();
        widened.widen_assign(&smaller, None)?;
        assert!(widened.contains_element(&universe)?);
        Ok(())
    }

    #[test]
    fn both_domains_satisfy_the_lattice_contract() {
        let a = Variable(0);
        let mut half = Polyhedron::universe(Topology::Closed, 1);
        half.add_constraint(a.ge(0)).unwrap();
        exercise(Polyhedron::universe(Topology::Closed, 1), half).unwrap();

        let mut evens = Grid::universe(1);
        evens.add_congruence(&a.congruent(0, 2)).unwrap();
        exercise(Grid::universe(1), evens).unwrap();
    }

    #[test]
    fn cross_domain_conversions_carry_equalities() {
        let a = Variable(0);
        let b = Variable(1);
        let mut ph = Polyhedron::universe(Topology::Closed, 2);
        ph.add_constraint(a.eq(b)).unwrap();
        ph.add_constraint(a.ge(0)).unwrap();
        let grid = grid_from_polyhedron(&ph).unwrap();
        let mut expected = Grid::universe(2);
        expected.add_congruence(&a.congruent(b, 0)).unwrap();
        assert_eq!(grid, expected);

        let back = polyhedron_from_grid(&grid).unwrap();
        assert!(back.contains(&ph).unwrap());
        assert!(back.constrains(a).unwrap());
    }
}
