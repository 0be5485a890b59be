//! Integer grids in double description form: congruences on one side,
//! grid generators on the other, aligned dimension by dimension.

mod ascii;
mod conversion;
mod ops;
mod simplify;
mod widenings;

use crate::congruence::CongruenceSystem;
use crate::error::{Error, Result};
use crate::grid_generator::{GridGenerator, GridGeneratorSystem};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// The lazy-evaluation status word of a grid.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub(crate) struct GridStatus: u8 {
        const EMPTY = 1;
        const ZERO_DIM_UNIV = 1 << 1;
        const C_UP_TO_DATE = 1 << 2;
        const G_UP_TO_DATE = 1 << 3;
        const C_MINIMIZED = 1 << 4;
        const G_MINIMIZED = 1 << 5;
    }
}

/// What a dimension contributes to a minimized grid description.
///
/// The same vector is read from both sides of the double description:
/// a dimension pinned exactly carries an equality and no generator, a
/// dimension constrained modularly carries a proper congruence and a
/// parameter, and an unconstrained dimension carries no congruence and a
/// line. Index 0 stands for the inhomogeneous column on the congruence
/// side and the base point on the generator side.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum DimKind {
    /// An equality congruence; no generator (`GEN_VIRTUAL`).
    Equality,
    /// A proper congruence; a parameter on the generator side.
    ProperCongruence,
    /// No congruence (`CON_VIRTUAL`); a line on the generator side.
    ConVirtual,
}

impl DimKind {
    /// Generator-side alias of [`DimKind::Equality`].
    pub const GEN_VIRTUAL: DimKind = DimKind::Equality;
    /// Generator-side alias of [`DimKind::ProperCongruence`].
    pub const PARAMETER: DimKind = DimKind::ProperCongruence;
    /// Generator-side alias of [`DimKind::ConVirtual`].
    pub const LINE: DimKind = DimKind::ConVirtual;
}

/// A rational grid: the set of points `p + sum z_i q_i + sum t_j l_j`
/// with integral `z_i` and rational `t_j`, equivalently the solutions of
/// a system of congruences.
#[derive(Clone, Debug)]
pub struct Grid {
    space_dim: usize,
    con_sys: CongruenceSystem,
    gen_sys: GridGeneratorSystem,
    /// Aligned with the minimized systems; meaningful whenever one of the
    /// minimization flags is set. Length `space_dim + 1`.
    dim_kinds: Vec<DimKind>,
    status: GridStatus,
}

impl Grid {
    /// The universe grid: all of rational space.
    pub fn universe(space_dim: usize) -> Self {
        if space_dim == 0 {
            return Self {
                space_dim: 0,
                con_sys: CongruenceSystem::new(),
                gen_sys: GridGeneratorSystem::new(),
                dim_kinds: vec![DimKind::ProperCongruence],
                status: GridStatus::ZERO_DIM_UNIV,
            };
        }
        let mut dim_kinds = vec![DimKind::ConVirtual; space_dim + 1];
        dim_kinds[0] = DimKind::ProperCongruence;
        Self {
            space_dim,
            con_sys: CongruenceSystem::with_space_dimension(space_dim),
            gen_sys: GridGeneratorSystem::with_space_dimension(space_dim),
            dim_kinds,
            status: GridStatus::C_UP_TO_DATE | GridStatus::C_MINIMIZED,
        }
    }

    /// The empty grid.
    pub fn empty(space_dim: usize) -> Self {
        Self {
            space_dim,
            con_sys: CongruenceSystem::with_space_dimension(space_dim),
            gen_sys: GridGeneratorSystem::with_space_dimension(space_dim),
            dim_kinds: Vec::new(),
            status: GridStatus::EMPTY,
        }
    }

    /// The grid of all solutions of `cgs`.
    pub fn from_congruences(cgs: CongruenceSystem) -> Self {
        let space_dim = cgs.space_dimension();
        if space_dim == 0 {
            return if cgs.iter().any(crate::congruence::Congruence::is_inconsistent) {
                Self::empty(0)
            } else {
                Self::universe(0)
            };
        }
        let mut grid = Self::universe(space_dim);
        for cg in cgs.iter() {
            grid.con_sys.insert(cg.clone());
        }
        grid.status = GridStatus::C_UP_TO_DATE;
        grid
    }

    /// The grid generated by `ggs`; an empty system yields the empty
    /// grid, while a non-empty system must contain a point.
    pub fn from_grid_generators(ggs: GridGeneratorSystem) -> Result<Self> {
        let space_dim = ggs.space_dimension();
        if ggs.has_no_rows() {
            return Ok(Self::empty(space_dim));
        }
        if !ggs.has_points() {
            return Err(Error::InvalidArgument {
                op: "Grid::from_grid_generators",
                reason: "a non-empty grid generator system needs a point",
            });
        }
        if space_dim == 0 {
            return Ok(Self::universe(0));
        }
        let mut grid = Self::empty(space_dim);
        grid.gen_sys = ggs;
        grid.gen_sys.adjust_space_dimension(space_dim)?;
        grid.status = GridStatus::G_UP_TO_DATE;
        Ok(grid)
    }

    pub fn space_dimension(&self) -> usize {
        self.space_dim
    }

    pub(crate) fn marked_empty(&self) -> bool {
        self.status.contains(GridStatus::EMPTY)
    }

    pub(crate) fn congruences_are_up_to_date(&self) -> bool {
        self.status.contains(GridStatus::C_UP_TO_DATE)
    }

    pub(crate) fn generators_are_up_to_date(&self) -> bool {
        self.status.contains(GridStatus::G_UP_TO_DATE)
    }

    pub(crate) fn congruences_are_minimized(&self) -> bool {
        self.status.contains(GridStatus::C_MINIMIZED)
    }

    pub(crate) fn generators_are_minimized(&self) -> bool {
        self.status.contains(GridStatus::G_MINIMIZED)
    }

    pub(crate) fn set_empty(&mut self) {
        let space_dim = self.space_dim;
        *self = Self::empty(space_dim);
    }

    pub(crate) fn status(&self) -> GridStatus {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: GridStatus) {
        self.status = status;
    }

    pub(crate) fn con_sys(&self) -> &CongruenceSystem {
        &self.con_sys
    }

    pub(crate) fn gen_sys(&self) -> &GridGeneratorSystem {
        &self.gen_sys
    }

    pub(crate) fn dim_kinds(&self) -> &[DimKind] {
        &self.dim_kinds
    }

    /// Structural consistency; used by the loader and debug assertions.
    pub(crate) fn ok(&self) -> bool {
        if self.marked_empty() {
            return self.gen_sys.has_no_rows();
        }
        if self.status.contains(GridStatus::ZERO_DIM_UNIV) {
            return self.space_dim == 0;
        }
        if self.space_dim == 0 {
            return false;
        }
        if !self.congruences_are_up_to_date() && !self.generators_are_up_to_date() {
            return false;
        }
        if self.congruences_are_up_to_date() && self.con_sys.space_dimension() > self.space_dim {
            return false;
        }
        if self.generators_are_up_to_date() {
            if self.gen_sys.space_dimension() > self.space_dim {
                return false;
            }
            if !self.gen_sys.has_points() {
                return false;
            }
        }
        if (self.congruences_are_minimized() || self.generators_are_minimized())
            && self.dim_kinds.len() != self.space_dim + 1
        {
            return false;
        }
        true
    }

    pub(crate) fn check_same_dimension(&self, other: &Grid, op: &'static str) -> Result<()> {
        if self.space_dim != other.space_dim {
            return Err(Error::DimensionIncompatible {
                op,
                receiver_dim: self.space_dim,
                operand_dim: other.space_dim,
            });
        }
        Ok(())
    }

    pub(crate) fn check_operand_dimension(
        &self,
        operand_dim: usize,
        op: &'static str,
    ) -> Result<()> {
        if operand_dim > self.space_dim {
            return Err(Error::DimensionIncompatible {
                op,
                receiver_dim: self.space_dim,
                operand_dim,
            });
        }
        Ok(())
    }

    pub(crate) fn set_con_sys(&mut self, cgs: CongruenceSystem) {
        self.con_sys = cgs;
    }

    pub(crate) fn set_gen_sys(&mut self, ggs: GridGeneratorSystem) {
        self.gen_sys = ggs;
    }

    pub(crate) fn set_dim_kinds(&mut self, dim_kinds: Vec<DimKind>) {
        self.dim_kinds = dim_kinds;
    }

    pub(crate) fn insert_generator_raw(&mut self, g: GridGenerator) {
        self.gen_sys.insert(g);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trivial_grids() {
        let u = Grid::universe(2);
        assert!(u.ok());
        assert!(u.congruences_are_up_to_date());
        let e = Grid::empty(2);
        assert!(e.marked_empty());
        assert!(e.ok());
        let z = Grid::universe(0);
        assert_eq!(z.space_dimension(), 0);
        assert!(z.ok());
    }

    #[test]
    fn dim_kind_aliases_mirror_the_duality() {
        assert_eq!(DimKind::GEN_VIRTUAL, DimKind::Equality);
        assert_eq!(DimKind::PARAMETER, DimKind::ProperCongruence);
        assert_eq!(DimKind::LINE, DimKind::ConVirtual);
    }
}
