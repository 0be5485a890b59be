//! Grid widening and extrapolation operators.
//!
//! The congruence widening keeps those congruences of the receiver whose
//! leading entries match the corresponding congruence of the argument,
//! which must be included in the receiver; the generator widening works
//! dually, relaxing unmatched parameters to lines. Both compare rows
//! through the `dim_kinds` alignment of the minimized systems.

use super::{DimKind, Grid};
use crate::congruence::CongruenceSystem;
use crate::error::Result;
use crate::grid_generator::{GridGenerator, GridGeneratorKind, GridGeneratorSystem};
use crate::relation::PolyConRelation;

impl Grid {
    /// Selects the congruences of `self` that the widening keeps; both
    /// grids are minimized and `y` is included in `self`.
    fn select_wider_congruences(&self, y: &Grid) -> CongruenceSystem {
        let mut selected = CongruenceSystem::with_space_dimension(self.space_dimension());
        let mut x_row = 0;
        let mut y_row = 0;
        for dim in (1..=self.space_dimension()).rev() {
            debug_assert!(
                self.dim_kinds()[dim] == DimKind::ConVirtual
                    || self.dim_kinds()[dim] == y.dim_kinds()[dim]
            );
            match self.dim_kinds()[dim] {
                DimKind::ProperCongruence => {
                    let cg = self.con_sys().row(x_row);
                    if y.dim_kinds()[dim] == DimKind::ProperCongruence {
                        let y_cg = y.con_sys().row(y_row);
                        if cg.is_equal_at_dimension(dim, y_cg) {
                            selected.insert(cg.clone());
                        }
                    } else {
                        selected.insert(cg.clone());
                    }
                    x_row += 1;
                    y_row += 1;
                }
                DimKind::Equality => {
                    selected.insert(self.con_sys().row(x_row).clone());
                    x_row += 1;
                    y_row += 1;
                }
                DimKind::ConVirtual => {
                    if y.dim_kinds()[dim] != DimKind::ConVirtual {
                        y_row += 1;
                    }
                }
            }
        }
        selected
    }

    /// The congruence widening: keeps the stable congruences of the
    /// receiver. With `tokens`, a non-stabilizing step consumes a token
    /// instead of widening.
    pub fn congruence_widening_assign(
        &mut self,
        y: &Grid,
        mut tokens: Option<&mut u32>,
    ) -> Result<()> {
        self.check_same_dimension(y, "Grid::congruence_widening_assign")?;
        debug_assert!(self.contains(y).unwrap_or(true));
        if self.space_dimension() == 0 || self.marked_empty() || y.marked_empty() {
            return Ok(());
        }
        if !self.minimize() {
            return Ok(());
        }
        let Some(y_min) = y.minimized_view() else {
            return Ok(());
        };
        if self.con_sys().num_equalities() < y_min.con_sys().num_equalities() {
            return Ok(());
        }
        let selected = self.select_wider_congruences(&y_min);
        if selected.num_rows() == self.con_sys().num_rows() {
            // Everything was kept: the widening is the receiver itself.
            return Ok(());
        }
        let mut result = Grid::universe(self.space_dimension());
        result.add_congruences(&selected)?;
        self.commit_widening(result, &mut tokens)
    }

    /// Selects the generators of `self` that the widening keeps,
    /// relaxing parameters with unstable leading entries to lines.
    fn select_wider_generators(&self, y: &Grid) -> GridGeneratorSystem {
        let mut selected = GridGeneratorSystem::with_space_dimension(self.space_dimension());
        let mut x_row = 0;
        let mut y_row = 0;
        for dim in 0..=self.space_dimension() {
            debug_assert!(
                self.dim_kinds()[dim] == DimKind::LINE
                    || y.dim_kinds()[dim] == DimKind::GEN_VIRTUAL
                    || self.dim_kinds()[dim] == y.dim_kinds()[dim]
            );
            match self.dim_kinds()[dim] {
                DimKind::PARAMETER => {
                    let gg = self.gen_sys().row(x_row);
                    if dim == 0 || gg.is_equal_at_dimension(dim, y.gen_sys().row(y_row)) {
                        selected.insert(gg.clone());
                    } else {
                        selected.insert(GridGenerator::grid_line(gg.to_expr()));
                    }
                    x_row += 1;
                    y_row += 1;
                }
                DimKind::LINE => {
                    selected.insert(self.gen_sys().row(x_row).clone());
                    x_row += 1;
                    if y.dim_kinds()[dim] != DimKind::GEN_VIRTUAL {
                        y_row += 1;
                    }
                }
                DimKind::GEN_VIRTUAL => {
                    if y.dim_kinds()[dim] != DimKind::GEN_VIRTUAL {
                        y_row += 1;
                    }
                }
            }
        }
        selected
    }

    /// The generator widening: parameters whose leading entry moved are
    /// relaxed to lines.
    pub fn generator_widening_assign(
        &mut self,
        y: &Grid,
        mut tokens: Option<&mut u32>,
    ) -> Result<()> {
        self.check_same_dimension(y, "Grid::generator_widening_assign")?;
        debug_assert!(self.contains(y).unwrap_or(true));
        if self.space_dimension() == 0 || self.marked_empty() || y.marked_empty() {
            return Ok(());
        }
        if !self.minimize() {
            return Ok(());
        }
        let Some(y_min) = y.minimized_view() else {
            return Ok(());
        };
        if self.gen_sys().num_rows() > y_min.gen_sys().num_rows() {
            return Ok(());
        }
        if self.gen_sys().num_lines() > y_min.gen_sys().num_lines() {
            return Ok(());
        }
        let selected = self.select_wider_generators(&y_min);
        if selected.num_parameters() == self.gen_sys().num_parameters() {
            return Ok(());
        }
        let result = Grid::from_grid_generators(selected)?;
        self.commit_widening(result, &mut tokens)
    }

    /// The default widening: congruence-based when both congruence
    /// systems are up to date, generator-based when both generator
    /// systems are, congruence-based otherwise.
    pub fn widening_assign(&mut self, y: &Grid, tokens: Option<&mut u32>) -> Result<()> {
        if self.congruences_are_up_to_date() && y.congruences_are_up_to_date() {
            return self.congruence_widening_assign(y, tokens);
        }
        if self.generators_are_up_to_date() && y.generators_are_up_to_date() {
            return self.generator_widening_assign(y, tokens);
        }
        self.congruence_widening_assign(y, tokens)
    }

    /// Congruence widening followed by the reintroduction of the
    /// congruences of `cgs` the receiver satisfies.
    pub fn limited_congruence_extrapolation_assign(
        &mut self,
        y: &Grid,
        cgs: &CongruenceSystem,
        tokens: Option<&mut u32>,
    ) -> Result<()> {
        self.check_same_dimension(y, "Grid::limited_congruence_extrapolation_assign")?;
        self.check_operand_dimension(
            cgs.space_dimension(),
            "Grid::limited_congruence_extrapolation_assign",
        )?;
        if cgs.has_no_rows() {
            return self.congruence_widening_assign(y, tokens);
        }
        let keep = self.limited_selection(cgs)?;
        self.congruence_widening_assign(y, tokens)?;
        self.add_congruences(&keep)
    }

    /// Generator widening followed by the reintroduction of the
    /// congruences of `cgs` the receiver satisfies.
    pub fn limited_generator_extrapolation_assign(
        &mut self,
        y: &Grid,
        cgs: &CongruenceSystem,
        tokens: Option<&mut u32>,
    ) -> Result<()> {
        self.check_same_dimension(y, "Grid::limited_generator_extrapolation_assign")?;
        self.check_operand_dimension(
            cgs.space_dimension(),
            "Grid::limited_generator_extrapolation_assign",
        )?;
        if cgs.has_no_rows() {
            return self.generator_widening_assign(y, tokens);
        }
        let keep = self.limited_selection(cgs)?;
        self.generator_widening_assign(y, tokens)?;
        self.add_congruences(&keep)
    }

    /// Like the limited variants, dispatching to the default widening.
    pub fn limited_extrapolation_assign(
        &mut self,
        y: &Grid,
        cgs: &CongruenceSystem,
        tokens: Option<&mut u32>,
    ) -> Result<()> {
        self.check_same_dimension(y, "Grid::limited_extrapolation_assign")?;
        self.check_operand_dimension(cgs.space_dimension(), "Grid::limited_extrapolation_assign")?;
        if cgs.has_no_rows() {
            return self.widening_assign(y, tokens);
        }
        let keep = self.limited_selection(cgs)?;
        self.widening_assign(y, tokens)?;
        self.add_congruences(&keep)
    }

    fn limited_selection(&self, cgs: &CongruenceSystem) -> Result<CongruenceSystem> {
        let mut keep = CongruenceSystem::with_space_dimension(self.space_dimension());
        for cg in cgs.iter() {
            if self
                .relation_with(cg)?
                .implies(PolyConRelation::IS_INCLUDED)
            {
                keep.insert(cg.clone());
            }
        }
        Ok(keep)
    }

    fn commit_widening(&mut self, result: Grid, tokens: &mut Option<&mut u32>) -> Result<()> {
        if let Some(t) = tokens {
            if **t > 0 {
                if !self.contains(&result)? {
                    **t -= 1;
                }
                return Ok(());
            }
        }
        *self = result;
        debug_assert!(self.ok());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::Rel;
    use hedra_num::Variable;

    fn modular(k: u32) -> Grid {
        // A = 0 (mod 2^k), B = 0 (mod 3).
        let a = Variable(0);
        let b = Variable(1);
        let mut g = Grid::universe(2);
        g.add_congruence(&a.congruent(0, 1 << k)).unwrap();
        g.add_congruence(&b.congruent(0, 3)).unwrap();
        g
    }

    #[test]
    fn congruence_widening_drops_unstable_moduli() {
        // The modulus of A keeps halving: the widening frees A.
        let mut w = modular(1);
        w.congruence_widening_assign(&modular(2), None).unwrap();
        let b = Variable(1);
        let mut expected = Grid::universe(2);
        expected.add_congruence(&b.congruent(0, 3)).unwrap();
        assert_eq!(w, expected);
        // A second step is stable.
        let mut next = w.clone();
        next.congruence_widening_assign(&w, None).unwrap();
        assert_eq!(next, w);
    }

    #[test]
    fn widening_contains_the_receiver() {
        let mut w = modular(1);
        let before = w.clone();
        w.congruence_widening_assign(&modular(3), None).unwrap();
        assert!(w.contains(&before).unwrap());
    }

    #[test]
    fn tokens_delay_grid_widening() {
        let mut w = modular(1);
        let mut tokens = 1;
        w.congruence_widening_assign(&modular(2), Some(&mut tokens))
            .unwrap();
        assert_eq!(tokens, 0);
        assert_eq!(w, modular(1));
        w.congruence_widening_assign(&modular(2), Some(&mut tokens))
            .unwrap();
        assert_ne!(w, modular(1));
    }

    #[test]
    fn generator_widening_relaxes_moving_parameters() {
        let a = Variable(0);
        let b = Variable(1);
        // y: A = 0 (mod 4); x: A = 0 (mod 2); the parameter along A moved.
        let mut y = Grid::universe(2);
        y.add_congruence(&a.congruent(0, 4)).unwrap();
        y.add_congruence(&b.congruent(0, 3)).unwrap();
        let mut x = Grid::universe(2);
        x.add_congruence(&a.congruent(0, 2)).unwrap();
        x.add_congruence(&b.congruent(0, 3)).unwrap();
        x.generator_widening_assign(&y, None).unwrap();
        let mut expected = Grid::universe(2);
        expected.add_congruence(&b.congruent(0, 3)).unwrap();
        assert_eq!(x, expected);
    }

    #[test]
    fn limited_extrapolation_keeps_satisfied_congruences() {
        let a = Variable(0);
        let b = Variable(1);
        let mut cgs = CongruenceSystem::new();
        cgs.insert(a.congruent(0, 1));
        cgs.insert(b.congruent(1, 3));
        let mut w = modular(1);
        w.limited_congruence_extrapolation_assign(&modular(2), &cgs, None)
            .unwrap();
        // A = 0 (mod 1) holds on the receiver (integers) and is added
        // back; B = 1 (mod 3) conflicts and is dropped.
        let mut expected = Grid::universe(2);
        expected.add_congruence(&b.congruent(0, 3)).unwrap();
        expected.add_congruence(&a.congruent(0, 1)).unwrap();
        assert_eq!(w, expected);
    }
}
