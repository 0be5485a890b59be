//! Textual dump and load of the grid state.

use super::{DimKind, Grid, GridStatus};
use crate::ascii::Tokens;
use crate::congruence::{Congruence, CongruenceSystem};
use crate::error::Result;
use crate::grid_generator::{GridGenerator, GridGeneratorKind, GridGeneratorSystem};
use anyhow::{anyhow, bail};
use hedra_num::Coefficient;
use num::Zero;
use std::io::Write;

const STATUS_TOKENS: [(GridStatus, &str); 6] = [
    (GridStatus::ZERO_DIM_UNIV, "ZE"),
    (GridStatus::EMPTY, "EM"),
    (GridStatus::C_UP_TO_DATE, "CS"),
    (GridStatus::G_UP_TO_DATE, "GS"),
    (GridStatus::C_MINIMIZED, "CM"),
    (GridStatus::G_MINIMIZED, "GM"),
];

impl Grid {
    /// Writes the complete internal state.
    pub fn ascii_dump<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        let width = self.space_dimension() + 1;
        writeln!(w, "space_dim {}", self.space_dimension())?;
        let mut first = true;
        for (flag, token) in STATUS_TOKENS {
            if !first {
                write!(w, " ")?;
            }
            first = false;
            let sign = if self.status().contains(flag) { '+' } else { '-' };
            write!(w, "{sign}{token}")?;
        }
        writeln!(w)?;
        write!(w, "dim_kinds {}", self.dim_kinds().len())?;
        for kind in self.dim_kinds() {
            let token = match kind {
                DimKind::Equality => "E",
                DimKind::ProperCongruence => "P",
                DimKind::ConVirtual => "V",
            };
            write!(w, " {token}")?;
        }
        writeln!(w)?;
        writeln!(w, "con_sys {}", self.con_sys().num_rows())?;
        for cg in self.con_sys().iter() {
            for j in 0..width {
                let zero = Coefficient::zero();
                let c = cg.as_slice().get(j).unwrap_or(&zero);
                write!(w, "{c} ")?;
            }
            writeln!(w, "m {}", cg.modulus())?;
        }
        writeln!(w, "gen_sys {}", self.gen_sys().num_rows())?;
        for g in self.gen_sys().iter() {
            let tag = match g.kind() {
                GridGeneratorKind::Point => "P",
                GridGeneratorKind::Parameter => "Q",
                GridGeneratorKind::Line => "L",
            };
            write!(w, "{tag}")?;
            for j in 0..width {
                let zero = Coefficient::zero();
                let c = g.as_slice().get(j).unwrap_or(&zero);
                write!(w, " {c}")?;
            }
            writeln!(w)?;
        }
        Ok(())
    }

    /// The dump as a string.
    pub fn ascii_dump_string(&self) -> String {
        let mut buf = Vec::new();
        self.ascii_dump(&mut buf).expect("writing to a vector");
        String::from_utf8(buf).expect("the dump is ascii")
    }

    /// Replaces `self` with the state parsed from `input`; on failure
    /// `self` is untouched.
    pub fn ascii_load(&mut self, input: &str) -> Result<()> {
        let loaded = Self::parse_dump(input)?;
        if !loaded.ok() {
            return Err(crate::error::Error::MalformedInput(anyhow!(
                "the loaded grid fails the consistency check"
            )));
        }
        *self = loaded;
        Ok(())
    }

    fn parse_dump(input: &str) -> Result<Grid> {
        let mut t = Tokens::new(input);
        let mut inner = || -> anyhow::Result<Grid> {
            t.expect("space_dim")?;
            let space_dim: usize = t.parse()?;
            let width = space_dim + 1;
            let mut status = GridStatus::empty();
            for (flag, token) in STATUS_TOKENS {
                let tok = t.next_token()?;
                if &tok[1..] != token {
                    bail!("expected status token `{token}`, found `{tok}`");
                }
                match tok.chars().next() {
                    Some('+') => status.insert(flag),
                    Some('-') => {}
                    other => bail!("invalid status sign {other:?}"),
                }
            }
            t.expect("dim_kinds")?;
            let num_kinds: usize = t.parse()?;
            let mut dim_kinds = Vec::with_capacity(num_kinds);
            for _ in 0..num_kinds {
                dim_kinds.push(match t.next_token()? {
                    "E" => DimKind::Equality,
                    "P" => DimKind::ProperCongruence,
                    "V" => DimKind::ConVirtual,
                    other => bail!("invalid dimension kind `{other}`"),
                });
            }
            t.expect("con_sys")?;
            let num_cgs: usize = t.parse()?;
            let mut con_sys = CongruenceSystem::with_space_dimension(space_dim);
            for _ in 0..num_cgs {
                let mut cols = Vec::with_capacity(width);
                for _ in 0..width {
                    cols.push(t.coefficient()?);
                }
                t.expect("m")?;
                let modulus = t.coefficient()?;
                con_sys.insert(Congruence::from_columns(cols, modulus));
            }
            t.expect("gen_sys")?;
            let num_ggs: usize = t.parse()?;
            let mut gen_sys = GridGeneratorSystem::with_space_dimension(space_dim);
            for _ in 0..num_ggs {
                let kind = match t.next_token()? {
                    "P" => GridGeneratorKind::Point,
                    "Q" => GridGeneratorKind::Parameter,
                    "L" => GridGeneratorKind::Line,
                    other => bail!("invalid grid generator kind `{other}`"),
                };
                let mut cols = Vec::with_capacity(width);
                for _ in 0..width {
                    cols.push(t.coefficient()?);
                }
                if kind != GridGeneratorKind::Line && cols[0].is_zero() {
                    bail!("a grid point or parameter needs a positive divisor");
                }
                gen_sys.insert(GridGenerator::from_parts(kind, cols));
            }
            let mut grid = Grid::empty(space_dim);
            grid.set_con_sys(con_sys);
            grid.set_gen_sys(gen_sys);
            grid.set_dim_kinds(dim_kinds);
            grid.set_status(status);
            Ok(grid)
        };
        Ok(inner()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::Rel;
    use hedra_num::Variable;

    fn lattice() -> Grid {
        let a = Variable(0);
        let b = Variable(1);
        let mut g = Grid::universe(2);
        g.add_congruence(&a.congruent(3, 4)).unwrap();
        g.add_congruence(&b.congruent(0, 2)).unwrap();
        g
    }

    #[test]
    fn round_trip() {
        for g in [
            lattice(),
            Grid::universe(0),
            Grid::universe(3),
            Grid::empty(2),
        ] {
            let mut loaded = Grid::universe(1);
            loaded.ascii_load(&g.ascii_dump_string()).unwrap();
            assert_eq!(g, loaded);
            assert_eq!(g.ascii_dump_string(), loaded.ascii_dump_string());
        }
    }

    #[test]
    fn round_trip_minimized() {
        let mut g = lattice();
        g.minimize();
        let mut loaded = Grid::universe(1);
        loaded.ascii_load(&g.ascii_dump_string()).unwrap();
        assert!(loaded.congruences_are_minimized());
        assert_eq!(g, loaded);
    }

    #[test]
    fn rejects_garbage() {
        let mut g = lattice();
        let before = g.clone();
        assert!(g.ascii_load("grid 2").is_err());
        let dump = g.ascii_dump_string();
        assert!(g.ascii_load(&dump[..dump.len() - 8]).is_err());
        assert_eq!(g, before);
    }

    #[test]
    fn rejects_inconsistent_states() {
        let g = lattice();
        // Claim generators are up to date while the system has no point.
        let dump = g.ascii_dump_string().replace("-GS", "+GS");
        let mut loaded = Grid::universe(1);
        assert!(loaded.ascii_load(&dump).is_err());
    }
}
