//! Textual dump and load of the complete double-description state.
//!
//! The format is line-oriented but parsed by whitespace tokens:
//!
//! ```text
//! space_dim 2
//! -ZE -EM +CM +GM +CS +GS -CP -GP +SC +SG
//! con_sys (up-to-date)
//! NECESSARILY_CLOSED 3 x 3 not_sorted index_first_pending 3
//! 1 0 0 >=
//! ...
//! gen_sys (up-to-date)
//! ...
//! sat_c
//! 4 x 3
//! 011
//! ...
//! sat_g
//! ...
//! ```
//!
//! Each row lists its coefficients followed by a kind marker: `=`, `>=`
//! or `>` for constraints, `L`, `R`, `P` or `C` for generators. A load
//! that fails for any reason, including a final consistency check, leaves
//! the destination untouched.

use super::status::Status;
use super::Polyhedron;
use crate::ascii::Tokens;
use crate::constraint::Constraint;
use crate::error::Result;
use crate::generator::{Generator, GeneratorKind};
use crate::linear_system::{LinearSystem, SystemRow};
use crate::row::{LinearRow, RowKind, Topology};
use anyhow::{anyhow, bail};
use hedra_util::BitMatrix;
use std::io::Write;

fn topology_token(t: Topology) -> &'static str {
    match t {
        Topology::Closed => "NECESSARILY_CLOSED",
        Topology::Nnc => "NOT_NECESSARILY_CLOSED",
    }
}

fn parse_topology(tok: &str) -> anyhow::Result<Topology> {
    match tok {
        "NECESSARILY_CLOSED" => Ok(Topology::Closed),
        "NOT_NECESSARILY_CLOSED" => Ok(Topology::Nnc),
        other => Err(anyhow!("unknown topology `{other}`")),
    }
}

fn dump_system<R: SystemRow, W: Write>(
    w: &mut W,
    sys: &LinearSystem<R>,
    marker: impl Fn(&R) -> &'static str,
) -> std::io::Result<()> {
    writeln!(
        w,
        "{} {} x {} {} index_first_pending {}",
        topology_token(sys.topology()),
        sys.num_rows(),
        sys.num_columns(),
        if sys.is_sorted() { "sorted" } else { "not_sorted" },
        sys.first_pending_row(),
    )?;
    for r in sys.iter() {
        for c in r.row().as_slice() {
            write!(w, "{c} ")?;
        }
        writeln!(w, "{}", marker(r))?;
    }
    Ok(())
}

fn load_system<R: SystemRow>(
    t: &mut Tokens<'_>,
    kind_of_marker: impl Fn(&str, Topology) -> anyhow::Result<RowKind>,
) -> anyhow::Result<LinearSystem<R>> {
    let topology = parse_topology(t.next_token()?)?;
    let num_rows: usize = t.parse()?;
    t.expect("x")?;
    let num_columns: usize = t.parse()?;
    let sorted = match t.next_token()? {
        "sorted" => true,
        "not_sorted" => false,
        other => bail!("expected a sortedness flag, found `{other}`"),
    };
    t.expect("index_first_pending")?;
    let first_pending: usize = t.parse()?;
    if first_pending > num_rows {
        bail!("index_first_pending exceeds the row count");
    }
    let mut sys = LinearSystem::with_columns(topology, num_columns);
    for i in 0..num_rows {
        let mut coeffs = Vec::with_capacity(num_columns);
        for _ in 0..num_columns {
            coeffs.push(t.coefficient()?);
        }
        let kind = kind_of_marker(t.next_token()?, topology)?;
        let row = LinearRow::from_columns(coeffs, kind, topology);
        if i < first_pending {
            sys.add_row(R::from_row(row));
        } else {
            sys.add_pending_row(R::from_row(row));
        }
    }
    sys.set_sorted(sorted);
    Ok(sys)
}

fn dump_sat<W: Write>(w: &mut W, sat: &BitMatrix) -> std::io::Result<()> {
    writeln!(w, "{} x {}", sat.num_rows(), sat.num_columns())?;
    for i in 0..sat.num_rows() {
        for j in 0..sat.num_columns() {
            write!(w, "{}", u8::from(sat.get(i, j)))?;
        }
        writeln!(w)?;
    }
    Ok(())
}

fn load_sat(t: &mut Tokens<'_>) -> anyhow::Result<BitMatrix> {
    let num_rows: usize = t.parse()?;
    t.expect("x")?;
    let num_columns: usize = t.parse()?;
    let mut sat = BitMatrix::zeros(num_rows, num_columns);
    if num_columns > 0 {
        for i in 0..num_rows {
            let bits = t.next_token()?;
            if bits.len() != num_columns {
                bail!("bit row of width {} instead of {num_columns}", bits.len());
            }
            for (j, ch) in bits.chars().enumerate() {
                match ch {
                    '0' => {}
                    '1' => sat.set(i, j),
                    other => bail!("invalid bit `{other}`"),
                }
            }
        }
    }
    Ok(sat)
}

impl Polyhedron {
    /// Writes the complete internal state.
    pub fn ascii_dump<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        writeln!(w, "space_dim {}", self.space_dimension())?;
        let mut first = true;
        for (flag, token) in super::status::TOKENS {
            if !first {
                write!(w, " ")?;
            }
            first = false;
            let sign = if self.status().contains(flag) { '+' } else { '-' };
            write!(w, "{sign}{token}")?;
        }
        writeln!(w)?;
        writeln!(
            w,
            "con_sys ({}up-to-date)",
            if self.constraints_are_up_to_date() { "" } else { "not_" },
        )?;
        dump_system(w, self.con_sys(), |c| match c.kind() {
            crate::constraint::ConstraintKind::Equality => "=",
            crate::constraint::ConstraintKind::NonstrictInequality => ">=",
            crate::constraint::ConstraintKind::StrictInequality => ">",
        })?;
        writeln!(
            w,
            "gen_sys ({}up-to-date)",
            if self.generators_are_up_to_date() { "" } else { "not_" },
        )?;
        dump_system(w, self.gen_sys(), |g| match g.kind() {
            GeneratorKind::Line => "L",
            GeneratorKind::Ray => "R",
            GeneratorKind::Point => "P",
            GeneratorKind::ClosurePoint => "C",
        })?;
        writeln!(w, "sat_c")?;
        dump_sat(w, self.sat_c())?;
        writeln!(w, "sat_g")?;
        dump_sat(w, self.sat_g())?;
        Ok(())
    }

    /// The dump as a string.
    pub fn ascii_dump_string(&self) -> String {
        let mut buf = Vec::new();
        self.ascii_dump(&mut buf).expect("writing to a vector");
        String::from_utf8(buf).expect("the dump is ascii")
    }

    /// Replaces `self` with the state parsed from `input`. Rejects input
    /// that does not start with the `space_dim` token or that would leave
    /// the object in an inconsistent state; on failure `self` is
    /// untouched.
    pub fn ascii_load(&mut self, input: &str) -> Result<()> {
        let loaded = Self::parse_dump(input)?;
        if !loaded.ok() {
            return Err(crate::error::Error::MalformedInput(anyhow!(
                "the loaded state fails the consistency check"
            )));
        }
        *self = loaded;
        Ok(())
    }

    fn parse_dump(input: &str) -> Result<Polyhedron> {
        let mut t = Tokens::new(input);
        let mut inner = || -> anyhow::Result<Polyhedron> {
            t.expect("space_dim")?;
            let space_dim: usize = t.parse()?;
            let mut status = Status::empty();
            for (flag, token) in super::status::TOKENS {
                let tok = t.next_token()?;
                let Some(sign) = tok.chars().next() else {
                    bail!("empty status token");
                };
                if &tok[1..] != token {
                    bail!("expected status token `{token}`, found `{tok}`");
                }
                match sign {
                    '+' => status.insert(flag),
                    '-' => {}
                    other => bail!("invalid status sign `{other}`"),
                }
            }
            t.expect("con_sys")?;
            let tok = t.next_token()?;
            if tok != "(up-to-date)" && tok != "(not_up-to-date)" {
                bail!("invalid con_sys header `{tok}`");
            }
            let con_sys = load_system::<Constraint>(&mut t, |m, topology| match m {
                "=" => Ok(RowKind::LineOrEquality),
                ">=" => Ok(RowKind::RayOrPointOrInequality),
                ">" if topology == Topology::Nnc => Ok(RowKind::RayOrPointOrInequality),
                other => Err(anyhow!("invalid constraint marker `{other}`")),
            })?;
            t.expect("gen_sys")?;
            let tok = t.next_token()?;
            if tok != "(up-to-date)" && tok != "(not_up-to-date)" {
                bail!("invalid gen_sys header `{tok}`");
            }
            let gen_sys = load_system::<Generator>(&mut t, |m, topology| match m {
                "L" => Ok(RowKind::LineOrEquality),
                "R" | "P" => Ok(RowKind::RayOrPointOrInequality),
                "C" if topology == Topology::Nnc => Ok(RowKind::RayOrPointOrInequality),
                other => Err(anyhow!("invalid generator marker `{other}`")),
            })?;
            if con_sys.topology() != gen_sys.topology() {
                bail!("constraint and generator topologies disagree");
            }
            t.expect("sat_c")?;
            let sat_c = load_sat(&mut t)?;
            t.expect("sat_g")?;
            let sat_g = load_sat(&mut t)?;
            let topology = con_sys.topology();
            let mut ph = Polyhedron::empty(topology, space_dim);
            ph.con_sys = con_sys;
            ph.gen_sys = gen_sys;
            ph.sat_c = sat_c;
            ph.sat_g = sat_g;
            ph.set_status(status);
            Ok(ph)
        };
        Ok(inner()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::Rel;
    use hedra_num::Variable;

    fn strip() -> Polyhedron {
        let a = Variable(0);
        let b = Variable(1);
        let mut p = Polyhedron::universe(Topology::Closed, 2);
        p.add_constraint((a + b).ge(1)).unwrap();
        p.add_constraint(a.le(5)).unwrap();
        p
    }

    #[test]
    fn round_trip_lazy_state() {
        let p = strip();
        let dump = p.ascii_dump_string();
        let mut q = Polyhedron::universe(Topology::Closed, 7);
        q.ascii_load(&dump).unwrap();
        assert_eq!(p, q);
        assert_eq!(dump, q.ascii_dump_string());
    }

    #[test]
    fn round_trip_minimized_state() {
        let mut p = strip();
        p.minimize().unwrap();
        let dump = p.ascii_dump_string();
        let mut q = Polyhedron::empty(Topology::Closed, 0);
        q.ascii_load(&dump).unwrap();
        assert!(q.constraints_are_minimized());
        assert!(q.sat_c_is_up_to_date());
        assert_eq!(p, q);
    }

    #[test]
    fn round_trip_trivial_states() {
        for p in [
            Polyhedron::universe(Topology::Closed, 0),
            Polyhedron::empty(Topology::Nnc, 3),
            Polyhedron::universe(Topology::Nnc, 2),
        ] {
            let mut q = Polyhedron::universe(Topology::Closed, 1);
            q.ascii_load(&p.ascii_dump_string()).unwrap();
            assert_eq!(p, q);
        }
    }

    #[test]
    fn rejects_garbage_without_mutating() {
        let mut p = strip();
        let before = p.clone();
        assert!(p.ascii_load("not_a_dump 3").is_err());
        assert!(p.ascii_load("").is_err());
        // A truncated dump fails too.
        let dump = p.ascii_dump_string();
        assert!(p.ascii_load(&dump[..dump.len() / 2]).is_err());
        assert_eq!(p, before);
    }

    #[test]
    fn rejects_inconsistent_states() {
        let p = strip();
        // Claim minimized generators while the generator system is empty.
        let dump = p
            .ascii_dump_string()
            .replace("-GM", "+GM")
            .replace("-GS", "+GS");
        let mut q = strip();
        let before = q.clone();
        assert!(q.ascii_load(&dump).is_err());
        assert_eq!(q, before);
    }
}
