//! Incremental double-description conversion.
//!
//! Both directions run through the same code: the source rows are
//! constraints and the destination rows generators, or vice versa. The
//! destination is kept minimal row by row; saturation bits are computed
//! on the fly, with `sat` rows indexed by destination rows and columns by
//! the source rows processed so far.

use crate::engine;
use crate::error::{Error, Result};
use crate::linear_system::{LinearSystem, SystemRow};
use crate::row::{LinearRow, RowKind, Topology};
use crate::scalar_products::scalar_product;
use hedra_num::coefficient::{sgn, Coefficient};
use hedra_util::{BitMatrix, BitRow};
use num::Zero;

/// The generator system of the whole space: one line per homogeneous
/// column plus the origin row, which the positivity constraint will turn
/// into a point.
pub(crate) fn full_space_dest<D: SystemRow>(
    topology: Topology,
    columns: usize,
) -> (LinearSystem<D>, usize) {
    let mut dest = LinearSystem::with_columns(topology, columns);
    for j in 1..columns {
        let mut row = LinearRow::zero(columns, RowKind::LineOrEquality, topology);
        row[j] = Coefficient::from(1);
        dest.add_row(D::from_row(row));
    }
    let mut origin = LinearRow::zero(columns, RowKind::RayOrPointOrInequality, topology);
    origin[0] = Coefficient::from(1);
    dest.add_row(D::from_row(origin));
    (dest, columns - 1)
}

/// The constraint system of the origin cone: every column constrained to
/// zero. Processing generators relaxes it into the dual of their span.
pub(crate) fn zero_cone_dest<D: SystemRow>(
    topology: Topology,
    columns: usize,
) -> (LinearSystem<D>, usize) {
    let mut dest = LinearSystem::with_columns(topology, columns);
    for j in 0..columns {
        let mut row = LinearRow::zero(columns, RowKind::LineOrEquality, topology);
        row[j] = Coefficient::from(1);
        dest.add_row(D::from_row(row));
    }
    (dest, columns)
}

/// Processes the source rows `[start, source.num_rows())` into `dest`,
/// Chernikova-style. Returns the updated count of lines (or equalities)
/// leading `dest`.
///
/// On entry, `dest` must describe the dual of the source prefix
/// `[0, start)`, with its lines or equalities in positions
/// `[0, num_lines)` and `sat` consistent with that prefix.
pub(crate) fn conversion<S: SystemRow, D: SystemRow>(
    source: &LinearSystem<S>,
    start: usize,
    dest: &mut LinearSystem<D>,
    sat: &mut BitMatrix,
    mut num_lines: usize,
    op: &'static str,
) -> Result<usize> {
    debug_assert_eq!(source.num_columns(), dest.num_columns());
    debug_assert_eq!(sat.num_rows(), dest.num_rows());

    for k in start..source.num_rows() {
        if engine::deadline_expired() {
            return Err(Error::Timeout { op });
        }
        let src = source.row(k).row();
        let src_is_eq = src.is_line_or_equality();
        let mut sp: Vec<Coefficient> = dest
            .iter()
            .map(|d| scalar_product(src, d.row()))
            .collect();

        if let Some(li) = sp[..num_lines].iter().position(|s| !s.is_zero()) {
            // A line does not saturate the new row: it is demoted to a ray
            // (or dropped for an equality) and used to make every other
            // row saturate.
            num_lines -= 1;
            dest.swap_rows(li, num_lines);
            sat.swap_rows(li, num_lines);
            sp.swap(li, num_lines);
            let nle = num_lines;
            if sgn(&sp[nle]) < 0 {
                dest.row_mut(nle).row_mut().negate();
                hedra_num::coefficient::neg_assign(&mut sp[nle]);
            }
            let pivot = dest.row(nle).row().clone();
            let pivot_sp = sp[nle].clone();
            for i in 0..dest.num_rows() {
                if i != nle && !sp[i].is_zero() {
                    let b = -&sp[i];
                    dest.row_mut(i).row_mut().linear_combine(&pivot_sp, &pivot, &b);
                    sp[i] = Coefficient::zero();
                }
            }
            if src_is_eq {
                dest.remove_row(nle);
                sat.remove_row(nle);
            } else {
                dest.row_mut(nle)
                    .row_mut()
                    .set_is_ray_or_point_or_inequality();
                sat.row_mut(nle).set(k);
            }
        } else {
            // Every line saturates: partition the remaining rows by sign.
            let mut pos = Vec::new();
            let mut neg = Vec::new();
            for i in num_lines..dest.num_rows() {
                match sgn(&sp[i]) {
                    1 => pos.push(i),
                    -1 => neg.push(i),
                    _ => {}
                }
            }
            // Combine adjacent pairs across the new hyperplane.
            let mut new_rows: Vec<(LinearRow, BitRow)> = Vec::new();
            for (&p, &n) in itertools::iproduct!(&pos, &neg) {
                if !adjacent(sat, p, n, num_lines) {
                    continue;
                }
                let mut row = dest.row(p).row().clone();
                let a = -&sp[n];
                row.linear_combine(&a, dest.row(n).row(), &sp[p]);
                let mut sat_row = BitRow::new();
                sat_row.union_assign(sat.row(p), sat.row(n));
                new_rows.push((row, sat_row));
            }
            if !src_is_eq {
                for &p in &pos {
                    sat.row_mut(p).set(k);
                }
            }
            let mut to_remove = neg;
            if src_is_eq {
                to_remove.extend_from_slice(&pos);
                to_remove.sort_unstable();
            }
            for &i in to_remove.iter().rev() {
                dest.remove_row(i);
                sat.remove_row(i);
            }
            for (row, sat_row) in new_rows {
                dest.add_row(D::from_row(row));
                sat.push_row(sat_row);
            }
        }
        sat.set_num_columns(k + 1);
    }
    log::trace!(
        "conversion: {} source rows -> {} dest rows, {} lines",
        source.num_rows(),
        dest.num_rows(),
        num_lines
    );
    Ok(num_lines)
}

/// Whether the rays `p` and `n` are adjacent: no other ray saturates
/// every processed source row the two of them saturate together.
fn adjacent(sat: &BitMatrix, p: usize, n: usize, num_lines: usize) -> bool {
    let mut union = BitRow::new();
    union.union_assign(sat.row(p), sat.row(n));
    for h in num_lines..sat.num_rows() {
        if h != p && h != n && sat.row(h).is_subset_of(&union) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{Constraint, ConstraintSystem, Rel};
    use crate::generator::{Generator, GeneratorSystem};
    use hedra_num::{LinearExpr, Variable};

    fn positivity() -> Constraint {
        LinearExpr::from(1).ge(0)
    }

    fn convert_constraints(cs: &ConstraintSystem) -> (GeneratorSystem, BitMatrix, usize) {
        let (mut dest, lines) = full_space_dest(cs.topology(), cs.num_columns());
        let mut sat = BitMatrix::zeros(dest.num_rows(), 0);
        let lines = conversion(cs, 0, &mut dest, &mut sat, lines, "test").unwrap();
        (dest, sat, lines)
    }

    #[test]
    fn halfplane_generators() {
        let a = Variable(0);
        let b = Variable(1);
        let mut cs = ConstraintSystem::new(crate::Topology::Closed);
        cs.insert(positivity());
        cs.insert((a + 0 * b).ge(0));
        let (gens, _, lines) = convert_constraints(&cs);
        // {A >= 0} in 2D: a line along B, a ray along A and the origin.
        assert_eq!(lines, 1);
        assert!(gens.has_points());
        assert_eq!(gens.num_lines(), 1);
        assert_eq!(gens.num_rays(), 1);
    }

    #[test]
    fn unit_square_has_four_vertices() {
        let a = Variable(0);
        let b = Variable(1);
        let mut cs = ConstraintSystem::new(crate::Topology::Closed);
        cs.insert(positivity());
        cs.insert(a.ge(0));
        cs.insert(a.le(1));
        cs.insert(b.ge(0));
        cs.insert(b.le(1));
        let (gens, sat, lines) = convert_constraints(&cs);
        assert_eq!(lines, 0);
        assert_eq!(gens.num_rows(), 4);
        assert!(gens.iter().all(Generator::is_point));
        // Each vertex saturates two of the four facets and violates the
        // other two plus the positivity row.
        for i in 0..4 {
            assert_eq!(sat.row(i).count_ones(), 3);
        }
    }

    #[test]
    fn contradictory_constraints_leave_no_point() {
        let a = Variable(0);
        let mut cs = ConstraintSystem::new(crate::Topology::Closed);
        cs.insert(positivity());
        cs.insert(a.ge(1));
        cs.insert(a.le(0));
        let (gens, _, _) = convert_constraints(&cs);
        assert!(!gens.has_points());
    }

    #[test]
    fn equality_cuts_the_lineality_space() {
        let a = Variable(0);
        let b = Variable(1);
        let mut cs = ConstraintSystem::new(crate::Topology::Closed);
        cs.insert(positivity());
        cs.insert(a.eq(b));
        let (gens, _, lines) = convert_constraints(&cs);
        assert_eq!(lines, 1);
        assert_eq!(gens.num_lines(), 1);
        assert!(gens.has_points());
        // The surviving line is the diagonal.
        let line = gens.iter().find(|g| g.is_line()).unwrap();
        assert_eq!(line.coefficient(a), line.coefficient(b));
    }

    #[test]
    fn generators_to_constraints_round() {
        let a = Variable(0);
        let mut gs = GeneratorSystem::new(crate::Topology::Closed);
        gs.insert(Generator::point(LinearExpr::new(), 1));
        gs.insert(Generator::point(a, 1));
        let (mut dest, lines) = zero_cone_dest(gs.topology(), gs.num_columns());
        let mut sat = BitMatrix::zeros(dest.num_rows(), 0);
        let lines = conversion(&gs, 0, &mut dest, &mut sat, lines, "test").unwrap();
        // The segment [0, 1]: inequalities only.
        assert_eq!(lines, 0);
        let cs: &ConstraintSystem = &dest;
        assert_eq!(cs.num_equalities(), 0);
        assert!(cs.num_rows() >= 2);
    }
}
