//! Redundancy removal over a converted system.
//!
//! `simplify` takes one side of a freshly converted double description
//! pair together with its saturation rows (columns indexed by the dual
//! system's rows) and leaves the minimal form: inequalities saturated by
//! every dual row become equalities, the equalities are brought to
//! reduced echelon form, and inequalities whose saturator set is covered
//! by another's are dropped. Saturation rows are kept aligned through
//! every swap and removal.

use crate::engine;
use crate::linear_system::{LinearSystem, SystemRow};
use hedra_num::coefficient::{neg_assign, sgn, Coefficient};
use hedra_util::BitMatrix;
use num::Zero;

pub(crate) fn simplify<R: SystemRow>(sys: &mut LinearSystem<R>, sat: &mut BitMatrix) {
    debug_assert_eq!(sys.num_pending_rows(), 0);
    debug_assert_eq!(sat.num_rows(), sys.num_rows());
    let dual_rows = sat.num_columns();

    // An inequality saturated by every dual row holds with equality on
    // the whole set.
    for i in 0..sys.num_rows() {
        let row = sys.row_mut(i).row_mut();
        if !row.is_line_or_equality() && sat.row(i).count_ones() == 0 {
            row.set_is_line_or_equality();
            row.sign_normalize();
        }
    }

    // Equalities first.
    let mut eq_count = 0;
    for i in 0..sys.num_rows() {
        if sys.row(i).row().is_line_or_equality() {
            sys.swap_rows(i, eq_count);
            sat.swap_rows(i, eq_count);
            eq_count += 1;
        }
    }

    // Gauss elimination with full back-substitution over the equalities.
    let mut eq_rank = 0;
    let num_columns = sys.num_columns();
    for j in 1..num_columns {
        let Some(pivot) = (eq_rank..eq_count).find(|&i| !sys.row(i).row()[j].is_zero()) else {
            continue;
        };
        sys.swap_rows(pivot, eq_rank);
        sat.swap_rows(pivot, eq_rank);
        if sgn(&sys.row(eq_rank).row()[j]) < 0 {
            sys.row_mut(eq_rank).row_mut().negate();
        }
        let eq = sys.row(eq_rank).row().clone();
        let a = eq[j].clone();
        for i in 0..eq_count {
            if i != eq_rank && !sys.row(i).row()[j].is_zero() {
                let mut b = sys.row(i).row()[j].clone();
                neg_assign(&mut b);
                sys.row_mut(i).row_mut().linear_combine(&a, &eq, &b);
            }
        }
        eq_rank += 1;
    }
    // Equalities beyond the rank reduced to nothing; drop them.
    for i in (eq_rank..eq_count).rev() {
        debug_assert!(sys.row(i).row().is_zero());
        sys.remove_row(i);
        sat.remove_row(i);
    }
    let eq_count = eq_rank;

    // Substitute the equalities into the inequalities; the multiplier on
    // each inequality is the positive pivot, so directions are kept, and
    // equalities are saturated by every dual row, so saturation bits are
    // unaffected.
    for e in 0..eq_count {
        let eq = sys.row(e).row().clone();
        let j = (1..num_columns)
            .find(|&j| !eq[j].is_zero())
            .expect("an equality pivot column");
        let a = eq[j].clone();
        for i in eq_count..sys.num_rows() {
            if !sys.row(i).row()[j].is_zero() {
                let mut b = sys.row(i).row()[j].clone();
                neg_assign(&mut b);
                sys.row_mut(i).row_mut().linear_combine(&a, &eq, &b);
            }
        }
    }

    // Quick saturation-count test: a facet of a cone of dimension
    // `num_columns - eq_count` needs at least that many saturators minus
    // one.
    let min_saturators = (num_columns - eq_count).saturating_sub(1);
    let num_rows = sys.num_rows();
    let mut redundant = engine::with_saturator_counts(num_rows, |counts| {
        for i in eq_count..num_rows {
            counts[i] = dual_rows - sat.row(i).count_ones_before(dual_rows);
        }
        let mut redundant = vec![false; num_rows];
        for i in eq_count..num_rows {
            if counts[i] < min_saturators {
                redundant[i] = true;
            }
        }
        redundant
    });

    // General subset test: an inequality whose saturators are covered by
    // another surviving inequality's is redundant; of two rows with the
    // same saturators the first survives.
    for i in eq_count..num_rows {
        if redundant[i] {
            continue;
        }
        for j in eq_count..num_rows {
            if i == j || redundant[j] {
                continue;
            }
            if sat.row(j).is_subset_of(sat.row(i)) {
                let equal = sat.row(i).is_subset_of(sat.row(j));
                if !equal || j < i {
                    redundant[i] = true;
                    break;
                }
            }
        }
    }
    for i in (eq_count..num_rows).rev() {
        if redundant[i] {
            sys.remove_row(i);
            sat.remove_row(i);
        }
    }

    for i in 0..sys.num_rows() {
        sys.row_mut(i).row_mut().strong_normalize();
    }
    sys.set_sorted(false);
    sys.unset_pending_rows();
    log::trace!(
        "simplify: {} rows kept ({} equalities)",
        sys.num_rows(),
        eq_count
    );
}

/// A saturation row recomputed directly from scalar products; used when
/// incremental information is not at hand.
pub(crate) fn saturation_row<A: SystemRow, B: SystemRow>(
    row: &A,
    duals: &LinearSystem<B>,
) -> hedra_util::BitRow {
    let mut bits = hedra_util::BitRow::new();
    for (j, d) in duals.iter().enumerate() {
        if !crate::scalar_products::scalar_product(row.row(), d.row()).is_zero() {
            bits.set(j);
        }
    }
    bits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{ConstraintSystem, Rel};
    use crate::polyhedron::conversion::{conversion, full_space_dest};
    use crate::row::Topology;
    use crate::GeneratorSystem;
    use hedra_num::{LinearExpr, Variable};

    fn minimize_constraints(mut cs: ConstraintSystem) -> ConstraintSystem {
        let (mut gens, lines): (GeneratorSystem, usize) =
            full_space_dest(cs.topology(), cs.num_columns());
        let mut sat = BitMatrix::zeros(gens.num_rows(), 0);
        conversion(&cs, 0, &mut gens, &mut sat, lines, "test").unwrap();
        let mut sat_cons = sat.transpose();
        simplify(&mut cs, &mut sat_cons);
        cs
    }

    #[test]
    fn redundant_inequality_is_dropped() {
        let a = Variable(0);
        let b = Variable(1);
        let mut cs = ConstraintSystem::new(Topology::Closed);
        cs.insert(LinearExpr::from(1).ge(0));
        cs.insert(a.ge(0));
        cs.insert(a.le(1));
        cs.insert(b.ge(0));
        cs.insert(b.le(1));
        cs.insert((a + b).ge(-1));
        let cs = minimize_constraints(cs);
        assert_eq!(cs.num_rows(), 4);
        assert_eq!(cs.num_equalities(), 0);
    }

    #[test]
    fn opposite_inequalities_become_an_equality() {
        let a = Variable(0);
        let mut cs = ConstraintSystem::new(Topology::Closed);
        cs.insert(LinearExpr::from(1).ge(0));
        cs.insert(a.ge(0));
        cs.insert(a.le(0));
        let cs = minimize_constraints(cs);
        // x = 0 plus the positivity witness.
        assert_eq!(cs.num_equalities(), 1);
        assert_eq!(cs.num_rows(), 2);
    }

    #[test]
    fn dependent_equalities_are_reduced() {
        let a = Variable(0);
        let b = Variable(1);
        let mut cs = ConstraintSystem::new(Topology::Closed);
        cs.insert(LinearExpr::from(1).ge(0));
        cs.insert(a.eq(1));
        cs.insert(b.eq(2));
        cs.insert((a + b).eq(3));
        let cs = minimize_constraints(cs);
        assert_eq!(cs.num_equalities(), 2);
        assert_eq!(cs.num_rows(), 3);
        assert!(cs.iter().filter(|c| c.is_equality()).all(|c| {
            let a_coeff = c.coefficient(a);
            let b_coeff = c.coefficient(b);
            // Reduced echelon: each equality mentions exactly one
            // variable.
            (a_coeff.is_zero()) ^ (b_coeff.is_zero())
        }));
    }

    #[test]
    fn duplicate_rows_collapse() {
        let a = Variable(0);
        let mut cs = ConstraintSystem::new(Topology::Closed);
        cs.insert(LinearExpr::from(1).ge(0));
        cs.insert(a.ge(0));
        cs.insert((2 * a).ge(0));
        let cs = minimize_constraints(cs);
        assert_eq!(cs.num_rows(), 2);
    }
}
