//! Echelon reduction of congruence and grid generator systems.
//!
//! Congruences are reduced by their leading (highest) dimension, working
//! downwards; proper congruences are first scaled to a common modulus and
//! each pivot is folded with the implicit trivial row `m * x_d = 0
//! (mod m)`, so that the pivot coefficient always divides the modulus.
//! Generators are reduced by their first (lowest) dimension, working
//! upwards, with extra points turned into parameters against the base
//! point. Both reductions fill the shared `dim_kinds` vector.

use super::DimKind;
use crate::congruence::{Congruence, CongruenceSystem};
use crate::grid_generator::{GridGenerator, GridGeneratorKind, GridGeneratorSystem};
use hedra_num::coefficient::{self, div_floor, sgn, Coefficient};
use num::{Integer, One, Signed, Zero};

/// A congruence system in echelon form over a common modulus.
#[derive(Clone, Debug)]
pub(crate) struct CongruenceEchelon {
    /// Pivot rows in decreasing leading dimension; columns `[b, a_1..a_n]`.
    pub rows: Vec<EchelonRow>,
    /// The common modulus of the proper rows; zero when all are
    /// equalities.
    pub modulus: Coefficient,
    pub dim_kinds: Vec<DimKind>,
    pub space_dim: usize,
}

#[derive(Clone, Debug)]
pub(crate) struct EchelonRow {
    pub cols: Vec<Coefficient>,
    pub leading: usize,
    pub is_equality: bool,
}

impl CongruenceEchelon {
    /// The echelon rows as a normalized public system.
    pub fn to_congruence_system(&self) -> CongruenceSystem {
        let mut cgs = CongruenceSystem::with_space_dimension(self.space_dim);
        for row in &self.rows {
            let modulus = if row.is_equality {
                Coefficient::zero()
            } else {
                self.modulus.clone()
            };
            cgs.insert(Congruence::from_columns(row.cols.clone(), modulus));
        }
        cgs
    }
}

/// The highest nonzero column index, if any.
fn leading(cols: &[Coefficient]) -> Option<usize> {
    (0..cols.len()).rev().find(|&j| !cols[j].is_zero())
}

/// The lowest nonzero column index at or above 1, if any.
fn first_dim(cols: &[Coefficient]) -> Option<usize> {
    (1..cols.len()).find(|&j| !cols[j].is_zero())
}

/// Replaces `a` with the gcd combination of `a` and `b` at column `dim`
/// and returns the eliminated remainder, whose `dim` column is zero. The
/// transformation is unimodular, so the generated module (or lattice) is
/// preserved.
fn combine_at(a: &mut [Coefficient], b: &[Coefficient], dim: usize) -> Vec<Coefficient> {
    let ext = a[dim].extended_gcd(&b[dim]);
    let a_over_g = &a[dim] / &ext.gcd;
    let b_over_g = &b[dim] / &ext.gcd;
    let mut remainder = vec![Coefficient::zero(); a.len()];
    for j in 0..a.len() {
        let new_a = &ext.x * &a[j] + &ext.y * &b[j];
        remainder[j] = &b_over_g * &a[j] - &a_over_g * &b[j];
        a[j] = new_a;
    }
    debug_assert!(remainder[dim].is_zero());
    remainder
}

/// Brings `cgs` to echelon form. `None` means the system is
/// unsatisfiable.
pub(crate) fn echelon_congruences(
    cgs: &CongruenceSystem,
    space_dim: usize,
) -> Option<CongruenceEchelon> {
    let n = space_dim;
    let width = n + 1;
    let pad = |cg: &Congruence| {
        let mut cols = cg.as_slice().to_vec();
        cols.resize(width, Coefficient::zero());
        cols
    };
    let mut modulus = Coefficient::zero();
    for cg in cgs.iter() {
        if cg.is_proper_congruence() {
            if modulus.is_zero() {
                modulus = cg.modulus().clone();
            } else {
                coefficient::lcm_assign(&mut modulus, cg.modulus());
            }
        }
    }
    let mut eqs: Vec<Vec<Coefficient>> = Vec::new();
    let mut pcs: Vec<Vec<Coefficient>> = Vec::new();
    for cg in cgs.iter() {
        let mut cols = pad(cg);
        if cg.is_equality() {
            eqs.push(cols);
        } else {
            let scale = &modulus / cg.modulus();
            if !scale.is_one() {
                for c in &mut cols {
                    *c *= &scale;
                }
            }
            pcs.push(cols);
        }
    }

    let mut rows: Vec<EchelonRow> = Vec::new();
    let mut dim_kinds = vec![DimKind::ConVirtual; width];
    dim_kinds[0] = DimKind::ProperCongruence;

    for dim in (1..=n).rev() {
        // Equality pivot first: equalities subsume congruences on their
        // dimension.
        let mut eq_pivot: Option<Vec<Coefficient>> = None;
        let mut i = 0;
        while i < eqs.len() {
            match leading(&eqs[i]) {
                Some(l) if l == dim => {
                    let row = eqs.swap_remove(i);
                    match &mut eq_pivot {
                        None => eq_pivot = Some(row),
                        Some(p) => {
                            let remainder = combine_at(p, &row, dim);
                            if leading(&remainder).is_some() {
                                eqs.push(remainder);
                            }
                        }
                    }
                }
                Some(_) => i += 1,
                None => {
                    eqs.swap_remove(i);
                }
            }
        }
        if let Some(mut p) = eq_pivot {
            if sgn(&p[dim]) < 0 {
                for c in &mut p {
                    coefficient::neg_assign(c);
                }
            }
            // Eliminate the dimension from the proper congruences; a
            // congruence may need scaling first, which scales the common
            // modulus with it.
            let mut j = 0;
            while j < pcs.len() {
                if leading(&pcs[j]) == Some(dim) {
                    let mut row = pcs.swap_remove(j);
                    let g = p[dim].gcd(&row[dim]);
                    let k = &p[dim] / &g;
                    if !k.is_one() {
                        for r in pcs.iter_mut().chain(std::iter::once(&mut row)) {
                            for c in r.iter_mut() {
                                *c *= &k;
                            }
                        }
                        for r in rows.iter_mut().filter(|r| !r.is_equality) {
                            for c in r.cols.iter_mut() {
                                *c *= &k;
                            }
                        }
                        modulus *= &k;
                    }
                    let factor = &row[dim] / &p[dim];
                    for (c, pc) in row.iter_mut().zip(&p) {
                        *c -= &factor * pc;
                    }
                    debug_assert!(row[dim].is_zero());
                    if leading(&row).is_some() {
                        pcs.push(row);
                    }
                } else {
                    j += 1;
                }
            }
            dim_kinds[dim] = DimKind::Equality;
            rows.push(EchelonRow {
                cols: p,
                leading: dim,
                is_equality: true,
            });
            continue;
        }
        // Proper congruence pivot.
        let mut pc_pivot: Option<Vec<Coefficient>> = None;
        let mut i = 0;
        while i < pcs.len() {
            match leading(&pcs[i]) {
                Some(l) if l == dim => {
                    let row = pcs.swap_remove(i);
                    match &mut pc_pivot {
                        None => pc_pivot = Some(row),
                        Some(p) => {
                            let remainder = combine_at(p, &row, dim);
                            if leading(&remainder).is_some() {
                                pcs.push(remainder);
                            }
                        }
                    }
                }
                Some(_) => i += 1,
                None => {
                    pcs.swap_remove(i);
                }
            }
        }
        if let Some(mut p) = pc_pivot {
            debug_assert!(sgn(&modulus) > 0);
            // Fold with the trivial row m*x_dim = 0 (mod m): the pivot
            // coefficient becomes gcd(a, m), which divides the modulus,
            // and the eliminated remainder drops to lower dimensions.
            let ext = p[dim].extended_gcd(&modulus);
            if ext.gcd != p[dim] {
                let m_over_g = &modulus / &ext.gcd;
                let mut remainder = vec![Coefficient::zero(); width];
                for j in 0..width {
                    remainder[j] = &m_over_g * &p[j];
                    p[j] = &ext.x * &p[j];
                }
                p[dim] = ext.gcd.clone();
                remainder[dim] = Coefficient::zero();
                if leading(&remainder).is_some() {
                    pcs.push(remainder);
                }
            }
            if p[dim] == modulus {
                // The dimension itself is unconstrained; only the lower
                // part of the row carries information.
                p[dim] = Coefficient::zero();
                if leading(&p).is_some() {
                    pcs.push(p);
                }
            } else {
                if sgn(&p[dim]) < 0 {
                    for c in &mut p {
                        coefficient::neg_assign(c);
                    }
                }
                dim_kinds[dim] = DimKind::ProperCongruence;
                rows.push(EchelonRow {
                    cols: p,
                    leading: dim,
                    is_equality: false,
                });
            }
        }
    }

    // Leftovers touch only the inhomogeneous column: consistency checks.
    for row in &eqs {
        if !row[0].is_zero() {
            return None;
        }
    }
    for row in &pcs {
        if !row[0].mod_floor(&modulus).is_zero() {
            return None;
        }
    }
    Some(CongruenceEchelon {
        rows,
        modulus,
        dim_kinds,
        space_dim: n,
    })
}

/// A grid generator system in echelon form over a common divisor.
#[derive(Clone, Debug)]
pub(crate) struct GeneratorEchelon {
    /// Columns `[D, p_1..p_n]` of the base point.
    pub point: Vec<Coefficient>,
    /// Parameter and line rows in increasing first dimension; column 0 is
    /// unused.
    pub rows: Vec<GenEchelonRow>,
    /// The divisor shared by the point and the parameters.
    pub divisor: Coefficient,
    pub dim_kinds: Vec<DimKind>,
    pub space_dim: usize,
}

#[derive(Clone, Debug)]
pub(crate) struct GenEchelonRow {
    pub cols: Vec<Coefficient>,
    pub dim: usize,
    pub is_line: bool,
}

impl GeneratorEchelon {
    /// The echelon rows as a normalized public system.
    pub fn to_generator_system(&self) -> GridGeneratorSystem {
        let mut ggs = GridGeneratorSystem::with_space_dimension(self.space_dim);
        let mut point = self.point.clone();
        point[0] = self.divisor.clone();
        ggs.insert(GridGenerator::from_parts(GridGeneratorKind::Point, point));
        for row in &self.rows {
            let mut cols = row.cols.clone();
            let kind = if row.is_line {
                cols[0] = Coefficient::zero();
                GridGeneratorKind::Line
            } else {
                cols[0] = self.divisor.clone();
                GridGeneratorKind::Parameter
            };
            ggs.insert(GridGenerator::from_parts(kind, cols));
        }
        ggs
    }
}

/// Brings `ggs` to echelon form. `None` means the system spans nothing
/// (no point).
pub(crate) fn echelon_generators(
    ggs: &GridGeneratorSystem,
    space_dim: usize,
) -> Option<GeneratorEchelon> {
    let n = space_dim;
    let width = n + 1;
    if !ggs.has_points() {
        return None;
    }
    // Bring points and parameters to a common divisor.
    let mut divisor = Coefficient::one();
    for g in ggs.iter() {
        if !g.is_line() {
            coefficient::lcm_assign(&mut divisor, g.divisor());
        }
    }
    let scaled = |g: &GridGenerator, divisor: &Coefficient| {
        let mut cols = g.as_slice().to_vec();
        cols.resize(width, Coefficient::zero());
        if !g.is_line() {
            let scale = divisor / g.divisor();
            if !scale.is_one() {
                for c in cols.iter_mut() {
                    *c *= &scale;
                }
            }
        }
        cols[0] = Coefficient::zero();
        cols
    };
    let mut point: Option<Vec<Coefficient>> = None;
    let mut params: Vec<Vec<Coefficient>> = Vec::new();
    let mut lines: Vec<Vec<Coefficient>> = Vec::new();
    for g in ggs.iter() {
        let cols = scaled(g, &divisor);
        match g.kind() {
            GridGeneratorKind::Point => match &point {
                None => point = Some(cols),
                Some(base) => {
                    // The difference of two grid points is a period.
                    let mut diff = cols;
                    for (d, b) in diff.iter_mut().zip(base) {
                        *d -= b;
                    }
                    params.push(diff);
                }
            },
            GridGeneratorKind::Parameter => params.push(cols),
            GridGeneratorKind::Line => lines.push(cols),
        }
    }
    let mut point = point.expect("checked above");

    let mut rows: Vec<GenEchelonRow> = Vec::new();
    let mut dim_kinds = vec![DimKind::GEN_VIRTUAL; width];
    dim_kinds[0] = DimKind::ProperCongruence;

    for dim in 1..=n {
        // A line pivot frees the dimension entirely.
        let mut line_pivot: Option<Vec<Coefficient>> = None;
        let mut i = 0;
        while i < lines.len() {
            match first_dim(&lines[i]) {
                Some(f) if f == dim => {
                    let row = lines.swap_remove(i);
                    match &mut line_pivot {
                        None => line_pivot = Some(row),
                        Some(p) => {
                            let remainder = combine_at(p, &row, dim);
                            if first_dim(&remainder).is_some() {
                                lines.push(remainder);
                            }
                        }
                    }
                }
                Some(_) => i += 1,
                None => {
                    lines.swap_remove(i);
                }
            }
        }
        if let Some(pivot) = line_pivot {
            // Use the line to clear the dimension from the parameters and
            // the point; the rational shift is made integral by scaling
            // the whole system.
            let mut j = 0;
            while j < params.len() {
                if first_dim(&params[j]) == Some(dim) {
                    let mut row = params.swap_remove(j);
                    let g = pivot[dim].gcd(&row[dim]);
                    let k = (&pivot[dim] / &g).abs();
                    if !k.is_one() {
                        rescale(&mut point, &mut params, &mut rows, &mut divisor, &k);
                        for c in row.iter_mut() {
                            *c *= &k;
                        }
                    }
                    let factor = &row[dim] / &pivot[dim];
                    for (c, pc) in row.iter_mut().zip(&pivot) {
                        *c -= &factor * pc;
                    }
                    if first_dim(&row).is_some() {
                        params.push(row);
                    }
                } else {
                    j += 1;
                }
            }
            // Strong reduction of the point along the line.
            if !point[dim].is_zero() {
                let g = pivot[dim].gcd(&point[dim]);
                let k = (&pivot[dim] / &g).abs();
                if !k.is_one() {
                    rescale(&mut point, &mut params, &mut rows, &mut divisor, &k);
                }
                let factor = &point[dim] / &pivot[dim];
                for (c, pc) in point.iter_mut().zip(&pivot) {
                    *c -= &factor * pc;
                }
            }
            dim_kinds[dim] = DimKind::LINE;
            rows.push(GenEchelonRow {
                cols: pivot,
                dim,
                is_line: true,
            });
            continue;
        }
        let mut param_pivot: Option<Vec<Coefficient>> = None;
        let mut i = 0;
        while i < params.len() {
            match first_dim(&params[i]) {
                Some(f) if f == dim => {
                    let row = params.swap_remove(i);
                    match &mut param_pivot {
                        None => param_pivot = Some(row),
                        Some(p) => {
                            let remainder = combine_at(p, &row, dim);
                            if first_dim(&remainder).is_some() {
                                params.push(remainder);
                            }
                        }
                    }
                }
                Some(_) => i += 1,
                None => {
                    params.swap_remove(i);
                }
            }
        }
        if let Some(mut pivot) = param_pivot {
            if sgn(&pivot[dim]) < 0 {
                for c in pivot.iter_mut() {
                    coefficient::neg_assign(c);
                }
            }
            // Strong reduction: shift the base point into the fundamental
            // cell of this parameter.
            if !point[dim].is_zero() {
                let shift = div_floor(&point[dim], &pivot[dim]);
                if !shift.is_zero() {
                    for (c, pc) in point.iter_mut().zip(&pivot) {
                        *c -= &shift * pc;
                    }
                }
            }
            dim_kinds[dim] = DimKind::PARAMETER;
            rows.push(GenEchelonRow {
                cols: pivot,
                dim,
                is_line: false,
            });
        }
    }

    Some(GeneratorEchelon {
        point,
        rows,
        divisor,
        dim_kinds,
        space_dim: n,
    })
}

/// Multiplies the point, every parameter and the common divisor by `k`,
/// leaving the represented vectors unchanged.
fn rescale(
    point: &mut [Coefficient],
    pending_params: &mut [Vec<Coefficient>],
    rows: &mut [GenEchelonRow],
    divisor: &mut Coefficient,
    k: &Coefficient,
) {
    for c in point.iter_mut() {
        *c *= k;
    }
    for row in pending_params.iter_mut() {
        for c in row.iter_mut() {
            *c *= k;
        }
    }
    for row in rows.iter_mut().filter(|r| !r.is_line) {
        for c in row.cols.iter_mut() {
            *c *= k;
        }
    }
    *divisor *= k;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::Rel;
    use hedra_num::{LinearExpr, Variable};

    #[test]
    fn congruence_echelon_of_a_plain_lattice() {
        let a = Variable(0);
        let b = Variable(1);
        let mut cgs = CongruenceSystem::new();
        cgs.insert(a.congruent(0, 4));
        cgs.insert(b.congruent(0, 2));
        let ech = echelon_congruences(&cgs, 2).unwrap();
        assert_eq!(ech.modulus, Coefficient::from(4));
        assert_eq!(ech.dim_kinds[1], DimKind::ProperCongruence);
        assert_eq!(ech.dim_kinds[2], DimKind::ProperCongruence);
        assert_eq!(ech.rows.len(), 2);
        // Rows are ordered by decreasing leading dimension.
        assert_eq!(ech.rows[0].leading, 2);
        assert_eq!(ech.rows[1].leading, 1);
    }

    #[test]
    fn equalities_subsume_congruences() {
        let a = Variable(0);
        let mut cgs = CongruenceSystem::new();
        cgs.insert(a.congruent(0, 0));
        cgs.insert(a.congruent(0, 3));
        let ech = echelon_congruences(&cgs, 1).unwrap();
        assert_eq!(ech.dim_kinds[1], DimKind::Equality);
        assert_eq!(ech.rows.len(), 1);
    }

    #[test]
    fn inconsistent_congruences_are_detected() {
        let a = Variable(0);
        let mut cgs = CongruenceSystem::new();
        cgs.insert((2 * a).congruent(0, 0));
        cgs.insert((2 * a).congruent(1, 0));
        assert!(echelon_congruences(&cgs, 1).is_none());

        let mut cgs = CongruenceSystem::new();
        cgs.insert(a.congruent(0, 2));
        cgs.insert(a.congruent(1, 2));
        // x = 0 (mod 2) and x = 1 (mod 2) force 1 = 0 (mod 2).
        assert!(echelon_congruences(&cgs, 1).is_none());
    }

    #[test]
    fn combined_congruences_tighten_the_modulus() {
        let a = Variable(0);
        let mut cgs = CongruenceSystem::new();
        cgs.insert((2 * a).congruent(0, 4));
        let ech = echelon_congruences(&cgs, 1).unwrap();
        // 2A = 0 (mod 4) means A = 0 (mod 2): pivot 2 out of modulus 4.
        assert_eq!(ech.rows.len(), 1);
        assert_eq!(ech.rows[0].cols[1], Coefficient::from(2));
        assert_eq!(ech.modulus, Coefficient::from(4));
    }

    #[test]
    fn generator_echelon_merges_points_into_parameters() {
        let a = Variable(0);
        let mut ggs = GridGeneratorSystem::new();
        ggs.insert(GridGenerator::grid_point(LinearExpr::new(), 1));
        ggs.insert(GridGenerator::grid_point(3 * a, 1));
        let ech = echelon_generators(&ggs, 1).unwrap();
        assert_eq!(ech.dim_kinds[1], DimKind::PARAMETER);
        assert_eq!(ech.rows.len(), 1);
        assert_eq!(ech.rows[0].cols[1], Coefficient::from(3));
    }

    #[test]
    fn lines_absorb_parameters() {
        let a = Variable(0);
        let mut ggs = GridGeneratorSystem::new();
        ggs.insert(GridGenerator::grid_point(LinearExpr::new(), 1));
        ggs.insert(GridGenerator::grid_line(a));
        ggs.insert(GridGenerator::parameter(2 * a, 1));
        let ech = echelon_generators(&ggs, 1).unwrap();
        assert_eq!(ech.dim_kinds[1], DimKind::LINE);
        assert_eq!(ech.rows.len(), 1);
        assert!(ech.rows[0].is_line);
    }

    #[test]
    fn pointless_systems_are_rejected() {
        let a = Variable(0);
        let mut ggs = GridGeneratorSystem::new();
        ggs.insert(GridGenerator::grid_line(a));
        assert!(echelon_generators(&ggs, 1).is_none());
    }
}
