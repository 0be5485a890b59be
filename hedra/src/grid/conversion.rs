//! Conversion between the two grid representations.
//!
//! Both echelon forms are triangular when the virtual dimensions are read
//! as unit rows, so each direction is a rational triangular solve: the
//! generators are scaled columns of the inverse of the congruence matrix
//! and vice versa.

use super::simplify::{CongruenceEchelon, EchelonRow, GenEchelonRow, GeneratorEchelon};
use super::DimKind;
use hedra_num::coefficient::{lcm_assign, Coefficient};
use num::{BigRational, One, Signed, Zero};

/// Clears denominators: the integer vector and the positive scale `s`
/// with `integer = s * rational`.
fn clear_denominators(v: &[BigRational]) -> (Vec<Coefficient>, Coefficient) {
    let mut scale = Coefficient::one();
    for r in v {
        lcm_assign(&mut scale, r.denom());
    }
    let ints = v
        .iter()
        .map(|r| {
            let scaled = r * BigRational::from_integer(scale.clone());
            debug_assert!(scaled.is_integer());
            scaled.to_integer()
        })
        .collect();
    (ints, scale)
}

/// The generator echelon dual to a congruence echelon.
///
/// The congruence rows, the unit rows of the virtual dimensions and the
/// homogenizer row form a lower-triangular matrix `C`; writing a point as
/// `X = [1, x]`, membership reads `C X = y` with `y_0 = 1`, `y_d = 0` on
/// equality rows, `y_d` a multiple of the modulus on proper rows and
/// `y_d` free on virtual rows. The point, parameters and lines are the
/// correspondingly scaled columns of `C^{-1}`.
pub(crate) fn congruences_to_generators(ech: &CongruenceEchelon) -> GeneratorEchelon {
    let n = ech.space_dim;
    let width = n + 1;
    // Assemble the triangular matrix: row `d` is the pivot with leading
    // dimension `d`, or a unit row.
    let mut matrix: Vec<Vec<Coefficient>> = Vec::with_capacity(width);
    for d in 0..width {
        let mut unit = vec![Coefficient::zero(); width];
        unit[d] = Coefficient::one();
        matrix.push(unit);
    }
    for row in &ech.rows {
        matrix[row.leading] = row.cols.clone();
    }

    // Forward substitution: solve C y = e_k for each needed k.
    let solve = |k: usize| -> Vec<BigRational> {
        let mut y = vec![BigRational::zero(); width];
        for i in 0..width {
            let mut acc = if i == k {
                BigRational::one()
            } else {
                BigRational::zero()
            };
            for j in 0..i {
                if !matrix[i][j].is_zero() {
                    acc -= BigRational::from_integer(matrix[i][j].clone()) * &y[j];
                }
            }
            y[i] = acc / BigRational::from_integer(matrix[i][i].clone());
        }
        y
    };

    // The base point.
    let point_rat = solve(0);
    debug_assert!(point_rat[0].is_one());
    let (point_cols, divisor) = clear_denominators(&point_rat);
    let mut point = point_cols;
    point[0] = Coefficient::zero();

    let mut echelon = GeneratorEchelon {
        point,
        rows: Vec::new(),
        divisor,
        dim_kinds: ech.dim_kinds.clone(),
        space_dim: n,
    };

    for d in 1..=n {
        match ech.dim_kinds[d] {
            DimKind::Equality => {}
            DimKind::ConVirtual => {
                // A free dimension: the column is a line.
                let y = solve(d);
                let (mut cols, _) = clear_denominators(&y);
                debug_assert!(cols[0].is_zero());
                cols[0] = Coefficient::zero();
                echelon.rows.push(GenEchelonRow {
                    cols,
                    dim: d,
                    is_line: true,
                });
            }
            DimKind::ProperCongruence => {
                // A modular dimension: the column scaled by the modulus is
                // the minimal period.
                let y = solve(d);
                let m = BigRational::from_integer(ech.modulus.clone());
                let scaled: Vec<BigRational> = y.iter().map(|r| r * &m).collect();
                let (cols, s) = clear_denominators(&scaled);
                // Rescale the whole system so the parameter shares the
                // common divisor.
                let mut cols = cols;
                if s != echelon.divisor {
                    let lcm = {
                        let mut l = s.clone();
                        lcm_assign(&mut l, &echelon.divisor);
                        l
                    };
                    let point_scale = &lcm / &echelon.divisor;
                    if !point_scale.is_one() {
                        for c in echelon.point.iter_mut() {
                            *c *= &point_scale;
                        }
                        for row in echelon.rows.iter_mut().filter(|r| !r.is_line) {
                            for c in row.cols.iter_mut() {
                                *c *= &point_scale;
                            }
                        }
                        echelon.divisor = lcm.clone();
                    }
                    let row_scale = &lcm / &s;
                    if !row_scale.is_one() {
                        for c in cols.iter_mut() {
                            *c *= &row_scale;
                        }
                    }
                }
                cols[0] = Coefficient::zero();
                echelon.rows.push(GenEchelonRow {
                    cols,
                    dim: d,
                    is_line: false,
                });
            }
        }
    }
    echelon
}

/// The congruence echelon dual to a generator echelon.
///
/// The point row, the parameter and line rows and the unit rows of the
/// generator-virtual dimensions form an upper-triangular matrix `B`; the
/// congruences are the scaled columns of `B^{-1}`: an equality for every
/// virtual dimension, a proper congruence for every parameter.
pub(crate) fn generators_to_congruences(ech: &GeneratorEchelon) -> CongruenceEchelon {
    let n = ech.space_dim;
    let width = n + 1;
    let mut matrix: Vec<Vec<Coefficient>> = Vec::with_capacity(width);
    for d in 0..width {
        matrix.push({
            let mut unit = vec![Coefficient::zero(); width];
            unit[d] = Coefficient::one();
            unit
        });
    }
    matrix[0] = {
        let mut row = ech.point.clone();
        row[0] = ech.divisor.clone();
        row
    };
    for row in &ech.rows {
        matrix[row.dim] = row.cols.clone();
        matrix[row.dim][0] = Coefficient::zero();
        if !row.is_line {
            // Parameter rows participate with their raw columns; the
            // shared divisor is reintroduced through the final scaling.
            debug_assert!(!row.cols[row.dim].is_zero());
        }
    }

    // Back substitution: solve B y = e_k.
    let solve = |k: usize| -> Vec<BigRational> {
        let mut y = vec![BigRational::zero(); width];
        for i in (0..width).rev() {
            let mut acc = if i == k {
                BigRational::one()
            } else {
                BigRational::zero()
            };
            for j in (i + 1)..width {
                if !matrix[i][j].is_zero() {
                    acc -= BigRational::from_integer(matrix[i][j].clone()) * &y[j];
                }
            }
            y[i] = acc / BigRational::from_integer(matrix[i][i].clone());
        }
        y
    };

    let mut rows: Vec<EchelonRow> = Vec::new();
    let mut modulus = Coefficient::zero();
    let divisor = BigRational::from_integer(ech.divisor.clone());
    // First pass: determine the common modulus across parameters.
    let mut pending: Vec<(usize, Vec<Coefficient>, Coefficient, bool)> = Vec::new();
    for d in (1..=n).rev() {
        match ech.dim_kinds[d] {
            DimKind::ConVirtual => {}
            DimKind::Equality => {
                // No generator spans this dimension: an exact constraint.
                let y = solve(d);
                let scaled: Vec<BigRational> = y.iter().map(|r| r * &divisor).collect();
                let (cols, _) = clear_denominators(&scaled);
                pending.push((d, cols, Coefficient::zero(), true));
            }
            DimKind::ProperCongruence => {
                let y = solve(d);
                // The lattice coordinate z_d = y . (D X) is integral on
                // grid points: scale y to integer columns; the scale is
                // the modulus of the resulting congruence.
                let scaled: Vec<BigRational> = y.iter().map(|r| r * &divisor).collect();
                let (cols, s) = clear_denominators(&scaled);
                if modulus.is_zero() {
                    modulus = s.clone();
                } else {
                    lcm_assign(&mut modulus, &s);
                }
                pending.push((d, cols, s, false));
            }
        }
    }
    // Second pass: bring every proper congruence to the common modulus.
    for (d, mut cols, s, is_equality) in pending {
        if !is_equality && s != modulus {
            let scale = &modulus / &s;
            for c in cols.iter_mut() {
                *c *= &scale;
            }
        }
        rows.push(EchelonRow {
            cols,
            leading: d,
            is_equality,
        });
    }
    CongruenceEchelon {
        rows,
        modulus,
        dim_kinds: ech.dim_kinds.clone(),
        space_dim: n,
    }
}

#[cfg(test)]
mod tests {
    use super::super::simplify::{echelon_congruences, echelon_generators};
    use super::*;
    use crate::congruence::CongruenceSystem;
    use crate::constraint::Rel;
    use crate::grid_generator::{GridGenerator, GridGeneratorSystem};
    use hedra_num::Variable;

    #[test]
    fn lattice_congruences_to_generators() {
        let a = Variable(0);
        let b = Variable(1);
        let mut cgs = CongruenceSystem::new();
        cgs.insert(a.congruent(0, 4));
        cgs.insert(b.congruent(0, 2));
        let ech = echelon_congruences(&cgs, 2).unwrap();
        let gens = congruences_to_generators(&ech);
        let ggs = gens.to_generator_system();
        assert!(ggs.has_points());
        assert_eq!(ggs.num_parameters(), 2);
        assert_eq!(ggs.num_lines(), 0);
        // The periods are 4 along A and 2 along B.
        let steps: Vec<Coefficient> = ggs
            .iter()
            .filter(|g| g.is_parameter())
            .map(|g| {
                let nonzero: Vec<Coefficient> = (0..2)
                    .map(|i| g.coefficient(Variable(i)))
                    .filter(|c| !c.is_zero())
                    .collect();
                assert_eq!(nonzero.len(), 1);
                &nonzero[0] / g.divisor()
            })
            .collect();
        assert!(steps.contains(&Coefficient::from(4)));
        assert!(steps.contains(&Coefficient::from(2)));
    }

    #[test]
    fn generators_to_congruences_round_trip() {
        let a = Variable(0);
        let b = Variable(1);
        let mut ggs = GridGeneratorSystem::new();
        ggs.insert(GridGenerator::grid_point(3 * a, 1));
        ggs.insert(GridGenerator::parameter(4 * a, 1));
        ggs.insert(GridGenerator::grid_line(b));
        let ech = echelon_generators(&ggs, 2).unwrap();
        let cgs_ech = generators_to_congruences(&ech);
        let cgs = cgs_ech.to_congruence_system();
        // A = 3 (mod 4) and nothing about B.
        assert_eq!(cgs.num_rows(), 1);
        let cg = cgs.row(0);
        assert!(cg.is_proper_congruence());
        assert_eq!(*cg.modulus(), Coefficient::from(4));
        assert_eq!(cg.coefficient(a), Coefficient::from(1));
        assert_eq!(*cg.inhomogeneous_term(), Coefficient::from(1));
    }

    #[test]
    fn equalities_come_back_as_virtual_generator_dimensions() {
        let a = Variable(0);
        let b = Variable(1);
        let mut cgs = CongruenceSystem::new();
        cgs.insert(a.congruent(7, 0));
        cgs.insert(b.congruent(0, 3));
        let ech = echelon_congruences(&cgs, 2).unwrap();
        let gens = congruences_to_generators(&ech);
        assert_eq!(gens.dim_kinds[1], DimKind::Equality);
        let ggs = gens.to_generator_system();
        assert_eq!(ggs.num_parameters(), 1);
        assert_eq!(ggs.num_lines(), 0);
        // The base point pins A = 7.
        let point = ggs.iter().find(|g| g.is_point()).unwrap();
        assert_eq!(point.coefficient(a), Coefficient::from(7));
        assert_eq!(*point.divisor(), Coefficient::from(1));

        let back = generators_to_congruences(&echelon_generators(&ggs, 2).unwrap());
        let back_cgs = back.to_congruence_system();
        assert_eq!(back_cgs.num_equalities(), 1);
        assert_eq!(back_cgs.num_proper_congruences(), 1);
    }

    #[test]
    fn fractional_points_round_trip() {
        // The grid { 1/2 + 3Z }.
        let a = Variable(0);
        let mut ggs = GridGeneratorSystem::new();
        ggs.insert(GridGenerator::grid_point(a, 2));
        ggs.insert(GridGenerator::parameter(3 * a, 1));
        let ech = echelon_generators(&ggs, 1).unwrap();
        let cgs = generators_to_congruences(&ech).to_congruence_system();
        assert_eq!(cgs.num_rows(), 1);
        let cg = cgs.row(0);
        // 2A = 1 (mod 6).
        assert_eq!(cg.coefficient(a), Coefficient::from(2));
        assert_eq!(*cg.modulus(), Coefficient::from(6));
    }
}
