//! Inner products between rows, in the three flavors the engines need.
//!
//! The first argument's size must not exceed the second's; missing columns
//! of the shorter row read as zero either way.

use crate::row::LinearRow;
use hedra_num::coefficient::{sgn, Coefficient};
use num::Zero;

/// The plain product over every column of `x`.
pub fn scalar_product(x: &LinearRow, y: &LinearRow) -> Coefficient {
    product_over(x, y, 0, x.size())
}

/// The product ignoring the last column of `x` (its epsilon column).
pub fn reduced_scalar_product(x: &LinearRow, y: &LinearRow) -> Coefficient {
    product_over(x, y, 0, x.size() - 1)
}

/// The product ignoring the inhomogeneous column.
pub fn homogeneous_scalar_product(x: &LinearRow, y: &LinearRow) -> Coefficient {
    product_over(x, y, 1, x.size())
}

pub fn sign(x: &LinearRow, y: &LinearRow) -> i32 {
    sgn(&scalar_product(x, y))
}

pub fn reduced_sign(x: &LinearRow, y: &LinearRow) -> i32 {
    sgn(&reduced_scalar_product(x, y))
}

pub fn homogeneous_sign(x: &LinearRow, y: &LinearRow) -> i32 {
    sgn(&homogeneous_scalar_product(x, y))
}

/// The product sign appropriate to the topology of `x`: the epsilon column
/// of an NNC row only encodes strictness and is left out, while a closed
/// row contributes every column.
pub fn topology_adjusted_sign(x: &LinearRow, y: &LinearRow) -> i32 {
    if x.is_necessarily_closed() {
        sign(x, y)
    } else {
        reduced_sign(x, y)
    }
}

fn product_over(x: &LinearRow, y: &LinearRow, from: usize, to: usize) -> Coefficient {
    let xs = x.as_slice();
    let ys = y.as_slice();
    let mut z = Coefficient::zero();
    for i in from..to.min(ys.len()) {
        z += &xs[i] * &ys[i];
    }
    z
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::{RowKind, Topology};

    fn row(cols: &[i64], topology: Topology) -> LinearRow {
        LinearRow::from_columns(
            cols.iter().map(|&c| Coefficient::from(c)).collect(),
            RowKind::RayOrPointOrInequality,
            topology,
        )
    }

    #[test]
    fn flavors_skip_the_right_columns() {
        let x = row(&[2, 3, -1, 5], Topology::Nnc);
        let y = row(&[1, 1, 1, 1], Topology::Nnc);
        assert_eq!(scalar_product(&x, &y), Coefficient::from(9));
        assert_eq!(reduced_scalar_product(&x, &y), Coefficient::from(4));
        assert_eq!(homogeneous_scalar_product(&x, &y), Coefficient::from(7));
    }

    #[test]
    fn shorter_second_argument_reads_as_zero_padded() {
        let x = row(&[2, 3, 4], Topology::Closed);
        let y = row(&[1, 1], Topology::Closed);
        assert_eq!(scalar_product(&x, &y), Coefficient::from(5));
    }

    #[test]
    fn topology_adjustment() {
        let strict = row(&[0, 1, -1], Topology::Nnc);
        let point = row(&[1, 0, 1], Topology::Nnc);
        // The full product is -1, but the epsilon column of the constraint
        // is not part of the geometric test.
        assert_eq!(sign(&strict, &point), -1);
        assert_eq!(topology_adjusted_sign(&strict, &point), 0);
    }
}
