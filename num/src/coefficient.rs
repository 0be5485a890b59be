//! The exact integer coefficient type and the handful of in-place helpers
//! the row algorithms lean on.

use num::bigint::Sign;
use num::{BigInt, Integer, One, Zero};

/// Arbitrary-precision signed integer. All polyhedral and grid arithmetic
/// is carried out exactly in this type.
pub type Coefficient = BigInt;

/// Returns the sign of `x` as `-1`, `0` or `1`.
pub fn sgn(x: &Coefficient) -> i32 {
    match x.sign() {
        Sign::Minus => -1,
        Sign::NoSign => 0,
        Sign::Plus => 1,
    }
}

/// `x := -x` without reallocating.
pub fn neg_assign(x: &mut Coefficient) {
    let tmp = std::mem::take(x);
    *x = -tmp;
}

/// `x := gcd(x, y)`. The result is always nonnegative.
pub fn gcd_assign(x: &mut Coefficient, y: &Coefficient) {
    let tmp = std::mem::take(x);
    *x = tmp.gcd(y);
}

/// `x := lcm(x, y)`.
pub fn lcm_assign(x: &mut Coefficient, y: &Coefficient) {
    let tmp = std::mem::take(x);
    *x = tmp.lcm(y);
}

/// `x := x / d`, where `d` is known to divide `x` exactly.
pub fn exact_div_assign(x: &mut Coefficient, d: &Coefficient) {
    debug_assert!(!d.is_zero());
    debug_assert!((&*x % d).is_zero());
    let tmp = std::mem::take(x);
    *x = tmp / d;
}

/// Division rounding toward negative infinity.
pub fn div_floor(x: &Coefficient, d: &Coefficient) -> Coefficient {
    Integer::div_floor(x, d)
}

/// Division rounding toward zero.
pub fn div_trunc(x: &Coefficient, d: &Coefficient) -> Coefficient {
    x / d
}

/// Division rounding toward positive infinity.
pub fn div_ceil(x: &Coefficient, d: &Coefficient) -> Coefficient {
    Integer::div_ceil(x, d)
}

/// Whether `d` divides `x` exactly.
pub fn divides(d: &Coefficient, x: &Coefficient) -> bool {
    !d.is_zero() && (x % d).is_zero()
}

/// The gcd of the absolute values of a slice, or zero for an all-zero slice.
pub fn gcd_of(coeffs: &[Coefficient]) -> Coefficient {
    let mut g = Coefficient::zero();
    for c in coeffs {
        if !c.is_zero() {
            gcd_assign(&mut g, c);
            if g.is_one() {
                break;
            }
        }
    }
    g
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: i64) -> Coefficient {
        Coefficient::from(x)
    }

    #[test]
    fn signs_and_negation() {
        assert_eq!(sgn(&c(-7)), -1);
        assert_eq!(sgn(&c(0)), 0);
        assert_eq!(sgn(&c(3)), 1);
        let mut x = c(5);
        neg_assign(&mut x);
        assert_eq!(x, c(-5));
    }

    #[test]
    fn rounding_directions() {
        assert_eq!(div_floor(&c(-7), &c(2)), c(-4));
        assert_eq!(div_trunc(&c(-7), &c(2)), c(-3));
        assert_eq!(div_ceil(&c(-7), &c(2)), c(-3));
        assert_eq!(div_floor(&c(7), &c(2)), c(3));
        assert_eq!(div_ceil(&c(7), &c(2)), c(4));
    }

    #[test]
    fn gcd_over_slices() {
        assert_eq!(gcd_of(&[c(6), c(-9), c(0)]), c(3));
        assert_eq!(gcd_of(&[c(0), c(0)]), c(0));
        let mut x = c(-4);
        gcd_assign(&mut x, &c(6));
        assert_eq!(x, c(2));
    }

    #[test]
    fn exact_division() {
        let mut x = c(-12);
        exact_div_assign(&mut x, &c(4));
        assert_eq!(x, c(-3));
        assert!(divides(&c(3), &c(-9)));
        assert!(!divides(&c(3), &c(-8)));
    }
}
