//! Affine forms over [`Coefficient`].

use crate::coefficient::{self, Coefficient};
use crate::variable::Variable;
use num::{One, Signed, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// The affine form `a_0*x_0 + ... + a_{n-1}*x_{n-1} + b`, stored densely by
/// column: column 0 holds the inhomogeneous term `b`, column `i + 1` the
/// coefficient of `Variable(i)`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LinearExpr {
    row: Vec<Coefficient>,
}

impl PartialEq for LinearExpr {
    fn eq(&self, other: &Self) -> bool {
        let columns = self.row.len().max(other.row.len());
        let zero = Coefficient::zero();
        (0..columns).all(|i| {
            self.row.get(i).unwrap_or(&zero) == other.row.get(i).unwrap_or(&zero)
        })
    }
}

impl Eq for LinearExpr {}

impl Default for LinearExpr {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearExpr {
    /// The zero expression in a zero-dimensional space.
    pub fn new() -> Self {
        Self {
            row: vec![Coefficient::zero()],
        }
    }

    /// The zero expression mentioning dimensions up to `space_dim`.
    pub fn with_space_dimension(space_dim: usize) -> Self {
        Self {
            row: vec![Coefficient::zero(); space_dim + 1],
        }
    }

    /// Number of space dimensions, i.e. columns minus the inhomogeneous one.
    pub fn space_dimension(&self) -> usize {
        self.row.len() - 1
    }

    /// The columns `[b, a_0, ..., a_{n-1}]`.
    pub fn as_slice(&self) -> &[Coefficient] {
        &self.row
    }

    /// The coefficient of `v`, zero when `v` lies beyond this expression.
    pub fn coefficient(&self, v: Variable) -> Coefficient {
        self.row.get(v.id() + 1).cloned().unwrap_or_else(Coefficient::zero)
    }

    /// The inhomogeneous term `b`.
    pub fn inhomogeneous_term(&self) -> &Coefficient {
        &self.row[0]
    }

    /// Overwrites the coefficient of `v`, growing the expression if needed.
    pub fn set_coefficient(&mut self, v: Variable, c: Coefficient) {
        self.grow(v.id() + 2);
        self.row[v.id() + 1] = c;
    }

    /// Overwrites the inhomogeneous term.
    pub fn set_inhomogeneous_term(&mut self, c: Coefficient) {
        self.row[0] = c;
    }

    /// Adds `c * v` to `self`.
    pub fn add_mul_assign(&mut self, c: &Coefficient, v: Variable) {
        self.grow(v.id() + 2);
        self.row[v.id() + 1] += c;
    }

    /// Whether every column, the inhomogeneous one included, is zero.
    pub fn is_zero(&self) -> bool {
        self.row.iter().all(Zero::is_zero)
    }

    /// Whether every variable coefficient is zero.
    pub fn all_homogeneous_terms_are_zero(&self) -> bool {
        self.row[1..].iter().all(Zero::is_zero)
    }

    /// Builds an expression from raw columns; `columns[0]` is the
    /// inhomogeneous term.
    pub fn from_columns(columns: Vec<Coefficient>) -> Self {
        let mut e = Self { row: columns };
        if e.row.is_empty() {
            e.row.push(Coefficient::zero());
        }
        e
    }

    fn grow(&mut self, columns: usize) {
        if self.row.len() < columns {
            self.row.resize(columns, Coefficient::zero());
        }
    }
}

impl From<Variable> for LinearExpr {
    fn from(v: Variable) -> Self {
        let mut e = Self::with_space_dimension(v.space_dimension());
        e.row[v.id() + 1] = Coefficient::one();
        e
    }
}

impl From<Coefficient> for LinearExpr {
    fn from(b: Coefficient) -> Self {
        Self { row: vec![b] }
    }
}

impl From<i64> for LinearExpr {
    fn from(b: i64) -> Self {
        Self {
            row: vec![Coefficient::from(b)],
        }
    }
}

impl AddAssign<LinearExpr> for LinearExpr {
    fn add_assign(&mut self, rhs: LinearExpr) {
        self.grow(rhs.row.len());
        for (l, r) in self.row.iter_mut().zip(rhs.row) {
            *l += r;
        }
    }
}

impl SubAssign<LinearExpr> for LinearExpr {
    fn sub_assign(&mut self, rhs: LinearExpr) {
        self.grow(rhs.row.len());
        for (l, r) in self.row.iter_mut().zip(rhs.row) {
            *l -= r;
        }
    }
}

impl<T: Into<LinearExpr>> Add<T> for LinearExpr {
    type Output = LinearExpr;

    fn add(mut self, rhs: T) -> LinearExpr {
        self += rhs.into();
        self
    }
}

impl<T: Into<LinearExpr>> Sub<T> for LinearExpr {
    type Output = LinearExpr;

    fn sub(mut self, rhs: T) -> LinearExpr {
        self -= rhs.into();
        self
    }
}

impl Neg for LinearExpr {
    type Output = LinearExpr;

    fn neg(mut self) -> LinearExpr {
        for c in &mut self.row {
            coefficient::neg_assign(c);
        }
        self
    }
}

impl Mul<Coefficient> for LinearExpr {
    type Output = LinearExpr;

    fn mul(mut self, rhs: Coefficient) -> LinearExpr {
        for c in &mut self.row {
            *c *= &rhs;
        }
        self
    }
}

impl Mul<i64> for LinearExpr {
    type Output = LinearExpr;

    fn mul(self, rhs: i64) -> LinearExpr {
        self * Coefficient::from(rhs)
    }
}

impl Mul<LinearExpr> for Coefficient {
    type Output = LinearExpr;

    fn mul(self, rhs: LinearExpr) -> LinearExpr {
        rhs * self
    }
}

impl Mul<LinearExpr> for i64 {
    type Output = LinearExpr;

    fn mul(self, rhs: LinearExpr) -> LinearExpr {
        rhs * Coefficient::from(self)
    }
}

impl Mul<Variable> for i64 {
    type Output = LinearExpr;

    fn mul(self, rhs: Variable) -> LinearExpr {
        LinearExpr::from(rhs) * Coefficient::from(self)
    }
}

impl Mul<Variable> for Coefficient {
    type Output = LinearExpr;

    fn mul(self, rhs: Variable) -> LinearExpr {
        LinearExpr::from(rhs) * self
    }
}

impl<T: Into<LinearExpr>> Add<T> for Variable {
    type Output = LinearExpr;

    fn add(self, rhs: T) -> LinearExpr {
        LinearExpr::from(self) + rhs.into()
    }
}

impl<T: Into<LinearExpr>> Sub<T> for Variable {
    type Output = LinearExpr;

    fn sub(self, rhs: T) -> LinearExpr {
        LinearExpr::from(self) - rhs.into()
    }
}

impl Neg for Variable {
    type Output = LinearExpr;

    fn neg(self) -> LinearExpr {
        -LinearExpr::from(self)
    }
}

impl fmt::Display for LinearExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (i, a) in self.row[1..].iter().enumerate() {
            if a.is_zero() {
                continue;
            }
            let v = Variable(i);
            if first {
                first = false;
                if a.is_one() {
                    write!(f, "{v}")?;
                } else if (-a).is_one() {
                    write!(f, "-{v}")?;
                } else {
                    write!(f, "{a}*{v}")?;
                }
            } else {
                let abs = a.abs();
                let op = if a.is_negative() { '-' } else { '+' };
                if abs.is_one() {
                    write!(f, " {op} {v}")?;
                } else {
                    write!(f, " {op} {abs}*{v}")?;
                }
            }
        }
        let b = &self.row[0];
        if first {
            write!(f, "{b}")
        } else if b.is_positive() {
            write!(f, " + {b}")
        } else if b.is_negative() {
            write!(f, " - {}", b.abs())
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_affine_forms() {
        let a = Variable(0);
        let b = Variable(1);
        let e = 3 * a - b + 2;
        assert_eq!(e.coefficient(a), Coefficient::from(3));
        assert_eq!(e.coefficient(b), Coefficient::from(-1));
        assert_eq!(*e.inhomogeneous_term(), Coefficient::from(2));
        assert_eq!(e.space_dimension(), 2);
    }

    #[test]
    fn coefficients_beyond_the_form_are_zero() {
        let e = LinearExpr::from(Variable(0));
        assert_eq!(e.coefficient(Variable(7)), Coefficient::zero());
    }

    #[test]
    fn negation_and_scaling() {
        let a = Variable(0);
        let e = -(2 * a + 1);
        assert_eq!(e.coefficient(a), Coefficient::from(-2));
        assert_eq!(*e.inhomogeneous_term(), Coefficient::from(-1));
        let e = e * -3;
        assert_eq!(e.coefficient(a), Coefficient::from(6));
    }

    #[test]
    fn equality_ignores_trailing_zero_columns() {
        let a = Variable(0);
        let padded = a + 0 * Variable(3);
        assert_eq!(padded, LinearExpr::from(a));
        assert_ne!(a + 0 * Variable(3) + 1, LinearExpr::from(a));
    }

    #[test]
    fn display_matches_canonical_text() {
        let a = Variable(0);
        let b = Variable(1);
        assert_eq!((a + 2 * b).to_string(), "A + 2*B");
        assert_eq!((a - b - 3).to_string(), "A - B - 3");
        assert_eq!((-(Variable(2)) + 1).to_string(), "-C + 1");
        assert_eq!(LinearExpr::new().to_string(), "0");
    }
}
