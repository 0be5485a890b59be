//! Affine transfer functions.

use super::status::Status;
use super::Polyhedron;
use crate::constraint::{Rel, RelSymbol};
use crate::error::{Error, Result};
use crate::generator::Generator;
use crate::linear_system::SystemRow;
use hedra_num::coefficient::{neg_assign, sgn, Coefficient};
use hedra_num::{LinearExpr, Variable};
use num::Zero;

impl Polyhedron {
    /// `self := { x[v := (expr . x) / denominator] : x in self }`.
    pub fn affine_image(
        &mut self,
        v: Variable,
        expr: &LinearExpr,
        denominator: &Coefficient,
    ) -> Result<()> {
        const OP: &str = "Polyhedron::affine_image";
        if denominator.is_zero() {
            return Err(Error::DivisionByZero { op: OP });
        }
        self.check_operand_dimension(expr.space_dimension(), OP)?;
        self.check_operand_dimension(v.space_dimension(), OP)?;
        if self.marked_empty() {
            return Ok(());
        }
        let v_col = v.id() + 1;
        if !expr.coefficient(v).is_zero() {
            // Invertible: both representations, minimality and the
            // saturation matrices survive, pending rows included.
            if self.generators_are_up_to_date() {
                self.transform_generators(v_col, expr, denominator);
            }
            if self.constraints_are_up_to_date() {
                let v_coeff = expr.coefficient(v);
                let mut inverse: Vec<Coefficient>;
                let inverse_denominator;
                if sgn(&v_coeff) > 0 {
                    inverse = expr.as_slice().iter().map(|c| -c).collect();
                    inverse[v_col] = denominator.clone();
                    inverse_denominator = v_coeff;
                } else {
                    inverse = expr.as_slice().to_vec();
                    inverse[v_col] = denominator.clone();
                    neg_assign(&mut inverse[v_col]);
                    inverse_denominator = -v_coeff;
                }
                self.con_sys
                    .affine_preimage_col(v_col, &inverse, &inverse_denominator);
            }
        } else {
            // Not invertible: fall back to the generators.
            if self.has_something_pending() {
                if !self.remove_pending_to_obtain_generators()? {
                    return Ok(());
                }
            } else if !self.generators_are_up_to_date() && !self.minimize()? {
                return Ok(());
            }
            self.transform_generators(v_col, expr, denominator);
            self.clear_flags(
                Status::C_UP_TO_DATE
                    | Status::C_MINIMIZED
                    | Status::G_MINIMIZED
                    | Status::SAT_C_UP_TO_DATE
                    | Status::SAT_G_UP_TO_DATE,
            );
        }
        debug_assert!(self.ok());
        Ok(())
    }

    fn transform_generators(&mut self, v_col: usize, expr: &LinearExpr, denominator: &Coefficient) {
        if sgn(denominator) > 0 {
            self.gen_sys
                .affine_image_col(v_col, expr.as_slice(), denominator);
        } else {
            let negated: Vec<Coefficient> = expr.as_slice().iter().map(|c| -c).collect();
            self.gen_sys
                .affine_image_col(v_col, &negated, &-denominator);
        }
    }

    /// `self := { x : x[v := (expr . x) / denominator] in self }`, the
    /// inverse of [`Polyhedron::affine_image`].
    pub fn affine_preimage(
        &mut self,
        v: Variable,
        expr: &LinearExpr,
        denominator: &Coefficient,
    ) -> Result<()> {
        const OP: &str = "Polyhedron::affine_preimage";
        if denominator.is_zero() {
            return Err(Error::DivisionByZero { op: OP });
        }
        self.check_operand_dimension(expr.space_dimension(), OP)?;
        self.check_operand_dimension(v.space_dimension(), OP)?;
        if self.marked_empty() {
            return Ok(());
        }
        let v_col = v.id() + 1;
        if !expr.coefficient(v).is_zero() {
            if self.constraints_are_up_to_date() {
                if sgn(denominator) > 0 {
                    self.con_sys
                        .affine_preimage_col(v_col, expr.as_slice(), denominator);
                } else {
                    let negated: Vec<Coefficient> = expr.as_slice().iter().map(|c| -c).collect();
                    self.con_sys
                        .affine_preimage_col(v_col, &negated, &-denominator);
                }
            }
            if self.generators_are_up_to_date() {
                let v_coeff = expr.coefficient(v);
                let mut inverse: Vec<Coefficient>;
                let inverse_denominator;
                if sgn(&v_coeff) > 0 {
                    inverse = expr.as_slice().iter().map(|c| -c).collect();
                    inverse[v_col] = denominator.clone();
                    inverse_denominator = v_coeff;
                } else {
                    inverse = expr.as_slice().to_vec();
                    inverse[v_col] = denominator.clone();
                    neg_assign(&mut inverse[v_col]);
                    inverse_denominator = -v_coeff;
                }
                self.gen_sys
                    .affine_image_col(v_col, &inverse, &inverse_denominator);
            }
        } else {
            if self.has_something_pending() {
                self.remove_pending_to_obtain_constraints()?;
            } else if !self.constraints_are_up_to_date() {
                self.minimize()?;
            }
            if self.marked_empty() {
                return Ok(());
            }
            if sgn(denominator) > 0 {
                self.con_sys
                    .affine_preimage_col(v_col, expr.as_slice(), denominator);
            } else {
                let negated: Vec<Coefficient> = expr.as_slice().iter().map(|c| -c).collect();
                self.con_sys
                    .affine_preimage_col(v_col, &negated, &-denominator);
            }
            self.clear_flags(
                Status::G_UP_TO_DATE
                    | Status::G_MINIMIZED
                    | Status::C_MINIMIZED
                    | Status::SAT_C_UP_TO_DATE
                    | Status::SAT_G_UP_TO_DATE,
            );
        }
        debug_assert!(self.ok());
        Ok(())
    }

    /// `self := { x[v := t] : x in self, (denominator * t) relsym
    /// (expr . x) }`.
    pub fn generalized_affine_image(
        &mut self,
        v: Variable,
        relsym: RelSymbol,
        expr: &LinearExpr,
        denominator: &Coefficient,
    ) -> Result<()> {
        const OP: &str = "Polyhedron::generalized_affine_image";
        if denominator.is_zero() {
            return Err(Error::DivisionByZero { op: OP });
        }
        self.check_operand_dimension(expr.space_dimension(), OP)?;
        self.check_operand_dimension(v.space_dimension(), OP)?;
        self.check_relsym(relsym, OP)?;

        self.affine_image(v, expr, denominator)?;
        if relsym == RelSymbol::Equal {
            return Ok(());
        }
        // A ray is about to be added: emptiness must be decided first.
        if self.is_empty()? {
            return Ok(());
        }
        match relsym {
            RelSymbol::LessOrEqual => self.add_generator(Generator::ray(-v))?,
            RelSymbol::GreaterOrEqual => self.add_generator(Generator::ray(LinearExpr::from(v)))?,
            RelSymbol::LessThan | RelSymbol::GreaterThan => {
                let direction = if relsym == RelSymbol::GreaterThan {
                    LinearExpr::from(v)
                } else {
                    -v
                };
                self.add_generator(Generator::ray(direction))?;
                self.minimize()?;
                // Split every point into its closure point and a copy
                // displaced strictly along the new ray.
                let v_col = v.id() + 1;
                let eps_index = self.space_dimension() + 1;
                let num_rows = self.gen_sys.num_rows();
                for i in 0..num_rows {
                    if self.gen_sys.row(i).is_point() {
                        let mut displaced = self.gen_sys.row(i).clone();
                        {
                            let row = displaced.row_mut();
                            if relsym == RelSymbol::GreaterThan {
                                row[v_col] += Coefficient::from(1);
                            } else {
                                row[v_col] -= Coefficient::from(1);
                            }
                            row.strong_normalize();
                        }
                        self.gen_sys.add_row(displaced);
                        let row = self.gen_sys.row_mut(i).row_mut();
                        row[eps_index] = Coefficient::zero();
                        row.strong_normalize();
                    }
                }
                self.clear_flags(
                    Status::C_UP_TO_DATE
                        | Status::C_MINIMIZED
                        | Status::G_MINIMIZED
                        | Status::SAT_C_UP_TO_DATE
                        | Status::SAT_G_UP_TO_DATE,
                );
            }
            RelSymbol::Equal | RelSymbol::NotEqual => unreachable!(),
        }
        debug_assert!(self.ok());
        Ok(())
    }

    /// The inverse of [`Polyhedron::generalized_affine_image`].
    pub fn generalized_affine_preimage(
        &mut self,
        v: Variable,
        relsym: RelSymbol,
        expr: &LinearExpr,
        denominator: &Coefficient,
    ) -> Result<()> {
        const OP: &str = "Polyhedron::generalized_affine_preimage";
        if denominator.is_zero() {
            return Err(Error::DivisionByZero { op: OP });
        }
        self.check_operand_dimension(expr.space_dimension(), OP)?;
        self.check_operand_dimension(v.space_dimension(), OP)?;
        self.check_relsym(relsym, OP)?;
        if relsym == RelSymbol::Equal {
            return self.affine_preimage(v, expr, denominator);
        }
        let v_coeff = expr.coefficient(v);
        if !v_coeff.is_zero() {
            // Invert the relation: the preimage is the image of the
            // inverse relation.
            let inverse_expr = expr.clone() - (denominator + &v_coeff) * v;
            let inverse_denominator = -v_coeff;
            let inverse_relsym = if sgn(denominator) == sgn(&inverse_denominator) {
                relsym
            } else {
                relsym.reversed()
            };
            return self.generalized_affine_image(
                v,
                inverse_relsym,
                &inverse_expr,
                &inverse_denominator,
            );
        }
        // `v` does not occur in `expr`: constrain, then forget `v`.
        if self.marked_empty() {
            return Ok(());
        }
        let corrected = if sgn(denominator) > 0 {
            relsym
        } else {
            relsym.reversed()
        };
        let lhs = denominator.clone() * v;
        self.refine_with_relsym(lhs, corrected, expr.clone())?;
        self.unconstrain(v)?;
        debug_assert!(self.ok());
        Ok(())
    }

    /// `self := { x : exists x' in self, (lhs . x) relsym (rhs . x') with
    /// the lhs dimensions otherwise unconstrained }`.
    pub fn generalized_affine_image_lhs_rhs(
        &mut self,
        lhs: &LinearExpr,
        relsym: RelSymbol,
        rhs: &LinearExpr,
    ) -> Result<()> {
        const OP: &str = "Polyhedron::generalized_affine_image_lhs_rhs";
        self.check_operand_dimension(lhs.space_dimension(), OP)?;
        self.check_operand_dimension(rhs.space_dimension(), OP)?;
        self.check_relsym(relsym, OP)?;
        if self.marked_empty() {
            return Ok(());
        }
        let lhs_vars: Vec<Variable> = (0..lhs.space_dimension())
            .map(Variable)
            .filter(|&v| !lhs.coefficient(v).is_zero())
            .collect();
        if lhs_vars.is_empty() {
            // A constant left-hand side: plain refinement.
            return self.refine_with_relsym(lhs.clone(), relsym, rhs.clone());
        }
        let intersects = lhs_vars.iter().any(|&v| !rhs.coefficient(v).is_zero());
        if intersects {
            // Store the right-hand side in a fresh dimension before the
            // left-hand side dimensions are forgotten.
            let new_var = Variable(self.space_dimension());
            self.add_space_dimensions_and_embed(1)?;
            self.refine_with_relsym(LinearExpr::from(new_var), RelSymbol::Equal, rhs.clone())?;
            if !self.is_empty()? {
                for &v in &lhs_vars {
                    self.unconstrain(v)?;
                }
                self.refine_with_relsym(lhs.clone(), relsym, LinearExpr::from(new_var))?;
            }
            let back_to = self.space_dimension() - 1;
            self.remove_higher_space_dimensions(back_to)?;
        } else {
            if self.is_empty()? {
                return Ok(());
            }
            for &v in &lhs_vars {
                self.unconstrain(v)?;
            }
            self.refine_with_relsym(lhs.clone(), relsym, rhs.clone())?;
        }
        debug_assert!(self.ok());
        Ok(())
    }

    /// The inverse of [`Polyhedron::generalized_affine_image_lhs_rhs`].
    pub fn generalized_affine_preimage_lhs_rhs(
        &mut self,
        lhs: &LinearExpr,
        relsym: RelSymbol,
        rhs: &LinearExpr,
    ) -> Result<()> {
        const OP: &str = "Polyhedron::generalized_affine_preimage_lhs_rhs";
        self.check_operand_dimension(lhs.space_dimension(), OP)?;
        self.check_operand_dimension(rhs.space_dimension(), OP)?;
        self.check_relsym(relsym, OP)?;
        if self.marked_empty() {
            return Ok(());
        }
        let lhs_vars: Vec<Variable> = (0..lhs.space_dimension())
            .map(Variable)
            .filter(|&v| !lhs.coefficient(v).is_zero())
            .collect();
        if lhs_vars.is_empty() {
            return self.generalized_affine_image_lhs_rhs(lhs, relsym, rhs);
        }
        let intersects = lhs_vars.iter().any(|&v| !rhs.coefficient(v).is_zero());
        if intersects {
            let new_var = Variable(self.space_dimension());
            self.add_space_dimensions_and_embed(1)?;
            self.refine_with_relsym(LinearExpr::from(new_var), RelSymbol::Equal, lhs.clone())?;
            if !self.is_empty()? {
                for &v in &lhs_vars {
                    self.unconstrain(v)?;
                }
                self.refine_with_relsym(LinearExpr::from(new_var), relsym, rhs.clone())?;
            }
            let back_to = self.space_dimension() - 1;
            self.remove_higher_space_dimensions(back_to)?;
        } else {
            self.refine_with_relsym(lhs.clone(), relsym, rhs.clone())?;
            if self.is_empty()? {
                return Ok(());
            }
            for &v in &lhs_vars {
                self.unconstrain(v)?;
            }
        }
        debug_assert!(self.ok());
        Ok(())
    }

    /// `self := { x[v := t] : x in self, (lb . x) <= (denominator * t) <=
    /// (ub . x) }`.
    pub fn bounded_affine_image(
        &mut self,
        v: Variable,
        lb_expr: &LinearExpr,
        ub_expr: &LinearExpr,
        denominator: &Coefficient,
    ) -> Result<()> {
        const OP: &str = "Polyhedron::bounded_affine_image";
        if denominator.is_zero() {
            return Err(Error::DivisionByZero { op: OP });
        }
        self.check_operand_dimension(v.space_dimension(), OP)?;
        self.check_operand_dimension(lb_expr.space_dimension(), OP)?;
        self.check_operand_dimension(ub_expr.space_dimension(), OP)?;
        if self.marked_empty() {
            return Ok(());
        }
        if lb_expr.coefficient(v).is_zero() {
            // `v` may occur in the upper bound only.
            self.generalized_affine_image(v, RelSymbol::LessOrEqual, ub_expr, denominator)?;
            if sgn(denominator) > 0 {
                self.refine_no_check(lb_expr.clone().le(denominator.clone() * v))?;
            } else {
                self.refine_no_check((denominator.clone() * v).le(lb_expr.clone()))?;
            }
        } else if ub_expr.coefficient(v).is_zero() {
            self.generalized_affine_image(v, RelSymbol::GreaterOrEqual, lb_expr, denominator)?;
            if sgn(denominator) > 0 {
                self.refine_no_check((denominator.clone() * v).le(ub_expr.clone()))?;
            } else {
                self.refine_no_check(ub_expr.clone().le(denominator.clone() * v))?;
            }
        } else {
            // `v` occurs on both sides: stash the upper bound in a fresh
            // dimension.
            let new_var = Variable(self.space_dimension());
            self.add_space_dimensions_and_embed(1)?;
            self.refine_no_check((denominator.clone() * new_var).eq(ub_expr.clone()))?;
            self.generalized_affine_image(v, RelSymbol::GreaterOrEqual, lb_expr, denominator)?;
            if !self.marked_empty() {
                self.refine_no_check(new_var.ge(v))?;
            }
            let back_to = self.space_dimension() - 1;
            self.remove_higher_space_dimensions(back_to)?;
        }
        debug_assert!(self.ok());
        Ok(())
    }

    /// The inverse of [`Polyhedron::bounded_affine_image`].
    pub fn bounded_affine_preimage(
        &mut self,
        v: Variable,
        lb_expr: &LinearExpr,
        ub_expr: &LinearExpr,
        denominator: &Coefficient,
    ) -> Result<()> {
        const OP: &str = "Polyhedron::bounded_affine_preimage";
        if denominator.is_zero() {
            return Err(Error::DivisionByZero { op: OP });
        }
        self.check_operand_dimension(v.space_dimension(), OP)?;
        self.check_operand_dimension(lb_expr.space_dimension(), OP)?;
        self.check_operand_dimension(ub_expr.space_dimension(), OP)?;
        if self.marked_empty() {
            return Ok(());
        }
        let v_col = v.id() + 1;
        if lb_expr.coefficient(v).is_zero() && ub_expr.coefficient(v).is_zero() {
            if sgn(denominator) > 0 {
                self.refine_no_check(lb_expr.clone().le(denominator.clone() * v))?;
                self.refine_no_check((denominator.clone() * v).le(ub_expr.clone()))?;
            } else {
                self.refine_no_check(ub_expr.clone().le(denominator.clone() * v))?;
                self.refine_no_check((denominator.clone() * v).le(lb_expr.clone()))?;
            }
            self.unconstrain(v)?;
        } else {
            let new_var = Variable(self.space_dimension());
            self.add_space_dimensions_and_embed(1)?;
            let new_col = new_var.id() + 1;
            // Swap the roles of `v` and the fresh dimension.
            self.obtain_constraints()?;
            if self.constraints_are_up_to_date() {
                self.con_sys.swap_columns(v_col, new_col);
            }
            if self.generators_are_up_to_date() {
                self.gen_sys.swap_columns(v_col, new_col);
            }
            if sgn(denominator) > 0 {
                self.refine_no_check(lb_expr.clone().le(denominator.clone() * new_var))?;
                self.refine_no_check((denominator.clone() * new_var).le(ub_expr.clone()))?;
            } else {
                self.refine_no_check(ub_expr.clone().le(denominator.clone() * new_var))?;
                self.refine_no_check((denominator.clone() * new_var).le(lb_expr.clone()))?;
            }
            let back_to = self.space_dimension() - 1;
            self.remove_higher_space_dimensions(back_to)?;
        }
        debug_assert!(self.ok());
        Ok(())
    }

    fn check_relsym(&self, relsym: RelSymbol, op: &'static str) -> Result<()> {
        if relsym == RelSymbol::NotEqual {
            return Err(Error::InvalidArgument {
                op,
                reason: "the disequality relation is not convex",
            });
        }
        if self.is_necessarily_closed() && relsym.is_strict() {
            return Err(Error::InvalidArgument {
                op,
                reason: "a strict relation needs the NNC topology",
            });
        }
        Ok(())
    }

    pub(crate) fn refine_with_relsym(
        &mut self,
        lhs: LinearExpr,
        relsym: RelSymbol,
        rhs: LinearExpr,
    ) -> Result<()> {
        let c = match relsym {
            RelSymbol::LessThan => lhs.lt(rhs),
            RelSymbol::LessOrEqual => lhs.le(rhs),
            RelSymbol::Equal => lhs.eq(rhs),
            RelSymbol::GreaterOrEqual => lhs.ge(rhs),
            RelSymbol::GreaterThan => lhs.gt(rhs),
            RelSymbol::NotEqual => unreachable!("rejected by the callers"),
        };
        self.refine_no_check(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::Topology;

    fn unit_square() -> Polyhedron {
        let a = Variable(0);
        let b = Variable(1);
        let mut p = Polyhedron::universe(Topology::Closed, 2);
        p.add_constraint(a.ge(0)).unwrap();
        p.add_constraint(a.le(1)).unwrap();
        p.add_constraint(b.ge(0)).unwrap();
        p.add_constraint(b.le(1)).unwrap();
        p
    }

    #[test]
    fn shear_on_the_unit_square() {
        let a = Variable(0);
        let b = Variable(1);
        let mut p = unit_square();
        p.affine_image(b, &(a + b), &Coefficient::from(1)).unwrap();
        let mut expected = Polyhedron::universe(Topology::Closed, 2);
        expected.add_constraint(a.ge(0)).unwrap();
        expected.add_constraint(a.le(1)).unwrap();
        expected.add_constraint(b.ge(a)).unwrap();
        expected.add_constraint(b.le(a + 1)).unwrap();
        assert_eq!(p, expected);
    }

    #[test]
    fn preimage_undoes_an_invertible_image() {
        let a = Variable(0);
        let b = Variable(1);
        let square = unit_square();
        let mut p = square.clone();
        p.affine_image(b, &(a + b), &Coefficient::from(1)).unwrap();
        p.affine_preimage(b, &(a + b), &Coefficient::from(1)).unwrap();
        assert_eq!(p, square);
    }

    #[test]
    fn projection_image_collapses_a_dimension() {
        let a = Variable(0);
        let b = Variable(1);
        let mut p = unit_square();
        // b := 0 is not invertible.
        p.affine_image(b, &LinearExpr::new(), &Coefficient::from(1))
            .unwrap();
        let mut expected = Polyhedron::universe(Topology::Closed, 2);
        expected.add_constraint(a.ge(0)).unwrap();
        expected.add_constraint(a.le(1)).unwrap();
        expected.add_constraint(b.eq(0)).unwrap();
        assert_eq!(p, expected);
    }

    #[test]
    fn negative_denominator_flips_signs() {
        let a = Variable(0);
        let mut p = unit_square();
        // a := a / -1, mirroring the square.
        p.affine_image(a, &LinearExpr::from(a), &Coefficient::from(-1))
            .unwrap();
        let b = Variable(1);
        let mut expected = Polyhedron::universe(Topology::Closed, 2);
        expected.add_constraint(a.ge(-1)).unwrap();
        expected.add_constraint(a.le(0)).unwrap();
        expected.add_constraint(b.ge(0)).unwrap();
        expected.add_constraint(b.le(1)).unwrap();
        assert_eq!(p, expected);
    }

    #[test]
    fn generalized_image_relaxes_along_a_ray() {
        let a = Variable(0);
        let b = Variable(1);
        let mut p = unit_square();
        p.generalized_affine_image(
            b,
            RelSymbol::GreaterOrEqual,
            &LinearExpr::from(2),
            &Coefficient::from(1),
        )
        .unwrap();
        let mut expected = Polyhedron::universe(Topology::Closed, 2);
        expected.add_constraint(a.ge(0)).unwrap();
        expected.add_constraint(a.le(1)).unwrap();
        expected.add_constraint(b.ge(2)).unwrap();
        assert_eq!(p, expected);
    }

    #[test]
    fn generalized_preimage_without_the_variable() {
        let a = Variable(0);
        let b = Variable(1);
        let mut p = unit_square();
        // The set of states from which b' = a satisfies b' <= b... i.e.
        // the preimage constrains a <= b, then b is forgotten.
        p.generalized_affine_preimage(
            b,
            RelSymbol::LessOrEqual,
            &LinearExpr::from(a),
            &Coefficient::from(1),
        )
        .unwrap();
        // b <= a intersected with the square, then b unconstrained.
        let mut expected = Polyhedron::universe(Topology::Closed, 2);
        expected.add_constraint(a.ge(0)).unwrap();
        expected.add_constraint(a.le(1)).unwrap();
        assert_eq!(p, expected);
    }

    #[test]
    fn bounded_image_brackets_the_variable() {
        let a = Variable(0);
        let b = Variable(1);
        let mut p = unit_square();
        p.bounded_affine_image(b, &LinearExpr::from(a), &(a + 2), &Coefficient::from(1))
            .unwrap();
        let mut expected = Polyhedron::universe(Topology::Closed, 2);
        expected.add_constraint(a.ge(0)).unwrap();
        expected.add_constraint(a.le(1)).unwrap();
        expected.add_constraint(b.ge(a)).unwrap();
        expected.add_constraint(b.le(a + 2)).unwrap();
        assert_eq!(p, expected);
    }

    #[test]
    fn strict_relations_need_nnc() {
        let a = Variable(0);
        let mut p = unit_square();
        assert!(p
            .generalized_affine_image(
                a,
                RelSymbol::GreaterThan,
                &LinearExpr::new(),
                &Coefficient::from(1)
            )
            .is_err());
        assert!(p
            .generalized_affine_image(
                a,
                RelSymbol::NotEqual,
                &LinearExpr::new(),
                &Coefficient::from(1)
            )
            .is_err());
    }

    #[test]
    fn strict_generalized_image_in_nnc() {
        let a = Variable(0);
        let mut p = Polyhedron::universe(Topology::Nnc, 1);
        p.add_constraint(a.ge(0)).unwrap();
        p.add_constraint(a.le(1)).unwrap();
        p.generalized_affine_image(
            a,
            RelSymbol::GreaterThan,
            &LinearExpr::from(a),
            &Coefficient::from(1),
        )
        .unwrap();
        // a' > a for a in [0, 1]: the result is a > 0.
        let mut expected = Polyhedron::universe(Topology::Nnc, 1);
        expected.add_constraint(a.gt(0)).unwrap();
        assert_eq!(p, expected);
    }
}
