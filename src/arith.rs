use std::cmp::min;

use crate::algorithms::hensel;
use crate::context::PAdicContext;
use crate::element::PAdicEl;
use crate::error::{PAdicError, Result};
use num_traits::Zero;

///
/// The rational field operations. Every operation exists in a plain form,
/// whose result precision is the natural combination of the operand
/// precisions, and a `*_prec` form taking the caller's declared result
/// precision. Results are always reduced at their declared precision.
///
impl PAdicContext {

    ///
    /// Sum at the natural precision `min(N1, N2)`.
    ///
    pub fn add(&self, x: &PAdicEl, y: &PAdicEl) -> PAdicEl {
        self.add_prec(x, y, min(x.prec, y.prec))
    }

    pub fn add_prec(&self, x: &PAdicEl, y: &PAdicEl, prec: i64) -> PAdicEl {
        self.add_sub_impl(x, y, prec, false)
    }

    ///
    /// Difference at the natural precision `min(N1, N2)`. Cancellation of
    /// leading digits raises the valuation and costs relative precision;
    /// the absolute precision is unaffected.
    ///
    pub fn sub(&self, x: &PAdicEl, y: &PAdicEl) -> PAdicEl {
        self.sub_prec(x, y, min(x.prec, y.prec))
    }

    pub fn sub_prec(&self, x: &PAdicEl, y: &PAdicEl, prec: i64) -> PAdicEl {
        self.add_sub_impl(x, y, prec, true)
    }

    fn add_sub_impl(&self, x: &PAdicEl, y: &PAdicEl, prec: i64, negate_y: bool) -> PAdicEl {
        if y.is_zero() {
            let mut r = x.clone();
            r.prec = prec;
            self.reduce(&mut r);
            return r;
        }
        if x.is_zero() {
            if negate_y {
                return self.neg_prec(y, prec);
            }
            let mut r = y.clone();
            r.prec = prec;
            self.reduce(&mut r);
            return r;
        }
        // align both units at the smaller valuation
        let val = min(x.val, y.val);
        let ux = if x.val > val {
            &x.unit * self.pow((x.val - val) as u64).as_ref()
        } else {
            x.unit.clone()
        };
        let uy = if y.val > val {
            &y.unit * self.pow((y.val - val) as u64).as_ref()
        } else {
            y.unit.clone()
        };
        let unit = if negate_y { ux - uy } else { ux + uy };
        let mut r = PAdicEl { unit, val, prec };
        self.reduce(&mut r);
        r
    }

    pub fn neg(&self, x: &PAdicEl) -> PAdicEl {
        self.neg_prec(x, x.prec)
    }

    ///
    /// Negation: the unit is replaced by `p^(N - v) - u`. Valuation and
    /// precision are preserved for nonzero elements.
    ///
    pub fn neg_prec(&self, x: &PAdicEl, prec: i64) -> PAdicEl {
        let mut r = x.clone();
        r.prec = prec;
        self.reduce(&mut r);
        if r.unit.is_zero() {
            return r;
        }
        r.unit = self.pow((prec - r.val) as u64).as_ref() - &r.unit;
        debug_assert!(self.is_reduced(&r));
        r
    }

    ///
    /// Product at the natural precision `min(N1 + v2, N2 + v1)`.
    ///
    pub fn mul(&self, x: &PAdicEl, y: &PAdicEl) -> PAdicEl {
        self.mul_prec(x, y, min(x.prec + y.val, y.prec + x.val))
    }

    pub fn mul_prec(&self, x: &PAdicEl, y: &PAdicEl, prec: i64) -> PAdicEl {
        if x.is_zero() || y.is_zero() {
            return self.zero(prec);
        }
        let mut r = PAdicEl { unit: &x.unit * &y.unit, val: x.val + y.val, prec };
        // the product of two units is a unit, so no canonicalization is due
        self.reduce_canonical(&mut r);
        r
    }

    ///
    /// Multiplication by `p^w`: adds `w` to the valuation, keeping unit and
    /// precision (up to re-reduction against the shrunk modulus).
    ///
    pub fn shift(&self, x: &PAdicEl, w: i64) -> PAdicEl {
        let mut r = x.clone();
        if r.unit.is_zero() {
            return r;
        }
        r.val += w;
        self.reduce_canonical(&mut r);
        r
    }

    ///
    /// Quotient, computed as `x * inv(y)`, at the natural precision.
    ///
    pub fn div(&self, x: &PAdicEl, y: &PAdicEl) -> Result<PAdicEl> {
        if y.is_zero() {
            return Err(PAdicError::DivisionByZero);
        }
        let rel = min(x.relative_precision(), y.relative_precision());
        self.div_prec(x, y, rel + x.val - y.val)
    }

    pub fn div_prec(&self, x: &PAdicEl, y: &PAdicEl, prec: i64) -> Result<PAdicEl> {
        if y.is_zero() {
            return Err(PAdicError::DivisionByZero);
        }
        if x.is_zero() {
            return Ok(self.zero(prec));
        }
        let inv = self.inv_prec(y, prec - x.val)?;
        Ok(self.mul_prec(x, &inv, prec))
    }

    ///
    /// Multiplicative inverse at the precision of `x`.
    ///
    pub fn inv(&self, x: &PAdicEl) -> Result<PAdicEl> {
        self.inv_prec(x, x.prec)
    }

    ///
    /// Multiplicative inverse at precision `prec`. The unit is inverted by
    /// Hensel lifting mod `p^(prec + v)`; when `v < -prec` there is no digit
    /// left to invert and the operation fails with
    /// [`PAdicError::PrecisionLost`].
    ///
    pub fn inv_prec(&self, x: &PAdicEl, prec: i64) -> Result<PAdicEl> {
        if x.is_zero() {
            return Err(PAdicError::DivisionByZero);
        }
        if x.val < -prec {
            return Err(PAdicError::PrecisionLost);
        }
        let rel = prec + x.val;
        if rel == 0 {
            return Ok(self.zero(prec));
        }
        let unit = hensel::invert_unit(self, &x.unit, rel)?;
        let mut r = PAdicEl { unit, val: -x.val, prec };
        self.reduce_canonical(&mut r);
        debug_assert!(self.is_reduced(&r));
        Ok(r)
    }
}

#[cfg(test)]
use num_bigint::BigInt;
#[cfg(test)]
use num_traits::One;
#[cfg(test)]
use crate::fmt::PrintMode;

#[test]
fn test_add_sub() {
    let qp = PAdicContext::with_prime(BigInt::from(7)).unwrap();
    let x = qp.from_i64(7, 10);
    let y = qp.from_i64(2, 10);
    let s = qp.add(&x, &y);
    assert_eq!(qp.from_i64(9, 10), s);
    assert_eq!(x, qp.sub(&s, &y));
    assert_eq!(qp.zero(10), qp.sub(&x, &x));
}

#[test]
fn test_sub_cancellation_raises_valuation() {
    let qp = PAdicContext::with_prime(BigInt::from(7)).unwrap();
    let x = qp.from_i64(10, 10);
    let y = qp.from_i64(3, 10);
    let d = qp.sub(&x, &y);
    assert_eq!(BigInt::one(), *d.unit());
    assert_eq!(1, d.valuation());
    assert_eq!(10, d.precision());
    assert_eq!(9, d.relative_precision());
}

#[test]
fn test_neg() {
    let qp = PAdicContext::with_prime(BigInt::from(7)).unwrap();
    let x = qp.from_i64(1, 4);
    let n = qp.neg(&x);
    assert_eq!(BigInt::from(2400), *n.unit());
    assert_eq!(0, n.valuation());
    assert!(qp.add(&x, &n).is_zero());
}

#[test]
fn test_mul_precision() {
    let qp = PAdicContext::with_prime(BigInt::from(7)).unwrap();
    let x = qp.from_i64(7, 5);
    let y = qp.from_i64(49, 5);
    let z = qp.mul(&x, &y);
    assert_eq!(3, z.valuation());
    assert_eq!(BigInt::one(), *z.unit());
    assert_eq!(6, z.precision());
}

#[test]
fn test_shift() {
    let qp = PAdicContext::with_prime(BigInt::from(7)).unwrap();
    let x = qp.from_i64(3, 8);
    let s = qp.shift(&x, 2);
    assert_eq!(2, s.valuation());
    assert_eq!(8, s.precision());
    assert_eq!(x, qp.shift(&s, -2));
    // shifting zero stays zero with valuation 0
    assert!(qp.shift(&qp.zero(8), 3).is_zero());
}

#[test]
fn test_shift_law() {
    let qp = PAdicContext::with_prime(BigInt::from(5)).unwrap();
    let mut rng = oorandom::Rand64::new(2);
    for _ in 0..20 {
        let x = qp.random_element(&mut rng, 8);
        let y = qp.random_element(&mut rng, 8);
        let lhs = qp.mul_prec(&qp.shift(&x, 2), &qp.shift(&y, 3), 8);
        let rhs = qp.shift(&qp.mul_prec(&x, &y, 8), 5);
        // both sides are reduced at precision 8
        assert_eq!(rhs, lhs);
    }
}

#[test]
fn test_div() {
    let qp = PAdicContext::with_prime(BigInt::from(7)).unwrap();
    let x = qp.from_i64(6, 10);
    let y = qp.from_i64(3, 10);
    assert_eq!(qp.from_i64(2, 10), qp.div(&x, &y).unwrap());
    assert_eq!(Err(PAdicError::DivisionByZero), qp.div(&x, &qp.zero(10)));
}

#[test]
fn test_inv_hensel_invariant() {
    let qp = PAdicContext::with_prime(BigInt::from(7)).unwrap();
    let x = qp.from_i64(2, 5);
    let ix = qp.inv(&x).unwrap();
    assert_eq!(BigInt::from(8404), *ix.unit());
    // 2 * 8404 = 16808 = 7^5 + 1
    assert_eq!(BigInt::one(), (BigInt::from(2) * ix.unit()) % BigInt::from(16807));
}

#[test]
fn test_inv_with_valuation() {
    let qp = PAdicContext::with_prime(BigInt::from(7)).unwrap();
    let x = qp.from_i64(14, 6);
    let ix = qp.inv(&x).unwrap();
    assert_eq!(-1, ix.valuation());
    assert_eq!(qp.one(5), qp.mul(&x, &ix));
}

#[test]
fn test_inv_precision_lost() {
    let qp = PAdicContext::with_prime(BigInt::from(7)).unwrap();
    let mut x = qp.from_i64(1, 5);
    x = qp.shift(&x, -6);
    assert_eq!(Err(PAdicError::PrecisionLost), qp.inv(&x));
}

#[test]
fn test_ring_laws() {
    let qp = PAdicContext::new(BigInt::from(5), 0, 40, PrintMode::Terse).unwrap();
    let mut rng = oorandom::Rand64::new(3);
    let prec = 8;
    for _ in 0..25 {
        // commutativity holds for arbitrary valuations
        let a = qp.random_element(&mut rng, prec);
        let b = qp.random_element(&mut rng, prec);
        assert_eq!(qp.add_prec(&a, &b, prec), qp.add_prec(&b, &a, prec));
        assert_eq!(qp.mul_prec(&a, &b, prec), qp.mul_prec(&b, &a, prec));
        // associativity and distributivity are digit-exact on p-adic
        // integers; with negative valuations the digits beyond the
        // justified relative precision may disagree
        let x = qp.from_bigint(&crate::element::random_bits(&mut rng, 40), prec);
        let y = qp.from_bigint(&crate::element::random_bits(&mut rng, 40), prec);
        let z = qp.from_bigint(&crate::element::random_bits(&mut rng, 40), prec);
        assert_eq!(
            qp.add_prec(&qp.add_prec(&x, &y, prec), &z, prec),
            qp.add_prec(&x, &qp.add_prec(&y, &z, prec), prec)
        );
        assert_eq!(
            qp.mul_prec(&qp.mul_prec(&x, &y, prec), &z, prec),
            qp.mul_prec(&x, &qp.mul_prec(&y, &z, prec), prec)
        );
        assert_eq!(
            qp.mul_prec(&qp.add_prec(&x, &y, prec), &z, prec),
            qp.add_prec(&qp.mul_prec(&x, &z, prec), &qp.mul_prec(&y, &z, prec), prec)
        );
        assert!(qp.add_prec(&x, &qp.neg_prec(&x, prec), prec).is_zero());
        for r in [&x, &y, &z] {
            assert!(qp.is_reduced(r));
        }
    }
}
