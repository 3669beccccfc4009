use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::Zero;

#[cfg(test)]
use num_traits::One;

use crate::context::PAdicContext;
use crate::element::PAdicEl;
use crate::error::{PAdicError, Result};

///
/// Assignments from and conversions back to integers and rationals.
///
impl PAdicContext {

    ///
    /// The image of an integer at absolute precision `prec`.
    ///
    pub fn from_bigint(&self, n: &BigInt, prec: i64) -> PAdicEl {
        let mut el = PAdicEl { unit: n.clone(), val: 0, prec };
        self.reduce(&mut el);
        el
    }

    pub fn from_i64(&self, n: i64, prec: i64) -> PAdicEl {
        self.from_bigint(&BigInt::from(n), prec)
    }

    ///
    /// The image of a rational at absolute precision `prec`. Powers of `p`
    /// are stripped from numerator and denominator first; the residual
    /// denominator is a unit and gets inverted mod `p^(prec - v)`.
    ///
    pub fn from_rational(&self, q: &BigRational, prec: i64) -> PAdicEl {
        if q.is_zero() {
            return self.zero(prec);
        }
        let mut num = q.numer().clone();
        let mut den = q.denom().clone();
        let val = self.remove_p_factors(&mut num) - self.remove_p_factors(&mut den);
        if prec <= val {
            return self.zero(prec);
        }
        let modulus = self.pow((prec - val) as u64);
        let den_inv = den
            .modinv(modulus.as_ref())
            .expect("denominator stripped of p is a unit");
        let mut el = PAdicEl { unit: (num * den_inv).mod_floor(modulus.as_ref()), val, prec };
        self.reduce(&mut el);
        el
    }

    ///
    /// The integer representative `u * p^v` in `[0, p^N)`. Fails with
    /// [`PAdicError::NotInteger`] on elements with negative valuation.
    ///
    pub fn to_bigint(&self, x: &PAdicEl) -> Result<BigInt> {
        if x.is_zero() {
            return Ok(BigInt::zero());
        }
        if x.val < 0 {
            return Err(PAdicError::NotInteger);
        }
        Ok(&x.unit * self.pow(x.val as u64).as_ref())
    }

    ///
    /// The terse rational representative: `u * p^v` for integral elements,
    /// `u / p^-v` otherwise.
    ///
    pub fn to_rational(&self, x: &PAdicEl) -> BigRational {
        if x.is_zero() {
            return BigRational::zero();
        }
        if x.val >= 0 {
            return BigRational::from_integer(&x.unit * self.pow(x.val as u64).as_ref());
        }
        BigRational::new(x.unit.clone(), self.pow((-x.val) as u64).into_owned())
    }
}

#[test]
fn test_integer_round_trip() {
    let qp = PAdicContext::with_prime(BigInt::from(7)).unwrap();
    for n in [0i64, 1, 123, 49, -1, 16807] {
        let x = qp.from_i64(n, 10);
        let back = qp.to_bigint(&x).unwrap();
        assert_eq!(
            BigInt::from(n).mod_floor(qp.pow(10).as_ref()),
            back.mod_floor(qp.pow(10).as_ref())
        );
    }
}

#[test]
fn test_from_i64_strips_powers() {
    let qp = PAdicContext::with_prime(BigInt::from(7)).unwrap();
    let x = qp.from_i64(56, 5);
    assert_eq!(BigInt::from(8), *x.unit());
    assert_eq!(1, x.valuation());
}

#[test]
fn test_rational_round_trip() {
    let qp = PAdicContext::with_prime(BigInt::from(7)).unwrap();
    let q = BigRational::new(BigInt::from(5), BigInt::from(7));
    let x = qp.from_rational(&q, 10);
    assert_eq!(-1, x.valuation());
    assert_eq!(q, qp.to_rational(&x));

    let q = BigRational::new(BigInt::from(12), BigInt::from(49));
    let x = qp.from_rational(&q, 10);
    assert_eq!(-2, x.valuation());
    assert_eq!(q, qp.to_rational(&x));
}

#[test]
fn test_from_rational_with_unit_denominator() {
    let qp = PAdicContext::with_prime(BigInt::from(7)).unwrap();
    // 1/3 has an infinite expansion: check 3 * (1/3) = 1 instead
    let q = BigRational::new(BigInt::one(), BigInt::from(3));
    let x = qp.from_rational(&q, 10);
    assert_eq!(0, x.valuation());
    let three = qp.from_i64(3, 10);
    assert_eq!(qp.one(10), qp.mul_prec(&x, &three, 10));
}

#[test]
fn test_not_integer() {
    let qp = PAdicContext::with_prime(BigInt::from(7)).unwrap();
    let q = BigRational::new(BigInt::from(5), BigInt::from(7));
    let x = qp.from_rational(&q, 10);
    assert_eq!(Err(PAdicError::NotInteger), qp.to_bigint(&x));
}

#[test]
fn test_negative_integer_representative() {
    let qp = PAdicContext::with_prime(BigInt::from(7)).unwrap();
    let x = qp.from_i64(-1, 4);
    assert_eq!(BigInt::from(2400), qp.to_bigint(&x).unwrap());
}
