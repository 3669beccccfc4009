use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::One;

use crate::algorithms::hensel::doubling_schedule;
use crate::context::PAdicContext;
use crate::element::PAdicEl;
use crate::error::{PAdicError, Result};

///
/// Lifts `u mod p` to the root of `x^p - x` congruent to it, by Newton
/// iteration along the doubling schedule. The derivative `p*x^(p-1) - 1`
/// is `-1 mod p` and hence a unit at every step.
///
fn teichmuller_unit(ctx: &PAdicContext, u: &BigInt, n: i64) -> Result<BigInt> {
    let p = ctx.prime();
    let mut y = u.mod_floor(p);
    let p_minus_one = p - BigInt::one();
    let schedule = doubling_schedule(n);
    for i in (0..schedule.len() - 1).rev() {
        let modulus = ctx.pow(schedule[i] as u64);
        let modulus = modulus.as_ref();
        let ypow = y.modpow(&p_minus_one, modulus);
        let f = ((&ypow * &y) - &y).mod_floor(modulus);
        let d = ((p * &ypow) - BigInt::one()).mod_floor(modulus);
        let dinv = d
            .modinv(modulus)
            .ok_or(PAdicError::Internal("derivative of x^p - x at a unit is a unit"))?;
        y = (&y - (f * dinv)).mod_floor(modulus);
    }
    debug_assert!(
        y.modpow(ctx.prime(), ctx.pow(n as u64).as_ref())
            == y.mod_floor(ctx.pow(n as u64).as_ref())
    );
    Ok(y)
}

impl PAdicContext {

    ///
    /// Teichmüller lift at the precision of `x`; see
    /// [`PAdicContext::teichmuller_prec`].
    ///
    pub fn teichmuller(&self, x: &PAdicEl) -> Result<PAdicEl> {
        self.teichmuller_prec(x, x.precision())
    }

    ///
    /// The Teichmüller lift of `x`: the unique `(p-1)`-th root of unity in
    /// `Z_p` congruent to `x mod p`, at precision `prec`.
    ///
    /// Fails with [`PAdicError::NotUnit`] for negative valuation; elements
    /// divisible by `p` (including zero) lift to zero.
    ///
    pub fn teichmuller_prec(&self, x: &PAdicEl, prec: i64) -> Result<PAdicEl> {
        if x.valuation() < 0 {
            return Err(PAdicError::NotUnit);
        }
        if x.is_zero() || x.valuation() > 0 || prec <= 0 {
            return Ok(self.zero(prec));
        }
        let unit = teichmuller_unit(self, x.unit(), prec)?;
        let mut r = PAdicEl { unit, val: 0, prec };
        self.reduce_canonical(&mut r);
        debug_assert!(self.is_reduced(&r));
        Ok(r)
    }
}

#[test]
fn test_teichmuller_of_two_mod_five() {
    let q5 = PAdicContext::with_prime(BigInt::from(5)).unwrap();
    let t = q5.teichmuller(&q5.from_i64(2, 4)).unwrap();
    // the fourth root of unity congruent to 2 mod 5^4 is 182
    assert_eq!(BigInt::from(182), q5.to_bigint(&t).unwrap());
    let modulus = q5.pow(4).into_owned();
    assert_eq!(
        t.unit().mod_floor(&modulus),
        t.unit().modpow(&BigInt::from(5), &modulus)
    );
    assert_eq!(BigInt::from(2), t.unit().mod_floor(q5.prime()));
}

#[test]
fn test_teichmuller_fixed_points() {
    let q7 = PAdicContext::with_prime(BigInt::from(7)).unwrap();
    let modulus = q7.pow(10).into_owned();
    for u in 1i64..7 {
        let t = q7.teichmuller(&q7.from_i64(u, 10)).unwrap();
        assert_eq!(
            t.unit().mod_floor(&modulus),
            t.unit().modpow(&BigInt::from(7), &modulus)
        );
        assert_eq!(BigInt::from(u), t.unit().mod_floor(q7.prime()));
        // the lift of a root of unity is itself
        assert_eq!(t, q7.teichmuller(&t).unwrap());
    }
}

#[test]
fn test_teichmuller_conventions() {
    let q5 = PAdicContext::with_prime(BigInt::from(5)).unwrap();
    assert!(q5.teichmuller(&q5.from_i64(10, 6)).unwrap().is_zero());
    assert!(q5.teichmuller(&q5.zero(6)).unwrap().is_zero());
    let mut x = q5.from_i64(1, 6);
    x = q5.shift(&x, -1);
    assert_eq!(Err(PAdicError::NotUnit), q5.teichmuller(&x));
}

#[test]
fn test_teichmuller_2adic() {
    let q2 = PAdicContext::with_prime(BigInt::from(2)).unwrap();
    let t = q2.teichmuller(&q2.from_i64(7, 8)).unwrap();
    assert_eq!(q2.one(8), t);
}
