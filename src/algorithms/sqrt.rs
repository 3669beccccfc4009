use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Zero};

use crate::algorithms::hensel::doubling_schedule;
use crate::context::PAdicContext;
use crate::element::PAdicEl;
use crate::error::{PAdicError, Result};

///
/// A square root of `a` modulo the odd prime `p`, or `None` if `a` is not
/// a quadratic residue. `a` is expected reduced mod `p`.
///
/// Uses the exponentiation shortcut for `p = 3 mod 4` and Tonelli-Shanks
/// otherwise, with a deterministic search for the non-residue.
///
pub fn sqrtmod_prime(ctx: &PAdicContext, a: &BigInt) -> Option<BigInt> {
    let p = ctx.prime();
    if a.is_zero() {
        return Some(BigInt::zero());
    }
    let one = BigInt::one();
    let p_minus_one = p - &one;
    let half = &p_minus_one >> 1u32;
    if a.modpow(&half, p) != one {
        return None;
    }
    if p.mod_floor(&BigInt::from(4)) == BigInt::from(3) {
        let e = (p + &one) >> 2u32;
        return Some(a.modpow(&e, p));
    }
    // Tonelli-Shanks: p - 1 = q * 2^s with q odd
    let mut q = p_minus_one.clone();
    let mut s = 0u64;
    while q.is_even() {
        q >>= 1u32;
        s += 1;
    }
    let mut z = BigInt::from(2);
    while z.modpow(&half, p) != p_minus_one {
        z += 1;
    }
    let mut m = s;
    let mut c = z.modpow(&q, p);
    let mut t = a.modpow(&q, p);
    let mut r = a.modpow(&((&q + &one) >> 1u32), p);
    while !t.is_one() {
        let mut i = 0u64;
        let mut t2i = t.clone();
        while !t2i.is_one() {
            t2i = (&t2i * &t2i).mod_floor(p);
            i += 1;
        }
        let mut b = c.clone();
        for _ in 0..(m - i - 1) {
            b = (&b * &b).mod_floor(p);
        }
        m = i;
        c = (&b * &b).mod_floor(p);
        t = (&t * &c).mod_floor(p);
        r = (&r * &b).mod_floor(p);
    }
    Some(r)
}

///
/// Lifts the square root of the unit `u` to `p^n` for odd `p` by Newton
/// steps `y <- y - (y^2 - u) * inv(2y)` along the doubling schedule.
///
fn sqrt_unit(ctx: &PAdicContext, u: &BigInt, n: i64) -> Result<BigInt> {
    let p = ctx.prime();
    let u0 = u.mod_floor(p);
    let mut y = sqrtmod_prime(ctx, &u0).ok_or(PAdicError::NotASquare)?;
    let schedule = doubling_schedule(n);
    for i in (0..schedule.len() - 1).rev() {
        let modulus = ctx.pow(schedule[i] as u64);
        let modulus = modulus.as_ref();
        let t = (&y * &y - u).mod_floor(modulus);
        let d = (BigInt::from(2) * &y).mod_floor(modulus);
        let dinv = d.modinv(modulus).ok_or(PAdicError::Internal("2y is a unit"))?;
        y = (&y - (t * dinv)).mod_floor(modulus);
    }
    Ok(y)
}

///
/// Lifts the square root of an odd unit `u = 1 mod 8` to `2^n`. The Newton
/// step divides by `2y`, so one doubling step only takes a solution mod
/// `2^m` to one mod `2^(2m - 2)`; the schedule accounts for that and the
/// iteration starts from `y = 1` mod `2^3`.
///
fn sqrt_unit_2adic(ctx: &PAdicContext, u: &BigInt, n: i64) -> Result<BigInt> {
    if u.mod_floor(&BigInt::from(8)) != BigInt::one() {
        return Err(PAdicError::NotASquare);
    }
    let mut y = BigInt::one();
    if n <= 3 {
        return Ok(y.mod_floor(ctx.pow(n as u64).as_ref()));
    }
    let mut schedule = vec![n];
    while *schedule.last().unwrap() > 3 {
        let next = (schedule.last().unwrap() + 1) / 2 + 1;
        schedule.push(next);
    }
    for i in (0..schedule.len() - 1).rev() {
        let target = schedule[i];
        let wide = ctx.pow(target as u64 + 1);
        let modulus = ctx.pow(target as u64);
        let modulus = modulus.as_ref();
        // y^2 - u is divisible by 8, so the halving is exact
        let t = (&y * &y - u).mod_floor(wide.as_ref());
        let half = t >> 1u32;
        let yinv = y.modinv(modulus).ok_or(PAdicError::Internal("y is odd"))?;
        y = (&y - (half * yinv)).mod_floor(modulus);
    }
    Ok(y)
}

impl PAdicContext {

    ///
    /// Square root at the precision of `x`; see
    /// [`PAdicContext::sqrt_prec`].
    ///
    pub fn sqrt(&self, x: &PAdicEl) -> Result<PAdicEl> {
        self.sqrt_prec(x, x.precision())
    }

    ///
    /// A square root of `x` at precision `prec`, with valuation `v/2`.
    ///
    /// `x` is a square iff its valuation is even and its unit is a
    /// quadratic residue mod `p` (for odd `p`), resp. `1 mod 8` (for
    /// `p = 2`); otherwise the operation fails with
    /// [`PAdicError::NotASquare`] and no output exists. Which of the two
    /// roots is returned is unspecified.
    ///
    pub fn sqrt_prec(&self, x: &PAdicEl, prec: i64) -> Result<PAdicEl> {
        if x.is_zero() {
            return Ok(self.zero(prec));
        }
        if x.valuation() % 2 != 0 {
            return Err(PAdicError::NotASquare);
        }
        let val = x.valuation() / 2;
        let rel = prec - val;
        if rel <= 0 {
            // the root test still applies even when no digit survives
            if self.prime_small() == Some(2) {
                if x.unit().mod_floor(&BigInt::from(8)) != BigInt::one() {
                    return Err(PAdicError::NotASquare);
                }
            } else if sqrtmod_prime(self, &x.unit().mod_floor(self.prime())).is_none() {
                return Err(PAdicError::NotASquare);
            }
            return Ok(self.zero(prec));
        }
        let unit = if self.prime_small() == Some(2) {
            sqrt_unit_2adic(self, x.unit(), rel)?
        } else {
            sqrt_unit(self, x.unit(), rel)?
        };
        let mut r = PAdicEl { unit, val, prec };
        self.reduce_canonical(&mut r);
        debug_assert!(self.is_reduced(&r));
        Ok(r)
    }
}

#[test]
fn test_sqrtmod_prime() {
    let q13 = PAdicContext::with_prime(BigInt::from(13)).unwrap();
    for a in 1i64..13 {
        let a = BigInt::from(a);
        match sqrtmod_prime(&q13, &a) {
            Some(r) => assert_eq!(a, (&r * &r).mod_floor(&BigInt::from(13))),
            None => {}
        }
    }
    // exactly (p - 1) / 2 residues
    let count = (1i64..13)
        .filter(|a| sqrtmod_prime(&q13, &BigInt::from(*a)).is_some())
        .count();
    assert_eq!(6, count);
}

#[test]
fn test_sqrt_of_six_mod_five() {
    let q5 = PAdicContext::with_prime(BigInt::from(5)).unwrap();
    let x = q5.from_i64(6, 10);
    let y = q5.sqrt(&x).unwrap();
    let modulus = q5.pow(10).into_owned();
    let square = (y.unit() * y.unit()).mod_floor(&modulus);
    assert_eq!(BigInt::from(6), square);
    assert_eq!(0, y.valuation());
}

#[test]
fn test_sqrt_with_even_valuation() {
    let q7 = PAdicContext::with_prime(BigInt::from(7)).unwrap();
    let x = q7.from_i64(98, 8);
    let y = q7.sqrt(&x).unwrap();
    assert_eq!(1, y.valuation());
    assert_eq!(q7.from_i64(98, 9), q7.mul(&y, &y));
}

#[test]
fn test_sqrt_failures() {
    let q7 = PAdicContext::with_prime(BigInt::from(7)).unwrap();
    // 3 is not a quadratic residue mod 7
    assert_eq!(Err(PAdicError::NotASquare), q7.sqrt(&q7.from_i64(3, 8)));
    // odd valuation
    assert_eq!(Err(PAdicError::NotASquare), q7.sqrt(&q7.from_i64(7, 8)));
}

#[test]
fn test_sqrt_2adic() {
    let q2 = PAdicContext::with_prime(BigInt::from(2)).unwrap();
    let x = q2.from_i64(17, 6);
    let y = q2.sqrt(&x).unwrap();
    let modulus = q2.pow(6).into_owned();
    assert_eq!(BigInt::from(17), (y.unit() * y.unit()).mod_floor(&modulus));
    assert_eq!(Err(PAdicError::NotASquare), q2.sqrt(&q2.from_i64(3, 6)));
    assert_eq!(Err(PAdicError::NotASquare), q2.sqrt(&q2.from_i64(5, 6)));

    let x = q2.from_i64(68, 8);
    let y = q2.sqrt(&x).unwrap();
    assert_eq!(1, y.valuation());
    assert_eq!(q2.from_i64(68, 9), q2.mul(&y, &y));
}

#[test]
fn test_sqrt_squares_round_trip() {
    let q5 = PAdicContext::with_prime(BigInt::from(5)).unwrap();
    let mut rng = oorandom::Rand64::new(4);
    for _ in 0..20 {
        let x = q5.from_bigint(&crate::element::random_bits(&mut rng, 30), 8);
        if x.is_zero() || x.valuation() != 0 {
            continue;
        }
        let square = q5.mul_prec(&x, &x, 8);
        let root = q5.sqrt_prec(&square, 8).unwrap();
        // the root is x or -x
        assert!(root == x || root == q5.neg(&x));
    }
}
