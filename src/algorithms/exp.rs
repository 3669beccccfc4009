use std::cmp::min;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Zero};
use tracing::trace;

use crate::algorithms::isqrt;
use crate::algorithms::val_fac::val_fac;
use crate::context::PAdicContext;
use crate::element::PAdicEl;
use crate::error::{PAdicError, Result};

///
/// The truncation length for `exp` at a point of valuation `v >= 1`
/// (`>= 2` for `p = 2`): the smallest `n` such that `ord_p(x^i / i!) >= N`
/// for all `i >= n`.
///
/// Since `ord_p(i!) <= (i - 1)/(p - 1)`, the word-sized case is
/// `ceil(((p-1)N - 1) / ((p-1)v - 1))`; a prime beyond word size never
/// divides any occurring factorial, leaving `ceil(N / v)`.
///
pub fn exp_bound(ctx: &PAdicContext, v: i64, n: i64) -> i64 {
    assert!(v >= 1 && n >= 1);
    if let Some(p) = ctx.prime_small() {
        let p = p as i128;
        let num = (p - 1) * n as i128 - 1;
        let den = (p - 1) * v as i128 - 1;
        ((num + den - 1) / den) as i64
    } else {
        (n + v - 1) / v
    }
}

///
/// Evaluates `sum_(i < n) X^i / i!  mod p^N` for the integer `X` of
/// valuation `>= v` by Horner's rule on the cleared-denominator polynomial
/// `T = sum c_i X^i` with `c_i = (n-1)!/i!`, working mod
/// `p^(N + ord_p((n-1)!))`; the factorial is divided back out at the end.
///
pub(crate) fn exp_series(ctx: &PAdicContext, x: &BigInt, v: i64, n_prec: i64) -> Result<BigInt> {
    let n = exp_bound(ctx, v, n_prec);
    if n <= 1 {
        return Ok(BigInt::one());
    }
    let w = val_fac(ctx, (n - 1) as u64);
    let modulus = ctx.pow(n_prec as u64 + w);
    let modulus = modulus.as_ref();
    let x = x.mod_floor(modulus);
    let mut t = BigInt::one();
    let mut m = BigInt::one();
    for k in (0..=(n - 2)).rev() {
        // descending from c_(n-1) = 1, the next coefficient is m * (k+1)
        m = (m * BigInt::from(k + 1)).mod_floor(modulus);
        t = ((&t * &x) + &m).mod_floor(modulus);
    }
    remove_factorial(ctx, t, m, w, n_prec)
}

///
/// As [`exp_series`], with the polynomial evaluated by rectangular
/// splitting: baby powers `X^0 ..= X^b` for `b ~ sqrt(n)`, block
/// coefficient tables of partial factorial quotients, and one giant
/// multiplication by `X^b` per block.
///
pub(crate) fn exp_series_rectangular(
    ctx: &PAdicContext,
    x: &BigInt,
    v: i64,
    n_prec: i64,
) -> Result<BigInt> {
    let n = exp_bound(ctx, v, n_prec);
    if n <= 1 {
        return Ok(BigInt::one());
    }
    let n = n as usize;
    let w = val_fac(ctx, (n - 1) as u64);
    let modulus = ctx.pow(n_prec as u64 + w);
    let modulus = modulus.as_ref();
    let x = x.mod_floor(modulus);
    let b = isqrt((n - 1) as u64) as usize + 1;
    let mut xs = Vec::with_capacity(b + 1);
    xs.push(BigInt::one());
    for j in 1..=b {
        xs.push((&xs[j - 1] * &x).mod_floor(modulus));
    }
    let blocks = (n + b - 1) / b;
    let mut coeffs = vec![BigInt::zero(); b];
    let mut t = BigInt::zero();
    let mut m = BigInt::one();
    let mut first = true;
    for j in (0..blocks).rev() {
        let start = j * b;
        let end = min(n, (j + 1) * b);
        for k in (start..end).rev() {
            if first {
                first = false;
            } else {
                m = (m * BigInt::from(k as u64 + 1)).mod_floor(modulus);
            }
            coeffs[k - start] = m.clone();
        }
        let mut inner = BigInt::zero();
        for off in 0..(end - start) {
            inner += &coeffs[off] * &xs[off];
        }
        t = ((t * &xs[b]) + inner).mod_floor(modulus);
    }
    remove_factorial(ctx, t, m, w, n_prec)
}

///
/// As [`exp_series`], with the argument split into valuation chunks of
/// doubling width: `exp(x) = exp(x mod p^(2w)) * exp(rest)`, so every
/// series call sees an argument with few significant digits and a short
/// truncation length.
///
pub(crate) fn exp_series_balanced(
    ctx: &PAdicContext,
    x: &BigInt,
    v: i64,
    n_prec: i64,
) -> Result<BigInt> {
    let modulus = ctx.pow(n_prec as u64).into_owned();
    let mut result = BigInt::one();
    let mut rem = x.mod_floor(&modulus);
    let mut w = v;
    while !rem.is_zero() && w < n_prec {
        let width = min(2 * w, n_prec);
        let chunk = rem.mod_floor(ctx.pow(width as u64).as_ref());
        rem -= &chunk;
        if !chunk.is_zero() {
            let factor = exp_series(ctx, &chunk, w, n_prec)?;
            result = (result * factor).mod_floor(&modulus);
        }
        w = width;
    }
    Ok(result)
}

#[derive(Clone, Copy)]
enum ExpKernel {
    Rectangular,
    Balanced,
}

impl PAdicContext {

    ///
    /// The p-adic exponential at the precision of `x`; see
    /// [`PAdicContext::exp_prec`].
    ///
    pub fn exp(&self, x: &PAdicEl) -> Result<PAdicEl> {
        self.exp_prec(x, x.precision())
    }

    ///
    /// The p-adic exponential `sum x^i / i!` at precision `prec`.
    ///
    /// The series converges exactly for `ord_p(x) >= 1` (odd `p`), resp.
    /// `ord_p(x) >= 2` (`p = 2`); everything else fails with
    /// [`PAdicError::NotConvergent`]. The default evaluation is the
    /// balanced one.
    ///
    pub fn exp_prec(&self, x: &PAdicEl, prec: i64) -> Result<PAdicEl> {
        self.exp_impl(x, prec, ExpKernel::Balanced)
    }

    ///
    /// The exponential evaluated by rectangular splitting. Same result as
    /// [`PAdicContext::exp`], exposed for benchmarking.
    ///
    pub fn exp_rectangular(&self, x: &PAdicEl) -> Result<PAdicEl> {
        self.exp_rectangular_prec(x, x.precision())
    }

    pub fn exp_rectangular_prec(&self, x: &PAdicEl, prec: i64) -> Result<PAdicEl> {
        self.exp_impl(x, prec, ExpKernel::Rectangular)
    }

    ///
    /// The exponential evaluated by balanced valuation splitting. Same
    /// result as [`PAdicContext::exp`], exposed for benchmarking.
    ///
    pub fn exp_balanced(&self, x: &PAdicEl) -> Result<PAdicEl> {
        self.exp_balanced_prec(x, x.precision())
    }

    pub fn exp_balanced_prec(&self, x: &PAdicEl, prec: i64) -> Result<PAdicEl> {
        self.exp_impl(x, prec, ExpKernel::Balanced)
    }

    fn exp_impl(&self, x: &PAdicEl, prec: i64, kernel: ExpKernel) -> Result<PAdicEl> {
        let vmin = if self.prime_small() == Some(2) { 2 } else { 1 };
        if !x.is_zero() && x.valuation() < vmin {
            return Err(PAdicError::NotConvergent);
        }
        if prec <= 0 {
            return Ok(self.zero(prec));
        }
        if x.is_zero() || x.valuation() >= prec {
            return Ok(self.one(prec));
        }
        let arg = x.unit() * self.pow(x.valuation() as u64).as_ref();
        let unit = match kernel {
            ExpKernel::Rectangular => {
                trace!(prec, "exp via rectangular splitting");
                exp_series_rectangular(self, &arg, x.valuation(), prec)?
            }
            ExpKernel::Balanced => {
                trace!(prec, "exp via balanced splitting");
                exp_series_balanced(self, &arg, x.valuation(), prec)?
            }
        };
        let mut r = PAdicEl { unit, val: 0, prec };
        self.reduce_canonical(&mut r);
        debug_assert!(self.is_reduced(&r));
        Ok(r)
    }
}

///
/// Recovers `T / (n-1)!  mod p^N` from `T` and `F = (n-1)!`, both reduced
/// mod `p^(N + w)` with `w = ord_p((n-1)!)`: divide the power of `p` out of
/// both exactly, then multiply by the inverse of the remaining unit.
///
fn remove_factorial(
    ctx: &PAdicContext,
    t: BigInt,
    f: BigInt,
    w: u64,
    n_prec: i64,
) -> Result<BigInt> {
    let pw = ctx.pow(w);
    let (t_shifted, r) = t.div_rem(pw.as_ref());
    debug_assert!(r.is_zero());
    let (f_shifted, r) = f.div_rem(pw.as_ref());
    debug_assert!(r.is_zero());
    let modulus = ctx.pow(n_prec as u64);
    let modulus = modulus.as_ref();
    let f_inv = f_shifted
        .mod_floor(modulus)
        .modinv(modulus)
        .ok_or(PAdicError::Internal("factorial with p removed is a unit"))?;
    Ok((t_shifted.mod_floor(modulus) * f_inv).mod_floor(modulus))
}

#[cfg(test)]
use num_rational::BigRational;

#[cfg(test)]
fn exp_reference(ctx: &PAdicContext, x: i64, v: i64, prec: i64) -> PAdicEl {
    // partial sum of the exponential series over the rationals
    let n = exp_bound(ctx, v, prec);
    let mut sum = BigRational::zero();
    let mut term = BigRational::one();
    for i in 1..=n {
        sum = &sum + &term;
        term = &term * BigRational::new(BigInt::from(x), BigInt::from(i));
    }
    ctx.from_rational(&sum, prec)
}

#[test]
fn test_exp_bound() {
    let q7 = PAdicContext::with_prime(BigInt::from(7)).unwrap();
    assert_eq!(6, exp_bound(&q7, 2, 10));
    let q2 = PAdicContext::with_prime(BigInt::from(2)).unwrap();
    assert_eq!(9, exp_bound(&q2, 2, 10));
}

#[test]
fn test_exp_of_49() {
    let q7 = PAdicContext::with_prime(BigInt::from(7)).unwrap();
    let x = q7.from_i64(49, 10);
    let expected = exp_reference(&q7, 49, 2, 10);
    assert_eq!(expected, q7.exp(&x).unwrap());
}

#[test]
fn test_exp_domain_2adic() {
    let q2 = PAdicContext::with_prime(BigInt::from(2)).unwrap();
    assert!(q2.exp(&q2.from_i64(4, 10)).is_ok());
    assert_eq!(
        Err(PAdicError::NotConvergent),
        q2.exp(&q2.from_i64(2, 10))
    );
    let expected = exp_reference(&q2, 4, 2, 10);
    assert_eq!(expected, q2.exp(&q2.from_i64(4, 10)).unwrap());
}

#[test]
fn test_exp_domain_odd() {
    let q7 = PAdicContext::with_prime(BigInt::from(7)).unwrap();
    assert_eq!(Err(PAdicError::NotConvergent), q7.exp(&q7.from_i64(3, 10)));
    assert_eq!(q7.one(10), q7.exp(&q7.zero(10)).unwrap());
}

#[test]
fn test_exp_variants_agree() {
    let q3 = PAdicContext::with_prime(BigInt::from(3)).unwrap();
    let mut rng = oorandom::Rand64::new(5);
    for prec in [1i64, 2, 5, 17, 40] {
        for _ in 0..10 {
            let mut x = q3.from_bigint(&crate::element::random_bits(&mut rng, 50), prec);
            x = q3.shift(&x, 1);
            if x.is_zero() {
                continue;
            }
            let naive = {
                let arg = x.unit() * q3.pow(x.valuation() as u64).as_ref();
                let unit = exp_series(&q3, &arg, x.valuation(), prec).unwrap();
                let mut r = PAdicEl { unit, val: 0, prec };
                q3.reduce(&mut r);
                r
            };
            let rect = q3.exp_rectangular_prec(&x, prec).unwrap();
            let bal = q3.exp_balanced_prec(&x, prec).unwrap();
            assert_eq!(naive, rect);
            assert_eq!(naive, bal);
        }
    }
}

#[test]
fn test_exp_large_prime() {
    // a prime beyond word size takes the ceil(N/v) bound branch
    let p = (BigInt::one() << 89u32) - BigInt::one();
    let qp = PAdicContext::new(p.clone(), 0, 8, crate::PrintMode::Terse).unwrap();
    let x = qp.from_bigint(&p, 2);
    let e = qp.exp(&x).unwrap();
    assert_eq!(BigInt::one() + &p, qp.to_bigint(&e).unwrap());
    assert_eq!(x, qp.log(&e).unwrap());
}

#[test]
fn test_exp_is_homomorphic() {
    let q5 = PAdicContext::with_prime(BigInt::from(5)).unwrap();
    let x = q5.from_i64(10, 12);
    let y = q5.from_i64(75, 12);
    let lhs = q5.exp(&q5.add(&x, &y)).unwrap();
    let rhs = q5.mul_prec(&q5.exp(&x).unwrap(), &q5.exp(&y).unwrap(), 12);
    assert_eq!(lhs, rhs);
}
