use std::cmp::min;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Zero};
use tracing::trace;

use crate::algorithms::hensel::InvState;
use crate::algorithms::isqrt;
use crate::context::PAdicContext;
use crate::element::PAdicEl;
use crate::error::{PAdicError, Result};

///
/// The truncation length for `log` at `y = 1 - x` of valuation `v >= 1`:
/// the smallest `b` (up to the coarseness of the p-power sieve below) with
/// `i*v - ord_p(i) >= N` for all `i >= b`.
///
/// Only indices of valuation `k` with `p^k` below `ceil((N + k)/v)` can
/// violate the naive guess `ceil(N / v)`, so finitely many `k` are checked.
///
pub fn log_bound(ctx: &PAdicContext, v: i64, n: i64) -> i64 {
    assert!(v >= 1 && n >= 1);
    assert!(n < (1i64 << 62));
    let mut b = (n + v - 1) / v;
    if let Some(p) = ctx.prime_small() {
        let p = p as i128;
        let mut pk = p;
        let mut k = 1i64;
        loop {
            let t = ((n + k) as i128 + v as i128 - 1) / v as i128;
            if pk >= t {
                break;
            }
            b = std::cmp::max(b, t as i64);
            k += 1;
            pk = pk.saturating_mul(p);
        }
    }
    b
}

///
/// Largest `k` with `p^k < bound`, i.e. the largest valuation occurring
/// among the summation indices `1, ..., bound - 1`.
///
fn max_index_ord(ctx: &PAdicContext, bound: i64) -> u64 {
    match ctx.prime_small() {
        Some(p) => {
            let mut k = 0;
            let mut pk = p as i128;
            while pk < bound as i128 {
                k += 1;
                pk *= p as i128;
            }
            k
        }
        None => 0,
    }
}

///
/// Splits a summation index into `i = p^k * m` with `m` a unit.
///
fn split_index(ctx: &PAdicContext, i: u64) -> (u64, u64) {
    match ctx.prime_small() {
        Some(p) => {
            let mut k = 0;
            let mut m = i;
            while m % p == 0 {
                k += 1;
                m /= p;
            }
            (k, m)
        }
        None => (0, i),
    }
}

///
/// Evaluates `log(1 - y) = -sum_(i >= 1) y^i / i  mod p^N` for an integer
/// `y` of valuation `>= v >= 1`.
///
/// The division by `p^(ord_p i)` inside each term is delayed: every term is
/// scaled by `p^(kmax - ord_p i)` instead, the sum runs mod `p^(N + kmax)`,
/// and one exact division by `p^kmax` finishes. The unit part of each index
/// is inverted modularly.
///
pub(crate) fn log_series(ctx: &PAdicContext, y: &BigInt, v: i64, n_prec: i64) -> Result<BigInt> {
    let b = log_bound(ctx, v, n_prec);
    let kmax = max_index_ord(ctx, b);
    let modulus = ctx.pow(n_prec as u64 + kmax);
    let modulus = modulus.as_ref();
    let y = y.mod_floor(modulus);
    let mut acc = BigInt::zero();
    let mut ypow = BigInt::one();
    for i in 1..b {
        ypow = (ypow * &y).mod_floor(modulus);
        if ypow.is_zero() {
            break;
        }
        let (k, m) = split_index(ctx, i as u64);
        let m_inv = BigInt::from(m)
            .modinv(modulus)
            .ok_or(PAdicError::Internal("index with p removed is a unit"))?;
        let term = ((&ypow * m_inv).mod_floor(modulus) * ctx.pow(kmax - k).as_ref())
            .mod_floor(modulus);
        acc = (acc + term).mod_floor(modulus);
    }
    finish_scaled_sum(ctx, acc, kmax, n_prec)
}

///
/// As [`log_series`], with the scaled sum evaluated by rectangular
/// splitting over baby powers `y^0 ..= y^bs`, `bs ~ sqrt(b)`.
///
pub(crate) fn log_series_rectangular(
    ctx: &PAdicContext,
    y: &BigInt,
    v: i64,
    n_prec: i64,
) -> Result<BigInt> {
    let b = log_bound(ctx, v, n_prec) as usize;
    let kmax = max_index_ord(ctx, b as i64);
    let modulus = ctx.pow(n_prec as u64 + kmax);
    let modulus = modulus.as_ref();
    let y = y.mod_floor(modulus);
    let bs = isqrt((b as u64).saturating_sub(1).max(1)) as usize + 1;
    let mut ys = Vec::with_capacity(bs + 1);
    ys.push(BigInt::one());
    for j in 1..=bs {
        ys.push((&ys[j - 1] * &y).mod_floor(modulus));
    }
    let blocks = (b + bs - 1) / bs;
    let mut acc = BigInt::zero();
    for j in (0..blocks).rev() {
        let start = j * bs;
        let end = min(b, (j + 1) * bs);
        let mut inner = BigInt::zero();
        for i in start.max(1)..end {
            let (k, m) = split_index(ctx, i as u64);
            let m_inv = BigInt::from(m)
                .modinv(modulus)
                .ok_or(PAdicError::Internal("index with p removed is a unit"))?;
            let scaled = ((&ys[i - start] * m_inv).mod_floor(modulus)
                * ctx.pow(kmax - k).as_ref())
            .mod_floor(modulus);
            inner += scaled;
        }
        acc = ((acc * &ys[bs]) + inner).mod_floor(modulus);
    }
    finish_scaled_sum(ctx, acc, kmax, n_prec)
}

///
/// Satoh-Skjernaa-Taguchi: since `ord_p(a^(p^k) - 1) > k` for `a = 1 mod p`,
/// raising `x` to the `p^k`-th power shortens the series drastically;
/// `log(x)` is the log of the lift divided by `p^k`, so the lift is
/// computed with `k` guard digits.
///
pub(crate) fn log_series_satoh(
    ctx: &PAdicContext,
    x: &BigInt,
    n_prec: i64,
) -> Result<BigInt> {
    let k = (isqrt(n_prec as u64) as i64).max(1);
    let wide_prec = n_prec + k;
    let modulus = ctx.pow(wide_prec as u64);
    let modulus = modulus.as_ref();
    let exponent = ctx.pow(k as u64).into_owned();
    let lift = x.mod_floor(modulus).modpow(&exponent, modulus);
    let y = (BigInt::one() - lift).mod_floor(modulus);
    if y.is_zero() {
        return Ok(BigInt::zero());
    }
    let lifted_log = log_series(ctx, &y, ctx.ord(&y), wide_prec)?;
    let (scaled, r) = lifted_log.div_rem(ctx.pow(k as u64).as_ref());
    debug_assert!(r.is_zero());
    Ok(scaled.mod_floor(ctx.pow(n_prec as u64).as_ref()))
}

///
/// Balanced evaluation: peels valuation chunks of doubling width off
/// `y = 1 - x`, summing the short series of each chunk and dividing it
/// back out of `x`, with one [`InvState`] serving all chunk divisions.
///
pub(crate) fn log_series_balanced(
    ctx: &PAdicContext,
    x: &BigInt,
    v: i64,
    n_prec: i64,
) -> Result<BigInt> {
    let modulus = ctx.pow(n_prec as u64).into_owned();
    let mut total = BigInt::zero();
    let mut cur = x.mod_floor(&modulus);
    let mut w = v;
    let mut inv_state = InvState::new(ctx, n_prec);
    loop {
        let y = (BigInt::one() - &cur).mod_floor(&modulus);
        if y.is_zero() {
            break;
        }
        let width = min(2 * w, n_prec);
        let chunk = y.mod_floor(ctx.pow(width as u64).as_ref());
        if !chunk.is_zero() {
            total = (total + log_series(ctx, &chunk, w, n_prec)?).mod_floor(&modulus);
            let factor = (BigInt::one() - &chunk).mod_floor(&modulus);
            let factor_inv = inv_state.invert_unit(ctx, &factor)?;
            cur = (cur * factor_inv).mod_floor(&modulus);
        }
        if width >= n_prec {
            debug_assert!((BigInt::one() - &cur).mod_floor(&modulus).is_zero());
            break;
        }
        w = width;
    }
    Ok(total)
}

#[derive(Clone, Copy)]
enum LogKernel {
    Rectangular,
    Satoh,
    Balanced,
}

///
/// Below this precision the dispatcher picks rectangular splitting over
/// the asymptotically better balanced evaluation.
///
const LOG_BALANCED_CUTOFF: i64 = 32;

impl PAdicContext {

    ///
    /// The p-adic logarithm at the precision of `x`; see
    /// [`PAdicContext::log_prec`].
    ///
    pub fn log(&self, x: &PAdicEl) -> Result<PAdicEl> {
        self.log_prec(x, x.precision())
    }

    ///
    /// The p-adic logarithm `-sum (1-x)^i / i` at precision `prec`.
    ///
    /// The series converges exactly for `ord_p(1 - x) >= 1` (odd `p`),
    /// resp. `>= 2` (`p = 2`); everything else fails with
    /// [`PAdicError::NotConvergent`]. Dispatches on the precision between
    /// the rectangular and the balanced evaluation.
    ///
    pub fn log_prec(&self, x: &PAdicEl, prec: i64) -> Result<PAdicEl> {
        if prec < LOG_BALANCED_CUTOFF {
            self.log_impl(x, prec, LogKernel::Rectangular)
        } else {
            self.log_impl(x, prec, LogKernel::Balanced)
        }
    }

    ///
    /// The logarithm evaluated by rectangular splitting. Same result as
    /// [`PAdicContext::log`], exposed for benchmarking.
    ///
    pub fn log_rectangular(&self, x: &PAdicEl) -> Result<PAdicEl> {
        self.log_rectangular_prec(x, x.precision())
    }

    pub fn log_rectangular_prec(&self, x: &PAdicEl, prec: i64) -> Result<PAdicEl> {
        self.log_impl(x, prec, LogKernel::Rectangular)
    }

    ///
    /// The logarithm evaluated via Satoh-Skjernaa-Taguchi lifting. Same
    /// result as [`PAdicContext::log`], exposed for benchmarking.
    ///
    pub fn log_satoh(&self, x: &PAdicEl) -> Result<PAdicEl> {
        self.log_satoh_prec(x, x.precision())
    }

    pub fn log_satoh_prec(&self, x: &PAdicEl, prec: i64) -> Result<PAdicEl> {
        self.log_impl(x, prec, LogKernel::Satoh)
    }

    ///
    /// The logarithm evaluated by balanced valuation splitting. Same
    /// result as [`PAdicContext::log`], exposed for benchmarking.
    ///
    pub fn log_balanced(&self, x: &PAdicEl) -> Result<PAdicEl> {
        self.log_balanced_prec(x, x.precision())
    }

    pub fn log_balanced_prec(&self, x: &PAdicEl, prec: i64) -> Result<PAdicEl> {
        self.log_impl(x, prec, LogKernel::Balanced)
    }

    fn log_impl(&self, x: &PAdicEl, prec: i64, kernel: LogKernel) -> Result<PAdicEl> {
        let vmin = if self.prime_small() == Some(2) { 2 } else { 1 };
        if x.is_zero() || x.valuation() != 0 {
            return Err(PAdicError::NotConvergent);
        }
        let y = BigInt::one() - x.unit();
        if y.is_zero() {
            return Ok(self.zero(prec));
        }
        let vy = self.ord(&y);
        if vy < vmin {
            return Err(PAdicError::NotConvergent);
        }
        if prec <= 0 || vy >= prec {
            return Ok(self.zero(prec));
        }
        let unit = match kernel {
            LogKernel::Rectangular => {
                trace!(prec, "log via rectangular splitting");
                log_series_rectangular(self, &y, vy, prec)?
            }
            LogKernel::Satoh => {
                trace!(prec, "log via Satoh-Skjernaa-Taguchi");
                log_series_satoh(self, x.unit(), prec)?
            }
            LogKernel::Balanced => {
                trace!(prec, "log via balanced splitting");
                log_series_balanced(self, x.unit(), vy, prec)?
            }
        };
        let mut r = PAdicEl { unit, val: 0, prec };
        self.reduce(&mut r);
        Ok(r)
    }
}

///
/// Exact division of the accumulated sum by `p^kmax`, reduction mod `p^N`
/// and the final sign flip of the series.
///
fn finish_scaled_sum(
    ctx: &PAdicContext,
    acc: BigInt,
    kmax: u64,
    n_prec: i64,
) -> Result<BigInt> {
    let (sum, r) = acc.div_rem(ctx.pow(kmax).as_ref());
    debug_assert!(r.is_zero());
    let modulus = ctx.pow(n_prec as u64);
    Ok((-sum).mod_floor(modulus.as_ref()))
}

#[cfg(test)]
use num_rational::BigRational;

#[cfg(test)]
fn log_reference(ctx: &PAdicContext, x: i64, prec: i64) -> PAdicEl {
    // partial sum of -sum (1-x)^i / i over the rationals
    let y = 1 - x;
    let v = ctx.ord(&BigInt::from(y));
    let b = log_bound(ctx, v, prec);
    let mut sum = BigRational::zero();
    let mut power = BigRational::one();
    for i in 1..b {
        power = &power * BigRational::from_integer(BigInt::from(y));
        sum = &sum + &power / BigRational::from_integer(BigInt::from(i));
    }
    let minus_sum = -sum;
    ctx.from_rational(&minus_sum, prec)
}

#[test]
fn test_log_bound() {
    let q3 = PAdicContext::with_prime(BigInt::from(3)).unwrap();
    let b = log_bound(&q3, 1, 10);
    assert!(b >= 10);
    // all truncated indices are below the target valuation
    for i in b..(b + 100) {
        let ord = q3.ord(&BigInt::from(i));
        assert!(i - ord >= 10);
    }
}

#[test]
fn test_log_of_one_plus_three() {
    let q3 = PAdicContext::with_prime(BigInt::from(3)).unwrap();
    let x = q3.from_i64(4, 10);
    let expected = log_reference(&q3, 4, 10);
    assert!(!expected.is_zero());
    assert_eq!(expected, q3.log(&x).unwrap());
    assert_eq!(expected, q3.log_satoh(&x).unwrap());
    assert_eq!(expected, q3.log_rectangular(&x).unwrap());
    assert_eq!(expected, q3.log_balanced(&x).unwrap());
}

#[test]
fn test_log_domain() {
    let q7 = PAdicContext::with_prime(BigInt::from(7)).unwrap();
    assert_eq!(Err(PAdicError::NotConvergent), q7.log(&q7.from_i64(3, 10)));
    assert_eq!(Err(PAdicError::NotConvergent), q7.log(&q7.from_i64(7, 10)));
    assert_eq!(Err(PAdicError::NotConvergent), q7.log(&q7.zero(10)));
    assert!(q7.log(&q7.one(10)).unwrap().is_zero());

    let q2 = PAdicContext::with_prime(BigInt::from(2)).unwrap();
    assert_eq!(Err(PAdicError::NotConvergent), q2.log(&q2.from_i64(3, 10)));
    assert!(q2.log(&q2.from_i64(5, 10)).is_ok());
}

#[test]
fn test_log_variants_agree() {
    let q5 = PAdicContext::with_prime(BigInt::from(5)).unwrap();
    let mut rng = oorandom::Rand64::new(6);
    for prec in [2i64, 7, 20, 40] {
        for _ in 0..10 {
            let u = crate::element::random_bits(&mut rng, 40);
            let x = q5.add_prec(
                &q5.one(prec),
                &q5.shift(&q5.from_bigint(&u, prec), 1),
                prec,
            );
            if x.valuation() != 0 {
                continue;
            }
            let a = q5.log_rectangular(&x).unwrap();
            let b = q5.log_satoh(&x).unwrap();
            let c = q5.log_balanced(&x).unwrap();
            let d = q5.log(&x).unwrap();
            assert_eq!(a, b);
            assert_eq!(a, c);
            assert_eq!(a, d);
        }
    }
}

#[test]
fn test_log_of_product() {
    let q7 = PAdicContext::with_prime(BigInt::from(7)).unwrap();
    let prec = 12;
    let x = q7.from_i64(8, prec);
    let y = q7.from_i64(50, prec);
    let lhs = q7.log(&q7.mul_prec(&x, &y, prec)).unwrap();
    let rhs = q7.add_prec(&q7.log(&x).unwrap(), &q7.log(&y).unwrap(), prec);
    assert_eq!(lhs, rhs);
}

#[test]
fn test_log_exp_round_trip() {
    let q7 = PAdicContext::with_prime(BigInt::from(7)).unwrap();
    let prec = 15;
    for n in [7i64, 14, 49, 343, 7 * 48] {
        let x = q7.from_i64(n, prec);
        let e = q7.exp(&x).unwrap();
        assert_eq!(x, q7.log(&e).unwrap());
    }
    for n in [8i64, 15, 50, 344] {
        let x = q7.from_i64(n, prec);
        let l = q7.log(&x).unwrap();
        assert_eq!(x, q7.exp(&l).unwrap());
    }
}

#[test]
fn test_log_exp_round_trip_2adic() {
    let q2 = PAdicContext::with_prime(BigInt::from(2)).unwrap();
    let prec = 16;
    let x = q2.from_i64(4, prec);
    let e = q2.exp(&x).unwrap();
    assert_eq!(x, q2.log(&e).unwrap());
}
