use std::borrow::Cow;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{ToPrimitive, Zero};
use tracing::debug;

use crate::error::{PAdicError, Result};
use crate::fmt::PrintMode;

///
/// The ambient data every operation in `Q_p` needs: the prime `p`, a dense
/// cache of the powers `p^min ..= p^max`, a reciprocal of `p` for the
/// word-sized fast paths, and the print mode used by
/// [`PAdicContext::format`](crate::fmt).
///
/// A context is read-only after construction. [`PAdicContext::pow`] hands out
/// cached powers by reference and computes powers outside the cached range on
/// the fly, so a context can be shared freely between readers.
///
/// The prime is not verified (a Miller-Rabin check runs in debug builds
/// only); handing in a composite makes the unit/valuation decomposition
/// meaningless.
///
pub struct PAdicContext {
    prime: BigInt,
    prime_small: Option<u64>,
    pinv: f64,
    pow_min: u64,
    pow_cache: Vec<BigInt>,
    print_mode: PrintMode,
}

impl PAdicContext {

    ///
    /// Creates a context for `Q_p` with the powers `p^pow_min ..= p^pow_max`
    /// precomputed. Fails with [`PAdicError::InvalidArg`] if the cache range
    /// is inverted or `p < 2`.
    ///
    pub fn new(prime: BigInt, pow_min: u64, pow_max: u64, print_mode: PrintMode) -> Result<Self> {
        if pow_min > pow_max {
            return Err(PAdicError::InvalidArg("cached power range is inverted"));
        }
        if prime < BigInt::from(2) {
            return Err(PAdicError::InvalidArg("prime must be at least 2"));
        }
        debug_assert!(crate::algorithms::miller_rabin::is_prime(
            &prime,
            crate::DEFAULT_PROBABILISTIC_REPETITIONS
        ));
        let mut pow_cache = Vec::with_capacity((pow_max - pow_min + 1) as usize);
        pow_cache.push((&prime).pow(u32::try_from(pow_min).expect("pow_min exceeds u32")));
        for _ in pow_min..pow_max {
            let next = pow_cache.last().unwrap() * &prime;
            pow_cache.push(next);
        }
        let prime_small = prime.to_u64();
        let pinv = match prime_small {
            Some(p) => 1.0 / (p as f64),
            None => 0.0,
        };
        debug!(cached_powers = pow_cache.len(), "created p-adic context");
        return Ok(PAdicContext { prime, prime_small, pinv, pow_min, pow_cache, print_mode });
    }

    ///
    /// Creates a context with the default cache range and terse printing.
    ///
    pub fn with_prime(prime: BigInt) -> Result<Self> {
        Self::new(prime, 0, 2 * crate::DEFAULT_PRECISION as u64, PrintMode::Terse)
    }

    pub fn prime(&self) -> &BigInt {
        &self.prime
    }

    ///
    /// The prime as a machine word, when it fits one.
    ///
    pub fn prime_small(&self) -> Option<u64> {
        self.prime_small
    }

    pub fn print_mode(&self) -> PrintMode {
        self.print_mode
    }

    pub fn set_print_mode(&mut self, print_mode: PrintMode) {
        self.print_mode = print_mode;
    }

    ///
    /// Returns `p^e`, borrowed from the cache when `e` lies in the cached
    /// range and freshly computed otherwise. Hot loops (series evaluation,
    /// Hensel lifting) call this for every reduction modulus, so contexts
    /// should be created with a range covering the working precisions.
    ///
    pub fn pow(&self, e: u64) -> Cow<'_, BigInt> {
        if e >= self.pow_min && e - self.pow_min < self.pow_cache.len() as u64 {
            Cow::Borrowed(&self.pow_cache[(e - self.pow_min) as usize])
        } else {
            Cow::Owned((&self.prime).pow(u32::try_from(e).expect("exponent exceeds u32")))
        }
    }

    ///
    /// Divides a word by `p` using the precomputed reciprocal, falling back
    /// to hardware division when the floating-point estimate is off.
    ///
    pub(crate) fn div_rem_p_small(&self, x: u64) -> (u64, u64) {
        let p = self.prime_small.expect("word-sized prime required");
        let q = (x as f64 * self.pinv) as u64;
        let r = x as i128 - q as i128 * p as i128;
        if r < 0 || r >= p as i128 {
            return (x / p, x % p);
        }
        return (q, r as u64);
    }

    ///
    /// Divides the maximal power of `p` out of `n` and returns its exponent.
    /// `n` must be nonzero.
    ///
    pub(crate) fn remove_p_factors(&self, n: &mut BigInt) -> i64 {
        debug_assert!(!n.is_zero());
        let mut k = 0;
        loop {
            let (q, r) = n.div_rem(&self.prime);
            if !r.is_zero() {
                return k;
            }
            *n = q;
            k += 1;
        }
    }

    ///
    /// The valuation `ord_p(n)` of a nonzero integer.
    ///
    pub(crate) fn ord(&self, n: &BigInt) -> i64 {
        let mut m = n.clone();
        self.remove_p_factors(&mut m)
    }
}

#[cfg(test)]
use num_traits::One;

#[test]
fn test_pow_cache() {
    let qp = PAdicContext::new(BigInt::from(7), 0, 10, PrintMode::Terse).unwrap();
    assert!(matches!(qp.pow(3), Cow::Borrowed(_)));
    assert_eq!(BigInt::from(343), *qp.pow(3));
    assert!(matches!(qp.pow(12), Cow::Owned(_)));
    assert_eq!(BigInt::from(13841287201i64), *qp.pow(12));
    assert_eq!(BigInt::one(), *qp.pow(0));
}

#[test]
fn test_pow_cache_offset_range() {
    let qp = PAdicContext::new(BigInt::from(5), 2, 4, PrintMode::Terse).unwrap();
    assert!(matches!(qp.pow(1), Cow::Owned(_)));
    assert!(matches!(qp.pow(2), Cow::Borrowed(_)));
    assert!(matches!(qp.pow(4), Cow::Borrowed(_)));
    assert_eq!(BigInt::from(625), *qp.pow(4));
}

#[test]
fn test_invalid_args() {
    assert!(matches!(
        PAdicContext::new(BigInt::from(7), 5, 3, PrintMode::Terse),
        Err(PAdicError::InvalidArg(_))
    ));
    assert!(matches!(
        PAdicContext::new(BigInt::from(1), 0, 3, PrintMode::Terse),
        Err(PAdicError::InvalidArg(_))
    ));
}

#[test]
fn test_div_rem_p_small() {
    let qp = PAdicContext::with_prime(BigInt::from(7)).unwrap();
    for x in [0u64, 1, 6, 7, 48, 49, 1000000007] {
        assert_eq!((x / 7, x % 7), qp.div_rem_p_small(x));
    }
}

#[test]
fn test_ord() {
    let qp = PAdicContext::with_prime(BigInt::from(3)).unwrap();
    assert_eq!(0, qp.ord(&BigInt::from(7)));
    assert_eq!(4, qp.ord(&BigInt::from(81)));
    assert_eq!(2, qp.ord(&BigInt::from(-18)));
}
