use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, ToPrimitive, Zero};

use crate::context::PAdicContext;

///
/// `ord_p(n!)`, via Legendre's formula `(n - s_p(n)) / (p - 1)` where
/// `s_p(n)` is the base-p digit sum; for `p = 2` this is `n - popcount(n)`.
///
/// The exponential kernels call this to size their working modulus, and for
/// the series lengths arising there the result always fits a word.
///
pub fn val_fac(ctx: &PAdicContext, n: u64) -> u64 {
    match ctx.prime_small() {
        Some(2) => n - n.count_ones() as u64,
        Some(p) => (n - digit_sum(ctx, n)) / (p - 1),
        // a prime beyond word size never divides n! for word-sized n
        None => 0,
    }
}

///
/// `ord_p(n!)` for arbitrary `n >= 0`.
///
pub fn val_fac_bigint(ctx: &PAdicContext, n: &BigInt) -> BigInt {
    assert!(!n.is_negative());
    if let Some(n) = n.to_u64() {
        return BigInt::from(val_fac(ctx, n));
    }
    if ctx.prime_small() == Some(2) {
        let popcount: u64 = n
            .magnitude()
            .iter_u64_digits()
            .map(|d| d.count_ones() as u64)
            .sum();
        return n - BigInt::from(popcount);
    }
    let mut s = BigInt::zero();
    let mut m = n.clone();
    while !m.is_zero() {
        let (q, d) = m.div_rem(ctx.prime());
        s += d;
        m = q;
    }
    (n - s) / (ctx.prime() - BigInt::from(1))
}

fn digit_sum(ctx: &PAdicContext, mut n: u64) -> u64 {
    let mut s = 0;
    while n > 0 {
        let (q, d) = ctx.div_rem_p_small(n);
        s += d;
        n = q;
    }
    s
}

#[test]
fn test_val_fac_small() {
    let q2 = PAdicContext::with_prime(BigInt::from(2)).unwrap();
    assert_eq!(8, val_fac(&q2, 10));
    assert_eq!(7, val_fac(&q2, 8));
    let q5 = PAdicContext::with_prime(BigInt::from(5)).unwrap();
    assert_eq!(24, val_fac(&q5, 100));
    assert_eq!(0, val_fac(&q5, 4));
    let q7 = PAdicContext::with_prime(BigInt::from(7)).unwrap();
    assert_eq!(8, val_fac(&q7, 49));
    assert_eq!(0, val_fac(&q7, 0));
}

#[test]
fn test_val_fac_bigint_agrees() {
    let q3 = PAdicContext::with_prime(BigInt::from(3)).unwrap();
    for n in [0u64, 1, 2, 3, 26, 27, 1000] {
        assert_eq!(
            BigInt::from(val_fac(&q3, n)),
            val_fac_bigint(&q3, &BigInt::from(n))
        );
    }
}

#[test]
fn test_val_fac_bigint_large() {
    let q2 = PAdicContext::with_prime(BigInt::from(2)).unwrap();
    // 2^70 has a single set bit
    let n = BigInt::from(1u64) << 70u32;
    assert_eq!(&n - BigInt::from(1), val_fac_bigint(&q2, &n));
}
