///
/// Contains [`hensel::InvState`] and the Hensel-lifting inversion kernel
/// used by division, the square root and the logarithm.
///
pub mod hensel;
///
/// Contains the p-adic square root, together with a Tonelli-Shanks square
/// root modulo a prime.
///
pub mod sqrt;
///
/// Contains the Teichmüller lift, i.e. the unique `(p-1)`-th root of unity
/// congruent to a given unit.
///
pub mod teichmuller;
///
/// Contains the p-adic exponential: convergence test, truncation bound and
/// the naive, rectangular-splitting and balanced series evaluations.
///
pub mod exp;
///
/// Contains the p-adic logarithm: convergence test, truncation bound and
/// the rectangular-splitting, Satoh-Skjernaa-Taguchi and balanced series
/// evaluations.
///
pub mod log;
///
/// Contains [`val_fac::val_fac()`] for computing `ord_p(n!)` from base-p
/// digit sums.
///
pub mod val_fac;
///
/// Contains an implementation of the Miller-Rabin probabilistic primality
/// test.
///
pub mod miller_rabin;

///
/// Floor of the square root, used to size the baby-step tables of the
/// rectangular series evaluations.
///
pub(crate) fn isqrt(n: u64) -> u64 {
    let mut r = (n as f64).sqrt() as u64;
    while r > 0 && (r as u128) * (r as u128) > n as u128 {
        r -= 1;
    }
    while ((r + 1) as u128) * ((r + 1) as u128) <= n as u128 {
        r += 1;
    }
    r
}

#[test]
fn test_isqrt() {
    assert_eq!(0, isqrt(0));
    assert_eq!(1, isqrt(3));
    assert_eq!(2, isqrt(4));
    assert_eq!(9, isqrt(99));
    assert_eq!(10, isqrt(100));
    assert_eq!(u32::MAX as u64, isqrt(u64::MAX));
}
