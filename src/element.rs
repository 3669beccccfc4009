use std::fmt;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, Zero};

use crate::context::PAdicContext;

///
/// An element of `Q_p`, stored as the triple `(unit, val, prec)` and
/// representing the residue class `unit * p^val + O(p^prec)`.
///
/// # Reduced form
///
/// Either the element is zero (`unit == 0`, `val == 0`), or
/// `gcd(unit, p) = 1` and `0 <= unit < p^(prec - val)`. Every element
/// returned from a public operation of [`PAdicContext`] is reduced;
/// intermediate states may carry units divisible by `p` or negative units
/// until [`PAdicContext::reduce`] runs.
///
/// The relative precision is `prec - val`; when it is `<= 0` the element is
/// zero to the tracked precision. `prec` is fixed at creation and only
/// changed through [`PAdicContext::set_precision`].
///
/// The `Debug` impl prints the raw triple as `(u v N)`.
///
#[derive(Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PAdicEl {
    pub(crate) unit: BigInt,
    pub(crate) val: i64,
    pub(crate) prec: i64,
}

impl PAdicEl {

    pub fn unit(&self) -> &BigInt {
        &self.unit
    }

    pub fn valuation(&self) -> i64 {
        self.val
    }

    ///
    /// The absolute precision `N`: the element is a residue class mod `p^N`.
    ///
    pub fn precision(&self) -> i64 {
        self.prec
    }

    pub fn relative_precision(&self) -> i64 {
        self.prec - self.val
    }

    ///
    /// Whether the element is zero to its tracked precision.
    ///
    pub fn is_zero(&self) -> bool {
        self.unit.is_zero()
    }
}

impl fmt::Debug for PAdicEl {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        write!(out, "({} {} {})", self.unit, self.val, self.prec)
    }
}

impl PAdicContext {

    pub fn zero(&self, prec: i64) -> PAdicEl {
        PAdicEl { unit: BigInt::zero(), val: 0, prec }
    }

    pub fn one(&self, prec: i64) -> PAdicEl {
        let mut el = PAdicEl { unit: BigInt::one(), val: 0, prec };
        self.reduce_canonical(&mut el);
        el
    }

    ///
    /// Divides the maximal power of `p` out of the unit, moving it into the
    /// valuation. Zero gets the conventional valuation 0.
    ///
    pub(crate) fn canonicalize(&self, x: &mut PAdicEl) {
        if x.unit.is_zero() {
            x.val = 0;
            return;
        }
        x.val += self.remove_p_factors(&mut x.unit);
    }

    ///
    /// Reduces a canonical element: collapses it to zero when `val >= prec`,
    /// otherwise maps the unit to its representative in `[0, p^(prec - val))`.
    ///
    pub(crate) fn reduce_canonical(&self, x: &mut PAdicEl) {
        if x.unit.is_zero() {
            x.val = 0;
            return;
        }
        if x.val >= x.prec {
            x.unit.set_zero();
            x.val = 0;
            return;
        }
        let modulus = self.pow((x.prec - x.val) as u64);
        x.unit = x.unit.mod_floor(modulus.as_ref());
    }

    ///
    /// Brings an arbitrary `(unit, val, prec)` triple into reduced form.
    ///
    pub fn reduce(&self, x: &mut PAdicEl) {
        self.canonicalize(x);
        self.reduce_canonical(x);
    }

    ///
    /// Replaces the tracked precision and re-reduces. Raising the precision
    /// does not create information: the representative is kept as is.
    ///
    pub fn set_precision(&self, x: &mut PAdicEl, prec: i64) {
        x.prec = prec;
        self.reduce(x);
    }

    pub(crate) fn is_reduced(&self, x: &PAdicEl) -> bool {
        if x.unit.is_zero() {
            return x.val == 0;
        }
        if x.val >= x.prec || x.unit.is_negative() {
            return false;
        }
        if x.unit.mod_floor(self.prime()).is_zero() {
            return false;
        }
        x.unit < *self.pow((x.prec - x.val) as u64).as_ref()
    }

    ///
    /// A uniformly-ish random reduced element with valuation in
    /// `[-prec/2, prec/2]`, for exercising the algebraic laws in tests.
    ///
    pub fn random_element(&self, rng: &mut oorandom::Rand64, prec: i64) -> PAdicEl {
        if prec <= 0 {
            return self.zero(prec);
        }
        let half = prec / 2;
        let val = rng.rand_range(0..(2 * half as u64 + 1)) as i64 - half;
        let bound = self.pow((prec - val) as u64);
        let unit = random_below(rng, bound.as_ref());
        let mut el = PAdicEl { unit, val, prec };
        self.reduce(&mut el);
        el
    }
}

///
/// A nonnegative integer with the given number of random bits.
///
pub fn random_bits(rng: &mut oorandom::Rand64, bits: u64) -> BigInt {
    let mut acc = BigInt::zero();
    let mut remaining = bits;
    while remaining >= 64 {
        acc = (acc << 64u32) + BigInt::from(rng.rand_u64());
        remaining -= 64;
    }
    if remaining > 0 {
        acc = (acc << (remaining as u32)) + BigInt::from(rng.rand_u64() >> (64 - remaining));
    }
    acc
}

///
/// A random integer in `[0, bound)`. The slight modular bias is irrelevant
/// for test data.
///
pub fn random_below(rng: &mut oorandom::Rand64, bound: &BigInt) -> BigInt {
    assert!(*bound > BigInt::zero());
    random_bits(rng, bound.bits() + 16).mod_floor(bound)
}

#[test]
fn test_reduce() {
    let qp = PAdicContext::with_prime(BigInt::from(7)).unwrap();
    let mut x = PAdicEl { unit: BigInt::from(56), val: 0, prec: 5 };
    qp.reduce(&mut x);
    assert_eq!(BigInt::from(8), *x.unit());
    assert_eq!(1, x.valuation());
    assert_eq!(5, x.precision());
    assert_eq!(4, x.relative_precision());
    assert!(qp.is_reduced(&x));
    assert_eq!("(8 1 5)", format!("{:?}", x));
}

#[test]
fn test_reduce_collapses_to_zero() {
    let qp = PAdicContext::with_prime(BigInt::from(7)).unwrap();
    let mut x = PAdicEl { unit: BigInt::from(7i64.pow(6)), val: 0, prec: 5 };
    qp.reduce(&mut x);
    assert!(x.is_zero());
    assert_eq!(0, x.valuation());
    assert_eq!(5, x.precision());
}

#[test]
fn test_reduce_negative_unit() {
    let qp = PAdicContext::with_prime(BigInt::from(7)).unwrap();
    let mut x = PAdicEl { unit: BigInt::from(-1), val: 0, prec: 3 };
    qp.reduce(&mut x);
    assert_eq!(BigInt::from(342), *x.unit());
    assert!(qp.is_reduced(&x));
}

#[test]
fn test_set_precision() {
    let qp = PAdicContext::with_prime(BigInt::from(7)).unwrap();
    let mut x = qp.from_i64(2402, 10);
    assert_eq!(0, x.valuation());
    qp.set_precision(&mut x, 4);
    // 2402 = 1 + 7^4, so at precision 4 only the 1 survives
    assert_eq!(BigInt::one(), *x.unit());
    assert_eq!(4, x.precision());
}

#[test]
fn test_random_element_reduced() {
    let qp = PAdicContext::with_prime(BigInt::from(5)).unwrap();
    let mut rng = oorandom::Rand64::new(1);
    for _ in 0..100 {
        let x = qp.random_element(&mut rng, 8);
        assert!(qp.is_reduced(&x));
        assert_eq!(8, x.precision());
    }
}

#[test]
fn test_random_below() {
    let mut rng = oorandom::Rand64::new(1);
    let bound = BigInt::from(1000);
    for _ in 0..50 {
        let x = random_below(&mut rng, &bound);
        assert!(!x.is_negative() && x < bound);
    }
}
