use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Zero};

use crate::context::PAdicContext;
use crate::error::{PAdicError, Result};

///
/// The precision schedule for quadratically convergent lifting:
/// `a_0 = n, a_{i+1} = ceil(a_i / 2), ..., 1`. A Newton step from a solution
/// mod `p^(a_{i+1})` is valid mod `p^(2 a_{i+1})`, which covers `p^(a_i)`.
///
pub(crate) fn doubling_schedule(n: i64) -> Vec<i64> {
    assert!(n >= 1);
    let mut schedule = vec![n];
    while *schedule.last().unwrap() > 1 {
        let next = (schedule.last().unwrap() + 1) / 2;
        schedule.push(next);
    }
    schedule
}

///
/// Reusable state for inverting units mod `p^N`: the doubling schedule, the
/// powers `p^(a_i)` it needs, and scratch. Inverting repeatedly at the same
/// target precision (as the balanced logarithm does for its chunk divisions)
/// reuses the power table instead of recomputing it per call.
///
/// An `InvState` is mutated in place by every call, so it belongs to a
/// single work stream; create one per thread.
///
pub struct InvState {
    target: i64,
    schedule: Vec<i64>,
    pows: Vec<BigInt>,
    scratch: BigInt,
}

impl InvState {

    ///
    /// Precomputes the schedule and power table for inversion mod
    /// `p^target`, `target >= 1`.
    ///
    pub fn new(ctx: &PAdicContext, target: i64) -> Self {
        assert!(target >= 1);
        let schedule = doubling_schedule(target);
        let pows = schedule.iter().map(|a| ctx.pow(*a as u64).into_owned()).collect();
        InvState { target, schedule, pows, scratch: BigInt::zero() }
    }

    pub fn target_precision(&self) -> i64 {
        self.target
    }

    ///
    /// The inverse of the unit `u` mod `p^target`, by lifting
    /// `x <- x * (2 - u*x)` along the schedule starting from the inverse
    /// mod `p`. Fails with [`PAdicError::NotUnit`] if `p` divides `u`.
    ///
    pub fn invert_unit(&mut self, ctx: &PAdicContext, u: &BigInt) -> Result<BigInt> {
        let p = ctx.prime();
        let mut x = u.mod_floor(p).modinv(p).ok_or(PAdicError::NotUnit)?;
        for i in (0..self.schedule.len() - 1).rev() {
            let modulus = &self.pows[i];
            self.scratch = u.mod_floor(modulus);
            self.scratch = (&self.scratch * &x).mod_floor(modulus);
            self.scratch = BigInt::from(2) - &self.scratch;
            x = (&x * &self.scratch).mod_floor(modulus);
        }
        debug_assert!((u.mod_floor(&self.pows[0]) * &x).mod_floor(&self.pows[0]).is_one());
        Ok(x)
    }
}

///
/// One-shot unit inversion mod `p^n`.
///
pub(crate) fn invert_unit(ctx: &PAdicContext, u: &BigInt, n: i64) -> Result<BigInt> {
    InvState::new(ctx, n).invert_unit(ctx, u)
}

#[test]
fn test_doubling_schedule() {
    assert_eq!(vec![1], doubling_schedule(1));
    assert_eq!(vec![2, 1], doubling_schedule(2));
    assert_eq!(vec![10, 5, 3, 2, 1], doubling_schedule(10));
    assert_eq!(vec![100, 50, 25, 13, 7, 4, 2, 1], doubling_schedule(100));
}

#[test]
fn test_invert_unit() {
    let qp = PAdicContext::with_prime(BigInt::from(7)).unwrap();
    let modulus = qp.pow(20).into_owned();
    for u in [1i64, 2, 3, 12, 16806, 48000000] {
        let u = BigInt::from(u);
        let x = invert_unit(&qp, &u, 20).unwrap();
        assert_eq!(BigInt::one(), (&u * &x).mod_floor(&modulus));
    }
}

#[test]
fn test_invert_unit_reuses_state() {
    let qp = PAdicContext::with_prime(BigInt::from(5)).unwrap();
    let mut state = InvState::new(&qp, 12);
    let modulus = qp.pow(12).into_owned();
    for u in [2i64, 3, 7, 123456] {
        let u = BigInt::from(u);
        let x = state.invert_unit(&qp, &u).unwrap();
        assert_eq!(BigInt::one(), (&u * &x).mod_floor(&modulus));
    }
}

#[test]
fn test_invert_non_unit() {
    let qp = PAdicContext::with_prime(BigInt::from(7)).unwrap();
    assert_eq!(Err(PAdicError::NotUnit), invert_unit(&qp, &BigInt::from(14), 5));
}
