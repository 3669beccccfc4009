use std::fmt;
use std::fmt::Display;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, ToPrimitive, Zero};

use crate::context::PAdicContext;
use crate::element::PAdicEl;

///
/// How [`PAdicContext::format`] renders elements.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrintMode {
    ///
    /// The rational representative: `u * p^v` as a plain integer when
    /// `v >= 0`, else `u/p^-v` as a fraction, e.g. `23` or `12/7`.
    ///
    Terse,
    ///
    /// The base-p expansion `sum d_i * p^i` starting at `i = v`, zero
    /// digits omitted, e.g. `5*7^-1 + 1`.
    ///
    Series,
    ///
    /// The literal unit/valuation pair, e.g. `12*7^-1`.
    ///
    ValUnit,
}

///
/// Borrowed element-with-context pair implementing [`Display`].
///
pub struct PAdicDisplay<'a> {
    ctx: &'a PAdicContext,
    el: &'a PAdicEl,
}

impl PAdicContext {

    ///
    /// Wraps an element for display according to the context's print mode.
    /// All modes print the nonnegative representative; zero prints as `0`.
    ///
    pub fn format<'a>(&'a self, el: &'a PAdicEl) -> PAdicDisplay<'a> {
        PAdicDisplay { ctx: self, el }
    }
}

impl<'a> Display for PAdicDisplay<'a> {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        if self.el.is_zero() {
            return write!(out, "0");
        }
        match self.ctx.print_mode() {
            PrintMode::Terse => fmt_terse(self.ctx, self.el, out),
            PrintMode::Series => fmt_series(self.ctx, self.el, out),
            PrintMode::ValUnit => fmt_val_unit(self.ctx, self.el, out),
        }
    }
}

fn fmt_terse(ctx: &PAdicContext, el: &PAdicEl, out: &mut fmt::Formatter) -> fmt::Result {
    if el.valuation() >= 0 {
        let value = el.unit() * ctx.pow(el.valuation() as u64).as_ref();
        write!(out, "{}", value)
    } else {
        write!(out, "{}/{}", el.unit(), ctx.pow((-el.valuation()) as u64))
    }
}

fn fmt_series(ctx: &PAdicContext, el: &PAdicEl, out: &mut fmt::Formatter) -> fmt::Result {
    let mut first = true;
    for (digit, exponent) in expand_digits(ctx, el.unit(), el.valuation()) {
        if !first {
            write!(out, " + ")?;
        }
        first = false;
        write_term(ctx, &digit, exponent, out)?;
    }
    Ok(())
}

fn fmt_val_unit(ctx: &PAdicContext, el: &PAdicEl, out: &mut fmt::Formatter) -> fmt::Result {
    write_term(ctx, el.unit(), el.valuation(), out)
}

///
/// One summand `d * p^e`, with the redundant pieces dropped: `d` alone for
/// `e = 0`, `d*p` for `e = 1`, and the bare power when `d = 1`.
///
fn write_term(
    ctx: &PAdicContext,
    digit: &BigInt,
    exponent: i64,
    out: &mut fmt::Formatter,
) -> fmt::Result {
    if exponent == 0 {
        return write!(out, "{}", digit);
    }
    if !digit.is_one() {
        write!(out, "{}*", digit)?;
    }
    if exponent == 1 {
        write!(out, "{}", ctx.prime())
    } else {
        write!(out, "{}^{}", ctx.prime(), exponent)
    }
}

///
/// The base-p digits of the unit, paired with their exponents `v, v+1, ...`;
/// zero digits are skipped.
///
fn expand_digits(ctx: &PAdicContext, unit: &BigInt, val: i64) -> Vec<(BigInt, i64)> {
    let mut digits = Vec::new();
    let mut exponent = val;
    match (unit.to_u64(), ctx.prime_small()) {
        (Some(mut u), Some(_)) => {
            while u > 0 {
                let (q, d) = ctx.div_rem_p_small(u);
                if d > 0 {
                    digits.push((BigInt::from(d), exponent));
                }
                u = q;
                exponent += 1;
            }
        }
        _ => {
            let mut u = unit.clone();
            while !u.is_zero() {
                let (q, d) = u.div_rem(ctx.prime());
                if !d.is_zero() {
                    digits.push((d, exponent));
                }
                u = q;
                exponent += 1;
            }
        }
    }
    digits
}

#[cfg(test)]
use num_rational::BigRational;
#[cfg(test)]
use crate::error::Result;

#[cfg(test)]
fn ctx_with_mode(p: i64, mode: PrintMode) -> Result<PAdicContext> {
    PAdicContext::new(BigInt::from(p), 0, 40, mode)
}

#[test]
fn test_terse() {
    let qp = ctx_with_mode(7, PrintMode::Terse).unwrap();
    assert_eq!("23", format!("{}", qp.format(&qp.from_i64(23, 5))));
    let q = BigRational::new(BigInt::from(12), BigInt::from(7));
    assert_eq!("12/7", format!("{}", qp.format(&qp.from_rational(&q, 10))));
    assert_eq!("0", format!("{}", qp.format(&qp.zero(5))));
}

#[test]
fn test_series() {
    let qp = ctx_with_mode(7, PrintMode::Series).unwrap();
    let q = BigRational::new(BigInt::from(12), BigInt::from(7));
    assert_eq!("5*7^-1 + 1", format!("{}", qp.format(&qp.from_rational(&q, 10))));
    assert_eq!("2 + 3*7", format!("{}", qp.format(&qp.from_i64(23, 5))));
    assert_eq!("7^2", format!("{}", qp.format(&qp.from_i64(49, 5))));
    assert_eq!("0", format!("{}", qp.format(&qp.zero(5))));
}

#[test]
fn test_val_unit() {
    let qp = ctx_with_mode(7, PrintMode::ValUnit).unwrap();
    assert_eq!("23", format!("{}", qp.format(&qp.from_i64(23, 5))));
    assert_eq!("2*7", format!("{}", qp.format(&qp.from_i64(14, 5))));
    assert_eq!("7^2", format!("{}", qp.format(&qp.from_i64(49, 5))));
    let q = BigRational::new(BigInt::from(12), BigInt::from(7));
    assert_eq!("12*7^-1", format!("{}", qp.format(&qp.from_rational(&q, 10))));
}

#[test]
fn test_large_prime_series() {
    let qp = ctx_with_mode(1000003, PrintMode::Series).unwrap();
    let x = qp.from_i64(2000007, 5);
    assert_eq!("1 + 2*1000003", format!("{}", qp.format(&x)));
}
