//! Arithmetic in the field of p-adic numbers `Q_p`.
//!
//! Every element is stored as a unit/valuation pair `u * p^v` together with
//! an absolute precision `N`, i.e. it represents a residue class modulo
//! `p^N`. All operations return elements in reduced form: either the element
//! is exactly zero, or `gcd(u, p) = 1` and `0 <= u < p^(N - v)`.
//!
//! The entry point is [`PAdicContext`], which owns the prime, a dense cache
//! of its powers and the print mode, and on which all operations are defined:
//!
//! ```
//! use padic_math::{PAdicContext, DEFAULT_PRECISION};
//! use num_bigint::BigInt;
//! use num_traits::One;
//!
//! let qp = PAdicContext::with_prime(BigInt::from(7)).unwrap();
//! let x = qp.from_i64(2, DEFAULT_PRECISION);
//! let y = qp.inv(&x).unwrap();
//! assert!(qp.to_bigint(&qp.mul(&x, &y)).unwrap().is_one());
//! ```
//!
//! Beyond the rational operations, the crate provides the transcendental
//! primitives of `Q_p`: Hensel-lifted inversion and square roots, the
//! Teichmüller lift, and the convergent exponential and logarithm with
//! their algorithm variants (naive, rectangular splitting, balanced
//! splitting, and Satoh–Skjernaa–Taguchi for the logarithm).

pub mod error;
pub mod context;
pub mod element;
pub mod fmt;
pub mod algorithms;

mod arith;
mod conv;

pub use context::PAdicContext;
pub use element::PAdicEl;
pub use error::{PAdicError, Result};
pub use fmt::PrintMode;

///
/// Absolute precision used when no other choice is natural, e.g. by
/// [`PAdicContext::with_prime`] when sizing the power cache.
///
pub const DEFAULT_PRECISION: i64 = 20;

///
/// Number of repetitions for probabilistic algorithms, currently only the
/// Miller-Rabin check guarding [`PAdicContext::new`] in debug builds.
///
pub const DEFAULT_PROBABILISTIC_REPETITIONS: usize = 10;
