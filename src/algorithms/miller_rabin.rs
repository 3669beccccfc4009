use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::One;

use oorandom;

use crate::element::random_below;

///
/// Miller-Rabin primality test.
///
/// If `n` is a prime, this returns true. If `n` is not a prime, this
/// returns false with probability greater or equal than `1 - 4^(-k)`.
///
/// Used by the context constructor in debug builds to catch composite
/// "primes" early; the library otherwise trusts the caller.
///
pub fn is_prime(n: &BigInt, k: usize) -> bool {
    if *n < BigInt::from(2) {
        return false;
    }
    if *n < BigInt::from(4) {
        return true;
    }
    if n.is_even() {
        return false;
    }
    // n - 1 = 2^s * d with d odd
    let n_minus_one = n - BigInt::one();
    let mut d = n_minus_one.clone();
    let mut s = 0usize;
    while d.is_even() {
        d >>= 1u32;
        s += 1;
    }
    // witness stream seeded per candidate
    let mut hasher = DefaultHasher::new();
    n.hash(&mut hasher);
    let mut rng = oorandom::Rand64::new(hasher.finish() as u128);
    let witness_bound = n - BigInt::from(3);
    'witness: for _ in 0..k {
        let a = random_below(&mut rng, &witness_bound) + BigInt::from(2);
        let mut x = a.modpow(&d, n);
        if x.is_one() || x == n_minus_one {
            continue 'witness;
        }
        for _ in 0..(s - 1) {
            x = (&x * &x).mod_floor(n);
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

#[test]
fn test_is_prime() {
    for p in [2i64, 3, 5, 7, 11, 97, 257, 7919, 1000003] {
        assert!(is_prime(&BigInt::from(p), 10), "{} is prime", p);
    }
}

#[test]
fn test_is_composite() {
    // 561 and 41041 are Carmichael numbers
    for n in [0i64, 1, 4, 9, 15, 561, 41041, 7917, 1000001] {
        assert!(!is_prime(&BigInt::from(n), 10), "{} is composite", n);
    }
}

#[test]
fn test_large_prime() {
    // 2^89 - 1 is a Mersenne prime
    let p = (BigInt::one() << 89u32) - BigInt::one();
    assert!(is_prime(&p, 10));
    let q = (BigInt::one() << 89u32) + BigInt::one();
    assert!(!is_prime(&q, 10));
}
