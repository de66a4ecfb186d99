// Copyright 2020, Verizon Media
// Licensed under the terms of the MIT license. See LICENSE file in project root for terms.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, Zero};

use crate::error::{Error, Result};

/// Reduces `x` into `[0, m)`. Plain `%` on a `BigInt` keeps the sign of the
/// dividend, which is never what the curve math wants.
pub fn reduce(x: &BigInt, m: &BigInt) -> BigInt {
    x.mod_floor(m)
}

/// Returns the only `x` in `[0, p)` such that `(k * x) % p == 1`.
///
/// `p` must be prime (or at least coprime to `k`). Both moduli used in this
/// crate are, so a gcd other than 1 is a bug in the caller and panics.
pub fn inverse_mod(k: &BigInt, p: &BigInt) -> Result<BigInt> {
    if reduce(k, p).is_zero() {
        return Err(Error::DivisionByZero);
    }

    if k.is_negative() {
        // k ** -1 = p - (-k) ** -1  (mod p)
        return Ok(p - inverse_mod(&-k, p)?);
    }

    // Extended Euclidean algorithm. old_s and old_t are the Bezout
    // coefficients of k and p respectively.
    let (mut old_r, mut r) = (k.clone(), p.clone());
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());
    let (mut old_t, mut t) = (BigInt::zero(), BigInt::one());

    while !r.is_zero() {
        let quotient = &old_r / &r;

        let next_r = &old_r - &quotient * &r;
        old_r = std::mem::replace(&mut r, next_r);
        let next_s = &old_s - &quotient * &s;
        old_s = std::mem::replace(&mut s, next_s);
        let next_t = &old_t - &quotient * &t;
        old_t = std::mem::replace(&mut t, next_t);
    }

    let gcd = old_r;
    assert!(gcd.is_one(), "{:x} is not coprime to {:x}", k, p);
    debug_assert_eq!(k * &old_s + p * &old_t, gcd);

    let x = reduce(&old_s, p);
    debug_assert!(reduce(&(k * &x), p).is_one());

    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::Curve;
    use proptest::prelude::*;

    #[test]
    fn test_inversemod() {
        let x = inverse_mod(&BigInt::from(271), &BigInt::from(383)).unwrap();
        assert_eq!(x, BigInt::from(106));
    }

    #[test]
    fn test_inversemod_negative() {
        // 383 - 106
        let x = inverse_mod(&BigInt::from(-271), &BigInt::from(383)).unwrap();
        assert_eq!(x, BigInt::from(277));
    }

    #[test]
    fn test_inversemod_zero() {
        let p = BigInt::from(383);
        assert_eq!(inverse_mod(&BigInt::zero(), &p), Err(Error::DivisionByZero));
        assert_eq!(inverse_mod(&p, &p), Err(Error::DivisionByZero));
        assert_eq!(inverse_mod(&BigInt::from(-766), &p), Err(Error::DivisionByZero));
    }

    #[test]
    fn test_inversemod_unreduced() {
        let p = BigInt::from(383);
        let x = inverse_mod(&BigInt::from(271 + 383 * 5), &p).unwrap();
        assert_eq!(x, BigInt::from(106));
    }

    #[test]
    fn test_inversemod_small_prime_exhaustive() {
        let p = BigInt::from(383);
        for k in 1..383 {
            let k = BigInt::from(k);
            let x = inverse_mod(&k, &p).unwrap();
            assert!(x >= BigInt::zero() && x < p);
            assert_eq!(reduce(&(&k * &x), &p), BigInt::one());
        }
    }

    #[test]
    fn test_reduce_negative() {
        let m = BigInt::from(7);
        assert_eq!(reduce(&BigInt::from(-1), &m), BigInt::from(6));
        assert_eq!(reduce(&BigInt::from(-14), &m), BigInt::zero());
        assert_eq!(reduce(&BigInt::from(15), &m), BigInt::one());
    }

    proptest! {
        #[test]
        fn inverse_mod_field_prime(bytes in any::<[u8; 32]>()) {
            let curve = Curve::secp256r1();
            let k = reduce(&BigInt::from_bytes_be(num_bigint::Sign::Plus, &bytes), &curve.p);
            prop_assume!(!k.is_zero());
            let x = inverse_mod(&k, &curve.p).unwrap();
            prop_assert_eq!(reduce(&(k * x), &curve.p), BigInt::one());
        }

        #[test]
        fn inverse_mod_group_order(bytes in any::<[u8; 32]>(), negate in any::<bool>()) {
            let curve = Curve::secp256r1();
            let mut k = BigInt::from_bytes_be(num_bigint::Sign::Plus, &bytes);
            prop_assume!(!reduce(&k, &curve.n).is_zero());
            if negate {
                k = -k;
            }
            let x = inverse_mod(&k, &curve.n).unwrap();
            prop_assert!(x < curve.n);
            prop_assert_eq!(reduce(&(k * x), &curve.n), BigInt::one());
        }
    }
}
