// Copyright 2020, Verizon Media
// Licensed under the terms of the MIT license. See LICENSE file in project root for terms.

//! Conversion into and out of the Montgomery domain.
//!
//! The firmware does all of its modular multiplication with Montgomery
//! reduction and has no general-purpose modular reduction at all. Anything it
//! needs in Montgomery form (the level 8 public key, R and R^2 for the level 7
//! RSA modulus) is computed here on the host and sent over already converted.

use num_bigint::BigInt;
use num_traits::One;

use crate::curve::Curve;
use crate::error::Result;
use crate::modular::{inverse_mod, reduce};
use crate::point::Point;

/// Radix width the firmware uses for secp256r1 field elements, R = 2^256.
pub const FIELD_RADIX_BITS: u32 = 256;
/// Radix width the firmware uses for the 2048 bit RSA modulus, R = 2^2048.
pub const RSA_RADIX_BITS: u32 = 2048;

fn radix(modulus: &BigInt, radix_bits: u32) -> BigInt {
    reduce(&(BigInt::one() << radix_bits), modulus)
}

/// Returns `value * 2^radix_bits mod modulus`.
pub fn to_montgomery(value: &BigInt, modulus: &BigInt, radix_bits: u32) -> BigInt {
    reduce(&(value * radix(modulus, radix_bits)), modulus)
}

/// Returns `value * 2^-radix_bits mod modulus`. The modulus must be odd so
/// that R has an inverse.
pub fn from_montgomery(value: &BigInt, modulus: &BigInt, radix_bits: u32) -> Result<BigInt> {
    let r_inv = inverse_mod(&radix(modulus, radix_bits), modulus)?;
    Ok(reduce(&(value * r_inv), modulus))
}

/// The two values the firmware's exponentiation needs precomputed: R mod N
/// (which is 1 in Montgomery form) and R^2 mod N (which converts into
/// Montgomery form with a single Montgomery multiplication).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MontgomeryConstants {
    pub r: BigInt,
    pub rr: BigInt,
}

impl MontgomeryConstants {
    pub fn new(modulus: &BigInt, radix_bits: u32) -> Self {
        let r = radix(modulus, radix_bits);
        let rr = reduce(&(&r * &r), modulus);
        MontgomeryConstants { r, rr }
    }
}

/// Converts both coordinates of an affine point into the Montgomery domain
/// mod p. `None` for the point at infinity, which has no coordinates to send.
pub fn to_montgomery_point(curve: &Curve, point: &Point) -> Option<(BigInt, BigInt)> {
    let (x, y) = point.coordinates()?;
    Some((
        to_montgomery(x, &curve.p, FIELD_RADIX_BITS),
        to_montgomery(y, &curve.p, FIELD_RADIX_BITS),
    ))
}

/// Inverse of [`to_montgomery_point`]. `None` if the result is not a point on
/// the curve.
pub fn from_montgomery_point(curve: &Curve, x: &BigInt, y: &BigInt) -> Option<Point> {
    let x = from_montgomery(x, &curve.p, FIELD_RADIX_BITS).ok()?;
    let y = from_montgomery(y, &curve.p, FIELD_RADIX_BITS).ok()?;
    curve.point(x, y)
}
