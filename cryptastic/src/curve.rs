// Copyright 2020, Verizon Media
// Licensed under the terms of the MIT license. See LICENSE file in project root for terms.

use hex_literal::hex;
use num_bigint::BigInt;
use num_traits::{Signed, Zero};
use once_cell::sync::Lazy;

use crate::encoding::from_be as be;
use crate::modular::reduce;
use crate::point::Point;

/// Parameters of a short Weierstrass curve y^2 = x^3 + ax + b over GF(p).
///
/// There is exactly one of these in the process and nothing ever mutates it.
/// Every point and scalar operation takes it by reference.
#[derive(Debug)]
pub struct Curve {
    pub name: &'static str,
    // Field characteristic
    pub p: BigInt,
    // Curve coefficients
    pub a: BigInt,
    pub b: BigInt,
    // Base point
    pub g: Point,
    // Subgroup order
    pub n: BigInt,
    // Subgroup cofactor
    pub h: u32,
}

static SECP256R1: Lazy<Curve> = Lazy::new(|| Curve {
    name: "secp256r1",
    p: be(&hex!("ffffffff00000001000000000000000000000000ffffffffffffffffffffffff")),
    a: be(&hex!("ffffffff00000001000000000000000000000000fffffffffffffffffffffffc")),
    b: be(&hex!("5ac635d8aa3a93e7b3ebbd55769886bc651d06b0cc53b0f63bce3c3e27d2604b")),
    g: Point::Affine {
        x: be(&hex!("6b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296")),
        y: be(&hex!("4fe342e2fe1a7f9b8ee7eb4a7c0f9e162bce33576b315ececbb6406837bf51f5")),
    },
    n: be(&hex!("ffffffff00000000ffffffffffffffffbce6faada7179e84f3b9cac2fc632551")),
    h: 1,
});

impl Curve {
    /// NIST P-256, the curve the firmware's level 8 verifier is hardcoded for.
    pub fn secp256r1() -> &'static Curve {
        &SECP256R1
    }

    /// Returns true if the given point lies on the curve. The point at
    /// infinity always does.
    pub fn is_on_curve(&self, point: &Point) -> bool {
        match point {
            Point::Infinity => true,
            Point::Affine { x, y } => {
                let rhs = x * x * x + &self.a * x + &self.b;
                reduce(&(y * y - rhs), &self.p).is_zero()
            }
        }
    }

    /// Builds an affine point, or `None` if either coordinate is outside
    /// `[0, p)` or the pair is not on the curve.
    pub fn point(&self, x: BigInt, y: BigInt) -> Option<Point> {
        let in_field = |v: &BigInt| !v.is_negative() && v < &self.p;
        if !in_field(&x) || !in_field(&y) {
            return None;
        }

        let point = Point::Affine { x, y };
        if self.is_on_curve(&point) {
            Some(point)
        } else {
            None
        }
    }

    /// Bit length of the group order, which is what digests get truncated to.
    pub fn order_bits(&self) -> u64 {
        self.n.bits()
    }

    /// Width in bytes of a serialized field element or scalar.
    pub fn byte_len(&self) -> usize {
        ((self.p.bits() + 7) / 8) as usize
    }
}
