// Copyright 2020, Verizon Media
// Licensed under the terms of the MIT license. See LICENSE file in project root for terms.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, Zero};

use crate::curve::Curve;
use crate::modular::{inverse_mod, reduce};

/// A point on the curve in affine coordinates.
///
/// Affine coordinates cannot represent the group identity, so it gets its own
/// variant instead of a sentinel coordinate pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Point {
    Infinity,
    Affine { x: BigInt, y: BigInt },
}

impl Point {
    pub fn is_infinity(&self) -> bool {
        matches!(self, Point::Infinity)
    }

    pub fn x(&self) -> Option<&BigInt> {
        match self {
            Point::Infinity => None,
            Point::Affine { x, .. } => Some(x),
        }
    }

    pub fn coordinates(&self) -> Option<(&BigInt, &BigInt)> {
        match self {
            Point::Infinity => None,
            Point::Affine { x, y } => Some((x, y)),
        }
    }
}

impl Curve {
    // Slope denominators are never zero: the chord case has x1 != x2 and the
    // tangent case would need y == 0, i.e. a point of order two. secp256r1
    // has prime order so there is no such point to feed in.
    fn slope_denominator_inverse(&self, d: &BigInt) -> BigInt {
        inverse_mod(d, &self.p).expect("slope denominator is zero (point of order two?)")
    }

    /// Returns -point.
    pub fn neg(&self, point: &Point) -> Point {
        debug_assert!(self.is_on_curve(point));

        let result = match point {
            // -0 = 0
            Point::Infinity => Point::Infinity,
            Point::Affine { x, y } => Point::Affine {
                x: x.clone(),
                y: reduce(&-y, &self.p),
            },
        };

        debug_assert!(self.is_on_curve(&result));
        result
    }

    /// Returns point1 + point2 according to the group law.
    pub fn add(&self, point1: &Point, point2: &Point) -> Point {
        debug_assert!(self.is_on_curve(point1));
        debug_assert!(self.is_on_curve(point2));

        let (x1, y1, x2, y2) = match (point1, point2) {
            // 0 + point2 = point2
            (Point::Infinity, _) => return point2.clone(),
            // point1 + 0 = point1
            (_, Point::Infinity) => return point1.clone(),
            (Point::Affine { x: x1, y: y1 }, Point::Affine { x: x2, y: y2 }) => (x1, y1, x2, y2),
        };

        if x1 == x2 && y1 != y2 {
            // point1 + (-point1) = 0
            return Point::Infinity;
        }

        let m = if x1 == x2 {
            // point1 == point2, use the tangent
            (BigInt::from(3) * x1 * x1 + &self.a) * self.slope_denominator_inverse(&(y1 + y1))
        } else {
            (y1 - y2) * self.slope_denominator_inverse(&(x1 - x2))
        };

        let x3 = &m * &m - x1 - x2;
        let y3 = y1 + &m * (&x3 - x1);
        let result = Point::Affine {
            x: reduce(&x3, &self.p),
            y: reduce(&-y3, &self.p),
        };

        debug_assert!(self.is_on_curve(&result));
        result
    }

    /// Returns point + point.
    pub fn double(&self, point: &Point) -> Point {
        self.add(point, point)
    }

    /// Returns k * point computed using double-and-add. Any sign and size of
    /// k is accepted.
    pub fn mul(&self, k: &BigInt, point: &Point) -> Point {
        debug_assert!(self.is_on_curve(point));

        if reduce(k, &self.n).is_zero() || point.is_infinity() {
            return Point::Infinity;
        }

        if k.is_negative() {
            // k * point = -k * (-point)
            return self.mul_unsigned(&-k, &self.neg(point));
        }

        self.mul_unsigned(k, point)
    }

    fn mul_unsigned(&self, k: &BigInt, point: &Point) -> Point {
        debug_assert!(!k.is_negative());

        let mut k = k.clone();
        let mut result = Point::Infinity;
        let mut addend = point.clone();

        while !k.is_zero() {
            if k.is_odd() {
                // Add
                result = self.add(&result, &addend);
            }

            // Double
            addend = self.double(&addend);

            k >>= 1;
        }

        debug_assert!(self.is_on_curve(&result));
        result
    }
}
