// Copyright 2020, Verizon Media
// Licensed under the terms of the MIT license. See LICENSE file in project root for terms.

use num_bigint::{BigInt, Sign};
use num_traits::Signed;

use crate::error::{Error, Result};

/// Encodes a non-negative integer as exactly `width` big-endian bytes,
/// zero-padded on the left. This is how every number crosses the serial link
/// (32 bytes for curve values, 256 for RSA values).
pub fn to_fixed_be(value: &BigInt, width: usize) -> Result<Vec<u8>> {
    if value.is_negative() {
        return Err(Error::NegativeValue);
    }

    let (_, digits) = value.to_bytes_be();
    // Zero encodes as a single 0 byte
    let digits = match digits.iter().position(|&b| b != 0) {
        Some(first) => &digits[first..],
        None => &[][..],
    };
    if digits.len() > width {
        return Err(Error::ValueTooWide(width));
    }

    let mut out = vec![0u8; width];
    out[width - digits.len()..].copy_from_slice(digits);
    Ok(out)
}

/// Reads an unsigned big-endian integer of any length.
pub fn from_be(bytes: &[u8]) -> BigInt {
    BigInt::from_bytes_be(Sign::Plus, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::{One, Zero};

    #[test]
    fn test_fixed_width() {
        assert_eq!(to_fixed_be(&BigInt::zero(), 4).unwrap(), [0, 0, 0, 0]);
        assert_eq!(to_fixed_be(&BigInt::one(), 4).unwrap(), [0, 0, 0, 1]);
        assert_eq!(to_fixed_be(&BigInt::from(0x1234), 2).unwrap(), [0x12, 0x34]);
        assert_eq!(to_fixed_be(&BigInt::from(0x123456), 2), Err(Error::ValueTooWide(2)));
        assert_eq!(to_fixed_be(&BigInt::from(-1), 4), Err(Error::NegativeValue));
    }

    #[test]
    fn test_zero_width() {
        assert_eq!(to_fixed_be(&BigInt::zero(), 0).unwrap(), Vec::<u8>::new());
        assert_eq!(to_fixed_be(&BigInt::one(), 0), Err(Error::ValueTooWide(0)));
    }

    #[test]
    fn test_from_be() {
        assert_eq!(from_be(&[]), BigInt::zero());
        assert_eq!(from_be(&[0, 0, 0x12, 0x34]), BigInt::from(0x1234));
        let bytes = to_fixed_be(&BigInt::from(0xdeadbeefu32), 32).unwrap();
        assert_eq!(bytes.len(), 32);
        assert_eq!(from_be(&bytes), BigInt::from(0xdeadbeefu32));
    }
}
