// Copyright 2020, Verizon Media
// Licensed under the terms of the MIT license. See LICENSE file in project root for terms.

//! Private key recovery from two signatures that reused a nonce.
//!
//! With the same k, s1 - s2 = (z1 - z2) / k (mod n), so k falls out, and with
//! k known either signature gives d = (s k - z) / r.

use num_bigint::BigInt;
use num_traits::Zero;

use crate::curve::Curve;
use crate::ecdsa::Signature;
use crate::error::{Error, Result};
use crate::modular::{inverse_mod, reduce};

/// Recovers the shared nonce from two signatures and their message digests.
///
/// Signatures with different r did not share a nonce and give
/// [`Error::NonceMismatch`]. Identical digests (or otherwise equal s values)
/// give [`Error::DivisionByZero`].
pub fn recover_nonce(
    curve: &Curve,
    sig1: &Signature,
    z1: &BigInt,
    sig2: &Signature,
    z2: &BigInt,
) -> Result<BigInt> {
    if sig1.r != sig2.r {
        return Err(Error::NonceMismatch);
    }

    let n = &curve.n;
    Ok(reduce(&((z1 - z2) * inverse_mod(&(&sig1.s - &sig2.s), n)?), n))
}

/// Recovers the private key from two signatures made with the same key and
/// the same nonce over messages with digests `z1` and `z2`.
///
/// Like [`recover_nonce`], fails with [`Error::NonceMismatch`] unless both
/// signatures have the same r.
pub fn recover_private_key(
    curve: &Curve,
    sig1: &Signature,
    z1: &BigInt,
    sig2: &Signature,
    z2: &BigInt,
) -> Result<BigInt> {
    let n = &curve.n;
    let k = recover_nonce(curve, sig1, z1, sig2, z2)?;
    let d = reduce(&((&sig1.s * &k - z1) * inverse_mod(&sig1.r, n)?), n);

    if d.is_zero() {
        return Err(Error::InvalidPrivateKey);
    }

    Ok(d)
}
