// Copyright 2020, Verizon Media
// Licensed under the terms of the MIT license. See LICENSE file in project root for terms.

//! Textbook ECDSA over [`Curve`], with the nonce exposed.
//!
//! `sign_with_nonce` is the insecure signing routine the provisioner uses to
//! make the two level 8 example blobs. Passing it the same `k` twice is the
//! whole point of level 8 (see [`crate::recovery`]).

use num_bigint::{BigInt, RandBigInt};
use num_traits::{One, Signed, Zero};
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};

use crate::curve::Curve;
use crate::encoding::{from_be, to_fixed_be};
use crate::error::{Error, Result};
use crate::modular::{inverse_mod, reduce};
use crate::point::Point;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    pub r: BigInt,
    pub s: BigInt,
}

impl Signature {
    /// `r || s`, each as a fixed-width big-endian integer.
    pub fn to_bytes(&self, curve: &Curve) -> Result<Vec<u8>> {
        let width = curve.byte_len();
        let mut out = to_fixed_be(&self.r, width)?;
        out.extend(to_fixed_be(&self.s, width)?);
        Ok(out)
    }

    /// Inverse of [`Signature::to_bytes`]. `bytes` must be exactly two field
    /// widths long.
    pub fn from_bytes(curve: &Curve, bytes: &[u8]) -> Result<Self> {
        let width = curve.byte_len();
        if bytes.len() != 2 * width {
            return Err(Error::InvalidLength { len: bytes.len(), expected: 2 * width });
        }

        let (r, s) = bytes.split_at(width);
        Ok(Signature { r: from_be(r), s: from_be(s) })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyPair {
    pub private: BigInt,
    pub public: Point,
}

/// Returns the truncated SHA256 hash of the message.
pub fn hash_message(curve: &Curve, message: &[u8]) -> BigInt {
    let message_hash = Sha256::digest(message);
    let e = from_be(&message_hash);

    // FIPS 180 says that when a hash needs to be truncated, the rightmost
    // bits should be discarded.
    let digest_bits = 8 * message_hash.len() as u64;
    let z = if digest_bits > curve.order_bits() {
        e >> (digest_bits - curve.order_bits())
    } else {
        e
    };

    debug_assert!(z.bits() <= curve.order_bits());
    z
}

/// Uniform scalar in `[1, n)`, suitable as a private key or a nonce.
pub fn random_scalar<R: RngCore + CryptoRng + ?Sized>(curve: &Curve, rng: &mut R) -> BigInt {
    rng.gen_bigint_range(&BigInt::one(), &curve.n)
}

fn check_private_key(curve: &Curve, private_key: &BigInt) -> Result<()> {
    if !private_key.is_positive() || private_key >= &curve.n {
        return Err(Error::InvalidPrivateKey);
    }
    Ok(())
}

/// Draws a private key uniformly from `[1, n)`.
pub fn generate_keypair<R: RngCore + CryptoRng + ?Sized>(curve: &Curve, rng: &mut R) -> KeyPair {
    let private = random_scalar(curve, rng);
    let public = curve.mul(&private, &curve.g);
    KeyPair { private, public }
}

/// Signs with a caller-chosen nonce.
///
/// There is no retry: if this `k` gives r = 0 or s = 0 for this key and
/// message the caller gets [`Error::DegenerateSignature`] and has to pick a
/// different `k` itself.
pub fn sign_with_nonce(
    curve: &Curve,
    private_key: &BigInt,
    message: &[u8],
    k: &BigInt,
) -> Result<Signature> {
    check_private_key(curve, private_key)?;

    let n = &curve.n;
    let z = hash_message(curve, message);

    // k = 0 mod n is the only way to land on the point at infinity
    let x = curve.mul(k, &curve.g).x().cloned().ok_or(Error::InvalidNonce)?;

    let r = reduce(&x, n);
    let s = reduce(&((z + &r * private_key) * inverse_mod(k, n)?), n);

    if r.is_zero() || s.is_zero() {
        return Err(Error::DegenerateSignature);
    }

    Ok(Signature { r, s })
}

/// Signs with a fresh random nonce, retrying on a degenerate signature.
pub fn sign<R: RngCore + CryptoRng + ?Sized>(
    curve: &Curve,
    private_key: &BigInt,
    message: &[u8],
    rng: &mut R,
) -> Result<Signature> {
    loop {
        let k = random_scalar(curve, rng);
        match sign_with_nonce(curve, private_key, message, &k) {
            Err(Error::DegenerateSignature) => continue,
            result => return result,
        }
    }
}

/// Verifies a signature over an already hashed (and truncated) message.
pub fn verify_digest(curve: &Curve, public_key: &Point, z: &BigInt, signature: &Signature) -> bool {
    let n = &curve.n;

    // Verify that r and s are in the correct range
    let in_range = |v: &BigInt| v.is_positive() && v < n;
    if !in_range(&signature.r) || !in_range(&signature.s) {
        return false;
    }

    // Unlike the firmware, the key is not trusted to be on the curve
    if public_key.is_infinity() || !curve.is_on_curve(public_key) {
        return false;
    }

    // w is s^{-1}. s is in [1, n) and n is prime, so this cannot fail.
    let w = match inverse_mod(&signature.s, n) {
        Ok(w) => w,
        Err(_) => return false,
    };
    let u1 = reduce(&(z * &w), n);
    let u2 = reduce(&(&signature.r * &w), n);

    let point = curve.add(&curve.mul(&u1, &curve.g), &curve.mul(&u2, public_key));

    match point.x() {
        Some(x) => reduce(x, n) == signature.r,
        None => false,
    }
}

pub fn verify(curve: &Curve, public_key: &Point, message: &[u8], signature: &Signature) -> bool {
    verify_digest(curve, public_key, &hash_message(curve, message), signature)
}
