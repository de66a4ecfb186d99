// Copyright 2020, Verizon Media
// Licensed under the terms of the MIT license. See LICENSE file in project root for terms.

//! Host-side cryptography for the hackme-1 tooling.
//!
//! The firmware verifies level 8 uploads against a secp256r1 public key using
//! hand-rolled fixed-width bignums. This crate is the other half: the
//! provisioner uses it to mint that key and the two example blobs, and the
//! level 8 reference solution uses it to pull the private key back out of
//! those blobs (they are signed with the same nonce on purpose).
//!
//! Everything here works on arbitrary-precision integers in affine
//! coordinates. None of it is constant time.

pub mod blob;
pub mod config;
pub mod curve;
pub mod ecdsa;
pub mod encoding;
pub mod error;
pub mod modular;
pub mod montgomery;
pub mod point;
pub mod recovery;

pub use blob::{hex_dump, parse_hex_dump, SignedBlob};
pub use config::{ConfigFile, ConfigState};
pub use curve::Curve;
pub use ecdsa::{
    generate_keypair, hash_message, random_scalar, sign, sign_with_nonce, verify, verify_digest,
    KeyPair, Signature,
};
pub use encoding::{from_be, to_fixed_be};
pub use error::{Error, Result};
pub use modular::inverse_mod;
pub use montgomery::{
    from_montgomery, from_montgomery_point, to_montgomery, to_montgomery_point, MontgomeryConstants,
};
pub use point::Point;
pub use recovery::{recover_nonce, recover_private_key};

pub use num_bigint::BigInt;
