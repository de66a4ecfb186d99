// Copyright 2020, Verizon Media
// Licensed under the terms of the MIT license. See LICENSE file in project root for terms.

use thiserror::Error;

/// Everything in here is fatal for the operation that returned it. Nothing
/// is retried on the caller's behalf.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("division by zero")]
    DivisionByZero,

    #[error("signatures have different r values and did not share a nonce")]
    NonceMismatch,

    #[error("nonce produces r = 0 or s = 0 for this key and message, pick another")]
    DegenerateSignature,

    #[error("private key must be in [1, n)")]
    InvalidPrivateKey,

    #[error("nonce must be non-zero mod n")]
    InvalidNonce,

    #[error("negative values have no fixed-width encoding")]
    NegativeValue,

    #[error("value does not fit in {0} bytes")]
    ValueTooWide(usize),

    #[error("payload is {len} bytes but the limit is {max}")]
    PayloadTooLong { len: usize, max: usize },

    #[error("got {len} bytes, expected {expected}")]
    InvalidLength { len: usize, expected: usize },

    #[error("blob is {len} bytes but at least {min} are needed")]
    BlobTooShort { len: usize, min: usize },

    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

pub type Result<T> = core::result::Result<T, Error>;
