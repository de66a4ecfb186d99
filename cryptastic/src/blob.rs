// Copyright 2020, Verizon Media
// Licensed under the terms of the MIT license. See LICENSE file in project root for terms.

//! Signed blobs as the firmware stores and prints them: `r || s || payload`.

use num_bigint::BigInt;
use rand::{CryptoRng, RngCore};

use crate::curve::Curve;
use crate::ecdsa::{hash_message, sign, sign_with_nonce, verify, Signature};
use crate::error::{Error, Result};
use crate::point::Point;

/// Bytes per line when the firmware prints a blob.
pub const HEX_DUMP_WIDTH: usize = 16;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedBlob {
    pub signature: Signature,
    pub payload: Vec<u8>,
}

impl SignedBlob {
    /// Signs `payload` with a caller-chosen nonce.
    pub fn sign_with_nonce(
        curve: &Curve,
        private_key: &BigInt,
        payload: Vec<u8>,
        nonce: &BigInt,
    ) -> Result<Self> {
        let signature = sign_with_nonce(curve, private_key, &payload, nonce)?;
        Ok(SignedBlob { signature, payload })
    }

    /// Signs `payload` with a fresh random nonce.
    pub fn sign<R: RngCore + CryptoRng + ?Sized>(
        curve: &Curve,
        private_key: &BigInt,
        payload: Vec<u8>,
        rng: &mut R,
    ) -> Result<Self> {
        let signature = sign(curve, private_key, &payload, rng)?;
        Ok(SignedBlob { signature, payload })
    }

    pub fn to_bytes(&self, curve: &Curve) -> Result<Vec<u8>> {
        let mut out = self.signature.to_bytes(curve)?;
        out.extend_from_slice(&self.payload);
        Ok(out)
    }

    /// Splits a blob into signature and payload. The payload may be empty.
    pub fn from_bytes(curve: &Curve, bytes: &[u8]) -> Result<Self> {
        let sig_len = 2 * curve.byte_len();
        if bytes.len() < sig_len {
            return Err(Error::BlobTooShort { len: bytes.len(), min: sig_len });
        }

        let (sig, payload) = bytes.split_at(sig_len);
        Ok(SignedBlob {
            signature: Signature::from_bytes(curve, sig)?,
            payload: payload.to_vec(),
        })
    }

    /// Truncated hash of the payload, the `z` that was signed.
    pub fn digest(&self, curve: &Curve) -> BigInt {
        hash_message(curve, &self.payload)
    }

    pub fn verify(&self, curve: &Curve, public_key: &Point) -> bool {
        verify(curve, public_key, &self.payload, &self.signature)
    }

    /// Uppercase hex, [`HEX_DUMP_WIDTH`] bytes per line, like the firmware's
    /// console output.
    pub fn to_hex_dump(&self, curve: &Curve) -> Result<String> {
        Ok(hex_dump(&self.to_bytes(curve)?))
    }

    /// Parses text copied from the console. Whitespace (including line
    /// breaks) is ignored and either hex case is accepted.
    pub fn from_hex_dump(curve: &Curve, text: &str) -> Result<Self> {
        Self::from_bytes(curve, &parse_hex_dump(text)?)
    }
}

pub fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .chunks(HEX_DUMP_WIDTH)
        .map(|line| hex::encode_upper(line) + "\n")
        .collect()
}

/// Reads back any blob the firmware printed, ignoring whitespace.
pub fn parse_hex_dump(text: &str) -> Result<Vec<u8>> {
    let digits: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(hex::decode(digits)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigFile, CONFIG_FILE_LEN, LEVEL8_BANNER};
    use crate::ecdsa::generate_keypair;
    use rand::rngs::OsRng;

    fn payload() -> Vec<u8> {
        ConfigFile::locked(LEVEL8_BANNER, "0123456789ABCDEF01234567").render().unwrap()
    }

    #[test]
    fn test_blob_layout() {
        let curve = Curve::secp256r1();
        let keypair = generate_keypair(curve, &mut OsRng);
        let blob = SignedBlob::sign(curve, &keypair.private, payload(), &mut OsRng).unwrap();

        let bytes = blob.to_bytes(curve).unwrap();
        assert_eq!(bytes.len(), 64 + CONFIG_FILE_LEN);
        assert_eq!(&bytes[..64], &blob.signature.to_bytes(curve).unwrap()[..]);
        assert_eq!(&bytes[64..], &payload()[..]);

        let parsed = SignedBlob::from_bytes(curve, &bytes).unwrap();
        assert_eq!(parsed, blob);
        assert!(parsed.verify(curve, &keypair.public));
    }

    #[test]
    fn test_hex_dump_shape() {
        let curve = Curve::secp256r1();
        let blob =
            SignedBlob::sign_with_nonce(curve, &BigInt::from(7), payload(), &BigInt::from(11))
                .unwrap();
        let dump = blob.to_hex_dump(curve).unwrap();

        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 12);
        assert!(lines.iter().all(|l| l.len() == 32));
        assert!(!dump.chars().any(|c| c.is_ascii_lowercase()));

        // Console copy-paste tends to mangle whitespace and case
        let mangled = dump.to_lowercase().replace('\n', " \r\n\t");
        assert_eq!(SignedBlob::from_hex_dump(curve, &mangled).unwrap(), blob);
    }

    #[test]
    fn test_tampered_payload_fails() {
        let curve = Curve::secp256r1();
        let keypair = generate_keypair(curve, &mut OsRng);
        let mut blob = SignedBlob::sign(curve, &keypair.private, payload(), &mut OsRng).unwrap();
        blob.payload = crate::config::unlock(&blob.payload).unwrap();
        assert!(!blob.verify(curve, &keypair.public));
    }

    #[test]
    fn test_short_blob() {
        let curve = Curve::secp256r1();
        assert_eq!(
            SignedBlob::from_bytes(curve, &[0u8; 63]),
            Err(Error::BlobTooShort { len: 63, min: 64 })
        );
        let empty = SignedBlob::from_bytes(curve, &[1u8; 64]).unwrap();
        assert!(empty.payload.is_empty());
        assert!(matches!(SignedBlob::from_hex_dump(curve, "0g"), Err(Error::InvalidHex(_))));
    }
}
