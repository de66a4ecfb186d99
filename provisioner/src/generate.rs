// Copyright 2020, Verizon Media
// Licensed under the terms of the MIT license. See LICENSE file in project root for terms.

//! Per-board secrets for each level.

use std::fs;
use std::path::Path;
use std::process::Command;

use aes::cipher::{block_padding::NoPadding, BlockEncryptMut, KeyIvInit};
use anyhow::{bail, ensure, Context, Result};
use cryptastic::config::{LEVEL7_BANNER, LEVEL8_BANNER, LEVEL8_FRIEND_DEVICE_ID};
use cryptastic::montgomery::{to_montgomery_point, RSA_RADIX_BITS};
use cryptastic::{
    generate_keypair, random_scalar, BigInt, ConfigFile, Curve, Error, MontgomeryConstants,
    SignedBlob,
};
use rand::{CryptoRng, RngCore};

use crate::record::{ProvisionRecord, RSA_BYTES};

pub const RNG_SEED_LEN: usize = 40;
/// Size of the level 9 and level 10 code areas.
pub const CODE_AREA_LEN: usize = 8192;
pub const AES_KEY_LEN: usize = 16;

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;

/// Inputs that don't come from the RNG.
pub struct Inputs<'a> {
    pub chip_id: &'a str,
    pub level9_code: &'a [u8],
    pub level10_code: &'a [u8],
    pub openssl: &'a Path,
}

pub fn generate<R: RngCore + CryptoRng>(
    inputs: &Inputs<'_>,
    rng: &mut R,
) -> Result<ProvisionRecord> {
    let tmpdir = tempfile::tempdir().context("creating scratch directory")?;
    log::debug!("scratch directory {}", tmpdir.path().display());

    let level4_rng_seed = random_bytes(rng, RNG_SEED_LEN);
    let rsa = setup_rsa(inputs.openssl, tmpdir.path(), inputs.chip_id)?;
    let ecdsa = setup_ecdsa(Curve::secp256r1(), inputs.chip_id, rng)?;
    let (level9_binary, level9_mask) = setup_xor(inputs.level9_code, rng)?;
    let (level10_binary, level10_key) = setup_aes(inputs.level10_code, rng)?;

    Ok(ProvisionRecord {
        chip_id: inputs.chip_id.to_owned(),
        level4_rng_seed,
        rsa_privk: rsa.privk_pem,
        rsa_n: rsa.n,
        rsa_r: rsa.consts.r,
        rsa_rr: rsa.consts.rr,
        level7_example: rsa.example,
        ecdsa_privk: ecdsa.privk,
        ecdsa_randk: ecdsa.randk,
        level8_pubk_x: ecdsa.pubk_mont.0,
        level8_pubk_y: ecdsa.pubk_mont.1,
        level8_pubk_plus_g_x: ecdsa.pubk_plus_g_mont.0,
        level8_pubk_plus_g_y: ecdsa.pubk_plus_g_mont.1,
        level8_file1: ecdsa.file1,
        level8_file2: ecdsa.file2,
        level9_binary,
        level9_mask,
        level10_binary,
        level10_key,
    })
}

fn random_bytes<R: RngCore>(rng: &mut R, len: usize) -> Vec<u8> {
    let mut buf = vec![0; len];
    rng.fill_bytes(&mut buf);
    buf
}

/// Pads a code image out to the full code area with random bytes.
fn pad_code<R: RngCore>(code: &[u8], rng: &mut R) -> Result<Vec<u8>> {
    ensure!(
        code.len() <= CODE_AREA_LEN,
        "code is {} bytes but only {} fit",
        code.len(),
        CODE_AREA_LEN
    );

    let mut padded = code.to_vec();
    padded.extend(random_bytes(rng, CODE_AREA_LEN - code.len()));
    Ok(padded)
}

/// Level 7: RSA signed configuration file.
struct RsaArtifacts {
    privk_pem: String,
    n: BigInt,
    consts: MontgomeryConstants,
    example: Vec<u8>,
}

fn run(cmd: &mut Command) -> Result<Vec<u8>> {
    log::debug!("running {:?}", cmd);
    let output = cmd.output().with_context(|| format!("failed to run {:?}", cmd))?;
    if !output.status.success() {
        bail!(
            "{:?} failed ({}): {}",
            cmd,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(output.stdout)
}

/// Parses the output of `openssl rsa -noout -modulus`.
fn parse_modulus(output: &[u8]) -> Result<BigInt> {
    let text = String::from_utf8_lossy(output);
    let digits = text
        .trim()
        .strip_prefix("Modulus=")
        .with_context(|| format!("unexpected modulus output {:?}", text))?;
    BigInt::parse_bytes(digits.as_bytes(), 16)
        .with_context(|| format!("modulus is not hex: {:?}", digits))
}

fn setup_rsa(openssl: &Path, tmpdir: &Path, chip_id: &str) -> Result<RsaArtifacts> {
    let privk_path = tmpdir.join("rsapriv.pem");
    let payload_path = tmpdir.join("rsapayload.txt");
    let sig_path = tmpdir.join("rsapayloadsig.bin");

    run(Command::new(openssl)
        .arg("genrsa")
        .arg("-out")
        .arg(&privk_path)
        .arg("2048"))?;
    let privk_pem = fs::read_to_string(&privk_path).context("reading generated RSA key")?;

    let n = parse_modulus(&run(Command::new(openssl)
        .args(["rsa", "-noout", "-modulus", "-in"])
        .arg(&privk_path))?)?;
    ensure!(n.bits() == 8 * RSA_BYTES as u64, "RSA modulus is {} bits", n.bits());
    let consts = MontgomeryConstants::new(&n, RSA_RADIX_BITS);

    let payload = ConfigFile::locked(LEVEL7_BANNER, chip_id).render()?;
    fs::write(&payload_path, &payload).context("writing level 7 payload")?;
    run(Command::new(openssl)
        .args(["dgst", "-sha256", "-sign"])
        .arg(&privk_path)
        .arg("-out")
        .arg(&sig_path)
        .arg(&payload_path))?;

    let mut example = fs::read(&sig_path).context("reading level 7 signature")?;
    ensure!(example.len() == RSA_BYTES, "RSA signature is {} bytes", example.len());
    example.extend_from_slice(&payload);

    Ok(RsaArtifacts { privk_pem, n, consts, example })
}

/// Level 8: two ECDSA signed configuration files that share a nonce.
struct EcdsaArtifacts {
    privk: BigInt,
    randk: BigInt,
    pubk_mont: (BigInt, BigInt),
    pubk_plus_g_mont: (BigInt, BigInt),
    file1: Vec<u8>,
    file2: Vec<u8>,
}

fn setup_ecdsa<R: RngCore + CryptoRng>(
    curve: &Curve,
    chip_id: &str,
    rng: &mut R,
) -> Result<EcdsaArtifacts> {
    let keypair = generate_keypair(curve, rng);
    let pubk_plus_g = curve.add(&keypair.public, &curve.g);

    // The firmware has no way to handle the identity in either slot
    let pubk_mont =
        to_montgomery_point(curve, &keypair.public).context("public key is the identity")?;
    let pubk_plus_g_mont =
        to_montgomery_point(curve, &pubk_plus_g).context("public key + G is the identity")?;

    if let (Some((x, y)), Some((gx, gy))) =
        (keypair.public.coordinates(), pubk_plus_g.coordinates())
    {
        log::info!("Public key (Not Montgomery): x = {:064x}, y = {:064x}", x, y);
        log::info!("Public key + G (Not Montgomery): x = {:064x}, y = {:064x}", gx, gy);
    }
    log::info!(
        "Public key (Montgomery): x = {:064x}, y = {:064x}",
        pubk_mont.0,
        pubk_mont.1
    );
    log::info!(
        "Public key + G (Montgomery): x = {:064x}, y = {:064x}",
        pubk_plus_g_mont.0,
        pubk_plus_g_mont.1
    );

    let payload1 = ConfigFile::locked(LEVEL8_BANNER, chip_id).render()?;
    let payload2 = ConfigFile::locked(LEVEL8_BANNER, LEVEL8_FRIEND_DEVICE_ID).render()?;

    // Both files have to be signed with the same k, so a k that is degenerate
    // for either one is thrown away entirely.
    let (randk, blob1, blob2) = loop {
        let k = random_scalar(curve, rng);
        let blob1 = SignedBlob::sign_with_nonce(curve, &keypair.private, payload1.clone(), &k);
        let blob2 = SignedBlob::sign_with_nonce(curve, &keypair.private, payload2.clone(), &k);
        match (blob1, blob2) {
            (Ok(blob1), Ok(blob2)) => break (k, blob1, blob2),
            (Err(Error::DegenerateSignature), _) | (_, Err(Error::DegenerateSignature)) => continue,
            (Err(e), _) | (_, Err(e)) => return Err(e.into()),
        }
    };

    for (i, blob) in [&blob1, &blob2].iter().enumerate() {
        log::info!(
            "sig {} r = {:064x}, s = {:064x}",
            i + 1,
            blob.signature.r,
            blob.signature.s
        );
    }

    Ok(EcdsaArtifacts {
        privk: keypair.private,
        randk,
        pubk_mont,
        pubk_plus_g_mont,
        file1: blob1.to_bytes(curve)?,
        file2: blob2.to_bytes(curve)?,
    })
}

/// Level 9: code image XORed with a one-time mask.
fn setup_xor<R: RngCore>(code: &[u8], rng: &mut R) -> Result<(Vec<u8>, Vec<u8>)> {
    let plain = pad_code(code, rng).context("level 9 code")?;
    let mask = random_bytes(rng, CODE_AREA_LEN);
    let masked = plain.iter().zip(&mask).map(|(x, y)| x ^ y).collect();
    Ok((masked, mask))
}

fn encrypt_cbc(key: &[u8; AES_KEY_LEN], iv: &[u8; 16], data: &[u8]) -> Vec<u8> {
    Aes128CbcEnc::new(key.into(), iv.into()).encrypt_padded_vec_mut::<NoPadding>(data)
}

/// Level 10: code image under AES-128-CBC with an all-zero IV.
fn setup_aes<R: RngCore>(code: &[u8], rng: &mut R) -> Result<(Vec<u8>, Vec<u8>)> {
    let plain = pad_code(code, rng).context("level 10 code")?;
    let mut key = [0u8; AES_KEY_LEN];
    rng.fill_bytes(&mut key);
    Ok((encrypt_cbc(&key, &[0; 16], &plain), key.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes::cipher::BlockDecryptMut;
    use cryptastic::montgomery::from_montgomery_point;
    use cryptastic::recovery::recover_private_key;
    use cryptastic::ConfigState;
    use hex_literal::hex;
    use rand::rngs::OsRng;

    const CHIPID: &str = "0123456789ABCDEF01234567";

    #[test]
    fn test_parse_modulus() {
        assert_eq!(parse_modulus(b"Modulus=D2FC5273\n").unwrap(), BigInt::from(0xd2fc5273u32));
        assert!(parse_modulus(b"unable to load Private Key\n").is_err());
        assert!(parse_modulus(b"Modulus=XYZ\n").is_err());
    }

    #[test]
    fn test_ecdsa_artifacts() {
        let curve = Curve::secp256r1();
        let art = setup_ecdsa(curve, CHIPID, &mut OsRng).unwrap();

        let pubk = from_montgomery_point(curve, &art.pubk_mont.0, &art.pubk_mont.1).unwrap();
        assert_eq!(pubk, curve.mul(&art.privk, &curve.g));
        let pubk_plus_g =
            from_montgomery_point(curve, &art.pubk_plus_g_mont.0, &art.pubk_plus_g_mont.1).unwrap();
        assert_eq!(pubk_plus_g, curve.add(&pubk, &curve.g));

        let blob1 = SignedBlob::from_bytes(curve, &art.file1).unwrap();
        let blob2 = SignedBlob::from_bytes(curve, &art.file2).unwrap();
        assert_eq!(art.file1.len(), 192);
        assert!(blob1.verify(curve, &pubk));
        assert!(blob2.verify(curve, &pubk));
        assert_eq!(ConfigState::parse(&blob1.payload).device_ids, [CHIPID]);
        assert_eq!(ConfigState::parse(&blob2.payload).device_ids, [LEVEL8_FRIEND_DEVICE_ID]);

        // The two examples leak the key, which is the point of the level
        let recovered = recover_private_key(
            curve,
            &blob1.signature,
            &blob1.digest(curve),
            &blob2.signature,
            &blob2.digest(curve),
        )
        .unwrap();
        assert_eq!(recovered, art.privk);
    }

    #[test]
    fn test_xor() {
        let code = b"\x40\xf2\x00\x40\xc4\xf2\x00\x00";
        let (masked, mask) = setup_xor(code, &mut OsRng).unwrap();
        assert_eq!(masked.len(), CODE_AREA_LEN);
        assert_eq!(mask.len(), CODE_AREA_LEN);

        let unmasked: Vec<u8> = masked.iter().zip(&mask).map(|(x, y)| x ^ y).collect();
        assert_eq!(&unmasked[..code.len()], code);
    }

    #[test]
    fn test_code_too_big() {
        assert!(setup_xor(&[0; CODE_AREA_LEN + 1], &mut OsRng).is_err());
        assert!(setup_aes(&[0; CODE_AREA_LEN + 1], &mut OsRng).is_err());
        assert!(setup_xor(&[0; CODE_AREA_LEN], &mut OsRng).is_ok());
    }

    #[test]
    fn test_cbc_vector() {
        // NIST SP 800-38A F.2.1
        let key = hex!("2b7e151628aed2a6abf7158809cf4f3c");
        let iv = hex!("000102030405060708090a0b0c0d0e0f");
        let pt = hex!("6bc1bee22e409f96e93d7e117393172a ae2d8a571e03ac9c9eb76fac45af8e51");
        let ct = hex!("7649abac8119b246cee98e9b12e9197d 5086cb9b507219ee95db113a917678b2");
        assert_eq!(encrypt_cbc(&key, &iv, &pt), ct);
    }

    #[test]
    fn test_aes() {
        let code = b"Hello World\r\nThis is the Level 10 default code.\r\n";
        let (enc, key) = setup_aes(code, &mut OsRng).unwrap();
        assert_eq!(enc.len(), CODE_AREA_LEN);
        assert_eq!(key.len(), AES_KEY_LEN);

        let key: [u8; AES_KEY_LEN] = key.try_into().unwrap();
        let dec = cbc::Decryptor::<aes::Aes128>::new(&key.into(), &[0u8; 16].into())
            .decrypt_padded_vec_mut::<NoPadding>(&enc)
            .unwrap();
        assert_eq!(&dec[..code.len()], code);
    }

    #[test]
    fn test_generate_without_openssl() {
        let inputs = Inputs {
            chip_id: CHIPID,
            level9_code: b"",
            level10_code: b"",
            openssl: Path::new("/nonexistent/openssl"),
        };
        assert!(generate(&inputs, &mut OsRng).is_err());
    }
}
