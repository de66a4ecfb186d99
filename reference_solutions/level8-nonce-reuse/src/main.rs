// Copyright 2020, Verizon Media
// Licensed under the terms of the MIT license. See LICENSE file in project root for terms.

//! Level 8 reference solution.
//!
//! The board hands out two signed configuration files: one for itself and one
//! for a "friend's" device. Both were signed with the same nonce, which gives
//! away the signing key. With the key we can sign our own file that unlocks
//! the board.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, ensure, Context, Result};
use clap::Parser;
use cryptastic::config::{unlock, CONFIG_FILE_LEN};
use cryptastic::{recover_nonce, recover_private_key, BigInt, Curve, SignedBlob};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

/// The firmware prints a 192 byte blob as 12 lines of 16 bytes.
const BLOB_LINES: usize = 12;

/// Recovers the level 8 signing key from two blobs that share a nonce and
/// forges an unlocked configuration file.
#[derive(Debug, Parser)]
struct Args {
    /// Where to write the forged (binary) blob.
    outfile: PathBuf,
}

/// Reads one blob as printed by the firmware.
fn read_blob<B: BufRead>(input: &mut B, curve: &Curve) -> Result<SignedBlob> {
    let mut text = String::new();
    for _ in 0..BLOB_LINES {
        if input.read_line(&mut text).context("reading blob")? == 0 {
            bail!("input ended in the middle of a blob");
        }
    }

    let blob = SignedBlob::from_hex_dump(curve, &text)?;
    ensure!(
        blob.payload.len() == CONFIG_FILE_LEN,
        "payload is {} bytes, expected {}",
        blob.payload.len(),
        CONFIG_FILE_LEN
    );
    Ok(blob)
}

/// Pulls the private key out of two blobs signed with the same nonce.
fn recover_key(curve: &Curve, blob1: &SignedBlob, blob2: &SignedBlob) -> Result<BigInt> {
    let z1 = blob1.digest(curve);
    let z2 = blob2.digest(curve);

    let k = recover_nonce(curve, &blob1.signature, &z1, &blob2.signature, &z2)
        .context("blobs were not signed with the same nonce")?;
    let d = recover_private_key(curve, &blob1.signature, &z1, &blob2.signature, &z2)?;

    // A wrong key would still happily sign, so check it against blob 1
    let pubk = curve.mul(&d, &curve.g);
    ensure!(blob1.verify(curve, &pubk), "recovered key does not verify the first blob");

    log::info!("Pwning - k = {:x}", k);
    log::info!("Pwning - private key = {:x}", d);
    Ok(d)
}

/// Re-signs `blob`'s payload with `LOCKED_STATE` flipped to false.
fn forge<R: RngCore + CryptoRng>(
    curve: &Curve,
    key: &BigInt,
    blob: &SignedBlob,
    rng: &mut R,
) -> Result<SignedBlob> {
    let payload = unlock(&blob.payload)?;
    Ok(SignedBlob::sign(curve, key, payload, rng)?)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let curve = Curve::secp256r1();
    let stdin = io::stdin();
    let mut input = stdin.lock();

    println!("Paste first configuration data blob now");
    let blob1 = read_blob(&mut input, curve).context("first blob")?;
    println!("Paste second configuration data blob now");
    let blob2 = read_blob(&mut input, curve).context("second blob")?;

    let key = recover_key(curve, &blob1, &blob2)?;
    let forged = forge(curve, &key, &blob1, &mut OsRng)?;

    fs::write(&args.outfile, forged.to_bytes(curve)?)
        .with_context(|| format!("writing {}", args.outfile.display()))?;
    log::info!("Wrote {}", args.outfile.display());

    let mut stdout = io::stdout();
    stdout.write_all(forged.to_hex_dump(curve)?.as_bytes())?;
    stdout.flush()?;

    Ok(())
}
