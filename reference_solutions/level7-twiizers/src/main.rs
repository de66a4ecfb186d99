// Copyright 2020, Verizon Media
// Licensed under the terms of the MIT license. See LICENSE file in project root for terms.

//! Level 7 reference solution.
//!
//! The firmware runs the uploaded RSA signature through the public key but
//! never checks the padding, and then compares the result against the
//! payload's SHA-256 with something like `strncmp`. An all-zero signature
//! comes out as all zeros, so any payload whose digest starts with a zero
//! byte is accepted.

use std::fs;
use std::io::{self, BufRead};
use std::ops::RangeInclusive;
use std::path::PathBuf;

use anyhow::{bail, ensure, Context, Result};
use clap::Parser;
use cryptastic::blob::HEX_DUMP_WIDTH;
use cryptastic::config::{pad, unlock, CONFIG_FILE_LEN};
use cryptastic::parse_hex_dump;
use sha2::{Digest, Sha256};

/// RSA-2048 signature in front of the payload.
const SIGNATURE_LEN: usize = 256;
const BLOB_LEN: usize = SIGNATURE_LEN + CONFIG_FILE_LEN;
/// The firmware prints the 384 byte blob as 24 lines.
const BLOB_LINES: usize = BLOB_LEN / HEX_DUMP_WIDTH;

/// Bytes the firmware's config parser doesn't mind inside a comment.
const PRINTABLE: RangeInclusive<u8> = b' '..=b'~';

/// Forges an unlocked level 7 configuration file that needs no key.
#[derive(Debug, Parser)]
struct Args {
    /// Where to write the forged (binary) blob.
    outfile: PathBuf,
}

/// Reads the blob printed on entering the level and returns its payload.
fn read_payload<B: BufRead>(input: &mut B) -> Result<Vec<u8>> {
    let mut text = String::new();
    for _ in 0..BLOB_LINES {
        if input.read_line(&mut text).context("reading blob")? == 0 {
            bail!("input ended in the middle of the blob");
        }
    }

    let mut blob = parse_hex_dump(&text)?;
    ensure!(blob.len() == BLOB_LEN, "blob is {} bytes, expected {}", blob.len(), BLOB_LEN);
    Ok(blob.split_off(SIGNATURE_LEN))
}

/// Flips `LOCKED_STATE` and appends a two byte `#` comment, trying comment
/// bytes until the padded payload's digest starts with zero.
fn forge(payload: &[u8]) -> Result<Vec<u8>> {
    let unlocked = unlock(payload)?;
    let mut base = String::from_utf8_lossy(&unlocked).trim_end().as_bytes().to_vec();
    base.extend_from_slice(b"\n#");

    for x1 in PRINTABLE {
        for x2 in PRINTABLE {
            let mut candidate = base.clone();
            candidate.extend_from_slice(&[x1, x2]);
            let candidate = pad(&candidate)?;

            if Sha256::digest(&candidate)[0] == 0 {
                log::info!("Comment bytes {:?}", String::from_utf8_lossy(&[x1, x2]));
                return Ok(candidate);
            }
        }
    }

    bail!("no comment gives a digest starting with zero")
}

/// The zero signature followed by the forged payload.
fn forged_blob(payload: &[u8]) -> Vec<u8> {
    let mut blob = vec![0; SIGNATURE_LEN];
    blob.extend_from_slice(payload);
    blob
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let stdin = io::stdin();
    let mut input = stdin.lock();

    println!("Paste configuration data blob now");
    let payload = read_payload(&mut input)?;
    log::info!("Old payload {:?}", String::from_utf8_lossy(&payload));

    let forged = forge(&payload)?;
    log::info!("New payload {:?}", String::from_utf8_lossy(&forged));

    fs::write(&args.outfile, forged_blob(&forged))
        .with_context(|| format!("writing {}", args.outfile.display()))?;
    log::info!("Wrote {}", args.outfile.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryptastic::config::LEVEL7_BANNER;
    use cryptastic::{hex_dump, ConfigFile, ConfigState};
    use std::io::Cursor;

    const CHIPID: &str = "0123456789ABCDEF01234567";

    fn leaked_blob() -> String {
        let mut blob = vec![0xa5; SIGNATURE_LEN];
        blob.extend(ConfigFile::locked(LEVEL7_BANNER, CHIPID).render().unwrap());
        hex_dump(&blob)
    }

    // The firmware's digest comparison: equal up to the first shared zero.
    fn digests_match(a: &[u8], b: &[u8]) -> bool {
        for (&x, &y) in a.iter().zip(b) {
            if x == 0 && y == 0 {
                return true;
            }
            if x != y {
                return false;
            }
        }
        true
    }

    #[test]
    fn test_solve() {
        let console = leaked_blob();
        assert_eq!(console.lines().count(), BLOB_LINES);

        let payload = read_payload(&mut Cursor::new(console)).unwrap();
        assert!(!ConfigState::parse(&payload).unlocks(CHIPID));

        let forged = forge(&payload).unwrap();
        assert_eq!(forged.len(), CONFIG_FILE_LEN);
        assert!(ConfigState::parse(&forged).unlocks(CHIPID));

        let digest = Sha256::digest(&forged);
        assert_eq!(digest[0], 0);
        assert!(digests_match(&digest, &[0; 32]));

        let blob = forged_blob(&forged);
        assert_eq!(blob.len(), BLOB_LEN);
        assert!(blob[..SIGNATURE_LEN].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_comment_is_appended() {
        let payload = ConfigFile::locked(LEVEL7_BANNER, CHIPID).render().unwrap();
        let forged = forge(&payload).unwrap();

        let prefix = b"# ACME Device Provisioning System\n\
            DEVICE_ID=0123456789ABCDEF01234567\n\
            LOCKED_STATE=false\n#";
        assert!(forged.starts_with(prefix));
        assert!(PRINTABLE.contains(&forged[prefix.len()]));
        assert!(PRINTABLE.contains(&forged[prefix.len() + 1]));
        assert!(forged[prefix.len() + 2..].iter().all(|&b| b == b' '));
    }

    #[test]
    fn test_truncated_blob() {
        let console: String = leaked_blob()
            .lines()
            .take(BLOB_LINES - 1)
            .map(|l| format!("{}\n", l))
            .collect();
        assert!(read_payload(&mut Cursor::new(console)).is_err());
    }

    #[test]
    fn test_short_blob() {
        let console = hex_dump(&[0u8; BLOB_LEN - 1]) + "\n";
        assert!(read_payload(&mut Cursor::new(console)).is_err());
    }
}
