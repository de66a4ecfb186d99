// Copyright 2020, Verizon Media
// Licensed under the terms of the MIT license. See LICENSE file in project root for terms.

//! Everything generated for one board, and the order it is sent in.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cryptastic::{to_fixed_be, BigInt};
use serde::{Deserialize, Serialize};

use crate::answers;

/// Big-endian width of the RSA values the firmware expects.
pub const RSA_BYTES: usize = 256;
/// Big-endian width of the curve coordinates the firmware expects.
pub const FIELD_BYTES: usize = 32;

/// Field names match the records archived by the earlier provisioning
/// tooling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProvisionRecord {
    #[serde(rename = "CHIPID")]
    pub chip_id: String,

    #[serde(with = "base64_bytes")]
    pub level4_rng_seed: Vec<u8>,

    pub rsa_privk: String,
    #[serde(with = "hex_bigint")]
    pub rsa_n: BigInt,
    #[serde(with = "hex_bigint")]
    pub rsa_r: BigInt,
    #[serde(with = "hex_bigint")]
    pub rsa_rr: BigInt,
    #[serde(with = "base64_bytes")]
    pub level7_example: Vec<u8>,

    #[serde(with = "hex_bigint")]
    pub ecdsa_privk: BigInt,
    #[serde(with = "hex_bigint")]
    pub ecdsa_randk: BigInt,
    // Montgomery form
    #[serde(with = "hex_bigint")]
    pub level8_pubk_x: BigInt,
    #[serde(with = "hex_bigint")]
    pub level8_pubk_y: BigInt,
    #[serde(with = "hex_bigint")]
    pub level8_pubk_plus_g_x: BigInt,
    #[serde(with = "hex_bigint")]
    pub level8_pubk_plus_g_y: BigInt,
    #[serde(with = "base64_bytes")]
    pub level8_file1: Vec<u8>,
    #[serde(with = "base64_bytes")]
    pub level8_file2: Vec<u8>,

    #[serde(with = "base64_bytes")]
    pub level9_binary: Vec<u8>,
    #[serde(with = "base64_bytes")]
    pub level9_mask: Vec<u8>,

    #[serde(with = "base64_bytes")]
    pub level10_binary: Vec<u8>,
    #[serde(with = "base64_bytes")]
    pub level10_key: Vec<u8>,
}

/// One chunk of the provisioning stream. The board acknowledges each one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    pub name: &'static str,
    pub data: Vec<u8>,
}

impl ProvisionRecord {
    pub fn file_name(&self) -> String {
        format!("provision-record-{}.json", self.chip_id)
    }

    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(self.file_name());
        let json = serde_json::to_string_pretty(self).context("serializing provision record")?;
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }

    /// The record laid out in the order the firmware reads it, followed by
    /// the values that are the same on every board.
    pub fn items(&self) -> Result<Vec<Item>> {
        let rsa = |v: &BigInt| to_fixed_be(v, RSA_BYTES);
        let field = |v: &BigInt| to_fixed_be(v, FIELD_BYTES);

        let item = |name, data: Vec<u8>| Item { name, data };
        Ok(vec![
            item("RNG seed", self.level4_rng_seed.clone()),
            item("RSA N", rsa(&self.rsa_n)?),
            item("RSA R", rsa(&self.rsa_r)?),
            item("RSA R^2", rsa(&self.rsa_rr)?),
            item("RSA example", self.level7_example.clone()),
            item("ECDSA pubk x", field(&self.level8_pubk_x)?),
            item("ECDSA pubk y", field(&self.level8_pubk_y)?),
            item("ECDSA pubk + G x", field(&self.level8_pubk_plus_g_x)?),
            item("ECDSA pubk + G y", field(&self.level8_pubk_plus_g_y)?),
            item("ECDSA example 1", self.level8_file1.clone()),
            item("ECDSA example 2", self.level8_file2.clone()),
            item("Level 9 code", self.level9_binary.clone()),
            item("Level 9 XOR", self.level9_mask.clone()),
            item("Level 10 code", self.level10_binary.clone()),
            item("Level 10 key", self.level10_key.clone()),
            item("CPLD 16 bit answer", answers::CPLD_16BIT_ANSWER.to_vec()),
            item("CPLD 64 bit answer", answers::CPLD_64BIT_ANSWER.to_vec()),
            item("CPLD center hidden", answers::CPLD_CENTER_HIDDEN.to_vec()),
            item("CPLD pterm hidden", answers::CPLD_PTERM_HIDDEN.to_vec()),
            item("CTF flags", answers::flags()),
        ])
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s).map_err(D::Error::custom)
    }
}

mod hex_bigint {
    use cryptastic::BigInt;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_str_radix(16))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigInt, D::Error> {
        let s = String::deserialize(deserializer)?;
        BigInt::parse_bytes(s.as_bytes(), 16)
            .ok_or_else(|| D::Error::custom(format!("invalid hex integer {:?}", s)))
    }
}
