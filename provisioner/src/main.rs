// Copyright 2020, Verizon Media
// Licensed under the terms of the MIT license. See LICENSE file in project root for terms.

mod answers;
mod console;
mod generate;
mod record;

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::OsRng;
use serialport::{DataBits, FlowControl, Parity, StopBits};

use crate::console::Console;
use crate::generate::Inputs;

/// Time the board takes to write everything to flash before it prints a
/// prompt again.
const SETTLE_TIME: Duration = Duration::from_secs(3);

/// Provisions a freshly flashed hackme-1 board with its per-device secrets.
///
/// A record of everything sent is written to
/// `provision-record-<CHIPID>.json` before anything is sent.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Serial port the board's console is connected to.
    port: String,
    /// Console baud rate.
    #[arg(long, default_value_t = 115200)]
    baud: u32,
    /// Leave the debug port unlocked afterwards, for boards that will be
    /// reflashed.
    #[arg(long)]
    no_lock: bool,
    /// Raw Thumb binary for level 9, linked at 0x20008000.
    #[arg(long, value_name = "FILE")]
    level9_code: PathBuf,
    /// Raw Thumb binary for level 10, linked at 0x20008000.
    #[arg(long, value_name = "FILE")]
    level10_code: PathBuf,
    /// Directory to write the provision record into.
    #[arg(long, value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,
    /// openssl executable used for the level 7 RSA key.
    #[arg(long, value_name = "PATH", default_value = "openssl")]
    openssl: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let level9_code = fs::read(&args.level9_code)
        .with_context(|| format!("reading {}", args.level9_code.display()))?;
    let level10_code = fs::read(&args.level10_code)
        .with_context(|| format!("reading {}", args.level10_code.display()))?;

    let port = serialport::new(&args.port, args.baud)
        .timeout(Duration::from_secs(1))
        .data_bits(DataBits::Eight)
        .flow_control(FlowControl::None)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .open()
        .with_context(|| format!("opening {}", args.port))?;
    let mut console = Console::new(port);

    let chip_id = console.start_provisioning()?;
    log::info!("DEVICE_ID {}", chip_id);

    let record = generate::generate(
        &Inputs {
            chip_id: &chip_id,
            level9_code: &level9_code,
            level10_code: &level10_code,
            openssl: &args.openssl,
        },
        &mut OsRng,
    )?;

    // If anything below fails the board is half provisioned and needs to be
    // erased, but the record has to survive either way.
    let path = record.save(&args.out_dir)?;
    log::info!("Wrote {}", path.display());

    for item in record.items()? {
        console.send_item(item.name, &item.data)?;
    }

    console.expect_prompt(SETTLE_TIME)?;

    if args.no_lock {
        log::warn!("Leaving debug port unlocked");
    } else {
        console.lock()?;
        log::info!("Locked");
    }

    log::info!("Provisioned {}", chip_id);
    Ok(())
}
