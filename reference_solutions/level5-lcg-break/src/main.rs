// Copyright 2020, Verizon Media
// Licensed under the terms of the MIT license. See LICENSE file in project root for terms.

//! Level 5 reference solution.
//!
//! The dice game rolls with a 31 bit `rand()`-style LCG. Every observed roll
//! rules out about five sixths of the possible states, so after a dozen or
//! so rolls only one state is left and every later roll can be predicted.

use std::io::{self, BufRead};

use anyhow::{bail, ensure, Context, Result};
use rayon::prelude::*;

const LCG_MUL: u32 = 1103515245;
const LCG_INC: u32 = 12345;
const STATE_MASK: u32 = 0x7FFF_FFFF;
/// Folded values at or above this are thrown away so that `% 6` is unbiased.
const REROLL_AT: u32 = 252;

// The following mirror the firmware's dice logic. A player would have to
// guess this or get it from a hint.

fn lcg_step(x: u32) -> u32 {
    x.wrapping_mul(LCG_MUL).wrapping_add(LCG_INC) & STATE_MASK
}

fn fold(x: u32) -> u32 {
    ((x >> 24) & 0xFF) ^ ((x >> 16) & 0xFF) ^ ((x >> 8) & 0xFF) ^ (x & 0xFF)
}

/// True if the firmware would throw this state away and draw again.
fn rerolls(state: u32) -> bool {
    fold(state) >= REROLL_AT
}

/// The dice roll (1-6) shown for a state that doesn't reroll.
fn roll_of(state: u32) -> u8 {
    (fold(state) % 6 + 1) as u8
}

/// The state behind the next roll, skipping rerolls.
fn next_state(mut state: u32) -> u32 {
    loop {
        state = lcg_step(state);
        if !rerolls(state) {
            return state;
        }
    }
}

/// Keeps the states that would have shown `roll` and steps each of them to
/// the state behind the following roll.
fn narrow<I>(candidates: I, roll: u8) -> Vec<u32>
where
    I: IntoParallelIterator<Item = u32>,
{
    candidates
        .into_par_iter()
        .filter(|&state| !rerolls(state) && roll_of(state) == roll)
        .map(next_state)
        .collect()
}

fn read_roll<B: BufRead>(input: &mut B) -> Result<u8> {
    let mut line = String::new();
    if input.read_line(&mut line).context("reading roll")? == 0 {
        bail!("input ended");
    }

    let line = line.trim();
    let roll: u8 = line.parse().with_context(|| format!("not a roll: {:?}", line))?;
    ensure!((1..=6).contains(&roll), "dice only go from 1 to 6, got {}", roll);
    Ok(roll)
}

fn ask_roll<B: BufRead>(input: &mut B) -> Result<u8> {
    println!("What is the next dice roll?");
    read_roll(input)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let stdin = io::stdin();
    let mut input = stdin.lock();

    // No table of every state up front; the first roll filters the full range
    let roll = ask_roll(&mut input)?;
    let mut candidates = narrow(0..STATE_MASK + 1, roll);

    while candidates.len() != 1 {
        log::info!("There are currently {} possible states.", candidates.len());
        if candidates.is_empty() {
            bail!("no state fits those rolls (was one mistyped?)");
        }

        let roll = ask_roll(&mut input)?;
        candidates = narrow(candidates, roll);
    }

    let mut state = candidates[0];
    log::info!("Found the state: {:08X}", state);

    loop {
        println!("Next value is {} (state {:08X})", roll_of(state), state);

        // Wait for enter before predicting the next one
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(());
        }
        state = next_state(state);
    }
}
