// Copyright 2020, Verizon Media
// Licensed under the terms of the MIT license. See LICENSE file in project root for terms.

//! The board's debug console, as seen from the host.

use std::io::{self, ErrorKind, Read, Write};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};

const PROVISION_CMD: &[u8] = b"__provision\n";
const PROVISION_REPLY_PREFIX: &[u8] = b"__provision\r\nDEVICE_ID: ";
const CHIP_ID_LEN: usize = 24;
const LOCK_CMD: &[u8] = b"__lockme\r\n";
const PROMPT: &[u8] = b"> ";
const ACK: u8 = b'O';

/// Converts every CR, LF, CRLF or LFCR into CRLF, which is what the firmware
/// echoes back for any of them.
pub fn canonicalize_newlines(inp: &[u8]) -> Vec<u8> {
    let mut outp = Vec::with_capacity(inp.len() * 2);
    let mut seencr = false;

    for &b in inp {
        match b {
            b'\r' => {
                if seencr {
                    outp.extend_from_slice(b"\r\n");
                }
                seencr = true;
            }
            b'\n' => {
                outp.extend_from_slice(b"\r\n");
                seencr = false;
            }
            _ => {
                if seencr {
                    outp.extend_from_slice(b"\r\n");
                }
                seencr = false;
                outp.push(b);
            }
        }
    }

    if seencr {
        outp.extend_from_slice(b"\r\n");
    }

    outp
}

pub struct Console<P> {
    port: P,
}

impl<P: Read + Write> Console<P> {
    pub fn new(port: P) -> Self {
        Console { port }
    }

    /// Writes one byte at a time, flushing after each. The target's UART has
    /// no flow control and drops bytes if they arrive back to back.
    pub fn write(&mut self, data: &[u8]) -> io::Result<()> {
        for byte in data {
            self.port.write_all(std::slice::from_ref(byte))?;
            self.port.flush()?;
        }
        Ok(())
    }

    /// Reads up to `n` bytes, stopping early if the port times out.
    pub fn read(&mut self, n: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0; n];
        let mut got = 0;

        while got < n {
            match self.port.read(&mut buf[got..]) {
                Ok(0) => break,
                Ok(len) => got += len,
                Err(e) if e.kind() == ErrorKind::TimedOut => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        buf.truncate(got);
        Ok(buf)
    }

    /// Writes `data` and checks that the board echoes it back.
    pub fn write_and_check(&mut self, data: &[u8]) -> io::Result<bool> {
        let expected = canonicalize_newlines(data);
        self.write(data)?;
        Ok(self.read(expected.len())? == expected)
    }

    /// Puts a freshly flashed board into provisioning mode and returns its
    /// chip id.
    pub fn start_provisioning(&mut self) -> Result<String> {
        self.write(PROVISION_CMD).context("sending provision command")?;

        let reply_len = PROVISION_REPLY_PREFIX.len() + CHIP_ID_LEN + 2;
        let reply = self.read(reply_len).context("reading provision reply")?;
        log::debug!("provision reply: {:?}", String::from_utf8_lossy(&reply));

        if reply.len() != reply_len
            || !reply.starts_with(PROVISION_REPLY_PREFIX)
            || !reply.ends_with(b"\r\n")
        {
            bail!(
                "unexpected reply to provision command (already provisioned?): {:?}",
                String::from_utf8_lossy(&reply)
            );
        }

        let id_start = PROVISION_REPLY_PREFIX.len();
        let chip_id = &reply[id_start..id_start + CHIP_ID_LEN];
        if !chip_id.iter().all(u8::is_ascii_hexdigit) {
            bail!("chip id is not hex: {:?}", String::from_utf8_lossy(chip_id));
        }

        Ok(String::from_utf8_lossy(chip_id).into_owned())
    }

    /// Streams one provisioning item and waits for the board to acknowledge.
    pub fn send_item(&mut self, name: &str, data: &[u8]) -> Result<()> {
        log::info!("Sending {} ({} bytes)", name, data.len());
        self.write(data).with_context(|| format!("sending {}", name))?;

        let reply = self.read(1).with_context(|| format!("waiting for ack of {}", name))?;
        if reply != [ACK] {
            bail!("board did not acknowledge {}: got {:?}", name, reply);
        }
        Ok(())
    }

    /// Waits for the board to finish writing flash and print its prompt.
    pub fn expect_prompt(&mut self, settle: Duration) -> Result<()> {
        thread::sleep(settle);

        let reply = self.read(PROMPT.len()).context("waiting for prompt")?;
        if reply != PROMPT {
            bail!("expected prompt, got {:?}", String::from_utf8_lossy(&reply));
        }
        Ok(())
    }

    /// Locks the debug port. After this the board can only be reprovisioned
    /// by a full erase.
    pub fn lock(&mut self) -> Result<()> {
        if !self.write_and_check(LOCK_CMD).context("sending lock command")? {
            bail!("board did not echo the lock command");
        }
        Ok(())
    }
}
