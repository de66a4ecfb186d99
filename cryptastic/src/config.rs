// Copyright 2020, Verizon Media
// Licensed under the terms of the MIT license. See LICENSE file in project root for terms.

//! The configuration file that levels 7 and 8 ask the player to forge.

use crate::error::{Error, Result};

/// Configuration files are always padded out to this many bytes.
pub const CONFIG_FILE_LEN: usize = 128;

pub const LEVEL7_BANNER: &str = "ACME Device Provisioning System";
pub const LEVEL8_BANNER: &str = "RR Device Provisioning System";

/// The "friend's device" that the second level 8 example blob is made for.
pub const LEVEL8_FRIEND_DEVICE_ID: &str = "81C17E1F29E67251E6461147";

const DEVICE_ID_KEY: &str = "DEVICE_ID=";
const LOCKED_STATE_KEY: &str = "LOCKED_STATE=";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigFile {
    pub banner: String,
    pub device_id: String,
    pub locked: bool,
}

impl ConfigFile {
    /// A locked configuration, which is what the provisioner always signs.
    pub fn locked(banner: &str, device_id: &str) -> Self {
        ConfigFile {
            banner: banner.to_owned(),
            device_id: device_id.to_owned(),
            locked: true,
        }
    }

    /// Renders the file and pads it with spaces to [`CONFIG_FILE_LEN`].
    pub fn render(&self) -> Result<Vec<u8>> {
        let text = format!(
            "# {}\n{}{}\n{}{}",
            self.banner, DEVICE_ID_KEY, self.device_id, LOCKED_STATE_KEY, self.locked
        );
        pad(text.as_bytes())
    }
}

/// Right-pads `payload` with spaces to [`CONFIG_FILE_LEN`].
pub fn pad(payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() > CONFIG_FILE_LEN {
        return Err(Error::PayloadTooLong { len: payload.len(), max: CONFIG_FILE_LEN });
    }

    let mut out = payload.to_vec();
    out.resize(CONFIG_FILE_LEN, b' ');
    Ok(out)
}

/// Rewrites a (padded) payload so that it says `LOCKED_STATE=false`, keeping
/// everything else, and pads it back out.
pub fn unlock(payload: &[u8]) -> Result<Vec<u8>> {
    let text = String::from_utf8_lossy(payload);
    let unlocked = text
        .trim()
        .replace("LOCKED_STATE=true", "LOCKED_STATE=false");
    pad(unlocked.as_bytes())
}

/// What the firmware concludes from a configuration file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigState {
    /// Every `DEVICE_ID=` line, in order.
    pub device_ids: Vec<String>,
    pub locked: bool,
}

impl ConfigState {
    /// Parses a payload the same way the firmware does. Anything it doesn't
    /// understand, including invalid UTF-8, leaves the device locked.
    pub fn parse(payload: &[u8]) -> Self {
        let mut state = ConfigState { device_ids: Vec::new(), locked: true };

        let text = match std::str::from_utf8(payload) {
            Ok(text) => text,
            Err(_) => return state,
        };

        for line in text.lines() {
            let line = line.trim();

            if let Some(devid) = line.strip_prefix(DEVICE_ID_KEY) {
                state.device_ids.push(devid.to_owned());
            } else if let Some(lockstate) = line.strip_prefix(LOCKED_STATE_KEY) {
                if lockstate == "false" {
                    state.locked = false;
                }
            }
        }

        state
    }

    /// True if the firmware on the device with id `device_id` would accept
    /// this file as an unlock. Any one matching `DEVICE_ID=` line is enough.
    pub fn unlocks(&self, device_id: &str) -> bool {
        !self.locked && self.device_ids.iter().any(|id| id == device_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHIPID: &str = "0123456789ABCDEF01234567";

    #[test]
    fn test_render() {
        let file = ConfigFile::locked(LEVEL8_BANNER, CHIPID).render().unwrap();
        assert_eq!(file.len(), CONFIG_FILE_LEN);
        let expected = b"# RR Device Provisioning System\n\
            DEVICE_ID=0123456789ABCDEF01234567\n\
            LOCKED_STATE=true";
        assert_eq!(&file[..expected.len()], &expected[..]);
        assert!(file[expected.len()..].iter().all(|&b| b == b' '));
    }

    #[test]
    fn test_render_too_long() {
        let file = ConfigFile::locked(&"x".repeat(100), CHIPID);
        assert!(matches!(file.render(), Err(Error::PayloadTooLong { max: CONFIG_FILE_LEN, .. })));
    }

    #[test]
    fn test_parse_rendered() {
        let file = ConfigFile::locked(LEVEL7_BANNER, CHIPID).render().unwrap();
        let state = ConfigState::parse(&file);
        assert_eq!(state.device_ids, [CHIPID]);
        assert!(state.locked);
        assert!(!state.unlocks(CHIPID));
    }

    #[test]
    fn test_unlock() {
        let file = ConfigFile::locked(LEVEL8_BANNER, CHIPID).render().unwrap();
        let unlocked = unlock(&file).unwrap();
        assert_eq!(unlocked.len(), CONFIG_FILE_LEN);

        let state = ConfigState::parse(&unlocked);
        assert!(state.unlocks(CHIPID));
        assert!(!state.unlocks(LEVEL8_FRIEND_DEVICE_ID));

        let expected = ConfigFile { locked: false, ..ConfigFile::locked(LEVEL8_BANNER, CHIPID) };
        assert_eq!(unlocked, expected.render().unwrap());
    }

    #[test]
    fn test_parse_is_strict() {
        // Only exactly "false" unlocks
        let state = ConfigState::parse(b"DEVICE_ID=AA\nLOCKED_STATE=False");
        assert!(state.locked);
        let state = ConfigState::parse(b"DEVICE_ID=AA\r\n  LOCKED_STATE=false  \r\n");
        assert!(state.unlocks("AA"));
        let state = ConfigState::parse(b"DEVICE_ID=AA\nDEVICE_ID=BB\nLOCKED_STATE=false");
        assert!(state.unlocks("AA"));
        assert!(state.unlocks("BB"));
        assert!(!state.unlocks("CC"));
        let state = ConfigState::parse(&[0xff, 0xfe, b'\n']);
        assert_eq!(state, ConfigState { device_ids: Vec::new(), locked: true });
    }
}
