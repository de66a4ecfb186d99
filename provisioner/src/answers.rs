// Copyright 2020, Verizon Media
// Licensed under the terms of the MIT license. See LICENSE file in project root for terms.

//! Values that are the same on every board.

// Answers to the CPLD levels. These are baked into the CPLD bitstream, so
// they can't be randomized per board.
pub const CPLD_16BIT_ANSWER: &[u8] = b"\x02\x08\x09\x01";
pub const CPLD_64BIT_ANSWER: &[u8] = b"\x22\x68\x1f\x5d\xd3\x19\x6c\x1f";
pub const CPLD_CENTER_HIDDEN: &[u8] = b"\x14\x1e\xfa\xea\x79\xfc\x06\xd1";
pub const CPLD_PTERM_HIDDEN: &[u8] =
    b"The magic words weren't squeamish ossifrage this time. Disappointing..";

pub const FLAGS: [&str; 16] = [
    "06fcd545ac08354819580ae94aa92756",
    "1a36cdf3f815ddafa1ceaa9319f5c84c",
    "211b5ddd566037617bdd65c3f1d4836c",
    "4f07a3cf9623c47ec45bd5c49e572f48",
    "c7c4d371a8f6630da41e986953dc55aa",
    "81fa61160e7cfa362fc49bb327253aa5",
    "1ab95018bfa3b3c7582d31cb72d95841",
    "b53bae63a361fcf84738cb92adca5985",
    "54f2a75097d2f5d61b3cb96529adf614",
    "cc4257be79040bb8258f8f01f6626766",
    "2b8c3ee77b9c51cfc1c88fb41b182fde",
    "2dee747c42138b13b46a8d5a1ddfb34a",
    "fd2b89e81036bdb9d88cdcb0db278fec",
    "7217096b9d12fb45393a878261b02ce0",
    "9e94493be2c112825e9a8ac6a29299ee",
    "0add0dc74ccb92205f770bf83f7cc5ea",
];

/// All flags back to back, the way the firmware stores them.
pub fn flags() -> Vec<u8> {
    FLAGS.concat().into_bytes()
}
