//! Mines the client's first packet for the tunnel headers.
//!
//! The block is never validated as HTTP; any line of the form
//! `Name: Value` separated by CRLF is a candidate.

use std::borrow::Cow;

pub const REAL_HOST: &str = "X-Real-Host";
pub const SPLIT: &str = "X-Split";
pub const PASS: &str = "X-Pass";

/// Returns the trimmed value of the first line starting with `"<name>: "`.
#[must_use]
pub fn lookup<'a>(block: &'a str, name: &str) -> Option<&'a str> {
    block
        .split("\r\n")
        .find_map(|line| line.strip_prefix(name)?.strip_prefix(": "))
        .map(str::trim)
}

/// A raw header block decoded from the first read on a connection.
pub struct HeaderBlock<'a> {
    text: Cow<'a, str>,
}

impl<'a> HeaderBlock<'a> {
    #[must_use]
    pub fn new(raw: &'a [u8]) -> Self {
        Self {
            text: String::from_utf8_lossy(raw),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        lookup(&self.text, name)
    }
}

/// The headers the tunnel cares about, detached from the read buffer.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub real_host: Option<String>,
    pub pass: Option<String>,
    pub split: bool,
}

impl Handshake {
    #[must_use]
    pub fn parse(raw: &[u8]) -> Self {
        let block = HeaderBlock::new(raw);
        Self {
            real_host: block.get(REAL_HOST).map(str::to_owned),
            pass: block.get(PASS).map(str::to_owned),
            split: block.get(SPLIT).is_some(),
        }
    }
}
