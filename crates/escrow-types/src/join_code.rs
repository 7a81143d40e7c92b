//! Human-shareable join codes.
//!
//! A join code is the 6-character token a project creator hands to the
//! counterparty. Codes are drawn from an unambiguous uppercase alphabet
//! (no `0`/`O`, `1`/`I`/`L`) so they survive being read aloud or typed
//! from a screenshot. Parsing normalizes case; storage and comparison are
//! always the normalized form.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Characters a join code may contain. Ambiguous glyphs are excluded.
pub const JOIN_CODE_ALPHABET: &[u8] = b"23456789ABCDEFGHJKMNPQRSTUVWXYZ";

/// Fixed length of every join code.
pub const JOIN_CODE_LEN: usize = 6;

/// Errors from parsing a user-supplied join code.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JoinCodeError {
    /// The input was not exactly [`JOIN_CODE_LEN`] characters.
    #[error("join code must be {JOIN_CODE_LEN} characters, got {0}")]
    WrongLength(usize),

    /// The input contained a character outside the code alphabet.
    #[error("join code contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// A validated, uppercase-normalized join code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JoinCode([u8; JOIN_CODE_LEN]);

impl JoinCode {
    /// Draw a uniformly random code from the alphabet.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut chars = [0u8; JOIN_CODE_LEN];
        for c in &mut chars {
            *c = JOIN_CODE_ALPHABET[rng.gen_range(0..JOIN_CODE_ALPHABET.len())];
        }
        Self(chars)
    }

    /// The normalized code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Alphabet is pure ASCII, so the bytes are always valid UTF-8.
        std::str::from_utf8(&self.0).unwrap_or("??????")
    }
}

impl FromStr for JoinCode {
    type Err = JoinCodeError;

    /// Parse user input, uppercasing lowercase letters first.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.chars().count() != JOIN_CODE_LEN {
            return Err(JoinCodeError::WrongLength(trimmed.chars().count()));
        }
        let mut chars = [0u8; JOIN_CODE_LEN];
        for (slot, c) in chars.iter_mut().zip(trimmed.chars()) {
            let upper = c.to_ascii_uppercase();
            if !upper.is_ascii() || !JOIN_CODE_ALPHABET.contains(&(upper as u8)) {
                return Err(JoinCodeError::InvalidCharacter(c));
            }
            *slot = upper as u8;
        }
        Ok(Self(chars))
    }
}

impl TryFrom<String> for JoinCode {
    type Error = JoinCodeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<JoinCode> for String {
    fn from(code: JoinCode) -> Self {
        code.as_str().to_owned()
    }
}

impl fmt::Display for JoinCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
