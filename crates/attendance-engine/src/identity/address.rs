//! Wallet addresses.
//!
//! An address is the RFC 4648 base32 encoding (upper case, no padding) of
//! `public_key ‖ sha256(public_key)[28..32]`: 36 bytes, 58 characters.

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::crypto::keys::WalletKeyPair;
use crate::error::{AttendanceError, Result};

/// Length of a well-formed address.
pub const ADDRESS_LEN: usize = 58;

const CHECKSUM_LEN: usize = 4;
const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// An opaque participant identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    /// Address for an Ed25519 public key.
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        let mut bytes = Vec::with_capacity(32 + CHECKSUM_LEN);
        bytes.extend_from_slice(key.as_bytes());
        bytes.extend_from_slice(&checksum(key.as_bytes()));
        Self(base32_encode(&bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Weak shape check: exactly 58 characters from the base32 alphabet.
    ///
    /// This is what the engine enforces. It does not prove a key exists.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == ADDRESS_LEN && self.0.bytes().all(|b| ALPHABET.contains(&b))
    }

    /// Decode the embedded public key and check the trailing checksum.
    pub fn verifying_key(&self) -> Result<VerifyingKey> {
        if !self.is_well_formed() {
            return Err(AttendanceError::InvalidKey(format!(
                "malformed address '{}'",
                self.0
            )));
        }
        let bytes = base32_decode(&self.0)?;
        let (key, sum) = bytes.split_at(32);
        if sum[..CHECKSUM_LEN] != checksum(key) {
            return Err(AttendanceError::InvalidKey(
                "address checksum mismatch".into(),
            ));
        }
        let mut key_bytes = [0u8; 32];
        key_bytes.copy_from_slice(key);
        WalletKeyPair::verifying_key_from_bytes(&key_bytes)
    }

    /// Hex of the embedded public key.
    pub fn public_key_hex(&self) -> Result<String> {
        Ok(hex::encode(self.verifying_key()?.as_bytes()))
    }

    /// Shortened form for listings, e.g. `ABCDEF...WXYZ`.
    pub fn short(&self) -> String {
        if self.0.len() <= 12 || !self.0.is_ascii() {
            return self.0.clone();
        }
        format!("{}...{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self(s)
    }
}

fn checksum(public_key: &[u8]) -> [u8; CHECKSUM_LEN] {
    let hash = Sha256::digest(public_key);
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&hash[hash.len() - CHECKSUM_LEN..]);
    out
}

fn base32_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity((data.len() * 8).div_ceil(5));
    let mut buffer: u32 = 0;
    let mut bits = 0u32;
    for &byte in data {
        buffer = (buffer << 8) | byte as u32;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[((buffer >> bits) & 0x1F) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(ALPHABET[((buffer << (5 - bits)) & 0x1F) as usize] as char);
    }
    out
}

fn base32_decode(s: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(s.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits = 0u32;
    for c in s.bytes() {
        let value = ALPHABET
            .iter()
            .position(|&a| a == c)
            .ok_or_else(|| AttendanceError::InvalidKey(format!("invalid base32 character '{}'", c as char)))?;
        buffer = (buffer << 5) | value as u32;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((buffer >> bits) as u8);
        }
    }
    Ok(out)
}
