//! Passphrase protection for wallet secrets.
//!
//! The passphrase is stretched with Argon2id and the resulting key seals
//! the secret with ChaCha20-Poly1305. A wrong passphrase surfaces as an
//! AEAD authentication failure, reported as `InvalidPassphrase`.

use argon2::{Algorithm, Argon2, Params, Version};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use zeroize::Zeroize;

use crate::crypto::random::{random_nonce_12, random_salt_16};
use crate::error::{AttendanceError, Result};

const ARGON2_M_COST: u32 = 65536; // 64 MiB
const ARGON2_T_COST: u32 = 3;
const ARGON2_P_COST: u32 = 4;

/// Output of [`seal`]: everything needed to open the secret again.
#[derive(Debug, Clone)]
pub struct Sealed {
    pub salt: [u8; 16],
    pub nonce: [u8; 12],
    pub ciphertext: Vec<u8>,
}

/// Stretch a passphrase into a 32-byte key.
pub fn derive_passphrase_key(passphrase: &[u8], salt: &[u8; 16]) -> Result<[u8; 32]> {
    let params = Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, Some(32))
        .map_err(|e| AttendanceError::DerivationFailed(format!("Argon2 params: {e}")))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = [0u8; 32];
    argon2
        .hash_password_into(passphrase, salt, &mut key)
        .map_err(|e| AttendanceError::DerivationFailed(format!("Argon2 hash: {e}")))?;
    Ok(key)
}

fn cipher(key: &[u8; 32]) -> Result<ChaCha20Poly1305> {
    ChaCha20Poly1305::new_from_slice(key)
        .map_err(|e| AttendanceError::EncryptionFailed(format!("cipher init: {e}")))
}

/// Encrypt `plaintext` under a key derived from `passphrase`.
pub fn seal(passphrase: &[u8], plaintext: &[u8]) -> Result<Sealed> {
    let salt = random_salt_16();
    let nonce = random_nonce_12();
    let mut key = derive_passphrase_key(passphrase, &salt)?;
    let result = cipher(&key).and_then(|c| {
        c.encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|e| AttendanceError::EncryptionFailed(format!("encrypt: {e}")))
    });
    key.zeroize();
    Ok(Sealed {
        salt,
        nonce,
        ciphertext: result?,
    })
}

/// Decrypt a [`Sealed`] blob. Fails with `InvalidPassphrase` on a wrong
/// passphrase or tampered ciphertext.
pub fn open(passphrase: &[u8], sealed: &Sealed) -> Result<Vec<u8>> {
    let mut key = derive_passphrase_key(passphrase, &sealed.salt)?;
    let result = cipher(&key).and_then(|c| {
        c.decrypt(Nonce::from_slice(&sealed.nonce), sealed.ciphertext.as_slice())
            .map_err(|_| AttendanceError::InvalidPassphrase)
    });
    key.zeroize();
    result
}
