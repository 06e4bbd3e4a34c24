//! Random bytes from the operating system's CSPRNG.

use rand::RngCore;

pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    rand::thread_rng().fill_bytes(&mut buf);
    buf
}

/// 12-byte ChaCha20-Poly1305 nonce.
pub fn random_nonce_12() -> [u8; 12] {
    random_bytes()
}

/// 16-byte Argon2id salt.
pub fn random_salt_16() -> [u8; 16] {
    random_bytes()
}

/// 16 bytes mixed into record identifiers and ledger tokens.
pub fn id_nonce() -> [u8; 16] {
    random_bytes()
}
