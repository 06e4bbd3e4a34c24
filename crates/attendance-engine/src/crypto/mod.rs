//! Cryptographic primitives behind wallets and signed ledger statements.
//!
//! - Ed25519 key generation, signing and verification
//! - Argon2id passphrase-based key derivation
//! - ChaCha20-Poly1305 authenticated encryption of wallet files
//! - OS-backed random bytes for nonces, salts and identifiers

pub mod encryption;
pub mod keys;
pub mod random;
pub mod signing;
