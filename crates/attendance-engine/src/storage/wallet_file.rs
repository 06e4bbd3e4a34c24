//! `.wallet` file format: encrypted wallet storage.
//!
//! The Ed25519 secret is sealed with ChaCha20-Poly1305 under a key derived
//! from the user's passphrase with Argon2id. The public summary (address,
//! label, creation time) is stored in the clear so wallets can be listed
//! without the passphrase.
//!
//! File format (JSON):
//! ```json
//! {
//!     "version": 1,
//!     "format": "atnd-wallet-v1",
//!     "encryption": {
//!         "algorithm": "chacha20-poly1305",
//!         "kdf": "argon2id",
//!         "salt": "<base64-16-bytes>",
//!         "nonce": "<base64-12-bytes>"
//!     },
//!     "encrypted_secret": "<base64-ciphertext>",
//!     "public": { "address": "...", "label": "...", "created_at": 0 }
//! }
//! ```

use std::path::Path;

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::crypto::encryption::{self, Sealed};
use crate::error::{AttendanceError, Result};
use crate::identity::{Wallet, WalletSummary};

use super::write_atomic;

// ── File format constants ─────────────────────────────────────────────────────

const WALLET_VERSION: u32 = 1;
const WALLET_FORMAT: &str = "atnd-wallet-v1";
const WALLET_ALGORITHM: &str = "chacha20-poly1305";
const WALLET_KDF: &str = "argon2id";

// ── On-disk structures ────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct WalletFile {
    pub version: u32,
    pub format: String,
    pub encryption: EncryptionMetadata,
    /// Base64 ciphertext of the sealed secret.
    pub encrypted_secret: String,
    pub public: WalletSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EncryptionMetadata {
    pub algorithm: String,
    pub kdf: String,
    pub salt: String,
    pub nonce: String,
}

/// Plaintext sealed inside the file.
#[derive(Serialize, Deserialize, Zeroize)]
struct WalletSecret {
    secret_key_b64: String,
}

fn b64() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::STANDARD
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encrypt and save a wallet. The write is atomic.
///
/// # Errors
///
/// Returns `DerivationFailed` or `EncryptionFailed` if sealing fails, or
/// `Io` for filesystem errors.
pub fn save_wallet(wallet: &Wallet, path: &Path, passphrase: &str) -> Result<()> {
    let mut secret_bytes = wallet.secret_bytes();
    let mut secret = WalletSecret {
        secret_key_b64: b64().encode(secret_bytes),
    };
    secret_bytes.zeroize();

    let mut plaintext = serde_json::to_vec(&secret)
        .map_err(|e| AttendanceError::SerializationError(e.to_string()))?;
    secret.zeroize();

    let sealed = encryption::seal(passphrase.as_bytes(), &plaintext);
    plaintext.zeroize();
    let sealed = sealed?;

    let file = WalletFile {
        version: WALLET_VERSION,
        format: WALLET_FORMAT.to_string(),
        encryption: EncryptionMetadata {
            algorithm: WALLET_ALGORITHM.to_string(),
            kdf: WALLET_KDF.to_string(),
            salt: b64().encode(sealed.salt),
            nonce: b64().encode(sealed.nonce),
        },
        encrypted_secret: b64().encode(&sealed.ciphertext),
        public: wallet.summary(),
    };

    let json = serde_json::to_string_pretty(&file)
        .map_err(|e| AttendanceError::SerializationError(e.to_string()))?;
    write_atomic(path, json.as_bytes())
}

/// Load and decrypt a wallet.
///
/// # Errors
///
/// Returns `InvalidPassphrase` for a wrong passphrase, `InvalidFileFormat`
/// for malformed files or a secret that does not match the stored address,
/// or `Io` for filesystem errors.
pub fn load_wallet(path: &Path, passphrase: &str) -> Result<Wallet> {
    let file = read_file(path)?;

    let salt: [u8; 16] = decode(&file.encryption.salt, "salt")?
        .try_into()
        .map_err(|_| AttendanceError::InvalidFileFormat("salt must be 16 bytes".into()))?;
    let nonce: [u8; 12] = decode(&file.encryption.nonce, "nonce")?
        .try_into()
        .map_err(|_| AttendanceError::InvalidFileFormat("nonce must be 12 bytes".into()))?;
    let sealed = Sealed {
        salt,
        nonce,
        ciphertext: decode(&file.encrypted_secret, "ciphertext")?,
    };

    let mut plaintext = encryption::open(passphrase.as_bytes(), &sealed)?;
    let parsed: std::result::Result<WalletSecret, _> = serde_json::from_slice(&plaintext);
    plaintext.zeroize();
    let mut secret =
        parsed.map_err(|e| AttendanceError::InvalidFileFormat(format!("wallet secret: {e}")))?;

    let key_vec = b64().decode(&secret.secret_key_b64);
    secret.zeroize();
    let mut key_vec =
        key_vec.map_err(|e| AttendanceError::InvalidKey(format!("invalid secret key base64: {e}")))?;
    let key_bytes: std::result::Result<[u8; 32], _> = key_vec.as_slice().try_into();
    key_vec.zeroize();
    let mut key_bytes =
        key_bytes.map_err(|_| AttendanceError::InvalidKey("secret key must be 32 bytes".into()))?;

    let wallet = Wallet::from_parts(&key_bytes, file.public.created_at, file.public.label.clone());
    key_bytes.zeroize();

    if wallet.address() != file.public.address {
        return Err(AttendanceError::InvalidFileFormat(
            "wallet secret does not match the stored address".into(),
        ));
    }
    Ok(wallet)
}

/// Read the public summary without the passphrase.
pub fn read_wallet_summary(path: &Path) -> Result<WalletSummary> {
    Ok(read_file(path)?.public)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn read_file(path: &Path) -> Result<WalletFile> {
    if !path.exists() {
        return Err(AttendanceError::NotFound(format!(
            "wallet not found: {}",
            path.display()
        )));
    }
    let bytes = std::fs::read(path)?;
    let file: WalletFile = serde_json::from_slice(&bytes).map_err(|e| {
        AttendanceError::InvalidFileFormat(format!("failed to parse wallet file: {e}"))
    })?;
    if file.version != WALLET_VERSION || file.format != WALLET_FORMAT {
        return Err(AttendanceError::InvalidFileFormat(format!(
            "unsupported wallet file version={} format={}",
            file.version, file.format
        )));
    }
    Ok(file)
}

fn decode(field: &str, what: &str) -> Result<Vec<u8>> {
    b64()
        .decode(field)
        .map_err(|e| AttendanceError::InvalidFileFormat(format!("invalid {what} base64: {e}")))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
