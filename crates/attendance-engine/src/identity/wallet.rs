//! Ed25519 wallets.
//!
//! A wallet is the key pair behind an [`Address`]. It signs ledger
//! statements and acts as the [`IdentityProvider`] for CLI sessions.

use serde::{Deserialize, Serialize};

use crate::crypto::keys::WalletKeyPair;
use crate::crypto::signing;
use crate::error::Result;
use crate::identity::{Address, IdentityProvider};

/// A signing wallet. The secret key is wiped on drop.
pub struct Wallet {
    key_pair: WalletKeyPair,
    /// Creation timestamp (microseconds since Unix epoch).
    pub created_at: u64,
    /// Human-readable label, e.g. "prof-smith".
    pub label: Option<String>,
}

/// Public description of a wallet, safe to print or store in plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSummary {
    pub address: Address,
    pub label: Option<String>,
    pub created_at: u64,
}

impl Wallet {
    pub fn generate(label: Option<String>) -> Self {
        Self {
            key_pair: WalletKeyPair::generate(),
            created_at: crate::time::now_micros(),
            label,
        }
    }

    /// Rebuild a wallet from decrypted file contents.
    pub fn from_parts(secret: &[u8; 32], created_at: u64, label: Option<String>) -> Self {
        Self {
            key_pair: WalletKeyPair::from_secret_bytes(secret),
            created_at,
            label,
        }
    }

    pub fn address(&self) -> Address {
        Address::from_verifying_key(self.key_pair.verifying_key())
    }

    pub fn summary(&self) -> WalletSummary {
        WalletSummary {
            address: self.address(),
            label: self.label.clone(),
            created_at: self.created_at,
        }
    }

    /// Secret key bytes for persistence. Caller must zeroize after use.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.key_pair.secret_bytes()
    }

    /// Sign `message`, returning a base64 signature.
    pub fn sign(&self, message: &[u8]) -> String {
        signing::sign_to_base64(self.key_pair.signing_key(), message)
    }

    /// Verify a signature made by the wallet behind `signer`.
    pub fn verify(signer: &Address, message: &[u8], signature_b64: &str) -> Result<()> {
        let key = signer.verifying_key()?;
        signing::verify_from_base64(&key, message, signature_b64)
    }
}

impl IdentityProvider for Wallet {
    fn current_identity(&self) -> Option<Address> {
        Some(self.address())
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address())
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}
