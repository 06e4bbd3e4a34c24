//! Signing ledger backed by a journal directory.
//!
//! Each submitted statement is signed by the ledger's wallet and written to
//! `{journal}/{token}.json`:
//!
//! ```json
//! {
//!     "version": 1,
//!     "entry": {
//!         "token": "tx_...",
//!         "kind": "RECORD_ATTENDANCE",
//!         "payload": "{\"type\":\"RECORD_ATTENDANCE\",...}",
//!         "signer": "<wallet address>",
//!         "signature": "<base64>",
//!         "submitted_at": 1757325600000000
//!     }
//! }
//! ```
//!
//! `payload` is the exact signed byte string.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AttendanceError, Result};
use crate::identity::{Address, Wallet};
use crate::storage::write_atomic;

use super::{reference_token, Ledger, Statement};

const JOURNAL_FILE_VERSION: u32 = 1;

/// One signed statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub token: String,
    pub kind: String,
    pub payload: String,
    pub signer: Address,
    pub signature: String,
    pub submitted_at: u64,
}

impl JournalEntry {
    /// Check the signature against the signer's address.
    pub fn verify(&self) -> Result<()> {
        Wallet::verify(&self.signer, self.payload.as_bytes(), &self.signature)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct JournalFile {
    version: u32,
    entry: JournalEntry,
}

/// Ledger that signs every statement and journals it to disk.
pub struct SigningLedger {
    wallet: Wallet,
    journal_dir: PathBuf,
}

impl SigningLedger {
    /// Create the journal directory if needed.
    pub fn new(wallet: Wallet, journal_dir: impl Into<PathBuf>) -> Result<Self> {
        let journal_dir = journal_dir.into();
        std::fs::create_dir_all(&journal_dir)?;
        Ok(Self {
            wallet,
            journal_dir,
        })
    }

    pub fn signer(&self) -> Address {
        self.wallet.address()
    }

    pub fn journal_dir(&self) -> &Path {
        &self.journal_dir
    }

    /// Load a journal entry by token.
    pub fn load(&self, token: &str) -> Result<JournalEntry> {
        let path = self.entry_path(token);
        if !path.exists() {
            return Err(AttendanceError::NotFound(format!("journal entry not found: {token}")));
        }
        let bytes = std::fs::read(&path)?;
        let file: JournalFile = serde_json::from_slice(&bytes).map_err(|e| {
            AttendanceError::InvalidFileFormat(format!(
                "failed to parse journal entry {}: {e}",
                path.display()
            ))
        })?;
        Ok(file.entry)
    }

    /// Tokens of every journaled statement, sorted.
    pub fn tokens(&self) -> Result<Vec<String>> {
        let mut tokens = Vec::new();
        for entry in std::fs::read_dir(&self.journal_dir)? {
            let name = entry?.file_name();
            if let Some(stem) = name.to_string_lossy().strip_suffix(".json") {
                tokens.push(stem.to_string());
            }
        }
        tokens.sort();
        Ok(tokens)
    }

    fn entry_path(&self, token: &str) -> PathBuf {
        self.journal_dir.join(format!("{token}.json"))
    }
}

impl Ledger for SigningLedger {
    fn submit(&self, statement: &Statement<'_>) -> Result<String> {
        let payload = statement.to_payload()?;
        let token = reference_token(payload.as_bytes());
        let entry = JournalEntry {
            token: token.clone(),
            kind: statement.kind().to_string(),
            signature: self.wallet.sign(payload.as_bytes()),
            payload,
            signer: self.wallet.address(),
            submitted_at: crate::time::now_micros(),
        };

        let file = JournalFile {
            version: JOURNAL_FILE_VERSION,
            entry,
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| AttendanceError::SerializationError(e.to_string()))?;
        write_atomic(&self.entry_path(&token), json.as_bytes()).map_err(|e| {
            AttendanceError::CollaboratorUnavailable(format!("ledger journal write failed: {e}"))
        })?;

        log::debug!("signed {} as {token}", statement.kind());
        Ok(token)
    }
}
