//! Ledger collaborators: publish statements, hand back reference tokens.
//!
//! Every accepted write is described by a [`Statement`] and submitted to a
//! [`Ledger`] before it is persisted. The returned token is stored on the
//! session, record or excuse as its externally visible reference.

pub mod journal;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::checkin::AttendanceRecord;
use crate::crypto::random::id_nonce;
use crate::error::{AttendanceError, Result};
use crate::excuse::{ApprovalStatus, ExcuseId, ExcuseSubmission};
use crate::identity::Address;
use crate::session::{Session, SessionId};

pub use journal::{JournalEntry, SigningLedger};

/// A write, as published to the ledger.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Statement<'a> {
    DeclareClassSession {
        session: &'a Session,
    },
    DeactivateSession {
        session_id: &'a SessionId,
        actor: &'a Address,
    },
    RecordAttendance {
        record: &'a AttendanceRecord,
    },
    SubmitExcuse {
        excuse: &'a ExcuseSubmission,
    },
    ReviewExcuse {
        excuse_id: &'a ExcuseId,
        reviewer: &'a Address,
        status: ApprovalStatus,
        notes: Option<&'a str>,
    },
}

impl Statement<'_> {
    /// Canonical JSON payload.
    pub fn to_payload(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| AttendanceError::SerializationError(e.to_string()))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Statement::DeclareClassSession { .. } => "DECLARE_CLASS_SESSION",
            Statement::DeactivateSession { .. } => "DEACTIVATE_SESSION",
            Statement::RecordAttendance { .. } => "RECORD_ATTENDANCE",
            Statement::SubmitExcuse { .. } => "SUBMIT_EXCUSE",
            Statement::ReviewExcuse { .. } => "REVIEW_EXCUSE",
        }
    }
}

/// Transport for statements.
///
/// Failures are reported as `CollaboratorUnavailable` and abort the write.
pub trait Ledger {
    fn submit(&self, statement: &Statement<'_>) -> Result<String>;
}

/// `tx_` + base58 of the first 16 bytes of SHA-256(payload ‖ nonce).
pub fn reference_token(payload: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload);
    hasher.update(id_nonce());
    let hash = hasher.finalize();
    format!("tx_{}", bs58::encode(&hash[..16]).into_string())
}

/// Ledger that only derives a token from the statement digest.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestLedger;

impl Ledger for DigestLedger {
    fn submit(&self, statement: &Statement<'_>) -> Result<String> {
        let payload = statement.to_payload()?;
        let token = reference_token(payload.as_bytes());
        log::debug!("{} -> {token}", statement.kind());
        Ok(token)
    }
}

impl<L: Ledger + ?Sized> Ledger for &L {
    fn submit(&self, statement: &Statement<'_>) -> Result<String> {
        (**self).submit(statement)
    }
}

impl<L: Ledger + ?Sized> Ledger for Box<L> {
    fn submit(&self, statement: &Statement<'_>) -> Result<String> {
        (**self).submit(statement)
    }
}
