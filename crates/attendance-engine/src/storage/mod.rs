//! Persistence: the event store abstraction, its reference
//! implementations, and encrypted wallet files.
//!
//! # Directory layout
//!
//! By convention the default root is `~/.attendance/`:
//!
//! ```text
//! ~/.attendance/
//! ├── config.json
//! ├── wallets/
//! │   └── {name}.wallet
//! ├── journal/
//! │   └── {token}.json
//! └── store/
//!     ├── sessions/
//!     │   └── {session_id}.json
//!     ├── records/
//!     │   └── {record_id}.json
//!     ├── excuses/
//!     │   └── {excuse_id}.json
//!     ├── profiles/
//!     │   └── {profile_id}.json
//!     └── attempts.json
//! ```
//!
//! # Modules
//!
//! - [`memory`]: in-memory [`EventStore`] with secondary indexes.
//! - [`file_store`]: JSON-file [`EventStore`], one file per entity.
//! - [`wallet_file`]: passphrase-encrypted wallet files.

pub mod file_store;
pub mod memory;
pub mod wallet_file;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::checkin::{AttendanceRecord, RecordId};
use crate::error::Result;
use crate::excuse::{ExcuseId, ExcuseSubmission};
use crate::identity::Address;
use crate::profile::{normalize_email, UserProfile};
use crate::session::{Session, SessionId};

pub use file_store::FileStore;
pub use memory::MemoryStore;
pub use wallet_file::{load_wallet, read_wallet_summary, save_wallet, WalletFile};

/// Keyed collections of profiles, sessions, attendance records and excuses.
///
/// Listing methods return owned values in a stable order: profiles by
/// registration time, sessions by declaration time, records by timestamp,
/// excuses by submission time, ties broken by id.
pub trait EventStore {
    // ── Profiles ─────────────────────────────────────────────────────────────

    /// Fails with `DuplicateKey` if the address already has a profile.
    fn insert_profile(&mut self, profile: UserProfile) -> Result<()>;
    fn profile(&self, address: &Address) -> Result<Option<UserProfile>>;
    fn profiles(&self) -> Result<Vec<UserProfile>>;

    fn profile_by_email(&self, email: &str) -> Result<Option<UserProfile>> {
        let email = normalize_email(email);
        Ok(self.profiles()?.into_iter().find(|p| p.email == email))
    }

    // ── Sessions ─────────────────────────────────────────────────────────────

    /// Fails with `DuplicateKey` if the id is taken.
    fn insert_session(&mut self, session: Session) -> Result<()>;
    /// Fails with `NotFound` if the session does not exist.
    fn update_session(&mut self, session: Session) -> Result<()>;
    fn session(&self, id: &SessionId) -> Result<Option<Session>>;
    fn sessions(&self) -> Result<Vec<Session>>;

    fn sessions_for_course(&self, course_code: &str) -> Result<Vec<Session>> {
        Ok(self
            .sessions()?
            .into_iter()
            .filter(|s| s.course_code == course_code)
            .collect())
    }

    // ── Attendance records ───────────────────────────────────────────────────

    /// Fails with `DuplicateKey` if a record exists for (session, student).
    fn insert_record(&mut self, record: AttendanceRecord) -> Result<()>;
    /// Fails with `NotFound` if the record does not exist.
    fn update_record(&mut self, record: AttendanceRecord) -> Result<()>;
    /// Undo an insert whose companion write failed. Fails with `NotFound`
    /// if the record does not exist.
    fn remove_record(&mut self, id: &RecordId) -> Result<()>;
    fn record_for(&self, session_id: &SessionId, student: &Address) -> Result<Option<AttendanceRecord>>;
    fn records_for_session(&self, session_id: &SessionId) -> Result<Vec<AttendanceRecord>>;
    fn records_for_student(&self, student: &Address) -> Result<Vec<AttendanceRecord>>;
    fn records(&self) -> Result<Vec<AttendanceRecord>>;

    // ── Excuses ──────────────────────────────────────────────────────────────

    /// Fails with `DuplicateKey` if an excuse exists for (session, student).
    fn insert_excuse(&mut self, excuse: ExcuseSubmission) -> Result<()>;
    /// Fails with `NotFound` if the excuse does not exist.
    fn update_excuse(&mut self, excuse: ExcuseSubmission) -> Result<()>;
    fn excuse(&self, id: &ExcuseId) -> Result<Option<ExcuseSubmission>>;
    fn excuse_for(&self, session_id: &SessionId, student: &Address) -> Result<Option<ExcuseSubmission>>;
    fn excuses_for_session(&self, session_id: &SessionId) -> Result<Vec<ExcuseSubmission>>;
    fn excuses_for_student(&self, student: &Address) -> Result<Vec<ExcuseSubmission>>;
    fn excuses(&self) -> Result<Vec<ExcuseSubmission>>;

    // ── Rejected check-in attempts ───────────────────────────────────────────

    /// Increment and return the rejected-attempt counter for (session, student).
    fn bump_attempts(&mut self, session_id: &SessionId, student: &Address) -> Result<u32>;
    fn attempts(&self, session_id: &SessionId, student: &Address) -> Result<u32>;
}

/// Point-in-time copy of the store used by reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub sessions: Vec<Session>,
    pub records: Vec<AttendanceRecord>,
    pub excuses: Vec<ExcuseSubmission>,
}

impl StoreSnapshot {
    pub fn capture<S: EventStore + ?Sized>(store: &S) -> Result<Self> {
        Ok(Self {
            sessions: store.sessions()?,
            records: store.records()?,
            excuses: store.excuses()?,
        })
    }
}

/// Write `data` to `path` atomically using a sibling temporary file.
///
/// Creates the parent directory if it does not exist. A crash mid-write
/// leaves at most a stray `.tmp` file, never a truncated target.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    std::fs::write(&tmp, data)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
