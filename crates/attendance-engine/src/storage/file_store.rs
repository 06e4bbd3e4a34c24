//! JSON-file event store.
//!
//! Every entity is a single JSON file named by its id:
//!
//! ```text
//! {base_dir}/
//! ├── sessions/        { "version": 1, "session": { ... } }
//! │   └── {session_id}.json
//! ├── records/         { "version": 1, "record": { ... } }
//! │   └── {record_id}.json
//! ├── excuses/         { "version": 1, "excuse": { ... } }
//! │   └── {excuse_id}.json
//! ├── profiles/        { "version": 1, "profile": { ... } }
//! │   └── {profile_id}.json
//! └── attempts.json    { "version": 1, "attempts": [ ... ] }
//! ```
//!
//! The store loads everything into a [`MemoryStore`] on open and writes
//! through on every change, so reads never touch the disk. It is safe for
//! single-process use; concurrent writes from multiple processes are not
//! coordinated.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::checkin::{AttendanceRecord, RecordId};
use crate::error::{AttendanceError, Result};
use crate::excuse::{ExcuseId, ExcuseSubmission};
use crate::identity::Address;
use crate::profile::UserProfile;
use crate::session::{Session, SessionId};

use super::{write_atomic, EventStore, MemoryStore};

// ── File format constants ─────────────────────────────────────────────────────

const STORE_FILE_VERSION: u32 = 1;

const SESSIONS_DIR: &str = "sessions";
const RECORDS_DIR: &str = "records";
const EXCUSES_DIR: &str = "excuses";
const PROFILES_DIR: &str = "profiles";
const ATTEMPTS_FILE: &str = "attempts.json";

// ── On-disk structures ────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    version: u32,
    session: Session,
}

#[derive(Debug, Serialize, Deserialize)]
struct RecordFile {
    version: u32,
    record: AttendanceRecord,
}

#[derive(Debug, Serialize, Deserialize)]
struct ExcuseFile {
    version: u32,
    excuse: ExcuseSubmission,
}

#[derive(Debug, Serialize, Deserialize)]
struct ProfileFile {
    version: u32,
    profile: UserProfile,
}

#[derive(Debug, Serialize, Deserialize)]
struct AttemptCount {
    session_id: SessionId,
    student: Address,
    count: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct AttemptsFile {
    version: u32,
    attempts: Vec<AttemptCount>,
}

trait Versioned {
    fn version(&self) -> u32;
}

impl Versioned for SessionFile {
    fn version(&self) -> u32 {
        self.version
    }
}

impl Versioned for RecordFile {
    fn version(&self) -> u32 {
        self.version
    }
}

impl Versioned for ExcuseFile {
    fn version(&self) -> u32 {
        self.version
    }
}

impl Versioned for ProfileFile {
    fn version(&self) -> u32 {
        self.version
    }
}

impl Versioned for AttemptsFile {
    fn version(&self) -> u32 {
        self.version
    }
}

// ── FileStore ─────────────────────────────────────────────────────────────────

/// Filesystem-backed [`EventStore`].
pub struct FileStore {
    base_dir: PathBuf,
    cache: MemoryStore,
}

impl FileStore {
    /// Open (or create) a store rooted at `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns `AttendanceError::InvalidFileFormat` if any entity file cannot
    /// be parsed or has an unsupported version, or `AttendanceError::Io` if
    /// the directories cannot be created or read.
    pub fn open(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        for sub in [SESSIONS_DIR, RECORDS_DIR, EXCUSES_DIR, PROFILES_DIR] {
            std::fs::create_dir_all(base_dir.join(sub))?;
        }

        let mut cache = MemoryStore::new();
        for file in load_dir::<ProfileFile>(&base_dir.join(PROFILES_DIR))? {
            cache.insert_profile(file.profile)?;
        }
        for file in load_dir::<SessionFile>(&base_dir.join(SESSIONS_DIR))? {
            cache.insert_session(file.session)?;
        }
        for file in load_dir::<RecordFile>(&base_dir.join(RECORDS_DIR))? {
            cache.insert_record(file.record)?;
        }
        for file in load_dir::<ExcuseFile>(&base_dir.join(EXCUSES_DIR))? {
            cache.insert_excuse(file.excuse)?;
        }
        let attempts_path = base_dir.join(ATTEMPTS_FILE);
        if attempts_path.exists() {
            let file: AttemptsFile = read_file(&attempts_path)?;
            for a in file.attempts {
                cache.set_attempts(&a.session_id, &a.student, a.count);
            }
        }

        log::debug!(
            "opened store at {} ({} profiles, {} sessions, {} records, {} excuses)",
            base_dir.display(),
            cache.len_profiles(),
            cache.len_sessions(),
            cache.len_records(),
            cache.len_excuses()
        );
        Ok(Self { base_dir, cache })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn entity_path(&self, dir: &str, id: &str) -> PathBuf {
        self.base_dir.join(dir).join(format!("{id}.json"))
    }

    fn save_profile(&self, profile: &UserProfile) -> Result<()> {
        let file = ProfileFile {
            version: STORE_FILE_VERSION,
            profile: profile.clone(),
        };
        write_json(&self.entity_path(PROFILES_DIR, &profile.id.0), &file)
    }

    fn save_session(&self, session: &Session) -> Result<()> {
        let file = SessionFile {
            version: STORE_FILE_VERSION,
            session: session.clone(),
        };
        write_json(&self.entity_path(SESSIONS_DIR, &session.id.0), &file)
    }

    fn save_record(&self, record: &AttendanceRecord) -> Result<()> {
        let file = RecordFile {
            version: STORE_FILE_VERSION,
            record: record.clone(),
        };
        write_json(&self.entity_path(RECORDS_DIR, &record.id.0), &file)
    }

    fn save_excuse(&self, excuse: &ExcuseSubmission) -> Result<()> {
        let file = ExcuseFile {
            version: STORE_FILE_VERSION,
            excuse: excuse.clone(),
        };
        write_json(&self.entity_path(EXCUSES_DIR, &excuse.id.0), &file)
    }

    fn save_attempts(&self) -> Result<()> {
        let file = AttemptsFile {
            version: STORE_FILE_VERSION,
            attempts: self
                .cache
                .attempt_counts()
                .into_iter()
                .map(|(session_id, student, count)| AttemptCount {
                    session_id,
                    student,
                    count,
                })
                .collect(),
        };
        write_json(&self.base_dir.join(ATTEMPTS_FILE), &file)
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| AttendanceError::SerializationError(e.to_string()))?;
    write_atomic(path, json.as_bytes())
}

fn read_file<T: DeserializeOwned + Versioned>(path: &Path) -> Result<T> {
    let bytes = std::fs::read(path)?;
    let file: T = serde_json::from_slice(&bytes).map_err(|e| {
        AttendanceError::InvalidFileFormat(format!("failed to parse {}: {e}", path.display()))
    })?;
    if file.version() != STORE_FILE_VERSION {
        return Err(AttendanceError::InvalidFileFormat(format!(
            "unsupported version {} in {}",
            file.version(),
            path.display()
        )));
    }
    Ok(file)
}

fn load_dir<T: DeserializeOwned + Versioned>(dir: &Path) -> Result<Vec<T>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();
    paths.iter().map(|p| read_file(p)).collect()
}

impl EventStore for FileStore {
    // ── Profiles ─────────────────────────────────────────────────────────────

    fn insert_profile(&mut self, profile: UserProfile) -> Result<()> {
        if self.cache.profile(&profile.address)?.is_some() {
            return Err(AttendanceError::DuplicateKey(format!(
                "profile already exists for {}",
                profile.address
            )));
        }
        self.save_profile(&profile)?;
        self.cache.insert_profile(profile)
    }

    fn profile(&self, address: &Address) -> Result<Option<UserProfile>> {
        self.cache.profile(address)
    }

    fn profiles(&self) -> Result<Vec<UserProfile>> {
        self.cache.profiles()
    }

    // ── Sessions ─────────────────────────────────────────────────────────────

    fn insert_session(&mut self, session: Session) -> Result<()> {
        if self.cache.session(&session.id)?.is_some() {
            return Err(AttendanceError::DuplicateKey(format!(
                "session {} already exists",
                session.id
            )));
        }
        self.save_session(&session)?;
        self.cache.insert_session(session)
    }

    fn update_session(&mut self, session: Session) -> Result<()> {
        if self.cache.session(&session.id)?.is_none() {
            return Err(AttendanceError::NotFound(format!(
                "session not found: {}",
                session.id
            )));
        }
        self.save_session(&session)?;
        self.cache.update_session(session)
    }

    fn session(&self, id: &SessionId) -> Result<Option<Session>> {
        self.cache.session(id)
    }

    fn sessions(&self) -> Result<Vec<Session>> {
        self.cache.sessions()
    }

    // ── Attendance records ───────────────────────────────────────────────────

    fn insert_record(&mut self, record: AttendanceRecord) -> Result<()> {
        if self.cache.record_for(&record.session_id, &record.student)?.is_some() {
            return Err(AttendanceError::DuplicateKey(format!(
                "record already exists for session {} and student {}",
                record.session_id, record.student
            )));
        }
        self.save_record(&record)?;
        self.cache.insert_record(record)
    }

    fn update_record(&mut self, record: AttendanceRecord) -> Result<()> {
        match self.cache.record_for(&record.session_id, &record.student)? {
            Some(existing) if existing.id == record.id => {}
            _ => {
                return Err(AttendanceError::NotFound(format!(
                    "record not found: {}",
                    record.id
                )))
            }
        }
        self.save_record(&record)?;
        self.cache.update_record(record)
    }

    fn remove_record(&mut self, id: &RecordId) -> Result<()> {
        let path = self.entity_path(RECORDS_DIR, &id.0);
        self.cache.remove_record(id)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn record_for(&self, session_id: &SessionId, student: &Address) -> Result<Option<AttendanceRecord>> {
        self.cache.record_for(session_id, student)
    }

    fn records_for_session(&self, session_id: &SessionId) -> Result<Vec<AttendanceRecord>> {
        self.cache.records_for_session(session_id)
    }

    fn records_for_student(&self, student: &Address) -> Result<Vec<AttendanceRecord>> {
        self.cache.records_for_student(student)
    }

    fn records(&self) -> Result<Vec<AttendanceRecord>> {
        self.cache.records()
    }

    // ── Excuses ──────────────────────────────────────────────────────────────

    fn insert_excuse(&mut self, excuse: ExcuseSubmission) -> Result<()> {
        if self.cache.excuse_for(&excuse.session_id, &excuse.student)?.is_some() {
            return Err(AttendanceError::DuplicateKey(format!(
                "excuse already exists for session {} and student {}",
                excuse.session_id, excuse.student
            )));
        }
        self.save_excuse(&excuse)?;
        self.cache.insert_excuse(excuse)
    }

    fn update_excuse(&mut self, excuse: ExcuseSubmission) -> Result<()> {
        match self.cache.excuse(&excuse.id)? {
            Some(existing)
                if existing.session_id == excuse.session_id && existing.student == excuse.student => {}
            _ => {
                return Err(AttendanceError::NotFound(format!(
                    "excuse not found: {}",
                    excuse.id
                )))
            }
        }
        self.save_excuse(&excuse)?;
        self.cache.update_excuse(excuse)
    }

    fn excuse(&self, id: &ExcuseId) -> Result<Option<ExcuseSubmission>> {
        self.cache.excuse(id)
    }

    fn excuse_for(&self, session_id: &SessionId, student: &Address) -> Result<Option<ExcuseSubmission>> {
        self.cache.excuse_for(session_id, student)
    }

    fn excuses_for_session(&self, session_id: &SessionId) -> Result<Vec<ExcuseSubmission>> {
        self.cache.excuses_for_session(session_id)
    }

    fn excuses_for_student(&self, student: &Address) -> Result<Vec<ExcuseSubmission>> {
        self.cache.excuses_for_student(student)
    }

    fn excuses(&self) -> Result<Vec<ExcuseSubmission>> {
        self.cache.excuses()
    }

    // ── Attempts ─────────────────────────────────────────────────────────────

    fn bump_attempts(&mut self, session_id: &SessionId, student: &Address) -> Result<u32> {
        let count = self.cache.bump_attempts(session_id, student)?;
        self.save_attempts()?;
        Ok(count)
    }

    fn attempts(&self, session_id: &SessionId, student: &Address) -> Result<u32> {
        self.cache.attempts(session_id, student)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
