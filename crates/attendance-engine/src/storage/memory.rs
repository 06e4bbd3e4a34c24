//! In-memory event store.
//!
//! Holds owned copies of every entity plus secondary indexes so that the
//! engine's hot lookups, (session, student) and per-session / per-student
//! listings, never scan the whole collection.

use std::collections::HashMap;

use crate::checkin::{AttendanceRecord, RecordId};
use crate::error::{AttendanceError, Result};
use crate::excuse::{ExcuseId, ExcuseSubmission};
use crate::identity::Address;
use crate::profile::UserProfile;
use crate::session::{Session, SessionId};

use super::EventStore;

type Key = (SessionId, Address);

fn key(session_id: &SessionId, student: &Address) -> Key {
    (session_id.clone(), student.clone())
}

/// [`EventStore`] backed by hash maps.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    profiles: HashMap<Address, UserProfile>,

    sessions: HashMap<SessionId, Session>,

    records: HashMap<RecordId, AttendanceRecord>,
    record_by_key: HashMap<Key, RecordId>,
    records_by_session: HashMap<SessionId, Vec<RecordId>>,
    records_by_student: HashMap<Address, Vec<RecordId>>,

    excuses: HashMap<ExcuseId, ExcuseSubmission>,
    excuse_by_key: HashMap<Key, ExcuseId>,
    excuses_by_session: HashMap<SessionId, Vec<ExcuseId>>,
    excuses_by_student: HashMap<Address, Vec<ExcuseId>>,

    attempts: HashMap<Key, u32>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the attempt counter for a key. Used when loading from disk.
    pub fn set_attempts(&mut self, session_id: &SessionId, student: &Address, count: u32) {
        self.attempts.insert(key(session_id, student), count);
    }

    /// Every non-zero attempt counter.
    pub fn attempt_counts(&self) -> Vec<(SessionId, Address, u32)> {
        let mut out: Vec<_> = self
            .attempts
            .iter()
            .map(|((s, a), n)| (s.clone(), a.clone(), *n))
            .collect();
        out.sort();
        out
    }

    pub fn len_profiles(&self) -> usize {
        self.profiles.len()
    }

    pub fn len_sessions(&self) -> usize {
        self.sessions.len()
    }

    pub fn len_records(&self) -> usize {
        self.records.len()
    }

    pub fn len_excuses(&self) -> usize {
        self.excuses.len()
    }

    fn collect_records(&self, ids: Option<&Vec<RecordId>>) -> Vec<AttendanceRecord> {
        let mut out: Vec<AttendanceRecord> = ids
            .map(|ids| ids.iter().filter_map(|id| self.records.get(id).cloned()).collect())
            .unwrap_or_default();
        sort_records(&mut out);
        out
    }

    fn collect_excuses(&self, ids: Option<&Vec<ExcuseId>>) -> Vec<ExcuseSubmission> {
        let mut out: Vec<ExcuseSubmission> = ids
            .map(|ids| ids.iter().filter_map(|id| self.excuses.get(id).cloned()).collect())
            .unwrap_or_default();
        sort_excuses(&mut out);
        out
    }
}

fn sort_records(records: &mut [AttendanceRecord]) {
    records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
}

fn sort_excuses(excuses: &mut [ExcuseSubmission]) {
    excuses.sort_by(|a, b| {
        a.submitted_at
            .cmp(&b.submitted_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

impl EventStore for MemoryStore {
    // ── Profiles ─────────────────────────────────────────────────────────────

    fn insert_profile(&mut self, profile: UserProfile) -> Result<()> {
        if self.profiles.contains_key(&profile.address) {
            return Err(AttendanceError::DuplicateKey(format!(
                "profile already exists for {}",
                profile.address
            )));
        }
        self.profiles.insert(profile.address.clone(), profile);
        Ok(())
    }

    fn profile(&self, address: &Address) -> Result<Option<UserProfile>> {
        Ok(self.profiles.get(address).cloned())
    }

    fn profiles(&self) -> Result<Vec<UserProfile>> {
        let mut out: Vec<UserProfile> = self.profiles.values().cloned().collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(out)
    }

    // ── Sessions ─────────────────────────────────────────────────────────────

    fn insert_session(&mut self, session: Session) -> Result<()> {
        if self.sessions.contains_key(&session.id) {
            return Err(AttendanceError::DuplicateKey(format!(
                "session {} already exists",
                session.id
            )));
        }
        self.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    fn update_session(&mut self, session: Session) -> Result<()> {
        match self.sessions.get_mut(&session.id) {
            Some(slot) => {
                *slot = session;
                Ok(())
            }
            None => Err(AttendanceError::NotFound(format!(
                "session not found: {}",
                session.id
            ))),
        }
    }

    fn session(&self, id: &SessionId) -> Result<Option<Session>> {
        Ok(self.sessions.get(id).cloned())
    }

    fn sessions(&self) -> Result<Vec<Session>> {
        let mut out: Vec<Session> = self.sessions.values().cloned().collect();
        out.sort_by(|a, b| {
            a.declared_at
                .cmp(&b.declared_at)
                .then_with(|| a.start_time.cmp(&b.start_time))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(out)
    }

    // ── Attendance records ───────────────────────────────────────────────────

    fn insert_record(&mut self, record: AttendanceRecord) -> Result<()> {
        let k = key(&record.session_id, &record.student);
        if self.record_by_key.contains_key(&k) {
            return Err(AttendanceError::DuplicateKey(format!(
                "record already exists for session {} and student {}",
                record.session_id, record.student
            )));
        }
        if self.records.contains_key(&record.id) {
            return Err(AttendanceError::DuplicateKey(format!(
                "record {} already exists",
                record.id
            )));
        }
        let id = record.id.clone();
        self.records_by_session
            .entry(record.session_id.clone())
            .or_default()
            .push(id.clone());
        self.records_by_student
            .entry(record.student.clone())
            .or_default()
            .push(id.clone());
        self.record_by_key.insert(k, id.clone());
        self.records.insert(id, record);
        Ok(())
    }

    fn update_record(&mut self, record: AttendanceRecord) -> Result<()> {
        match self.records.get_mut(&record.id) {
            Some(slot) if slot.session_id == record.session_id && slot.student == record.student => {
                *slot = record;
                Ok(())
            }
            Some(_) => Err(AttendanceError::StorageError(format!(
                "record {} cannot change its session or student",
                record.id
            ))),
            None => Err(AttendanceError::NotFound(format!(
                "record not found: {}",
                record.id
            ))),
        }
    }

    fn remove_record(&mut self, id: &RecordId) -> Result<()> {
        let record = self
            .records
            .remove(id)
            .ok_or_else(|| AttendanceError::NotFound(format!("record not found: {}", id)))?;
        self.record_by_key.remove(&key(&record.session_id, &record.student));
        if let Some(ids) = self.records_by_session.get_mut(&record.session_id) {
            ids.retain(|r| r != id);
        }
        if let Some(ids) = self.records_by_student.get_mut(&record.student) {
            ids.retain(|r| r != id);
        }
        Ok(())
    }

    fn record_for(&self, session_id: &SessionId, student: &Address) -> Result<Option<AttendanceRecord>> {
        Ok(self
            .record_by_key
            .get(&key(session_id, student))
            .and_then(|id| self.records.get(id))
            .cloned())
    }

    fn records_for_session(&self, session_id: &SessionId) -> Result<Vec<AttendanceRecord>> {
        Ok(self.collect_records(self.records_by_session.get(session_id)))
    }

    fn records_for_student(&self, student: &Address) -> Result<Vec<AttendanceRecord>> {
        Ok(self.collect_records(self.records_by_student.get(student)))
    }

    fn records(&self) -> Result<Vec<AttendanceRecord>> {
        let mut out: Vec<AttendanceRecord> = self.records.values().cloned().collect();
        sort_records(&mut out);
        Ok(out)
    }

    // ── Excuses ──────────────────────────────────────────────────────────────

    fn insert_excuse(&mut self, excuse: ExcuseSubmission) -> Result<()> {
        let k = key(&excuse.session_id, &excuse.student);
        if self.excuse_by_key.contains_key(&k) {
            return Err(AttendanceError::DuplicateKey(format!(
                "excuse already exists for session {} and student {}",
                excuse.session_id, excuse.student
            )));
        }
        if self.excuses.contains_key(&excuse.id) {
            return Err(AttendanceError::DuplicateKey(format!(
                "excuse {} already exists",
                excuse.id
            )));
        }
        let id = excuse.id.clone();
        self.excuses_by_session
            .entry(excuse.session_id.clone())
            .or_default()
            .push(id.clone());
        self.excuses_by_student
            .entry(excuse.student.clone())
            .or_default()
            .push(id.clone());
        self.excuse_by_key.insert(k, id.clone());
        self.excuses.insert(id, excuse);
        Ok(())
    }

    fn update_excuse(&mut self, excuse: ExcuseSubmission) -> Result<()> {
        match self.excuses.get_mut(&excuse.id) {
            Some(slot) if slot.session_id == excuse.session_id && slot.student == excuse.student => {
                *slot = excuse;
                Ok(())
            }
            Some(_) => Err(AttendanceError::StorageError(format!(
                "excuse {} cannot change its session or student",
                excuse.id
            ))),
            None => Err(AttendanceError::NotFound(format!(
                "excuse not found: {}",
                excuse.id
            ))),
        }
    }

    fn excuse(&self, id: &ExcuseId) -> Result<Option<ExcuseSubmission>> {
        Ok(self.excuses.get(id).cloned())
    }

    fn excuse_for(&self, session_id: &SessionId, student: &Address) -> Result<Option<ExcuseSubmission>> {
        Ok(self
            .excuse_by_key
            .get(&key(session_id, student))
            .and_then(|id| self.excuses.get(id))
            .cloned())
    }

    fn excuses_for_session(&self, session_id: &SessionId) -> Result<Vec<ExcuseSubmission>> {
        Ok(self.collect_excuses(self.excuses_by_session.get(session_id)))
    }

    fn excuses_for_student(&self, student: &Address) -> Result<Vec<ExcuseSubmission>> {
        Ok(self.collect_excuses(self.excuses_by_student.get(student)))
    }

    fn excuses(&self) -> Result<Vec<ExcuseSubmission>> {
        let mut out: Vec<ExcuseSubmission> = self.excuses.values().cloned().collect();
        sort_excuses(&mut out);
        Ok(out)
    }

    // ── Attempts ─────────────────────────────────────────────────────────────

    fn bump_attempts(&mut self, session_id: &SessionId, student: &Address) -> Result<u32> {
        let count = self.attempts.entry(key(session_id, student)).or_insert(0);
        *count = count.saturating_add(1);
        Ok(*count)
    }

    fn attempts(&self, session_id: &SessionId, student: &Address) -> Result<u32> {
        Ok(self
            .attempts
            .get(&key(session_id, student))
            .copied()
            .unwrap_or(0))
    }
}
