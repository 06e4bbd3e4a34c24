//! Attendance verification and exam eligibility.
//!
//! Students check in to class sessions from their device; a check-in is
//! accepted only when it is close enough to the class, inside the check-in
//! window, not a duplicate, and made by a well-formed wallet identity.
//! Missed sessions can be excused through a deadline-bound review workflow,
//! and the resulting history feeds per-course exam eligibility.

pub mod checkin;
pub mod config;
pub mod crypto;
pub mod eligibility;
pub mod engine;
pub mod error;
pub mod excuse;
pub mod geo;
pub mod identity;
pub mod ledger;
pub mod location;
pub mod profile;
pub mod rejection;
pub mod seed;
pub mod session;
pub mod status;
pub mod storage;
pub mod time;
pub mod window;

// Re-export primary types
pub use config::EngineConfig;
pub use engine::AttendanceEngine;
pub use error::{AttendanceError, Result};
pub use geo::{Coordinates, ProximityCheck};
pub use rejection::{Decision, Rejection};
pub use status::AttendanceStatus;

pub use checkin::{AttendanceRecord, CheckInVerification, RecordId};
pub use profile::{ProfileId, ProfileRegistration, Role, UserProfile};
pub use excuse::{ApprovalStatus, ExcuseId, ExcuseSubmission, ReviewOutcome, ReviewVerdict};
pub use session::{Session, SessionDeclaration, SessionId, SessionLocation};

pub use eligibility::{AttendanceStats, CourseAttendanceSummary, EligibilityBand, ExamEligibility};

// Re-export collaborator types
pub use identity::{Address, IdentityProvider, StaticIdentity, Wallet, WalletSummary};
pub use ledger::{DigestLedger, JournalEntry, Ledger, SigningLedger, Statement};
pub use location::{FixedLocation, LocationFailure, LocationProvider, UnavailableLocation};
pub use storage::{EventStore, FileStore, MemoryStore, StoreSnapshot};
