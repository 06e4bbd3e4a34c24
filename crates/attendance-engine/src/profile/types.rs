//! Data structures for user profiles and roles.

use serde::{Deserialize, Serialize};

use crate::identity::Address;

/// Unique identifier for a profile (`aprf_...`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(pub String);

impl std::fmt::Display for ProfileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

/// What an identity may do.
///
/// Teachers declare sessions and review excuses; students check in and
/// submit excuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Teacher,
    Student,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Registration form for a new profile.
///
/// `student_id` is required for students and `employee_id` for teachers;
/// the other one is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfileRegistration {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub institution: String,
    pub department: Option<String>,
    pub student_id: Option<String>,
    pub employee_id: Option<String>,
}

/// A registered user. At most one per address; emails are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: ProfileId,
    pub address: Address,
    pub role: Role,
    pub name: String,
    /// Trimmed and lower-cased.
    pub email: String,
    pub phone: String,
    pub institution: String,
    pub department: Option<String>,
    pub student_id: Option<String>,
    pub employee_id: Option<String>,
    /// Set by institutional verification; false on registration.
    pub verified: bool,
    pub created_at: u64,
}

impl UserProfile {
    pub fn is_teacher(&self) -> bool {
        self.role == Role::Teacher
    }

    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }
}
