use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::UserType;

/// Inbox address: actor kind plus the id inside that kind's table.
/// Deliberately not a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Recipient {
    pub kind: UserType,
    pub id: i64,
}

impl Recipient {
    pub fn patient(id: i64) -> Self {
        Self { kind: UserType::Patient, id }
    }

    pub fn doctor(id: i64) -> Self {
        Self { kind: UserType::Doctor, id }
    }

    pub fn hospital(id: i64) -> Self {
        Self { kind: UserType::Hospital, id }
    }

    pub fn lab_staff(id: i64) -> Self {
        Self { kind: UserType::LabStaff, id }
    }

    pub fn medical(id: i64) -> Self {
        Self { kind: UserType::Medical, id }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub user_type: UserType,
    pub user_id: i64,
    pub message: String,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}
