use carpool_shared::Masked;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub student_id: Option<String>,
    pub full_name: Option<String>,
    pub phone_number: Option<Masked<String>>,
    pub email: Option<String>,
    pub password: Option<Masked<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<Masked<String>>,
}

/// A stored account, hash included. Never serialized.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub student_id: String,
    pub full_name: String,
    pub phone_number: String,
    pub email: String,
    pub password_hash: Masked<String>,
    pub created_at: DateTime<Utc>,
}

/// What a successful login returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub student_id: String,
    pub full_name: String,
    pub phone_number: String,
    pub email: String,
}

impl From<UserRecord> for UserProfile {
    fn from(record: UserRecord) -> Self {
        Self {
            student_id: record.student_id,
            full_name: record.full_name,
            phone_number: record.phone_number,
            email: record.email,
        }
    }
}
