use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Length of a national identity document number.
pub const DNI_LENGTH: usize = 8;

/// A student registered in the academic system.
///
/// Students are never physically deleted; deactivation hides them from
/// listings and from new enrollments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub age: Option<i32>,
    pub dni: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub current_cycle: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Fields written on create and full update.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentData {
    pub first_name: String,
    pub last_name: String,
    pub age: Option<i32>,
    pub dni: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub current_cycle: i32,
}

impl StudentData {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
