use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::ops::RangeInclusive;

pub const CREDITS_RANGE: RangeInclusive<i32> = 1..=5;
pub const CYCLE_RANGE: RangeInclusive<i32> = 1..=10;

/// A course offered in the curriculum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub credits: i32,
    pub cycle: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CourseData {
    pub code: String,
    pub name: String,
    pub credits: i32,
    pub cycle: i32,
}
