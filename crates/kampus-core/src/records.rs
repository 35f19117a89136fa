//! Rows returned by the domain-query collaborator.
//!
//! The engine reads these but never modifies them.

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// One (assistant, course) pairing. The same assistant appears once per
/// course they assist in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantRow {
    pub identity_code: i64,
    pub name: String,
    pub phone: String,
    pub messaging_id: Option<String>,
    pub photo_file_id: Option<String>,
    pub course_name: String,
    pub day: Weekday,
}

/// A weekly class meeting the requester attends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub schedule_id: i64,
    pub course_name: String,
    pub day: Weekday,
    /// Minutes since midnight.
    pub start_minute: u32,
    pub end_minute: u32,
    pub place: String,
}

/// Schedule id with the title of its course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleCourse {
    pub schedule_id: i64,
    pub course_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub course_name: String,
}

/// A scored assignment of the requester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeRow {
    pub assignment_id: i64,
    pub name: String,
    pub score: f64,
    pub updated_at: DateTime<Utc>,
    pub course_name: String,
}

/// An announcement posted to a class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InformationPost {
    pub id: i64,
    pub schedule_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}
