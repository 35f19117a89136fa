//! Serializable snapshot of campus records, used to seed the reference stores.

use std::path::Path;

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::StoreError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    /// Student or staff number shown to other users.
    pub identity_code: i64,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub messaging_id: Option<String>,
    #[serde(default)]
    pub photo_file_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub name: String,
}

/// A weekly class meeting of a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: i64,
    pub course_id: i64,
    pub day: Weekday,
    pub start_minute: u32,
    pub end_minute: u32,
    pub place: String,
    #[serde(default = "active_by_default")]
    pub active: bool,
}

fn active_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub user_id: i64,
    pub schedule_id: i64,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: i64,
    pub schedule_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub assignment_id: i64,
    pub user_id: i64,
    pub score: f64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Information {
    pub id: i64,
    pub schedule_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Every table the chat engine reads from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dataset {
    pub users: Vec<User>,
    pub courses: Vec<Course>,
    pub schedules: Vec<Schedule>,
    pub enrollments: Vec<Enrollment>,
    pub assignments: Vec<Assignment>,
    pub grades: Vec<Grade>,
    pub information: Vec<Information>,
}

impl Dataset {
    /// Load a dataset from a JSON file.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::DatasetNotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        let dataset = Self::from_json(&text)?;
        info!(
            path = %path.display(),
            users = dataset.users.len(),
            schedules = dataset.schedules.len(),
            "loaded dataset"
        );
        Ok(dataset)
    }

    pub fn from_json(text: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn user(&self, id: i64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn course(&self, id: i64) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == id)
    }

    pub fn schedule(&self, id: i64) -> Option<&Schedule> {
        self.schedules.iter().find(|s| s.id == id)
    }

    /// Course title of a schedule, if both exist.
    pub fn course_name_of(&self, schedule_id: i64) -> Option<&str> {
        let schedule = self.schedule(schedule_id)?;
        self.course(schedule.course_id).map(|c| c.name.as_str())
    }
}
