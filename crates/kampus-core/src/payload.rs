//! Response payload items, one per candidate record.
//!
//! Each card serializes to a flat JSON object whose shape depends on the
//! intent that produced it.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssistantCard {
    pub name: String,
    pub phone: String,
    pub messaging_id: Option<String>,
    /// Distinct course names, first-seen order.
    pub courses: Vec<String>,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InformationCard {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Unix seconds.
    pub posted_at: i64,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleCard {
    pub course_name: String,
    /// Localized day name, e.g. "Senin".
    pub day: String,
    /// "HH:MM - HH:MM".
    pub time: String,
    pub place: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentCard {
    pub url: String,
    pub name: String,
    pub description: String,
    /// Unix seconds.
    pub due_date: i64,
    pub course_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeCard {
    pub url: String,
    pub name: String,
    /// Score with three significant digits.
    pub score: String,
    /// Unix seconds.
    pub scored_time: i64,
    pub course_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PayloadItem {
    Assistant(AssistantCard),
    Information(InformationCard),
    Schedule(ScheduleCard),
    Assignment(AssignmentCard),
    Grade(GradeCard),
}

impl PayloadItem {
    /// Headline used when rendering the item as a card.
    pub fn title(&self) -> &str {
        match self {
            Self::Assistant(c) => &c.name,
            Self::Information(c) => &c.title,
            Self::Schedule(c) => &c.course_name,
            Self::Assignment(c) => &c.name,
            Self::Grade(c) => &c.name,
        }
    }

    /// Field name → display value pairs, in serialization order.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Assistant(c) => vec![
                ("name", c.name.clone()),
                ("phone", c.phone.clone()),
                ("messaging_id", c.messaging_id.clone().unwrap_or_default()),
                ("courses", c.courses.join(", ")),
                ("image", c.image.clone()),
            ],
            Self::Information(c) => vec![
                ("id", c.id.to_string()),
                ("title", c.title.clone()),
                ("description", c.description.clone()),
                ("posted_at", c.posted_at.to_string()),
                ("image", c.image.clone()),
            ],
            Self::Schedule(c) => vec![
                ("course_name", c.course_name.clone()),
                ("day", c.day.clone()),
                ("time", c.time.clone()),
                ("place", c.place.clone()),
            ],
            Self::Assignment(c) => vec![
                ("url", c.url.clone()),
                ("name", c.name.clone()),
                ("description", c.description.clone()),
                ("due_date", c.due_date.to_string()),
                ("course_name", c.course_name.clone()),
            ],
            Self::Grade(c) => vec![
                ("url", c.url.clone()),
                ("name", c.name.clone()),
                ("score", c.score.clone()),
                ("scored_time", c.scored_time.to_string()),
                ("course_name", c.course_name.clone()),
            ],
        }
    }
}
