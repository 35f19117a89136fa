//! Core types shared across the Kampus chat engine.

pub mod entities;
pub mod format;
pub mod intent;
pub mod payload;
pub mod records;

pub use entities::{
    CourseCatalogue, CourseFilter, ExtractedEntities, RawMessage, RequesterId, TimeRange,
};
pub use intent::{ConfidenceBucket, Intent};
pub use payload::{
    AssignmentCard, AssistantCard, GradeCard, InformationCard, PayloadItem, ScheduleCard,
};
pub use records::{
    AssignmentRow, AssistantRow, GradeRow, InformationPost, ScheduleCourse, ScheduleRow,
};
