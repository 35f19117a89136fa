//! The read-only query seam between the chat engine and academic records.

use chrono::Weekday;
use kampus_core::{
    AssignmentRow, AssistantRow, CourseFilter, GradeRow, InformationPost, RequesterId,
    ScheduleCourse, ScheduleRow, TimeRange,
};

use crate::StoreError;

/// Academic record lookups scoped to one requester.
///
/// Filters follow the same conventions everywhere: `None` course filter and
/// an empty day list mean "no restriction", a time range restricts by the
/// record's own timestamp (due date, scored time, posting time). An empty
/// result is `Ok(vec![])`, never an error.
pub trait DomainQuery: Send + Sync {
    /// Names of every course the requester studies or assists in.
    fn course_names(&self, requester: RequesterId) -> Result<Vec<String>, StoreError>;

    /// Assistants of the requester's active classes, one row per
    /// (assistant, class) pairing.
    fn assistants_with_course(
        &self,
        requester: RequesterId,
        course: Option<&CourseFilter>,
        days: &[Weekday],
    ) -> Result<Vec<AssistantRow>, StoreError>;

    /// Schedule ids the requester is enrolled in as a student.
    fn enrolled_schedule_ids(&self, requester: RequesterId) -> Result<Vec<i64>, StoreError>;

    /// Active schedules among `ids`, with their course titles.
    fn schedules_by_id(&self, ids: &[i64]) -> Result<Vec<ScheduleCourse>, StoreError>;

    /// The requester's active class meetings, ordered by day and start time.
    fn schedules_with_course(
        &self,
        requester: RequesterId,
        course: Option<&CourseFilter>,
        days: &[Weekday],
    ) -> Result<Vec<ScheduleRow>, StoreError>;

    /// Assignments of the requester's classes, ordered by due date.
    fn assignments_with_course(
        &self,
        requester: RequesterId,
        course: Option<&CourseFilter>,
        due: Option<&TimeRange>,
    ) -> Result<Vec<AssignmentRow>, StoreError>;

    /// The requester's scored assignments, most recently scored first.
    fn grades_with_course(
        &self,
        requester: RequesterId,
        course: Option<&CourseFilter>,
        scored: Option<&TimeRange>,
    ) -> Result<Vec<GradeRow>, StoreError>;

    /// Posts attached to any of `schedule_ids`, newest first.
    fn information_for_schedules(
        &self,
        schedule_ids: &[i64],
        posted: Option<&TimeRange>,
    ) -> Result<Vec<InformationPost>, StoreError>;
}
