//! In-memory collaborator over a [`Dataset`].

use chrono::Weekday;
use kampus_core::{
    AssignmentRow, AssistantRow, CourseFilter, GradeRow, InformationPost, RequesterId,
    ScheduleCourse, ScheduleRow, TimeRange,
};

use crate::dataset::{Dataset, Role, Schedule};
use crate::{DomainQuery, StoreError};

/// Answers [`DomainQuery`] by scanning a loaded [`Dataset`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Dataset,
}

impl MemoryStore {
    pub fn new(data: Dataset) -> Self {
        Self { data }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.data
    }

    fn enrolled(&self, requester: RequesterId, role: Role) -> impl Iterator<Item = &Schedule> {
        self.data
            .enrollments
            .iter()
            .filter(move |e| e.user_id == requester.0 && e.role == role)
            .filter_map(|e| self.data.schedule(e.schedule_id))
    }

    /// The requester's active student schedules passing the course and day
    /// filters, with their course titles.
    fn matching_classes<'a>(
        &'a self,
        requester: RequesterId,
        course: Option<&'a CourseFilter>,
        days: &'a [Weekday],
    ) -> impl Iterator<Item = (&'a Schedule, &'a str)> {
        self.enrolled(requester, Role::Student)
            .filter(|s| s.active)
            .filter(move |s| days.is_empty() || days.contains(&s.day))
            .filter_map(|s| self.data.course_name_of(s.id).map(|name| (s, name)))
            .filter(move |(_, name)| course.is_none_or(|f| f.matches(name)))
    }
}

fn in_range(range: Option<&TimeRange>, instant: chrono::DateTime<chrono::Utc>) -> bool {
    range.is_none_or(|r| r.contains(instant))
}

impl DomainQuery for MemoryStore {
    fn course_names(&self, requester: RequesterId) -> Result<Vec<String>, StoreError> {
        let mut names: Vec<String> = Vec::new();
        for enrollment in self.data.enrollments.iter().filter(|e| e.user_id == requester.0) {
            if let Some(name) = self.data.course_name_of(enrollment.schedule_id)
                && !names.iter().any(|n| n == name)
            {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    fn assistants_with_course(
        &self,
        requester: RequesterId,
        course: Option<&CourseFilter>,
        days: &[Weekday],
    ) -> Result<Vec<AssistantRow>, StoreError> {
        let mut rows = Vec::new();
        for (schedule, course_name) in self.matching_classes(requester, course, days) {
            let assistants = self
                .data
                .enrollments
                .iter()
                .filter(|e| e.schedule_id == schedule.id && e.role == Role::Assistant)
                .filter_map(|e| self.data.user(e.user_id));
            for user in assistants {
                rows.push(AssistantRow {
                    identity_code: user.identity_code,
                    name: user.name.clone(),
                    phone: user.phone.clone(),
                    messaging_id: user.messaging_id.clone(),
                    photo_file_id: user.photo_file_id.clone(),
                    course_name: course_name.to_string(),
                    day: schedule.day,
                });
            }
        }
        Ok(rows)
    }

    fn enrolled_schedule_ids(&self, requester: RequesterId) -> Result<Vec<i64>, StoreError> {
        Ok(self
            .data
            .enrollments
            .iter()
            .filter(|e| e.user_id == requester.0 && e.role == Role::Student)
            .map(|e| e.schedule_id)
            .collect())
    }

    fn schedules_by_id(&self, ids: &[i64]) -> Result<Vec<ScheduleCourse>, StoreError> {
        Ok(self
            .data
            .schedules
            .iter()
            .filter(|s| s.active && ids.contains(&s.id))
            .filter_map(|s| {
                self.data.course_name_of(s.id).map(|name| ScheduleCourse {
                    schedule_id: s.id,
                    course_name: name.to_string(),
                })
            })
            .collect())
    }

    fn schedules_with_course(
        &self,
        requester: RequesterId,
        course: Option<&CourseFilter>,
        days: &[Weekday],
    ) -> Result<Vec<ScheduleRow>, StoreError> {
        let mut rows: Vec<ScheduleRow> = self
            .matching_classes(requester, course, days)
            .map(|(s, name)| ScheduleRow {
                schedule_id: s.id,
                course_name: name.to_string(),
                day: s.day,
                start_minute: s.start_minute,
                end_minute: s.end_minute,
                place: s.place.clone(),
            })
            .collect();
        rows.sort_by_key(|r| (r.day.num_days_from_monday(), r.start_minute));
        Ok(rows)
    }

    fn assignments_with_course(
        &self,
        requester: RequesterId,
        course: Option<&CourseFilter>,
        due: Option<&TimeRange>,
    ) -> Result<Vec<AssignmentRow>, StoreError> {
        let schedules: Vec<i64> = self
            .enrolled(requester, Role::Student)
            .map(|s| s.id)
            .collect();
        let mut rows: Vec<AssignmentRow> = self
            .data
            .assignments
            .iter()
            .filter(|a| schedules.contains(&a.schedule_id) && in_range(due, a.due_date))
            .filter_map(|a| {
                let name = self.data.course_name_of(a.schedule_id)?;
                course.is_none_or(|f| f.matches(name)).then(|| AssignmentRow {
                    id: a.id,
                    name: a.name.clone(),
                    description: a.description.clone(),
                    due_date: a.due_date,
                    course_name: name.to_string(),
                })
            })
            .collect();
        rows.sort_by_key(|r| r.due_date);
        Ok(rows)
    }

    fn grades_with_course(
        &self,
        requester: RequesterId,
        course: Option<&CourseFilter>,
        scored: Option<&TimeRange>,
    ) -> Result<Vec<GradeRow>, StoreError> {
        let mut rows: Vec<GradeRow> = self
            .data
            .grades
            .iter()
            .filter(|g| g.user_id == requester.0 && in_range(scored, g.updated_at))
            .filter_map(|g| {
                let assignment = self.data.assignments.iter().find(|a| a.id == g.assignment_id)?;
                let name = self.data.course_name_of(assignment.schedule_id)?;
                course.is_none_or(|f| f.matches(name)).then(|| GradeRow {
                    assignment_id: assignment.id,
                    name: assignment.name.clone(),
                    score: g.score,
                    updated_at: g.updated_at,
                    course_name: name.to_string(),
                })
            })
            .collect();
        rows.sort_by_key(|r| std::cmp::Reverse(r.updated_at));
        Ok(rows)
    }

    fn information_for_schedules(
        &self,
        schedule_ids: &[i64],
        posted: Option<&TimeRange>,
    ) -> Result<Vec<InformationPost>, StoreError> {
        let mut rows: Vec<InformationPost> = self
            .data
            .information
            .iter()
            .filter(|p| schedule_ids.contains(&p.schedule_id) && in_range(posted, p.created_at))
            .map(|p| InformationPost {
                id: p.id,
                schedule_id: p.schedule_id,
                title: p.title.clone(),
                description: p.description.clone(),
                created_at: p.created_at,
            })
            .collect();
        rows.sort_by_key(|r| std::cmp::Reverse(r.created_at));
        Ok(rows)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::dataset::{Assignment, Course, Enrollment, Grade, Information, User};
    use chrono::{DateTime, FixedOffset, TimeZone, Utc};

    pub(crate) fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn wib(y: i32, m: u32, d: u32, h: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(7 * 3600)
            .unwrap()
            .with_ymd_and_hms(y, m, d, h, 0, 0)
            .unwrap()
    }

    fn user(id: i64, name: &str) -> User {
        User {
            id,
            identity_code: 1000 + id,
            name: name.into(),
            phone: format!("08{id}"),
            messaging_id: None,
            photo_file_id: None,
        }
    }

    fn schedule(id: i64, course_id: i64, day: Weekday, start: u32, active: bool) -> Schedule {
        Schedule {
            id,
            course_id,
            day,
            start_minute: start,
            end_minute: start + 120,
            place: format!("R{id}"),
            active,
        }
    }

    fn enroll(user_id: i64, schedule_id: i64, role: Role) -> Enrollment {
        Enrollment {
            user_id,
            schedule_id,
            role,
        }
    }

    /// Student 1 takes Matematika Dasar (Mon), Fisika (Wed) and an inactive
    /// Kimia class; user 2 assists both active classes, user 3 only Fisika.
    pub(crate) fn campus() -> Dataset {
        Dataset {
            users: vec![user(1, "Budi"), user(2, "Rina"), user(3, "Sari")],
            courses: vec![
                Course { id: 10, name: "Matematika Dasar".into() },
                Course { id: 11, name: "Fisika".into() },
                Course { id: 12, name: "Kimia".into() },
            ],
            schedules: vec![
                schedule(100, 10, Weekday::Mon, 480, true),
                schedule(101, 11, Weekday::Wed, 780, true),
                schedule(102, 12, Weekday::Fri, 600, false),
            ],
            enrollments: vec![
                enroll(1, 100, Role::Student),
                enroll(1, 101, Role::Student),
                enroll(1, 102, Role::Student),
                enroll(2, 100, Role::Assistant),
                enroll(2, 101, Role::Assistant),
                enroll(3, 101, Role::Assistant),
            ],
            assignments: vec![
                Assignment {
                    id: 500,
                    schedule_id: 100,
                    name: "Latihan Integral".into(),
                    description: Some("Bab 3".into()),
                    due_date: utc(2024, 3, 8, 5),
                },
                Assignment {
                    id: 501,
                    schedule_id: 101,
                    name: "Laporan Praktikum".into(),
                    description: None,
                    due_date: utc(2024, 3, 7, 5),
                },
            ],
            grades: vec![
                Grade {
                    assignment_id: 500,
                    user_id: 1,
                    score: 85.5,
                    updated_at: utc(2024, 3, 1, 3),
                },
                Grade {
                    assignment_id: 501,
                    user_id: 1,
                    score: 90.0,
                    updated_at: utc(2024, 3, 4, 3),
                },
            ],
            information: vec![
                Information {
                    id: 900,
                    schedule_id: 100,
                    title: "Kelas diganti".into(),
                    description: None,
                    created_at: utc(2024, 3, 5, 1),
                },
                Information {
                    id: 901,
                    schedule_id: 101,
                    title: "Kuis minggu depan".into(),
                    description: Some("Bab 1-2".into()),
                    created_at: utc(2024, 3, 6, 1),
                },
            ],
        }
    }

    fn store() -> MemoryStore {
        MemoryStore::new(campus())
    }

    #[test]
    fn course_names_cover_all_enrollments() {
        let names = store().course_names(RequesterId(1)).unwrap();
        assert_eq!(names, vec!["Matematika Dasar", "Fisika", "Kimia"]);
        assert_eq!(
            store().course_names(RequesterId(2)).unwrap(),
            vec!["Matematika Dasar", "Fisika"]
        );
        assert!(store().course_names(RequesterId(99)).unwrap().is_empty());
    }

    #[test]
    fn assistants_one_row_per_pairing() {
        let rows = store()
            .assistants_with_course(RequesterId(1), None, &[])
            .unwrap();
        let pairs: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r.name.as_str(), r.course_name.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("Rina", "Matematika Dasar"),
                ("Rina", "Fisika"),
                ("Sari", "Fisika"),
            ]
        );
    }

    #[test]
    fn assistants_filtered_by_day_and_course() {
        let rows = store()
            .assistants_with_course(RequesterId(1), None, &[Weekday::Mon])
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].course_name, "Matematika Dasar");

        let filter = CourseFilter::from_fragments(&["fisika"]).unwrap();
        let rows = store()
            .assistants_with_course(RequesterId(1), Some(&filter), &[])
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn schedules_skip_inactive_and_sort_by_day() {
        let rows = store()
            .schedules_with_course(RequesterId(1), None, &[])
            .unwrap();
        let days: Vec<Weekday> = rows.iter().map(|r| r.day).collect();
        assert_eq!(days, vec![Weekday::Mon, Weekday::Wed]);
    }

    #[test]
    fn schedules_by_id_only_active() {
        let ids = store().enrolled_schedule_ids(RequesterId(1)).unwrap();
        assert_eq!(ids, vec![100, 101, 102]);
        let active = store().schedules_by_id(&ids).unwrap();
        assert_eq!(active.len(), 2);
        assert_eq!(active[1].course_name, "Fisika");
    }

    #[test]
    fn assignments_by_due_date() {
        let rows = store()
            .assignments_with_course(RequesterId(1), None, None)
            .unwrap();
        assert_eq!(rows[0].id, 501);
        assert_eq!(rows[1].id, 500);

        // 2024-03-08 local day in WIB.
        let friday = TimeRange::relative(wib(2024, 3, 8, 0), wib(2024, 3, 9, 0));
        let rows = store()
            .assignments_with_course(RequesterId(1), None, Some(&friday))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Latihan Integral");
    }

    #[test]
    fn grades_newest_first() {
        let rows = store()
            .grades_with_course(RequesterId(1), None, None)
            .unwrap();
        assert_eq!(rows[0].score, 90.0);
        assert_eq!(rows[1].course_name, "Matematika Dasar");

        let filter = CourseFilter::from_fragments(&["matematika"]).unwrap();
        let rows = store()
            .grades_with_course(RequesterId(1), Some(&filter), None)
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert!(store()
            .grades_with_course(RequesterId(2), None, None)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn information_for_requested_schedules() {
        let rows = store().information_for_schedules(&[100, 101], None).unwrap();
        assert_eq!(rows[0].id, 901);
        let rows = store().information_for_schedules(&[100], None).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(store().information_for_schedules(&[], None).unwrap().is_empty());
    }
}
