//! DuckDB-backed collaborator.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use arrow::array::{Array, Float64Array, Int64Array, LargeStringArray, StringArray};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc, Weekday};
use duckdb::types::Value;
use duckdb::{Connection, params, params_from_iter};
use kampus_core::{
    AssignmentRow, AssistantRow, CourseFilter, GradeRow, InformationPost, RequesterId,
    ScheduleCourse, ScheduleRow, TimeRange,
};
use tracing::{debug, info};

use crate::dataset::{Dataset, Role};
use crate::{DomainQuery, StoreError};

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

const SCHEMA: &str = "
CREATE OR REPLACE TABLE users (
    id BIGINT PRIMARY KEY,
    identity_code BIGINT NOT NULL,
    name VARCHAR NOT NULL,
    phone VARCHAR NOT NULL,
    messaging_id VARCHAR,
    photo_file_id VARCHAR
);
CREATE OR REPLACE TABLE courses (
    id BIGINT PRIMARY KEY,
    name VARCHAR NOT NULL
);
CREATE OR REPLACE TABLE schedules (
    id BIGINT PRIMARY KEY,
    course_id BIGINT NOT NULL,
    day TINYINT NOT NULL,
    start_minute INTEGER NOT NULL,
    end_minute INTEGER NOT NULL,
    place VARCHAR NOT NULL,
    active BOOLEAN NOT NULL
);
CREATE OR REPLACE TABLE enrollments (
    seq BIGINT NOT NULL,
    user_id BIGINT NOT NULL,
    schedule_id BIGINT NOT NULL,
    role VARCHAR NOT NULL
);
CREATE OR REPLACE TABLE assignments (
    id BIGINT PRIMARY KEY,
    schedule_id BIGINT NOT NULL,
    name VARCHAR NOT NULL,
    description VARCHAR,
    due_date TIMESTAMP NOT NULL
);
CREATE OR REPLACE TABLE grades (
    assignment_id BIGINT NOT NULL,
    user_id BIGINT NOT NULL,
    score DOUBLE NOT NULL,
    updated_at TIMESTAMP NOT NULL
);
CREATE OR REPLACE TABLE information (
    id BIGINT PRIMARY KEY,
    schedule_id BIGINT NOT NULL,
    title VARCHAR NOT NULL,
    description VARCHAR,
    created_at TIMESTAMP NOT NULL
);
";

/// Campus records in DuckDB, queried in SQL and read back as Arrow batches.
///
/// Supports both in-memory (ephemeral) and persistent (file-backed) modes.
/// The connection sits behind a mutex held for the duration of one query.
pub struct DuckStore {
    conn: Mutex<Connection>,
}

impl DuckStore {
    /// Open an in-memory DuckDB database.
    pub fn open() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open or create a persistent DuckDB database at the given path.
    ///
    /// An existing file keeps its tables; use [`has_tables`](Self::has_tables)
    /// to check whether an [`import`](Self::import) is needed.
    pub fn open_persistent(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Other("duckdb connection lock poisoned".into()))
    }

    /// Whether the campus tables exist.
    pub fn has_tables(&self) -> bool {
        self.count_table("schedules").is_ok() && self.count_table("enrollments").is_ok()
    }

    /// Replace every table with the contents of `data`.
    pub fn import(&self, data: &Dataset) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute_batch(SCHEMA)?;
        conn.execute_batch("BEGIN TRANSACTION")?;

        for u in &data.users {
            conn.execute(
                "INSERT INTO users VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    u.id,
                    u.identity_code,
                    u.name,
                    u.phone,
                    u.messaging_id,
                    u.photo_file_id
                ],
            )?;
        }
        for c in &data.courses {
            conn.execute("INSERT INTO courses VALUES (?, ?)", params![c.id, c.name])?;
        }
        for s in &data.schedules {
            conn.execute(
                "INSERT INTO schedules VALUES (?, ?, ?, ?, ?, ?, ?)",
                params![
                    s.id,
                    s.course_id,
                    i64::from(s.day.num_days_from_monday()),
                    i64::from(s.start_minute),
                    i64::from(s.end_minute),
                    s.place,
                    s.active
                ],
            )?;
        }
        for (seq, e) in data.enrollments.iter().enumerate() {
            conn.execute(
                "INSERT INTO enrollments VALUES (?, ?, ?, ?)",
                params![seq as i64, e.user_id, e.schedule_id, e.role.as_str()],
            )?;
        }
        for a in &data.assignments {
            conn.execute(
                "INSERT INTO assignments VALUES (?, ?, ?, ?, epoch_ms(?::BIGINT))",
                params![
                    a.id,
                    a.schedule_id,
                    a.name,
                    a.description,
                    a.due_date.timestamp_millis()
                ],
            )?;
        }
        for g in &data.grades {
            conn.execute(
                "INSERT INTO grades VALUES (?, ?, ?, epoch_ms(?::BIGINT))",
                params![
                    g.assignment_id,
                    g.user_id,
                    g.score,
                    g.updated_at.timestamp_millis()
                ],
            )?;
        }
        for p in &data.information {
            conn.execute(
                "INSERT INTO information VALUES (?, ?, ?, ?, epoch_ms(?::BIGINT))",
                params![
                    p.id,
                    p.schedule_id,
                    p.title,
                    p.description,
                    p.created_at.timestamp_millis()
                ],
            )?;
        }

        conn.execute_batch("COMMIT")?;
        info!(
            users = data.users.len(),
            schedules = data.schedules.len(),
            enrollments = data.enrollments.len(),
            "imported dataset into duckdb"
        );
        Ok(())
    }

    /// Open an in-memory database seeded from `data`.
    pub fn from_dataset(data: &Dataset) -> Result<Self, StoreError> {
        let store = Self::open()?;
        store.import(data)?;
        Ok(store)
    }

    fn count_table(&self, table: &str) -> Result<usize, StoreError> {
        let batches = self.query_arrow(&format!("SELECT count(*)::BIGINT AS cnt FROM {table}"))?;
        let batch = batches
            .first()
            .ok_or_else(|| StoreError::Other(format!("no count for {table}")))?;
        Ok(int(batch, "cnt", 0)? as usize)
    }

    /// Execute arbitrary SQL and return Arrow RecordBatches.
    pub fn query_arrow(&self, sql: &str) -> Result<Vec<RecordBatch>, StoreError> {
        self.fetch(sql, Vec::new())
    }

    fn fetch(&self, sql: &str, values: Vec<Value>) -> Result<Vec<RecordBatch>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let batches: Vec<RecordBatch> = stmt.query_arrow(params_from_iter(values))?.collect();
        Ok(batches)
    }

    fn fetch_query(&self, query: Query) -> Result<Vec<RecordBatch>, StoreError> {
        let sql = query.sql();
        debug!(%sql, params = query.values.len(), "duckdb query");
        self.fetch(&sql, query.values)
    }
}

/// A SELECT with a fixed head and a growing list of bound WHERE clauses.
struct Query {
    head: String,
    clauses: Vec<String>,
    tail: String,
    values: Vec<Value>,
}

impl Query {
    fn new(head: &str, tail: &str) -> Self {
        Self {
            head: head.to_string(),
            clauses: Vec::new(),
            tail: tail.to_string(),
            values: Vec::new(),
        }
    }

    /// Bind a value and return its placeholder.
    fn bind(&mut self, value: Value) -> String {
        self.values.push(value);
        format!("${}", self.values.len())
    }

    fn filter(&mut self, clause: String) {
        self.clauses.push(clause);
    }

    fn course(&mut self, column: &str, course: Option<&CourseFilter>) {
        if let Some(filter) = course {
            let p = self.bind(Value::Text(filter.pattern().to_string()));
            self.filter(format!("regexp_matches({column}, {p}, 'i')"));
        }
    }

    fn days(&mut self, column: &str, days: &[Weekday]) {
        if !days.is_empty() {
            let list: Vec<String> = days
                .iter()
                .map(|d| d.num_days_from_monday().to_string())
                .collect();
            self.filter(format!("{column} IN ({})", list.join(", ")));
        }
    }

    fn ids(&mut self, column: &str, ids: &[i64]) {
        let list: Vec<String> = ids.iter().map(i64::to_string).collect();
        self.filter(format!("{column} IN ({})", list.join(", ")));
    }

    fn range(&mut self, column: &str, range: Option<&TimeRange>) {
        if let Some(range) = range {
            let start = self.bind(Value::BigInt(range.start().timestamp_millis()));
            let end = self.bind(Value::BigInt(range.end().timestamp_millis()));
            self.filter(format!(
                "epoch_ms({column}) >= {start} AND epoch_ms({column}) < {end}"
            ));
        }
    }

    fn sql(&self) -> String {
        let mut sql = self.head.clone();
        for (i, clause) in self.clauses.iter().enumerate() {
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            sql.push_str(clause);
        }
        sql.push(' ');
        sql.push_str(&self.tail);
        sql
    }
}

// ── Arrow readers ──

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T, StoreError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| StoreError::Other(format!("column {name} missing or mistyped")))
}

fn int(batch: &RecordBatch, name: &str, row: usize) -> Result<i64, StoreError> {
    Ok(column::<Int64Array>(batch, name)?.value(row))
}

fn float(batch: &RecordBatch, name: &str, row: usize) -> Result<f64, StoreError> {
    Ok(column::<Float64Array>(batch, name)?.value(row))
}

fn opt_text(batch: &RecordBatch, name: &str, row: usize) -> Result<Option<String>, StoreError> {
    if let Ok(col) = column::<StringArray>(batch, name) {
        return Ok((!col.is_null(row)).then(|| col.value(row).to_string()));
    }
    let col = column::<LargeStringArray>(batch, name)?;
    Ok((!col.is_null(row)).then(|| col.value(row).to_string()))
}

fn text(batch: &RecordBatch, name: &str, row: usize) -> Result<String, StoreError> {
    Ok(opt_text(batch, name, row)?.unwrap_or_default())
}

fn weekday(batch: &RecordBatch, name: &str, row: usize) -> Result<Weekday, StoreError> {
    let index = int(batch, name, row)?;
    usize::try_from(index)
        .ok()
        .and_then(|i| WEEK.get(i).copied())
        .ok_or_else(|| StoreError::Other(format!("invalid day index {index}")))
}

fn minute(batch: &RecordBatch, name: &str, row: usize) -> Result<u32, StoreError> {
    let value = int(batch, name, row)?;
    u32::try_from(value).map_err(|_| StoreError::Other(format!("invalid minute {value}")))
}

fn instant(batch: &RecordBatch, name: &str, row: usize) -> Result<DateTime<Utc>, StoreError> {
    let millis = int(batch, name, row)?;
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| StoreError::Other(format!("timestamp out of range: {millis}")))
}

/// Map every row of every batch through `read`.
fn rows<T>(
    batches: &[RecordBatch],
    mut read: impl FnMut(&RecordBatch, usize) -> Result<T, StoreError>,
) -> Result<Vec<T>, StoreError> {
    let mut out = Vec::new();
    for batch in batches {
        for row in 0..batch.num_rows() {
            out.push(read(batch, row)?);
        }
    }
    Ok(out)
}

/// Active classes the requester studies in, joined with their course.
const STUDENT_CLASSES: &str = "
    FROM enrollments se
    JOIN schedules s ON s.id = se.schedule_id
    JOIN courses c ON c.id = s.course_id";

impl DomainQuery for DuckStore {
    fn course_names(&self, requester: RequesterId) -> Result<Vec<String>, StoreError> {
        let mut q = Query::new(
            "SELECT c.name AS name, min(e.seq) AS first
             FROM enrollments e
             JOIN schedules s ON s.id = e.schedule_id
             JOIN courses c ON c.id = s.course_id",
            "GROUP BY c.name ORDER BY first",
        );
        let p = q.bind(Value::BigInt(requester.0));
        q.filter(format!("e.user_id = {p}"));
        let batches = self.fetch_query(q)?;
        rows(&batches, |b, i| text(b, "name", i))
    }

    fn assistants_with_course(
        &self,
        requester: RequesterId,
        course: Option<&CourseFilter>,
        days: &[Weekday],
    ) -> Result<Vec<AssistantRow>, StoreError> {
        let mut q = Query::new(
            &format!(
                "SELECT u.identity_code::BIGINT AS identity_code, u.name, u.phone,
                        u.messaging_id, u.photo_file_id, c.name AS course_name,
                        s.day::BIGINT AS day
                 {STUDENT_CLASSES}
                 JOIN enrollments ae ON ae.schedule_id = s.id AND ae.role = '{}'
                 JOIN users u ON u.id = ae.user_id",
                Role::Assistant.as_str()
            ),
            "ORDER BY se.seq, ae.seq",
        );
        student_scope(&mut q, requester);
        q.filter("s.active".into());
        q.days("s.day", days);
        q.course("c.name", course);

        let batches = self.fetch_query(q)?;
        rows(&batches, |b, i| {
            Ok(AssistantRow {
                identity_code: int(b, "identity_code", i)?,
                name: text(b, "name", i)?,
                phone: text(b, "phone", i)?,
                messaging_id: opt_text(b, "messaging_id", i)?,
                photo_file_id: opt_text(b, "photo_file_id", i)?,
                course_name: text(b, "course_name", i)?,
                day: weekday(b, "day", i)?,
            })
        })
    }

    fn enrolled_schedule_ids(&self, requester: RequesterId) -> Result<Vec<i64>, StoreError> {
        let mut q = Query::new(
            "SELECT e.schedule_id::BIGINT AS schedule_id FROM enrollments e",
            "ORDER BY e.seq",
        );
        let p = q.bind(Value::BigInt(requester.0));
        q.filter(format!("e.user_id = {p}"));
        q.filter(format!("e.role = '{}'", Role::Student.as_str()));
        let batches = self.fetch_query(q)?;
        rows(&batches, |b, i| int(b, "schedule_id", i))
    }

    fn schedules_by_id(&self, ids: &[i64]) -> Result<Vec<ScheduleCourse>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut q = Query::new(
            "SELECT s.id::BIGINT AS schedule_id, c.name AS course_name
             FROM schedules s JOIN courses c ON c.id = s.course_id",
            "ORDER BY s.id",
        );
        q.filter("s.active".into());
        q.ids("s.id", ids);
        let batches = self.fetch_query(q)?;
        rows(&batches, |b, i| {
            Ok(ScheduleCourse {
                schedule_id: int(b, "schedule_id", i)?,
                course_name: text(b, "course_name", i)?,
            })
        })
    }

    fn schedules_with_course(
        &self,
        requester: RequesterId,
        course: Option<&CourseFilter>,
        days: &[Weekday],
    ) -> Result<Vec<ScheduleRow>, StoreError> {
        let mut q = Query::new(
            &format!(
                "SELECT s.id::BIGINT AS schedule_id, c.name AS course_name,
                        s.day::BIGINT AS day, s.start_minute::BIGINT AS start_minute,
                        s.end_minute::BIGINT AS end_minute, s.place
                 {STUDENT_CLASSES}"
            ),
            "ORDER BY s.day, s.start_minute, se.seq",
        );
        student_scope(&mut q, requester);
        q.filter("s.active".into());
        q.days("s.day", days);
        q.course("c.name", course);

        let batches = self.fetch_query(q)?;
        rows(&batches, |b, i| {
            Ok(ScheduleRow {
                schedule_id: int(b, "schedule_id", i)?,
                course_name: text(b, "course_name", i)?,
                day: weekday(b, "day", i)?,
                start_minute: minute(b, "start_minute", i)?,
                end_minute: minute(b, "end_minute", i)?,
                place: text(b, "place", i)?,
            })
        })
    }

    fn assignments_with_course(
        &self,
        requester: RequesterId,
        course: Option<&CourseFilter>,
        due: Option<&TimeRange>,
    ) -> Result<Vec<AssignmentRow>, StoreError> {
        let mut q = Query::new(
            &format!(
                "SELECT a.id::BIGINT AS id, a.name, a.description,
                        epoch_ms(a.due_date)::BIGINT AS due_ms, c.name AS course_name
                 {STUDENT_CLASSES}
                 JOIN assignments a ON a.schedule_id = s.id"
            ),
            "ORDER BY a.due_date, a.id",
        );
        student_scope(&mut q, requester);
        q.course("c.name", course);
        q.range("a.due_date", due);

        let batches = self.fetch_query(q)?;
        rows(&batches, |b, i| {
            Ok(AssignmentRow {
                id: int(b, "id", i)?,
                name: text(b, "name", i)?,
                description: opt_text(b, "description", i)?,
                due_date: instant(b, "due_ms", i)?,
                course_name: text(b, "course_name", i)?,
            })
        })
    }

    fn grades_with_course(
        &self,
        requester: RequesterId,
        course: Option<&CourseFilter>,
        scored: Option<&TimeRange>,
    ) -> Result<Vec<GradeRow>, StoreError> {
        let mut q = Query::new(
            "SELECT a.id::BIGINT AS assignment_id, a.name, g.score::DOUBLE AS score,
                    epoch_ms(g.updated_at)::BIGINT AS updated_ms, c.name AS course_name
             FROM grades g
             JOIN assignments a ON a.id = g.assignment_id
             JOIN schedules s ON s.id = a.schedule_id
             JOIN courses c ON c.id = s.course_id",
            "ORDER BY g.updated_at DESC, a.id",
        );
        let p = q.bind(Value::BigInt(requester.0));
        q.filter(format!("g.user_id = {p}"));
        q.course("c.name", course);
        q.range("g.updated_at", scored);

        let batches = self.fetch_query(q)?;
        rows(&batches, |b, i| {
            Ok(GradeRow {
                assignment_id: int(b, "assignment_id", i)?,
                name: text(b, "name", i)?,
                score: float(b, "score", i)?,
                updated_at: instant(b, "updated_ms", i)?,
                course_name: text(b, "course_name", i)?,
            })
        })
    }

    fn information_for_schedules(
        &self,
        schedule_ids: &[i64],
        posted: Option<&TimeRange>,
    ) -> Result<Vec<InformationPost>, StoreError> {
        if schedule_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut q = Query::new(
            "SELECT p.id::BIGINT AS id, p.schedule_id::BIGINT AS schedule_id, p.title,
                    p.description, epoch_ms(p.created_at)::BIGINT AS created_ms
             FROM information p",
            "ORDER BY p.created_at DESC, p.id",
        );
        q.ids("p.schedule_id", schedule_ids);
        q.range("p.created_at", posted);

        let batches = self.fetch_query(q)?;
        rows(&batches, |b, i| {
            Ok(InformationPost {
                id: int(b, "id", i)?,
                schedule_id: int(b, "schedule_id", i)?,
                title: text(b, "title", i)?,
                description: opt_text(b, "description", i)?,
                created_at: instant(b, "created_ms", i)?,
            })
        })
    }
}

fn student_scope(q: &mut Query, requester: RequesterId) {
    let p = q.bind(Value::BigInt(requester.0));
    q.filter(format!("se.user_id = {p}"));
    q.filter(format!("se.role = '{}'", Role::Student.as_str()));
}
