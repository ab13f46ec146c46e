//! Students ("employees" on the wire): registration, login, CRUD, exam
//! results and per-subject attendance.

use super::fields;
use super::{
    query_ids, row_exists, AttendanceStatus, ClassRef, DeleteSummary, LoginOutcome,
    SchoolRef, Scope, SubjectRef, UpdateSummary,
};
use crate::password;
use anyhow::{anyhow, Context};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResult {
    pub sub_name: SubjectRef,
    pub marks_obtained: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub sub_name: SubjectRef,
}

/// Stored student without its password hash. `exam_result` and `attendance`
/// are `None` when the caller asked for the stripped form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub roll_num: i64,
    pub role: String,
    pub school: SchoolRef,
    pub sclass_name: ClassRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exam_result: Option<Vec<ExamResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendance: Option<Vec<AttendanceRecord>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    pub name: String,
    #[serde(deserialize_with = "fields::number")]
    pub roll_num: i64,
    pub password: String,
    #[serde(alias = "sclassId")]
    pub sclass_name: String,
    #[serde(rename = "adminID", alias = "school")]
    pub school_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentLogin {
    #[serde(deserialize_with = "fields::number")]
    pub roll_num: i64,
    #[serde(rename = "employeeName", alias = "studentName", alias = "name")]
    pub name: String,
    pub password: String,
}

/// Fields a `PUT /employee/:id` may set. Anything else in the body is
/// ignored, including `examResult` and `attendance`: those lists change only
/// through their own endpoints, so a whole-document PUT cannot push
/// attendance past a subject's session count.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "fields::number_opt")]
    pub roll_num: Option<i64>,
    pub password: Option<String>,
    #[serde(alias = "sclassId")]
    pub sclass_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamEntry {
    #[serde(rename = "subName")]
    pub subject_id: String,
    #[serde(deserialize_with = "fields::number")]
    pub marks_obtained: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceEntry {
    #[serde(rename = "subName")]
    pub subject_id: String,
    pub status: AttendanceStatus,
    #[serde(deserialize_with = "fields::day")]
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegisterOutcome {
    Registered(Student),
    DuplicateRollNum,
    ClassNotFound,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    Updated(Student),
    StudentNotFound,
    ClassNotFound,
    DuplicateRollNum,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExamOutcome {
    Updated(Student),
    StudentNotFound,
    SubjectNotFound,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttendanceOutcome {
    Recorded(Student),
    LimitReached,
    StudentNotFound,
    SubjectNotFound,
}

fn scope_column(scope: Scope<'_>) -> (&'static str, &str) {
    match scope {
        Scope::School(id) => ("school_id", id),
        Scope::Class(id) => ("sclass_id", id),
    }
}

fn load_exam_results(conn: &Connection, student_id: &str) -> anyhow::Result<Vec<ExamResult>> {
    let mut stmt = conn.prepare(
        "SELECT s.id, s.sub_name, s.sessions, e.marks_obtained
         FROM exam_results e
         JOIN subjects s ON s.id = e.subject_id
         WHERE e.student_id = ?
         ORDER BY e.rowid",
    )?;
    let rows = stmt
        .query_map([student_id], |r| {
            Ok(ExamResult {
                sub_name: SubjectRef {
                    id: r.get(0)?,
                    sub_name: r.get(1)?,
                    sessions: r.get(2)?,
                },
                marks_obtained: r.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn load_attendance(conn: &Connection, student_id: &str) -> anyhow::Result<Vec<AttendanceRecord>> {
    let mut stmt = conn.prepare(
        "SELECT a.day, a.status, s.id, s.sub_name, s.sessions
         FROM student_attendance a
         JOIN subjects s ON s.id = a.subject_id
         WHERE a.student_id = ?
         ORDER BY a.rowid",
    )?;
    let raw = stmt
        .query_map([student_id], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                SubjectRef {
                    id: r.get(2)?,
                    sub_name: r.get(3)?,
                    sessions: r.get(4)?,
                },
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut out = Vec::with_capacity(raw.len());
    for (day, status, subject) in raw {
        let date = fields::parse_day(&day).ok_or_else(|| anyhow!("bad stored day {day:?}"))?;
        let status =
            AttendanceStatus::parse(&status).ok_or_else(|| anyhow!("bad stored status {status:?}"))?;
        out.push(AttendanceRecord {
            date,
            status,
            sub_name: subject,
        });
    }
    Ok(out)
}

/// Student by id. With `with_records == false` the result and attendance
/// lists are left out entirely.
pub fn find_student(
    conn: &Connection,
    student_id: &str,
    with_records: bool,
) -> anyhow::Result<Option<Student>> {
    let base = conn
        .query_row(
            "SELECT st.id, st.name, st.roll_num, st.role,
                    sc.id, sc.school_name, c.id, c.sclass_name
             FROM students st
             JOIN schools sc ON sc.id = st.school_id
             JOIN sclasses c ON c.id = st.sclass_id
             WHERE st.id = ?",
            [student_id],
            |r| {
                Ok(Student {
                    id: r.get(0)?,
                    name: r.get(1)?,
                    roll_num: r.get(2)?,
                    role: r.get(3)?,
                    school: SchoolRef {
                        id: r.get(4)?,
                        school_name: r.get(5)?,
                    },
                    sclass_name: ClassRef {
                        id: r.get(6)?,
                        sclass_name: r.get(7)?,
                    },
                    exam_result: None,
                    attendance: None,
                })
            },
        )
        .optional()?;

    let Some(mut student) = base else {
        return Ok(None);
    };
    if with_records {
        student.exam_result = Some(load_exam_results(conn, student_id)?);
        student.attendance = Some(load_attendance(conn, student_id)?);
    }
    Ok(Some(student))
}

fn must_find(conn: &Connection, student_id: &str) -> anyhow::Result<Student> {
    find_student(conn, student_id, true)?
        .ok_or_else(|| anyhow!("student {student_id} disappeared after write"))
}

fn list_where(conn: &Connection, scope: Scope<'_>) -> anyhow::Result<Vec<Student>> {
    let (column, id) = scope_column(scope);
    let sql = format!(
        "SELECT id FROM students WHERE {} = ? ORDER BY rowid",
        column
    );
    let ids = query_ids(conn, &sql, id)?;
    let mut out = Vec::with_capacity(ids.len());
    for sid in ids {
        if let Some(s) = find_student(conn, &sid, true)? {
            out.push(s);
        }
    }
    Ok(out)
}

pub fn list_by_school(conn: &Connection, school_id: &str) -> anyhow::Result<Vec<Student>> {
    list_where(conn, Scope::School(school_id))
}

pub fn list_by_class(conn: &Connection, class_id: &str) -> anyhow::Result<Vec<Student>> {
    list_where(conn, Scope::Class(class_id))
}

pub fn register(conn: &Connection, new: &NewStudent) -> anyhow::Result<RegisterOutcome> {
    let class_school: Option<String> = conn
        .query_row(
            "SELECT school_id FROM sclasses WHERE id = ?",
            [&new.sclass_name],
            |r| r.get(0),
        )
        .optional()?;
    if class_school.as_deref() != Some(new.school_id.as_str()) {
        return Ok(RegisterOutcome::ClassNotFound);
    }

    let duplicate: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM students WHERE roll_num = ? AND school_id = ? AND sclass_id = ?",
            (new.roll_num, &new.school_id, &new.sclass_name),
            |r| r.get(0),
        )
        .optional()?;
    if duplicate.is_some() {
        return Ok(RegisterOutcome::DuplicateRollNum);
    }

    let hash = password::hash_password(&new.password)?;
    let id = crate::db::new_id();
    conn.execute(
        "INSERT INTO students(id, name, roll_num, password_hash, school_id, sclass_id)
         VALUES(?, ?, ?, ?, ?, ?)",
        (
            &id,
            new.name.trim(),
            new.roll_num,
            &hash,
            &new.school_id,
            &new.sclass_name,
        ),
    )
    .context("insert student")?;

    Ok(RegisterOutcome::Registered(must_find(conn, &id)?))
}

pub fn login(conn: &Connection, creds: &StudentLogin) -> anyhow::Result<LoginOutcome<Student>> {
    let row: Option<(String, String)> = conn
        .query_row(
            "SELECT id, password_hash FROM students WHERE roll_num = ? AND name = ? ORDER BY rowid LIMIT 1",
            (creds.roll_num, creds.name.trim()),
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;
    let Some((id, hash)) = row else {
        return Ok(LoginOutcome::NotFound);
    };
    if !password::verify_password(&creds.password, &hash) {
        return Ok(LoginOutcome::InvalidPassword);
    }
    match find_student(conn, &id, false)? {
        Some(s) => Ok(LoginOutcome::LoggedIn(s)),
        None => Ok(LoginOutcome::NotFound),
    }
}

pub fn update(conn: &Connection, student_id: &str, patch: &StudentPatch) -> anyhow::Result<UpdateOutcome> {
    let current: Option<(i64, String, String)> = conn
        .query_row(
            "SELECT roll_num, school_id, sclass_id FROM students WHERE id = ?",
            [student_id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .optional()?;
    let Some((roll_num, school_id, class_id)) = current else {
        return Ok(UpdateOutcome::StudentNotFound);
    };

    if patch.roll_num.is_some() || patch.sclass_name.is_some() {
        let target_roll = patch.roll_num.unwrap_or(roll_num);
        let target_class = patch.sclass_name.as_deref().unwrap_or(&class_id);
        let duplicate: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM students
                 WHERE roll_num = ? AND school_id = ? AND sclass_id = ? AND id <> ?",
                (target_roll, &school_id, target_class, student_id),
                |r| r.get(0),
            )
            .optional()?;
        if duplicate.is_some() {
            return Ok(UpdateOutcome::DuplicateRollNum);
        }
    }

    let mut set_parts: Vec<&str> = Vec::new();
    let mut bind_values: Vec<Value> = Vec::new();

    if let Some(name) = &patch.name {
        set_parts.push("name = ?");
        bind_values.push(Value::Text(name.trim().to_string()));
    }
    if let Some(roll) = patch.roll_num {
        set_parts.push("roll_num = ?");
        bind_values.push(Value::Integer(roll));
    }
    if let Some(pw) = &patch.password {
        set_parts.push("password_hash = ?");
        bind_values.push(Value::Text(password::hash_password(pw)?));
    }
    if let Some(target_class_id) = &patch.sclass_name {
        // Moving between schools is not allowed; the class must share the student's school.
        let class_school: Option<String> = conn
            .query_row(
                "SELECT school_id FROM sclasses WHERE id = ?",
                [target_class_id],
                |r| r.get(0),
            )
            .optional()?;
        if class_school.as_deref() != Some(school_id.as_str()) {
            return Ok(UpdateOutcome::ClassNotFound);
        }
        set_parts.push("sclass_id = ?");
        bind_values.push(Value::Text(target_class_id.clone()));
    }

    if !set_parts.is_empty() {
        let sql = format!("UPDATE students SET {} WHERE id = ?", set_parts.join(", "));
        bind_values.push(Value::Text(student_id.to_string()));
        conn.execute(&sql, params_from_iter(bind_values))
            .context("update student")?;
    }

    Ok(UpdateOutcome::Updated(must_find(conn, student_id)?))
}

/// Overwrites the marks for `entry.subject_id` or appends a new result.
pub fn upsert_exam_result(
    conn: &Connection,
    student_id: &str,
    entry: &ExamEntry,
) -> anyhow::Result<ExamOutcome> {
    if !row_exists(conn, "students", student_id)? {
        return Ok(ExamOutcome::StudentNotFound);
    }
    if !row_exists(conn, "subjects", &entry.subject_id)? {
        return Ok(ExamOutcome::SubjectNotFound);
    }
    // ON CONFLICT keeps the rowid, so an overwrite does not move the entry.
    conn.execute(
        "INSERT INTO exam_results(student_id, subject_id, marks_obtained) VALUES(?, ?, ?)
         ON CONFLICT(student_id, subject_id) DO UPDATE SET marks_obtained = excluded.marks_obtained",
        (student_id, &entry.subject_id, entry.marks_obtained),
    )
    .context("upsert exam result")?;
    Ok(ExamOutcome::Updated(must_find(conn, student_id)?))
}

/// Same-day records are overwritten; new days are appended only while the
/// student's count for the subject is below the subject's session count.
pub fn record_attendance(
    conn: &Connection,
    student_id: &str,
    entry: &AttendanceEntry,
) -> anyhow::Result<AttendanceOutcome> {
    let tx = conn.unchecked_transaction()?;

    if !row_exists(&tx, "students", student_id)? {
        return Ok(AttendanceOutcome::StudentNotFound);
    }
    let sessions: Option<i64> = tx
        .query_row(
            "SELECT sessions FROM subjects WHERE id = ?",
            [&entry.subject_id],
            |r| r.get(0),
        )
        .optional()?;
    let Some(sessions) = sessions else {
        return Ok(AttendanceOutcome::SubjectNotFound);
    };

    let day = fields::day_key(entry.date);
    let updated = tx.execute(
        "UPDATE student_attendance SET status = ?
         WHERE student_id = ? AND subject_id = ? AND day = ?",
        (entry.status.as_str(), student_id, &entry.subject_id, &day),
    )?;

    if updated == 0 {
        let attended: i64 = tx.query_row(
            "SELECT COUNT(*) FROM student_attendance WHERE student_id = ? AND subject_id = ?",
            (student_id, &entry.subject_id),
            |r| r.get(0),
        )?;
        if attended >= sessions {
            return Ok(AttendanceOutcome::LimitReached);
        }
        tx.execute(
            "INSERT INTO student_attendance(student_id, subject_id, day, status) VALUES(?, ?, ?, ?)",
            (student_id, &entry.subject_id, &day, entry.status.as_str()),
        )
        .context("insert attendance")?;
    }
    tx.commit()?;

    Ok(AttendanceOutcome::Recorded(must_find(conn, student_id)?))
}

/// One subject's records, across every student that has any.
pub fn clear_subject_attendance(conn: &Connection, subject_id: &str) -> anyhow::Result<UpdateSummary> {
    let tx = conn.unchecked_transaction()?;
    let touched: i64 = tx.query_row(
        "SELECT COUNT(DISTINCT student_id) FROM student_attendance WHERE subject_id = ?",
        [subject_id],
        |r| r.get(0),
    )?;
    tx.execute(
        "DELETE FROM student_attendance WHERE subject_id = ?",
        [subject_id],
    )?;
    tx.commit()?;
    Ok(UpdateSummary {
        matched_count: touched as usize,
        modified_count: touched as usize,
    })
}

pub fn clear_school_attendance(conn: &Connection, school_id: &str) -> anyhow::Result<UpdateSummary> {
    let tx = conn.unchecked_transaction()?;
    let matched: i64 = tx.query_row(
        "SELECT COUNT(*) FROM students WHERE school_id = ?",
        [school_id],
        |r| r.get(0),
    )?;
    let modified: i64 = tx.query_row(
        "SELECT COUNT(DISTINCT a.student_id)
         FROM student_attendance a
         JOIN students st ON st.id = a.student_id
         WHERE st.school_id = ?",
        [school_id],
        |r| r.get(0),
    )?;
    tx.execute(
        "DELETE FROM student_attendance
         WHERE student_id IN (SELECT id FROM students WHERE school_id = ?)",
        [school_id],
    )?;
    tx.commit()?;
    Ok(UpdateSummary {
        matched_count: matched as usize,
        modified_count: modified as usize,
    })
}

pub fn clear_student_subject_attendance(
    conn: &Connection,
    student_id: &str,
    subject_id: &str,
) -> anyhow::Result<UpdateSummary> {
    let matched = row_exists(conn, "students", student_id)?;
    let removed = conn.execute(
        "DELETE FROM student_attendance WHERE student_id = ? AND subject_id = ?",
        (student_id, subject_id),
    )?;
    Ok(UpdateSummary {
        matched_count: usize::from(matched),
        modified_count: usize::from(removed > 0),
    })
}

pub fn clear_student_attendance(conn: &Connection, student_id: &str) -> anyhow::Result<UpdateSummary> {
    let matched = row_exists(conn, "students", student_id)?;
    let removed = conn.execute(
        "DELETE FROM student_attendance WHERE student_id = ?",
        [student_id],
    )?;
    Ok(UpdateSummary {
        matched_count: usize::from(matched),
        modified_count: usize::from(removed > 0),
    })
}

/// Removes the students in `scope` with their results and attendance.
/// Runs inside the caller's transaction.
pub(crate) fn purge(conn: &Connection, scope: Scope<'_>) -> anyhow::Result<usize> {
    let (column, id) = scope_column(scope);
    for child in ["exam_results", "student_attendance"] {
        let sql = format!(
            "DELETE FROM {} WHERE student_id IN (SELECT id FROM students WHERE {} = ?)",
            child, column
        );
        conn.execute(&sql, [id])
            .with_context(|| format!("delete {child}"))?;
    }
    let sql = format!("DELETE FROM students WHERE {} = ?", column);
    let n = conn.execute(&sql, [id]).context("delete students")?;
    Ok(n)
}

pub fn delete(conn: &Connection, student_id: &str) -> anyhow::Result<Option<Student>> {
    let Some(student) = find_student(conn, student_id, true)? else {
        return Ok(None);
    };
    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM exam_results WHERE student_id = ?", [student_id])?;
    tx.execute(
        "DELETE FROM student_attendance WHERE student_id = ?",
        [student_id],
    )?;
    tx.execute("DELETE FROM students WHERE id = ?", [student_id])?;
    tx.commit()?;
    Ok(Some(student))
}

pub fn delete_by_school(conn: &Connection, school_id: &str) -> anyhow::Result<DeleteSummary> {
    let tx = conn.unchecked_transaction()?;
    let deleted_count = purge(&tx, Scope::School(school_id))?;
    tx.commit()?;
    Ok(DeleteSummary { deleted_count })
}

pub fn delete_by_class(conn: &Connection, class_id: &str) -> anyhow::Result<DeleteSummary> {
    let tx = conn.unchecked_transaction()?;
    let deleted_count = purge(&tx, Scope::Class(class_id))?;
    tx.commit()?;
    Ok(DeleteSummary { deleted_count })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testutil::{add_class, add_school, add_student, add_subject, count, seed};

    fn day(s: &str) -> NaiveDate {
        fields::parse_day(s).expect("day")
    }

    fn attend(conn: &Connection, student: &str, subject: &str, on: &str) -> AttendanceOutcome {
        record_attendance(
            conn,
            student,
            &AttendanceEntry {
                subject_id: subject.to_string(),
                status: AttendanceStatus::Present,
                date: day(on),
            },
        )
        .expect("record attendance")
    }

    fn new_student(school: &str, class: &str, roll: i64) -> NewStudent {
        NewStudent {
            name: "Bo".to_string(),
            roll_num: roll,
            password: "secret".to_string(),
            sclass_name: class.to_string(),
            school_id: school.to_string(),
        }
    }

    #[test]
    fn attendance_is_capped_by_sessions() {
        let s = seed();
        add_subject(&s.conn, "maths", &s.class_id, 3);
        add_student(&s.conn, "st1", &s.class_id, 1);

        for d in ["2024-01-01", "2024-01-02", "2024-01-03"] {
            assert!(matches!(
                attend(&s.conn, "st1", "maths", d),
                AttendanceOutcome::Recorded(_)
            ));
        }
        assert_eq!(
            attend(&s.conn, "st1", "maths", "2024-01-04"),
            AttendanceOutcome::LimitReached
        );
        assert_eq!(
            count(&s.conn, "SELECT COUNT(*) FROM student_attendance WHERE student_id = 'st1'"),
            3
        );
    }

    #[test]
    fn same_day_overwrites_status_even_at_cap() {
        let s = seed();
        add_subject(&s.conn, "maths", &s.class_id, 1);
        add_student(&s.conn, "st1", &s.class_id, 1);

        attend(&s.conn, "st1", "maths", "2024-02-10");
        let out = record_attendance(
            &s.conn,
            "st1",
            &AttendanceEntry {
                subject_id: "maths".to_string(),
                status: AttendanceStatus::Absent,
                date: day("2024-02-10T15:00:00Z"),
            },
        )
        .expect("record");

        let AttendanceOutcome::Recorded(student) = out else {
            panic!("expected recorded, got {out:?}");
        };
        let records = student.attendance.expect("attendance loaded");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, AttendanceStatus::Absent);
        assert_eq!(records[0].sub_name.id, "maths");
    }

    #[test]
    fn cap_is_per_subject() {
        let s = seed();
        add_subject(&s.conn, "maths", &s.class_id, 1);
        add_subject(&s.conn, "art", &s.class_id, 1);
        add_student(&s.conn, "st1", &s.class_id, 1);

        attend(&s.conn, "st1", "maths", "2024-01-01");
        assert!(matches!(
            attend(&s.conn, "st1", "art", "2024-01-01"),
            AttendanceOutcome::Recorded(_)
        ));
    }

    #[test]
    fn attendance_reports_missing_student_and_subject() {
        let s = seed();
        add_subject(&s.conn, "maths", &s.class_id, 2);
        add_student(&s.conn, "st1", &s.class_id, 1);
        assert_eq!(
            attend(&s.conn, "nobody", "maths", "2024-01-01"),
            AttendanceOutcome::StudentNotFound
        );
        assert_eq!(
            attend(&s.conn, "st1", "nothing", "2024-01-01"),
            AttendanceOutcome::SubjectNotFound
        );
    }

    #[test]
    fn exam_result_upsert_keeps_one_entry_per_subject() {
        let s = seed();
        add_subject(&s.conn, "maths", &s.class_id, 2);
        add_subject(&s.conn, "art", &s.class_id, 2);
        add_student(&s.conn, "st1", &s.class_id, 1);

        for (subject, marks) in [("maths", 40.0), ("art", 70.0), ("maths", 65.5)] {
            upsert_exam_result(
                &s.conn,
                "st1",
                &ExamEntry {
                    subject_id: subject.to_string(),
                    marks_obtained: marks,
                },
            )
            .expect("upsert");
        }

        let student = find_student(&s.conn, "st1", true).expect("find").expect("exists");
        let results = student.exam_result.expect("results");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].sub_name.id, "maths");
        assert_eq!(results[0].marks_obtained, 65.5);
        assert_eq!(results[1].sub_name.id, "art");
    }

    #[test]
    fn duplicate_roll_number_is_rejected_per_class() {
        let s = seed();
        add_class(&s.conn, "class-2", &s.school_id);

        let first = register(&s.conn, &new_student(&s.school_id, &s.class_id, 7)).expect("register");
        assert!(matches!(first, RegisterOutcome::Registered(_)));
        let dup = register(&s.conn, &new_student(&s.school_id, &s.class_id, 7)).expect("register");
        assert_eq!(dup, RegisterOutcome::DuplicateRollNum);
        let other_class = register(&s.conn, &new_student(&s.school_id, "class-2", 7)).expect("register");
        assert!(matches!(other_class, RegisterOutcome::Registered(_)));

        assert_eq!(count(&s.conn, "SELECT COUNT(*) FROM students"), 2);
    }

    #[test]
    fn register_requires_class_in_school() {
        let s = seed();
        add_school(&s.conn, "school-2");
        let out = register(&s.conn, &new_student("school-2", &s.class_id, 1)).expect("register");
        assert_eq!(out, RegisterOutcome::ClassNotFound);
    }

    #[test]
    fn login_strips_records() {
        let s = seed();
        add_subject(&s.conn, "maths", &s.class_id, 2);
        let RegisterOutcome::Registered(st) =
            register(&s.conn, &new_student(&s.school_id, &s.class_id, 3)).expect("register")
        else {
            panic!("register failed");
        };
        attend(&s.conn, &st.id, "maths", "2024-01-01");

        let ok = login(
            &s.conn,
            &StudentLogin {
                roll_num: 3,
                name: "Bo".to_string(),
                password: "secret".to_string(),
            },
        )
        .expect("login");
        let LoginOutcome::LoggedIn(student) = ok else {
            panic!("expected login, got {ok:?}");
        };
        assert!(student.exam_result.is_none());
        assert!(student.attendance.is_none());
        let json = serde_json::to_value(&student).expect("json");
        assert!(json.get("password").is_none());
        assert!(json.get("attendance").is_none());
        assert_eq!(json["school"]["schoolName"], "North High");

        let bad = login(
            &s.conn,
            &StudentLogin {
                roll_num: 3,
                name: "Bo".to_string(),
                password: "wrong".to_string(),
            },
        )
        .expect("login");
        assert_eq!(bad, LoginOutcome::InvalidPassword);
    }

    #[test]
    fn clearing_school_attendance_leaves_other_schools() {
        let s = seed();
        add_school(&s.conn, "school-2");
        add_class(&s.conn, "class-9", "school-2");
        add_subject(&s.conn, "maths", &s.class_id, 5);
        add_subject(&s.conn, "bio", "class-9", 5);
        add_student(&s.conn, "st1", &s.class_id, 1);
        add_student(&s.conn, "st2", &s.class_id, 2);
        add_student(&s.conn, "outsider", "class-9", 1);
        attend(&s.conn, "st1", "maths", "2024-01-01");
        attend(&s.conn, "outsider", "bio", "2024-01-01");

        let summary = clear_school_attendance(&s.conn, &s.school_id).expect("clear");
        assert_eq!(summary.matched_count, 2);
        assert_eq!(summary.modified_count, 1);
        assert_eq!(
            count(&s.conn, "SELECT COUNT(*) FROM student_attendance WHERE student_id = 'outsider'"),
            1
        );
        assert_eq!(count(&s.conn, "SELECT COUNT(*) FROM student_attendance"), 1);

        let again = clear_school_attendance(&s.conn, &s.school_id).expect("clear");
        assert_eq!(again.modified_count, 0);
    }

    #[test]
    fn clearing_by_subject_and_by_student() {
        let s = seed();
        add_subject(&s.conn, "maths", &s.class_id, 5);
        add_subject(&s.conn, "art", &s.class_id, 5);
        add_student(&s.conn, "st1", &s.class_id, 1);
        add_student(&s.conn, "st2", &s.class_id, 2);
        attend(&s.conn, "st1", "maths", "2024-01-01");
        attend(&s.conn, "st1", "art", "2024-01-01");
        attend(&s.conn, "st2", "maths", "2024-01-01");

        let one = clear_student_subject_attendance(&s.conn, "st1", "art").expect("clear");
        assert_eq!(one.modified_count, 1);
        let none = clear_student_subject_attendance(&s.conn, "st1", "art").expect("clear");
        assert_eq!(none.modified_count, 0);

        let by_subject = clear_subject_attendance(&s.conn, "maths").expect("clear");
        assert_eq!(by_subject.modified_count, 2);
        assert_eq!(count(&s.conn, "SELECT COUNT(*) FROM student_attendance"), 0);

        attend(&s.conn, "st2", "art", "2024-01-02");
        let all = clear_student_attendance(&s.conn, "st2").expect("clear");
        assert_eq!(all.matched_count, 1);
        assert_eq!(all.modified_count, 1);
    }

    #[test]
    fn update_rehashes_password_and_moves_class() {
        let s = seed();
        add_class(&s.conn, "class-2", &s.school_id);
        add_student(&s.conn, "st1", &s.class_id, 1);

        let out = update(
            &s.conn,
            "st1",
            &StudentPatch {
                name: Some("Renamed".to_string()),
                password: Some("newpw".to_string()),
                sclass_name: Some("class-2".to_string()),
                ..Default::default()
            },
        )
        .expect("update");
        let UpdateOutcome::Updated(student) = out else {
            panic!("expected update, got {out:?}");
        };
        assert_eq!(student.name, "Renamed");
        assert_eq!(student.sclass_name.id, "class-2");

        let hash: String = s
            .conn
            .query_row("SELECT password_hash FROM students WHERE id = 'st1'", [], |r| r.get(0))
            .expect("hash");
        assert!(password::verify_password("newpw", &hash));

        let missing = update(&s.conn, "nobody", &StudentPatch::default()).expect("update");
        assert_eq!(missing, UpdateOutcome::StudentNotFound);
    }

    #[test]
    fn update_refuses_roll_number_taken_in_class() {
        let s = seed();
        add_class(&s.conn, "class-2", &s.school_id);
        add_student(&s.conn, "a", &s.class_id, 1);
        add_student(&s.conn, "b", &s.class_id, 2);
        add_student(&s.conn, "c", "class-2", 2);

        let renumber = StudentPatch {
            roll_num: Some(1),
            ..Default::default()
        };
        assert_eq!(
            update(&s.conn, "b", &renumber).expect("update"),
            UpdateOutcome::DuplicateRollNum
        );

        let move_into = StudentPatch {
            sclass_name: Some(s.class_id.clone()),
            ..Default::default()
        };
        assert_eq!(
            update(&s.conn, "c", &move_into).expect("update"),
            UpdateOutcome::DuplicateRollNum
        );
        assert_eq!(
            count(&s.conn, "SELECT COUNT(*) FROM students WHERE roll_num = 1 AND sclass_id = 'class-1'"),
            1
        );

        // Keeping its own roll number is not a clash.
        let same = StudentPatch {
            roll_num: Some(2),
            ..Default::default()
        };
        assert!(matches!(
            update(&s.conn, "b", &same).expect("update"),
            UpdateOutcome::Updated(_)
        ));
    }

    #[test]
    fn delete_removes_child_rows() {
        let s = seed();
        add_subject(&s.conn, "maths", &s.class_id, 5);
        add_student(&s.conn, "st1", &s.class_id, 1);
        attend(&s.conn, "st1", "maths", "2024-01-01");

        let gone = delete(&s.conn, "st1").expect("delete").expect("existed");
        assert_eq!(gone.id, "st1");
        assert_eq!(count(&s.conn, "SELECT COUNT(*) FROM student_attendance"), 0);
        assert!(delete(&s.conn, "st1").expect("delete").is_none());
    }
}
