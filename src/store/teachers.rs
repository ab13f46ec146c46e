use super::fields;
use super::{
    class_ref, query_ids, row_exists, school_ref, subject_ref, AttendanceStatus, ClassRef,
    DeleteSummary, LoginOutcome, SchoolRef, Scope, SubjectRef,
};
use crate::password;
use anyhow::{anyhow, Context};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeacherAttendance {
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub school: SchoolRef,
    pub teach_subject: Option<SubjectRef>,
    pub teach_sclass: ClassRef,
    pub attendance: Vec<TeacherAttendance>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTeacher {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "school", alias = "adminID")]
    pub school_id: String,
    #[serde(default)]
    pub teach_subject: Option<String>,
    pub teach_sclass: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeacherLogin {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectAssignment {
    pub teacher_id: String,
    #[serde(rename = "teachSubject")]
    pub subject_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeacherAttendanceEntry {
    pub status: AttendanceStatus,
    #[serde(deserialize_with = "fields::day")]
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    Registered(Teacher),
    DuplicateEmail,
    ClassNotFound,
    SubjectNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignOutcome {
    Assigned(Teacher),
    TeacherNotFound,
    SubjectNotFound,
}

fn scope_column(scope: Scope<'_>) -> (&'static str, &str) {
    match scope {
        Scope::School(id) => ("school_id", id),
        Scope::Class(id) => ("teach_sclass_id", id),
    }
}

fn load_attendance(conn: &Connection, teacher_id: &str) -> anyhow::Result<Vec<TeacherAttendance>> {
    let mut stmt = conn.prepare(
        "SELECT day, status FROM teacher_attendance WHERE teacher_id = ? ORDER BY rowid",
    )?;
    let raw = stmt
        .query_map([teacher_id], |r| {
            Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    raw.into_iter()
        .map(|(day, status)| {
            Ok(TeacherAttendance {
                date: fields::parse_day(&day).ok_or_else(|| anyhow!("bad stored day {day:?}"))?,
                status: AttendanceStatus::parse(&status)
                    .ok_or_else(|| anyhow!("bad stored status {status:?}"))?,
            })
        })
        .collect()
}

pub fn find_teacher(conn: &Connection, id: &str) -> anyhow::Result<Option<Teacher>> {
    let row: Option<(String, String, String, String, String, Option<String>, String)> = conn
        .query_row(
            "SELECT id, name, email, role, school_id, teach_subject_id, teach_sclass_id
             FROM teachers WHERE id = ?",
            [id],
            |r| {
                Ok((
                    r.get(0)?,
                    r.get(1)?,
                    r.get(2)?,
                    r.get(3)?,
                    r.get(4)?,
                    r.get(5)?,
                    r.get(6)?,
                ))
            },
        )
        .optional()?;
    let Some((id, name, email, role, school_id, subject_id, class_id)) = row else {
        return Ok(None);
    };

    let school = school_ref(conn, &school_id)?.context("teacher school missing")?;
    let teach_sclass = class_ref(conn, &class_id)?.context("teacher class missing")?;
    let teach_subject = match subject_id {
        Some(sid) => subject_ref(conn, &sid)?,
        None => None,
    };
    let attendance = load_attendance(conn, &id)?;

    Ok(Some(Teacher {
        id,
        name,
        email,
        role,
        school,
        teach_subject,
        teach_sclass,
        attendance,
    }))
}

pub fn list_by_school(conn: &Connection, school_id: &str) -> anyhow::Result<Vec<Teacher>> {
    let ids = query_ids(
        conn,
        "SELECT id FROM teachers WHERE school_id = ? ORDER BY rowid",
        school_id,
    )?;
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(t) = find_teacher(conn, &id)? {
            out.push(t);
        }
    }
    Ok(out)
}

/// Registers the teacher and, when a subject is given, records the teacher
/// on that subject as well.
pub fn register(conn: &Connection, new: &NewTeacher) -> anyhow::Result<RegisterOutcome> {
    let email = new.email.trim();
    let dup: Option<i64> = conn
        .query_row("SELECT 1 FROM teachers WHERE email = ?", [email], |r| r.get(0))
        .optional()?;
    if dup.is_some() {
        return Ok(RegisterOutcome::DuplicateEmail);
    }

    let class_school: Option<String> = conn
        .query_row(
            "SELECT school_id FROM sclasses WHERE id = ?",
            [&new.teach_sclass],
            |r| r.get(0),
        )
        .optional()?;
    if class_school.as_deref() != Some(new.school_id.as_str()) {
        return Ok(RegisterOutcome::ClassNotFound);
    }
    let subject_id = new.teach_subject.as_deref().filter(|s| !s.is_empty());
    if let Some(sid) = subject_id {
        if subject_school(conn, sid)?.as_deref() != Some(new.school_id.as_str()) {
            return Ok(RegisterOutcome::SubjectNotFound);
        }
    }

    let hash = password::hash_password(&new.password)?;
    let id = crate::db::new_id();
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO teachers(id, name, email, password_hash, school_id, teach_subject_id, teach_sclass_id)
         VALUES(?, ?, ?, ?, ?, ?, ?)",
        (
            &id,
            new.name.trim(),
            email,
            &hash,
            &new.school_id,
            subject_id,
            &new.teach_sclass,
        ),
    )
    .context("insert teacher")?;
    if let Some(sid) = subject_id {
        release_subject(&tx, sid, &id)?;
        tx.execute("UPDATE subjects SET teacher_id = ? WHERE id = ?", (&id, sid))
            .context("assign subject teacher")?;
    }
    tx.commit()?;

    let teacher = find_teacher(conn, &id)?.context("teacher missing after insert")?;
    Ok(RegisterOutcome::Registered(teacher))
}

pub fn login(conn: &Connection, creds: &TeacherLogin) -> anyhow::Result<LoginOutcome<Teacher>> {
    let row: Option<(String, String)> = conn
        .query_row(
            "SELECT id, password_hash FROM teachers WHERE email = ?",
            [creds.email.trim()],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;
    let Some((id, hash)) = row else {
        return Ok(LoginOutcome::NotFound);
    };
    if !password::verify_password(&creds.password, &hash) {
        return Ok(LoginOutcome::InvalidPassword);
    }
    Ok(match find_teacher(conn, &id)? {
        Some(t) => LoginOutcome::LoggedIn(t),
        None => LoginOutcome::NotFound,
    })
}

fn subject_school(conn: &Connection, subject_id: &str) -> anyhow::Result<Option<String>> {
    let school = conn
        .query_row(
            "SELECT school_id FROM subjects WHERE id = ?",
            [subject_id],
            |r| r.get(0),
        )
        .optional()?;
    Ok(school)
}

/// Clears the subject from whichever other teacher holds it.
fn release_subject(conn: &Connection, subject_id: &str, new_teacher_id: &str) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE teachers SET teach_subject_id = NULL WHERE teach_subject_id = ? AND id <> ?",
        (subject_id, new_teacher_id),
    )
    .context("release subject from previous teacher")?;
    Ok(())
}

/// Points both sides at each other. The teacher's previous subject and the
/// subject's previous teacher are both released. The subject must belong to
/// the teacher's school.
pub fn assign_subject(conn: &Connection, assignment: &SubjectAssignment) -> anyhow::Result<AssignOutcome> {
    let teacher_school: Option<String> = conn
        .query_row(
            "SELECT school_id FROM teachers WHERE id = ?",
            [&assignment.teacher_id],
            |r| r.get(0),
        )
        .optional()?;
    let Some(teacher_school) = teacher_school else {
        return Ok(AssignOutcome::TeacherNotFound);
    };
    if subject_school(conn, &assignment.subject_id)?.as_deref() != Some(teacher_school.as_str()) {
        return Ok(AssignOutcome::SubjectNotFound);
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "UPDATE subjects SET teacher_id = NULL WHERE teacher_id = ?",
        [&assignment.teacher_id],
    )?;
    release_subject(&tx, &assignment.subject_id, &assignment.teacher_id)?;
    tx.execute(
        "UPDATE teachers SET teach_subject_id = ? WHERE id = ?",
        (&assignment.subject_id, &assignment.teacher_id),
    )?;
    tx.execute(
        "UPDATE subjects SET teacher_id = ? WHERE id = ?",
        (&assignment.teacher_id, &assignment.subject_id),
    )?;
    tx.commit()?;

    let teacher = find_teacher(conn, &assignment.teacher_id)?
        .context("teacher missing after assignment")?;
    Ok(AssignOutcome::Assigned(teacher))
}

/// One record per calendar day; a second call for the same day overwrites.
pub fn record_attendance(
    conn: &Connection,
    teacher_id: &str,
    entry: &TeacherAttendanceEntry,
) -> anyhow::Result<Option<Teacher>> {
    if !row_exists(conn, "teachers", teacher_id)? {
        return Ok(None);
    }
    conn.execute(
        "INSERT INTO teacher_attendance(teacher_id, day, status) VALUES(?, ?, ?)
         ON CONFLICT(teacher_id, day) DO UPDATE SET status = excluded.status",
        (teacher_id, fields::day_key(entry.date), entry.status.as_str()),
    )
    .context("upsert teacher attendance")?;
    find_teacher(conn, teacher_id)
}

/// Removes the teachers in `scope`, their attendance, and their subject
/// assignments. Runs inside the caller's transaction.
pub(crate) fn purge(conn: &Connection, scope: Scope<'_>) -> anyhow::Result<usize> {
    let (column, id) = scope_column(scope);
    let sub = format!("SELECT id FROM teachers WHERE {} = ?", column);
    conn.execute(
        &format!("UPDATE subjects SET teacher_id = NULL WHERE teacher_id IN ({sub})"),
        [id],
    )
    .context("unset subject teachers")?;
    conn.execute(
        &format!("DELETE FROM teacher_attendance WHERE teacher_id IN ({sub})"),
        [id],
    )
    .context("delete teacher_attendance")?;
    let n = conn
        .execute(&format!("DELETE FROM teachers WHERE {} = ?", column), [id])
        .context("delete teachers")?;
    Ok(n)
}

pub fn delete(conn: &Connection, id: &str) -> anyhow::Result<Option<Teacher>> {
    let Some(teacher) = find_teacher(conn, id)? else {
        return Ok(None);
    };
    let tx = conn.unchecked_transaction()?;
    tx.execute("UPDATE subjects SET teacher_id = NULL WHERE teacher_id = ?", [id])?;
    tx.execute("DELETE FROM teacher_attendance WHERE teacher_id = ?", [id])?;
    tx.execute("DELETE FROM teachers WHERE id = ?", [id])?;
    tx.commit()?;
    Ok(Some(teacher))
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
