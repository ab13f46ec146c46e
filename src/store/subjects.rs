use super::fields;
use super::{query_ids, ClassRef, DeleteSummary, PersonRef, Scope};
use anyhow::Context;
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    #[serde(rename = "_id")]
    pub id: String,
    pub sub_name: String,
    pub sub_code: String,
    pub sessions: u32,
    pub sclass_name: ClassRef,
    pub school: String,
    pub teacher: Option<PersonRef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubject {
    pub sub_name: String,
    pub sub_code: String,
    #[serde(deserialize_with = "fields::number")]
    pub sessions: u32,
}

/// Body of `POST /SubjectCreate`: several subjects for one class.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSubjects {
    pub subjects: Vec<NewSubject>,
    #[serde(rename = "sclassName")]
    pub class_id: String,
    #[serde(rename = "adminID")]
    pub school_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(Vec<Subject>),
    DuplicateCode(String),
    ClassNotFound,
}

fn scope_column(scope: Scope<'_>) -> (&'static str, &str) {
    match scope {
        Scope::School(id) => ("school_id", id),
        Scope::Class(id) => ("sclass_id", id),
    }
}

const SELECT_SUBJECT: &str = "SELECT s.id, s.sub_name, s.sub_code, s.sessions, c.id, c.sclass_name,
        s.school_id, t.id, t.name
 FROM subjects s
 JOIN sclasses c ON c.id = s.sclass_id
 LEFT JOIN teachers t ON t.id = s.teacher_id";

fn map_subject(r: &rusqlite::Row<'_>) -> rusqlite::Result<Subject> {
    let teacher_id: Option<String> = r.get(7)?;
    let teacher_name: Option<String> = r.get(8)?;
    Ok(Subject {
        id: r.get(0)?,
        sub_name: r.get(1)?,
        sub_code: r.get(2)?,
        sessions: r.get(3)?,
        sclass_name: ClassRef {
            id: r.get(4)?,
            sclass_name: r.get(5)?,
        },
        school: r.get(6)?,
        teacher: match (teacher_id, teacher_name) {
            (Some(id), Some(name)) => Some(PersonRef { id, name }),
            _ => None,
        },
    })
}

fn list_sql(conn: &Connection, filter: &str, param: &str) -> anyhow::Result<Vec<Subject>> {
    let sql = format!("{} WHERE {} ORDER BY s.rowid", SELECT_SUBJECT, filter);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([param], map_subject)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn find_subject(conn: &Connection, id: &str) -> anyhow::Result<Option<Subject>> {
    let sql = format!("{} WHERE s.id = ?", SELECT_SUBJECT);
    let subject = conn.query_row(&sql, [id], map_subject).optional()?;
    Ok(subject)
}

pub fn list_by_school(conn: &Connection, school_id: &str) -> anyhow::Result<Vec<Subject>> {
    list_sql(conn, "s.school_id = ?", school_id)
}

pub fn list_by_class(conn: &Connection, class_id: &str) -> anyhow::Result<Vec<Subject>> {
    list_sql(conn, "s.sclass_id = ?", class_id)
}

/// Subjects of a class that no teacher has taken yet.
pub fn list_free(conn: &Connection, class_id: &str) -> anyhow::Result<Vec<Subject>> {
    list_sql(conn, "s.sclass_id = ? AND t.id IS NULL", class_id)
}

/// Inserts all subjects or none. Codes must be unique within the school,
/// including among the new subjects themselves.
pub fn create(conn: &Connection, batch: &NewSubjects) -> anyhow::Result<CreateOutcome> {
    let class_school: Option<String> = conn
        .query_row(
            "SELECT school_id FROM sclasses WHERE id = ?",
            [&batch.class_id],
            |r| r.get(0),
        )
        .optional()?;
    if class_school.as_deref() != Some(batch.school_id.as_str()) {
        return Ok(CreateOutcome::ClassNotFound);
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for s in &batch.subjects {
        let code = s.sub_code.trim();
        if !seen.insert(code) {
            return Ok(CreateOutcome::DuplicateCode(code.to_string()));
        }
        let exists: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM subjects WHERE sub_code = ? AND school_id = ?",
                (code, &batch.school_id),
                |r| r.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Ok(CreateOutcome::DuplicateCode(code.to_string()));
        }
    }

    let tx = conn.unchecked_transaction()?;
    let mut ids = Vec::with_capacity(batch.subjects.len());
    for s in &batch.subjects {
        let id = crate::db::new_id();
        tx.execute(
            "INSERT INTO subjects(id, sub_name, sub_code, sessions, sclass_id, school_id)
             VALUES(?, ?, ?, ?, ?, ?)",
            (
                &id,
                s.sub_name.trim(),
                s.sub_code.trim(),
                s.sessions,
                &batch.class_id,
                &batch.school_id,
            ),
        )
        .context("insert subject")?;
        ids.push(id);
    }
    tx.commit()?;

    let mut created = Vec::with_capacity(ids.len());
    for id in ids {
        created.push(find_subject(conn, &id)?.context("subject missing after insert")?);
    }
    Ok(CreateOutcome::Created(created))
}

/// Drops every trace of the given subjects: student results and attendance,
/// teacher assignments, then the subjects. Runs inside the caller's transaction.
fn purge_ids(conn: &Connection, ids: &[String]) -> anyhow::Result<usize> {
    for id in ids {
        conn.execute("DELETE FROM exam_results WHERE subject_id = ?", [id])
            .context("delete exam_results")?;
        conn.execute("DELETE FROM student_attendance WHERE subject_id = ?", [id])
            .context("delete student_attendance")?;
        conn.execute(
            "UPDATE teachers SET teach_subject_id = NULL WHERE teach_subject_id = ?",
            [id],
        )
        .context("unset teach_subject_id")?;
        conn.execute("DELETE FROM subjects WHERE id = ?", [id])
            .context("delete subject")?;
    }
    Ok(ids.len())
}

pub(crate) fn purge(conn: &Connection, scope: Scope<'_>) -> anyhow::Result<usize> {
    let (column, id) = scope_column(scope);
    let sql = format!("SELECT id FROM subjects WHERE {} = ? ORDER BY rowid", column);
    let ids = query_ids(conn, &sql, id)?;
    purge_ids(conn, &ids)
}

pub fn delete(conn: &Connection, id: &str) -> anyhow::Result<Option<Subject>> {
    let Some(subject) = find_subject(conn, id)? else {
        return Ok(None);
    };
    let tx = conn.unchecked_transaction()?;
    purge_ids(&tx, &[subject.id.clone()])?;
    tx.commit()?;
    Ok(Some(subject))
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
