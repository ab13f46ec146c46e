//! Collections and the business rules that run over them.
//!
//! Every function takes a `&Connection` and returns `anyhow::Result`. Expected
//! non-results (not found, duplicates, caps) are modelled as outcome enums so
//! the HTTP layer can tell them apart from store failures.

pub mod classes;
pub mod complaints;
pub mod fields;
pub mod notices;
pub mod schools;
pub mod students;
pub mod subjects;
pub mod teachers;

use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolRef {
    #[serde(rename = "_id")]
    pub id: String,
    pub school_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRef {
    #[serde(rename = "_id")]
    pub id: String,
    pub sclass_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRef {
    #[serde(rename = "_id")]
    pub id: String,
    pub sub_name: String,
    pub sessions: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonRef {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Present" => Some(AttendanceStatus::Present),
            "Absent" => Some(AttendanceStatus::Absent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSummary {
    pub deleted_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSummary {
    pub matched_count: usize,
    pub modified_count: usize,
}

/// Result of a credential check shared by admins, teachers and students.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome<T> {
    LoggedIn(T),
    InvalidPassword,
    NotFound,
}

/// Owner used by the bulk operations: everything in a school, or in one class.
#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    School(&'a str),
    Class(&'a str),
}

pub(crate) fn row_exists(conn: &Connection, table: &str, id: &str) -> anyhow::Result<bool> {
    let sql = format!("SELECT 1 FROM {} WHERE id = ?", table);
    let hit: Option<i64> = conn.query_row(&sql, [id], |r| r.get(0)).optional()?;
    Ok(hit.is_some())
}

pub(crate) fn school_ref(conn: &Connection, id: &str) -> anyhow::Result<Option<SchoolRef>> {
    let r = conn
        .query_row(
            "SELECT id, school_name FROM schools WHERE id = ?",
            [id],
            |r| {
                Ok(SchoolRef {
                    id: r.get(0)?,
                    school_name: r.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(r)
}

pub(crate) fn class_ref(conn: &Connection, id: &str) -> anyhow::Result<Option<ClassRef>> {
    let r = conn
        .query_row(
            "SELECT id, sclass_name FROM sclasses WHERE id = ?",
            [id],
            |r| {
                Ok(ClassRef {
                    id: r.get(0)?,
                    sclass_name: r.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(r)
}

pub(crate) fn subject_ref(conn: &Connection, id: &str) -> anyhow::Result<Option<SubjectRef>> {
    let r = conn
        .query_row(
            "SELECT id, sub_name, sessions FROM subjects WHERE id = ?",
            [id],
            |r| {
                Ok(SubjectRef {
                    id: r.get(0)?,
                    sub_name: r.get(1)?,
                    sessions: r.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(r)
}

/// Ids selected by a query with a single text parameter, in row order.
pub(crate) fn query_ids(conn: &Connection, sql: &str, param: &str) -> anyhow::Result<Vec<String>> {
    let mut stmt = conn.prepare(sql)?;
    let ids = stmt
        .query_map([param], |r| r.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;
    use crate::db;

    pub struct Seed {
        pub conn: Connection,
        pub school_id: String,
        pub class_id: String,
    }

    /// One school with one class; passwords are stored unhashed since tests
    /// never log these rows in.
    pub fn seed() -> Seed {
        let conn = db::open_in_memory().expect("open db");
        conn.execute_batch(
            "INSERT INTO schools(id, name, email, password_hash, school_name)
               VALUES('school-1', 'Ada', 'ada@example.com', 'x', 'North High');
             INSERT INTO sclasses(id, sclass_name, school_id) VALUES('class-1', '7A', 'school-1');",
        )
        .expect("seed school");
        Seed {
            conn,
            school_id: "school-1".to_string(),
            class_id: "class-1".to_string(),
        }
    }

    pub fn add_class(conn: &Connection, id: &str, school_id: &str) {
        conn.execute(
            "INSERT INTO sclasses(id, sclass_name, school_id) VALUES(?, ?, ?)",
            (id, format!("class {id}"), school_id),
        )
        .expect("insert class");
    }

    pub fn add_school(conn: &Connection, id: &str) {
        conn.execute(
            "INSERT INTO schools(id, name, email, password_hash, school_name) VALUES(?, ?, ?, 'x', ?)",
            (id, id, format!("{id}@example.com"), format!("school {id}")),
        )
        .expect("insert school");
    }

    pub fn add_subject(conn: &Connection, id: &str, class_id: &str, sessions: u32) {
        let school_id: String = conn
            .query_row("SELECT school_id FROM sclasses WHERE id = ?", [class_id], |r| r.get(0))
            .expect("class school");
        conn.execute(
            "INSERT INTO subjects(id, sub_name, sub_code, sessions, sclass_id, school_id)
             VALUES(?, ?, ?, ?, ?, ?)",
            (id, format!("subject {id}"), format!("CODE-{id}"), sessions, class_id, school_id),
        )
        .expect("insert subject");
    }

    pub fn add_student(conn: &Connection, id: &str, class_id: &str, roll_num: i64) {
        let school_id: String = conn
            .query_row("SELECT school_id FROM sclasses WHERE id = ?", [class_id], |r| r.get(0))
            .expect("class school");
        conn.execute(
            "INSERT INTO students(id, name, roll_num, password_hash, school_id, sclass_id)
             VALUES(?, ?, ?, 'x', ?, ?)",
            (id, format!("student {id}"), roll_num, school_id, class_id),
        )
        .expect("insert student");
    }

    pub fn count(conn: &Connection, sql: &str) -> i64 {
        conn.query_row(sql, [], |r| r.get(0)).expect("count")
    }
}
