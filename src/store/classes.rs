use super::{query_ids, row_exists, students, subjects, teachers, DeleteSummary, SchoolRef, Scope};
use anyhow::Context;
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolClass {
    #[serde(rename = "_id")]
    pub id: String,
    pub sclass_name: String,
    pub school: SchoolRef,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClass {
    pub sclass_name: String,
    #[serde(rename = "adminID")]
    pub school_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(SchoolClass),
    DuplicateName,
    SchoolNotFound,
}

const SELECT_CLASS: &str = "SELECT c.id, c.sclass_name, s.id, s.school_name
 FROM sclasses c
 JOIN schools s ON s.id = c.school_id";

fn map_class(r: &rusqlite::Row<'_>) -> rusqlite::Result<SchoolClass> {
    Ok(SchoolClass {
        id: r.get(0)?,
        sclass_name: r.get(1)?,
        school: SchoolRef {
            id: r.get(2)?,
            school_name: r.get(3)?,
        },
    })
}

pub fn find_class(conn: &Connection, id: &str) -> anyhow::Result<Option<SchoolClass>> {
    let sql = format!("{} WHERE c.id = ?", SELECT_CLASS);
    Ok(conn.query_row(&sql, [id], map_class).optional()?)
}

pub fn list_by_school(conn: &Connection, school_id: &str) -> anyhow::Result<Vec<SchoolClass>> {
    let sql = format!("{} WHERE c.school_id = ? ORDER BY c.rowid", SELECT_CLASS);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([school_id], map_class)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn create(conn: &Connection, new: &NewClass) -> anyhow::Result<CreateOutcome> {
    if !row_exists(conn, "schools", &new.school_id)? {
        return Ok(CreateOutcome::SchoolNotFound);
    }
    let name = new.sclass_name.trim();
    let dup: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM sclasses WHERE sclass_name = ? AND school_id = ?",
            (name, &new.school_id),
            |r| r.get(0),
        )
        .optional()?;
    if dup.is_some() {
        return Ok(CreateOutcome::DuplicateName);
    }

    let id = crate::db::new_id();
    conn.execute(
        "INSERT INTO sclasses(id, sclass_name, school_id) VALUES(?, ?, ?)",
        (&id, name, &new.school_id),
    )
    .context("insert sclass")?;
    let class = find_class(conn, &id)?.context("class missing after insert")?;
    Ok(CreateOutcome::Created(class))
}

/// Students, subjects and teachers of the class go first, then the class.
/// Explicit deletes in dependency order; the schema has no ON DELETE CASCADE.
fn purge_class(conn: &Connection, class_id: &str) -> anyhow::Result<()> {
    students::purge(conn, Scope::Class(class_id))?;
    subjects::purge(conn, Scope::Class(class_id))?;
    teachers::purge(conn, Scope::Class(class_id))?;
    conn.execute("DELETE FROM sclasses WHERE id = ?", [class_id])
        .context("delete sclass")?;
    Ok(())
}

pub fn delete(conn: &Connection, id: &str) -> anyhow::Result<Option<SchoolClass>> {
    let Some(class) = find_class(conn, id)? else {
        return Ok(None);
    };
    let tx = conn.unchecked_transaction()?;
    purge_class(&tx, id)?;
    tx.commit()?;
    Ok(Some(class))
}

pub fn delete_by_school(conn: &Connection, school_id: &str) -> anyhow::Result<DeleteSummary> {
    let ids = query_ids(
        conn,
        "SELECT id FROM sclasses WHERE school_id = ? ORDER BY rowid",
        school_id,
    )?;
    let tx = conn.unchecked_transaction()?;
    for id in &ids {
        purge_class(&tx, id)?;
    }
    tx.commit()?;
    Ok(DeleteSummary {
        deleted_count: ids.len(),
    })
}
