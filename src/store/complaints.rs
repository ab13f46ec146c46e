use super::fields;
use super::{row_exists, PersonRef};
use anyhow::{anyhow, Context};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Complaint {
    #[serde(rename = "_id")]
    pub id: String,
    /// `None` once the complaining student has been deleted.
    pub user: Option<PersonRef>,
    pub date: NaiveDate,
    pub complaint: String,
    pub school: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewComplaint {
    #[serde(rename = "user")]
    pub user_id: String,
    #[serde(deserialize_with = "fields::day")]
    pub date: NaiveDate,
    pub complaint: String,
    #[serde(rename = "school", alias = "adminID")]
    pub school_id: String,
}

const SELECT_COMPLAINT: &str = "SELECT c.id, st.id, st.name, c.date, c.complaint, c.school_id
 FROM complaints c
 LEFT JOIN students st ON st.id = c.user_id";

type RawComplaint = (String, Option<String>, Option<String>, String, String, String);

fn map_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<RawComplaint> {
    Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?))
}

fn into_complaint(raw: RawComplaint) -> anyhow::Result<Complaint> {
    let (id, user_id, user_name, date, complaint, school) = raw;
    let date = fields::parse_day(&date).ok_or_else(|| anyhow!("bad stored day {date:?}"))?;
    let user = match (user_id, user_name) {
        (Some(id), Some(name)) => Some(PersonRef { id, name }),
        _ => None,
    };
    Ok(Complaint {
        id,
        user,
        date,
        complaint,
        school,
    })
}

pub fn find_complaint(conn: &Connection, id: &str) -> anyhow::Result<Option<Complaint>> {
    let sql = format!("{} WHERE c.id = ?", SELECT_COMPLAINT);
    let raw = conn.query_row(&sql, [id], map_row).optional()?;
    raw.map(into_complaint).transpose()
}

pub fn list_by_school(conn: &Connection, school_id: &str) -> anyhow::Result<Vec<Complaint>> {
    let sql = format!("{} WHERE c.school_id = ? ORDER BY c.rowid", SELECT_COMPLAINT);
    let mut stmt = conn.prepare(&sql)?;
    let raw = stmt
        .query_map([school_id], map_row)?
        .collect::<Result<Vec<_>, _>>()?;
    raw.into_iter().map(into_complaint).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(Complaint),
    SchoolNotFound,
    StudentNotFound,
}

/// The complaining student must exist and belong to the school.
pub fn create(conn: &Connection, new: &NewComplaint) -> anyhow::Result<CreateOutcome> {
    if !row_exists(conn, "schools", &new.school_id)? {
        return Ok(CreateOutcome::SchoolNotFound);
    }
    let student_school: Option<String> = conn
        .query_row(
            "SELECT school_id FROM students WHERE id = ?",
            [&new.user_id],
            |r| r.get(0),
        )
        .optional()?;
    if student_school.as_deref() != Some(new.school_id.as_str()) {
        return Ok(CreateOutcome::StudentNotFound);
    }
    let id = crate::db::new_id();
    conn.execute(
        "INSERT INTO complaints(id, user_id, date, complaint, school_id) VALUES(?, ?, ?, ?, ?)",
        (
            &id,
            &new.user_id,
            fields::day_key(new.date),
            &new.complaint,
            &new.school_id,
        ),
    )
    .context("insert complaint")?;
    let complaint = find_complaint(conn, &id)?.context("complaint missing after insert")?;
    Ok(CreateOutcome::Created(complaint))
}
