use super::fields;
use super::{row_exists, DeleteSummary};
use anyhow::{anyhow, Context};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub details: String,
    pub date: NaiveDate,
    pub school: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewNotice {
    pub title: String,
    pub details: String,
    #[serde(deserialize_with = "fields::day")]
    pub date: NaiveDate,
    #[serde(rename = "adminID", alias = "school")]
    pub school_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoticePatch {
    pub title: Option<String>,
    pub details: Option<String>,
    #[serde(default, deserialize_with = "fields::day_opt")]
    pub date: Option<NaiveDate>,
}

fn map_notice(r: &rusqlite::Row<'_>) -> rusqlite::Result<(String, String, String, String, String)> {
    Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?))
}

fn into_notice(raw: (String, String, String, String, String)) -> anyhow::Result<Notice> {
    let (id, title, details, date, school) = raw;
    let date = fields::parse_day(&date).ok_or_else(|| anyhow!("bad stored day {date:?}"))?;
    Ok(Notice {
        id,
        title,
        details,
        date,
        school,
    })
}

pub fn find_notice(conn: &Connection, id: &str) -> anyhow::Result<Option<Notice>> {
    let raw = conn
        .query_row(
            "SELECT id, title, details, date, school_id FROM notices WHERE id = ?",
            [id],
            map_notice,
        )
        .optional()?;
    raw.map(into_notice).transpose()
}

pub fn list_by_school(conn: &Connection, school_id: &str) -> anyhow::Result<Vec<Notice>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, details, date, school_id FROM notices WHERE school_id = ? ORDER BY rowid",
    )?;
    let raw = stmt
        .query_map([school_id], map_notice)?
        .collect::<Result<Vec<_>, _>>()?;
    raw.into_iter().map(into_notice).collect()
}

/// `None` when the school does not exist.
pub fn create(conn: &Connection, new: &NewNotice) -> anyhow::Result<Option<Notice>> {
    if !row_exists(conn, "schools", &new.school_id)? {
        return Ok(None);
    }
    let id = crate::db::new_id();
    conn.execute(
        "INSERT INTO notices(id, title, details, date, school_id) VALUES(?, ?, ?, ?, ?)",
        (
            &id,
            new.title.trim(),
            &new.details,
            fields::day_key(new.date),
            &new.school_id,
        ),
    )
    .context("insert notice")?;
    find_notice(conn, &id)
}

pub fn update(conn: &Connection, id: &str, patch: &NoticePatch) -> anyhow::Result<Option<Notice>> {
    if !row_exists(conn, "notices", id)? {
        return Ok(None);
    }
    let mut set_parts: Vec<&str> = Vec::new();
    let mut bind_values: Vec<Value> = Vec::new();
    if let Some(title) = &patch.title {
        set_parts.push("title = ?");
        bind_values.push(Value::Text(title.trim().to_string()));
    }
    if let Some(details) = &patch.details {
        set_parts.push("details = ?");
        bind_values.push(Value::Text(details.clone()));
    }
    if let Some(date) = patch.date {
        set_parts.push("date = ?");
        bind_values.push(Value::Text(fields::day_key(date)));
    }
    if !set_parts.is_empty() {
        let sql = format!("UPDATE notices SET {} WHERE id = ?", set_parts.join(", "));
        bind_values.push(Value::Text(id.to_string()));
        conn.execute(&sql, params_from_iter(bind_values))
            .context("update notice")?;
    }
    find_notice(conn, id)
}

pub fn delete(conn: &Connection, id: &str) -> anyhow::Result<Option<Notice>> {
    let Some(notice) = find_notice(conn, id)? else {
        return Ok(None);
    };
    conn.execute("DELETE FROM notices WHERE id = ?", [id])?;
    Ok(Some(notice))
}

pub fn delete_by_school(conn: &Connection, school_id: &str) -> anyhow::Result<DeleteSummary> {
    let deleted_count = conn.execute("DELETE FROM notices WHERE school_id = ?", [school_id])?;
    Ok(DeleteSummary { deleted_count })
}
