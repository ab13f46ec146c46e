//! Admin accounts. Each admin owns exactly one school, and the admin id is
//! the school id every other collection refers to.

use super::{students, subjects, teachers, LoginOutcome, Scope};
use crate::password;
use anyhow::Context;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub school_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
    pub school_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminLogin {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub school_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    Registered(Admin),
    DuplicateEmail,
    DuplicateSchoolName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated(Admin),
    NotFound,
    DuplicateEmail,
    DuplicateSchoolName,
}

fn taken(conn: &Connection, column: &str, value: &str, except_id: &str) -> anyhow::Result<bool> {
    let sql = format!("SELECT 1 FROM schools WHERE {} = ? AND id <> ?", column);
    let hit: Option<i64> = conn
        .query_row(&sql, (value, except_id), |r| r.get(0))
        .optional()?;
    Ok(hit.is_some())
}

pub fn find_admin(conn: &Connection, id: &str) -> anyhow::Result<Option<Admin>> {
    let admin = conn
        .query_row(
            "SELECT id, name, email, role, school_name FROM schools WHERE id = ?",
            [id],
            |r| {
                Ok(Admin {
                    id: r.get(0)?,
                    name: r.get(1)?,
                    email: r.get(2)?,
                    role: r.get(3)?,
                    school_name: r.get(4)?,
                })
            },
        )
        .optional()?;
    Ok(admin)
}

pub fn register(conn: &Connection, new: &NewAdmin) -> anyhow::Result<RegisterOutcome> {
    let email = new.email.trim();
    let school_name = new.school_name.trim();
    if taken(conn, "email", email, "")? {
        return Ok(RegisterOutcome::DuplicateEmail);
    }
    if taken(conn, "school_name", school_name, "")? {
        return Ok(RegisterOutcome::DuplicateSchoolName);
    }

    let hash = password::hash_password(&new.password)?;
    let id = crate::db::new_id();
    conn.execute(
        "INSERT INTO schools(id, name, email, password_hash, school_name) VALUES(?, ?, ?, ?, ?)",
        (&id, new.name.trim(), email, &hash, school_name),
    )
    .context("insert school")?;

    let admin = find_admin(conn, &id)?.context("school missing after insert")?;
    Ok(RegisterOutcome::Registered(admin))
}

pub fn login(conn: &Connection, creds: &AdminLogin) -> anyhow::Result<LoginOutcome<Admin>> {
    let row: Option<(String, String)> = conn
        .query_row(
            "SELECT id, password_hash FROM schools WHERE email = ?",
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
    Ok(match find_admin(conn, &id)? {
        Some(a) => LoginOutcome::LoggedIn(a),
        None => LoginOutcome::NotFound,
    })
}

pub fn update(conn: &Connection, id: &str, patch: &AdminPatch) -> anyhow::Result<UpdateOutcome> {
    if find_admin(conn, id)?.is_none() {
        return Ok(UpdateOutcome::NotFound);
    }

    let mut set_parts: Vec<&str> = Vec::new();
    let mut bind_values: Vec<Value> = Vec::new();
    if let Some(name) = &patch.name {
        set_parts.push("name = ?");
        bind_values.push(Value::Text(name.trim().to_string()));
    }
    if let Some(email) = &patch.email {
        let email = email.trim();
        if taken(conn, "email", email, id)? {
            return Ok(UpdateOutcome::DuplicateEmail);
        }
        set_parts.push("email = ?");
        bind_values.push(Value::Text(email.to_string()));
    }
    if let Some(school_name) = &patch.school_name {
        let school_name = school_name.trim();
        if taken(conn, "school_name", school_name, id)? {
            return Ok(UpdateOutcome::DuplicateSchoolName);
        }
        set_parts.push("school_name = ?");
        bind_values.push(Value::Text(school_name.to_string()));
    }
    if let Some(pw) = &patch.password {
        set_parts.push("password_hash = ?");
        bind_values.push(Value::Text(password::hash_password(pw)?));
    }

    if !set_parts.is_empty() {
        let sql = format!("UPDATE schools SET {} WHERE id = ?", set_parts.join(", "));
        bind_values.push(Value::Text(id.to_string()));
        conn.execute(&sql, params_from_iter(bind_values))
            .context("update school")?;
    }

    let admin = find_admin(conn, id)?.context("school missing after update")?;
    Ok(UpdateOutcome::Updated(admin))
}

/// Deletes the school and everything it owns, children first.
pub fn delete(conn: &Connection, id: &str) -> anyhow::Result<Option<Admin>> {
    let Some(admin) = find_admin(conn, id)? else {
        return Ok(None);
    };

    let tx = conn.unchecked_transaction()?;
    tx.execute("DELETE FROM complaints WHERE school_id = ?", [id])
        .context("delete complaints")?;
    tx.execute("DELETE FROM notices WHERE school_id = ?", [id])
        .context("delete notices")?;
    students::purge(&tx, Scope::School(id))?;
    subjects::purge(&tx, Scope::School(id))?;
    teachers::purge(&tx, Scope::School(id))?;
    tx.execute("DELETE FROM sclasses WHERE school_id = ?", [id])
        .context("delete sclasses")?;
    tx.execute("DELETE FROM schools WHERE id = ?", [id])
        .context("delete school")?;
    tx.commit()?;

    Ok(Some(admin))
}
