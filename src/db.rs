use anyhow::Context;
use rusqlite::Connection;
use std::path::Path;
use uuid::Uuid;

pub const DB_FILE_NAME: &str = "schoold.sqlite3";

pub fn open_db(data_dir: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("create data dir {}", data_dir.display()))?;
    let db_path = data_dir.join(DB_FILE_NAME);
    let conn = Connection::open(&db_path)
        .with_context(|| format!("open database {}", db_path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Fresh database with no file behind it. Used by tests.
pub fn open_in_memory() -> anyhow::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS schools(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'Admin',
            school_name TEXT NOT NULL UNIQUE
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS sclasses(
            id TEXT PRIMARY KEY,
            sclass_name TEXT NOT NULL,
            school_id TEXT NOT NULL,
            FOREIGN KEY(school_id) REFERENCES schools(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sclasses_school ON sclasses(school_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS teachers(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'Teacher',
            school_id TEXT NOT NULL,
            teach_subject_id TEXT,
            teach_sclass_id TEXT NOT NULL,
            FOREIGN KEY(school_id) REFERENCES schools(id),
            FOREIGN KEY(teach_sclass_id) REFERENCES sclasses(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_teachers_school ON teachers(school_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_teachers_sclass ON teachers(teach_sclass_id)",
        [],
    )?;

    // teacher_id is a soft reference: a teacher may be deleted before its subject.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS subjects(
            id TEXT PRIMARY KEY,
            sub_name TEXT NOT NULL,
            sub_code TEXT NOT NULL,
            sessions INTEGER NOT NULL,
            sclass_id TEXT NOT NULL,
            school_id TEXT NOT NULL,
            teacher_id TEXT,
            FOREIGN KEY(sclass_id) REFERENCES sclasses(id),
            FOREIGN KEY(school_id) REFERENCES schools(id),
            UNIQUE(school_id, sub_code)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_subjects_sclass ON subjects(sclass_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            roll_num INTEGER NOT NULL,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'Student',
            school_id TEXT NOT NULL,
            sclass_id TEXT NOT NULL,
            FOREIGN KEY(school_id) REFERENCES schools(id),
            FOREIGN KEY(sclass_id) REFERENCES sclasses(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_school ON students(school_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_roll ON students(school_id, sclass_id, roll_num)",
        [],
    )?;

    // Row order (rowid) is the order of the student's result/attendance lists.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS exam_results(
            student_id TEXT NOT NULL,
            subject_id TEXT NOT NULL,
            marks_obtained REAL NOT NULL,
            UNIQUE(student_id, subject_id),
            FOREIGN KEY(student_id) REFERENCES students(id),
            FOREIGN KEY(subject_id) REFERENCES subjects(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS student_attendance(
            student_id TEXT NOT NULL,
            subject_id TEXT NOT NULL,
            day TEXT NOT NULL,
            status TEXT NOT NULL,
            UNIQUE(student_id, subject_id, day),
            FOREIGN KEY(student_id) REFERENCES students(id),
            FOREIGN KEY(subject_id) REFERENCES subjects(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_student_attendance_subject ON student_attendance(subject_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS teacher_attendance(
            teacher_id TEXT NOT NULL,
            day TEXT NOT NULL,
            status TEXT NOT NULL,
            UNIQUE(teacher_id, day),
            FOREIGN KEY(teacher_id) REFERENCES teachers(id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS notices(
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            details TEXT NOT NULL,
            date TEXT NOT NULL,
            school_id TEXT NOT NULL,
            FOREIGN KEY(school_id) REFERENCES schools(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_notices_school ON notices(school_id)",
        [],
    )?;

    // user_id is kept even if the student is later deleted; it renders as null.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS complaints(
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            date TEXT NOT NULL,
            complaint TEXT NOT NULL,
            school_id TEXT NOT NULL,
            FOREIGN KEY(school_id) REFERENCES schools(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_complaints_school ON complaints(school_id)",
        [],
    )?;

    Ok(())
}
