use rusqlite::Connection;
use std::collections::HashMap;
use std::path::Path;

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("listusers.sqlite3");
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS users(
            id INTEGER PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT NOT NULL,
            updated_at TEXT
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_users_last_name ON users(last_name)",
        [],
    )?;

    // One grade row per user, keyed directly on the host's user id.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS grades(
            userid INTEGER PRIMARY KEY,
            grade INTEGER NOT NULL,
            updated_at TEXT
        )",
        [],
    )?;

    Ok(())
}

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

pub fn users_upsert_all(conn: &Connection, users: &[UserRow]) -> rusqlite::Result<usize> {
    let mut written = 0;
    for u in users {
        written += conn.execute(
            "INSERT INTO users(id, first_name, last_name, email, updated_at)
             VALUES(?, ?, ?, ?, strftime('%Y-%m-%dT%H:%M:%SZ','now'))
             ON CONFLICT(id) DO UPDATE SET
               first_name = excluded.first_name,
               last_name = excluded.last_name,
               email = excluded.email,
               updated_at = excluded.updated_at",
            (u.id, &u.first_name, &u.last_name, &u.email),
        )?;
    }
    Ok(written)
}

/// Full roster, last name ascending. Unbounded; the listing renders every row.
pub fn users_all(conn: &Connection) -> rusqlite::Result<Vec<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, first_name, last_name, email FROM users ORDER BY last_name ASC, id ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(UserRow {
            id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            email: row.get(3)?,
        })
    })?;
    rows.collect()
}

pub fn grade_exists(conn: &Connection, userid: i64) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM grades WHERE userid = ?",
        [userid],
        |r| r.get(0),
    )?;
    Ok(count > 0)
}

/// Atomic insert-or-update. The primary key on userid plus the conflict
/// clause guarantees at most one grade row per user even under concurrent
/// first writes.
pub fn grade_upsert(conn: &Connection, userid: i64, grade: i64) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO grades(userid, grade, updated_at)
         VALUES(?, ?, strftime('%Y-%m-%dT%H:%M:%SZ','now'))
         ON CONFLICT(userid) DO UPDATE SET
           grade = excluded.grade,
           updated_at = excluded.updated_at",
        (userid, grade),
    )?;
    Ok(())
}

pub fn grades_all(conn: &Connection) -> rusqlite::Result<HashMap<i64, i64>> {
    let mut stmt = conn.prepare("SELECT userid, grade FROM grades")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?;
    rows.collect()
}
