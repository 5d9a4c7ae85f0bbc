mod errors;
mod types;

pub use errors::DirectoryError;
pub use types::{NewUser, User, UserStatus, UserUpdate};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use tokio::sync::Mutex;
use tracing::debug;

/// Persistent record of every user the bot has seen, keyed by the platform
/// user id. Every call commits independently; the connection lock is the
/// atomicity unit.
pub struct UserDirectory {
    conn: Mutex<Connection>,
}

impl UserDirectory {
    pub fn open(path: &str) -> Result<Self, DirectoryError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, DirectoryError> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, DirectoryError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                full_name TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'active',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub async fn create(&self, user: NewUser) -> Result<(), DirectoryError> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn.lock().await;
        let result = conn.execute(
            "INSERT INTO users (id, full_name, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![user.id, user.full_name, user.status.as_str(), now, now],
        );
        match result {
            Ok(_) => {
                debug!(user_id = user.id, "user created");
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(DirectoryError::DuplicateKey)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get(&self, id: i64) -> Result<User, DirectoryError> {
        let conn = self.conn.lock().await;
        let row = conn
            .query_row(
                "SELECT id, full_name, status, created_at, updated_at
                 FROM users WHERE id = ?1",
                [id],
                raw_user,
            )
            .optional()?;
        match row {
            Some(raw) => decode_user(raw),
            None => Err(DirectoryError::NotFound),
        }
    }

    pub async fn exists(&self, id: i64) -> Result<bool, DirectoryError> {
        let conn = self.conn.lock().await;
        let found: Option<i64> = conn
            .query_row("SELECT 1 FROM users WHERE id = ?1", [id], |row| row.get(0))
            .optional()?;
        Ok(found.is_some())
    }

    /// Merges only the provided fields; `updated_at` is refreshed on every
    /// successful write.
    pub async fn update(&self, id: i64, update: UserUpdate) -> Result<(), DirectoryError> {
        if update.is_empty() {
            return Err(DirectoryError::EmptyUpdate);
        }

        let mut sets: Vec<&str> = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql + Send>> = Vec::new();
        if let Some(name) = &update.full_name {
            sets.push("full_name = ?");
            params.push(Box::new(name.clone()));
        }
        if let Some(status) = update.status {
            sets.push("status = ?");
            params.push(Box::new(status.as_str()));
        }
        sets.push("updated_at = ?");
        params.push(Box::new(Utc::now().to_rfc3339()));
        params.push(Box::new(id));

        let sql = format!("UPDATE users SET {} WHERE id = ?", sets.join(", "));
        let conn = self.conn.lock().await;
        let changed = conn.execute(
            &sql,
            rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())),
        )?;
        if changed == 0 {
            return Err(DirectoryError::NotFound);
        }
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), DirectoryError> {
        let conn = self.conn.lock().await;
        let changed = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(DirectoryError::NotFound);
        }
        Ok(())
    }

    /// Full snapshot; no ordering guarantee.
    pub async fn list_all(&self) -> Result<Vec<User>, DirectoryError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, full_name, status, created_at, updated_at FROM users",
        )?;
        let rows = stmt.query_map([], raw_user)?;
        rows.map(|raw| decode_user(raw?)).collect()
    }

    pub async fn list_by_status(&self, status: UserStatus) -> Result<Vec<User>, DirectoryError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, full_name, status, created_at, updated_at
             FROM users WHERE status = ?1",
        )?;
        let rows = stmt.query_map([status.as_str()], raw_user)?;
        rows.map(|raw| decode_user(raw?)).collect()
    }

    pub async fn count(&self) -> Result<u64, DirectoryError> {
        let conn = self.conn.lock().await;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

type RawUser = (i64, String, String, String, String);

fn raw_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawUser> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
    ))
}

fn decode_user(raw: RawUser) -> Result<User, DirectoryError> {
    let (id, full_name, status, created_at, updated_at) = raw;
    let status = UserStatus::parse(&status)
        .ok_or_else(|| DirectoryError::Corrupt(format!("unknown status '{status}'")))?;
    Ok(User {
        id,
        full_name,
        status,
        created_at: decode_timestamp(&created_at)?,
        updated_at: decode_timestamp(&updated_at)?,
    })
}

fn decode_timestamp(s: &str) -> Result<DateTime<Utc>, DirectoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DirectoryError::Corrupt(format!("bad timestamp '{s}': {e}")))
}
