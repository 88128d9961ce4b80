use crate::Database;
use crate::models::UserRow;
use anyhow::Result;
use chrono::Utc;
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        full_name: &str,
        password_hash: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, full_name, password, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id, username, full_name, password_hash, Utc::now()],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    /// Returns false when no such user exists.
    pub fn set_user_active(&self, id: &str, active: bool) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET is_active = ?2 WHERE id = ?1",
                rusqlite::params![id, active],
            )?;
            Ok(changed == 1)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!(
        "SELECT id, username, full_name, password, is_active, created_at FROM users WHERE {} = ?1",
        column
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                full_name: row.get(2)?,
                password: row.get(3)?,
                is_active: row.get(4)?,
                created_at: row.get(5)?,
            })
        })
        .optional()?;

    Ok(row)
}

/// True when `err` wraps a SQLite UNIQUE or PRIMARY KEY violation.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<rusqlite::Error>()
        .is_some_and(sqlite_unique_violation)
}

pub(crate) fn sqlite_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_round_trip() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("u-1", "alice", "Alice Liddell", "$argon2id$hash").unwrap();

        let user = db.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(user.id, "u-1");
        assert_eq!(user.full_name, "Alice Liddell");
        assert!(user.is_active);
        assert!(db.get_user_by_id("u-1").unwrap().is_some());
        assert!(db.get_user_by_username("bob").unwrap().is_none());
    }

    #[test]
    fn duplicate_username_is_a_unique_violation() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("u-1", "alice", "", "h").unwrap();

        let err = db.create_user("u-2", "alice", "", "h").unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[test]
    fn users_can_be_deactivated() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("u-1", "alice", "", "h").unwrap();

        assert!(db.set_user_active("u-1", false).unwrap());
        assert!(!db.get_user_by_id("u-1").unwrap().unwrap().is_active);
        assert!(!db.set_user_active("missing", false).unwrap());
    }
}
