use rusqlite::Connection;
use tracing::{info, warn};

use crate::models::{UserInfo, UserRow};
use crate::{password, Database, StoreError};

impl Database {
    pub fn create_user(
        &self,
        username: &str,
        plaintext: &str,
        role: &str,
    ) -> Result<UserInfo, StoreError> {
        let password_hash = password::hash(plaintext)?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, password_hash, role) VALUES (?1, ?2, ?3)",
                (username, &password_hash, role),
            )
            .map_err(|e| {
                warn!("User creation failed for '{}': {}", username, e);
                StoreError::from_insert(e, username)
            })?;

            let id = conn.last_insert_rowid();
            info!("User '{}' created with role '{}'", username, role);
            Ok(UserInfo {
                id,
                username: username.to_string(),
                role: role.to_string(),
            })
        })
    }

    /// Returns the user's identity when the password verifies.
    /// Unknown username and wrong password are indistinguishable to the caller.
    pub fn verify_user(
        &self,
        username: &str,
        plaintext: &str,
    ) -> Result<Option<UserInfo>, StoreError> {
        let row = self.with_conn(|conn| query_user_by_username(conn, username))?;

        let Some(row) = row else {
            return Ok(None);
        };

        if password::verify(plaintext, &row.password_hash) {
            Ok(Some(UserInfo {
                id: row.id,
                username: row.username,
                role: row.role,
            }))
        } else {
            Ok(None)
        }
    }

    pub fn list_users(&self) -> Result<Vec<UserInfo>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, username, role FROM users ORDER BY username")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(UserInfo {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        role: row.get(2)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_user(&self, id: i64) -> Result<Option<UserInfo>, StoreError> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, username, role FROM users WHERE id = ?1",
                    [id],
                    |row| {
                        Ok(UserInfo {
                            id: row.get(0)?,
                            username: row.get(1)?,
                            role: row.get(2)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn set_username(&self, id: i64, new_username: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let affected = conn.execute(
                "UPDATE users SET username = ?1 WHERE id = ?2",
                (new_username, id),
            )?;
            if affected == 0 {
                return Err(StoreError::NotFound(id));
            }
            info!("User {} renamed to '{}'", id, new_username);
            Ok(())
        })
    }

    pub fn set_role(&self, id: i64, new_role: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let affected =
                conn.execute("UPDATE users SET role = ?1 WHERE id = ?2", (new_role, id))?;
            if affected == 0 {
                return Err(StoreError::NotFound(id));
            }
            info!("User {} role set to '{}'", id, new_role);
            Ok(())
        })
    }

    pub fn set_password(&self, id: i64, plaintext: &str) -> Result<(), StoreError> {
        let password_hash = password::hash(plaintext)?;
        self.with_conn(|conn| {
            let affected = conn.execute(
                "UPDATE users SET password_hash = ?1 WHERE id = ?2",
                (&password_hash, id),
            )?;
            if affected == 0 {
                return Err(StoreError::NotFound(id));
            }
            info!("User {} password updated", id);
            Ok(())
        })
    }

    pub fn delete_user(&self, id: i64) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let affected = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            if affected == 0 {
                return Err(StoreError::NotFound(id));
            }
            info!("User {} deleted", id);
            Ok(())
        })
    }
}

fn query_user_by_username(
    conn: &Connection,
    username: &str,
) -> Result<Option<UserRow>, StoreError> {
    let mut stmt = conn
        .prepare("SELECT id, username, password_hash, role FROM users WHERE username = ?1")?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password_hash: row.get(2)?,
                role: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, StoreError>;
}

impl<T> OptionalExt<T> for Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>, StoreError> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, StoreError};

    fn store() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn create_then_verify() {
        let db = store();
        let created = db.create_user("alice", "correct horse", "user").unwrap();

        let verified = db.verify_user("alice", "correct horse").unwrap().unwrap();
        assert_eq!(verified, created);
        assert_eq!(verified.role, "user");
    }

    #[test]
    fn wrong_password_and_unknown_user_look_the_same() {
        let db = store();
        db.create_user("alice", "secret", "user").unwrap();

        assert!(db.verify_user("alice", "wrong").unwrap().is_none());
        assert!(db.verify_user("nobody", "secret").unwrap().is_none());
    }

    #[test]
    fn duplicate_username_fails_without_mutating() {
        let db = store();
        db.create_user("alice", "one", "user").unwrap();

        let err = db.create_user("alice", "two", "admin").unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(ref u) if u == "alice"));

        let users = db.list_users().unwrap();
        assert_eq!(users.len(), 1);
        // original password still verifies
        assert!(db.verify_user("alice", "one").unwrap().is_some());
    }

    #[test]
    fn list_is_ordered_by_username() {
        let db = store();
        db.create_user("carol", "pw", "user").unwrap();
        db.create_user("alice", "pw", "admin").unwrap();
        db.create_user("bob", "pw", "user").unwrap();

        let names: Vec<_> = db
            .list_users()
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, ["alice", "bob", "carol"]);
    }

    #[test]
    fn get_user_by_id() {
        let db = store();
        let created = db.create_user("alice", "pw", "user").unwrap();

        assert_eq!(db.get_user(created.id).unwrap().unwrap(), created);
        assert!(db.get_user(created.id + 100).unwrap().is_none());
    }

    #[test]
    fn mutations_by_id() {
        let db = store();
        let user = db.create_user("alice", "old-pw", "user").unwrap();

        db.set_username(user.id, "alicia").unwrap();
        db.set_role(user.id, "admin").unwrap();
        db.set_password(user.id, "new-pw").unwrap();

        let updated = db.get_user(user.id).unwrap().unwrap();
        assert_eq!(updated.username, "alicia");
        assert_eq!(updated.role, "admin");
        assert!(db.verify_user("alicia", "new-pw").unwrap().is_some());
        assert!(db.verify_user("alicia", "old-pw").unwrap().is_none());

        db.delete_user(user.id).unwrap();
        assert!(db.get_user(user.id).unwrap().is_none());
    }

    #[test]
    fn mutating_a_missing_id_is_not_found() {
        let db = store();

        assert!(matches!(
            db.set_username(42, "ghost").unwrap_err(),
            StoreError::NotFound(42)
        ));
        assert!(matches!(
            db.set_role(42, "admin").unwrap_err(),
            StoreError::NotFound(42)
        ));
        assert!(matches!(
            db.set_password(42, "pw").unwrap_err(),
            StoreError::NotFound(42)
        ));
        assert!(matches!(
            db.delete_user(42).unwrap_err(),
            StoreError::NotFound(42)
        ));
    }

    #[test]
    fn on_disk_store_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.db");

        {
            let db = Database::open(&path).unwrap();
            db.create_user("alice", "pw", "user").unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert!(db.verify_user("alice", "pw").unwrap().is_some());
    }
}
