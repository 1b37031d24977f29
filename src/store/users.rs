//! Login accounts.
//!
//! Passwords are stored as `salt_hex$hash_hex`, where the hash is SHA-256
//! over the salt bytes followed by the password.

use rand::RngCore;
use rusqlite::{OptionalExtension, Row, params};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::error::{HrError, HrResult, is_unique_violation};
use crate::models::{Role, User};

use super::Database;

const SALT_LEN: usize = 16;

fn digest(salt: &[u8], password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hashes a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    format!("{}${}", hex::encode(salt), digest(&salt, password))
}

/// Checks a password against a stored `salt_hex$hash_hex` value.
///
/// Malformed stored values never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, hash_hex)) = stored.split_once('$') else {
        return false;
    };
    match hex::decode(salt_hex) {
        Ok(salt) => digest(&salt, password).eq_ignore_ascii_case(hash_hex),
        Err(_) => false,
    }
}

const USER_COLUMNS: &str = "id, username, role, employee_id";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        role: row.get("role")?,
        employee_id: row.get("employee_id")?,
    })
}

impl Database {
    /// Creates a login account, optionally linked to an employee.
    pub fn add_user(
        &self,
        username: &str,
        password: &str,
        role: Role,
        employee_id: Option<&str>,
    ) -> HrResult<i64> {
        let username = username.trim();
        if username.is_empty() {
            return Err(HrError::invalid("username", "must not be empty"));
        }
        if password.is_empty() {
            return Err(HrError::invalid("password", "must not be empty"));
        }
        if let Some(employee_id) = employee_id {
            self.get_employee(employee_id, true)?;
        }
        match self.conn().execute(
            "INSERT INTO users (username, password_hash, role, employee_id) VALUES (?1, ?2, ?3, ?4)",
            params![username, hash_password(password), role, employee_id],
        ) {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(HrError::invalid(
                    "username",
                    format!("'{}' or its employee already has an account", username),
                ));
            }
            Err(e) => return Err(e.into()),
        }
        let id = self.conn().last_insert_rowid();
        info!(user_id = id, username, role = %role, "user added");
        Ok(id)
    }

    /// Returns the user when the credentials match.
    pub fn authenticate(&self, username: &str, password: &str) -> HrResult<Option<User>> {
        let found: Option<(User, String)> = self
            .conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE username = ?1"),
                params![username.trim()],
                |r| Ok((user_from_row(r)?, r.get("password_hash")?)),
            )
            .optional()?;
        match found {
            Some((user, stored)) if verify_password(password, &stored) => Ok(Some(user)),
            Some(_) => {
                warn!(username, "failed login");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Looks up a user by id.
    pub fn get_user(&self, user_id: i64) -> HrResult<User> {
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![user_id],
                user_from_row,
            )
            .optional()?
            .ok_or_else(|| HrError::UserNotFound {
                user: user_id.to_string(),
            })
    }

    /// Looks up a user by login name.
    pub fn get_user_by_username(&self, username: &str) -> HrResult<Option<User>> {
        Ok(self
            .conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
                params![username.trim()],
                user_from_row,
            )
            .optional()?)
    }

    /// The account linked to an employee, if any.
    pub fn get_user_for_employee(&self, employee_id: &str) -> HrResult<Option<User>> {
        Ok(self
            .conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE employee_id = ?1"),
                params![employee_id],
                user_from_row,
            )
            .optional()?)
    }

    /// All users, by username.
    pub fn list_users(&self) -> HrResult<Vec<User>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY username"))?;
        let rows = stmt.query_map([], user_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Deletes a user account.
    pub fn delete_user(&self, user_id: i64) -> HrResult<()> {
        let deleted = self
            .conn()
            .execute("DELETE FROM users WHERE id = ?1", params![user_id])?;
        if deleted == 0 {
            return Err(HrError::UserNotFound {
                user: user_id.to_string(),
            });
        }
        info!(user_id, "user deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support;

    #[test]
    fn test_hash_verifies_and_salts_differ() {
        let a = hash_password("secret");
        let b = hash_password("secret");
        assert_ne!(a, b);
        assert!(verify_password("secret", &a));
        assert!(!verify_password("Secret", &a));
    }

    #[test]
    fn test_malformed_stored_hash_never_verifies() {
        assert!(!verify_password("x", "no-separator"));
        assert!(!verify_password("x", "zz$abcd"));
    }

    #[test]
    fn test_add_and_authenticate() {
        let db = test_support::db();
        let emp = test_support::employee(&db, "Kim", 3000);
        let id = db
            .add_user("kim", "pw", Role::DepartmentManager, Some(&emp))
            .unwrap();

        let user = db.authenticate("kim", "pw").unwrap().unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.role, Role::DepartmentManager);
        assert!(db.authenticate("kim", "wrong").unwrap().is_none());
        assert!(db.authenticate("nobody", "pw").unwrap().is_none());
        assert_eq!(db.get_user_for_employee(&emp).unwrap().unwrap().id, id);
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let db = test_support::db();
        assert!(matches!(
            db.add_user("admin", "x", Role::Employee, None),
            Err(HrError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_delete_user() {
        let db = test_support::db();
        let id = db.add_user("tmp", "x", Role::Employee, None).unwrap();
        db.delete_user(id).unwrap();
        assert!(matches!(db.get_user(id), Err(HrError::UserNotFound { .. })));
        assert_eq!(db.list_users().unwrap().len(), 1);
    }
}
