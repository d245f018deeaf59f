use rusqlite::{params, Connection, OptionalExtension, Row};

use super::models::{NewUser, User};
use super::StoreResult;

const COLUMNS: &str = "id, username, email, password_hash, agree_to_terms, is_admin";

fn from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        agree_to_terms: row.get(4)?,
        is_admin: row.get(5)?,
    })
}

pub fn insert(conn: &Connection, user: &NewUser<'_>) -> StoreResult<User> {
    conn.execute(
        "INSERT INTO users (username, email, password_hash, agree_to_terms, is_admin)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user.username,
            user.email,
            user.password_hash,
            user.agree_to_terms,
            user.is_admin
        ],
    )?;
    get(conn, conn.last_insert_rowid())
}

/// Fails with `StoreError::NotFound` when no user has this id.
pub fn get(conn: &Connection, id: i64) -> StoreResult<User> {
    let user = conn.query_row(
        &format!("SELECT {COLUMNS} FROM users WHERE id = ?1"),
        params![id],
        from_row,
    )?;
    Ok(user)
}

pub fn find_by_email(conn: &Connection, email: &str) -> StoreResult<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM users WHERE email = ?1"),
            params![email],
            from_row,
        )
        .optional()?;
    Ok(user)
}

pub fn find_by_username(conn: &Connection, username: &str) -> StoreResult<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM users WHERE username = ?1"),
            params![username],
            from_row,
        )
        .optional()?;
    Ok(user)
}

pub fn set_admin(conn: &Connection, id: i64, is_admin: bool) -> StoreResult<()> {
    let updated = conn.execute(
        "UPDATE users SET is_admin = ?1 WHERE id = ?2",
        params![is_admin, id],
    )?;
    if updated == 0 {
        return Err(super::StoreError::NotFound);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{test_pool, StoreError};

    fn alice() -> NewUser<'static> {
        NewUser {
            username: "alice",
            email: "alice@example.com",
            password_hash: "hash",
            agree_to_terms: true,
            is_admin: false,
        }
    }

    #[test]
    fn insert_then_lookup_by_unique_fields() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let created = insert(&conn, &alice()).unwrap();
        assert!(!created.is_admin);

        let by_email = find_by_email(&conn, "alice@example.com").unwrap().unwrap();
        assert_eq!(by_email, created);
        let by_name = find_by_username(&conn, "alice").unwrap().unwrap();
        assert_eq!(by_name.id, created.id);
    }

    #[test]
    fn lookups_are_exact_match() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        insert(&conn, &alice()).unwrap();
        assert!(find_by_email(&conn, "ALICE@example.com").unwrap().is_none());
        assert!(find_by_username(&conn, "alic").unwrap().is_none());
    }

    #[test]
    fn get_missing_user_is_not_found() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        assert!(matches!(get(&conn, 42), Err(StoreError::NotFound)));
    }

    #[test]
    fn duplicate_username_conflicts() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        insert(&conn, &alice()).unwrap();
        let err = insert(
            &conn,
            &NewUser {
                email: "other@example.com",
                ..alice()
            },
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { ref field } if field == "username"));
    }

    #[test]
    fn set_admin_toggles_flag() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let user = insert(&conn, &alice()).unwrap();
        set_admin(&conn, user.id, true).unwrap();
        assert!(get(&conn, user.id).unwrap().is_admin);
        set_admin(&conn, user.id, false).unwrap();
        assert!(!get(&conn, user.id).unwrap().is_admin);
        assert!(matches!(set_admin(&conn, 999, true), Err(StoreError::NotFound)));
    }
}
