use axum_extra::extract::cookie::{Cookie, SameSite};
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::User;
use crate::db::{users, StoreResult};

/// Create a new session for a user. Returns the session token.
///
/// Expired rows are swept first so the table only grows with live sessions.
pub fn create_session(conn: &Connection, user_id: i64, hours: u64) -> StoreResult<String> {
    let pruned = prune_expired(conn)?;
    if pruned > 0 {
        tracing::debug!(pruned, "Removed expired sessions");
    }

    let token = generate_token();
    let id = uuid::Uuid::now_v7().to_string();

    conn.execute(
        "INSERT INTO sessions (id, user_id, token, expires_at) VALUES (?1, ?2, ?3, datetime('now', ?4))",
        params![id, user_id, token, format!("+{} hours", hours)],
    )?;

    Ok(token)
}

/// Resolve a token to its user, ignoring expired sessions.
pub fn lookup_user(conn: &Connection, token: &str) -> StoreResult<Option<User>> {
    let user_id: Option<i64> = conn
        .query_row(
            "SELECT user_id FROM sessions WHERE token = ?1 AND expires_at > datetime('now')",
            params![token],
            |row| row.get(0),
        )
        .optional()?;

    match user_id {
        Some(id) => Ok(Some(users::get(conn, id)?)),
        None => Ok(None),
    }
}

/// Delete every session whose expiry has passed. Returns how many went.
pub fn prune_expired(conn: &Connection) -> StoreResult<usize> {
    Ok(conn.execute(
        "DELETE FROM sessions WHERE expires_at <= datetime('now')",
        [],
    )?)
}

/// Delete a session by token.
pub fn delete_session(conn: &Connection, token: &str) -> StoreResult<()> {
    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

pub fn session_cookie(name: &str, token: String) -> Cookie<'static> {
    Cookie::build((name.to_string(), token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

pub fn clear_session_cookie(name: &str) -> Cookie<'static> {
    Cookie::build((name.to_string(), "")).path("/").build()
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}
