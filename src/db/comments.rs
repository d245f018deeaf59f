use rusqlite::{params, Connection, Row};

use super::models::{Comment, CommentListing};
use super::{StoreError, StoreResult};

const COLUMNS: &str = "c.id, c.author_id, c.post_id, c.text";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        author_id: row.get(1)?,
        post_id: row.get(2)?,
        text: row.get(3)?,
    })
}

pub fn insert(conn: &Connection, author_id: i64, post_id: i64, text: &str) -> StoreResult<Comment> {
    conn.execute(
        "INSERT INTO comments (author_id, post_id, text) VALUES (?1, ?2, ?3)",
        params![author_id, post_id, text],
    )?;
    get(conn, conn.last_insert_rowid())
}

/// Fails with `StoreError::NotFound` when no comment has this id.
pub fn get(conn: &Connection, id: i64) -> StoreResult<Comment> {
    let comment = conn.query_row(
        &format!("SELECT {COLUMNS} FROM comments c WHERE c.id = ?1"),
        params![id],
        from_row,
    )?;
    Ok(comment)
}

/// Comments on a post in insertion order.
pub fn list_for_post(conn: &Connection, post_id: i64) -> StoreResult<Vec<CommentListing>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS}, u.username, u.email FROM comments c
         JOIN users u ON u.id = c.author_id
         WHERE c.post_id = ?1
         ORDER BY c.id"
    ))?;
    let listings = stmt
        .query_map(params![post_id], |row| {
            Ok(CommentListing {
                comment: from_row(row)?,
                author: row.get(4)?,
                author_email: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(listings)
}

pub fn delete(conn: &Connection, id: i64) -> StoreResult<()> {
    let deleted = conn.execute("DELETE FROM comments WHERE id = ?1", params![id])?;
    if deleted == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

pub(crate) fn delete_for_post(conn: &Connection, post_id: i64) -> StoreResult<usize> {
    let deleted = conn.execute("DELETE FROM comments WHERE post_id = ?1", params![post_id])?;
    Ok(deleted)
}
