use rusqlite::{params, Connection, Row};

use super::comments;
use super::models::{Post, PostFields, PostListing};
use super::{StoreError, StoreResult};

const COLUMNS: &str = "p.id, p.author_id, p.title, p.subtitle, p.date, p.body, p.img_url";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        author_id: row.get(1)?,
        title: row.get(2)?,
        subtitle: row.get(3)?,
        date: row.get(4)?,
        body: row.get(5)?,
        img_url: row.get(6)?,
    })
}

pub fn insert(
    conn: &Connection,
    author_id: i64,
    fields: &PostFields<'_>,
    date: &str,
) -> StoreResult<Post> {
    conn.execute(
        "INSERT INTO blog_posts (author_id, title, subtitle, date, body, img_url)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            author_id,
            fields.title,
            fields.subtitle,
            date,
            fields.body,
            fields.img_url
        ],
    )?;
    get(conn, conn.last_insert_rowid())
}

/// Fails with `StoreError::NotFound` when no post has this id.
pub fn get(conn: &Connection, id: i64) -> StoreResult<Post> {
    let post = conn.query_row(
        &format!("SELECT {COLUMNS} FROM blog_posts p WHERE p.id = ?1"),
        params![id],
        from_row,
    )?;
    Ok(post)
}

/// All posts in creation order, each with its author's username.
pub fn list_with_authors(conn: &Connection) -> StoreResult<Vec<PostListing>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS}, u.username FROM blog_posts p
         JOIN users u ON u.id = p.author_id
         ORDER BY p.id"
    ))?;
    let listings = stmt
        .query_map([], |row| {
            Ok(PostListing {
                post: from_row(row)?,
                author: row.get(7)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(listings)
}

/// Overwrites the editable fields and hands authorship to `author_id`.
/// The display date is left as it was.
pub fn update(
    conn: &Connection,
    id: i64,
    author_id: i64,
    fields: &PostFields<'_>,
) -> StoreResult<Post> {
    let updated = conn.execute(
        "UPDATE blog_posts
         SET title = ?1, subtitle = ?2, body = ?3, img_url = ?4, author_id = ?5
         WHERE id = ?6",
        params![
            fields.title,
            fields.subtitle,
            fields.body,
            fields.img_url,
            author_id,
            id
        ],
    )?;
    if updated == 0 {
        return Err(StoreError::NotFound);
    }
    get(conn, id)
}

/// Deletes a post together with all of its comments in one transaction.
/// Returns the number of comments removed.
pub fn delete(conn: &mut Connection, id: i64) -> StoreResult<usize> {
    let tx = conn.transaction()?;
    let removed = comments::delete_for_post(&tx, id)?;
    let deleted = tx.execute("DELETE FROM blog_posts WHERE id = ?1", params![id])?;
    if deleted == 0 {
        return Err(StoreError::NotFound);
    }
    tx.commit()?;
    Ok(removed)
}
