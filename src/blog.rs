//! Post and comment lifecycle. Every operation authorizes the caller first.

use chrono::NaiveDate;
use rusqlite::Connection;
use sha2::{Digest, Sha256};

use crate::auth::{authorize, Action, Decision, Denial};
use crate::db::models::{Comment, Post, PostFields};
use crate::db::{comments, posts, users, StoreError};
use crate::error::AppError;
use crate::extractors::{Caller, CurrentUser};
use crate::forms::PostForm;

#[derive(Debug, thiserror::Error)]
pub enum BlogError {
    #[error("Access denied: {0:?}")]
    Denied(Denial),

    #[error("{0}")]
    Invalid(String),

    #[error("A post with this title already exists")]
    TitleTaken,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<BlogError> for AppError {
    fn from(err: BlogError) -> Self {
        match err {
            BlogError::Denied(Denial::LoginRequired) => AppError::LoginRequired,
            BlogError::Denied(_) => AppError::Forbidden,
            BlogError::Invalid(msg) => AppError::BadRequest(msg),
            BlogError::TitleTaken => AppError::Conflict("title".to_string()),
            BlogError::Store(e) => e.into(),
        }
    }
}

/// "Month DD, YYYY", for display only.
pub fn display_date(date: NaiveDate) -> String {
    date.format("%B %d, %Y").to_string()
}

/// Gravatar for an email address (SHA-256 of the normalised address).
pub fn avatar_url(email: &str) -> String {
    let digest = Sha256::digest(email.trim().to_lowercase().as_bytes());
    format!(
        "https://www.gravatar.com/avatar/{}?s=100&d=retro&r=g",
        hex::encode(digest)
    )
}

fn require<'c>(caller: &'c Caller, action: Action<'_>) -> Result<&'c CurrentUser, BlogError> {
    match authorize(caller, action) {
        Decision::Allow => caller.user().ok_or(BlogError::Denied(Denial::LoginRequired)),
        Decision::Deny(denial) => Err(BlogError::Denied(denial)),
    }
}

fn fields(form: &PostForm) -> PostFields<'_> {
    PostFields {
        title: form.title.trim(),
        subtitle: form.subtitle.trim(),
        body: &form.body,
        img_url: form.img_url.trim(),
    }
}

fn title_conflict(err: StoreError) -> BlogError {
    match err {
        StoreError::Conflict { field } if field == "title" => BlogError::TitleTaken,
        other => other.into(),
    }
}

pub fn create_post(
    conn: &Connection,
    caller: &Caller,
    form: &PostForm,
    today: NaiveDate,
) -> Result<Post, BlogError> {
    let admin = require(caller, Action::AdminOnly)?;
    form.validate().map_err(BlogError::Invalid)?;

    let post = posts::insert(conn, admin.id, &fields(form), &display_date(today))
        .map_err(title_conflict)?;
    tracing::info!(post_id = post.id, author = %admin.username, "Created post");
    Ok(post)
}

/// Overwrite a post's content. Authorship passes to the editing admin;
/// the original date stays.
pub fn edit_post(
    conn: &Connection,
    caller: &Caller,
    post_id: i64,
    form: &PostForm,
) -> Result<Post, BlogError> {
    let admin = require(caller, Action::AdminOnly)?;
    posts::get(conn, post_id)?;
    form.validate().map_err(BlogError::Invalid)?;

    let post = posts::update(conn, post_id, admin.id, &fields(form)).map_err(title_conflict)?;
    tracing::info!(post_id, editor = %admin.username, "Edited post");
    Ok(post)
}

/// Delete a post and all of its comments. Returns how many comments went with it.
pub fn delete_post(conn: &mut Connection, caller: &Caller, post_id: i64) -> Result<usize, BlogError> {
    let admin = require(caller, Action::AdminOnly)?;
    let removed = posts::delete(conn, post_id)?;
    tracing::info!(post_id, removed_comments = removed, by = %admin.username, "Deleted post");
    Ok(removed)
}

pub fn add_comment(
    conn: &Connection,
    caller: &Caller,
    post_id: i64,
    text: &str,
) -> Result<Comment, BlogError> {
    let user = require(caller, Action::RequireLogin)?;
    posts::get(conn, post_id)?;
    if text.trim().is_empty() {
        return Err(BlogError::Invalid("Comment cannot be empty".to_string()));
    }
    Ok(comments::insert(conn, user.id, post_id, text)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentDeletion {
    Deleted { post_id: i64 },
    /// Soft denial: the comment belongs to someone else and is kept.
    NotOwner { post_id: i64 },
}

pub fn delete_comment(
    conn: &Connection,
    caller: &Caller,
    comment_id: i64,
) -> Result<CommentDeletion, BlogError> {
    require(caller, Action::RequireLogin)?;
    let comment = comments::get(conn, comment_id)?;

    match authorize(caller, Action::CommentOwner(&comment)) {
        Decision::Allow => {
            comments::delete(conn, comment.id)?;
            Ok(CommentDeletion::Deleted {
                post_id: comment.post_id,
            })
        }
        Decision::Deny(_) => Ok(CommentDeletion::NotOwner {
            post_id: comment.post_id,
        }),
    }
}

/// A comment as the post page shows it.
#[derive(Debug, Clone)]
pub struct CommentView {
    pub id: i64,
    pub text: String,
    pub author: String,
    pub avatar_url: String,
    pub can_delete: bool,
}

#[derive(Debug, Clone)]
pub struct PostPage {
    pub post: Post,
    pub author: String,
    pub comments: Vec<CommentView>,
}

/// Load a post with its comments, marking those the caller owns.
pub fn post_page(conn: &Connection, caller: &Caller, post_id: i64) -> Result<PostPage, BlogError> {
    let post = posts::get(conn, post_id)?;
    let author = users::get(conn, post.author_id)?.username;
    let comments = comments::list_for_post(conn, post_id)?
        .into_iter()
        .map(|listing| {
            let can_delete = authorize(caller, Action::CommentOwner(&listing.comment)) == Decision::Allow;
            CommentView {
                id: listing.comment.id,
                text: listing.comment.text,
                avatar_url: avatar_url(&listing.author_email),
                author: listing.author,
                can_delete,
            }
        })
        .collect();

    Ok(PostPage {
        post,
        author,
        comments,
    })
}
