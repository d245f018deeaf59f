#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub agree_to_terms: bool,
    pub is_admin: bool,
}

#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub agree_to_terms: bool,
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub subtitle: String,
    /// Display date, e.g. "October 18, 2026". Not meant to be parsed.
    pub date: String,
    pub body: String,
    pub img_url: String,
}

/// Editable columns of a post. `date` and `author_id` are set by the caller.
#[derive(Debug, Clone)]
pub struct PostFields<'a> {
    pub title: &'a str,
    pub subtitle: &'a str,
    pub body: &'a str,
    pub img_url: &'a str,
}

/// A post joined with its author's username.
#[derive(Debug, Clone)]
pub struct PostListing {
    pub post: Post,
    pub author: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: i64,
    pub author_id: i64,
    pub post_id: i64,
    pub text: String,
}

/// A comment joined with the author fields the post page displays.
#[derive(Debug, Clone)]
pub struct CommentListing {
    pub comment: Comment,
    pub author: String,
    pub author_email: String,
}
