//! Permit/deny decisions for the three kinds of protected action.
//!
//! Each denial carries its own severity: `Forbidden` ends the request with
//! a 403, `NotOwner` is reported with a flash and a redirect, and
//! `LoginRequired` sends the caller to the login page.

use crate::db::models::Comment;
use crate::error::AppError;
use crate::extractors::{Caller, CurrentUser};

#[derive(Debug, Clone, Copy)]
pub enum Action<'a> {
    AdminOnly,
    CommentOwner(&'a Comment),
    RequireLogin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    Forbidden,
    NotOwner,
    LoginRequired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

pub fn authorize(caller: &Caller, action: Action<'_>) -> Decision {
    let user = caller.user();
    let allowed = match action {
        Action::AdminOnly => user.is_some_and(|u| u.is_admin),
        Action::CommentOwner(comment) => user.is_some_and(|u| u.id == comment.author_id),
        Action::RequireLogin => user.is_some(),
    };

    if allowed {
        return Decision::Allow;
    }
    Decision::Deny(match action {
        Action::AdminOnly => Denial::Forbidden,
        Action::CommentOwner(_) => Denial::NotOwner,
        Action::RequireLogin => Denial::LoginRequired,
    })
}

impl Caller {
    /// The admin behind this request, or a hard 403.
    pub fn require_admin(&self) -> Result<&CurrentUser, AppError> {
        match authorize(self, Action::AdminOnly) {
            Decision::Allow => self.user().ok_or(AppError::Forbidden),
            Decision::Deny(_) => Err(AppError::Forbidden),
        }
    }

    /// The signed-in user, or a redirect to the login page.
    pub fn require_login(&self) -> Result<&CurrentUser, AppError> {
        match authorize(self, Action::RequireLogin) {
            Decision::Allow => self.user().ok_or(AppError::LoginRequired),
            Decision::Deny(_) => Err(AppError::LoginRequired),
        }
    }
}
