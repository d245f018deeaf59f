//! Registration and credential checks.

use rusqlite::Connection;
use std::fmt;

use crate::auth::guard::{authorize, Action, Decision, Denial};
use crate::auth::password::{hash_password, verify_password};
use crate::db::models::{NewUser, User};
use crate::db::{users, StoreError};
use crate::error::AppError;
use crate::extractors::Caller;
use crate::flash::Level;
use crate::forms::{
    check_password_complexity, LoginForm, ManageAdminForm, PasswordRule, RegisterForm,
};

/// Why an account operation was refused. Shown to the visitor as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Invalid(String),
    PasswordMismatch,
    EmailTaken,
    UsernameTaken,
    TermsNotAccepted,
    WeakPassword(PasswordRule),
    UnknownEmail,
    WrongPassword,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Invalid(msg) => f.write_str(msg),
            Rejection::PasswordMismatch => f.write_str("Passwords Do not Match"),
            Rejection::EmailTaken => f.write_str("This email address already exists"),
            Rejection::UsernameTaken => {
                f.write_str("This username already exists. Please pick another one")
            }
            Rejection::TermsNotAccepted => {
                f.write_str("You must agree to the terms and conditions to register.")
            }
            Rejection::WeakPassword(rule) => fmt::Display::fmt(rule, f),
            Rejection::UnknownEmail => f.write_str("That email does not exist, please try again."),
            Rejection::WrongPassword => f.write_str("Password incorrect, please try again."),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("{0}")]
    Rejected(Rejection),

    #[error("Not allowed")]
    Denied(Denial),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Hash(#[from] bcrypt::BcryptError),
}

impl From<Rejection> for AccountError {
    fn from(rejection: Rejection) -> Self {
        AccountError::Rejected(rejection)
    }
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Rejected(rejection) => AppError::BadRequest(rejection.to_string()),
            AccountError::Denied(Denial::LoginRequired) => AppError::LoginRequired,
            AccountError::Denied(_) => AppError::Forbidden,
            AccountError::Store(e) => e.into(),
            AccountError::Hash(e) => e.into(),
        }
    }
}

/// Validate and persist a new account.
///
/// Checks run in a fixed order and stop at the first failure: password
/// confirmation, email uniqueness, username uniqueness, terms, then
/// password complexity. The uniqueness lookups only produce a friendlier
/// message; the table constraints are what actually guarantee it, and a
/// constraint hit from a concurrent registration is reported the same way.
pub fn register(conn: &Connection, form: &RegisterForm, bcrypt_cost: u32) -> Result<User, AccountError> {
    form.validate().map_err(Rejection::Invalid)?;

    let email = form.email.trim();
    let username = form.username.trim();

    if form.password != form.confirm_password {
        return Err(Rejection::PasswordMismatch.into());
    }
    if users::find_by_email(conn, email)?.is_some() {
        return Err(Rejection::EmailTaken.into());
    }
    if users::find_by_username(conn, username)?.is_some() {
        return Err(Rejection::UsernameTaken.into());
    }
    if !form.agreed() {
        return Err(Rejection::TermsNotAccepted.into());
    }
    check_password_complexity(&form.password).map_err(Rejection::WeakPassword)?;

    let password_hash = hash_password(&form.password, bcrypt_cost)?;
    let created = users::insert(
        conn,
        &NewUser {
            username,
            email,
            password_hash: &password_hash,
            agree_to_terms: true,
            is_admin: false,
        },
    );

    match created {
        Ok(user) => {
            tracing::info!(username = %user.username, "Registered new user");
            Ok(user)
        }
        Err(StoreError::Conflict { field }) if field == "email" => Err(Rejection::EmailTaken.into()),
        Err(StoreError::Conflict { field }) if field == "username" => {
            Err(Rejection::UsernameTaken.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Resolve credentials to a user.
pub fn login(conn: &Connection, form: &LoginForm) -> Result<User, AccountError> {
    form.validate().map_err(Rejection::Invalid)?;

    let user = users::find_by_email(conn, form.email.trim())?.ok_or(Rejection::UnknownEmail)?;
    if !verify_password(&form.password, &user.password_hash) {
        tracing::info!(username = %user.username, "Rejected login with wrong password");
        return Err(Rejection::WrongPassword.into());
    }

    tracing::info!(username = %user.username, "User logged in");
    Ok(user)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminChange {
    Granted,
    Revoked,
    UserNotFound,
}

impl AdminChange {
    pub fn message(self) -> &'static str {
        match self {
            AdminChange::Granted => "User is now an admin.",
            AdminChange::Revoked => "User is no longer an admin.",
            AdminChange::UserNotFound => "User not found.",
        }
    }

    pub fn level(self) -> Level {
        match self {
            AdminChange::Granted => Level::Success,
            AdminChange::Revoked => Level::Danger,
            AdminChange::UserNotFound => Level::Warning,
        }
    }
}

/// Grant or revoke admin rights for the account with `email`.
///
/// Callers must already be admins. When both buttons were pressed, granting wins.
pub fn manage_admin(
    conn: &Connection,
    caller: &Caller,
    form: &ManageAdminForm,
    super_admin_email: Option<&str>,
) -> Result<Option<AdminChange>, AccountError> {
    let admin = match authorize(caller, Action::AdminOnly) {
        Decision::Allow => caller.user().ok_or(AccountError::Denied(Denial::Forbidden))?,
        Decision::Deny(denial) => return Err(AccountError::Denied(denial)),
    };
    form.validate().map_err(Rejection::Invalid)?;

    let grant = form.make_admin.is_some();
    if !grant && form.remove_admin.is_none() {
        return Ok(None);
    }

    let email = form.email.trim();
    let Some(target) = users::find_by_email(conn, email)? else {
        return Ok(Some(AdminChange::UserNotFound));
    };

    if !grant && super_admin_email.is_some_and(|s| s.trim().eq_ignore_ascii_case(email)) {
        tracing::warn!(by = %admin.username, "Revoking admin rights from the super-admin");
    }
    users::set_admin(conn, target.id, grant)?;
    tracing::info!(target = %target.username, grant, by = %admin.username, "Changed admin rights");

    Ok(Some(if grant {
        AdminChange::Granted
    } else {
        AdminChange::Revoked
    }))
}
