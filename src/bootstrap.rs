//! Seeds the super-admin account at startup.
//!
//! Idempotence is keyed on the configured email: once a user with that
//! email exists, later runs change nothing, across restarts too.

use chrono::Local;
use rusqlite::Connection;

use crate::auth::password::hash_password;
use crate::blog::display_date;
use crate::config::AdminConfig;
use crate::db::models::{NewUser, PostFields};
use crate::db::{posts, users, StoreError};

const SAMPLE_TITLE: &str = "This is a Title";
const SAMPLE_SUBTITLE: &str = "This is a Subtitle";
const SAMPLE_BODY: &str = "<p>Lorem ipsum dolor sit amet, consectetur adipiscing elit. \
Suspendisse et elementum tellus. Morbi at luctus tellus.</p>";
const SAMPLE_IMG_URL: &str = "https://images.unsplash.com/photo-1499750310107-5fef28a66643?w=640";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// No super-admin email configured.
    Skipped,
    AlreadyPresent { user_id: i64 },
    /// The email is taken by an account that is not an admin. It is left alone.
    HeldByNonAdmin { user_id: i64 },
    Created { user_id: i64, post_id: i64 },
}

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Hash(#[from] bcrypt::BcryptError),
}

/// Make sure the super-admin exists, creating it and a sample post together
/// if it does not. Either both rows are written or neither is.
pub fn ensure_super_admin(
    conn: &mut Connection,
    admin: &AdminConfig,
    bcrypt_cost: u32,
) -> Result<BootstrapOutcome, BootstrapError> {
    let Some(email) = admin.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) else {
        tracing::warn!("No super-admin email configured; skipping admin bootstrap");
        return Ok(BootstrapOutcome::Skipped);
    };

    let tx = conn.transaction().map_err(StoreError::from)?;

    if let Some(existing) = users::find_by_email(&tx, email)? {
        if !existing.is_admin {
            tracing::warn!(
                username = %existing.username,
                "Super-admin email {} belongs to an account without admin rights; leaving it as is",
                email
            );
            return Ok(BootstrapOutcome::HeldByNonAdmin {
                user_id: existing.id,
            });
        }
        tracing::info!("Super-admin {} already present", email);
        return Ok(BootstrapOutcome::AlreadyPresent {
            user_id: existing.id,
        });
    }

    let password_hash = hash_password(&admin.password, bcrypt_cost)?;
    let user = users::insert(
        &tx,
        &NewUser {
            username: &admin.username,
            email,
            password_hash: &password_hash,
            agree_to_terms: true,
            is_admin: true,
        },
    )?;
    let post = posts::insert(
        &tx,
        user.id,
        &PostFields {
            title: SAMPLE_TITLE,
            subtitle: SAMPLE_SUBTITLE,
            body: SAMPLE_BODY,
            img_url: SAMPLE_IMG_URL,
        },
        &display_date(Local::now().date_naive()),
    )?;
    tx.commit().map_err(StoreError::from)?;

    tracing::info!("Created super-admin {} with a sample post", email);
    Ok(BootstrapOutcome::Created {
        user_id: user.id,
        post_id: post.id,
    })
}
