use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use sha2::{Digest, Sha512};

use crate::config::Config;
use crate::mail::Mailer;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Everything a request handler needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<Config>,
    pub mailer: Arc<dyn Mailer>,
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(db: DbPool, config: Config, mailer: Arc<dyn Mailer>) -> Self {
        let cookie_key = match config.auth.secret_key.as_deref() {
            Some(secret) => derive_key(secret),
            None => {
                tracing::warn!("No secret key configured; sessions will not survive a restart");
                Key::generate()
            }
        };
        Self {
            db,
            config: Arc::new(config),
            mailer,
            cookie_key,
        }
    }
}

/// Stretch an arbitrary-length secret to the 64 bytes the signing key needs.
fn derive_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
