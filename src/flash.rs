//! One-shot messages carried across a redirect in a signed cookie.

use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use serde::{Deserialize, Serialize};

const FLASH_COOKIE: &str = "folio_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Success,
    Warning,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: Level,
    pub message: String,
}

impl Flash {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self.level {
            Level::Info => "flash-info",
            Level::Success => "flash-success",
            Level::Warning => "flash-warning",
            Level::Danger => "flash-danger",
        }
    }
}

/// Queue a message for the next rendered page.
pub fn push(jar: SignedCookieJar, level: Level, message: impl Into<String>) -> SignedCookieJar {
    let mut queued = read(&jar);
    queued.push(Flash::new(level, message));
    match encode(&queued) {
        Some(value) => jar.add(
            Cookie::build((FLASH_COOKIE, value))
                .http_only(true)
                .same_site(SameSite::Lax)
                .path("/")
                .build(),
        ),
        None => jar,
    }
}

/// Drain queued messages, clearing the cookie if there was one.
pub fn take(jar: SignedCookieJar) -> (SignedCookieJar, Vec<Flash>) {
    if jar.get(FLASH_COOKIE).is_none() {
        return (jar, Vec::new());
    }
    let queued = read(&jar);
    let jar = jar.remove(Cookie::build(FLASH_COOKIE).path("/").build());
    (jar, queued)
}

fn read(jar: &SignedCookieJar) -> Vec<Flash> {
    jar.get(FLASH_COOKIE)
        .and_then(|cookie| decode(cookie.value()))
        .unwrap_or_default()
}

// Hex keeps arbitrary message text inside the cookie value grammar.
fn encode(flashes: &[Flash]) -> Option<String> {
    serde_json::to_vec(flashes).ok().map(hex::encode)
}

fn decode(value: &str) -> Option<Vec<Flash>> {
    let bytes = hex::decode(value).ok()?;
    serde_json::from_slice(&bytes).ok()
}
