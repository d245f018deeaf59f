pub mod admin;
pub mod assets;
pub mod auth;
pub mod contact;
pub mod home;
pub mod posts;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::extractors::Caller;
use crate::flash::Flash;
use crate::state::AppState;

/// What the shared layout needs on every page.
pub struct Nav {
    pub logged_in: bool,
    pub is_admin: bool,
    pub username: String,
    pub flashes: Vec<Flash>,
}

impl Nav {
    pub fn new(caller: &Caller, flashes: Vec<Flash>) -> Self {
        let user = caller.user();
        Self {
            logged_in: user.is_some(),
            is_admin: user.is_some_and(|u| u.is_admin),
            username: user.map(|u| u.username.clone()).unwrap_or_default(),
            flashes,
        }
    }
}

/// The full application, ready to serve.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/assets/{*path}", get(assets::serve))
        .merge(home::router())
        .merge(auth::router())
        .merge(posts::router())
        .merge(admin::router())
        .merge(contact::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
