use askama::Template;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use axum_extra::extract::cookie::SignedCookieJar;

use crate::db::models::PostListing;
use crate::db::posts;
use crate::error::AppResult;
use crate::extractors::Caller;
use crate::flash;
use crate::routes::Nav;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/index.html")]
pub struct IndexTemplate {
    pub nav: Nav,
    pub posts: Vec<PostListing>,
}

#[derive(Template)]
#[template(path = "pages/about.html")]
pub struct AboutTemplate {
    pub nav: Nav,
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index).post(index))
        .route("/about", get(about).post(about))
}

/// Every post, oldest first. Public.
async fn index(
    State(state): State<AppState>,
    caller: Caller,
    jar: SignedCookieJar,
) -> AppResult<impl IntoResponse> {
    let posts = {
        let conn = state.db.get()?;
        posts::list_with_authors(&conn)?
    };
    let (jar, flashes) = flash::take(jar);

    Ok((
        jar,
        Html(IndexTemplate {
            nav: Nav::new(&caller, flashes),
            posts,
        }),
    ))
}

async fn about(caller: Caller, jar: SignedCookieJar) -> impl IntoResponse {
    let (jar, flashes) = flash::take(jar);
    (
        jar,
        Html(AboutTemplate {
            nav: Nav::new(&caller, flashes),
        }),
    )
}
