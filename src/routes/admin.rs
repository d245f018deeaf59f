use askama::Template;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Router};
use axum_extra::extract::cookie::SignedCookieJar;

use crate::accounts::{self, AccountError};
use crate::error::AppResult;
use crate::extractors::Caller;
use crate::flash::{self, Flash};
use crate::forms::ManageAdminForm;
use crate::routes::home::Html;
use crate::routes::Nav;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/make-admin.html")]
struct MakeAdminTemplate {
    nav: Nav,
    email: String,
    error: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/admin/manage", get(manage_page).post(manage))
}

fn render(caller: &Caller, jar: SignedCookieJar, extra: Option<Flash>, email: String, error: String) -> Response {
    let (jar, mut flashes) = flash::take(jar);
    flashes.extend(extra);
    (
        jar,
        Html(MakeAdminTemplate {
            nav: Nav::new(caller, flashes),
            email,
            error,
        }),
    )
        .into_response()
}

async fn manage_page(caller: Caller, jar: SignedCookieJar) -> AppResult<Response> {
    caller.require_admin()?;
    Ok(render(&caller, jar, None, String::new(), String::new()))
}

/// Outcomes are shown on the same page rather than after a redirect.
async fn manage(
    State(state): State<AppState>,
    caller: Caller,
    jar: SignedCookieJar,
    Form(form): Form<ManageAdminForm>,
) -> AppResult<Response> {
    let result = {
        let conn = state.db.get()?;
        accounts::manage_admin(&conn, &caller, &form, state.config.admin.email.as_deref())
    };

    match result {
        Ok(change) => {
            let note = change.map(|c| Flash::new(c.level(), c.message()));
            Ok(render(&caller, jar, note, form.email, String::new()))
        }
        Err(AccountError::Rejected(rejection)) => {
            Ok(render(&caller, jar, None, form.email, rejection.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}
