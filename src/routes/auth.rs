use askama::Template;
use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use axum_extra::extract::cookie::SignedCookieJar;

use crate::accounts::{self, AccountError};
use crate::auth::session;
use crate::db::models::User;
use crate::error::AppResult;
use crate::extractors::Caller;
use crate::flash::{self, Level};
use crate::forms::{LoginForm, RegisterForm};
use crate::routes::home::Html;
use crate::routes::Nav;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/register.html")]
struct RegisterTemplate {
    nav: Nav,
    username: String,
    email: String,
    error: String,
}

#[derive(Template)]
#[template(path = "pages/login.html")]
struct LoginTemplate {
    nav: Nav,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", get(register_page).post(register))
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout))
}

/// Open a session for `user` and attach its cookie. A session the browser
/// already held is closed so it cannot outlive the new one.
fn sign_in(state: &AppState, jar: SignedCookieJar, user: &User) -> AppResult<SignedCookieJar> {
    let conn = state.db.get()?;
    if let Some(previous) = jar.get(&state.config.auth.cookie_name) {
        session::delete_session(&conn, previous.value())?;
    }
    let token = session::create_session(&conn, user.id, state.config.auth.session_hours)?;
    Ok(jar.add(session::session_cookie(&state.config.auth.cookie_name, token)))
}

async fn register_page(caller: Caller, jar: SignedCookieJar) -> impl IntoResponse {
    let (jar, flashes) = flash::take(jar);
    (
        jar,
        Html(RegisterTemplate {
            nav: Nav::new(&caller, flashes),
            username: String::new(),
            email: String::new(),
            error: String::new(),
        }),
    )
}

/// Rejections re-render the form in place with the first failing rule.
async fn register(
    State(state): State<AppState>,
    caller: Caller,
    jar: SignedCookieJar,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    let result = {
        let conn = state.db.get()?;
        accounts::register(&conn, &form, state.config.auth.bcrypt_cost)
    };

    match result {
        Ok(user) => {
            let jar = sign_in(&state, jar, &user)?;
            Ok((jar, Redirect::to("/")).into_response())
        }
        Err(AccountError::Rejected(rejection)) => {
            let (jar, flashes) = flash::take(jar);
            Ok((
                jar,
                Html(RegisterTemplate {
                    nav: Nav::new(&caller, flashes),
                    username: form.username,
                    email: form.email,
                    error: rejection.to_string(),
                }),
            )
                .into_response())
        }
        Err(e) => Err(e.into()),
    }
}

async fn login_page(caller: Caller, jar: SignedCookieJar) -> impl IntoResponse {
    let (jar, flashes) = flash::take(jar);
    (
        jar,
        Html(LoginTemplate {
            nav: Nav::new(&caller, flashes),
        }),
    )
}

/// Failed logins go back to a fresh login page with the reason flashed.
async fn login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<LoginForm>,
) -> AppResult<(SignedCookieJar, Redirect)> {
    let result = {
        let conn = state.db.get()?;
        accounts::login(&conn, &form)
    };

    match result {
        Ok(user) => Ok((sign_in(&state, jar, &user)?, Redirect::to("/"))),
        Err(AccountError::Rejected(rejection)) => Ok((
            flash::push(jar, Level::Danger, rejection.to_string()),
            Redirect::to("/login"),
        )),
        Err(e) => Err(e.into()),
    }
}

async fn logout(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> AppResult<(SignedCookieJar, Redirect)> {
    let cookie_name = &state.config.auth.cookie_name;
    if let Some(cookie) = jar.get(cookie_name) {
        let conn = state.db.get()?;
        session::delete_session(&conn, cookie.value())?;
    }
    let jar = jar.remove(session::clear_session_cookie(cookie_name));
    Ok((jar, Redirect::to("/")))
}
