use askama::Template;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use axum_extra::extract::cookie::SignedCookieJar;
use chrono::Local;

use crate::auth::Denial;
use crate::blog::{self, BlogError, CommentDeletion, CommentView};
use crate::db::models::Post;
use crate::db::posts;
use crate::error::{AppError, AppResult};
use crate::extractors::Caller;
use crate::flash::{self, Level};
use crate::forms::{PostForm, PostPageForm};
use crate::routes::home::Html;
use crate::routes::Nav;
use crate::state::AppState;

const LOGIN_TO_COMMENT: &str = "You need to login or register to comment.";
const LOGIN_TO_DELETE_COMMENT: &str = "You need to login to delete comments.";
const NOT_YOUR_COMMENT: &str = "You can only delete your own comments.";

#[derive(Template)]
#[template(path = "pages/post.html")]
struct PostTemplate {
    nav: Nav,
    post: Post,
    author: String,
    comments: Vec<CommentView>,
    show_comment_form: bool,
    error: String,
}

#[derive(Template)]
#[template(path = "pages/make-post.html")]
struct MakePostTemplate {
    nav: Nav,
    heading: String,
    action: String,
    form: PostForm,
    error: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/post/{id}", get(show_post).post(post_action))
        .route("/delete_comment/{id}", get(delete_comment))
        .route("/new-post", get(new_post_page).post(create_post))
        .route("/edit-post/{id}", get(edit_post_page).post(edit_post))
        .route("/delete/{id}", get(delete_post))
}

/// Form-level problems become a message on the re-rendered page; anything
/// else ends the request.
fn form_message(err: BlogError) -> Result<String, AppError> {
    match err {
        BlogError::Invalid(msg) => Ok(msg),
        BlogError::TitleTaken => Ok(BlogError::TitleTaken.to_string()),
        other => Err(other.into()),
    }
}

fn login_redirect(jar: SignedCookieJar, message: &'static str) -> Response {
    (
        flash::push(jar, Level::Warning, message),
        Redirect::to("/login"),
    )
        .into_response()
}

fn render_post(
    state: &AppState,
    caller: &Caller,
    jar: SignedCookieJar,
    post_id: i64,
    show_comment_form: bool,
    error: String,
) -> AppResult<Response> {
    let page = {
        let conn = state.db.get()?;
        blog::post_page(&conn, caller, post_id)?
    };
    let (jar, flashes) = flash::take(jar);

    Ok((
        jar,
        Html(PostTemplate {
            nav: Nav::new(caller, flashes),
            post: page.post,
            author: page.author,
            comments: page.comments,
            show_comment_form,
            error,
        }),
    )
        .into_response())
}

async fn show_post(
    State(state): State<AppState>,
    caller: Caller,
    jar: SignedCookieJar,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    render_post(&state, &caller, jar, id, false, String::new())
}

/// The post page submits either the "comment" button, which reveals the
/// comment box, or the comment itself.
async fn post_action(
    State(state): State<AppState>,
    caller: Caller,
    jar: SignedCookieJar,
    Path(id): Path<i64>,
    Form(form): Form<PostPageForm>,
) -> AppResult<Response> {
    if let Some(text) = form.body {
        let added = {
            let conn = state.db.get()?;
            blog::add_comment(&conn, &caller, id, &text)
        };
        return match added {
            Ok(_) => Ok(Redirect::to(&format!("/post/{id}")).into_response()),
            Err(BlogError::Denied(Denial::LoginRequired)) => {
                Ok(login_redirect(jar, LOGIN_TO_COMMENT))
            }
            Err(err) => render_post(&state, &caller, jar, id, true, form_message(err)?),
        };
    }

    if form.comment_button.is_some() {
        if !caller.is_authenticated() {
            return Ok(login_redirect(jar, LOGIN_TO_COMMENT));
        }
        return render_post(&state, &caller, jar, id, true, String::new());
    }

    render_post(&state, &caller, jar, id, false, String::new())
}

async fn delete_comment(
    State(state): State<AppState>,
    caller: Caller,
    jar: SignedCookieJar,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let outcome = {
        let conn = state.db.get()?;
        blog::delete_comment(&conn, &caller, id)
    };

    match outcome {
        Ok(CommentDeletion::Deleted { post_id }) => {
            Ok(Redirect::to(&format!("/post/{post_id}")).into_response())
        }
        Ok(CommentDeletion::NotOwner { post_id }) => {
            tracing::info!(comment_id = id, "Refused to delete someone else's comment");
            Ok((
                flash::push(jar, Level::Warning, NOT_YOUR_COMMENT),
                Redirect::to(&format!("/post/{post_id}")),
            )
                .into_response())
        }
        Err(BlogError::Denied(Denial::LoginRequired)) => {
            Ok(login_redirect(jar, LOGIN_TO_DELETE_COMMENT))
        }
        Err(err) => Err(err.into()),
    }
}

fn render_make_post(
    caller: &Caller,
    jar: SignedCookieJar,
    heading: &str,
    action: String,
    form: PostForm,
    error: String,
) -> Response {
    let (jar, flashes) = flash::take(jar);
    (
        jar,
        Html(MakePostTemplate {
            nav: Nav::new(caller, flashes),
            heading: heading.to_string(),
            action,
            form,
            error,
        }),
    )
        .into_response()
}

async fn new_post_page(caller: Caller, jar: SignedCookieJar) -> AppResult<Response> {
    caller.require_admin()?;
    Ok(render_make_post(
        &caller,
        jar,
        "New Post",
        "/new-post".to_string(),
        PostForm::default(),
        String::new(),
    ))
}

async fn create_post(
    State(state): State<AppState>,
    caller: Caller,
    jar: SignedCookieJar,
    Form(form): Form<PostForm>,
) -> AppResult<Response> {
    let created = {
        let conn = state.db.get()?;
        blog::create_post(&conn, &caller, &form, Local::now().date_naive())
    };

    match created {
        Ok(_) => Ok(Redirect::to("/").into_response()),
        Err(err) => {
            let error = form_message(err)?;
            Ok(render_make_post(&caller, jar, "New Post", "/new-post".to_string(), form, error))
        }
    }
}

async fn edit_post_page(
    State(state): State<AppState>,
    caller: Caller,
    jar: SignedCookieJar,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    caller.require_admin()?;
    let post = {
        let conn = state.db.get()?;
        posts::get(&conn, id)?
    };
    let form = PostForm {
        title: post.title,
        subtitle: post.subtitle,
        img_url: post.img_url,
        body: post.body,
    };
    Ok(render_make_post(
        &caller,
        jar,
        "Edit Post",
        format!("/edit-post/{id}"),
        form,
        String::new(),
    ))
}

async fn edit_post(
    State(state): State<AppState>,
    caller: Caller,
    jar: SignedCookieJar,
    Path(id): Path<i64>,
    Form(form): Form<PostForm>,
) -> AppResult<Response> {
    let edited = {
        let conn = state.db.get()?;
        blog::edit_post(&conn, &caller, id, &form)
    };

    match edited {
        Ok(post) => Ok(Redirect::to(&format!("/post/{}", post.id)).into_response()),
        Err(err) => {
            let error = form_message(err)?;
            Ok(render_make_post(&caller, jar, "Edit Post", format!("/edit-post/{id}"), form, error))
        }
    }
}

async fn delete_post(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> AppResult<Redirect> {
    let mut conn = state.db.get()?;
    blog::delete_post(&mut conn, &caller, id)?;
    Ok(Redirect::to("/"))
}
