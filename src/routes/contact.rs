use askama::Template;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Form, Router};
use axum_extra::extract::cookie::SignedCookieJar;

use crate::extractors::Caller;
use crate::flash;
use crate::forms::ContactForm;
use crate::mail::ContactMessage;
use crate::routes::home::Html;
use crate::routes::Nav;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/contact.html")]
struct ContactTemplate {
    nav: Nav,
    msg_sent: bool,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/contact", get(contact_page).post(send))
}

fn render(caller: &Caller, jar: SignedCookieJar, msg_sent: bool) -> impl IntoResponse {
    let (jar, flashes) = flash::take(jar);
    (
        jar,
        Html(ContactTemplate {
            nav: Nav::new(caller, flashes),
            msg_sent,
        }),
    )
}

async fn contact_page(caller: Caller, jar: SignedCookieJar) -> impl IntoResponse {
    render(&caller, jar, false)
}

/// The visitor always sees a confirmation. Delivery runs on its own task and
/// failures stay in the log.
async fn send(
    State(state): State<AppState>,
    caller: Caller,
    jar: SignedCookieJar,
    Form(form): Form<ContactForm>,
) -> impl IntoResponse {
    let message = ContactMessage {
        name: form.name,
        email: form.email,
        phone: form.phone,
        message: form.message,
    };
    let mailer = state.mailer.clone();
    tokio::spawn(async move {
        if let Err(e) = mailer.send_contact(&message).await {
            tracing::error!("Failed to send contact message: {}", e);
        }
    });
    render(&caller, jar, true)
}
