mod common;

use axum::http::StatusCode;
use common::{TestApp, ADMIN_EMAIL, ADMIN_PASSWORD, PASSWORD};
use folio::bootstrap::{self, BootstrapOutcome};
use folio::db::users;

fn registration<'a>(
    username: &'a str,
    email: &'a str,
    password: &'a str,
    confirm: &'a str,
) -> Vec<(&'static str, &'a str)> {
    vec![
        ("username", username),
        ("email", email),
        ("password", password),
        ("confirm_password", confirm),
        ("agree_to_terms", "y"),
    ]
}

#[tokio::test]
async fn test_register_mismatched_passwords_creates_nothing() {
    let app = TestApp::new();
    let mut client = app.client();
    let before = app.count("SELECT COUNT(*) FROM users");

    let response = client
        .post_form(
            "/register",
            &registration("erin", "erin@example.com", PASSWORD, "Abcdef1?"),
        )
        .await;

    // Rejections re-render the form rather than redirecting
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Passwords Do not Match"));
    assert!(response.body.contains("erin@example.com"), "form keeps its values");
    assert_eq!(app.count("SELECT COUNT(*) FROM users"), before);
}

#[tokio::test]
async fn test_register_duplicate_email_regardless_of_username() {
    let app = TestApp::new();
    let mut client = app.client();

    let first = client
        .post_form(
            "/register",
            &registration("erin", "erin@example.com", PASSWORD, PASSWORD),
        )
        .await;
    assert_eq!(first.status, StatusCode::SEE_OTHER);

    let mut other = app.client();
    let second = other
        .post_form(
            "/register",
            &registration("frank", "erin@example.com", PASSWORD, PASSWORD),
        )
        .await;
    assert_eq!(second.status, StatusCode::OK);
    assert!(second.body.contains("This email address already exists"));
    assert!(!other.has_cookie("folio_session"));
}

#[tokio::test]
async fn test_register_password_complexity() {
    let app = TestApp::new();
    let mut client = app.client();

    let weak = client
        .post_form(
            "/register",
            &registration("erin", "erin@example.com", "abcdefgh", "abcdefgh"),
        )
        .await;
    assert_eq!(weak.status, StatusCode::OK);
    assert!(weak
        .body
        .contains("Password must contain at least one uppercase letter."));

    let strong = client
        .post_form(
            "/register",
            &registration("erin", "erin@example.com", PASSWORD, PASSWORD),
        )
        .await;
    assert_eq!(strong.status, StatusCode::SEE_OTHER);
    assert_eq!(strong.location.as_deref(), Some("/"));

    // Registration signs the new user in
    let home = client.get("/").await;
    assert!(home.body.contains("Log Out (erin)"));
}

#[tokio::test]
async fn test_register_requires_terms() {
    let app = TestApp::new();
    let mut client = app.client();

    let response = client
        .post_form(
            "/register",
            &[
                ("username", "erin"),
                ("email", "erin@example.com"),
                ("password", PASSWORD),
                ("confirm_password", PASSWORD),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response
        .body
        .contains("You must agree to the terms and conditions to register."));
}

#[tokio::test]
async fn test_login_failures_redirect_back_with_flash() {
    let app = TestApp::new();
    let user = app.seed_user("erin", false);
    let mut client = app.client();

    let unknown = client.login("nobody@example.com", PASSWORD).await;
    assert_eq!(unknown.status, StatusCode::SEE_OTHER);
    assert_eq!(unknown.location.as_deref(), Some("/login"));
    let page = client.get("/login").await;
    assert!(page.body.contains("That email does not exist, please try again."));

    // Flash is consumed by the page that showed it
    let again = client.get("/login").await;
    assert!(!again.body.contains("That email does not exist"));

    let wrong = client.login(&user.email, "Abcdef1?").await;
    assert_eq!(wrong.location.as_deref(), Some("/login"));
    let page = client.get("/login").await;
    assert!(page.body.contains("Password incorrect, please try again."));
    assert!(!client.has_cookie("folio_session"));
}

#[tokio::test]
async fn test_login_and_logout() {
    let app = TestApp::new();
    let user = app.seed_user("erin", false);
    let mut client = app.client();

    client.login_as(&user).await;
    assert!(client.has_cookie("folio_session"));
    assert!(client.get("/").await.body.contains("Log Out (erin)"));

    let response = client.get("/logout").await;
    assert_eq!(response.location.as_deref(), Some("/"));
    assert!(!client.has_cookie("folio_session"));
    assert_eq!(app.count("SELECT COUNT(*) FROM sessions"), 0);
    assert!(client.get("/").await.body.contains("Login"));
}

#[tokio::test]
async fn test_logging_in_again_replaces_the_old_session() {
    let app = TestApp::new();
    let user = app.seed_user("erin", false);
    let mut client = app.client();

    client.login_as(&user).await;
    client.login_as(&user).await;
    client.login_as(&user).await;
    assert_eq!(app.count("SELECT COUNT(*) FROM sessions"), 1);
    assert!(client.get("/").await.body.contains("Log Out (erin)"));

    // Stale rows from other browsers are swept on the next login
    app.pool
        .get()
        .unwrap()
        .execute(
            "UPDATE sessions SET expires_at = datetime('now', '-1 hours')",
            [],
        )
        .unwrap();
    let mut other = app.client();
    other.login_as(&user).await;
    assert_eq!(app.count("SELECT COUNT(*) FROM sessions"), 1);
    assert!(!client.get("/").await.body.contains("Log Out"));
}

#[tokio::test]
async fn test_forged_session_cookie_is_anonymous() {
    let app = TestApp::new();
    let mut client = app.client();
    client.set_cookie("folio_session", "not-a-signed-token");

    let home = client.get("/").await;
    assert_eq!(home.status, StatusCode::OK);
    assert!(!home.body.contains("Log Out"));
}

#[tokio::test]
async fn test_bootstrap_seeds_super_admin_once() {
    let app = TestApp::new();

    let conn = app.pool.get().unwrap();
    let admin = users::find_by_email(&conn, ADMIN_EMAIL).unwrap().unwrap();
    assert!(admin.is_admin);
    assert_eq!(app.count("SELECT COUNT(*) FROM blog_posts"), 1);

    let mut conn = app.pool.get().unwrap();
    let outcome = bootstrap::ensure_super_admin(&mut conn, &app.config.admin, 4).unwrap();
    assert_eq!(outcome, BootstrapOutcome::AlreadyPresent { user_id: admin.id });
    assert_eq!(
        app.count("SELECT COUNT(*) FROM users WHERE email = 'admin@email.com'"),
        1
    );
    assert_eq!(app.count("SELECT COUNT(*) FROM blog_posts"), 1);

    // The seeded credentials work through the login form
    let mut client = app.client();
    let response = client.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    assert_eq!(response.location.as_deref(), Some("/"));
}

#[tokio::test]
async fn test_admin_manage_grants_and_revokes() {
    let app = TestApp::new();
    let boss = app.seed_user("boss", true);
    let erin = app.seed_user("erin", false);
    let mut client = app.client();
    client.login_as(&boss).await;

    let granted = client
        .post_form(
            "/admin/manage",
            &[("email", erin.email.as_str()), ("make_admin", "Make Admin")],
        )
        .await;
    assert_eq!(granted.status, StatusCode::OK);
    assert!(granted.body.contains("User is now an admin."));
    assert!(granted.body.contains("flash-success"));
    assert_eq!(
        app.count("SELECT is_admin FROM users WHERE username = 'erin'"),
        1
    );

    let revoked = client
        .post_form(
            "/admin/manage",
            &[("email", erin.email.as_str()), ("remove_admin", "Remove Admin")],
        )
        .await;
    assert!(revoked.body.contains("User is no longer an admin."));
    assert!(revoked.body.contains("flash-danger"));

    let missing = client
        .post_form(
            "/admin/manage",
            &[("email", "ghost@example.com"), ("make_admin", "Make Admin")],
        )
        .await;
    assert!(missing.body.contains("User not found."));
    assert!(missing.body.contains("flash-warning"));
}

#[tokio::test]
async fn test_admin_manage_is_admin_only() {
    let app = TestApp::new();
    let erin = app.seed_user("erin", false);
    let mut client = app.client();

    assert_eq!(client.get("/admin/manage").await.status, StatusCode::FORBIDDEN);

    client.login_as(&erin).await;
    assert_eq!(client.get("/admin/manage").await.status, StatusCode::FORBIDDEN);
    let response = client
        .post_form(
            "/admin/manage",
            &[("email", erin.email.as_str()), ("make_admin", "Make Admin")],
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(
        app.count("SELECT is_admin FROM users WHERE username = 'erin'"),
        0
    );
}
