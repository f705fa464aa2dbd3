//! Router-level tests for the validation and authentication pipeline.
//!
//! Everything here exercises paths that reject before any database work, so
//! the lazy test pool never actually connects.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use contactbook::{app::build_app, state::AppState};

fn app() -> Router {
    build_app(AppState::fake())
}

fn get(path: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("request")
}

fn post_form(path: &str, cookie: Option<&str>, body: String) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).expect("request")
}

fn session_cookie(res: &axum::http::Response<Body>) -> String {
    let set_cookie = res
        .headers()
        .get(header::SET_COOKIE)
        .expect("set-cookie header")
        .to_str()
        .expect("utf-8 cookie");
    set_cookie
        .split(';')
        .next()
        .expect("cookie pair")
        .to_string()
}

async fn body_json(res: axum::http::Response<Body>) -> serde_json::Value {
    let bytes = res.into_body().collect().await.expect("body").to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

/// GET a form page and return (session cookie, csrf token).
async fn open_session(app: &Router, path: &str) -> (String, String) {
    let res = app.clone().oneshot(get(path, None)).await.expect("response");
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = session_cookie(&res);
    let page = body_json(res).await;
    let csrf = page["csrf_token"].as_str().expect("csrf token").to_string();
    assert!(!csrf.is_empty());
    (cookie, csrf)
}

#[tokio::test]
async fn protected_routes_redirect_to_login_without_session() {
    let app = app();
    for path in ["/dashboard", "/contact"] {
        let res = app.clone().oneshot(get(path, None)).await.expect("response");
        assert_eq!(res.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(res.headers()[header::LOCATION], "/login");
    }
}

#[tokio::test]
async fn delete_redirects_to_login_without_session() {
    let app = app();
    let res = app
        .oneshot(post_form(
            "/delete/00000000-0000-0000-0000-000000000000",
            None,
            "csrf_token=whatever".into(),
        ))
        .await
        .expect("response");
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers()[header::LOCATION], "/login");
}

#[tokio::test]
async fn login_page_issues_session_and_csrf_token() {
    let app = app();
    let (cookie, _) = open_session(&app, "/login").await;
    assert!(cookie.starts_with("sid="));
}

#[tokio::test]
async fn post_without_csrf_token_is_bad_request() {
    let app = app();
    let res = app
        .oneshot(post_form("/login", None, "username=alice&password=x".into()))
        .await
        .expect("response");
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn post_with_mismatched_csrf_token_is_bad_request() {
    let app = app();
    let (cookie, _) = open_session(&app, "/login").await;
    let res = app
        .oneshot(post_form(
            "/login",
            Some(&cookie),
            "csrf_token=not-the-right-one&username=alice&password=x".into(),
        ))
        .await
        .expect("response");
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_collects_all_validation_failures() {
    let app = app();
    let (cookie, csrf) = open_session(&app, "/login").await;
    let res = app
        .oneshot(post_form(
            "/login",
            Some(&cookie),
            format!("csrf_token={csrf}&username=&password="),
        ))
        .await
        .expect("response");
    assert_eq!(res.status(), StatusCode::OK);
    let page = body_json(res).await;
    let errors = page["errors"].as_array().expect("errors array");
    assert_eq!(errors.len(), 2);
}

#[tokio::test]
async fn login_rejects_sql_payload_before_touching_the_store() {
    let app = app();
    let (cookie, csrf) = open_session(&app, "/login").await;
    let res = app
        .oneshot(post_form(
            "/login",
            Some(&cookie),
            format!("csrf_token={csrf}&username=1%27+UNION+SELECT+%2A+FROM+users--&password=x"),
        ))
        .await
        .expect("response");
    assert_eq!(res.status(), StatusCode::OK);
    let page = body_json(res).await;
    let errors = page["errors"].as_array().expect("errors array");
    assert!(errors
        .iter()
        .any(|e| e.as_str().unwrap_or_default().contains("SQL keywords detected")));
}

#[tokio::test]
async fn login_rejects_html_payload_before_touching_the_store() {
    let app = app();
    let (cookie, csrf) = open_session(&app, "/login").await;
    let res = app
        .oneshot(post_form(
            "/login",
            Some(&cookie),
            format!("csrf_token={csrf}&username=%3Cscript%3Enoop%281%29%3C%2Fscript%3E&password=x"),
        ))
        .await
        .expect("response");
    assert_eq!(res.status(), StatusCode::OK);
    let page = body_json(res).await;
    let errors = page["errors"].as_array().expect("errors array");
    assert!(errors
        .iter()
        .any(|e| e.as_str().unwrap_or_default().contains("HTML tags not allowed")));
}

#[tokio::test]
async fn register_flashes_when_fields_are_missing() {
    let app = app();
    let (cookie, csrf) = open_session(&app, "/register").await;
    let res = app
        .clone()
        .oneshot(post_form(
            "/register",
            Some(&cookie),
            format!("csrf_token={csrf}&username=&password="),
        ))
        .await
        .expect("response");
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers()[header::LOCATION], "/register");

    // The flash shows once on the next page load, then drains.
    let res = app
        .clone()
        .oneshot(get("/register", Some(&cookie)))
        .await
        .expect("response");
    let page = body_json(res).await;
    let flashes = page["flashes"].as_array().expect("flashes array");
    assert!(flashes
        .iter()
        .any(|f| f.as_str() == Some("Username and password required!")));

    let res = app
        .oneshot(get("/register", Some(&cookie)))
        .await
        .expect("response");
    let page = body_json(res).await;
    assert!(page["flashes"].as_array().expect("flashes array").is_empty());
}

#[tokio::test]
async fn page_csrf_token_clears_the_delete_check() {
    let state = AppState::fake();
    let app = build_app(state.clone());

    let (cookie, _) = open_session(&app, "/login").await;
    let token = cookie.strip_prefix("sid=").expect("sid cookie");
    let token = state.sessions.login(token, uuid::Uuid::new_v4(), "alice");
    let cookie = format!("sid={token}");

    // Protected pages (dashboard included) all expose the same per-session
    // token; /contact is the one reachable without a database.
    let res = app
        .clone()
        .oneshot(get("/contact", Some(&cookie)))
        .await
        .expect("response");
    assert_eq!(res.status(), StatusCode::OK);
    let page = body_json(res).await;
    let csrf = page["csrf_token"].as_str().expect("csrf token").to_string();

    // A delete submitted with that token gets past the CSRF check; only the
    // store decides what happens after.
    let res = app
        .oneshot(post_form(
            &format!("/delete/{}", uuid::Uuid::new_v4()),
            Some(&cookie),
            format!("csrf_token={csrf}"),
        ))
        .await
        .expect("response");
    assert_ne!(res.status(), StatusCode::BAD_REQUEST);
    if let Some(location) = res.headers().get(header::LOCATION) {
        assert_eq!(location, "/dashboard");
    }
}

#[tokio::test]
async fn logout_clears_session_and_flashes_on_index() {
    let app = app();
    let (cookie, _) = open_session(&app, "/login").await;

    let res = app
        .clone()
        .oneshot(get("/logout", Some(&cookie)))
        .await
        .expect("response");
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers()[header::LOCATION], "/");

    let res = app.oneshot(get("/", Some(&cookie))).await.expect("response");
    assert_eq!(res.status(), StatusCode::OK);
    let page = body_json(res).await;
    let flashes = page["flashes"].as_array().expect("flashes array");
    assert_eq!(flashes.len(), 1);
    assert_eq!(flashes[0].as_str(), Some("Logged out successfully!"));
}

#[tokio::test]
async fn unknown_routes_get_a_generic_404() {
    let app = app();
    let res = app.oneshot(get("/no-such-page", None)).await.expect("response");
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let bytes = res.into_body().collect().await.expect("body").to_bytes();
    assert_eq!(&bytes[..], b"Not found");
}
