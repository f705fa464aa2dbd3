use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Json, Router,
};
use axum_extra::extract::CookieJar;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{FormPage, LoginForm, Page, RegisterForm},
        extractors::{session_cookie, SessionContext},
        password::{hash_password, verify_password},
        repo::User,
    },
    error::AppError,
    state::AppState,
    validate::validate_field,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/login", get(login_page).post(login))
        .route("/register", get(register_page).post(register))
        .route("/logout", get(logout))
}

async fn index(State(state): State<AppState>, session: SessionContext, jar: CookieJar) -> Response {
    let flashes = state.sessions.take_flashes(&session.token);
    (jar.add(session.cookie()), Json(Page { flashes })).into_response()
}

async fn login_page(
    State(state): State<AppState>,
    session: SessionContext,
    jar: CookieJar,
) -> Response {
    form_page(&state, &session, jar, Vec::new())
}

#[instrument(skip(state, session, jar, form))]
async fn login(
    State(state): State<AppState>,
    session: SessionContext,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    session.verify_csrf(&form.csrf_token)?;

    let mut errors = Vec::new();
    let username = match validate_field("username", &form.username, 3, 50) {
        Ok(v) => v,
        Err(e) => {
            errors.push(e.to_string());
            String::new()
        }
    };
    if form.password.is_empty() {
        errors.push("password: This field is required.".to_string());
    }
    if !errors.is_empty() {
        return Ok(form_page(&state, &session, jar, errors));
    }

    let user = User::find_by_username(&state.db, &username).await?;
    let verified = match &user {
        Some(u) => verify_password(&form.password, &u.password_hash),
        None => false,
    };

    if let (Some(user), true) = (user, verified) {
        // Fresh token on privilege change; the pre-login one is discarded.
        let token = state.sessions.login(&session.token, user.id, &user.username);
        state.sessions.push_flash(&token, "Login successful!");
        info!(user_id = %user.id, username = %user.username, "user logged in");
        Ok((jar.add(session_cookie(&token)), Redirect::to("/dashboard")).into_response())
    } else {
        // Same message whether the handle exists or the password is wrong.
        warn!(username = %username, "login rejected");
        state
            .sessions
            .push_flash(&session.token, "Invalid username or password!");
        Ok((jar.add(session.cookie()), Redirect::to("/login")).into_response())
    }
}

async fn register_page(
    State(state): State<AppState>,
    session: SessionContext,
    jar: CookieJar,
) -> Response {
    form_page(&state, &session, jar, Vec::new())
}

#[instrument(skip(state, session, jar, form))]
async fn register(
    State(state): State<AppState>,
    session: SessionContext,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    session.verify_csrf(&form.csrf_token)?;

    if form.username.trim().is_empty() || form.password.is_empty() {
        state
            .sessions
            .push_flash(&session.token, "Username and password required!");
        return Ok((jar.add(session.cookie()), Redirect::to("/register")).into_response());
    }

    let username = match validate_field("username", &form.username, 3, 50) {
        Ok(v) => v,
        Err(e) => return Ok(form_page(&state, &session, jar, vec![e.to_string()])),
    };

    let hash = hash_password(&form.password)?;
    match User::create(&state.db, &username, &hash).await {
        Ok(user) => {
            info!(user_id = %user.id, username = %user.username, "user registered");
            state
                .sessions
                .push_flash(&session.token, "Registration successful! Please login.");
            Ok((jar.add(session.cookie()), Redirect::to("/login")).into_response())
        }
        Err(AppError::Conflict) => {
            warn!(username = %username, "handle already taken");
            state
                .sessions
                .push_flash(&session.token, "Username already exists!");
            Ok((jar.add(session.cookie()), Redirect::to("/register")).into_response())
        }
        Err(e) => Err(e),
    }
}

#[instrument(skip(state, session, jar))]
async fn logout(State(state): State<AppState>, session: SessionContext, jar: CookieJar) -> Response {
    state.sessions.logout(&session.token);
    state
        .sessions
        .push_flash(&session.token, "Logged out successfully!");
    (jar.add(session.cookie()), Redirect::to("/")).into_response()
}

fn form_page(
    state: &AppState,
    session: &SessionContext,
    jar: CookieJar,
    errors: Vec<String>,
) -> Response {
    let flashes = state.sessions.take_flashes(&session.token);
    (
        jar.add(session.cookie()),
        Json(FormPage {
            csrf_token: session.record.csrf_token.clone(),
            flashes,
            errors,
        }),
    )
        .into_response()
}
