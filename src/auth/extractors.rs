use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

use crate::auth::session::{Identity, SessionRecord};
use crate::error::AppError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "sid";

/// The request's session, opened (or created) from the `sid` cookie.
/// Handlers must attach [`SessionContext::cookie`] to the response so the
/// client keeps the token.
pub struct SessionContext {
    pub token: String,
    pub record: SessionRecord,
}

/// HttpOnly, SameSite=Lax session cookie carrying `token`.
pub fn session_cookie(token: &str) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

impl SessionContext {
    pub fn cookie(&self) -> Cookie<'static> {
        session_cookie(&self.token)
    }

    /// Compare a submitted CSRF token against the session's. Every mutating
    /// route calls this before anything else; a miss is a 400.
    pub fn verify_csrf(&self, submitted: &str) -> Result<(), AppError> {
        if !submitted.is_empty() && submitted == self.record.csrf_token {
            Ok(())
        } else {
            Err(AppError::BadRequest)
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for SessionContext {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
        let (token, record) = state.sessions.open(token.as_deref());
        Ok(SessionContext { token, record })
    }
}

/// Authenticated identity for protected routes. Rejects anonymous (or
/// expired) sessions with a flash and a redirect to `/login`.
pub struct CurrentUser {
    pub user_id: Uuid,
    pub username: String,
    pub session: SessionContext,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = match SessionContext::from_request_parts(parts, state).await {
            Ok(s) => s,
            Err(never) => match never {},
        };
        match session.record.identity.clone() {
            Identity::Authenticated { user_id, username } => Ok(CurrentUser {
                user_id,
                username,
                session,
            }),
            Identity::Anonymous => {
                state
                    .sessions
                    .push_flash(&session.token, "Please login first!");
                let jar = CookieJar::new().add(session.cookie());
                Err((jar, AppError::Unauthorized).into_response())
            }
        }
    }
}
