use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use axum_extra::extract::CookieJar;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{
        dto::FormPage,
        extractors::CurrentUser,
    },
    contacts::{
        dto::{ContactForm, ContactView, DashboardPage, DeleteForm},
        repo::Contact,
    },
    error::AppError,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/contact", get(contact_page).post(create_contact))
        .route("/delete/:contact_id", post(delete_contact))
}

#[instrument(skip(state, user, jar))]
async fn dashboard(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let contacts = Contact::list_by_owner(&state.db, user.user_id).await?;
    let flashes = state.sessions.take_flashes(&user.session.token);
    let page = DashboardPage {
        username: user.username,
        csrf_token: user.session.record.csrf_token.clone(),
        contacts: contacts.into_iter().map(ContactView::from).collect(),
        flashes,
    };
    Ok((jar.add(user.session.cookie()), Json(page)).into_response())
}

async fn contact_page(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: CookieJar,
) -> Response {
    contact_form_page(&state, &user, jar, Vec::new())
}

#[instrument(skip(state, user, jar, form))]
async fn create_contact(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: CookieJar,
    Form(form): Form<ContactForm>,
) -> Result<Response, AppError> {
    user.session.verify_csrf(&form.csrf_token)?;

    let fields = match form.validate() {
        Ok(fields) => fields,
        Err(errors) => {
            let messages = errors.iter().map(|e| e.to_string()).collect();
            return Ok(contact_form_page(&state, &user, jar, messages));
        }
    };

    let contact = Contact::create(&state.db, user.user_id, &fields).await?;
    info!(contact_id = %contact.id, owner_id = %user.user_id, "contact created");
    state
        .sessions
        .push_flash(&user.session.token, "Contact added successfully!");
    Ok((jar.add(user.session.cookie()), Redirect::to("/dashboard")).into_response())
}

#[instrument(skip(state, user, jar, form))]
async fn delete_contact(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: CookieJar,
    Path(contact_id): Path<Uuid>,
    Form(form): Form<DeleteForm>,
) -> Result<Response, AppError> {
    user.session.verify_csrf(&form.csrf_token)?;

    // Cross-owner ids fall through as a silent no-op, so nothing here leaks
    // whether the contact exists.
    let removed = Contact::delete_by_owner(&state.db, contact_id, user.user_id).await?;
    if removed {
        info!(contact_id = %contact_id, owner_id = %user.user_id, "contact deleted");
        state
            .sessions
            .push_flash(&user.session.token, "Contact deleted!");
    }
    Ok((jar.add(user.session.cookie()), Redirect::to("/dashboard")).into_response())
}

fn contact_form_page(
    state: &AppState,
    user: &CurrentUser,
    jar: CookieJar,
    errors: Vec<String>,
) -> Response {
    let flashes = state.sessions.take_flashes(&user.session.token);
    (
        jar.add(user.session.cookie()),
        Json(FormPage {
            csrf_token: user.session.record.csrf_token.clone(),
            flashes,
            errors,
        }),
    )
        .into_response()
}
