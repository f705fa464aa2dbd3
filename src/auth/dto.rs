use serde::{Deserialize, Serialize};

/// Login form body. Fields default to empty so a missing field surfaces as
/// a validation message instead of a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub csrf_token: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Registration form body.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub csrf_token: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Page payload for form routes; the rendering layer (external) turns this
/// into HTML. `csrf_token` must come back as a form field on submit.
#[derive(Debug, Serialize)]
pub struct FormPage {
    pub csrf_token: String,
    pub flashes: Vec<String>,
    pub errors: Vec<String>,
}

/// Page payload for routes with no form on them.
#[derive(Debug, Serialize)]
pub struct Page {
    pub flashes: Vec<String>,
}
