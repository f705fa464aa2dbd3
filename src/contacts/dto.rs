use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::contacts::repo::{Contact, NewContact};
use crate::validate::{validate_field, ValidationError};

/// Contact form body. Fields default to empty so missing ones surface as
/// validation messages instead of deserialization rejections.
#[derive(Debug, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub csrf_token: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

impl ContactForm {
    /// Run every field through the validator and collect all failures;
    /// nothing is persisted unless the whole form passes.
    pub fn validate(&self) -> Result<NewContact, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let name = validate_field("name", &self.name, 2, 100);
        let email = validate_field("email", &self.email, 1, 100);
        let phone = validate_field("phone", &self.phone, 10, 20);
        let address = validate_field("address", &self.address, 5, 200);

        let mut take = |result: Result<String, ValidationError>| match result {
            Ok(v) => v,
            Err(e) => {
                errors.push(e);
                String::new()
            }
        };

        let contact = NewContact {
            name: take(name),
            email: take(email),
            phone: take(phone),
            address: take(address),
        };

        if errors.is_empty() {
            Ok(contact)
        } else {
            Err(errors)
        }
    }
}

/// Body for the delete form; carries only the CSRF token.
#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    pub csrf_token: String,
}

#[derive(Debug, Serialize)]
pub struct ContactView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub created_at: OffsetDateTime,
}

impl From<Contact> for ContactView {
    fn from(c: Contact) -> Self {
        Self {
            id: c.id,
            name: c.name,
            email: c.email,
            phone: c.phone,
            address: c.address,
            created_at: c.created_at,
        }
    }
}

/// Dashboard page payload. The per-contact delete forms live on this page,
/// so it carries the CSRF token they must submit.
#[derive(Debug, Serialize)]
pub struct DashboardPage {
    pub username: String,
    pub csrf_token: String,
    pub contacts: Vec<ContactView>,
    pub flashes: Vec<String>,
}
