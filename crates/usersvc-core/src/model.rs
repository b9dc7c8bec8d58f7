//! User records and request payloads.
//!
//! `UserInput` is what arrives on the wire; `NewUser` only exists once the
//! input passed validation, so stores never see unchecked names or emails.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, UsersError};

/// Stored user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Server-assigned, never reused.
    pub id: u64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Raw create/update body. Both fields are required; they are optional here so
/// a missing field is reported as a validation error rather than a decode error.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UserInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Validated payload, ready for the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    /// Trimmed and lowercased.
    pub email: String,
}

impl UserInput {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            email: Some(email.into()),
        }
    }

    /// Check presence and format of both fields.
    pub fn validate(&self) -> Result<NewUser> {
        let (Some(name), Some(email)) = (self.name.as_deref(), self.email.as_deref()) else {
            return Err(UsersError::BadRequest("name and email are required".into()));
        };

        if !validate_name(name) {
            return Err(UsersError::BadRequest(
                "Invalid name format. Use 2-100 characters, letters only".into(),
            ));
        }
        let email = normalize_email(email);
        if !validate_email(&email) {
            return Err(UsersError::BadRequest("Invalid email format".into()));
        }

        Ok(NewUser {
            name: name.to_string(),
            email,
        })
    }
}

/// 2..=100 chars of letters (ASCII or `À`..=`ÿ`), whitespace, `'` and `-`.
pub fn validate_name(name: &str) -> bool {
    let len = name.chars().count();
    if !(2..=100).contains(&len) {
        return false;
    }
    name.chars().all(|c| {
        c.is_ascii_alphabetic()
            || ('\u{C0}'..='\u{FF}').contains(&c)
            || c.is_whitespace()
            || c == '\''
            || c == '-'
    })
}

/// `local@domain.tld` where the tld is at least two ASCII letters.
pub fn validate_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || !local.chars().all(is_local_char) {
        return false;
    }

    // tld can't hold a dot, so the separating dot is always the last one
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty()
        && host.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        && tld.len() >= 2
        && tld.chars().all(|c| c.is_ascii_alphabetic())
}

fn is_local_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '%' | '+' | '-')
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
