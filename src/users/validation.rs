use std::collections::BTreeMap;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use super::dto::{ListQuery, UserPayload};
use super::repo::{StoreResult, UserStore};
use super::repo_types::{PageRequest, UserFilter};

pub const MAX_LEN: usize = 255;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PER_PAGE: i64 = 10;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s.]+(\.[^@\s.]+)*$").unwrap();
    static ref CPF_RE: Regex = Regex::new(r"^\d{3}\.\d{3}\.\d{3}-\d{2}$").unwrap();
    static ref PHONE_RE: Regex = Regex::new(r"^\(\d{2}\) \d{5}-\d{4}$").unwrap();
}

/// Field name -> violated constraints, in field order.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, Vec<String>>);

impl ValidationErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&[String]> {
        self.0.get(name).map(Vec::as_slice)
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.keys().copied().collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presence {
    Required,
    /// May be absent; a present blank value is rejected.
    Optional,
    /// May be absent; a blank value counts as absent.
    Nullable,
}

/// Passwords are taken verbatim, so only the empty string is blank.
fn is_blank(field: &str, value: &str) -> bool {
    if field == "password" {
        value.is_empty()
    } else {
        value.trim().is_empty()
    }
}

/// Presence and length checks shared by every string field. Returns the
/// value when further rules should run on it.
fn string_field<'a>(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<&'a str>,
    presence: Presence,
) -> Option<&'a str> {
    match value {
        None => {
            if presence == Presence::Required {
                errors.add(field, format!("The {field} field is required."));
            }
            None
        }
        Some(v) if is_blank(field, v) => {
            match presence {
                Presence::Required => {
                    errors.add(field, format!("The {field} field is required."));
                }
                Presence::Optional => {
                    errors.add(field, format!("The {field} field must be a string."));
                }
                Presence::Nullable => {}
            }
            None
        }
        Some(v) => {
            if v.chars().count() > MAX_LEN {
                errors.add(
                    field,
                    format!("The {field} field must not be greater than {MAX_LEN} characters."),
                );
            }
            Some(v)
        }
    }
}

fn pattern_field(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<&str>,
    re: &Regex,
) {
    if let Some(v) = string_field(errors, field, value, Presence::Optional) {
        if !re.is_match(v) {
            errors.add(field, format!("The {field} field format is invalid."));
        }
    }
}

fn check_fields(errors: &mut ValidationErrors, payload: &UserPayload, presence: Presence) {
    string_field(errors, "name", payload.name.as_deref(), presence);

    if let Some(email) = string_field(errors, "email", payload.email.as_deref(), presence) {
        if !EMAIL_RE.is_match(email) {
            errors.add("email", "The email field must be a valid email address.");
        }
    }

    if let Some(password) = string_field(errors, "password", payload.password.as_deref(), presence)
    {
        if password.chars().count() < MIN_PASSWORD_LEN {
            errors.add(
                "password",
                format!("The password field must be at least {MIN_PASSWORD_LEN} characters."),
            );
        }
        if payload.password_confirmation.as_deref() != Some(password) {
            errors.add("password", "The password field confirmation does not match.");
        }
    }

    pattern_field(errors, "cpf", payload.cpf.as_deref(), &CPF_RE);
    pattern_field(errors, "phone", payload.phone.as_deref(), &PHONE_RE);
}

/// Field rules for a new user. Uniqueness is checked separately against the
/// store with [`check_email_unique`].
pub fn validate_create(payload: &UserPayload) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    check_fields(&mut errors, payload, Presence::Required);
    errors
}

/// Field rules for a partial update: only present fields are checked.
pub fn validate_update(payload: &UserPayload) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    check_fields(&mut errors, payload, Presence::Optional);
    errors
}

/// Adds the uniqueness error for `email` unless the field already failed
/// its own rules. `except_id` is the record being updated, if any.
pub async fn check_email_unique(
    store: &dyn UserStore,
    email: Option<&str>,
    except_id: Option<i64>,
    errors: &mut ValidationErrors,
) -> StoreResult<()> {
    let Some(email) = email else {
        return Ok(());
    };
    if errors.field("email").is_some() {
        return Ok(());
    }
    if store.email_taken(email, except_id).await? {
        errors.add("email", "The email has already been taken.");
    }
    Ok(())
}

fn positive_int(
    errors: &mut ValidationErrors,
    field: &'static str,
    raw: Option<&str>,
    default: i64,
) -> i64 {
    let raw = match raw.map(str::trim) {
        None | Some("") => return default,
        Some(v) => v,
    };
    match raw.parse::<i64>() {
        Ok(n) if n >= 1 => n,
        Ok(_) => {
            errors.add(field, format!("The {field} field must be at least 1."));
            default
        }
        Err(_) => {
            errors.add(field, format!("The {field} field must be an integer."));
            default
        }
    }
}

/// Turns the raw list query into a store filter and page, defaulting to
/// page 1 with 10 rows.
pub fn validate_list_query(
    query: &ListQuery,
) -> Result<(UserFilter, PageRequest), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let search = string_field(
        &mut errors,
        "search",
        query.search.as_deref(),
        Presence::Nullable,
    )
    .map(str::to_owned);
    let page = positive_int(&mut errors, "page", query.page.as_deref(), DEFAULT_PAGE);
    let per_page = positive_int(
        &mut errors,
        "per_page",
        query.per_page.as_deref(),
        DEFAULT_PER_PAGE,
    );

    errors.into_result()?;
    Ok((
        UserFilter {
            name_contains: search,
        },
        PageRequest { page, per_page },
    ))
}
