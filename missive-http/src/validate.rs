//! Field validation for contact form submissions.
//!
//! Every check runs and every failure lands in one map, so the frontend
//! can annotate all offending fields in a single round trip.

use std::collections::BTreeMap;

use missive_policy::{CsrfTokenStore, SpamFilter};
use serde::Deserialize;

use crate::responses;

/// Raw fields of a contact form POST.
///
/// Missing fields deserialise to empty strings, which the checks below
/// treat the same as blank input.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub disclaimer: String,
    #[serde(default)]
    pub csrf_token: String,
}

/// Runs every check and collects all failures, keyed by field.
pub(crate) fn collect_errors(
    form: &ContactForm,
    tokens: &CsrfTokenStore,
    spam: &SpamFilter,
) -> BTreeMap<&'static str, String> {
    let mut errors = BTreeMap::new();

    if !tokens.validate(&form.csrf_token) {
        errors.insert("csrf", responses::CSRF_INVALID.to_owned());
    }

    if form.name.is_empty() {
        errors.insert("name", responses::NAME_MISSING.to_owned());
    } else if form.name.chars().count() < 2 {
        errors.insert("name", responses::NAME_TOO_SHORT.to_owned());
    }

    if form.email.is_empty() {
        errors.insert("email", responses::EMAIL_MISSING.to_owned());
    } else if !valid_email(&form.email) {
        errors.insert("email", responses::EMAIL_INVALID.to_owned());
    }

    if form.message.is_empty() {
        errors.insert("message", responses::MESSAGE_MISSING.to_owned());
    } else if form.message.chars().count() < 10 {
        errors.insert("message", responses::MESSAGE_TOO_SHORT.to_owned());
    }

    if form.disclaimer != "on" {
        errors.insert("disclaimer", responses::DISCLAIMER_MISSING.to_owned());
    }

    if spam.is_spam(&form.name, &form.email, &form.message) {
        errors.insert("spam", responses::SPAM_FLAGGED.to_owned());
    }

    errors
}

/// Shape check: `local@domain`, no whitespace, single `@`, and a dot
/// somewhere inside the domain with at least one character on each side.
pub(crate) fn valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || domain.len() < 3 {
        return false;
    }

    domain.as_bytes()[1..domain.len() - 1].contains(&b'.')
}
