//! JSON response bodies and the exact messages the frontend matches on.

use std::collections::BTreeMap;

use serde::Serialize;

pub const ENDPOINT_INFO: &str =
    "Contact API endpoint is working. Please use POST to submit the form.";
pub const SUBMIT_SUCCESS: &str =
    "Your message has been sent successfully. We will get back to you soon!";
pub const SUBMIT_FAILURE: &str =
    "There was an issue sending your message. Please try again later.";

pub const CSRF_INVALID: &str =
    "Invalid or expired security token. Please refresh the page and try again.";
pub const NAME_MISSING: &str = "Please enter your name";
pub const NAME_TOO_SHORT: &str = "Your name must be at least 2 characters long";
pub const EMAIL_MISSING: &str = "Please enter your email address";
pub const EMAIL_INVALID: &str = "Please enter a valid email address (e.g., name@example.com)";
pub const MESSAGE_MISSING: &str = "Please enter your message";
pub const MESSAGE_TOO_SHORT: &str = "Your message must be at least 10 characters long";
pub const DISCLAIMER_MISSING: &str = "Please check the required consent box before submitting";
pub const SPAM_FLAGGED: &str =
    "Your message was flagged as potential spam. Please revise your message and try again.";
pub const FORM_UNREADABLE: &str =
    "The submission could not be read as form data. Please try again.";

/// Body of the `GET /api/contact?csrf=true` reply.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsrfTokenResponse {
    pub csrf_token: String,
}

/// Informational reply for bare GET requests.
#[derive(Debug, Serialize)]
pub struct EndpointInfo {
    pub message: &'static str,
}

/// Terminal outcome of a submission (both 200 and 500).
#[derive(Debug, Serialize)]
pub struct SubmitOutcome {
    pub success: bool,
    pub message: &'static str,
}

/// Rejection carrying the per-field error map (400 and 429).
#[derive(Debug, Serialize)]
pub struct SubmitRejection {
    pub success: bool,
    pub errors: BTreeMap<&'static str, String>,
}
