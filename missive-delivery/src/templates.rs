//! Rendering for the owner notification and the visitor confirmation.
//!
//! Both messages are rendered twice, as plain text and as a small inline-CSS
//! HTML document. Every request-derived value is HTML-escaped before it is
//! interpolated into the HTML body, and message newlines become `<br>` only
//! after escaping. Plain-text bodies carry the raw values.

use crate::submission::{RequestMeta, Submission};

/// A fully rendered message, ready for the message builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

const ADMIN_STYLES: &str = r"
    body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px; }
    .header { background-color: #f5f5f5; padding: 15px; border-radius: 5px; margin-bottom: 20px; }
    .content { background-color: #ffffff; padding: 15px; border-radius: 5px; border: 1px solid #e0e0e0; }
    .message-box { background-color: #f9f9f9; padding: 15px; border-radius: 5px; border-left: 3px solid #007bff; margin: 15px 0; }
    .footer { font-size: 12px; color: #777; margin-top: 20px; padding-top: 10px; border-top: 1px solid #e0e0e0; }
    .meta { font-size: 12px; color: #777; margin-top: 20px; }
  ";

const USER_STYLES: &str = r"
    body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px; }
    .header { background-color: #f5f5f5; padding: 15px; border-radius: 5px; margin-bottom: 20px; }
    .content { background-color: #ffffff; padding: 15px; border-radius: 5px; border: 1px solid #e0e0e0; }
    .message-box { background-color: #f9f9f9; padding: 15px; border-radius: 5px; border-left: 3px solid #28a745; margin: 15px 0; }
    .footer { font-size: 12px; color: #777; margin-top: 20px; padding-top: 10px; border-top: 1px solid #e0e0e0; }
  ";

/// Renders the notification sent to the site owner.
#[must_use]
pub fn render_admin(site_name: &str, submission: &Submission, meta: &RequestMeta) -> RenderedMail {
    let subject = format!("New Contact Form Submission from {site_name}");
    let submitted = submission.formatted_received();
    let ip = meta.client_ip.as_deref().unwrap_or("Not available");
    let user_agent = meta.user_agent.as_deref().unwrap_or("Not available");

    let text = format!(
        "New Contact Form Submission\n\
         \n\
         From: {name} ({email})\n\
         Submitted on: {submitted}\n\
         \n\
         Message:\n\
         {message}\n\
         \n\
         Additional Information:\n\
         IP Address: {ip}\n\
         User Agent: {user_agent}\n\
         \n\
         This is an automated email from your website contact form.\n",
        name = submission.name,
        email = submission.email,
        message = submission.message,
    );

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>New Contact Form Submission</title>
  <style>{styles}</style>
</head>
<body>
  <div class="header">
    <h2>New Contact Form Submission</h2>
  </div>
  <div class="content">
    <p><strong>From:</strong> {name} ({email})</p>
    <p><strong>Submitted on:</strong> {submitted}</p>

    <div class="message-box">
      <p><strong>Message:</strong></p>
      <p>{message}</p>
    </div>

    <div class="meta">
      <p><strong>Additional Information:</strong></p>
      <p>IP Address: {ip}</p>
      <p>User Agent: {user_agent}</p>
    </div>
  </div>
  <div class="footer">
    <p>This is an automated email from your website contact form.</p>
  </div>
</body>
</html>
"#,
        styles = ADMIN_STYLES,
        name = escape_html(&submission.name),
        email = escape_html(&submission.email),
        message = escape_multiline(&submission.message),
        ip = escape_html(ip),
        user_agent = escape_html(user_agent),
    );

    RenderedMail { subject, text, html }
}

/// Renders the confirmation sent back to the visitor.
#[must_use]
pub fn render_user(site_name: &str, contact_email: &str, submission: &Submission) -> RenderedMail {
    let subject = format!("Thank you for contacting {site_name}");
    let submitted = submission.formatted_received();

    let text = format!(
        "Thank you for contacting {site_name}\n\
         \n\
         Dear {name},\n\
         \n\
         Thank you for reaching out to us. We have received your message and will get back to you as soon as possible.\n\
         \n\
         Your message (submitted on {submitted}):\n\
         {message}\n\
         \n\
         If you have any additional questions or information to provide, please feel free to reply to this email.\n\
         \n\
         Best regards,\n\
         The {site_name} Team\n\
         \n\
         If you did not submit this contact form, please disregard this email or contact us at {contact_email}.\n",
        name = submission.name,
        message = submission.message,
    );

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Thank you for contacting us</title>
  <style>{styles}</style>
</head>
<body>
  <div class="header">
    <h2>Thank you for contacting {site}</h2>
  </div>
  <div class="content">
    <p>Dear {name},</p>

    <p>Thank you for reaching out to us. We have received your message and will get back to you as soon as possible.</p>

    <div class="message-box">
      <p><strong>Your message (submitted on {submitted}):</strong></p>
      <p>{message}</p>
    </div>

    <p>If you have any additional questions or information to provide, please feel free to reply to this email.</p>

    <p>Best regards,<br>
    The {site} Team</p>
  </div>
  <div class="footer">
    <p>If you did not submit this contact form, please disregard this email or contact us at {contact}.</p>
  </div>
</body>
</html>
"#,
        styles = USER_STYLES,
        site = escape_html(site_name),
        name = escape_html(&submission.name),
        message = escape_multiline(&submission.message),
        contact = escape_html(contact_email),
    );

    RenderedMail { subject, text, html }
}

/// Escapes `&`, `<`, `>`, `"`, and `'` for HTML interpolation.
fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Escapes, then converts newlines to `<br>`. Escaping must come first so
/// the inserted tags survive.
fn escape_multiline(value: &str) -> String {
    escape_html(value).replace("\r\n", "<br>").replace('\n', "<br>")
}
