/// Account workflow emails
///
/// Both messages carry the six digit code, a link into the web client and
/// the code's lifetime.

use super::OutboundEmail;

/// Escapes text for interpolation into an HTML body
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

/// Who the message is for and which code it carries
#[derive(Debug, Clone)]
pub struct Recipient<'a> {
    pub email: &'a str,
    pub name: &'a str,
    pub token: &'a str,
}

/// Builder for the confirmation and password-reset messages
#[derive(Debug, Clone)]
pub struct AuthEmail {
    frontend_url: String,
    ttl_minutes: i64,
}

impl AuthEmail {
    /// `frontend_url` is the web client base URL, without trailing slash
    pub fn new(frontend_url: impl Into<String>, ttl_minutes: i64) -> Self {
        let frontend_url = frontend_url.into();
        Self {
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
            ttl_minutes,
        }
    }

    /// Message sent after registration and whenever a new confirmation code is issued
    pub fn confirmation(&self, to: &Recipient<'_>) -> OutboundEmail {
        let link = format!("{}/auth/confirm-account", self.frontend_url);
        let subject = "UpTask - Confirm Account".to_string();

        let text = format!(
            "Hello {name}, you have just created your account on UpTask. \
             To finish, confirm your account at {link}\n\
             Your code is: {token}\n\
             This token will expire in {ttl} minutes",
            name = to.name,
            token = to.token,
            ttl = self.ttl_minutes,
        );
        let html = format!(
            "<p>Hello {name}, you have just created your account on UpTask, \
             it's almost done, you just need to confirm your account</p>\
             <p>Click the following link:</p>\
             <a href=\"{link}\">Confirm Account</a>\
             <p>Your code is: <b>{token}</b></p>\
             <p>This token will expire in {ttl} minutes</p>",
            name = escape_html(to.name),
            token = to.token,
            ttl = self.ttl_minutes,
        );

        OutboundEmail {
            to: to.email.to_string(),
            subject,
            text,
            html,
        }
    }

    /// Message sent when a user asks to reset a forgotten password
    pub fn password_reset(&self, to: &Recipient<'_>) -> OutboundEmail {
        let link = format!("{}/auth/new-password", self.frontend_url);
        let subject = "UpTask - Reset your password".to_string();

        let text = format!(
            "Hello {name}, you have requested a new password. \
             Continue at {link}\n\
             Your code is: {token}\n\
             This token will expire in {ttl} minutes",
            name = to.name,
            token = to.token,
            ttl = self.ttl_minutes,
        );
        let html = format!(
            "<p>Hello {name}, you have requested a new password</p>\
             <p>Click the following link:</p>\
             <a href=\"{link}\">Reset Password</a>\
             <p>Your code is: <b>{token}</b></p>\
             <p>This token will expire in {ttl} minutes</p>",
            name = escape_html(to.name),
            token = to.token,
            ttl = self.ttl_minutes,
        );

        OutboundEmail {
            to: to.email.to_string(),
            subject,
            text,
            html,
        }
    }
}
