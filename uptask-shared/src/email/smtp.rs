/// SMTP delivery through `lettre`
///
/// The transport is built once and reused; lettre pools connections
/// internally.

use async_trait::async_trait;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::info;

use super::{EmailError, Mailer, OutboundEmail, DEFAULT_FROM};

/// Default SMTP port (STARTTLS)
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Connection settings for the SMTP relay
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    /// RFC 5322 "From" value, e.g. `UpTask <admin@uptask.com>`
    pub from: String,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl SmtpConfig {
    /// Settings for `host` with default port and sender and no credentials
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_SMTP_PORT,
            from: DEFAULT_FROM.to_string(),
            user: None,
            password: None,
        }
    }
}

/// Mailer delivering through an SMTP relay
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Builds the transport
    ///
    /// # Errors
    ///
    /// Returns an error if the relay host or the sender address is invalid
    pub fn new(config: SmtpConfig) -> Result<Self, EmailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port);

        if let (Some(user), Some(password)) = (config.user, config.password) {
            builder = builder.credentials(Credentials::new(user, password));
        }

        Ok(Self {
            transport: builder.build(),
            from: config.from.parse()?,
        })
    }
}

/// Assembles the MIME message with plain text and HTML alternatives
fn build_message(from: &Mailbox, email: OutboundEmail) -> Result<Message, EmailError> {
    Message::builder()
        .from(from.clone())
        .to(email.to.parse()?)
        .subject(email.subject)
        .multipart(MultiPart::alternative_plain_html(email.text, email.html))
        .map_err(|e| EmailError::Build(e.to_string()))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), EmailError> {
        let to = email.to.clone();
        let message = build_message(&self.from, email)?;

        self.transport.send(message).await?;

        info!(to = %to, "Email sent");
        Ok(())
    }
}
