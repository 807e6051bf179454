/// Outbound email
///
/// Handlers hand an [`OutboundEmail`] to a [`Mailer`]. Which mailer runs is
/// decided once at startup:
///
/// - [`smtp::SmtpMailer`]: real delivery through an SMTP relay (STARTTLS)
/// - [`LogMailer`]: logs the message instead of sending it, for local runs
/// - [`MemoryMailer`]: keeps messages in memory so tests can read emailed codes
///
/// Message bodies for the account workflow are built by [`auth::AuthEmail`].

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub mod auth;
pub mod smtp;

/// Sender used when none is configured
pub const DEFAULT_FROM: &str = "UpTask <admin@uptask.com>";

/// Error type for email delivery failures
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.)
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled
    #[error("Email build error: {0}")]
    Build(String),
}

/// A message ready to be delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    /// Recipient address
    pub to: String,
    pub subject: String,
    /// Plain text alternative
    pub text: String,
    /// HTML body
    pub html: String,
}

/// Delivers outbound email
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends one message
    ///
    /// # Errors
    ///
    /// Returns [`EmailError`] if the message cannot be built or delivered
    async fn send(&self, email: OutboundEmail) -> Result<(), EmailError>;
}

/// Mailer that only logs what it would have sent
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), EmailError> {
        info!(to = %email.to, subject = %email.subject, "Email not sent (no SMTP configured)");
        debug!(to = %email.to, body = %email.text, "Unsent email body");
        Ok(())
    }
}

/// Mailer that records every message it is given
#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<OutboundEmail>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages sent so far, oldest first
    pub async fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().await.clone()
    }

    /// Most recent message addressed to `to`
    pub async fn last_to(&self, to: &str) -> Option<OutboundEmail> {
        self.sent
            .lock()
            .await
            .iter()
            .rev()
            .find(|email| email.to == to)
            .cloned()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), EmailError> {
        self.sent.lock().await.push(email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(to: &str, subject: &str) -> OutboundEmail {
        OutboundEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            text: "text".to_string(),
            html: "<p>html</p>".to_string(),
        }
    }

    #[tokio::test]
    async fn test_memory_mailer_records_messages() {
        let mailer = MemoryMailer::new();

        mailer.send(email("a@example.com", "first")).await.unwrap();
        mailer.send(email("b@example.com", "second")).await.unwrap();
        mailer.send(email("a@example.com", "third")).await.unwrap();

        assert_eq!(mailer.sent().await.len(), 3);
        assert_eq!(mailer.last_to("a@example.com").await.unwrap().subject, "third");
        assert!(mailer.last_to("c@example.com").await.is_none());
    }

    #[tokio::test]
    async fn test_log_mailer_never_fails() {
        assert!(LogMailer.send(email("a@example.com", "hi")).await.is_ok());
    }

    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_log_mailer_keeps_codes_out_of_info_logs() {
        let output = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let writer = output.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || Captured(writer.clone()))
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let mut message = email("a@example.com", "UpTask - Confirm Account");
        message.text = "Your code is: 482913".to_string();
        LogMailer.send(message).await.unwrap();

        let logged = String::from_utf8(output.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("a@example.com"));
        assert!(logged.contains("UpTask - Confirm Account"));
        assert!(!logged.contains("482913"));
    }

    #[test]
    fn test_email_error_display_build() {
        let err = EmailError::Build("missing body".to_string());
        assert_eq!(err.to_string(), "Email build error: missing body");
    }
}
