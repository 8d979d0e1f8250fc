//! Outbound Mail
//!
//! [`Mailer`] is the seam used by application code; [`SmtpMailer`] is the
//! production implementation on top of `lettre`'s async SMTP transport.

use std::str::FromStr;

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Mail delivery errors
#[derive(Debug, Error)]
pub enum MailError {
    /// Sender or recipient address could not be parsed
    #[error("Invalid mail address: {0}")]
    InvalidAddress(String),

    /// SMTP transport could not be configured
    #[error("SMTP transport setup failed: {0}")]
    Setup(String),

    /// Message could not be assembled
    #[error("Failed to build mail message: {0}")]
    Build(String),

    /// Relay rejected or could not be reached
    #[error("Mail transport failed: {0}")]
    Transport(String),
}

// ============================================================================
// Mailer trait
// ============================================================================

/// Outbound mail collaborator
#[trait_variant::make(Mailer: Send)]
pub trait LocalMailer {
    /// Send an HTML message to a single recipient
    async fn send_raw(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailError>;
}

// ============================================================================
// SMTP configuration
// ============================================================================

/// Connection security for the SMTP relay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpEncryption {
    /// Plain connection upgraded with STARTTLS, usually port 587
    StartTls,
    /// TLS from the first byte (SMTPS), usually port 465
    ImplicitTls,
    /// No encryption (local relays and test servers only)
    None,
}

impl FromStr for SmtpEncryption {
    type Err = MailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "starttls" => Ok(Self::StartTls),
            "tls" | "ssl" | "smtps" => Ok(Self::ImplicitTls),
            "none" | "" => Ok(Self::None),
            other => Err(MailError::Setup(format!("unknown SMTP encryption '{other}'"))),
        }
    }
}

/// SMTP relay settings
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub encryption: SmtpEncryption,
    /// Sender address, `addr@example.com` or `Name <addr@example.com>`
    pub from: String,
}

// ============================================================================
// SMTP mailer
// ============================================================================

/// Mailer backed by an async SMTP relay
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build the transport; no connection is opened until the first send
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let from = config
            .from
            .parse::<Mailbox>()
            .map_err(|e| MailError::InvalidAddress(format!("{}: {e}", config.from)))?;

        let builder = match config.encryption {
            SmtpEncryption::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                    .map_err(|e| MailError::Setup(e.to_string()))?
            }
            SmtpEncryption::ImplicitTls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| MailError::Setup(e.to_string()))?,
            SmtpEncryption::None => {
                tracing::warn!("SMTP encryption is disabled - this is not recommended for production");
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            }
        };

        let mut builder = builder.port(config.port);
        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    fn build_message(&self, to: &str, subject: &str, html_body: &str) -> Result<Message, MailError> {
        let to = to
            .parse::<Mailbox>()
            .map_err(|e| MailError::InvalidAddress(format!("{to}: {e}")))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

impl Mailer for SmtpMailer {
    async fn send_raw(&self, to: &str, subject: &str, html_body: &str) -> Result<(), MailError> {
        let message = self.build_message(to, subject, html_body)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        tracing::debug!(to = %to, subject = %subject, "Mail sent");
        Ok(())
    }
}
