//! Email notification delivery via SMTP.
//!
//! [`Notifier`] composes the completion [`Message`] and hands it to a
//! [`MailTransport`]. [`SmtpMailer`] is the production transport: it wraps
//! the `lettre` async SMTP client (connect, STARTTLS, login, send, quit in
//! a single call). One attempt is made per run; nothing is retried.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use lettre::transport::smtp::response::{Category, Code, Severity};
use rendermail_core::env;
use rendermail_core::error::ConfigError;
use rendermail_core::types::CompletedJobSet;

use crate::message::Message;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for notification delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The SMTP server rejected the configured credentials.
    #[error("SMTP authentication failed: {0}")]
    Authentication(String),

    /// Any other SMTP failure (connection, TLS, rejected recipient, timeout).
    #[error("SMTP transport error: {0}")]
    Transport(String),

    /// The sender or a recipient address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(String),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

impl NotifyError {
    pub fn is_authentication(&self) -> bool {
        matches!(self, NotifyError::Authentication(_))
    }
}

// ---------------------------------------------------------------------------
// MailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Mail transport configuration, loaded once at start and never mutated.
#[derive(Clone)]
pub struct MailConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    /// RFC 5322 "From" address.
    pub sender: String,
    /// At least one address.
    pub recipients: Vec<String>,
    /// List failed and cancelled jobs separately in the body.
    pub report_outcomes: bool,
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("sender", &self.sender)
            .field("recipients", &self.recipients)
            .field("report_outcomes", &self.report_outcomes)
            .finish()
    }
}

impl MailConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable                     | Required | Default |
    /// |------------------------------|----------|---------|
    /// | `RENDERMAIL_SMTP_HOST`       | yes      | --      |
    /// | `RENDERMAIL_SMTP_PORT`       | no       | `587`   |
    /// | `RENDERMAIL_SMTP_USER`       | yes      | --      |
    /// | `RENDERMAIL_SMTP_PASSWORD`   | yes      | --      |
    /// | `RENDERMAIL_SENDER`          | yes      | --      |
    /// | `RENDERMAIL_RECIPIENTS`      | yes      | --      |
    /// | `RENDERMAIL_REPORT_OUTCOMES` | no       | `false` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading through `lookup`.
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let recipients = env::split_list(&env::required(lookup, "RENDERMAIL_RECIPIENTS")?);
        if recipients.is_empty() {
            return Err(ConfigError::Missing("RENDERMAIL_RECIPIENTS"));
        }

        Ok(Self {
            smtp_host: env::required(lookup, "RENDERMAIL_SMTP_HOST")?,
            smtp_port: env::parse_or(lookup, "RENDERMAIL_SMTP_PORT", DEFAULT_SMTP_PORT)?,
            username: env::required(lookup, "RENDERMAIL_SMTP_USER")?,
            password: env::required(lookup, "RENDERMAIL_SMTP_PASSWORD")?,
            sender: env::required(lookup, "RENDERMAIL_SENDER")?,
            recipients,
            report_outcomes: env::parse_or(lookup, "RENDERMAIL_REPORT_OUTCOMES", false)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Delivers one composed message to a list of recipients.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(
        &self,
        sender: &str,
        recipients: &[String],
        message: &Message,
    ) -> Result<(), NotifyError>;
}

/// SMTP transport over STARTTLS with username/password login.
pub struct SmtpMailer {
    smtp_host: String,
    smtp_port: u16,
    username: String,
    password: String,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Self {
        Self {
            smtp_host: config.smtp_host.clone(),
            smtp_port: config.smtp_port,
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn deliver(
        &self,
        sender: &str,
        recipients: &[String],
        message: &Message,
    ) -> Result<(), NotifyError> {
        use lettre::{
            message::{Mailbox, MultiPart, SinglePart},
            transport::smtp::authentication::Credentials,
            AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
        };

        let from: Mailbox = sender
            .parse()
            .map_err(|e: lettre::address::AddressError| NotifyError::Address(e.to_string()))?;

        let mut builder = lettre::Message::builder()
            .from(from)
            .subject(message.subject.clone());
        for recipient in recipients {
            let to: Mailbox = recipient
                .parse()
                .map_err(|e: lettre::address::AddressError| NotifyError::Address(e.to_string()))?;
            builder = builder.to(to);
        }

        let mut parts = MultiPart::alternative().singlepart(SinglePart::plain(message.body.clone()));
        if let Some(html) = &message.html {
            parts = parts.singlepart(SinglePart::html(html.clone()));
        }

        let email = builder
            .multipart(parts)
            .map_err(|e| NotifyError::Build(e.to_string()))?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.smtp_host)
            .map_err(classify_smtp_error)?
            .port(self.smtp_port)
            .credentials(Credentials::new(
                self.username.clone(),
                self.password.clone(),
            ))
            .build();

        mailer.send(email).await.map_err(classify_smtp_error)?;
        Ok(())
    }
}

fn classify_smtp_error(err: lettre::transport::smtp::Error) -> NotifyError {
    classify_reply(err.status(), err.to_string())
}

/// SMTP replies in the 53x range (530, 534, 535, 538) are authentication
/// refusals; everything else, including errors with no reply at all, is a
/// plain transport failure.
fn classify_reply(code: Option<Code>, detail: String) -> NotifyError {
    match code {
        Some(Code {
            severity: Severity::PermanentNegativeCompletion,
            category: Category::Unspecified3,
            ..
        }) => NotifyError::Authentication(detail),
        _ => NotifyError::Transport(detail),
    }
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// Composes and sends the completion notification.
pub struct Notifier<'a, T> {
    config: &'a MailConfig,
    transport: T,
}

impl<'a, T: MailTransport> Notifier<'a, T> {
    pub fn new(config: &'a MailConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn compose(&self, jobs: &CompletedJobSet, at: &DateTime<Local>) -> Message {
        Message::render_complete(jobs, at, self.config.report_outcomes)
    }

    /// Compose and deliver the notification for `jobs`, finished at `at`.
    ///
    /// An authentication refusal is logged with the operator diagnostic
    /// before being returned; the caller is expected to exit with status 1.
    pub async fn notify(
        &self,
        jobs: &CompletedJobSet,
        at: &DateTime<Local>,
    ) -> Result<Message, NotifyError> {
        let message = self.compose(jobs, at);

        tracing::info!("Sending email.");
        match self
            .transport
            .deliver(&self.config.sender, &self.config.recipients, &message)
            .await
        {
            Ok(()) => {
                tracing::info!(recipients = self.config.recipients.len(), "Email sent.");
                Ok(message)
            }
            Err(e) if e.is_authentication() => {
                tracing::error!(error = %e, "Exiting. Check your email username or password.");
                Err(e)
            }
            Err(e) => {
                tracing::error!(error = %e, "Email delivery failed");
                Err(e)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
