//! Templated mail
//!
//! A [`Mailer`] describes one message: subject, a plain-text template, an
//! HTML template and extra context. [`MailService`] renders it with the site
//! context underneath and hands a `multipart/alternative` message to a
//! [`MailTransport`].

use anyhow::{anyhow, Context as _};
use async_trait::async_trait;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::{Arc, RwLock};
use tera::Context as TeraContext;

use crate::config::MailConfig;
use crate::theme::TemplateEngine;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// No sender address, or SMTP settings missing
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Invalid address: {0}")]
    Address(String),

    #[error("Transport error: {0}")]
    Transport(#[from] anyhow::Error),
}

/// Something that can deliver a built message
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: Message) -> anyhow::Result<()>;
}

/// SMTP relay over STARTTLS
pub struct SmtpMailTransport {
    inner: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailTransport {
    pub fn from_config(config: &MailConfig) -> Result<Self, MailError> {
        let host = config
            .smtp_host
            .as_deref()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| MailError::Configuration("SMTP host not configured".to_string()))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| anyhow!("Failed to create SMTP transport: {}", e))?
            .port(config.smtp_port);

        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            inner: builder.build(),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, message: Message) -> anyhow::Result<()> {
        self.inner
            .send(message)
            .await
            .map_err(|e| anyhow!("Failed to send email: {}", e))?;
        Ok(())
    }
}

/// One templated message
#[derive(Debug, Clone)]
pub struct Mailer {
    subject: String,
    plain_template: String,
    html_template: String,
    context: TeraContext,
}

impl Mailer {
    pub fn new(
        subject: impl Into<String>,
        plain_template: impl Into<String>,
        html_template: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            plain_template: plain_template.into(),
            html_template: html_template.into(),
            context: TeraContext::new(),
        }
    }

    /// Extra template variable; overrides site variables of the same name
    pub fn with_context<T: serde::Serialize + ?Sized>(mut self, key: &str, value: &T) -> Self {
        self.context.insert(key, value);
        self
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}

/// Renders [`Mailer`]s and sends them through a transport
pub struct MailService {
    templates: Arc<RwLock<TemplateEngine>>,
    transport: Arc<dyn MailTransport>,
    default_from: Option<String>,
}

impl MailService {
    pub fn new(
        templates: Arc<RwLock<TemplateEngine>>,
        transport: Arc<dyn MailTransport>,
        default_from: Option<String>,
    ) -> Self {
        Self {
            templates,
            transport,
            default_from,
        }
    }

    /// SMTP-backed service, or `None` when no SMTP host is configured
    pub fn from_config(
        config: &MailConfig,
        templates: Arc<RwLock<TemplateEngine>>,
    ) -> Result<Option<Self>, MailError> {
        if config.smtp_host.as_deref().map_or(true, str::is_empty) {
            return Ok(None);
        }
        let transport = SmtpMailTransport::from_config(config)?;
        Ok(Some(Self::new(
            templates,
            Arc::new(transport),
            config.from_email.clone(),
        )))
    }

    /// Render and send `mail` to every recipient.
    ///
    /// `from` falls back to the configured sender. The sender is resolved
    /// before anything is rendered.
    pub async fn send(
        &self,
        mail: &Mailer,
        recipients: &[String],
        from: Option<&str>,
    ) -> Result<(), MailError> {
        let from = from
            .or(self.default_from.as_deref())
            .filter(|f| !f.is_empty())
            .ok_or_else(|| {
                MailError::Configuration("No sender address: set mail.from_email".to_string())
            })?;
        let from: Mailbox = from
            .parse()
            .map_err(|e| MailError::Address(format!("{}: {}", from, e)))?;

        let (plain, html) = {
            let engine = self
                .templates
                .read()
                .map_err(|_| anyhow!("Template engine lock poisoned"))?;
            let plain = engine
                .render_with_site(&mail.plain_template, &mail.context)
                .map_err(|e| MailError::Template(e.to_string()))?;
            let html = engine
                .render_with_site(&mail.html_template, &mail.context)
                .map_err(|e| MailError::Template(e.to_string()))?;
            (plain, html)
        };

        let mut builder = Message::builder().from(from).subject(mail.subject.clone());
        for recipient in recipients {
            let to: Mailbox = recipient
                .parse()
                .map_err(|e| MailError::Address(format!("{}: {}", recipient, e)))?;
            builder = builder.to(to);
        }

        let message = builder
            .multipart(MultiPart::alternative_plain_html(plain, html))
            .context("Failed to build email")?;

        self.transport.send(message).await?;
        tracing::info!("Sent mail '{}' to {} recipient(s)", mail.subject, recipients.len());
        Ok(())
    }
}
