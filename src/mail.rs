//! Outbound mail for the contact form.

use askama::Template;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;

use crate::config::MailConfig;

const SMTP_PORT: u16 = 587;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Unsupported mail service: {0}")]
    UnsupportedService(String),

    #[error("Mail is not configured")]
    Disabled,

    #[error("Invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// What a visitor submitted on the contact page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
}

impl ContactMessage {
    pub fn subject(&self) -> String {
        format!("Message from {}", self.name)
    }
}

#[derive(Template)]
#[template(path = "email/contact.html")]
struct ContactEmail<'a> {
    name: &'a str,
    email: &'a str,
    phone: &'a str,
    message: &'a str,
}

pub fn render_contact(message: &ContactMessage) -> Result<String, MailError> {
    let body = ContactEmail {
        name: &message.name,
        email: &message.email,
        phone: &message.phone,
        message: &message.message,
    }
    .render()?;
    Ok(body)
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_contact(&self, message: &ContactMessage) -> Result<(), MailError>;
}

/// SMTP relay host for a known provider.
pub fn smtp_host(service: &str) -> Result<&'static str, MailError> {
    match service.trim().to_ascii_lowercase().as_str() {
        "gmail" => Ok("smtp.gmail.com"),
        "yahoo" => Ok("smtp.mail.yahoo.com"),
        "outlook" => Ok("smtp.office365.com"),
        other => Err(MailError::UnsupportedService(other.to_string())),
    }
}

pub struct SmtpMailer {
    mailbox: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(service: &str, address: &str, app_password: &str) -> Result<Self, MailError> {
        let host = smtp_host(service)?;
        let mailbox: Mailbox = address.parse()?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
            .port(SMTP_PORT)
            .credentials(Credentials::new(
                address.to_string(),
                app_password.to_string(),
            ))
            .build();
        tracing::info!("Contact mail goes through {}:{}", host, SMTP_PORT);
        Ok(Self { mailbox, transport })
    }

    /// The mailbox sends to itself; replies go to the visitor.
    fn build(&self, message: &ContactMessage) -> Result<Message, MailError> {
        let mut builder = Message::builder()
            .from(self.mailbox.clone())
            .to(self.mailbox.clone())
            .subject(message.subject())
            .header(ContentType::TEXT_HTML);
        match message.email.trim().parse::<Mailbox>() {
            Ok(visitor) => builder = builder.reply_to(visitor),
            Err(e) => tracing::warn!("Contact message without a usable reply address: {}", e),
        }
        Ok(builder.body(render_contact(message)?)?)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_contact(&self, message: &ContactMessage) -> Result<(), MailError> {
        let email = self.build(message)?;
        self.transport.send(email).await?;
        tracing::info!("Sent contact message from {}", message.name);
        Ok(())
    }
}

/// Stands in when no mailbox is configured; every send fails.
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send_contact(&self, _message: &ContactMessage) -> Result<(), MailError> {
        Err(MailError::Disabled)
    }
}

/// Pick a mailer for the configured account. Missing credentials disable
/// mail; an unknown provider is a configuration error.
pub fn from_config(config: &MailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    match (config.address.as_deref(), config.app_password.as_deref()) {
        (Some(address), Some(password)) => {
            Ok(Arc::new(SmtpMailer::new(&config.service, address, password)?))
        }
        _ => {
            tracing::warn!("No mail account configured; contact messages will not be delivered");
            Ok(Arc::new(DisabledMailer))
        }
    }
}
