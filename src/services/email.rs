//! Outbound email delivery behind a provider trait.
//!
//! The SMTP transport is real delivery; the mock stands in for tests and
//! for local runs without SMTP credentials. Delivery failure always
//! surfaces to the caller so "code sent" is never acknowledged falsely.

use crate::config::SmtpConfig;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider not enabled: {0}")]
    NotEnabled(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Send error: {0}")]
    SendFailed(String),

    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
}

#[derive(Debug, Clone)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body_text: String,
    pub attachments: Vec<EmailAttachment>,
}

#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send(&self, email: &EmailMessage) -> Result<(), ProviderError>;
    fn is_enabled(&self) -> bool;
}

pub struct SmtpProvider {
    config: SmtpConfig,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl SmtpProvider {
    pub fn new(config: SmtpConfig) -> Result<Self, ProviderError> {
        if !config.enabled {
            return Ok(Self {
                config,
                transport: None,
            });
        }

        let creds = Credentials::new(config.user.clone(), config.password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| {
                ProviderError::Configuration(format!("Failed to create SMTP relay: {}", e))
            })?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            config,
            transport: Some(transport),
        })
    }
}

#[async_trait]
impl EmailProvider for SmtpProvider {
    async fn send(&self, email: &EmailMessage) -> Result<(), ProviderError> {
        if !self.config.enabled {
            return Err(ProviderError::NotEnabled(
                "SMTP email provider is not enabled".to_string(),
            ));
        }

        let transport = self.transport.as_ref().ok_or_else(|| {
            ProviderError::Configuration("SMTP transport not initialized".to_string())
        })?;

        let from_mailbox: Mailbox =
            format!("{} <{}>", self.config.from_name, self.config.from_email)
                .parse()
                .map_err(|e| {
                    ProviderError::Configuration(format!("Invalid from address: {}", e))
                })?;

        let to_mailbox: Mailbox = email
            .to
            .parse()
            .map_err(|e| ProviderError::InvalidRecipient(format!("Invalid recipient: {}", e)))?;

        let builder = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(&email.subject);

        let text_part = SinglePart::builder()
            .header(ContentType::TEXT_PLAIN)
            .body(email.body_text.clone());

        let message = if email.attachments.is_empty() {
            builder.singlepart(text_part).map_err(|e| {
                ProviderError::SendFailed(format!("Failed to build message: {}", e))
            })?
        } else {
            let mut multipart = MultiPart::mixed().singlepart(text_part);
            for attachment in &email.attachments {
                let content_type = ContentType::parse(&attachment.content_type).map_err(|e| {
                    ProviderError::Configuration(format!(
                        "Invalid attachment content type {}: {}",
                        attachment.content_type, e
                    ))
                })?;
                multipart = multipart.singlepart(
                    Attachment::new(attachment.filename.clone())
                        .body(attachment.data.clone(), content_type),
                );
            }
            builder.multipart(multipart).map_err(|e| {
                ProviderError::SendFailed(format!("Failed to build message: {}", e))
            })?
        };

        transport
            .send(message)
            .await
            .map_err(|e| ProviderError::SendFailed(format!("Failed to send email: {}", e)))?;

        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            attachments = email.attachments.len(),
            "Email sent successfully"
        );

        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }
}

/// Mock email provider for testing and local development.
pub struct MockEmailProvider {
    enabled: bool,
    send_count: AtomicU64,
    sent: Mutex<Vec<EmailMessage>>,
}

impl MockEmailProvider {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            send_count: AtomicU64::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn send_count(&self) -> u64 {
        self.send_count.load(Ordering::SeqCst)
    }

    pub fn sent_messages(&self) -> Vec<EmailMessage> {
        self.sent.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EmailProvider for MockEmailProvider {
    async fn send(&self, email: &EmailMessage) -> Result<(), ProviderError> {
        if !self.enabled {
            return Err(ProviderError::NotEnabled(
                "Mock email provider is not enabled".to_string(),
            ));
        }

        self.send_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(email.clone());
        }

        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            "[MOCK] Email would be sent"
        );

        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_provider_records_messages() {
        let provider = MockEmailProvider::new(true);
        let message = EmailMessage {
            to: "x@y.com".to_string(),
            subject: "Your Verification Code".to_string(),
            body_text: "Your verification code is: 123456".to_string(),
            attachments: vec![EmailAttachment {
                filename: "payment-instructions.txt".to_string(),
                content_type: "text/plain".to_string(),
                data: b"invoice".to_vec(),
            }],
        };

        provider.send(&message).await.unwrap();

        assert_eq!(provider.send_count(), 1);
        let sent = provider.sent_messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].attachments.len(), 1);
    }

    #[tokio::test]
    async fn disabled_mock_fails_loudly() {
        let provider = MockEmailProvider::new(false);
        let message = EmailMessage {
            to: "x@y.com".to_string(),
            subject: "s".to_string(),
            body_text: "b".to_string(),
            attachments: vec![],
        };

        assert!(provider.send(&message).await.is_err());
    }
}
