// src/email_sender/mod.rs
pub mod composer;

use crate::models::BusinessContact;
use async_trait::async_trait;
use composer::EmailContent;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Result of one delivery attempt. Provider-level failure is data, not an
/// error: the caller logs it as a failed outreach record and moves on.
/// Retries, if ever wanted, are a separate job over failed records.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub success: bool,
    pub provider_message_id: Option<String>,
    pub error: Option<String>,
}

impl SendOutcome {
    pub fn sent(message_id: String) -> Self {
        Self {
            success: true,
            provider_message_id: Some(message_id),
            error: None,
        }
    }

    pub fn failed(error: impl ToString) -> Self {
        Self {
            success: false,
            provider_message_id: None,
            error: Some(error.to_string()),
        }
    }
}

#[async_trait]
pub trait DeliverySender: Send + Sync {
    async fn send(
        &self,
        contact: &BusinessContact,
        content: &EmailContent,
        tracking_id: &str,
    ) -> SendOutcome;
}

#[derive(Debug, Clone)]
pub struct MailgunConfig {
    pub api_key: String,
    pub domain: String,
    pub from_email: String,
    pub from_name: String,
    pub base_url: String,
}

impl MailgunConfig {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(MailgunConfig {
            api_key: std::env::var("MAILGUN_API_KEY")
                .map_err(|_| "MAILGUN_API_KEY environment variable required")?,
            domain: std::env::var("MAILGUN_DOMAIN")
                .unwrap_or_else(|_| "mg.pricefair.co.uk".to_string()),
            from_email: std::env::var("FROM_EMAIL")
                .unwrap_or_else(|_| "partners@mg.pricefair.co.uk".to_string()),
            from_name: std::env::var("FROM_NAME").unwrap_or_else(|_| "PriceFair".to_string()),
            base_url: "https://api.mailgun.net/v3".to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct MailgunResponse {
    pub id: String,
    pub message: String,
}

pub struct MailgunSender {
    pub config: MailgunConfig,
    client: Client,
}

impl MailgunSender {
    pub fn new(config: MailgunConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("Failed to create HTTP client");
        debug!("Created MailgunSender for domain: {}", config.domain);
        Self { config, client }
    }

    pub async fn test_connection(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let url = format!("{}/{}/stats", self.config.base_url, self.config.domain);

        let response = self
            .client
            .get(&url)
            .basic_auth("api", Some(&self.config.api_key))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            let error_text = response.text().await?;
            Err(format!("Mailgun connection failed: {}", error_text).into())
        }
    }
}

#[async_trait]
impl DeliverySender for MailgunSender {
    async fn send(
        &self,
        contact: &BusinessContact,
        content: &EmailContent,
        tracking_id: &str,
    ) -> SendOutcome {
        let url = format!("{}/{}/messages", self.config.base_url, self.config.domain);

        debug!("Preparing email for {}: {}", contact.email, content.subject);

        let mut form_data = HashMap::new();
        form_data.insert(
            "from",
            format!("{} <{}>", self.config.from_name, self.config.from_email),
        );
        form_data.insert("to", format!("{} <{}>", contact.name, contact.email));
        form_data.insert("subject", content.subject.clone());
        form_data.insert("html", content.html.clone());
        form_data.insert("text", content.text.clone());

        // Open/click tracking feeds the engagement webhook.
        form_data.insert("o:tracking", "yes".to_string());
        form_data.insert("o:tracking-clicks", "yes".to_string());
        form_data.insert("o:tracking-opens", "yes".to_string());

        // Echoed back by delivery events so they can be matched to the
        // outreach record even when the message id is absent.
        form_data.insert("v:tracking-id", tracking_id.to_string());
        form_data.insert("o:tag", format!("category-{}", contact.category));

        let response = match self
            .client
            .post(&url)
            .basic_auth("api", Some(&self.config.api_key))
            .form(&form_data)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("Mailgun request failed for {}: {}", contact.email, e);
                return SendOutcome::failed(e);
            }
        };

        if response.status().is_success() {
            match response.json::<MailgunResponse>().await {
                Ok(body) => {
                    debug!("Mailgun accepted {}: {}", contact.email, body.message);
                    SendOutcome::sent(body.id)
                }
                Err(e) => {
                    error!("Mailgun response parse error: {}", e);
                    SendOutcome::failed(format!("unreadable provider response: {}", e))
                }
            }
        } else {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Mailgun API error ({}): {}", status, error_text);
            SendOutcome::failed(format!("Mailgun error ({}): {}", status, error_text))
        }
    }
}

/// Stand-in used when no delivery provider is configured. Every attempt
/// fails and is recorded as such, so a misconfigured deployment is loud in
/// the outreach log instead of silently doing nothing.
pub struct DisabledSender;

#[async_trait]
impl DeliverySender for DisabledSender {
    async fn send(
        &self,
        contact: &BusinessContact,
        _content: &EmailContent,
        _tracking_id: &str,
    ) -> SendOutcome {
        warn!(
            "Delivery provider not configured, dropping email to {}",
            contact.email
        );
        SendOutcome::failed("delivery provider not configured")
    }
}
