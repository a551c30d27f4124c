// Inbound email storage behind the provider webhook.
//
// The store is injected through `AppState` so handlers never touch process
// globals: production keeps messages in Postgres, tests and dev can use the
// in-memory variant.
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::DbError;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InboundEmail {
    pub id: Uuid,
    pub recipient: String,
    pub sender: String,
    pub subject: Option<String>,
    pub body_plain: Option<String>,
    pub body_html: Option<String>,
    pub received_at: DateTime<Utc>,
}

/// Form fields the email provider posts to the webhook.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundEmailForm {
    pub recipient: String,
    pub sender: String,
    pub subject: Option<String>,
    #[serde(rename = "body-plain")]
    pub body_plain: Option<String>,
    #[serde(rename = "body-html")]
    pub body_html: Option<String>,
}

#[async_trait]
pub trait MailboxStore: Send + Sync {
    async fn store(&self, email: InboundEmailForm) -> Result<InboundEmail, DbError>;
    async fn for_recipient(&self, recipient: &str) -> Result<Vec<InboundEmail>, DbError>;
}

/// Table-backed mailbox used in production.
pub struct PgMailbox {
    pool: PgPool,
}

impl PgMailbox {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MailboxStore for PgMailbox {
    async fn store(&self, email: InboundEmailForm) -> Result<InboundEmail, DbError> {
        let stored = sqlx::query_as::<_, InboundEmail>(
            "INSERT INTO inbound_emails (recipient, sender, subject, body_plain, body_html) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(&email.recipient)
        .bind(&email.sender)
        .bind(&email.subject)
        .bind(&email.body_plain)
        .bind(&email.body_html)
        .fetch_one(&self.pool)
        .await?;
        Ok(stored)
    }

    async fn for_recipient(&self, recipient: &str) -> Result<Vec<InboundEmail>, DbError> {
        let emails = sqlx::query_as::<_, InboundEmail>(
            "SELECT * FROM inbound_emails WHERE recipient = $1 ORDER BY received_at",
        )
        .bind(recipient)
        .fetch_all(&self.pool)
        .await?;
        Ok(emails)
    }
}

/// In-memory mailbox keyed by recipient.
#[derive(Default)]
pub struct MemoryMailbox {
    inner: Arc<RwLock<HashMap<String, Vec<InboundEmail>>>>,
}

impl MemoryMailbox {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MailboxStore for MemoryMailbox {
    async fn store(&self, email: InboundEmailForm) -> Result<InboundEmail, DbError> {
        let stored = InboundEmail {
            id: Uuid::new_v4(),
            recipient: email.recipient,
            sender: email.sender,
            subject: email.subject,
            body_plain: email.body_plain,
            body_html: email.body_html,
            received_at: Utc::now(),
        };
        let mut inner = self.inner.write().await;
        inner
            .entry(stored.recipient.clone())
            .or_default()
            .push(stored.clone());
        Ok(stored)
    }

    async fn for_recipient(&self, recipient: &str) -> Result<Vec<InboundEmail>, DbError> {
        let inner = self.inner.read().await;
        Ok(inner.get(recipient).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(recipient: &str, subject: &str) -> InboundEmailForm {
        InboundEmailForm {
            recipient: recipient.to_string(),
            sender: "noreply@provider.test".to_string(),
            subject: Some(subject.to_string()),
            body_plain: Some("hello".to_string()),
            body_html: None,
        }
    }

    #[tokio::test]
    async fn memory_mailbox_groups_by_recipient() {
        let mailbox = MemoryMailbox::new();
        mailbox.store(form("a@example.com", "first")).await.unwrap();
        mailbox.store(form("a@example.com", "second")).await.unwrap();
        mailbox.store(form("b@example.com", "other")).await.unwrap();

        let a = mailbox.for_recipient("a@example.com").await.unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(a[0].subject.as_deref(), Some("first"));
        assert_eq!(a[1].subject.as_deref(), Some("second"));

        assert!(mailbox.for_recipient("nobody@example.com").await.unwrap().is_empty());
    }

    #[test]
    fn provider_field_names_map_to_fields() {
        let form: InboundEmailForm = serde_json::from_value(serde_json::json!({
            "recipient": "user@example.com",
            "sender": "mailer@test.com",
            "subject": "Hi",
            "body-plain": "Text",
            "body-html": "<p>Text</p>",
        }))
        .unwrap();
        assert_eq!(form.recipient, "user@example.com");
        assert_eq!(form.body_plain.as_deref(), Some("Text"));
        assert_eq!(form.body_html.as_deref(), Some("<p>Text</p>"));
    }
}
