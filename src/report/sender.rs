//! Hand finished reports to a mail composer.

use crate::report::writer::ReportFile;
use async_trait::async_trait;
use chrono::{Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("no reports to send")]
    NoAttachments,

    #[error("invalid recipient address {0:?}")]
    InvalidRecipient(String),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not encode message: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub file_name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub attachments: Vec<Attachment>,
}

/// The platform mail collaborator. Returns once the message is composed;
/// delivery is not confirmed.
#[async_trait]
pub trait MailComposer: Send + Sync {
    async fn compose(&self, message: &MailMessage) -> Result<(), MailError>;
}

/// Composes messages as JSON drafts in an outbox directory.
#[derive(Debug, Clone)]
pub struct OutboxComposer {
    dir: PathBuf,
}

#[derive(Serialize)]
struct Draft<'a> {
    created_at: chrono::DateTime<Utc>,
    #[serde(flatten)]
    message: &'a MailMessage,
}

impl OutboxComposer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl MailComposer for OutboxComposer {
    async fn compose(&self, message: &MailMessage) -> Result<(), MailError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| MailError::Io {
                path: self.dir.clone(),
                source,
            })?;

        let created_at = Utc::now();
        let id = uuid::Uuid::new_v4().simple().to_string();
        let path = self.dir.join(format!(
            "draft_{}_{}.json",
            created_at.format("%Y%m%d_%H%M%S"),
            &id[..8]
        ));
        let json = serde_json::to_string_pretty(&Draft {
            created_at,
            message,
        })?;

        tokio::fs::write(&path, json)
            .await
            .map_err(|source| MailError::Io {
                path: path.clone(),
                source,
            })?;
        tracing::info!(path = ?path, attachments = message.attachments.len(), "mail draft composed");
        Ok(())
    }
}

/// Subject line for a day's reports, e.g. `3/1/2024 Workout`.
pub fn workout_subject(date: NaiveDate) -> String {
    format!("{} Workout", date.format("%-m/%-d/%Y"))
}

/// Attaches report files to a message and passes it to the composer.
pub struct ReportSender<C: MailComposer> {
    composer: C,
}

impl<C: MailComposer> ReportSender<C> {
    pub fn new(composer: C) -> Self {
        Self { composer }
    }

    /// Send `files` with today's workout subject.
    pub async fn send_today(
        &self,
        files: &[ReportFile],
        recipient: &str,
    ) -> Result<MailMessage, MailError> {
        let subject = workout_subject(Local::now().date_naive());
        self.send(files, recipient, &subject).await
    }

    pub async fn send(
        &self,
        files: &[ReportFile],
        recipient: &str,
        subject: &str,
    ) -> Result<MailMessage, MailError> {
        let recipient = recipient.trim();
        if recipient.is_empty() || !recipient.contains('@') {
            return Err(MailError::InvalidRecipient(recipient.to_string()));
        }
        if files.is_empty() {
            return Err(MailError::NoAttachments);
        }

        let message = MailMessage {
            to: recipient.to_string(),
            subject: subject.to_string(),
            attachments: files
                .iter()
                .map(|f| Attachment {
                    file_name: f.name.clone(),
                    path: f.path.clone(),
                })
                .collect(),
        };
        self.composer.compose(&message).await?;
        Ok(message)
    }
}
