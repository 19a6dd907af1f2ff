//! Chat integration: questions nobody has answered yet.

use async_trait::async_trait;
use qabase_shared::{QaBaseError, Result, Source, Submission};
use serde::Deserialize;
use tracing::debug;

use crate::{Intake, IntakeAdapter, is_blank};

/// A question relayed by the chat bot after search found nothing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatQuestion {
    #[serde(default)]
    pub question: String,
    /// Platform user id of the asker.
    #[serde(default, alias = "chat_user")]
    pub chat_user: String,
    /// Platform message id; redelivered messages reuse the first entry.
    #[serde(default, alias = "external_id")]
    pub external_id: Option<String>,
}

/// Produces one `unanswered` submission per chat question.
pub struct ChatAdapter;

#[async_trait]
impl IntakeAdapter for ChatAdapter {
    type Raw = ChatQuestion;

    fn source(&self) -> Source {
        Source::Slack
    }

    fn name(&self) -> &str {
        "chat"
    }

    async fn ingest(&self, raw: ChatQuestion) -> Result<Intake> {
        if is_blank(&raw.question) {
            return Err(QaBaseError::validation("question must not be empty"));
        }
        let chat_user = raw.chat_user.trim();
        if chat_user.is_empty() {
            return Err(QaBaseError::validation("chatUser is required"));
        }
        debug!(adapter = self.name(), chat_user, "accepted chat question");

        let submission =
            Submission::unanswered(raw.question, chat_user).external_id(raw.external_id);
        Ok(Intake::single(submission))
    }
}
