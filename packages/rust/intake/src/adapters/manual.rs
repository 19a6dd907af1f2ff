//! Manual submission form.

use async_trait::async_trait;
use qabase_shared::{QaBaseError, Result, Source, Submission};
use serde::Deserialize;
use tracing::debug;

use crate::{Intake, IntakeAdapter, is_blank};

/// A question and answer typed into the submission form.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualSubmission {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default, alias = "submitted_by")]
    pub submitted_by: Option<String>,
    /// Client-side idempotency key for retried form posts.
    #[serde(default, alias = "external_id")]
    pub external_id: Option<String>,
}

/// Produces one `pending` submission per form post.
pub struct ManualAdapter;

#[async_trait]
impl IntakeAdapter for ManualAdapter {
    type Raw = ManualSubmission;

    fn source(&self) -> Source {
        Source::Web
    }

    fn name(&self) -> &str {
        "manual"
    }

    async fn ingest(&self, raw: ManualSubmission) -> Result<Intake> {
        if is_blank(&raw.question) {
            return Err(QaBaseError::validation("question must not be empty"));
        }
        if is_blank(&raw.answer) {
            return Err(QaBaseError::validation("answer must not be empty"));
        }
        debug!(adapter = self.name(), "accepted manual submission");

        let submission = Submission::answered(Source::Web, raw.question, raw.answer)
            .submitted_by(raw.submitted_by)
            .external_id(raw.external_id);
        Ok(Intake::single(submission))
    }
}
