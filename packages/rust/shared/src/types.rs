//! Core domain types for qabase.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::QaBaseError;

/// Current time at the precision entries are stored with (microseconds).
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

// ---------------------------------------------------------------------------
// EntryId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for entry identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub Uuid);

impl EntryId {
    /// Generate a new time-sortable entry identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for EntryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Moderation status of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Submitted with an answer, awaiting a moderator decision.
    Pending,
    /// Visible to search.
    Approved,
    /// Declined by a moderator.
    Rejected,
    /// A question from chat still waiting for an answer.
    Unanswered,
}

impl Status {
    /// Every status, in queue order.
    pub const ALL: [Status; 4] = [
        Status::Pending,
        Status::Unanswered,
        Status::Approved,
        Status::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Unanswered => "unanswered",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = QaBaseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "unanswered" => Ok(Self::Unanswered),
            other => Err(QaBaseError::invalid_argument(format!(
                "unknown status '{other}': expected one of pending, approved, rejected, unanswered"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// Intake channel an entry arrived through. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Manual submission form.
    Web,
    /// CSV bulk import.
    Csv,
    /// Voice transcription.
    Voice,
    /// Chat integration (question-only).
    Slack,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Csv => "csv",
            Self::Voice => "voice",
            Self::Slack => "slack",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Source {
    type Err = QaBaseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "web" => Ok(Self::Web),
            "csv" => Ok(Self::Csv),
            "voice" => Ok(Self::Voice),
            "slack" => Ok(Self::Slack),
            other => Err(QaBaseError::invalid_argument(format!(
                "unknown source '{other}'"
            ))),
        }
    }
}

/// Where a recorded answer came from. Channel answers keep their channel;
/// moderator answers are `manual`, admin overrides are `edit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerSource {
    Web,
    Csv,
    Voice,
    Slack,
    Manual,
    Edit,
}

impl From<Source> for AnswerSource {
    fn from(source: Source) -> Self {
        match source {
            Source::Web => Self::Web,
            Source::Csv => Self::Csv,
            Source::Voice => Self::Voice,
            Source::Slack => Self::Slack,
        }
    }
}

// ---------------------------------------------------------------------------
// QaEntry
// ---------------------------------------------------------------------------

/// One recorded answer in an entry's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub text: String,
    pub source: AnswerSource,
    pub created_at: DateTime<Utc>,
}

/// The canonical unit of knowledge.
///
/// `answers` is newest first; when `answer` is present it equals
/// `answers[0].text`. At most one of `submitted_by` and `chat_user` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QaEntry {
    pub id: EntryId,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_processed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_processed: Option<String>,
    pub status: Status,
    pub source: Source,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_user: Option<String>,
    /// Per-channel idempotency key (platform message id, audio hash).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default)]
    pub answers: Vec<AnswerRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
}

impl QaEntry {
    /// Whether the entry carries a non-blank current answer.
    pub fn has_answer(&self) -> bool {
        self.answer.as_deref().is_some_and(|a| !a.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// Who submitted an entry. The two attributions never coexist.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Attribution {
    #[default]
    Anonymous,
    SubmittedBy(String),
    ChatUser(String),
}

/// A raw record produced by an intake adapter, before it becomes an entry.
///
/// The adapter picks the initial status: `pending` when it supplies both a
/// question and an answer, `unanswered` for chat question-only messages.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub question: String,
    pub answer: Option<String>,
    pub source: Source,
    pub status: Status,
    pub attribution: Attribution,
    pub external_id: Option<String>,
}

impl Submission {
    /// A question with a proposed answer, awaiting moderation.
    pub fn answered(source: Source, question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: Some(answer.into()),
            source,
            status: Status::Pending,
            attribution: Attribution::Anonymous,
            external_id: None,
        }
    }

    /// A chat question without an answer.
    pub fn unanswered(question: impl Into<String>, chat_user: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: None,
            source: Source::Slack,
            status: Status::Unanswered,
            attribution: Attribution::ChatUser(chat_user.into()),
            external_id: None,
        }
    }

    /// Attach a submitter name; blank names are dropped.
    pub fn submitted_by(mut self, name: Option<String>) -> Self {
        if let Some(name) = name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) {
            self.attribution = Attribution::SubmittedBy(name);
        }
        self
    }

    /// Attach a dedup key; blank keys are dropped.
    pub fn external_id(mut self, key: Option<String>) -> Self {
        self.external_id = key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty());
        self
    }
}

// ---------------------------------------------------------------------------
// Edits, batch results, log items
// ---------------------------------------------------------------------------

/// Admin override fields. `status` stays a raw string so an unknown value
/// surfaces as an invalid-argument error from the edit itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryPatch {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl EntryPatch {
    pub fn is_empty(&self) -> bool {
        self.question.is_none() && self.answer.is_none() && self.status.is_none()
    }
}

/// A row of a batch import that could not be turned into an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    /// 1-based data row number (the header is not counted).
    pub row: usize,
    pub detail: String,
}

/// Outcome of a batch import. Partial success is still success.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub imported: usize,
    pub ids: Vec<EntryId>,
    pub errors: Vec<RowError>,
}

impl BatchReport {
    /// Some rows imported and some failed.
    pub fn is_partial(&self) -> bool {
        self.imported > 0 && !self.errors.is_empty()
    }
}

/// Submission history view of an entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionLogItem {
    pub id: EntryId,
    pub text: String,
    pub source: Source,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub answers: Vec<AnswerRecord>,
}

impl From<QaEntry> for QuestionLogItem {
    fn from(entry: QaEntry) -> Self {
        Self {
            id: entry.id,
            text: entry.question,
            source: entry.source,
            external_id: entry.external_id,
            status: entry.status,
            created_at: entry.created_at,
            answers: entry.answers,
        }
    }
}
