//! Intake adapters: turn channel-specific payloads into [`Submission`]s.
//!
//! Each channel (manual form, CSV batch, voice, chat) has an adapter that
//! validates its raw payload and produces zero or more submissions with the
//! channel's source, attribution and initial status already decided.
//! Adapters never touch storage; the lifecycle engine does that.

pub mod adapters;
pub mod transcriber;

use async_trait::async_trait;
use qabase_shared::{Result, RowError, Source, Submission};

pub use adapters::{
    ChatAdapter, ChatQuestion, CsvBatchAdapter, ManualAdapter, ManualSubmission, VoiceAdapter,
    VoiceUpload, split_transcript,
};
pub use transcriber::{HttpTranscriber, Transcriber};

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// A submission tagged with the payload row it came from (1-based).
#[derive(Debug, Clone, PartialEq)]
pub struct IntakeItem {
    pub row: usize,
    pub submission: Submission,
}

/// What an adapter produced from one payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Intake {
    /// Submissions ready for the engine, in payload order.
    pub items: Vec<IntakeItem>,
    /// Rows that were rejected without stopping the rest of the payload.
    pub row_errors: Vec<RowError>,
}

impl Intake {
    /// A payload that yields exactly one submission.
    pub fn single(submission: Submission) -> Self {
        Self {
            items: vec![IntakeItem { row: 1, submission }],
            row_errors: Vec::new(),
        }
    }
}

/// Trait for channel-specific intake.
///
/// Whole-payload problems (bad header, empty audio, failed transcription)
/// are errors; per-row problems in batch payloads go into
/// [`Intake::row_errors`].
#[async_trait]
pub trait IntakeAdapter: Send + Sync {
    /// The raw payload this channel accepts.
    type Raw: Send + 'static;

    /// Intake channel recorded on every produced entry.
    fn source(&self) -> Source;

    /// Human-readable adapter name for tracing.
    fn name(&self) -> &str;

    /// Validate and convert one payload.
    async fn ingest(&self, raw: Self::Raw) -> Result<Intake>;
}

/// Whether `text` still has content after normalization.
pub(crate) fn is_blank(text: &str) -> bool {
    qabase_normalizer::normalize(text).is_empty()
}
