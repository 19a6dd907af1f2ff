//! Voice intake: audio → transcript → question/answer pair.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use qabase_shared::{QaBaseError, Result, Source, Submission};
use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::{info, instrument};

use crate::transcriber::Transcriber;
use crate::{Intake, IntakeAdapter, is_blank};

/// MIME type forwarded when the upload does not declare one.
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// An uploaded recording.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoiceUpload {
    pub audio: Vec<u8>,
    pub content_type: Option<String>,
    pub submitted_by: Option<String>,
}

/// Transcribes a recording and produces one `pending` submission.
///
/// The SHA-256 of the audio is the dedup key, so a redelivered upload maps
/// to the entry created the first time.
pub struct VoiceAdapter {
    transcriber: Arc<dyn Transcriber>,
    timeout: Duration,
}

impl VoiceAdapter {
    pub fn new(transcriber: Arc<dyn Transcriber>, timeout: Duration) -> Self {
        Self {
            transcriber,
            timeout,
        }
    }
}

#[async_trait]
impl IntakeAdapter for VoiceAdapter {
    type Raw = VoiceUpload;

    fn source(&self) -> Source {
        Source::Voice
    }

    fn name(&self) -> &str {
        "voice"
    }

    #[instrument(skip_all, fields(adapter = "voice", bytes = raw.audio.len()))]
    async fn ingest(&self, raw: VoiceUpload) -> Result<Intake> {
        if raw.audio.is_empty() {
            return Err(QaBaseError::validation("audio payload is empty"));
        }
        let content_type = match raw.content_type.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_CONTENT_TYPE.to_string(),
            Some(ct) if ct.to_ascii_lowercase().starts_with("audio/") => ct.to_string(),
            Some(ct) => {
                return Err(QaBaseError::validation(format!(
                    "expected an audio/* content type, got '{ct}'"
                )));
            }
        };

        let transcript = tokio::time::timeout(
            self.timeout,
            self.transcriber.transcribe(&raw.audio, &content_type),
        )
        .await
        .map_err(|_| {
            QaBaseError::Ingest(format!("transcription timed out after {:?}", self.timeout))
        })??;

        let (question, answer) = split_transcript(&transcript).ok_or_else(|| {
            QaBaseError::Transcription(
                "transcript does not contain both a question and an answer".into(),
            )
        })?;
        let audio_hash = format!("{:x}", Sha256::digest(&raw.audio));
        info!(hash = %audio_hash, "transcribed voice submission");

        let submission = Submission::answered(Source::Voice, question, answer)
            .submitted_by(raw.submitted_by)
            .external_id(Some(audio_hash));
        Ok(Intake::single(submission))
    }
}

/// Split a transcript into `(question, answer)`.
///
/// Explicit markers win and may appear anywhere in the transcript
/// (`Question:`/`Answer:`, `Q:`/`A:`, `Вопрос:`/`Ответ:`, any case). A
/// single-letter `A:` only counts at the start of a line or right after
/// sentence punctuation, so "plan A: ..." stays inside the question.
/// Without markers the first line is the question and the remaining lines
/// are the answer. Returns `None` if either part is blank.
pub fn split_transcript(transcript: &str) -> Option<(String, String)> {
    static MARKERS_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(concat!(
            r"(?is)\b(?:question|вопрос|q)\s*:\s*(?P<q>.+?)",
            r"(?:\s*\b(?:answer|ответ)|(?P<nl>[.!?])?[ \t]*\n\s*a|(?P<punct>[.!?])\s*a)",
            r"\s*:\s*(?P<a>.+)",
        ))
        .expect("valid regex")
    });

    let (question, answer) = match MARKERS_RE.captures(transcript) {
        Some(caps) => {
            let end = caps
                .name("nl")
                .or_else(|| caps.name("punct"))
                .map_or("", |m| m.as_str());
            (format!("{}{end}", &caps["q"]), caps["a"].to_string())
        }
        None => {
            let trimmed = transcript.trim();
            let (first, rest) = trimmed.split_once('\n')?;
            (first.to_string(), rest.to_string())
        }
    };

    if is_blank(&question) || is_blank(&answer) {
        return None;
    }
    Some((question.trim().to_string(), answer.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use qabase_shared::Status;

    struct FixedTranscriber(&'static str);

    #[async_trait]
    impl Transcriber for FixedTranscriber {
        async fn transcribe(&self, _audio: &[u8], _content_type: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct SlowTranscriber;

    #[async_trait]
    impl Transcriber for SlowTranscriber {
        async fn transcribe(&self, _audio: &[u8], _content_type: &str) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(String::new())
        }
    }

    struct FailingTranscriber;

    #[async_trait]
    impl Transcriber for FailingTranscriber {
        async fn transcribe(&self, _audio: &[u8], _content_type: &str) -> Result<String> {
            Err(QaBaseError::Transcription("no speech detected".into()))
        }
    }

    fn upload(audio: &[u8]) -> VoiceUpload {
        VoiceUpload {
            audio: audio.to_vec(),
            content_type: Some("audio/webm".into()),
            submitted_by: Some("erin".into()),
        }
    }

    fn adapter(transcriber: impl Transcriber + 'static) -> VoiceAdapter {
        VoiceAdapter::new(Arc::new(transcriber), Duration::from_secs(5))
    }

    #[test]
    fn split_with_markers() {
        assert_eq!(
            split_transcript("Question: Where is the printer? Answer: Next to the kitchen."),
            Some((
                "Where is the printer?".to_string(),
                "Next to the kitchen.".to_string()
            ))
        );
        assert_eq!(
            split_transcript("вопрос: Когда зарплата?\nответ: Пятого числа."),
            Some(("Когда зарплата?".to_string(), "Пятого числа.".to_string()))
        );
    }

    #[test]
    fn split_by_first_line() {
        assert_eq!(
            split_transcript("How do I get a badge?\nAsk reception.\nBring ID."),
            Some((
                "How do I get a badge?".to_string(),
                "Ask reception.\nBring ID.".to_string()
            ))
        );
    }

    #[test]
    fn letter_a_inside_question_is_not_a_marker() {
        assert_eq!(
            split_transcript("Question: Should I use plan A: the cheap one? Answer: Yes."),
            Some((
                "Should I use plan A: the cheap one?".to_string(),
                "Yes.".to_string()
            ))
        );
        assert_eq!(
            split_transcript("Q: Is plan A: the cheap one ok? A: Yes."),
            Some((
                "Is plan A: the cheap one ok?".to_string(),
                "Yes.".to_string()
            ))
        );
    }

    #[test]
    fn short_markers_on_separate_lines() {
        assert_eq!(
            split_transcript("Q: Where do I park\nA: Level -2."),
            Some(("Where do I park".to_string(), "Level -2.".to_string()))
        );
    }

    #[test]
    fn markers_after_a_preamble() {
        assert_eq!(
            split_transcript("Okay recording. Question: Where is the printer? Answer: Next to the kitchen."),
            Some((
                "Where is the printer?".to_string(),
                "Next to the kitchen.".to_string()
            ))
        );
        assert_eq!(
            split_transcript("Запись. ВОПРОС: Где принтер? ОТВЕТ: У кухни."),
            Some(("Где принтер?".to_string(), "У кухни.".to_string()))
        );
    }

    #[test]
    fn split_rejects_question_only() {
        assert_eq!(split_transcript("Just one sentence."), None);
        assert_eq!(split_transcript("Question: something? Answer:   "), None);
        assert_eq!(split_transcript(""), None);
    }

    #[tokio::test]
    async fn transcribes_into_pending_submission() {
        let intake = adapter(FixedTranscriber("Q: Is Friday casual? A: Yes."))
            .ingest(upload(b"RIFF0000WAVE"))
            .await
            .expect("ingest");

        let sub = &intake.items[0].submission;
        assert_eq!(sub.source, Source::Voice);
        assert_eq!(sub.status, Status::Pending);
        assert_eq!(sub.question, "Is Friday casual?");
        assert_eq!(sub.answer.as_deref(), Some("Yes."));
        assert_eq!(sub.external_id.as_ref().map(String::len), Some(64));
    }

    #[tokio::test]
    async fn same_audio_same_dedup_key() {
        let a = adapter(FixedTranscriber("Q: x? A: y."));
        let first = a.ingest(upload(b"abc")).await.unwrap();
        let second = a.ingest(upload(b"abc")).await.unwrap();
        assert_eq!(
            first.items[0].submission.external_id,
            second.items[0].submission.external_id
        );
    }

    #[tokio::test]
    async fn unusable_transcript_is_transcription_error() {
        let err = adapter(FixedTranscriber("mumble"))
            .ingest(upload(b"abc"))
            .await
            .unwrap_err();
        assert!(matches!(err, QaBaseError::Transcription(_)));
    }

    #[tokio::test]
    async fn transcriber_failure_propagates() {
        let err = adapter(FailingTranscriber)
            .ingest(upload(b"abc"))
            .await
            .unwrap_err();
        assert!(matches!(err, QaBaseError::Transcription(_)));
    }

    #[tokio::test]
    async fn timeout_is_ingest_error() {
        let err = VoiceAdapter::new(Arc::new(SlowTranscriber), Duration::from_millis(50))
            .ingest(upload(b"abc"))
            .await
            .unwrap_err();
        assert!(matches!(err, QaBaseError::Ingest(_)));
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn rejects_empty_audio_and_wrong_content_type() {
        let a = adapter(FixedTranscriber("Q: x? A: y."));
        let err = a.ingest(upload(b"")).await.unwrap_err();
        assert!(matches!(err, QaBaseError::Validation { .. }));

        for declared in ["text/plain", "application/octet-stream"] {
            let mut wrong = upload(b"abc");
            wrong.content_type = Some(declared.into());
            let err = a.ingest(wrong).await.unwrap_err();
            assert!(matches!(err, QaBaseError::Validation { .. }), "{declared}");
        }
    }

    #[tokio::test]
    async fn undeclared_content_type_is_accepted() {
        let mut raw = upload(b"abc");
        raw.content_type = None;
        let intake = adapter(FixedTranscriber("Q: x? A: y."))
            .ingest(raw)
            .await
            .expect("ingest");
        assert_eq!(intake.items.len(), 1);
    }
}
