//! Speech-to-text collaborator used by the voice adapter.

use async_trait::async_trait;
use qabase_shared::{QaBaseError, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

/// User-Agent for outbound transcription requests.
const USER_AGENT: &str = concat!("qabase/", env!("CARGO_PKG_VERSION"));

/// Turns audio into text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe `audio` of the given MIME type.
    ///
    /// Service-side rejections are [`QaBaseError::Transcription`];
    /// transport problems are [`QaBaseError::Ingest`].
    async fn transcribe(&self, audio: &[u8], content_type: &str) -> Result<String>;
}

/// Response body of the transcription service.
#[derive(Debug, Deserialize)]
struct TranscriptResponse {
    text: String,
}

/// Posts raw audio to an HTTP endpoint and reads `{"text": "..."}` back.
pub struct HttpTranscriber {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl HttpTranscriber {
    /// Create a transcriber for `endpoint`. The adapter owns the timeout.
    pub fn new(endpoint: &str, api_key: Option<String>) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            QaBaseError::config(format!("invalid transcription endpoint '{endpoint}': {e}"))
        })?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| QaBaseError::Ingest(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

#[async_trait]
impl Transcriber for HttpTranscriber {
    #[instrument(skip_all, fields(endpoint = %self.endpoint, bytes = audio.len()))]
    async fn transcribe(&self, audio: &[u8], content_type: &str) -> Result<String> {
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(audio.to_vec());
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| QaBaseError::Ingest(format!("transcription service unreachable: {e}")))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(QaBaseError::Ingest(format!(
                "transcription service failed with {status}"
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QaBaseError::Transcription(format!(
                "transcription rejected with {status}: {}",
                body.trim()
            )));
        }

        let transcript: TranscriptResponse = response.json().await.map_err(|e| {
            QaBaseError::Transcription(format!("unreadable transcription response: {e}"))
        })?;
        debug!(chars = transcript.text.len(), "received transcript");
        Ok(transcript.text)
    }
}
