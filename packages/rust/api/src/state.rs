//! Shared handler state.

use std::sync::Arc;

use qabase_core::{LifecycleEngine, SearchIndex};
use qabase_intake::{HttpTranscriber, Transcriber, VoiceAdapter};
use qabase_shared::{AppConfig, ListingConfig, Result};
use qabase_storage::Storage;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<LifecycleEngine>,
    pub search: SearchIndex,
    /// `None` when no transcription endpoint is configured.
    pub voice: Option<Arc<VoiceAdapter>>,
    pub listing: ListingConfig,
    pub max_body_bytes: usize,
}

impl AppState {
    /// State over an already opened database, without voice intake.
    pub fn new(storage: Arc<Storage>, config: &AppConfig) -> Self {
        Self {
            engine: Arc::new(LifecycleEngine::new(Arc::clone(&storage))),
            search: SearchIndex::new(storage, config.search.result_limit),
            voice: None,
            listing: config.listing.clone(),
            max_body_bytes: config.server.max_body_bytes,
        }
    }

    /// Enable voice intake through `transcriber`.
    pub fn with_transcriber(mut self, transcriber: Arc<dyn Transcriber>, config: &AppConfig) -> Self {
        self.voice = Some(Arc::new(VoiceAdapter::new(
            transcriber,
            config.transcription.timeout(),
        )));
        self
    }

    /// Open the configured database and transcription client.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let path = config.storage.resolved_path()?;
        let storage = Arc::new(Storage::open(&path).await?);
        info!(path = %path.display(), "storage opened");

        let state = Self::new(storage, config);
        match config.transcription.endpoint.as_deref() {
            Some(endpoint) => {
                let api_key = config.transcription.api_key();
                if api_key.is_none() {
                    warn!(
                        env = %config.transcription.api_key_env,
                        "transcription API key not set, sending unauthenticated requests"
                    );
                }
                let transcriber = HttpTranscriber::new(endpoint, api_key)?;
                Ok(state.with_transcriber(Arc::new(transcriber), config))
            }
            None => {
                info!("no transcription endpoint configured, voice intake disabled");
                Ok(state)
            }
        }
    }
}
