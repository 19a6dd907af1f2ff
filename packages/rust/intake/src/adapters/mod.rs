//! Built-in intake adapters, one per channel.

mod batch;
mod chat;
mod manual;
mod voice;

pub use batch::CsvBatchAdapter;
pub use chat::{ChatAdapter, ChatQuestion};
pub use manual::{ManualAdapter, ManualSubmission};
pub use voice::{VoiceAdapter, VoiceUpload, split_transcript};
