//! Optional voice input and output.
//!
//! Speech capture and synthesis are provided by the platform through a
//! [`VoiceBackend`]. Nothing in the streaming core depends on it; when no
//! backend is available every attempt fails immediately with
//! [`ChatError::UnsupportedCapability`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::defaults;
use crate::error::ChatError;
use crate::types::Message;

/// Parameters for recognition and synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechSettings {
    pub language: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    /// Deliver partial transcripts while the user is still speaking.
    pub interim_results: bool,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            language: defaults::voice::LANGUAGE.to_string(),
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
            interim_results: true,
        }
    }
}

/// Platform speech capability.
#[async_trait]
pub trait VoiceBackend: Send + Sync {
    /// Whether speech is supported at all in this environment.
    fn is_available(&self) -> bool;

    /// Begin a single-utterance capture. Transcripts are delivered by the
    /// platform out of band.
    async fn start_capture(&self, settings: &SpeechSettings) -> Result<(), ChatError>;

    async fn stop_capture(&self) -> Result<(), ChatError>;

    async fn speak(&self, text: &str, settings: &SpeechSettings) -> Result<(), ChatError>;

    async fn stop_speaking(&self) -> Result<(), ChatError>;
}

/// Backend for environments without speech support.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVoice;

fn unsupported() -> ChatError {
    ChatError::UnsupportedCapability("speech is not available in this environment".to_string())
}

#[async_trait]
impl VoiceBackend for NoVoice {
    fn is_available(&self) -> bool {
        false
    }

    async fn start_capture(&self, _settings: &SpeechSettings) -> Result<(), ChatError> {
        Err(unsupported())
    }

    async fn stop_capture(&self) -> Result<(), ChatError> {
        Err(unsupported())
    }

    async fn speak(&self, _text: &str, _settings: &SpeechSettings) -> Result<(), ChatError> {
        Err(unsupported())
    }

    async fn stop_speaking(&self) -> Result<(), ChatError> {
        Err(unsupported())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenToggle {
    /// Capture started; the caller should clear its pending input.
    Started,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakToggle {
    Started,
    /// Playback that was already running was stopped; nothing new started.
    Stopped,
}

/// Tracks listening/speaking state on top of a [`VoiceBackend`].
#[derive(Debug)]
pub struct VoiceController<B> {
    backend: B,
    settings: SpeechSettings,
    listening: bool,
    speaking: Option<Message>,
}

impl<B: VoiceBackend> VoiceController<B> {
    pub fn new(backend: B) -> Self {
        Self::with_settings(backend, SpeechSettings::default())
    }

    pub fn with_settings(backend: B, settings: SpeechSettings) -> Self {
        Self {
            backend,
            settings,
            listening: false,
            speaking: None,
        }
    }

    pub fn settings(&self) -> &SpeechSettings {
        &self.settings
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking.is_some()
    }

    /// Message currently being read aloud.
    pub fn speaking_message(&self) -> Option<&Message> {
        self.speaking.as_ref()
    }

    pub async fn toggle_listening(&mut self) -> Result<ListenToggle, ChatError> {
        if !self.backend.is_available() {
            return Err(unsupported());
        }
        if self.listening {
            self.backend.stop_capture().await?;
            self.listening = false;
            debug!("voice capture stopped");
            Ok(ListenToggle::Stopped)
        } else {
            self.backend.start_capture(&self.settings).await?;
            self.listening = true;
            debug!(language = %self.settings.language, "voice capture started");
            Ok(ListenToggle::Started)
        }
    }

    /// Read `message` aloud, or stop if something is already playing.
    pub async fn toggle_speaking(&mut self, message: &Message) -> Result<SpeakToggle, ChatError> {
        if self.speaking.is_some() {
            self.backend.stop_speaking().await?;
            self.speaking = None;
            return Ok(SpeakToggle::Stopped);
        }
        if !self.backend.is_available() {
            return Err(unsupported());
        }
        self.backend.speak(message.content(), &self.settings).await?;
        self.speaking = Some(message.clone());
        Ok(SpeakToggle::Started)
    }

    /// The platform ended capture (end of utterance or error).
    pub fn on_capture_ended(&mut self) {
        self.listening = false;
    }

    /// The platform finished playback.
    pub fn on_playback_ended(&mut self) {
        self.speaking = None;
    }
}

/// Join partial recognition results into the text that replaces the input.
pub fn transcript<S: AsRef<str>>(results: &[S]) -> String {
    results.iter().map(AsRef::as_ref).collect()
}
