//! Text-to-speech synthesis

use async_trait::async_trait;

use crate::{Error, Result};

/// Google Translate TTS endpoint (key-less, MP3 output)
const GOOGLE_TTS_URL: &str = "https://translate.google.com/translate_tts";

/// Longest text the Google endpoint accepts per request
const GOOGLE_MAX_CHARS: usize = 200;

/// `OpenAI` speech endpoint (MP3 output)
const OPENAI_TTS_URL: &str = "https://api.openai.com/v1/audio/speech";

/// Synthesizes speech audio from text
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` spoken in `language`
    ///
    /// # Returns
    ///
    /// Audio bytes (MP3 or WAV)
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>>;
}

/// TTS backend
#[derive(Clone, Copy, Debug)]
enum TtsProvider {
    Google,
    OpenAI,
}

/// HTTP speech synthesizer
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: String,
    voice: String,
    speed: f32,
    model: String,
    provider: TtsProvider,
}

impl TextToSpeech {
    /// Create a TTS instance using the Google Translate endpoint
    #[must_use]
    pub fn new_google() -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: String::new(),
            voice: String::new(),
            speed: 1.0,
            model: String::new(),
            provider: TtsProvider::Google,
        }
    }

    /// Create a TTS instance using `OpenAI`
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_openai(api_key: String, voice: String, speed: f32, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("OpenAI API key required for TTS".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            voice,
            speed,
            model,
            provider: TtsProvider::OpenAI,
        })
    }

    /// Synthesize using Google Translate TTS
    async fn synthesize_google(&self, text: &str, language: &str) -> Result<Vec<u8>> {
        if text.chars().count() > GOOGLE_MAX_CHARS {
            return Err(Error::Tts(format!(
                "text longer than {GOOGLE_MAX_CHARS} characters"
            )));
        }

        let response = self
            .client
            .get(GOOGLE_TTS_URL)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", language),
                ("q", text),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("Google TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }

    /// Synthesize using `OpenAI` TTS; the language follows the text itself
    async fn synthesize_openai(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        let request = TtsRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: self.speed,
        };

        let response = self
            .client
            .post(OPENAI_TTS_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for TextToSpeech {
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>> {
        tracing::debug!(provider = ?self.provider, language, "synthesizing speech");
        match self.provider {
            TtsProvider::Google => self.synthesize_google(text, language).await,
            TtsProvider::OpenAI => self.synthesize_openai(text).await,
        }
    }
}
