use crate::error::{CancellationReason, StoryError, StoryResult};
use crate::tts::{build_ssml, SpeechSynthesizer, SynthesisOutcome};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use std::time::Duration;

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const OUTPUT_FORMAT_HEADER: &str = "X-Microsoft-OutputFormat";

/// Azure Cognitive Services speech, REST flavour.
pub struct AzureSpeechClient {
    endpoint: String,
    output_format: String,
    headers: HeaderMap,
    client: reqwest::Client,
}

impl AzureSpeechClient {
    pub fn new(
        speech_key: &str,
        region: &str,
        output_format: &str,
        timeout: Duration,
    ) -> StoryResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            SUBSCRIPTION_KEY_HEADER,
            HeaderValue::from_str(speech_key)
                .map_err(|e| StoryError::Config(format!("invalid speech key: {}", e)))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/ssml+xml"));
        headers.insert(
            OUTPUT_FORMAT_HEADER,
            HeaderValue::from_str(output_format)
                .map_err(|e| StoryError::Config(format!("invalid output format: {}", e)))?,
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("storybot"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoryError::Config(format!("failed to build http client: {}", e)))?;

        Ok(Self {
            endpoint: format!(
                "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
                region.trim()
            ),
            output_format: output_format.to_string(),
            headers,
            client,
        })
    }

    /// Replaces the regional endpoint, e.g. for sovereign clouds or a
    /// private container deployment.
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim().to_string();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SpeechSynthesizer for AzureSpeechClient {
    async fn synthesize(&self, text: &str, voice_id: &str) -> SynthesisOutcome {
        let ssml = build_ssml(text, voice_id);
        debug!(
            "Azure TTS: {} chars, voice {}, format {}",
            text.chars().count(),
            voice_id,
            self.output_format
        );

        let resp = match self
            .client
            .post(&self.endpoint)
            .headers(self.headers.clone())
            .body(ssml)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("Azure TTS request failed: {}", e);
                return SynthesisOutcome::canceled_with_error(e.to_string());
            }
        };

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!("Azure TTS returned {}", status);
            return SynthesisOutcome::canceled_with_error(format!("{}: {}", status, body.trim()));
        }

        match resp.bytes().await {
            Ok(bytes) if bytes.is_empty() => SynthesisOutcome::Canceled {
                reason: CancellationReason::EndOfStream,
                error_details: None,
            },
            Ok(bytes) => SynthesisOutcome::Completed(bytes.to_vec()),
            Err(e) => SynthesisOutcome::canceled_with_error(e.to_string()),
        }
    }

    fn mime_type(&self) -> &str {
        mime_for_format(&self.output_format)
    }
}

pub fn mime_for_format(output_format: &str) -> &'static str {
    if output_format.ends_with("mp3") {
        "audio/mpeg"
    } else if output_format.starts_with("riff") {
        "audio/wav"
    } else if output_format.starts_with("ogg") {
        "audio/ogg"
    } else if output_format.starts_with("webm") {
        "audio/webm"
    } else {
        "application/octet-stream"
    }
}
