use crate::config::Config;
use crate::error::{CancellationReason, StoryError, StoryResult};
use async_trait::async_trait;
use log::info;
use std::time::Duration;

pub mod azure;
pub mod edge;

/// Result of a single synthesis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisOutcome {
    Completed(Vec<u8>),
    Canceled {
        reason: CancellationReason,
        error_details: Option<String>,
    },
}

impl SynthesisOutcome {
    pub fn canceled_with_error(details: impl Into<String>) -> Self {
        SynthesisOutcome::Canceled {
            reason: CancellationReason::Error,
            error_details: Some(details.into()),
        }
    }

    pub fn into_audio(self) -> StoryResult<Vec<u8>> {
        match self {
            SynthesisOutcome::Completed(bytes) => Ok(bytes),
            SynthesisOutcome::Canceled { reason, error_details } => {
                Err(StoryError::SpeechCanceled { reason, error_details })
            }
        }
    }
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice_id: &str) -> SynthesisOutcome;

    /// MIME type of the bytes returned by `synthesize`.
    fn mime_type(&self) -> &str {
        "audio/mpeg"
    }
}

pub fn create_tts_client(config: &Config) -> StoryResult<Box<dyn SpeechSynthesizer>> {
    info!("Initializing TTS client for provider: {}", config.audio.provider);
    let timeout = Duration::from_secs(config.audio.timeout_seconds);
    match config.audio.provider.as_str() {
        "azure" => {
            let azure = config.azure.as_ref().ok_or_else(|| {
                StoryError::Config("Missing speech key or region in configuration".to_string())
            })?;
            let mut client = azure::AzureSpeechClient::new(
                &azure.speech_key,
                &azure.region,
                &config.audio.output_format,
                timeout,
            )?;
            if let Some(endpoint) = azure.endpoint.as_deref().filter(|e| !e.trim().is_empty()) {
                client = client.with_endpoint(endpoint);
            }
            Ok(Box::new(client))
        }
        "edge-tts" => Ok(Box::new(edge::EdgeTtsClient::new(
            &config.audio.output_format,
            timeout,
        ))),
        other => Err(StoryError::Config(format!("Unknown TTS provider: {}", other))),
    }
}

pub(crate) fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

pub(crate) fn build_ssml(text: &str, voice_id: &str) -> String {
    format!(
        "<speak version='1.0' xmlns='http://www.w3.org/2001/10/synthesis' xml:lang='zh-CN'><voice name='{}'>{}</voice></speak>",
        voice_id,
        escape_xml(text)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AzureConfig;

    #[test]
    fn test_ssml_escapes_text() {
        let ssml = build_ssml("小熊说:\"你好 & <再见>\"", "zh-CN-XiaoyouNeural");
        assert!(ssml.contains("<voice name='zh-CN-XiaoyouNeural'>"));
        assert!(ssml.contains("小熊说:&quot;你好 &amp; &lt;再见&gt;&quot;"));
        assert!(ssml.starts_with("<speak "));
        assert!(ssml.ends_with("</speak>"));
    }

    #[test]
    fn test_outcome_into_audio() {
        assert_eq!(
            SynthesisOutcome::Completed(vec![1, 2]).into_audio().unwrap(),
            vec![1, 2]
        );
        let err = SynthesisOutcome::canceled_with_error("boom")
            .into_audio()
            .unwrap_err();
        match err {
            StoryError::SpeechCanceled { reason, error_details } => {
                assert_eq!(reason, CancellationReason::Error);
                assert_eq!(error_details.as_deref(), Some("boom"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_create_tts_client_by_provider() {
        let mut config = Config::default();
        assert!(create_tts_client(&config).is_err());

        config.azure = Some(AzureConfig {
            speech_key: "key".to_string(),
            region: "eastasia".to_string(),
            ..Default::default()
        });
        assert!(create_tts_client(&config).is_ok());

        config.audio.provider = "edge-tts".to_string();
        assert!(create_tts_client(&config).is_ok());

        config.audio.provider = "unknown".to_string();
        assert!(matches!(create_tts_client(&config), Err(StoryError::Config(_))));
    }
}
