use crate::error::CancellationReason;
use crate::tts::azure::mime_for_format;
use crate::tts::{build_ssml, SpeechSynthesizer, SynthesisOutcome};
use async_trait::async_trait;
use log::{debug, warn};
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinError;

// The read-aloud endpoint does not carry every Azure neural voice.
const VOICE_SUBSTITUTES: &[(&str, &str)] = &[("zh-CN-XiaoyouNeural", "zh-CN-XiaoyiNeural")];

/// Keyless synthesis through the Edge read-aloud service.
pub struct EdgeTtsClient {
    output_format: String,
    timeout: Duration,
}

impl EdgeTtsClient {
    pub fn new(output_format: &str, timeout: Duration) -> Self {
        Self {
            output_format: output_format.to_string(),
            timeout,
        }
    }

    pub fn resolve_voice(voice_id: &str) -> &str {
        VOICE_SUBSTITUTES
            .iter()
            .find(|(from, _)| *from == voice_id)
            .map(|(_, to)| *to)
            .unwrap_or(voice_id)
    }
}

/// Waits for the blocking request, giving up after `timeout`.
///
/// The blocking thread itself cannot be cancelled; it finishes in the
/// background and its result is discarded.
async fn await_audio<F>(task: F, timeout: Duration) -> SynthesisOutcome
where
    F: Future<Output = Result<Result<Vec<u8>, String>, JoinError>>,
{
    match tokio::time::timeout(timeout, task).await {
        Err(_) => {
            warn!("Edge TTS timed out after {:?}", timeout);
            SynthesisOutcome::canceled_with_error(format!("timed out after {:?}", timeout))
        }
        Ok(Ok(Ok(bytes))) if bytes.is_empty() => SynthesisOutcome::Canceled {
            reason: CancellationReason::EndOfStream,
            error_details: None,
        },
        Ok(Ok(Ok(bytes))) => SynthesisOutcome::Completed(bytes),
        Ok(Ok(Err(e))) => {
            warn!("{}", e);
            SynthesisOutcome::canceled_with_error(e)
        }
        Ok(Err(e)) => SynthesisOutcome::canceled_with_error(format!("Edge TTS task failed: {}", e)),
    }
}

#[async_trait]
impl SpeechSynthesizer for EdgeTtsClient {
    async fn synthesize(&self, text: &str, voice_id: &str) -> SynthesisOutcome {
        let voice = Self::resolve_voice(voice_id);
        let ssml = build_ssml(text, voice);
        let output_format = self.output_format.clone();
        debug!("Edge TTS: {} chars, voice {}", text.chars().count(), voice);

        let task = tokio::task::spawn_blocking(move || {
            edge_tts::request_audio(&ssml, &output_format).map_err(|e| format!("Edge TTS crate error: {:?}", e))
        });

        await_audio(task, self.timeout).await
    }

    fn mime_type(&self) -> &str {
        mime_for_format(&self.output_format)
    }
}
