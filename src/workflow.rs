use crate::audio::{AudioArtifact, AudioSlot, Player};
use crate::catalog::VoicePersona;
use crate::error::{EmptyInput, StoryError, StoryResult};
use crate::llm::LlmClient;
use crate::prompt::StoryRequest;
use crate::state::{GeneratedStory, Phase, SessionId, SessionStore};
use crate::tts::SpeechSynthesizer;
use log::{debug, info, warn};
use std::path::PathBuf;
use std::time::SystemTime;

/// Outcome of the chained "generate then narrate" action.
///
/// The story is always present; narration may have failed independently.
#[derive(Debug)]
pub struct StoryCycle {
    pub story: String,
    pub narration: StoryResult<AudioArtifact>,
}

pub struct StoryOrchestrator {
    llm: Box<dyn LlmClient>,
    tts: Box<dyn SpeechSynthesizer>,
    sessions: SessionStore,
    output_dir: PathBuf,
    player: Player,
}

impl StoryOrchestrator {
    pub fn new(
        llm: Box<dyn LlmClient>,
        tts: Box<dyn SpeechSynthesizer>,
        output_dir: impl Into<PathBuf>,
        player: Player,
    ) -> Self {
        Self {
            llm,
            tts,
            sessions: SessionStore::new(),
            output_dir: output_dir.into(),
            player,
        }
    }

    /// Generates a story and stores it as the session's current story.
    ///
    /// The previous story is only replaced on success.
    pub async fn generate(&self, session: SessionId, request: &StoryRequest) -> StoryResult<String> {
        if request.topic.trim().is_empty() {
            return Err(StoryError::EmptyInput(EmptyInput::Topic));
        }

        self.sessions
            .update(session, |s| {
                s.phase = Phase::Generating;
                s.last_error = None;
            })
            .await;

        info!(
            "[{}] generating story: topic={:?}, types={}, length={}",
            session,
            request.topic,
            request.story_types.len(),
            request.target_length
        );

        match self.llm.chat(&request.messages()).await {
            Ok(text) => {
                debug!(
                    "[{}] story has {} chars (target {})",
                    session,
                    text.chars().count(),
                    request.target_length
                );
                let story = GeneratedStory {
                    text: text.clone(),
                    produced_at: SystemTime::now(),
                };
                self.sessions
                    .update(session, |s| {
                        s.story = Some(story);
                        s.phase = Phase::Generated;
                    })
                    .await;
                Ok(text)
            }
            Err(e) => {
                warn!("[{}] generation failed: {}", session, e);
                let message = e.to_string();
                self.sessions
                    .update(session, |s| {
                        s.phase = Phase::Failed;
                        s.last_error = Some(message);
                    })
                    .await;
                Err(e)
            }
        }
    }

    /// Runs one synthesis call. Blank text never reaches the speech service.
    pub async fn synthesize(&self, text: &str, voice_id: &str) -> StoryResult<Vec<u8>> {
        if text.trim().is_empty() {
            return Err(StoryError::EmptyInput(EmptyInput::Text));
        }
        self.tts.synthesize(text, voice_id).await.into_audio()
    }

    /// Narrates the session's current story into its audio slot and starts
    /// playback. On failure the story stays as it was.
    pub async fn narrate(&self, session: SessionId, persona: VoicePersona) -> StoryResult<AudioArtifact> {
        let story = self
            .sessions
            .snapshot(session)
            .await
            .story
            .ok_or(StoryError::EmptyInput(EmptyInput::NoStory))?;

        self.sessions
            .update(session, |s| {
                s.phase = Phase::Synthesizing;
                s.last_error = None;
            })
            .await;

        info!("[{}] narrating with {}", session, persona.voice_id());

        match self.render(session, &story.text, persona).await {
            Ok(artifact) => {
                if let Err(e) = self.player.play(&artifact.path) {
                    warn!("[{}] playback not started: {:#}", session, e);
                }
                let stored = artifact.clone();
                self.sessions
                    .update(session, |s| {
                        s.audio = Some(stored);
                        s.phase = Phase::Played;
                    })
                    .await;
                Ok(artifact)
            }
            Err(e) => {
                warn!("[{}] narration failed: {}", session, e);
                let message = e.to_string();
                self.sessions
                    .update(session, |s| {
                        s.phase = Phase::Generated;
                        s.last_error = Some(message);
                    })
                    .await;
                Err(e)
            }
        }
    }

    async fn render(&self, session: SessionId, text: &str, persona: VoicePersona) -> StoryResult<AudioArtifact> {
        let bytes = self.synthesize(text, persona.voice_id()).await?;
        AudioSlot::new(&self.output_dir, session.to_string())
            .store(bytes, self.tts.mime_type())
            .await
            .map_err(|e| StoryError::Audio(format!("{:#}", e)))
    }

    /// Generates a story and narrates it right away.
    pub async fn generate_and_narrate(
        &self,
        session: SessionId,
        request: &StoryRequest,
        persona: VoicePersona,
    ) -> StoryResult<StoryCycle> {
        let story = self.generate(session, request).await?;
        let narration = self.narrate(session, persona).await;
        Ok(StoryCycle { story, narration })
    }

    pub async fn phase(&self, session: SessionId) -> Phase {
        self.sessions.snapshot(session).await.phase
    }

    pub async fn story(&self, session: SessionId) -> Option<String> {
        self.sessions.snapshot(session).await.story.map(|s| s.text)
    }

    pub async fn audio(&self, session: SessionId) -> Option<AudioArtifact> {
        self.sessions.snapshot(session).await.audio
    }

    pub async fn last_error(&self, session: SessionId) -> Option<String> {
        self.sessions.snapshot(session).await.last_error
    }

    pub async fn end_session(&self, session: SessionId) {
        if self.sessions.remove(session).await.is_some() {
            debug!("[{}] session closed", session);
        }
    }
}
