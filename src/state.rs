use crate::audio::AudioArtifact;
use std::collections::HashMap;
use std::fmt;
use std::time::SystemTime;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position in the generate/narrate cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Generating,
    Generated,
    Failed,
    Synthesizing,
    Played,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedStory {
    pub text: String,
    pub produced_at: SystemTime,
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub phase: Phase,
    pub story: Option<GeneratedStory>,
    pub audio: Option<AudioArtifact>,
    pub last_error: Option<String>,
}

/// Per-session single-slot state.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, SessionState>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the session's state; unknown sessions read as idle.
    pub async fn snapshot(&self, id: SessionId) -> SessionState {
        self.sessions.read().await.get(&id).cloned().unwrap_or_default()
    }

    pub async fn update<F, R>(&self, id: SessionId, f: F) -> R
    where
        F: FnOnce(&mut SessionState) -> R,
    {
        let mut sessions = self.sessions.write().await;
        f(sessions.entry(id).or_default())
    }

    pub async fn remove(&self, id: SessionId) -> Option<SessionState> {
        self.sessions.write().await.remove(&id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_session_is_idle() {
        let store = SessionStore::new();
        let state = store.snapshot(SessionId::new()).await;
        assert_eq!(state.phase, Phase::Idle);
        assert!(state.story.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionStore::new();
        let a = SessionId::new();
        let b = SessionId::new();

        store
            .update(a, |s| {
                s.phase = Phase::Generated;
                s.story = Some(GeneratedStory {
                    text: "A".to_string(),
                    produced_at: SystemTime::now(),
                });
            })
            .await;

        assert_eq!(store.snapshot(a).await.story.unwrap().text, "A");
        assert!(store.snapshot(b).await.story.is_none());
        assert_eq!(store.len().await, 1);

        assert!(store.remove(a).await.is_some());
        assert!(store.is_empty().await);
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
        assert_eq!(SessionId::new().to_string().len(), 36);
    }
}
