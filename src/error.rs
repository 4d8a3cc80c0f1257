use std::fmt;
use thiserror::Error;

/// Why a synthesis call did not produce audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancellationReason {
    Error,
    EndOfStream,
    Unknown,
}

impl fmt::Display for CancellationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CancellationReason::Error => "Error",
            CancellationReason::EndOfStream => "EndOfStream",
            CancellationReason::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// Input rejected before any network call is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyInput {
    Topic,
    Text,
    NoStory,
}

impl fmt::Display for EmptyInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EmptyInput::Topic => "请先输入故事主题",
            EmptyInput::Text => "朗读内容为空",
            EmptyInput::NoStory => "还没有生成故事",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum StoryError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("request failed {status}")]
    GenerationHttp { status: u16 },

    #[error("unexpected generation response: {0}")]
    GenerationParse(String),

    #[error("generation request error: {0}")]
    GenerationTransport(String),

    #[error("speech synthesis canceled: {reason}{}", .error_details.as_deref().map(|d| format!(" ({})", d)).unwrap_or_default())]
    SpeechCanceled {
        reason: CancellationReason,
        error_details: Option<String>,
    },

    #[error("{0}")]
    EmptyInput(EmptyInput),

    #[error("audio output error: {0}")]
    Audio(String),
}

pub type StoryResult<T> = std::result::Result<T, StoryError>;
