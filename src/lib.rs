pub mod audio;
pub mod catalog;
pub mod config;
pub mod error;
pub mod form;
pub mod llm;
pub mod prompt;
pub mod setup;
pub mod state;
pub mod tts;
pub mod workflow;

#[cfg(test)]
mod test_server;

pub use error::{StoryError, StoryResult};
pub use workflow::{StoryCycle, StoryOrchestrator};
