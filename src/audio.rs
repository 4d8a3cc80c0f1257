use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio::task::JoinHandle;

/// Rendered narration, as written to its slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioArtifact {
    pub path: PathBuf,
    pub player_page: PathBuf,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl AudioArtifact {
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "audio/mpeg" => "mp3",
        "audio/wav" => "wav",
        "audio/ogg" => "ogg",
        "audio/webm" => "webm",
        _ => "bin",
    }
}

/// Single audio slot. Every write replaces the previous artifact.
#[derive(Debug, Clone)]
pub struct AudioSlot {
    dir: PathBuf,
    name: String,
}

impl AudioSlot {
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            name: name.into(),
        }
    }

    pub fn audio_path(&self, mime: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", self.name, extension_for(mime)))
    }

    pub fn page_path(&self) -> PathBuf {
        self.dir.join(format!("{}.html", self.name))
    }

    pub async fn store(&self, bytes: Vec<u8>, mime: &str) -> Result<AudioArtifact> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let artifact = AudioArtifact {
            path: self.audio_path(mime),
            player_page: self.page_path(),
            mime: mime.to_string(),
            bytes,
        };

        // Both files are staged first so a failed write leaves the slot untouched.
        let audio_part = part_path(&artifact.path);
        let page_part = part_path(&artifact.player_page);
        let staged = stage(&audio_part, &artifact.bytes).await;
        let staged = match staged {
            Ok(()) => stage(&page_part, player_page(&artifact).as_bytes()).await,
            Err(e) => Err(e),
        };
        if let Err(e) = staged {
            let _ = tokio::fs::remove_file(&audio_part).await;
            return Err(e);
        }

        tokio::fs::rename(&audio_part, &artifact.path)
            .await
            .with_context(|| format!("Failed to replace {}", artifact.path.display()))?;
        tokio::fs::rename(&page_part, &artifact.player_page)
            .await
            .with_context(|| format!("Failed to replace {}", artifact.player_page.display()))?;

        info!("Audio written to {} ({} bytes)", artifact.path.display(), artifact.bytes.len());
        Ok(artifact)
    }
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

async fn stage(path: &Path, contents: &[u8]) -> Result<()> {
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// HTML page with an auto-playing, embedded copy of the artifact.
pub fn player_page(artifact: &AudioArtifact) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"zh-CN\">\n<head><meta charset=\"utf-8\"><title>故事机器人</title></head>\n<body>\n<audio autoplay controls src=\"{}\"></audio>\n</body>\n</html>\n",
        artifact.data_uri()
    )
}

/// Hands the artifact to an external player, if one is configured.
#[derive(Debug, Clone, Default)]
pub struct Player {
    command: Vec<String>,
}

impl Player {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    pub fn is_configured(&self) -> bool {
        !self.command.is_empty()
    }

    /// Spawns the player without waiting for it to finish. The returned task
    /// reaps the process once it exits.
    pub fn play(&self, path: &Path) -> Result<Option<JoinHandle<()>>> {
        let Some((program, args)) = self.command.split_first() else {
            return Ok(None);
        };

        let child = Command::new(program)
            .args(args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match child {
            Ok(mut child) => {
                info!("Playing {} with {}", path.display(), program);
                let program = program.clone();
                Ok(Some(tokio::spawn(async move {
                    match child.wait().await {
                        Ok(status) if !status.success() => warn!("{} exited with {}", program, status),
                        Ok(_) => {}
                        Err(e) => warn!("Failed to wait for {}: {}", program, e),
                    }
                })))
            }
            Err(e) => {
                warn!("Failed to spawn player {}: {}", program, e);
                Err(e).with_context(|| format!("Failed to spawn {}", program))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_overwrites_single_slot() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let slot = AudioSlot::new(temp_dir.path().join("output"), "session");

        let first = slot.store(vec![1, 2, 3], "audio/mpeg").await?;
        assert_eq!(first.path, temp_dir.path().join("output").join("session.mp3"));
        assert_eq!(std::fs::read(&first.path)?, vec![1, 2, 3]);

        let second = slot.store(vec![9], "audio/mpeg").await?;
        assert_eq!(first.path, second.path);
        assert_eq!(std::fs::read(&second.path)?, vec![9]);

        let entries = std::fs::read_dir(temp_dir.path().join("output"))?.count();
        assert_eq!(entries, 2, "one audio file and one player page");
        Ok(())
    }

    #[tokio::test]
    async fn test_player_page_embeds_audio() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let slot = AudioSlot::new(temp_dir.path(), "story");
        let artifact = slot.store(b"abc".to_vec(), "audio/mpeg").await?;

        assert_eq!(artifact.data_uri(), "data:audio/mpeg;base64,YWJj");
        let page = std::fs::read_to_string(&artifact.player_page)?;
        assert!(page.contains("<audio autoplay controls src=\"data:audio/mpeg;base64,YWJj\">"));
        Ok(())
    }

    #[test]
    fn test_extension_for_mime() {
        let slot = AudioSlot::new("out", "s");
        assert_eq!(slot.audio_path("audio/wav"), PathBuf::from("out").join("s.wav"));
        assert_eq!(slot.audio_path("text/plain"), PathBuf::from("out").join("s.bin"));
    }

    #[tokio::test]
    async fn test_failed_page_write_keeps_previous_audio() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let slot = AudioSlot::new(temp_dir.path(), "session");
        let first = slot.store(vec![1, 2, 3], "audio/mpeg").await?;

        // a directory in the staging spot makes the page write fail
        std::fs::create_dir(temp_dir.path().join("session.html.part"))?;
        assert!(slot.store(vec![9], "audio/mpeg").await.is_err());

        assert_eq!(std::fs::read(&first.path)?, vec![1, 2, 3]);
        assert!(std::fs::read_to_string(&first.player_page)?.contains("AQID"));
        assert!(!temp_dir.path().join("session.mp3.part").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_unconfigured_player_is_noop() -> Result<()> {
        let player = Player::default();
        assert!(!player.is_configured());
        assert!(player.play(Path::new("missing.mp3"))?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_player_binary_is_error() {
        let player = Player::new(vec!["storybot-no-such-player-binary".to_string()]);
        assert!(player.is_configured());
        assert!(player.play(Path::new("story.mp3")).is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_player_process_is_reaped() -> Result<()> {
        let player = Player::new(vec!["true".to_string()]);
        let reaper = player.play(Path::new("story.mp3"))?.expect("player configured");
        tokio::time::timeout(std::time::Duration::from_secs(5), reaper).await??;
        Ok(())
    }
}
