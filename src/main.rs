use anyhow::Result;
use indicatif::ProgressBar;
use inquire::InquireError;
use std::time::Duration;
use storybot::audio::{AudioArtifact, Player};
use storybot::catalog::VoicePersona;
use storybot::config::Config;
use storybot::error::EmptyInput;
use storybot::form::{self, Action};
use storybot::state::SessionId;
use storybot::{llm, setup, tts, StoryError, StoryOrchestrator, StoryResult};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    // 1. Load config, environment wins over config.yml
    let mut config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {:#}", e);
            return Err(e);
        }
    };

    // 2. First-run token prompt, then refuse to start without secrets
    setup::run_setup(&mut config)?;
    if let Err(e) = config.validate() {
        eprintln!("{}", e);
        return Err(e.into());
    }
    config.ensure_directories()?;

    // 3. Clients
    let llm = llm::create_llm(&config)?;
    let tts = tts::create_tts_client(&config)?;
    let player = Player::new(config.audio.player_command.clone());
    let browser_playback = !player.is_configured();
    let orchestrator = StoryOrchestrator::new(llm, tts, config.output_dir(), player);

    // 4. Form loop
    println!("故事机器人");
    println!("请在下面输入你的故事主题和元素，并选择故事类型和长度");

    let session = SessionId::new();
    let mut persona = VoicePersona::default();
    let shell = Shell {
        orchestrator: &orchestrator,
        session,
        browser_playback,
    };

    loop {
        let action = match form::prompt_action(config.auto_narrate) {
            Ok(action) => action,
            Err(e) if prompt_abort(&e).is_some() => break,
            Err(e) => return Err(e),
        };

        let outcome = match action {
            Action::Generate => shell.generate(&config, &mut persona).await,
            Action::Narrate => shell.narrate(&mut persona).await,
            Action::Quit => break,
        };

        if let Err(e) = outcome {
            match prompt_abort(&e) {
                // Esc backs out of the form, Ctrl-C leaves the program
                Some(InquireError::OperationCanceled) => continue,
                Some(_) => break,
                None => return Err(e),
            }
        }
    }

    orchestrator.end_session(session).await;
    Ok(())
}

/// Drives the orchestrator for one interactive session.
struct Shell<'a> {
    orchestrator: &'a StoryOrchestrator,
    session: SessionId,
    browser_playback: bool,
}

impl Shell<'_> {
    async fn generate(&self, config: &Config, persona: &mut VoicePersona) -> Result<()> {
        let story_form = form::prompt_story_form(config.length_mode, *persona)?;
        *persona = story_form.persona;

        if config.auto_narrate {
            let spinner = spinner("生成故事中");
            let cycle = self
                .orchestrator
                .generate_and_narrate(self.session, &story_form.request, *persona)
                .await;
            spinner.finish_and_clear();

            match cycle {
                Ok(cycle) => {
                    println!("\n{}\n", cycle.story);
                    self.show_narration(cycle.narration);
                }
                Err(e) => report(&e),
            }
            return Ok(());
        }

        let spinner = spinner("生成故事中");
        let generated = self.orchestrator.generate(self.session, &story_form.request).await;
        spinner.finish_and_clear();

        match generated {
            Ok(story) => println!("\n{}\n", story),
            Err(e) => report(&e),
        }
        Ok(())
    }

    async fn narrate(&self, persona: &mut VoicePersona) -> Result<()> {
        if self.orchestrator.story(self.session).await.is_none() {
            report(&StoryError::EmptyInput(EmptyInput::NoStory));
            return Ok(());
        }
        *persona = form::prompt_persona(*persona)?;

        let spinner = spinner("朗读故事中..");
        let narrated = self.orchestrator.narrate(self.session, *persona).await;
        spinner.finish_and_clear();

        self.show_narration(narrated);
        Ok(())
    }

    fn show_narration(&self, narration: StoryResult<AudioArtifact>) {
        match narration {
            Ok(artifact) => {
                println!("Speech synthesized: {}", artifact.path.display());
                if self.browser_playback {
                    println!("Open {} to play it in a browser.", artifact.player_page.display());
                }
            }
            Err(e) => report(&e),
        }
    }
}

fn report(err: &StoryError) {
    match err {
        StoryError::GenerationHttp { status } => println!("request failed {}", status),
        StoryError::SpeechCanceled { reason, error_details } => {
            println!("Speech synthesis canceled: {}", reason);
            if let Some(details) = error_details {
                println!("Error details: {}", details);
            }
        }
        other => println!("{}", other),
    }
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn prompt_abort(err: &anyhow::Error) -> Option<&InquireError> {
    err.downcast_ref::<InquireError>().filter(|e| {
        matches!(
            e,
            InquireError::OperationCanceled | InquireError::OperationInterrupted
        )
    })
}
