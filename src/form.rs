//! Terminal rendition of the story form.

use crate::catalog::{
    validate_slider, LengthBucket, LengthMode, StoryType, VoicePersona, SLIDER_MAX, SLIDER_MIN,
    SLIDER_STEP,
};
use crate::prompt::{validate_topic, StoryRequest, MAX_TOPIC_CHARS};
use anyhow::Result;
use inquire::validator::Validation;
use inquire::{CustomType, CustomUserError, MultiSelect, Select, Text};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Generate,
    Narrate,
    Quit,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Generate => "生成故事",
            Action::Narrate => "朗读故事",
            Action::Quit => "退出",
        };
        f.write_str(s)
    }
}

/// Actions on offer. With `auto_narrate` generation already narrates, so
/// there is no separate narrate entry.
pub fn actions(auto_narrate: bool) -> Vec<Action> {
    if auto_narrate {
        vec![Action::Generate, Action::Quit]
    } else {
        vec![Action::Generate, Action::Narrate, Action::Quit]
    }
}

pub fn prompt_action(auto_narrate: bool) -> Result<Action> {
    Ok(Select::new("请选择操作:", actions(auto_narrate)).prompt()?)
}

pub struct StoryForm {
    pub request: StoryRequest,
    pub persona: VoicePersona,
}

pub fn prompt_story_form(length_mode: LengthMode, persona: VoicePersona) -> Result<StoryForm> {
    let topic = Text::new("故事主题:")
        .with_placeholder("在这里写下你的故事主题梗概，如奥特曼大战怪兽")
        .with_help_message(&format!("最多{}个字", MAX_TOPIC_CHARS))
        .with_validator(|input: &str| -> Result<Validation, CustomUserError> {
            Ok(match validate_topic(input) {
                Ok(()) => Validation::Valid,
                Err(msg) => Validation::Invalid(msg.into()),
            })
        })
        .prompt()?;

    let story_types = MultiSelect::new("故事类型:", StoryType::ALL.to_vec()).prompt()?;
    let persona = prompt_persona(persona)?;
    let target_length = prompt_length(length_mode)?;

    Ok(StoryForm {
        request: StoryRequest::new(topic, story_types, target_length)?,
        persona,
    })
}

pub fn prompt_persona(current: VoicePersona) -> Result<VoicePersona> {
    let start = VoicePersona::ALL
        .iter()
        .position(|p| *p == current)
        .unwrap_or(0);
    Ok(Select::new("朗读声音:", VoicePersona::ALL.to_vec())
        .with_starting_cursor(start)
        .prompt()?)
}

fn prompt_length(mode: LengthMode) -> Result<u32> {
    match mode {
        LengthMode::Buckets => {
            let bucket = Select::new("故事长度:", LengthBucket::ALL.to_vec()).prompt()?;
            Ok(bucket.target_length())
        }
        LengthMode::Slider => Ok(CustomType::<u32>::new("故事长度(大约字数):")
            .with_default(SLIDER_MIN)
            .with_help_message(&format!(
                "{}-{}, 每档{}字",
                SLIDER_MIN, SLIDER_MAX, SLIDER_STEP
            ))
            .with_error_message("请输入数字")
            .with_validator(|value: &u32| -> Result<Validation, CustomUserError> {
                Ok(slider_validation(*value))
            })
            .prompt()?),
    }
}

fn slider_validation(value: u32) -> Validation {
    match validate_slider(value) {
        Some(_) => Validation::Valid,
        None => Validation::Invalid(
            format!(
                "长度须在{}到{}之间，且为{}的倍数",
                SLIDER_MIN, SLIDER_MAX, SLIDER_STEP
            )
            .into(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actions_for_independent_triggers() {
        assert_eq!(
            actions(false),
            vec![Action::Generate, Action::Narrate, Action::Quit]
        );
    }

    #[test]
    fn test_actions_for_chained_mode() {
        assert_eq!(actions(true), vec![Action::Generate, Action::Quit]);
    }

    #[test]
    fn test_action_labels() {
        assert_eq!(Action::Generate.to_string(), "生成故事");
        assert_eq!(Action::Narrate.to_string(), "朗读故事");
    }

    #[test]
    fn test_slider_input_must_sit_on_grid() {
        assert!(matches!(slider_validation(100), Validation::Valid));
        assert!(matches!(slider_validation(350), Validation::Valid));
        assert!(matches!(slider_validation(500), Validation::Valid));
        assert!(matches!(slider_validation(120), Validation::Invalid(_)));
        assert!(matches!(slider_validation(0), Validation::Invalid(_)));
        assert!(matches!(slider_validation(550), Validation::Invalid(_)));
    }
}
