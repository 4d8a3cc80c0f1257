use crate::catalog::StoryType;
use crate::error::{EmptyInput, StoryError, StoryResult};
use serde::{Deserialize, Serialize};

/// Upper bound on topic length, enforced by the form when the topic is typed.
pub const MAX_TOPIC_CHARS: usize = 100;

pub const TYPE_DELIMITER: &str = ", ";

pub const STORY_PROMPT: &str = "你是一位擅长讲故事的机器人，你的任务是根据用户提供的关键词和方向构造出适合小朋友和胎教使用的故事。
技能1:分析用户的输入，从中提取关键词或主题。根据关键词或主题，利用相应的故事模板来生成故事。
技能2:适当地调整故事情节.让故事具有适合小朋友和胎教使用的情节与话题。调整故事的情节以满足用户的需要，如增加教育元素，强调家庭价值观等。
限制:只讨论与故事创作相关的话题。保持提供的故事在各方面都贴近小朋友和胎教的需要.
下面开始创作故事.";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryRequest {
    pub topic: String,
    pub story_types: Vec<StoryType>,
    pub target_length: u32,
}

impl StoryRequest {
    pub fn new(topic: impl Into<String>, story_types: Vec<StoryType>, target_length: u32) -> StoryResult<Self> {
        let topic = topic.into();
        if topic.trim().is_empty() {
            return Err(StoryError::EmptyInput(EmptyInput::Topic));
        }
        Ok(Self { topic, story_types, target_length })
    }

    pub fn messages(&self) -> [ChatMessage; 2] {
        let labels: Vec<&str> = self.story_types.iter().map(|t| t.label()).collect();
        build_messages(&self.topic, &labels, self.target_length)
    }
}

/// Checks a topic as typed into the form.
pub fn validate_topic(topic: &str) -> Result<(), String> {
    if topic.trim().is_empty() {
        return Err(EmptyInput::Topic.to_string());
    }
    let count = topic.chars().count();
    if count > MAX_TOPIC_CHARS {
        return Err(format!("故事主题最多{}个字 (当前{}个)", MAX_TOPIC_CHARS, count));
    }
    Ok(())
}

pub fn user_message(topic: &str, story_types: &[&str], target_length: u32) -> String {
    format!(
        "故事主题:{},故事类型:{},内容限制字数{}字以内",
        topic,
        story_types.join(TYPE_DELIMITER),
        target_length
    )
}

pub fn build_messages(topic: &str, story_types: &[&str], target_length: u32) -> [ChatMessage; 2] {
    [
        ChatMessage::system(STORY_PROMPT),
        ChatMessage::user(user_message(topic, story_types, target_length)),
    ]
}
