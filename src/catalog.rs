//! Fixed option tables offered by the story form.
//!
//! Every table maps a human-readable label to the literal value a downstream
//! API expects. The form only ever offers these values, so lookups on the
//! enums are total; `from_label` maps a displayed label back to its entry.

use serde::{Deserialize, Serialize};
use std::fmt;

// --- Story types ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoryType {
    FairyTale,
    Myth,
    SciFi,
    Fantasy,
    Mystery,
    History,
    Adventure,
    Humor,
    Education,
    Animal,
    Friendship,
    Toy,
}

impl StoryType {
    pub const ALL: [StoryType; 12] = [
        StoryType::FairyTale,
        StoryType::Myth,
        StoryType::SciFi,
        StoryType::Fantasy,
        StoryType::Mystery,
        StoryType::History,
        StoryType::Adventure,
        StoryType::Humor,
        StoryType::Education,
        StoryType::Animal,
        StoryType::Friendship,
        StoryType::Toy,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StoryType::FairyTale => "童话",
            StoryType::Myth => "神话",
            StoryType::SciFi => "科幻",
            StoryType::Fantasy => "奇幻",
            StoryType::Mystery => "悬疑",
            StoryType::History => "历史",
            StoryType::Adventure => "冒险",
            StoryType::Humor => "幽默",
            StoryType::Education => "教育",
            StoryType::Animal => "动物",
            StoryType::Friendship => "友情",
            StoryType::Toy => "玩具",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == label)
    }
}

impl fmt::Display for StoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// --- Voice personas ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VoicePersona {
    #[default]
    Xiaoyou,
    Xiaoxiao,
    Yunxi,
}

impl VoicePersona {
    pub const ALL: [VoicePersona; 3] = [
        VoicePersona::Xiaoyou,
        VoicePersona::Xiaoxiao,
        VoicePersona::Yunxi,
    ];

    pub fn label(self) -> &'static str {
        match self {
            VoicePersona::Xiaoyou => "小悠 (童声)",
            VoicePersona::Xiaoxiao => "晓晓 (温柔女声)",
            VoicePersona::Yunxi => "云希 (活泼男声)",
        }
    }

    /// Voice name understood by the speech service.
    pub fn voice_id(self) -> &'static str {
        match self {
            VoicePersona::Xiaoyou => "zh-CN-XiaoyouNeural",
            VoicePersona::Xiaoxiao => "zh-CN-XiaoxiaoNeural",
            VoicePersona::Yunxi => "zh-CN-YunxiNeural",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.label() == label)
    }
}

impl fmt::Display for VoicePersona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// --- Length ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LengthBucket {
    Short,
    Medium,
    Long,
}

impl LengthBucket {
    pub const ALL: [LengthBucket; 3] = [LengthBucket::Short, LengthBucket::Medium, LengthBucket::Long];

    pub fn label(self) -> &'static str {
        match self {
            LengthBucket::Short => "短篇",
            LengthBucket::Medium => "中篇",
            LengthBucket::Long => "长篇",
        }
    }

    /// Target character count requested from the generation API.
    pub fn target_length(self) -> u32 {
        match self {
            LengthBucket::Short => 200,
            LengthBucket::Medium => 350,
            LengthBucket::Long => 500,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.label() == label)
    }
}

impl fmt::Display for LengthBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}字)", self.label(), self.target_length())
    }
}

pub const SLIDER_MIN: u32 = 100;
pub const SLIDER_MAX: u32 = 500;
pub const SLIDER_STEP: u32 = 50;

pub fn slider_values() -> impl Iterator<Item = u32> {
    (SLIDER_MIN..=SLIDER_MAX).step_by(SLIDER_STEP as usize)
}

/// Accepts only lengths the slider can produce.
pub fn validate_slider(value: u32) -> Option<u32> {
    slider_values().find(|v| *v == value)
}

/// How the form asks for story length.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LengthMode {
    #[default]
    Buckets,
    Slider,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_persona_has_voice_id() {
        for persona in VoicePersona::ALL {
            assert!(!persona.voice_id().is_empty());
            assert!(persona.voice_id().starts_with("zh-CN-"));
            assert_eq!(VoicePersona::from_label(persona.label()), Some(persona));
        }
        let ids: HashSet<_> = VoicePersona::ALL.iter().map(|p| p.voice_id()).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_unknown_labels() {
        assert_eq!(VoicePersona::from_label("robot"), None);
        assert_eq!(LengthBucket::from_label("超长篇"), None);
        assert_eq!(StoryType::from_label("恐怖"), None);
    }

    #[test]
    fn test_story_type_catalog() {
        assert_eq!(StoryType::ALL.len(), 12);
        let labels: HashSet<_> = StoryType::ALL.iter().map(|t| t.label()).collect();
        assert_eq!(labels.len(), 12);
        assert_eq!(StoryType::from_label("教育"), Some(StoryType::Education));
    }

    #[test]
    fn test_length_buckets() {
        assert_eq!(LengthBucket::Short.target_length(), 200);
        assert_eq!(LengthBucket::Medium.target_length(), 350);
        assert_eq!(LengthBucket::Long.target_length(), 500);
        assert_eq!(LengthBucket::Medium.to_string(), "中篇 (350字)");
    }

    #[test]
    fn test_slider_grid() {
        let values: Vec<u32> = slider_values().collect();
        assert_eq!(values.first(), Some(&100));
        assert_eq!(values.last(), Some(&500));
        assert_eq!(values.len(), 9);

        assert_eq!(validate_slider(250), Some(250));
        assert_eq!(validate_slider(260), None);
        assert_eq!(validate_slider(50), None);
        assert_eq!(validate_slider(550), None);
    }
}
