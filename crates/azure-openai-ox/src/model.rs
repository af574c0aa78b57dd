use serde::{Deserialize, Serialize};
use strum::Display;

/// API version pinned for the `chatgpt_url` the data-source endpoint calls back into
pub const CHATGPT_URL_API_VERSION: &str = "2023-03-15-preview";

/// Substrings that mark a deployment's model as a chat model
const CHAT_MODEL_MARKERS: [&str; 2] = ["gpt-35", "gpt-4"];

/// Which completion API a deployed model speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ModelFamily {
    /// `chat/completions`
    Chat,
    /// Legacy `completions`
    Completion,
}

impl ModelFamily {
    /// Classify a model name such as `gpt-35-turbo` or `text-davinci-003`
    pub fn from_model_name(name: &str) -> Self {
        let name = name.to_lowercase();
        if CHAT_MODEL_MARKERS.iter().any(|marker| name.contains(marker)) {
            ModelFamily::Chat
        } else {
            ModelFamily::Completion
        }
    }

    /// Path below a deployment URL
    pub fn path(&self) -> &'static str {
        match self {
            ModelFamily::Chat => "chat/completions",
            ModelFamily::Completion => "completions",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_family_detection_ignores_case() {
        assert_eq!(ModelFamily::from_model_name("gpt-35-turbo"), ModelFamily::Chat);
        assert_eq!(ModelFamily::from_model_name("GPT-35-Turbo-16k"), ModelFamily::Chat);
        assert_eq!(ModelFamily::from_model_name("gpt-4-32k"), ModelFamily::Chat);
    }

    #[test]
    fn test_other_models_use_legacy_completions() {
        let family = ModelFamily::from_model_name("text-davinci-003");
        assert_eq!(family, ModelFamily::Completion);
        assert_eq!(family.path(), "completions");
        assert_eq!(ModelFamily::from_model_name(""), ModelFamily::Completion);
    }
}
