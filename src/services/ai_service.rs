// Classification / moderation / meme-generation boundary.
//
// All "intelligence" is delegated to an external model provider behind the
// AiBackend trait. With no provider configured the service degrades to
// keyword heuristics for classification, permissive moderation defaults,
// and no meme generation.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::{
    config::AiConfig,
    error::{AppError, AppResult},
    models::{PostContent, PostType},
    services::openai::OpenAiBackend,
};

/// Classifier verdict for one free-text prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub post_type: PostType,
    #[serde(default)]
    pub confidence: f32,
    /// Record shaped per `post_type`; parsed into `PostContent` when a post
    /// is assembled.
    #[serde(default)]
    pub extracted_data: Value,
    pub suggested_title: String,
    #[serde(default)]
    pub toxicity_score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToxicityCheck {
    #[serde(default)]
    pub toxicity_score: f32,
    #[serde(default = "default_appropriate")]
    pub is_appropriate: bool,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

fn default_appropriate() -> bool {
    true
}

impl ToxicityCheck {
    /// The fallback used whenever the moderation provider is absent or
    /// failing: moderation never blocks a write.
    pub fn permissive() -> Self {
        Self {
            toxicity_score: 0.0,
            is_appropriate: true,
            suggestions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enhancement {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Provider seam. The production implementation is the OpenAI client;
/// tests substitute stubs to drive the success/failure paths.
#[async_trait]
pub trait AiBackend: Send + Sync {
    async fn classify_post(&self, prompt: &str) -> anyhow::Result<Classification>;
    async fn check_toxicity(&self, content: &str) -> anyhow::Result<ToxicityCheck>;
    async fn generate_meme(&self, prompt: &str) -> anyhow::Result<String>;
    async fn enhance_post_content(
        &self,
        prompt: &str,
        post_type: PostType,
    ) -> anyhow::Result<Enhancement>;
}

static LOST_FOUND_CUES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"lost|found|wallet|id card|keys|phone|bag").expect("lost/found pattern is valid")
});
static EVENT_CUES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"event|workshop|meet|seminar|hackathon|fest|session|webinar")
        .expect("event pattern is valid")
});

pub struct AiService {
    backend: Option<Arc<dyn AiBackend>>,
}

impl AiService {
    pub fn from_config(config: &AiConfig) -> Self {
        match &config.openai_api_key {
            Some(key) => Self {
                backend: Some(Arc::new(OpenAiBackend::new(key.clone(), config))),
            },
            None => Self::disabled(),
        }
    }

    /// Heuristic-only mode, as when no API key is configured.
    pub fn disabled() -> Self {
        Self { backend: None }
    }

    pub fn with_backend(backend: Arc<dyn AiBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Classify a prompt into a post type plus extracted fields. Provider
    /// failures propagate: a post must not be recorded on a failed
    /// classification.
    pub async fn classify_post(&self, prompt: &str) -> AppResult<Classification> {
        match &self.backend {
            Some(backend) => backend
                .classify_post(prompt)
                .await
                .map_err(|err| AppError::Provider(err.context("post classification failed"))),
            None => Ok(Self::heuristic_classification(prompt)),
        }
    }

    /// Score a piece of text for toxicity. Never fails: provider errors
    /// (including timeouts) degrade to the permissive default.
    pub async fn check_toxicity(&self, content: &str) -> ToxicityCheck {
        match &self.backend {
            Some(backend) => match backend.check_toxicity(content).await {
                Ok(check) => check,
                Err(err) => {
                    warn!("Toxicity check failed, defaulting to permissive: {:#}", err);
                    ToxicityCheck::permissive()
                }
            },
            None => ToxicityCheck::permissive(),
        }
    }

    /// Generate a meme image for a prompt. `Ok(None)` means no provider is
    /// configured; that is not an error.
    pub async fn generate_meme(&self, prompt: &str) -> AppResult<Option<String>> {
        match &self.backend {
            Some(backend) => backend
                .generate_meme(prompt)
                .await
                .map(Some)
                .map_err(|err| AppError::Provider(err.context("meme generation failed"))),
            None => Ok(None),
        }
    }

    pub async fn enhance_post_content(
        &self,
        prompt: &str,
        post_type: PostType,
    ) -> AppResult<Enhancement> {
        match &self.backend {
            Some(backend) => backend
                .enhance_post_content(prompt, post_type)
                .await
                .map_err(|err| AppError::Provider(err.context("content enhancement failed"))),
            None => Ok(Enhancement {
                title: match post_type {
                    PostType::Event => "Campus Event",
                    PostType::LostFound => "Lost & Found",
                    PostType::Announcement => "Announcement",
                }
                .to_string(),
                description: prompt.to_string(),
                hashtags: vec!["#campus".to_string(), "#feed".to_string()],
                suggestions: Vec::new(),
            }),
        }
    }

    /// Keyword fallback. Lost/found cues are checked first, event cues
    /// second, so an overlapping prompt classifies as an event; everything
    /// else is an announcement.
    fn heuristic_classification(prompt: &str) -> Classification {
        let lower = prompt.to_lowercase();
        let mut post_type = PostType::Announcement;
        if LOST_FOUND_CUES.is_match(&lower) {
            post_type = PostType::LostFound;
        }
        if EVENT_CUES.is_match(&lower) {
            post_type = PostType::Event;
        }

        Classification {
            post_type,
            confidence: 0.6,
            extracted_data: serde_json::to_value(PostContent::from_prompt(post_type, prompt))
                .unwrap_or(Value::Null),
            suggested_title: post_type.default_title().to_string(),
            toxicity_score: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn heuristic_spots_lost_and_found_cues() {
        let ai = AiService::disabled();
        let classification = ai
            .classify_post("Lost my black wallet near the library yesterday evening")
            .await
            .unwrap();
        assert_eq!(classification.post_type, PostType::LostFound);
        assert_eq!(classification.suggested_title, "Lost & Found");
    }

    #[tokio::test]
    async fn heuristic_spots_event_cues() {
        let ai = AiService::disabled();
        let classification = ai
            .classify_post("Workshop on Docker tomorrow at 5pm in CSE Lab")
            .await
            .unwrap();
        assert_eq!(classification.post_type, PostType::Event);
    }

    #[tokio::test]
    async fn event_cues_win_over_lost_and_found_cues() {
        let ai = AiService::disabled();
        let classification = ai
            .classify_post("Found a phone at the hackathon venue")
            .await
            .unwrap();
        assert_eq!(classification.post_type, PostType::Event);
    }

    #[tokio::test]
    async fn plain_text_defaults_to_announcement() {
        let ai = AiService::disabled();
        let classification = ai.classify_post("Mid-sem timetable is out").await.unwrap();
        assert_eq!(classification.post_type, PostType::Announcement);
        let content =
            PostContent::from_value(classification.post_type, classification.extracted_data)
                .unwrap();
        match content {
            PostContent::Announcement(a) => {
                assert_eq!(a.content.as_deref(), Some("Mid-sem timetable is out"));
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[tokio::test]
    async fn disabled_service_is_permissive_and_memeless() {
        let ai = AiService::disabled();
        assert!(!ai.is_enabled());
        let check = ai.check_toxicity("anything at all").await;
        assert_eq!(check.toxicity_score, 0.0);
        assert!(check.is_appropriate);
        assert_eq!(ai.generate_meme("campus life").await.unwrap(), None);
    }
}
