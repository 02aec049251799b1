// OpenAI-backed implementation of the AiBackend seam: chat completions for
// classification/moderation/enhancement, image generation for memes.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::{
    config::AiConfig,
    models::PostType,
    services::ai_service::{AiBackend, Classification, Enhancement, ToxicityCheck},
};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

const CLASSIFY_SYSTEM_PROMPT: &str = "\
You are an assistant for a campus social feed. Classify the user's input into \
one of three post types:

1. EVENT - workshops, fests, club activities, meetings
2. LOST_FOUND - lost items or found items
3. ANNOUNCEMENT - official notices, timetables, campus updates

Return a JSON object with:
- postType: \"EVENT\", \"LOST_FOUND\", or \"ANNOUNCEMENT\"
- confidence: 0-1 score
- extractedData: relevant fields for the post type
- suggestedTitle: a concise title for the post
- toxicityScore: 0-1 score (1 being most toxic)

For EVENT posts, extractedData has: description, location, date, time
For LOST_FOUND posts, extractedData has: item, location, date, isLost (boolean)
For ANNOUNCEMENT posts, extractedData has: department, content, priority

Respond with the JSON object only.";

const TOXICITY_SYSTEM_PROMPT: &str = "\
You are a content moderation assistant. Analyze the given text and return a \
JSON object with: toxicityScore (0-1, where 1 is most toxic), isAppropriate \
(boolean), and suggestions (array of improvement suggestions). Respond with \
the JSON object only.";

/// Typed client for the OpenAI REST API. One bounded-timeout reqwest client
/// is shared by all calls; a timeout surfaces as an ordinary request error
/// and follows each operation's failure policy.
pub struct OpenAiBackend {
    client: Client,
    api_key: String,
    chat_model: String,
    image_model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: String,
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: String,
    n: u32,
    size: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: String,
}

impl OpenAiBackend {
    pub fn new(api_key: String, config: &AiConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key,
            chat_model: config.chat_model.clone(),
            image_model: config.image_model.clone(),
        }
    }

    /// Run one chat completion and parse the model's reply as JSON of the
    /// requested shape. A reply that is not valid JSON of that shape is an
    /// error; callers decide whether that is fatal.
    async fn chat_json<T: DeserializeOwned>(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<T> {
        let request = ChatRequest {
            model: &self.chat_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature,
            max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", OPENAI_API_BASE))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("chat completion request failed")?
            .error_for_status()
            .context("chat completion returned an error status")?;

        let body: ChatResponse = response
            .json()
            .await
            .context("chat completion body was not valid JSON")?;
        let reply = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("chat completion returned no choices"))?;

        debug!(model = %self.chat_model, "chat completion reply received");
        serde_json::from_str(&reply.message.content)
            .context("model reply was not the expected JSON shape")
    }
}

#[async_trait]
impl AiBackend for OpenAiBackend {
    async fn classify_post(&self, prompt: &str) -> Result<Classification> {
        self.chat_json(CLASSIFY_SYSTEM_PROMPT, prompt, 0.3, 500).await
    }

    async fn check_toxicity(&self, content: &str) -> Result<ToxicityCheck> {
        self.chat_json(TOXICITY_SYSTEM_PROMPT, content, 0.1, 200).await
    }

    async fn generate_meme(&self, prompt: &str) -> Result<String> {
        let request = ImageRequest {
            model: &self.image_model,
            prompt: format!(
                "Create a funny, campus-themed meme about: {}. \
                 Keep it clean, appropriate, and relatable to students.",
                prompt
            ),
            n: 1,
            size: "1024x1024",
        };

        let response = self
            .client
            .post(format!("{}/images/generations", OPENAI_API_BASE))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("image generation request failed")?
            .error_for_status()
            .context("image generation returned an error status")?;

        let body: ImageResponse = response
            .json()
            .await
            .context("image generation body was not valid JSON")?;
        body.data
            .into_iter()
            .next()
            .map(|image| image.url)
            .ok_or_else(|| anyhow!("image generation returned no images"))
    }

    async fn enhance_post_content(
        &self,
        prompt: &str,
        post_type: PostType,
    ) -> Result<Enhancement> {
        let system_prompt = format!(
            "You are an assistant improving campus feed posts of type {}. \
             Based on the user's input, return a JSON object with: title (a \
             compelling title), description (an enhanced description), \
             hashtags (array), and suggestions (array of improvements). \
             Respond with the JSON object only.",
            post_type.as_str()
        );
        self.chat_json(&system_prompt, prompt, 0.7, 300).await
    }
}
