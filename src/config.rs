use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub ai: AiConfig,
    pub uploads: UploadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Absent key runs the service in heuristic-fallback mode.
    pub openai_api_key: Option<String>,
    pub chat_model: String,
    pub image_model: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub dir: String,
    pub max_file_bytes: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            server: ServerConfig {
                host: env::var("SERVER_HOST")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "5000".to_string())
                    .parse()
                    .unwrap_or(5000),
            },
            ai: AiConfig {
                openai_api_key: env::var("OPENAI_API_KEY")
                    .ok()
                    .filter(|key| !key.is_empty()),
                chat_model: env::var("OPENAI_CHAT_MODEL")
                    .unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
                image_model: env::var("OPENAI_IMAGE_MODEL")
                    .unwrap_or_else(|_| "dall-e-3".to_string()),
                request_timeout_secs: env::var("AI_REQUEST_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "30".to_string())
                    .parse()
                    .unwrap_or(30),
            },
            uploads: UploadConfig {
                dir: env::var("UPLOAD_DIR")
                    .unwrap_or_else(|_| "uploads".to_string()),
                max_file_bytes: env::var("UPLOAD_MAX_FILE_BYTES")
                    .unwrap_or_else(|_| (5 * 1024 * 1024).to_string())
                    .parse()
                    .unwrap_or(5 * 1024 * 1024),
            },
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
