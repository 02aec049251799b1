pub mod ai_service;
pub mod openai;

pub use ai_service::{AiBackend, AiService, Classification, Enhancement, ToxicityCheck};
pub use openai::OpenAiBackend;
