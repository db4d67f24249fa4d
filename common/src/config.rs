use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub fallback_model: String,
    pub max_output_tokens: u32,
    pub max_prompt_len: usize,
    pub requests_per_minute: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            fallback_model: "gpt-4o-mini".to_string(),
            max_output_tokens: 4096,
            max_prompt_len: 1500,
            requests_per_minute: 30,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.api_key = Some(key);
        }

        if let Ok(url) = std::env::var("SLIDEGEN_BASE_URL") {
            config.base_url = url;
        }

        if let Ok(model) = std::env::var("SLIDEGEN_MODEL") {
            config.model = model;
        }

        if let Ok(model) = std::env::var("SLIDEGEN_FALLBACK_MODEL") {
            config.fallback_model = model;
        }

        if let Ok(len) = std::env::var("SLIDEGEN_MAX_PROMPT_LEN") {
            if let Ok(len) = len.parse() {
                config.max_prompt_len = len;
            }
        }

        if let Ok(rpm) = std::env::var("SLIDEGEN_REQUESTS_PER_MINUTE") {
            if let Ok(rpm) = rpm.parse() {
                config.requests_per_minute = rpm;
            }
        }

        config
    }
}
