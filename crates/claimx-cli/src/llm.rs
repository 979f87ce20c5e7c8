//! LLM date fallback over an OpenAI-compatible chat completions endpoint.

use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use claimx_core::models::config::LlmConfig;
use claimx_core::DateFallback;

/// Reply the prompt asks for when no date can be inferred.
const FAILURE_MARKER: &str = "error";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Asks a chat model to repair a date the OCR got wrong.
pub struct LlmDateFallback {
    config: LlmConfig,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl LlmDateFallback {
    /// Create a fallback with the API key read from `config.api_key_env`.
    pub fn from_config(config: &LlmConfig) -> anyhow::Result<Self> {
        let api_key = std::env::var(&config.api_key_env).unwrap_or_default();
        if api_key.is_empty() {
            anyhow::bail!("{} environment variable not set", config.api_key_env);
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            config: config.clone(),
            api_key,
            client,
        })
    }

    fn complete(&self, raw: &str) -> anyhow::Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                Message {
                    role: "system",
                    content: &self.config.prompt,
                },
                Message {
                    role: "user",
                    content: raw,
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .context("Failed to call chat completions endpoint")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            anyhow::bail!("Chat completions error {}: {}", status, body);
        }

        let chat: ChatResponse = response
            .json()
            .context("Failed to parse chat completions response")?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .context("Empty chat completions response")?
            .message
            .content;

        Ok(content)
    }
}

impl DateFallback for LlmDateFallback {
    fn infer_date(&self, raw: &str) -> Option<String> {
        match self.complete(raw) {
            Ok(reply) => {
                debug!("LLM reply for '{}': '{}'", raw, reply);
                parse_reply(&reply)
            }
            Err(e) => {
                warn!("LLM date fallback failed for '{}': {:#}", raw, e);
                None
            }
        }
    }
}

fn parse_reply(reply: &str) -> Option<String> {
    let reply = reply.trim();
    if reply.is_empty() || reply.eq_ignore_ascii_case(FAILURE_MARKER) {
        None
    } else {
        Some(reply.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reply() {
        assert_eq!(parse_reply(" 02/14/2024\n"), Some("02/14/2024".to_string()));
        assert_eq!(parse_reply("Error"), None);
        assert_eq!(parse_reply("   "), None);
    }

    #[test]
    fn test_missing_api_key() {
        let config = LlmConfig {
            api_key_env: "CLAIMX_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..LlmConfig::default()
        };
        assert!(LlmDateFallback::from_config(&config).is_err());
    }
}
