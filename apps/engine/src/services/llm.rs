//! HTTP client for the Anthropic Messages API, backing the judgment and
//! rewrite collaborators.
//!
//! No other module calls the API directly; retry and JSON-extraction
//! policy live here so callers only see typed results.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::errors::EngineError;
use crate::models::story::{ExperienceItem, Requirement};
use crate::services::prompts;
use crate::services::{JudgmentScore, JudgmentService, RewriteService};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// Hardcoded so every call path uses the same model.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 1024;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl From<LlmError> for EngineError {
    fn from(err: LlmError) -> Self {
        EngineError::External(err.to_string())
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Anthropic Messages API client with retry and structured-output helpers.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }

    /// Makes a raw call to the API, returning the full response object.
    /// Retries on 429 and 5xx with exponential backoff.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<LlmResponse, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<AnthropicError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let llm_response: LlmResponse = response.json().await?;

            debug!(
                "LLM call succeeded: input_tokens={}, output_tokens={}",
                llm_response.usage.input_tokens, llm_response.usage.output_tokens
            );

            return Ok(llm_response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }

    /// Calls the LLM and deserializes the text response as JSON. The
    /// prompt must instruct the model to return valid JSON.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system: &str,
    ) -> Result<T, LlmError> {
        let response = self.call(prompt, system).await?;

        let text = response.text().ok_or(LlmError::EmptyContent)?;

        // Strip markdown code fences if the model wraps JSON in them
        let text = strip_json_fences(text);

        serde_json::from_str(text).map_err(LlmError::Parse)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Collaborator trait implementations
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct JudgmentPayload {
    score: f64,
    rationale: String,
}

#[derive(Debug, Deserialize)]
struct RewritePayload {
    text: String,
}

#[async_trait]
impl JudgmentService for LlmClient {
    async fn assess(
        &self,
        story: &ExperienceItem,
        requirements: &[Requirement],
    ) -> Result<JudgmentScore, EngineError> {
        let prompt = build_judgment_prompt(story, requirements);
        let payload: JudgmentPayload =
            self.call_json(&prompt, prompts::JUDGMENT_SYSTEM).await?;

        Ok(JudgmentScore {
            score: payload.score.clamp(0.0, 1.0),
            rationale: payload.rationale,
        })
    }
}

#[async_trait]
impl RewriteService for LlmClient {
    async fn shorten(&self, text: &str, target_chars: usize) -> Result<String, EngineError> {
        let prompt = build_rewrite_prompt(text, target_chars);
        let payload: RewritePayload =
            self.call_json(&prompt, prompts::REWRITE_SYSTEM).await?;

        let rewritten = payload.text.trim().to_string();
        if rewritten.is_empty() {
            return Err(EngineError::External(
                "rewrite returned empty text".to_string(),
            ));
        }
        Ok(rewritten)
    }
}

fn build_judgment_prompt(story: &ExperienceItem, requirements: &[Requirement]) -> String {
    let bullets = story
        .bullets
        .iter()
        .map(|b| format!("- {}", b.text))
        .collect::<Vec<_>>()
        .join("\n");

    let requirement_lines = requirements
        .iter()
        .map(|r| {
            let kind = if r.required { "required" } else { "preferred" };
            format!("- {} ({kind}, weight {:.2})", r.skill, r.weight)
        })
        .collect::<Vec<_>>()
        .join("\n");

    prompts::JUDGMENT_PROMPT_TEMPLATE
        .replace("{role}", &story.role)
        .replace("{company}", &story.company)
        .replace("{bullets}", &bullets)
        .replace("{requirements}", &requirement_lines)
}

fn build_rewrite_prompt(text: &str, target_chars: usize) -> String {
    prompts::REWRITE_PROMPT_TEMPLATE
        .replace("{target_chars}", &target_chars.to_string())
        .replace("{bullet_text}", text)
        .replace("{current_chars}", &text.chars().count().to_string())
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::story::{Bullet, EvidenceTier};
    use chrono::NaiveDate;
    use uuid::Uuid;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"score\": 0.8}\n```";
        assert_eq!(strip_json_fences(input), "{\"score\": 0.8}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"score\": 0.8}\n```";
        assert_eq!(strip_json_fences(input), "{\"score\": 0.8}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"score\": 0.8}";
        assert_eq!(strip_json_fences(input), "{\"score\": 0.8}");
    }

    #[test]
    fn test_judgment_prompt_interpolates_story_and_requirements() {
        let story = ExperienceItem {
            id: Uuid::from_u128(1),
            company: "Acme".to_string(),
            role: "Backend Engineer".to_string(),
            start: NaiveDate::from_ymd_opt(2021, 3, 1).unwrap(),
            end: None,
            section: "experience".to_string(),
            bullets: vec![Bullet::new(
                Uuid::from_u128(11),
                "Cut query latency 40% with go profiling",
                vec!["go".to_string()],
                EvidenceTier::High,
            )],
        };
        let requirements = vec![Requirement::new("go", 1.0, true)];

        let prompt = build_judgment_prompt(&story, &requirements);
        assert!(prompt.contains("Backend Engineer at Acme"));
        assert!(prompt.contains("- Cut query latency 40% with go profiling"));
        assert!(prompt.contains("- go (required, weight 1.00)"));
        assert!(!prompt.contains("{role}"));
    }

    #[test]
    fn test_rewrite_prompt_interpolates_target_and_length() {
        let prompt = build_rewrite_prompt("Reduced costs significantly", 20);
        assert!(prompt.contains("at most 20 characters"));
        assert!(prompt.contains("CURRENT BULLET: Reduced costs significantly"));
        assert!(prompt.contains("CURRENT LENGTH: 27 characters"));
    }
}
