use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::estimator::parse_estimate;
use crate::models::NutrientEstimate;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

pub const SYSTEM_PROMPT: &str = "You are a nutrition estimation assistant. Given a food description, \
estimate its nutritional content. Respond with ONLY valid JSON in exactly this format: \
{\"calories\": number, \"protein\": number, \"fiber\": number}. Use kcal for calories and grams \
for protein and fiber. If the description is ambiguous, estimate for a typical serving size.";

const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 100;

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

impl<'a> ChatCompletionRequest<'a> {
    #[must_use]
    pub fn for_description(model: &'a str, description: &'a str) -> Self {
        Self {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: description,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

/// Pull the first choice's text out of a completion and parse it.
pub fn response_to_estimate(response: ChatCompletionResponse) -> Result<NutrientEstimate> {
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| Error::estimation("No response from AI"))?;
    parse_estimate(&content)
}
