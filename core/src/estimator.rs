use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::{NutrientEstimate, validate_description};

pub const DEFAULT_ESTIMATE_TIMEOUT: Duration = Duration::from_secs(15);

/// Turns a free-text food description into a nutrient estimate.
///
/// Implementations talk to an external service that may be slow, down, or
/// return nonsense. Every failure must come back as [`Error::Estimation`].
#[async_trait]
pub trait FoodEstimator: Send + Sync {
    async fn estimate(&self, description: &str) -> Result<NutrientEstimate>;
}

/// Stand-in used when no provider credential is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredEstimator;

#[async_trait]
impl FoodEstimator for UnconfiguredEstimator {
    async fn estimate(&self, _description: &str) -> Result<NutrientEstimate> {
        Err(Error::estimation("OpenAI API key not configured"))
    }
}

/// Validate the description, then run the estimator with an upper bound on
/// how long it may take. A timeout is reported like any other provider failure.
pub async fn estimate_with_timeout(
    estimator: &dyn FoodEstimator,
    description: &str,
    timeout: Duration,
) -> Result<NutrientEstimate> {
    let description = validate_description(description)?;
    if let Ok(result) = tokio::time::timeout(timeout, estimator.estimate(&description)).await {
        result
    } else {
        tracing::warn!(timeout_secs = timeout.as_secs_f64(), "food estimate timed out");
        Err(Error::estimation(format!(
            "Food estimate timed out after {:.1}s",
            timeout.as_secs_f64()
        )))
    }
}

/// Parse a model reply of the form `{"calories": n, "protein": n, "fiber": n}`.
///
/// A surrounding Markdown code fence is tolerated. Values are rounded to whole
/// numbers; missing, non-numeric, negative or non-finite values are rejected.
pub fn parse_estimate(content: &str) -> Result<NutrientEstimate> {
    let body = strip_code_fence(content.trim());
    let value: Value = serde_json::from_str(body)
        .map_err(|e| Error::estimation(format!("AI response was not valid JSON: {e}")))?;
    if !value.is_object() {
        return Err(Error::estimation("AI response was not a JSON object"));
    }

    let field = |name: &str| -> Result<i64> {
        let n = value
            .get(name)
            .and_then(Value::as_f64)
            .ok_or_else(|| Error::estimation(format!("AI response has no numeric '{name}'")))?;
        if !n.is_finite() || n < 0.0 {
            return Err(Error::estimation(format!(
                "AI response has an invalid '{name}': {n}"
            )));
        }
        Ok(n.round() as i64)
    };

    Ok(NutrientEstimate {
        calories: field("calories")?,
        protein: field("protein")?,
        fiber: field("fiber")?,
    })
}

fn strip_code_fence(s: &str) -> &str {
    let Some(inner) = s.strip_prefix("```") else {
        return s;
    };
    let inner = inner
        .strip_prefix("json")
        .or_else(|| inner.strip_prefix("JSON"))
        .unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
