//! Chat-completions client

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, warn};

use crate::AiError;

const DEFAULT_API_URL: &str = "https://open.bigmodel.cn/api/paas/v4/chat/completions";
const DEFAULT_MODEL: &str = "glm-4-flash";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// AI client configuration
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// API key; the client runs in mock mode without one
    pub api_key: Option<String>,
    /// Chat-completions endpoint
    pub api_url: String,
    /// Model name
    pub model: String,
}

impl AiConfig {
    /// Create a config for the default endpoint and model
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
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
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// LLM chat-completions client
#[derive(Clone)]
pub struct AiClient {
    client: reqwest::Client,
    config: AiConfig,
}

impl AiClient {
    /// Create a new AI client
    pub fn new(config: AiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client, config }
    }

    /// Whether a real provider is configured
    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Run the analysis prompt.
    ///
    /// Falls back to the canned analysis when no key is configured or
    /// the provider call fails; analysis is a nice-to-have, not a
    /// request-breaking dependency.
    pub async fn analyze(&self, prompt: &str) -> String {
        let Some(api_key) = self.config.api_key.as_deref() else {
            warn!("AI API key not configured, returning mock analysis");
            return mock_analysis().to_string();
        };

        match self.chat(api_key, prompt).await {
            Ok(content) => content,
            Err(e) => {
                error!(error = %e, "AI provider call failed, returning mock analysis");
                mock_analysis().to_string()
            }
        }
    }

    async fn chat(&self, api_key: &str, prompt: &str) -> Result<String, AiError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.7,
            max_tokens: 2000,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AiError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Provider(format!("status {status}: {body}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AiError::InvalidResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AiError::InvalidResponse("empty choices".to_string()))
    }
}

impl std::fmt::Debug for AiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiClient")
            .field("model", &self.config.model)
            .field("configured", &self.is_configured())
            .finish_non_exhaustive()
    }
}

/// Canned analysis served when the provider is unavailable
pub fn mock_analysis() -> &'static str {
    r#"## Your Productivity Analysis

### 1. Completion overview
Your completion rate shows a solid execution baseline. Keep the momentum and consider raising the bar gradually.

### 2. Priority management
A noticeable share of your tasks sits in the urgent-but-unimportant quadrant. Shift attention toward important-but-not-urgent work; it compounds.

### 3. Habits observed
- You tend to create many medium-priority tasks
- Re-rank your list for five minutes before starting the day
- Apply the two-minute rule: if it takes under two minutes, do it now

### 4. Matrix guidance
| | Urgent | Not urgent |
|---|---|---|
| **Important** | Do now | Schedule |
| **Not important** | Delegate | Drop |

### 5. Suggested next steps
1. Pick three most-important tasks each morning and finish those first
2. Work in focused 25-minute blocks with short breaks
3. Run a 15-minute weekly review to re-plan the coming week
4. Re-evaluate tasks untouched for a week: demote or delete
5. Give every task a due date to keep urgency honest"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_client_returns_mock_analysis() {
        let client = AiClient::new(AiConfig::new(None));
        assert!(!client.is_configured());

        let analysis = client.analyze("whatever").await;
        assert!(analysis.contains("Productivity Analysis"));
    }

    #[tokio::test]
    async fn provider_failure_falls_back_to_mock() {
        // Unroutable endpoint forces the error path
        let mut config = AiConfig::new(Some("key".to_string()));
        config.api_url = "http://127.0.0.1:1/api".to_string();
        let client = AiClient::new(config);

        let analysis = client.analyze("whatever").await;
        assert!(analysis.contains("Productivity Analysis"));
    }
}
