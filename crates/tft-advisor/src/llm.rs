//! Thin client for the Gemini `generateContent` endpoint, with the retry
//! behavior the service actually needs: linear backoff on transport errors,
//! doubled waits on rate limits.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.0-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

pub struct LlmClient {
    config: LlmConfig,
    client: reqwest::Client,
}

// Response shape, reduced to the fields we read
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            bail!("LLM API key is required (set GEMINI_API_KEY)");
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Build HTTP client")?;
        Ok(Self { config, client })
    }

    /// Send one prompt and return the generated text.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        if prompt.is_empty() {
            bail!("Prompt must be non-empty");
        }
        debug!("Sending prompt to LLM ({} chars)", prompt.len());

        let response = self.request(prompt).await?;
        let text = extract_text(&response)?;
        debug!("LLM response received ({} chars)", text.len());
        Ok(text)
    }

    async fn request(&self, prompt: &str) -> Result<GenerateResponse> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url, self.config.model
        );
        let payload = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let mut last_err = None;
        for attempt in 1..=self.config.max_retries {
            let sent = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.config.api_key)
                .json(&payload)
                .send()
                .await;

            match sent {
                Ok(resp) if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS => {
                    warn!("LLM rate limited (attempt {})", attempt);
                    tokio::time::sleep(self.config.retry_delay * attempt * 2).await;
                    last_err = Some(anyhow::anyhow!("HTTP 429 from LLM API"));
                }
                Ok(resp) => match resp.error_for_status() {
                    Ok(resp) => {
                        return resp
                            .json::<GenerateResponse>()
                            .await
                            .context("Decode LLM response JSON");
                    }
                    Err(e) => {
                        // 4xx other than 429 won't get better by retrying
                        return Err(e).context("LLM API returned an error status");
                    }
                },
                Err(e) => {
                    warn!("LLM request failed: {} (attempt {})", e, attempt);
                    tokio::time::sleep(self.config.retry_delay * attempt).await;
                    last_err = Some(e.into());
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("LLM request failed")))
            .with_context(|| format!("Failed after {} attempts", self.config.max_retries))
    }
}

fn extract_text(response: &GenerateResponse) -> Result<String> {
    let candidate = response
        .candidates
        .first()
        .context("LLM response contained no candidates")?;
    let text: String = candidate
        .content
        .parts
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("");
    let text = text.trim().to_string();
    if text.is_empty() {
        bail!("LLM response contained no text");
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_joins_parts() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[
                {"text":"Roll down to 50 gold"},
                {"text":" and stabilize."}
            ]}}]}"#,
        )
        .unwrap();
        assert_eq!(
            extract_text(&response).unwrap(),
            "Roll down to 50 gold and stabilize."
        );
    }

    #[test]
    fn test_extract_text_empty_is_error() {
        let response: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(extract_text(&response).is_err());

        let response: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[]}}]}"#).unwrap();
        assert!(extract_text(&response).is_err());
    }

    #[test]
    fn test_client_requires_api_key() {
        assert!(LlmClient::new(LlmConfig::default()).is_err());
        let cfg = LlmConfig {
            api_key: "key".into(),
            ..Default::default()
        };
        assert!(LlmClient::new(cfg).is_ok());
    }
}
