use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::OracleConfig;
use crate::error::TriageError;

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// One text prompt in, one free-text response out. The oracle enforces no
/// output format; parsing its response is the classifier's job.
#[allow(async_fn_in_trait)]
pub trait Oracle {
    async fn complete(&self, prompt: &str) -> Result<String, TriageError>;
}

/// Gemini `generateContent` client. One call per email, no batching, no
/// retries; the configured timeout surfaces as an `Oracle` error.
pub struct GeminiOracle {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiOracle {
    pub fn new(config: &OracleConfig) -> Result<Self> {
        info!("Using Gemini model '{}'", config.model);

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .context("Unable to build the HTTP client for the Gemini API")?;

        Ok(GeminiOracle {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

impl Oracle for GeminiOracle {
    async fn complete(&self, prompt: &str) -> Result<String, TriageError> {
        debug!("Sending {} characters to the Gemini API", prompt.len());

        let url = format!("{}/{}:generateContent", GEMINI_ENDPOINT, self.model);
        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| TriageError::Oracle(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(200).collect();
            return Err(TriageError::Oracle(format!("HTTP {}: {}", status, excerpt)));
        }

        let payload: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| TriageError::Oracle(format!("malformed response: {}", e)))?;

        payload
            .first_text()
            .ok_or_else(|| TriageError::Oracle("response contained no text".to_string()))
    }
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, `None` when the response
    /// carried no usable text at all.
    fn first_text(self) -> Option<String> {
        let candidate = self.candidates?.into_iter().next()?;
        let parts = candidate.content?.parts?;
        let text: String = parts.into_iter().filter_map(|p| p.text).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_text_extraction() {
        let payload: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"DELETE | "},{"text":"old newsletter"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(payload.first_text().unwrap(), "DELETE | old newsletter");
    }

    #[test]
    fn test_empty_response_is_none() {
        let payload: GenerateContentResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(payload.first_text().is_none());
    }

    #[test]
    fn test_missing_candidates_is_none() {
        let payload: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(payload.first_text().is_none());
    }
}
