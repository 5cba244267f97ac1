use crate::config::CleanerSettings;
use crate::models::CleanedAddresses;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const SYSTEM_PROMPT: &str = "You are an address cleaning service. Your task is to:
1. Remove email addresses, postal codes, and extraneous tokens
2. Correct obvious typos in street or city names
3. Do NOT count simple removals (like stripping zip codes) as corrections
4. Return only valid JSON in the specified format

Example corrections that should set corrected=true:
- \"toooooronto\" -> \"Toronto\"
- \"vancuver\" -> \"Vancouver\"
- \"New Yrok\" -> \"New York\"

Example cleanings that should set corrected=false:
- \"Toronto, M5V 2T6\" -> \"Toronto\"
- \"email@example.com 123 Main St\" -> \"123 Main St\"";

/// Errors from the text-normalization service
///
/// None of these reach the caller of [`AddressCleaner::clean`].
#[derive(Debug, Error)]
pub enum CleanerError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("cleaning service returned status {0}")]
    Status(StatusCode),

    #[error("cleaning service returned no completion")]
    EmptyCompletion,

    #[error("invalid format from cleaning service: {message} (response: {body})")]
    InvalidFormat { message: String, body: String },
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Best-effort address normalizer backed by an OpenAI-compatible chat API
///
/// Without an API key, or when disabled, addresses pass through untouched.
#[derive(Debug, Clone)]
pub struct AddressCleaner {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    timeout: Duration,
}

impl AddressCleaner {
    pub fn new(client: Client, settings: &CleanerSettings) -> Self {
        let api_key = settings
            .api_key
            .clone()
            .filter(|key| settings.enabled && !key.trim().is_empty());

        Self {
            client,
            base_url: settings.base_url.clone(),
            api_key,
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Clean both addresses, falling back to the raw text on any failure
    pub async fn clean(&self, source: &str, destination: &str) -> CleanedAddresses {
        let Some(api_key) = self.api_key.as_deref() else {
            return CleanedAddresses::passthrough(source, destination);
        };

        match self.request_cleaning(api_key, source, destination).await {
            Ok(cleaned) => {
                tracing::debug!(
                    "Cleaned addresses: {:?} -> {:?}, {:?} -> {:?}",
                    source,
                    cleaned.source,
                    destination,
                    cleaned.destination
                );
                cleaned
            }
            Err(e @ CleanerError::InvalidFormat { .. }) => {
                tracing::error!("{}", e);
                CleanedAddresses::passthrough(source, destination)
            }
            Err(e) => {
                tracing::warn!("Error cleaning addresses, using originals: {}", e);
                CleanedAddresses::passthrough(source, destination)
            }
        }
    }

    async fn request_cleaning(
        &self,
        api_key: &str,
        source: &str,
        destination: &str,
    ) -> Result<CleanedAddresses, CleanerError> {
        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt(source, destination),
                },
            ],
            temperature: 0.0,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CleanerError::Status(response.status()));
        }

        let body: ChatResponse = response.json().await?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(CleanerError::EmptyCompletion)?;

        parse_cleaned(&content)
    }
}

fn user_prompt(source: &str, destination: &str) -> String {
    format!(
        "Please clean and normalize the following user inputs before geocoding:\n\n\
         Source: {source}\n\
         Destination: {destination}\n\n\
         Instructions:\n\
         - Strip out any email addresses, postal codes, or other non-place tokens; these removals do **not** count as corrections.\n\
         - Only if you correct an actual typo or replace a wrong place name (e.g. \"toooooooronto\" -> \"Toronto\") should you set the corresponding `...Corrected` flag to `true`.\n\
         - If the original place name is already valid or you've only removed extraneous tokens, set the `...Corrected` flags to `false`.\n\
         - Return **only** valid JSON, exactly in this format:\n\n\
         {{\n\
         \"source\": \"<cleaned_source>\",\n\
         \"destination\": \"<cleaned_destination>\",\n\
         \"sourceCorrected\": true|false,\n\
         \"destinationCorrected\": true|false\n\
         }}"
    )
}

/// Parse the model's answer. Missing fields or blank addresses count as malformed.
fn parse_cleaned(content: &str) -> Result<CleanedAddresses, CleanerError> {
    let text = content.trim();

    let cleaned: CleanedAddresses =
        serde_json::from_str(text).map_err(|e| CleanerError::InvalidFormat {
            message: e.to_string(),
            body: text.to_string(),
        })?;

    if cleaned.source.trim().is_empty() || cleaned.destination.trim().is_empty() {
        return Err(CleanerError::InvalidFormat {
            message: "blank address in response".to_string(),
            body: text.to_string(),
        });
    }

    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_well_formed_response() {
        let content = r#"
            {"source": "Toronto", "destination": "Vancouver", "sourceCorrected": true, "destinationCorrected": false}
        "#;
        let cleaned = parse_cleaned(content).unwrap();
        assert_eq!(cleaned.source, "Toronto");
        assert_eq!(cleaned.destination, "Vancouver");
        assert!(cleaned.source_corrected);
        assert!(!cleaned.destination_corrected);
    }

    #[test]
    fn test_missing_field_is_invalid_format() {
        let content = r#"{"source": "Toronto", "destination": "Vancouver", "sourceCorrected": true}"#;
        assert!(matches!(parse_cleaned(content), Err(CleanerError::InvalidFormat { .. })));
    }

    #[test]
    fn test_prose_is_invalid_format() {
        let content = "Sure! The cleaned source is Toronto.";
        assert!(matches!(parse_cleaned(content), Err(CleanerError::InvalidFormat { .. })));
    }

    #[test]
    fn test_blank_address_is_invalid_format() {
        let content = r#"{"source": " ", "destination": "Vancouver", "sourceCorrected": false, "destinationCorrected": false}"#;
        assert!(matches!(parse_cleaned(content), Err(CleanerError::InvalidFormat { .. })));
    }

    #[test]
    fn test_prompt_carries_both_addresses() {
        let prompt = user_prompt("Tronto, M5V 2T6", "vancuver");
        assert!(prompt.contains("Source: Tronto, M5V 2T6"));
        assert!(prompt.contains("Destination: vancuver"));
        assert!(prompt.contains("\"destinationCorrected\": true|false"));
    }
}
