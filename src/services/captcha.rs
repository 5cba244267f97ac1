use crate::config::CaptchaSettings;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Longest token accepted before any network call is made
const MAX_TOKEN_LEN: usize = 4096;

/// Reasons a captcha token was not accepted
///
/// Every variant means the same thing to callers: the request is rejected.
#[derive(Debug, Error)]
pub enum CaptchaError {
    #[error("captcha token is empty")]
    EmptyToken,

    #[error("captcha token is malformed")]
    MalformedToken,

    #[error("verification service rejected the token: {0:?}")]
    Rejected(Vec<String>),

    #[error("verification service returned status {0}")]
    Status(StatusCode),

    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    #[serde(default)]
    success: bool,
    #[serde(rename = "error-codes", default)]
    error_codes: Vec<String>,
}

/// reCAPTCHA-style token verifier
///
/// Fails closed: any failure to obtain a positive answer rejects the token.
/// A single attempt is made per token.
#[derive(Debug, Clone)]
pub struct CaptchaVerifier {
    client: Client,
    verify_url: String,
    secret: String,
    timeout: Duration,
}

impl CaptchaVerifier {
    pub fn new(client: Client, settings: &CaptchaSettings) -> Self {
        Self {
            client,
            verify_url: settings.verify_url.clone(),
            secret: settings.secret.clone(),
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }

    /// Verify a client-supplied token
    pub async fn verify(&self, token: &str) -> Result<(), CaptchaError> {
        check_token_shape(token)?;

        let response = self
            .client
            .post(&self.verify_url)
            .form(&[("secret", self.secret.as_str()), ("response", token)])
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CaptchaError::Status(response.status()));
        }

        let result: VerifyResponse = response.json().await?;

        if !result.success {
            return Err(CaptchaError::Rejected(result.error_codes));
        }

        tracing::debug!("Captcha verification successful");

        Ok(())
    }
}

fn check_token_shape(token: &str) -> Result<(), CaptchaError> {
    if token.trim().is_empty() {
        return Err(CaptchaError::EmptyToken);
    }
    if token.len() > MAX_TOKEN_LEN || token.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(CaptchaError::MalformedToken);
    }
    Ok(())
}
