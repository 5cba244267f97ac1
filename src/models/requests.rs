use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to compute the distance between two addresses
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddressQuery {
    #[validate(length(min = 1, max = 256))]
    pub source: String,
    #[validate(length(min = 1, max = 256))]
    pub destination: String,
    #[serde(alias = "captcha_token", rename = "captchaToken", default)]
    pub captcha_token: String,
}

/// Query string of the history endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
}
