// Shared fixtures for integration tests
#![allow(dead_code)]

use distance_calculator::config::{CaptchaSettings, CleanerSettings, GeocodingSettings};
use distance_calculator::models::{NewQueryRecord, QueryHistoryRecord};
use distance_calculator::services::{AddressCleaner, CaptchaVerifier, GeocodingClient, HistoryStore, StoreError};
use distance_calculator::QueryPipeline;
use mockito::{Matcher, Mock, ServerGuard};
use std::io::Write;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TORONTO: (f64, f64) = (43.6532, -79.3832);
pub const VANCOUVER: (f64, f64) = (49.2827, -123.1207);
pub const USER_AGENT: &str = "DistanceCalculator/Test";
pub const CAPTCHA_SECRET: &str = "test-secret";

/// Longer than the one-second timeout used by the stall tests
pub const STALL: Duration = Duration::from_secs(2);

/// In-memory history store
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<QueryHistoryRecord>>,
    next_id: AtomicI64,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn records(&self) -> Vec<QueryHistoryRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl HistoryStore for MemoryStore {
    async fn insert_query(&self, record: NewQueryRecord) -> Result<QueryHistoryRecord, StoreError> {
        if self.fail_writes {
            return Err(StoreError::Unavailable("connection refused by db.internal:5432".to_string()));
        }

        let stored = QueryHistoryRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            source: record.source,
            destination: record.destination,
            kilometers: record.kilometers,
            miles: record.miles,
            created_at: chrono::Utc::now(),
        };
        self.records.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn recent_queries(&self, limit: u32) -> Result<Vec<QueryHistoryRecord>, StoreError> {
        let mut records = self.records();
        // Insertion order matches created_at order here
        records.sort_by(|a, b| b.id.cmp(&a.id));
        records.truncate(limit as usize);
        Ok(records)
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(!self.fail_writes)
    }
}

pub fn captcha_settings(base_url: &str) -> CaptchaSettings {
    CaptchaSettings {
        secret: CAPTCHA_SECRET.to_string(),
        verify_url: format!("{}/recaptcha/api/siteverify", base_url),
        timeout_secs: 5,
    }
}

pub fn geocoding_settings(base_url: &str) -> GeocodingSettings {
    GeocodingSettings {
        base_url: base_url.to_string(),
        user_agent: USER_AGENT.to_string(),
        timeout_secs: 10,
    }
}

pub fn cleaner_settings(base_url: &str, api_key: Option<&str>) -> CleanerSettings {
    CleanerSettings {
        enabled: true,
        api_key: api_key.map(str::to_string),
        base_url: base_url.to_string(),
        model: "gpt-3.5-turbo".to_string(),
        max_tokens: 150,
        timeout_secs: 5,
    }
}

/// Pipeline whose upstreams all point at `base_url`
pub fn pipeline<S: HistoryStore>(base_url: &str, store: Arc<S>, cleaner_key: Option<&str>) -> QueryPipeline<S> {
    let http = reqwest::Client::new();
    QueryPipeline::new(
        CaptchaVerifier::new(http.clone(), &captcha_settings(base_url)),
        AddressCleaner::new(http.clone(), &cleaner_settings(base_url, cleaner_key)),
        GeocodingClient::new(http, &geocoding_settings(base_url)),
        store,
    )
}

pub async fn mock_captcha(server: &mut ServerGuard, success: bool) -> Mock {
    server
        .mock("POST", "/recaptcha/api/siteverify")
        .match_body(Matcher::UrlEncoded("secret".into(), CAPTCHA_SECRET.into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(r#"{{"success": {}, "hostname": "localhost"}}"#, success))
        .create_async()
        .await
}

pub async fn mock_geocode(server: &mut ServerGuard, address: &str, result: Option<(f64, f64)>) -> Mock {
    let body = match result {
        Some((lat, lon)) => format!(r#"[{{"lat": "{}", "lon": "{}", "display_name": "{}"}}]"#, lat, lon, address),
        None => "[]".to_string(),
    };

    server
        .mock("GET", "/search")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), address.into()),
            Matcher::UrlEncoded("format".into(), "json".into()),
            Matcher::UrlEncoded("limit".into(), "1".into()),
        ]))
        .match_header("user-agent", USER_AGENT)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}

/// Chat completion whose message content is `content`
pub async fn mock_cleaner(server: &mut ServerGuard, content: &str) -> Mock {
    server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(chat_completion(content))
        .create_async()
        .await
}

pub fn cleaned_json(source: &str, destination: &str, source_corrected: bool, destination_corrected: bool) -> String {
    serde_json::json!({
        "source": source,
        "destination": destination,
        "sourceCorrected": source_corrected,
        "destinationCorrected": destination_corrected,
    })
    .to_string()
}

/// Answers `body` with status 200, but only after `STALL` has passed
pub async fn mock_stalled(server: &mut ServerGuard, method: &str, path: &str, body: String) -> Mock {
    server
        .mock(method, path)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_chunked_body(move |w| {
            std::thread::sleep(STALL);
            w.write_all(body.as_bytes())
        })
        .create_async()
        .await
}

/// Chat completion envelope around `content`
pub fn chat_completion(content: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [
            {
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }
        ]
    })
    .to_string()
}
