use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::feed::Post;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-exp";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Failures of a single analysis request. Each aborts processing of the
/// affected post only; the caller moves on to the next one.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("analysis request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("analysis API returned {status}: {body}")]
    Api { status: reqwest::StatusCode, body: String },
    #[error("no content generated")]
    NoContent,
    #[error("unexpected response format")]
    NotText,
}

/// Render the market-impact prompt for one post. Pure formatting, kept apart
/// from the transport so the template is testable on its own.
pub fn build_prompt(post: &Post) -> String {
    format!(
        "تحلیل کن که این پست ترامپ در Truth Social چه تأثیری بر بازار رمزارز می‌تواند داشته باشد. آیا این پست برای بازار رمزارز مفید، مضر یا خنثی است؟ دلایل خود را توضیح دهید. پاسخ را به فارسی و بدون استفاده از مارک‌داون یا فرمت‌های خاص بنویسید چون قرار است در تلگرام نمایش داده شود. تحلیل شما نباید بیشتر از ۲ پاراگراف باشد.\n\nمتن پست: {}\nتعامل: {} پاسخ، {} بازنشر، {} پسند\nزمان انتشار: {}\n\nتحلیل:",
        post.content,
        post.replies_count,
        post.reblogs_count,
        post.favourites_count,
        post.created_at,
    )
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Client for the Gemini `generateContent` endpoint. One request per post,
/// no retries; the next scheduled run is the only retry path.
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        }
    }

    /// Submit the prompt for one post and return the first candidate's first
    /// text part.
    pub async fn analyze(&self, post: &Post) -> Result<String, AnalysisError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_prompt(post),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", &self.api_key)])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Api {
                status,
                body: body.chars().take(200).collect(),
            });
        }

        let decoded: GenerateContentResponse = response.json().await?;

        let part = decoded
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .ok_or(AnalysisError::NoContent)?;

        part.text.clone().ok_or(AnalysisError::NotText)
    }
}
