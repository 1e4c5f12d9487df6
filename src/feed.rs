use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://truthsocial.com/api/v1";
pub const DEFAULT_ACCOUNT_ID: &str = "107780257626128497";
pub const DEFAULT_FETCH_LIMIT: usize = 20;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";

/// One status from the account's public feed, as returned by the API.
/// Immutable once fetched; `content` may contain HTML markup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub content: String,
    pub url: String,
    #[serde(default)]
    pub replies_count: u32,
    #[serde(default)]
    pub reblogs_count: u32,
    #[serde(default)]
    pub favourites_count: u32,
    #[serde(default)]
    pub media_attachments: Vec<MediaAttachment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaAttachment {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
}

pub struct FeedClient {
    base_url: String,
    account_id: String,
    limit: usize,
    client: reqwest::Client,
}

impl FeedClient {
    pub fn new(base_url: impl Into<String>, account_id: impl Into<String>, limit: usize) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into(),
            account_id: account_id.into(),
            limit,
            client,
        }
    }

    /// Fetch one page of the account's statuses, in the API's return order.
    /// Replies and media-only posts are excluded server-side. Gzip responses
    /// are decompressed transparently by the client.
    pub async fn fetch_statuses(&self) -> Result<Vec<Post>> {
        let url = format!("{}/accounts/{}/statuses", self.base_url, self.account_id);
        let limit = self.limit.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("exclude_replies", "true"),
                ("only_media", "false"),
                ("limit", limit.as_str()),
            ])
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "statuses API returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            ));
        }

        let posts: Vec<Post> = response.json().await?;
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_status() {
        let body = r#"{
            "id": "1",
            "created_at": "2025-01-15T12:30:00.000Z",
            "content": "<p>Hello &amp; welcome</p>",
            "url": "https://x/1",
            "replies_count": 5,
            "reblogs_count": 2,
            "favourites_count": 10,
            "media_attachments": [{"type": "image", "url": "https://x/img.png"}]
        }"#;

        let post: Post = serde_json::from_str(body).unwrap();
        assert_eq!(post.id, "1");
        assert_eq!(post.replies_count, 5);
        assert_eq!(post.media_attachments.len(), 1);
        assert_eq!(post.media_attachments[0].kind, "image");
    }

    #[test]
    fn test_deserialize_minimal_status() {
        // Counters and attachments may be absent entirely
        let body = r#"{
            "id": "2",
            "created_at": "2025-01-15T12:30:00Z",
            "content": "",
            "url": "https://x/2"
        }"#;

        let post: Post = serde_json::from_str(body).unwrap();
        assert_eq!(post.favourites_count, 0);
        assert!(post.media_attachments.is_empty());
    }
}
