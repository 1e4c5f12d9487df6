use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use crate::feed::Post;

/// One row of the `processed_posts` table. Written exactly once per post ID;
/// never updated or deleted by this program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedPost {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub analysis: String,
}

/// Dedup ledger backed by a Supabase PostgREST table.
///
/// The lookup-before-insert pattern is the only duplicate guard; there is no
/// unique-constraint handling here, so overlapping runs of the program can
/// race and double-insert. Single-instance execution is assumed.
pub struct SupabaseLedger {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl SupabaseLedger {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client,
        }
    }

    fn table_url(&self) -> String {
        format!(
            "{}/rest/v1/processed_posts",
            self.base_url.trim_end_matches('/')
        )
    }

    /// True iff a record with this post ID already exists. Fails open: any
    /// query error is logged and reported as "not yet processed", trading a
    /// possible duplicate notification for never silently dropping a post.
    pub async fn is_processed(&self, post_id: &str) -> bool {
        match self.query_by_id(post_id).await {
            Ok(rows) => !rows.is_empty(),
            Err(e) => {
                warn!(post_id, error = %e, "ledger lookup failed, treating post as unprocessed");
                false
            }
        }
    }

    async fn query_by_id(&self, post_id: &str) -> Result<Vec<ProcessedPost>> {
        let response = self
            .client
            .get(self.table_url())
            .query(&[("id", format!("eq.{post_id}")), ("select", "*".to_string())])
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "ledger query returned {}",
                response.status()
            ));
        }

        let rows: Vec<ProcessedPost> = response.json().await?;
        Ok(rows)
    }

    /// Insert the processed record for a post. Insert failure is an explicit
    /// error for the caller to log; the run continues regardless.
    pub async fn mark_processed(&self, post: &Post, analysis: &str) -> Result<()> {
        let record = ProcessedPost {
            id: post.id.clone(),
            created_at: post.created_at,
            analysis: analysis.to_string(),
        };

        let response = self
            .client
            .post(self.table_url())
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Prefer", "return=minimal")
            .json(&record)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "ledger insert for post {} returned {}: {}",
                record.id,
                status,
                body.chars().take(200).collect::<String>()
            ));
        }

        Ok(())
    }
}
