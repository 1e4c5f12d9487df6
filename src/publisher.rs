use anyhow::Result;
use serde_json::json;
use std::time::Duration;

use crate::feed::Post;
use crate::sanitize::sanitize;

/// Compose the channel notification: headline, sanitized post text, analysis
/// section, link, and the AI disclaimer. Pure formatting, transport-free.
pub fn format_notification(clean_content: &str, analysis: &str, url: &str) -> String {
    format!(
        "🔔 پست جدید ترامپ:\n{clean_content}\n\n📊 تحلیل تأثیر بر بازار رمزارز:\n{analysis}\n\n🔗 لینک: \n{url}\n\nاین مطلب توسط هوش مصنوعی بررسی شده است و توصیه مالی نیست.\n"
    )
}

/// Delivers notifications to a fixed Telegram channel through the Bot API.
/// Messages are sent as plain text, no parse mode.
pub struct TelegramPublisher {
    base_url: String,
    bot_token: String,
    channel_id: String,
    client: reqwest::Client,
}

impl TelegramPublisher {
    pub fn new(
        base_url: impl Into<String>,
        bot_token: impl Into<String>,
        channel_id: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into(),
            bot_token: bot_token.into(),
            channel_id: channel_id.into(),
            client,
        }
    }

    pub async fn publish(&self, post: &Post, analysis: &str) -> Result<()> {
        let message = format_notification(&sanitize(&post.content), analysis, &post.url);

        let url = format!(
            "{}/bot{}/sendMessage",
            self.base_url.trim_end_matches('/'),
            self.bot_token
        );

        let response = self
            .client
            .post(&url)
            .json(&json!({
                "chat_id": self.channel_id,
                "text": message,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "sendMessage for post {} returned {}: {}",
                post.id,
                status,
                body.chars().take(200).collect::<String>()
            ));
        }

        Ok(())
    }
}
