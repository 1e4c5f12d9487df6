use anyhow::Result;
use async_trait::async_trait;
use tracing::{error, info};

use crate::analysis::{AnalysisError, GeminiClient};
use crate::feed::Post;
use crate::ledger::SupabaseLedger;
use crate::publisher::TelegramPublisher;
use crate::sanitize::sanitize;

/// Analysis recorded for posts that carry no textual content after
/// sanitization. Such posts are marked processed without a summary or a
/// channel message.
pub const EMPTY_CONTENT_ANALYSIS: &str = "پست فاقد محتوای متنی";

#[async_trait]
pub trait ProcessedLedger: Send + Sync {
    async fn is_processed(&self, post_id: &str) -> bool;
    async fn mark_processed(&self, post: &Post, analysis: &str) -> Result<()>;
}

#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, post: &Post) -> Result<String, AnalysisError>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, post: &Post, analysis: &str) -> Result<()>;
}

#[async_trait]
impl ProcessedLedger for SupabaseLedger {
    async fn is_processed(&self, post_id: &str) -> bool {
        SupabaseLedger::is_processed(self, post_id).await
    }

    async fn mark_processed(&self, post: &Post, analysis: &str) -> Result<()> {
        SupabaseLedger::mark_processed(self, post, analysis).await
    }
}

#[async_trait]
impl Analyzer for GeminiClient {
    async fn analyze(&self, post: &Post) -> Result<String, AnalysisError> {
        GeminiClient::analyze(self, post).await
    }
}

#[async_trait]
impl Notifier for TelegramPublisher {
    async fn publish(&self, post: &Post, analysis: &str) -> Result<()> {
        TelegramPublisher::publish(self, post, analysis).await
    }
}

/// Per-run outcome counters, for the closing log line.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    pub published: usize,
    pub skipped: usize,
    pub empty: usize,
    pub failed: usize,
}

/// Run the fetch-order pipeline over one batch of posts.
///
/// Per-post failures are logged where they occur and abort that post only; a
/// post that fails before its ledger write stays unprocessed and is retried
/// by a future run. A publish that succeeds but whose ledger write fails may
/// be re-sent later; that duplicate risk is accepted.
pub async fn process_posts(
    posts: &[Post],
    ledger: &dyn ProcessedLedger,
    analyzer: &dyn Analyzer,
    notifier: &dyn Notifier,
) -> RunStats {
    let mut stats = RunStats::default();

    for post in posts {
        if ledger.is_processed(&post.id).await {
            stats.skipped += 1;
            continue;
        }

        let clean_content = sanitize(&post.content);
        if clean_content.is_empty() {
            if let Err(e) = ledger.mark_processed(post, EMPTY_CONTENT_ANALYSIS).await {
                error!(post_id = %post.id, error = %e, "failed to mark empty post as processed");
            }
            stats.empty += 1;
            continue;
        }

        let analysis = match analyzer.analyze(post).await {
            Ok(analysis) => analysis,
            Err(e) => {
                error!(post_id = %post.id, error = %e, "failed to analyze post");
                stats.failed += 1;
                continue;
            }
        };

        if let Err(e) = notifier.publish(post, &analysis).await {
            error!(post_id = %post.id, error = %e, "failed to publish post");
            stats.failed += 1;
            continue;
        }

        if let Err(e) = ledger.mark_processed(post, &analysis).await {
            // Already published; a later run may re-send this post.
            error!(post_id = %post.id, error = %e, "failed to mark post as processed");
        }

        info!(post_id = %post.id, "published post with analysis");
        stats.published += 1;
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;

    fn post(id: &str, content: &str) -> Post {
        Post {
            id: id.to_string(),
            created_at: Utc::now(),
            content: content.to_string(),
            url: format!("https://x/{id}"),
            replies_count: 0,
            reblogs_count: 0,
            favourites_count: 0,
            media_attachments: vec![],
        }
    }

    #[derive(Default)]
    struct FakeLedger {
        records: Mutex<Vec<(String, String)>>,
        fail_inserts: bool,
    }

    #[async_trait]
    impl ProcessedLedger for FakeLedger {
        async fn is_processed(&self, post_id: &str) -> bool {
            self.records
                .lock()
                .unwrap()
                .iter()
                .any(|(id, _)| id == post_id)
        }

        async fn mark_processed(&self, post: &Post, analysis: &str) -> Result<()> {
            if self.fail_inserts {
                return Err(anyhow::anyhow!("storage unavailable"));
            }
            self.records
                .lock()
                .unwrap()
                .push((post.id.clone(), analysis.to_string()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeAnalyzer {
        calls: Mutex<usize>,
        fail: bool,
    }

    #[async_trait]
    impl Analyzer for FakeAnalyzer {
        async fn analyze(&self, _post: &Post) -> Result<String, AnalysisError> {
            *self.calls.lock().unwrap() += 1;
            if self.fail {
                return Err(AnalysisError::NoContent);
            }
            Ok("Neutral impact.".to_string())
        }
    }

    #[derive(Default)]
    struct FakeNotifier {
        sent: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl Notifier for FakeNotifier {
        async fn publish(&self, post: &Post, _analysis: &str) -> Result<()> {
            if self.fail {
                return Err(anyhow::anyhow!("delivery failed"));
            }
            self.sent.lock().unwrap().push(post.id.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_publishes_new_post_and_records_it() {
        let ledger = FakeLedger::default();
        let analyzer = FakeAnalyzer::default();
        let notifier = FakeNotifier::default();
        let posts = vec![post("1", "<p>Hello &amp; welcome</p>")];

        let stats = process_posts(&posts, &ledger, &analyzer, &notifier).await;

        assert_eq!(stats.published, 1);
        assert_eq!(*notifier.sent.lock().unwrap(), vec!["1".to_string()]);
        let records = ledger.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0], ("1".to_string(), "Neutral impact.".to_string()));
    }

    #[tokio::test]
    async fn test_empty_post_marked_with_sentinel_and_never_published() {
        let ledger = FakeLedger::default();
        let analyzer = FakeAnalyzer::default();
        let notifier = FakeNotifier::default();
        let posts = vec![post("1", "<p>  </p>")];

        let stats = process_posts(&posts, &ledger, &analyzer, &notifier).await;

        assert_eq!(stats.empty, 1);
        assert_eq!(*analyzer.calls.lock().unwrap(), 0);
        assert!(notifier.sent.lock().unwrap().is_empty());
        let records = ledger.records.lock().unwrap();
        assert_eq!(
            records[0],
            ("1".to_string(), EMPTY_CONTENT_ANALYSIS.to_string())
        );
    }

    #[tokio::test]
    async fn test_second_run_publishes_nothing() {
        let ledger = FakeLedger::default();
        let analyzer = FakeAnalyzer::default();
        let notifier = FakeNotifier::default();
        let posts = vec![post("1", "first"), post("2", "second")];

        let first = process_posts(&posts, &ledger, &analyzer, &notifier).await;
        assert_eq!(first.published, 2);

        let second = process_posts(&posts, &ledger, &analyzer, &notifier).await;
        assert_eq!(second.published, 0);
        assert_eq!(second.skipped, 2);
        assert_eq!(notifier.sent.lock().unwrap().len(), 2);
        assert_eq!(ledger.records.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_analysis_failure_skips_post_but_run_continues() {
        let ledger = FakeLedger::default();
        let analyzer = FakeAnalyzer {
            fail: true,
            ..Default::default()
        };
        let notifier = FakeNotifier::default();
        let posts = vec![post("1", "first"), post("2", "second")];

        let stats = process_posts(&posts, &ledger, &analyzer, &notifier).await;

        assert_eq!(stats.failed, 2);
        assert_eq!(*analyzer.calls.lock().unwrap(), 2);
        assert!(notifier.sent.lock().unwrap().is_empty());
        assert!(ledger.records.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_publish_failure_leaves_post_unprocessed() {
        let ledger = FakeLedger::default();
        let analyzer = FakeAnalyzer::default();
        let notifier = FakeNotifier {
            fail: true,
            ..Default::default()
        };
        let posts = vec![post("1", "first")];

        let stats = process_posts(&posts, &ledger, &analyzer, &notifier).await;

        assert_eq!(stats.failed, 1);
        assert!(ledger.records.lock().unwrap().is_empty());
        // Post stays eligible for the next run
        assert!(!ledger.is_processed("1").await);
    }

    #[tokio::test]
    async fn test_ledger_write_failure_after_publish_is_logged_only() {
        let ledger = FakeLedger {
            fail_inserts: true,
            ..Default::default()
        };
        let analyzer = FakeAnalyzer::default();
        let notifier = FakeNotifier::default();
        let posts = vec![post("1", "first")];

        let stats = process_posts(&posts, &ledger, &analyzer, &notifier).await;

        // Message went out; the post still counts as published this run.
        assert_eq!(stats.published, 1);
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
        assert!(ledger.records.lock().unwrap().is_empty());
    }
}
