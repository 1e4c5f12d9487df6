use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use truthpulse::analysis::{self, GeminiClient};
use truthpulse::config::Config;
use truthpulse::feed::{self, FeedClient};
use truthpulse::ledger::SupabaseLedger;
use truthpulse::pipeline;
use truthpulse::publisher::TelegramPublisher;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let feed = FeedClient::new(
        feed::DEFAULT_API_BASE,
        &config.account_id,
        config.fetch_limit,
    );
    let ledger = SupabaseLedger::new(&config.supabase_url, &config.supabase_key);
    let analyzer = GeminiClient::new(
        analysis::DEFAULT_API_BASE,
        &config.gemini_api_key,
        &config.gemini_model,
    );
    let notifier = TelegramPublisher::new(
        TELEGRAM_API_BASE,
        &config.telegram_bot_token,
        &config.telegram_channel_id,
    );

    info!(account_id = %config.account_id, "fetching posts");
    let posts = match feed.fetch_statuses().await {
        Ok(posts) => posts,
        Err(e) => {
            // A failed fetch means zero posts this run; the next scheduled
            // run retries. Exit cleanly so the scheduler sees no crash.
            error!(error = %e, "failed to fetch posts");
            return Ok(());
        }
    };

    info!(count = posts.len(), "fetched posts");
    let stats = pipeline::process_posts(&posts, &ledger, &analyzer, &notifier).await;
    info!(
        published = stats.published,
        skipped = stats.skipped,
        empty = stats.empty,
        failed = stats.failed,
        "run complete"
    );

    Ok(())
}
