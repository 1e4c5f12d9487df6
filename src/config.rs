use anyhow::{Context, Result};
use std::env;

use crate::analysis::DEFAULT_GEMINI_MODEL;
use crate::feed::{DEFAULT_ACCOUNT_ID, DEFAULT_FETCH_LIMIT};

/// Runtime configuration, read once from the environment at startup.
///
/// Required variables: `SUPABASE_URL`, `SUPABASE_KEY`, `TELEGRAM_BOT_TOKEN`,
/// `TELEGRAM_CHANNEL_ID`, `GEMINI_API_KEY`. The account, fetch limit and
/// model can be overridden with `TRUTHPULSE_*` variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_key: String,
    pub telegram_bot_token: String,
    pub telegram_channel_id: String,
    pub gemini_api_key: String,
    pub account_id: String,
    pub fetch_limit: usize,
    pub gemini_model: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let fetch_limit = match env::var("TRUTHPULSE_FETCH_LIMIT") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("invalid TRUTHPULSE_FETCH_LIMIT: {raw}"))?,
            Err(_) => DEFAULT_FETCH_LIMIT,
        };

        Ok(Self {
            supabase_url: required("SUPABASE_URL")?,
            supabase_key: required("SUPABASE_KEY")?,
            telegram_bot_token: required("TELEGRAM_BOT_TOKEN")?,
            telegram_channel_id: required("TELEGRAM_CHANNEL_ID")?,
            gemini_api_key: required("GEMINI_API_KEY")?,
            account_id: env::var("TRUTHPULSE_ACCOUNT_ID")
                .unwrap_or_else(|_| DEFAULT_ACCOUNT_ID.to_string()),
            fetch_limit,
            gemini_model: env::var("TRUTHPULSE_GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string()),
        })
    }
}

fn required(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("missing required environment variable {name}"))
}
