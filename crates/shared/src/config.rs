use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use url::Url;

use crate::models::FeedConfig;
use crate::selector::{SelectionPolicy, UndatedPolicy};

/// Maximum number of articles to summarize per run (budget protection)
pub const DEFAULT_MAX_ARTICLES: usize = 5;

/// Hours to look back for articles
pub const DEFAULT_HOURS_LOOKBACK: u32 = 48;

pub const DEFAULT_STORAGE_DIR: &str = "storage";

const ENV_HELP: &str = "To fix this, create ~/.config/ai-news-digest/.env with:\n  \
    PERPLEXITY_API_KEY=your_key_here\n  \
    TELEGRAM_BOT_TOKEN=your_bot_token\n  \
    TELEGRAM_CHAT_ID=your_chat_id";

pub fn default_feeds() -> Vec<FeedConfig> {
    vec![
        FeedConfig::new(
            "The Verge - AI",
            "https://www.theverge.com/ai-artificial-intelligence/rss/index.xml",
        ),
        FeedConfig::new(
            "TechCrunch - AI",
            "https://techcrunch.com/tag/artificial-intelligence/feed/",
        ),
        FeedConfig::new(
            "Ars Technica - AI",
            "https://feeds.arstechnica.com/arstechnica/index",
        ),
        FeedConfig::new(
            "MIT Technology Review - AI",
            "https://www.technologyreview.com/topic/artificial-intelligence/feed/",
        ),
        FeedConfig::new(
            "Wired - AI",
            "https://www.wired.com/feed/tag/artificial-intelligence/latest/rss",
        ),
    ]
}

#[derive(Debug, Clone)]
pub struct TelegramCredentials {
    pub bot_token: String,
    pub chat_id: String,
}

/// Everything the pipeline needs to know about a run. Fixed once loaded.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub feeds: Vec<FeedConfig>,
    pub selection: SelectionPolicy,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub perplexity_api_key: String,
    /// `None` only for dry runs
    pub telegram: Option<TelegramCredentials>,
    pub storage_dir: PathBuf,
    pub run: RunConfig,
}

/// Command-line values that take precedence over the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub max_articles: Option<usize>,
    pub hours_lookback: Option<u32>,
    pub undated: Option<UndatedPolicy>,
    pub feeds_file: Option<PathBuf>,
    pub storage_dir: Option<PathBuf>,
    pub dry_run: bool,
}

impl Config {
    pub fn from_env(overrides: Overrides) -> Result<Self> {
        if let Some(path) = Self::try_load_dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }

        Self::from_lookup(|key| env::var(key).ok(), overrides)
    }

    /// Build the config from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F, overrides: Overrides) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            var(key).with_context(|| format!("{} not found.\n\n{}", key, ENV_HELP))
        };

        let perplexity_api_key = required("PERPLEXITY_API_KEY")?;

        let telegram = if overrides.dry_run {
            None
        } else {
            Some(TelegramCredentials {
                bot_token: required("TELEGRAM_BOT_TOKEN")?,
                chat_id: required("TELEGRAM_CHAT_ID")?,
            })
        };

        let max_articles = match overrides.max_articles {
            Some(n) => n,
            None => parse_var(var("NEWS_DIGEST_MAX_ARTICLES"), "NEWS_DIGEST_MAX_ARTICLES")?
                .unwrap_or(DEFAULT_MAX_ARTICLES),
        };

        let lookback_hours = match overrides.hours_lookback {
            Some(h) => h,
            None => parse_var(var("NEWS_DIGEST_HOURS_LOOKBACK"), "NEWS_DIGEST_HOURS_LOOKBACK")?
                .unwrap_or(DEFAULT_HOURS_LOOKBACK),
        };
        if lookback_hours == 0 {
            anyhow::bail!("Lookback window must be at least 1 hour");
        }

        let undated = match overrides.undated {
            Some(policy) => policy,
            None => parse_var(var("NEWS_DIGEST_UNDATED"), "NEWS_DIGEST_UNDATED")?
                .unwrap_or_default(),
        };

        let feeds = match overrides
            .feeds_file
            .or_else(|| var("NEWS_DIGEST_FEEDS").map(PathBuf::from))
        {
            Some(path) => load_feeds(&path)?,
            None => default_feeds(),
        };
        validate_feeds(&feeds)?;

        let storage_dir = overrides
            .storage_dir
            .or_else(|| var("NEWS_DIGEST_STORAGE_DIR").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR));

        Ok(Self {
            perplexity_api_key,
            telegram,
            storage_dir,
            run: RunConfig {
                feeds,
                selection: SelectionPolicy {
                    lookback_hours,
                    max_articles,
                    undated,
                },
            },
        })
    }

    /// Load the first `.env` that exists and parses; variables already in the
    /// environment win over file values
    fn try_load_dotenv() -> Option<PathBuf> {
        let candidates = dotenv_candidates(
            env::current_dir().ok(),
            dirs::config_dir(),
            dirs::home_dir(),
        );

        candidates
            .into_iter()
            .find(|path| path.is_file() && dotenvy::from_path(path).is_ok())
    }
}

/// `.env` locations in order of preference: working directory, the
/// per-user config directory, then the home directory
fn dotenv_candidates(
    current_dir: Option<PathBuf>,
    config_dir: Option<PathBuf>,
    home_dir: Option<PathBuf>,
) -> Vec<PathBuf> {
    [
        current_dir.map(|d| d.join(".env")),
        config_dir.map(|d| d.join("ai-news-digest").join(".env")),
        home_dir.map(|d| d.join(".env")),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn parse_var<T>(value: Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|e| anyhow::anyhow!("Invalid value '{}' for {}: {}", v, key, e))
        })
        .transpose()
}

/// Load a JSON array of `{"name": ..., "url": ...}` objects
pub fn load_feeds(path: &Path) -> Result<Vec<FeedConfig>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read feeds file: {}", path.display()))?;

    serde_json::from_str(&content).with_context(|| {
        format!(
            "Failed to parse feeds file {}. Expected a JSON array of {{\"name\", \"url\"}} objects.",
            path.display()
        )
    })
}

fn validate_feeds(feeds: &[FeedConfig]) -> Result<()> {
    if feeds.is_empty() {
        anyhow::bail!("No feeds configured");
    }

    for feed in feeds {
        if feed.name.trim().is_empty() {
            anyhow::bail!("Feed with URL {} has no name", feed.url);
        }
        let url = Url::parse(&feed.url)
            .with_context(|| format!("Invalid URL for feed '{}': {}", feed.name, feed.url))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            anyhow::bail!(
                "Feed '{}' must use http or https, got {}",
                feed.name,
                url.scheme()
            );
        }
    }

    Ok(())
}
