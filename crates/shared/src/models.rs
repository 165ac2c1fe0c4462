use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A feed to pull articles from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    pub name: String,
    pub url: String,
}

impl FeedConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// A single entry fetched from a feed. Never mutated after fetching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub feed_name: String,
    pub title: String,
    pub link: String,
    pub description: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// An article together with the summary the language model produced for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizedArticle {
    #[serde(flatten)]
    pub article: Article,
    pub summary: String,
    pub summarized_at: DateTime<Utc>,
}

impl SummarizedArticle {
    pub fn new(article: Article, summary: String, summarized_at: DateTime<Utc>) -> Self {
        Self {
            article,
            summary,
            summarized_at,
        }
    }
}

/// Aggregate summary of every article summarized during one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewDigest {
    pub text: String,
    pub date: NaiveDate,
}

/// On-disk layout of the fetched-articles archive
#[derive(Debug, Serialize, Deserialize)]
pub struct FetchedSnapshot {
    pub timestamp: String,
    pub total_articles: usize,
    pub articles: Vec<Article>,
}

impl FetchedSnapshot {
    pub fn new(articles: &[Article], run_at: DateTime<Utc>) -> Self {
        Self {
            timestamp: run_at.to_rfc3339(),
            total_articles: articles.len(),
            articles: articles.to_vec(),
        }
    }
}

/// On-disk layout of the summaries archive
#[derive(Debug, Serialize, Deserialize)]
pub struct SummariesSnapshot {
    pub timestamp: String,
    pub total_summaries: usize,
    pub articles: Vec<SummarizedArticle>,
}

impl SummariesSnapshot {
    pub fn new(articles: &[SummarizedArticle], run_at: DateTime<Utc>) -> Self {
        Self {
            timestamp: run_at.to_rfc3339(),
            total_summaries: articles.len(),
            articles: articles.to_vec(),
        }
    }
}
