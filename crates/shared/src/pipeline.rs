use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::archive::ArchiveWriter;
use crate::config::RunConfig;
use crate::feeds::FeedFetcher;
use crate::messages;
use crate::models::{Article, OverviewDigest, SummarizedArticle};
use crate::selector::ArticleSelector;
use crate::summarizer::Summarizer;
use crate::telegram::DeliverySink;

/// Outcome of one run. A run always completes; failures only show up here.
#[derive(Debug, Default)]
pub struct RunReport {
    pub fetched: usize,
    pub failed_feeds: usize,
    pub selected: usize,
    pub summarized: Vec<SummarizedArticle>,
    pub skipped: usize,
    pub delivered: usize,
    pub delivery_failures: usize,
    pub overview: Option<OverviewDigest>,
    pub overview_delivered: bool,
    pub archived: Vec<PathBuf>,
    pub archive_failures: usize,
}

/// Sequences fetch, selection, summarization, delivery and archival for a run
pub struct DigestPipeline<'a> {
    config: &'a RunConfig,
    fetcher: &'a dyn FeedFetcher,
    summarizer: &'a dyn Summarizer,
    sink: &'a dyn DeliverySink,
    archive: &'a dyn ArchiveWriter,
}

impl<'a> DigestPipeline<'a> {
    pub fn new(
        config: &'a RunConfig,
        fetcher: &'a dyn FeedFetcher,
        summarizer: &'a dyn Summarizer,
        sink: &'a dyn DeliverySink,
        archive: &'a dyn ArchiveWriter,
    ) -> Self {
        Self {
            config,
            fetcher,
            summarizer,
            sink,
            archive,
        }
    }

    pub async fn run(&self) -> RunReport {
        self.run_at(Utc::now()).await
    }

    /// Execute one run as if the clock read `now`
    pub async fn run_at(&self, now: DateTime<Utc>) -> RunReport {
        let mut report = RunReport::default();

        let fetched = self.fetch_all(&mut report).await;
        report.fetched = fetched.len();

        let selected = ArticleSelector::select(&fetched, now, self.config.selection);
        report.selected = selected.len();

        // Raw articles are kept whether or not anything was selected
        match self.archive.save_fetched(&fetched, now) {
            Ok(path) => {
                info!("Saved {} fetched articles to {}", fetched.len(), path.display());
                report.archived.push(path);
            }
            Err(e) => {
                warn!("Failed to archive fetched articles: {}", e);
                report.archive_failures += 1;
            }
        }

        if selected.is_empty() {
            info!(
                "No articles found in the last {} hours",
                self.config.selection.lookback_hours
            );
        }

        let total = selected.len();
        for (i, article) in selected.into_iter().enumerate() {
            info!("[{}/{}] Processing article: {}", i + 1, total, article.title);
            self.summarize_and_deliver(article, &mut report).await;
        }

        if !report.summarized.is_empty() {
            report.overview = self.build_overview(&report.summarized, now).await;
        }

        // Written every run, even when nothing was summarized
        match self.archive.save_summaries(&report.summarized, now) {
            Ok(path) => {
                info!(
                    "Saved {} summaries to {}",
                    report.summarized.len(),
                    path.display()
                );
                report.archived.push(path);
            }
            Err(e) => {
                warn!("Failed to archive summaries: {}", e);
                report.archive_failures += 1;
            }
        }

        if let Some(overview) = &report.overview {
            match self.sink.send(&messages::overview_message(overview)).await {
                Ok(()) => {
                    info!("Sent final overview summary");
                    report.overview_delivered = true;
                }
                Err(e) => warn!("Failed to send overview: {}", e),
            }
        }

        info!(
            summarized = report.summarized.len(),
            skipped = report.skipped,
            delivered = report.delivered,
            "Run complete"
        );

        report
    }

    async fn fetch_all(&self, report: &mut RunReport) -> Vec<Article> {
        info!("Checking {} feeds", self.config.feeds.len());

        let mut all_articles = Vec::new();
        for feed in &self.config.feeds {
            match self.fetcher.fetch(feed).await {
                Ok(articles) => {
                    info!("{}: found {} articles", feed.name, articles.len());
                    all_articles.extend(articles);
                }
                Err(e) => {
                    warn!("{}: skipping feed: {}", feed.name, e);
                    report.failed_feeds += 1;
                }
            }
        }

        all_articles
    }

    async fn summarize_and_deliver(&self, article: Article, report: &mut RunReport) {
        let summary = match self.summarizer.summarize_article(&article).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!("Skipping '{}': {}", article.title, e);
                report.skipped += 1;
                return;
            }
        };

        let item = SummarizedArticle::new(article, summary, Utc::now());

        match self.sink.send(&messages::article_message(&item)).await {
            Ok(()) => {
                info!("Sent: {}", item.article.title);
                report.delivered += 1;
            }
            Err(e) => {
                warn!("Failed to send '{}': {}", item.article.title, e);
                report.delivery_failures += 1;
            }
        }

        report.summarized.push(item);
    }

    async fn build_overview(
        &self,
        summarized: &[SummarizedArticle],
        now: DateTime<Utc>,
    ) -> Option<OverviewDigest> {
        info!("Generating final overview summary");

        let summaries: Vec<String> = summarized.iter().map(|s| s.summary.clone()).collect();

        match self.summarizer.summarize_overview(&summaries).await {
            Ok(text) => Some(OverviewDigest {
                text,
                date: now.date_naive(),
            }),
            Err(e) => {
                warn!("Skipping overview: {}", e);
                None
            }
        }
    }
}
