use anyhow::Result;
use clap::Parser;
use shared::{
    Config, DeliverySink, DigestPipeline, JsonArchive, Overrides, PerplexitySummarizer, RssFetcher,
    StdoutSink, TelegramClient, UndatedPolicy,
};
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser)]
#[command(name = "news-digest")]
#[command(about = "Summarize recent AI news from RSS feeds and post it to Telegram")]
struct Args {
    /// Maximum number of articles to summarize (budget cap)
    #[arg(short, long)]
    max_articles: Option<usize>,

    /// Number of hours to look back for articles
    #[arg(long)]
    hours: Option<u32>,

    /// What to do with undated articles (exclude, assume-now)
    #[arg(long)]
    undated: Option<UndatedPolicy>,

    /// JSON file listing feeds as [{"name": ..., "url": ...}]
    #[arg(short, long)]
    feeds: Option<PathBuf>,

    /// Directory for the JSON archives
    #[arg(short, long)]
    storage_dir: Option<PathBuf>,

    /// Print messages instead of sending them to Telegram
    #[arg(long)]
    dry_run: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .init();

    let config = Config::from_env(Overrides {
        max_articles: args.max_articles,
        hours_lookback: args.hours,
        undated: args.undated,
        feeds_file: args.feeds,
        storage_dir: args.storage_dir,
        dry_run: args.dry_run,
    })?;

    println!(
        "📰 Checking {} feeds (last {} hours, budget {} articles)",
        config.run.feeds.len(),
        config.run.selection.lookback_hours,
        config.run.selection.max_articles
    );

    let fetcher = RssFetcher::new()?;
    let summarizer = PerplexitySummarizer::new(config.perplexity_api_key.clone())?;
    let sink: Box<dyn DeliverySink> = match &config.telegram {
        Some(telegram) => Box::new(TelegramClient::new(
            telegram.bot_token.clone(),
            telegram.chat_id.clone(),
        )?),
        None => Box::new(StdoutSink),
    };
    let archive = JsonArchive::new(&config.storage_dir);

    let pipeline = DigestPipeline::new(
        &config.run,
        &fetcher,
        &summarizer,
        sink.as_ref(),
        &archive,
    );
    let report = pipeline.run().await;

    println!("\n✓ Fetched {} articles", report.fetched);
    if report.failed_feeds > 0 {
        println!("⚠ {} feeds could not be read", report.failed_feeds);
    }
    println!(
        "✓ Summarized {}/{} selected articles",
        report.summarized.len(),
        report.selected
    );
    if report.delivery_failures > 0 {
        println!("⚠ {} messages could not be delivered", report.delivery_failures);
    }
    if report.overview.is_some() && !report.overview_delivered {
        println!("⚠ Overview was generated but not delivered");
    }
    for path in &report.archived {
        println!("✓ Saved {}", path.display());
    }
    if report.archive_failures > 0 {
        println!("⚠ {} archives could not be written", report.archive_failures);
    }

    println!(
        "\n✅ Done. Processed {} articles successfully.",
        report.summarized.len()
    );

    Ok(())
}
