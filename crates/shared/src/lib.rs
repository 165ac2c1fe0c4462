// Public modules
pub mod archive;
pub mod config;
pub mod feeds;
pub mod messages;
pub mod models;
pub mod pipeline;
pub mod selector;
pub mod summarizer;
pub mod telegram;

// Re-export commonly used types
pub use archive::{ArchiveError, ArchiveWriter, JsonArchive};
pub use config::{Config, Overrides, RunConfig};
pub use feeds::{FeedFetcher, FetchError, RssFetcher};
pub use models::{Article, FeedConfig, OverviewDigest, SummarizedArticle};
pub use pipeline::{DigestPipeline, RunReport};
pub use selector::{ArticleSelector, SelectionPolicy, UndatedPolicy};
pub use summarizer::{PerplexitySummarizer, SummarizationError, Summarizer};
pub use telegram::{DeliveryError, DeliverySink, StdoutSink, TelegramClient};
