use anyhow::{Context, Result};
use async_trait::async_trait;
use feed_rs::model::Entry;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use crate::models::{Article, FeedConfig};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed server returned {0}")]
    Status(reqwest::StatusCode),

    #[error("feed parsing issue: {0}")]
    Parse(#[from] feed_rs::parser::ParseFeedError),
}

/// Source of raw articles for one configured feed
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, feed: &FeedConfig) -> Result<Vec<Article>, FetchError>;
}

pub struct RssFetcher {
    client: Client,
}

impl RssFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (compatible; AINewsDigest/1.0)")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FeedFetcher for RssFetcher {
    async fn fetch(&self, feed: &FeedConfig) -> Result<Vec<Article>, FetchError> {
        let response = self.client.get(&feed.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.bytes().await?;
        debug!("Downloaded {} bytes from {}", body.len(), feed.url);

        parse_feed(&feed.name, &body)
    }
}

/// Parse an RSS, Atom or JSON feed document into articles tagged with `feed_name`
pub fn parse_feed(feed_name: &str, body: &[u8]) -> Result<Vec<Article>, FetchError> {
    let parsed = feed_rs::parser::parse(body)?;

    Ok(parsed
        .entries
        .into_iter()
        .map(|entry| to_article(feed_name, entry))
        .collect())
}

fn to_article(feed_name: &str, entry: Entry) -> Article {
    let title = entry
        .title
        .map(|t| t.content.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "No title".to_string());

    // Atom entries may list self/replies links before the article itself
    let link = entry
        .links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| entry.links.first())
        .map(|l| l.href.clone())
        .unwrap_or_default();

    let description = entry
        .summary
        .map(|s| s.content)
        .or_else(|| entry.content.and_then(|c| c.body))
        .map(|html| plain_text(&html))
        .unwrap_or_default();

    // Atom entries often only carry <updated>
    let published_at = entry.published.or(entry.updated);

    Article {
        feed_name: feed_name.to_string(),
        title,
        link,
        description,
        published_at,
    }
}

fn plain_text(html: &str) -> String {
    let text = if html.contains('<') {
        html2text::from_read(html.as_bytes(), 10_000)
    } else {
        html.to_string()
    };

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example AI</title>
    <link>https://example.com</link>
    <description>AI news</description>
    <item>
      <title>Model release</title>
      <link>https://example.com/model-release</link>
      <description>&lt;p&gt;A &lt;b&gt;new&lt;/b&gt; model   shipped.&lt;/p&gt;</description>
      <pubDate>Tue, 10 Mar 2026 09:30:00 GMT</pubDate>
    </item>
    <item>
      <link>https://example.com/untitled</link>
      <description>No date on this one</description>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom AI</title>
  <id>urn:example:feed</id>
  <updated>2026-03-10T08:00:00Z</updated>
  <entry>
    <title>Chip news</title>
    <id>urn:example:chip</id>
    <link href="https://example.com/chip"/>
    <updated>2026-03-10T08:00:00Z</updated>
    <summary>Faster chips.</summary>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss_items() {
        let articles = parse_feed("Example AI", RSS.as_bytes()).unwrap();

        assert_eq!(articles.len(), 2);

        let first = &articles[0];
        assert_eq!(first.feed_name, "Example AI");
        assert_eq!(first.title, "Model release");
        assert_eq!(first.link, "https://example.com/model-release");
        assert!(first.description.contains("new"));
        assert!(first.description.contains("model shipped."));
        assert!(!first.description.contains('<'));
        assert_eq!(
            first.published_at,
            Some(Utc.with_ymd_and_hms(2026, 3, 10, 9, 30, 0).unwrap())
        );

        let second = &articles[1];
        assert_eq!(second.title, "No title");
        assert_eq!(second.description, "No date on this one");
        assert_eq!(second.published_at, None);
    }

    #[test]
    fn test_atom_falls_back_to_updated() {
        let articles = parse_feed("Atom AI", ATOM.as_bytes()).unwrap();

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].link, "https://example.com/chip");
        assert_eq!(
            articles[0].published_at,
            Some(Utc.with_ymd_and_hms(2026, 3, 10, 8, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_atom_prefers_alternate_link() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom AI</title>
  <id>urn:example:feed</id>
  <updated>2026-03-10T08:00:00Z</updated>
  <entry>
    <title>Robots</title>
    <id>urn:example:robots</id>
    <link rel="self" href="https://example.com/api/robots.atom"/>
    <link rel="replies" href="https://example.com/robots#comments"/>
    <link rel="alternate" href="https://example.com/robots"/>
    <updated>2026-03-10T08:00:00Z</updated>
  </entry>
  <entry>
    <title>Only self</title>
    <id>urn:example:self</id>
    <link rel="self" href="https://example.com/api/self.atom"/>
    <updated>2026-03-10T08:00:00Z</updated>
  </entry>
</feed>"#;

        let articles = parse_feed("Atom AI", atom.as_bytes()).unwrap();

        assert_eq!(articles[0].link, "https://example.com/robots");
        assert_eq!(articles[1].link, "https://example.com/api/self.atom");
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let result = parse_feed("Broken", b"this is not a feed");

        assert!(matches!(result, Err(FetchError::Parse(_))));
    }

    /// Serve a single canned HTTP response on a random local port
    async fn serve_once(response: String) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{}/feed.xml", addr)
    }

    fn local_fetcher() -> RssFetcher {
        RssFetcher::with_client(Client::builder().no_proxy().build().unwrap())
    }

    #[tokio::test]
    async fn test_fetch_parses_successful_response() {
        let url = serve_once(format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/rss+xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            RSS.len(),
            RSS
        ))
        .await;
        let fetcher = local_fetcher();

        let articles = fetcher.fetch(&FeedConfig::new("Local", url)).await.unwrap();

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].feed_name, "Local");
    }

    #[tokio::test]
    async fn test_fetch_non_success_is_status_error() {
        let url = serve_once(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string(),
        )
        .await;
        let fetcher = local_fetcher();

        let result = fetcher.fetch(&FeedConfig::new("Gone", url)).await;

        assert!(matches!(
            result,
            Err(FetchError::Status(status)) if status == reqwest::StatusCode::NOT_FOUND
        ));
    }

    #[tokio::test]
    async fn test_fetch_unreachable_is_http_error() {
        // Bind then drop to get a port nothing listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let fetcher = local_fetcher();

        let result = fetcher
            .fetch(&FeedConfig::new("Down", format!("http://{}/feed.xml", addr)))
            .await;

        assert!(matches!(result, Err(FetchError::Http(_))));
    }
}
