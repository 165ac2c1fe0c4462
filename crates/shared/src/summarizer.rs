use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Article;

const ENDPOINT: &str = "https://api.perplexity.ai/chat/completions";
const MODEL: &str = "sonar";

#[derive(Debug, Error)]
pub enum SummarizationError {
    #[error("summarization API rejected credentials ({status}): {body}")]
    Auth { status: StatusCode, body: String },

    #[error("summarization API rate limited the request: {body}")]
    RateLimited { body: String },

    #[error("transient summarization failure: {0}")]
    Transient(String),

    #[error("summarization API error ({status}): {body}")]
    Other { status: StatusCode, body: String },

    #[error("unusable summarization response: {0}")]
    InvalidResponse(String),
}

impl SummarizationError {
    /// Classify a non-success HTTP status returned by the API
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Auth { status, body },
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited { body },
            s if s.is_server_error() => Self::Transient(format!("{}: {}", s, body)),
            _ => Self::Other { status, body },
        }
    }
}

impl From<reqwest::Error> for SummarizationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::InvalidResponse(e.to_string())
        } else {
            Self::Transient(e.to_string())
        }
    }
}

/// Language model that condenses articles. One API call per method call.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize_article(&self, article: &Article) -> Result<String, SummarizationError>;

    async fn summarize_overview(&self, summaries: &[String]) -> Result<String, SummarizationError>;
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

pub struct PerplexitySummarizer {
    client: Client,
    api_key: String,
}

impl PerplexitySummarizer {
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, api_key })
    }

    async fn complete(&self, prompt: String, max_tokens: u32) -> Result<String, SummarizationError> {
        let request = ChatRequest {
            model: MODEL.to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt,
            }],
            max_tokens,
        };

        let response = self
            .client
            .post(ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            return Err(SummarizationError::from_status(status, error_text));
        }

        let chat_response = response.json::<ChatResponse>().await?;

        extract_text(chat_response)
    }
}

#[async_trait]
impl Summarizer for PerplexitySummarizer {
    async fn summarize_article(&self, article: &Article) -> Result<String, SummarizationError> {
        self.complete(article_prompt(article), 250).await
    }

    async fn summarize_overview(&self, summaries: &[String]) -> Result<String, SummarizationError> {
        self.complete(overview_prompt(summaries), 300).await
    }
}

fn extract_text(response: ChatResponse) -> Result<String, SummarizationError> {
    let text = response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content.trim().to_string())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(SummarizationError::InvalidResponse(
            "response contained no text".to_string(),
        ));
    }

    Ok(text)
}

fn article_prompt(article: &Article) -> String {
    // Keep prompts small; descriptions can be whole articles
    let description = truncate(&article.description, 2000);

    let mut prompt = format!(
        "Summarize the key updates in this article in 2 sentences. Title: {}, URL: {}",
        article.title, article.link
    );
    if !description.is_empty() {
        prompt.push_str(&format!("\n\nDescription: {}", description));
    }
    prompt
}

fn overview_prompt(summaries: &[String]) -> String {
    let combined = summaries
        .iter()
        .map(|s| format!("• {}", s))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"Create a concise bullet-point overview summarizing the key AI and tech news from these summaries.
Format as clean bullet points without titles or links. Focus on the main developments and trends:

{}

Provide a brief, unified overview in bullet points."#,
        combined
    )
}

fn truncate(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
