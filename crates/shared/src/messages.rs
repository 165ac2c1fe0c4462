//! Text of the messages posted to the chat. Telegram parses them as HTML, so
//! every piece of feed or model text is escaped.

use crate::models::{OverviewDigest, SummarizedArticle};

pub fn article_message(item: &SummarizedArticle) -> String {
    format!(
        "Source: {}\n\nHeadline: {}\n\nSummary: {}\n\nLink: {}",
        escape_html(&item.article.feed_name),
        escape_html(&item.article.title),
        escape_html(&item.summary),
        escape_html(&item.article.link)
    )
}

pub fn overview_message(digest: &OverviewDigest) -> String {
    format!(
        "📊 <b>Daily AI News Overview</b> ({})\n\n{}",
        digest.date.format("%Y-%m-%d"),
        escape_html(&digest.text)
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Article;
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn test_article_message_layout() {
        let item = SummarizedArticle::new(
            Article {
                feed_name: "Wired - AI".to_string(),
                title: "Q&A with <researchers>".to_string(),
                link: "https://example.com/a?x=1&y=2".to_string(),
                description: String::new(),
                published_at: None,
            },
            "They talked.".to_string(),
            Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap(),
        );

        assert_eq!(
            article_message(&item),
            "Source: Wired - AI\n\n\
             Headline: Q&amp;A with &lt;researchers&gt;\n\n\
             Summary: They talked.\n\n\
             Link: https://example.com/a?x=1&amp;y=2"
        );
    }

    #[test]
    fn test_overview_message_has_date() {
        let digest = OverviewDigest {
            text: "- Models got bigger".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
        };

        assert_eq!(
            overview_message(&digest),
            "📊 <b>Daily AI News Overview</b> (2026-03-10)\n\n- Models got bigger"
        );
    }
}
