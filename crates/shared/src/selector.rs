use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::models::Article;

/// What to do with articles whose feed entry carried no usable date
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UndatedPolicy {
    /// Drop them from the selection
    #[default]
    Exclude,
    /// Treat them as published at the moment of the run
    AssumeNow,
}

impl std::str::FromStr for UndatedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exclude" => Ok(Self::Exclude),
            "assume-now" => Ok(Self::AssumeNow),
            other => Err(format!(
                "unknown undated policy '{}', expected 'exclude' or 'assume-now'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPolicy {
    pub lookback_hours: u32,
    pub max_articles: usize,
    pub undated: UndatedPolicy,
}

pub struct ArticleSelector;

impl ArticleSelector {
    /// Pick the newest articles published within the lookback window, capped
    /// at `max_articles`. Equal timestamps keep their fetch order.
    pub fn select(articles: &[Article], now: DateTime<Utc>, policy: SelectionPolicy) -> Vec<Article> {
        if articles.is_empty() || policy.max_articles == 0 {
            return Vec::new();
        }

        // Very long windows reach past chrono's range; clamp to the earliest instant
        let cutoff = now
            .checked_sub_signed(Duration::hours(i64::from(policy.lookback_hours)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        debug!("Selection cutoff (UTC): {} (last {} hours)", cutoff, policy.lookback_hours);

        let mut recent: Vec<(DateTime<Utc>, &Article)> = Vec::new();
        let mut too_old = 0;
        let mut undated = 0;

        for article in articles {
            let published = match (article.published_at, policy.undated) {
                (Some(published), _) => published,
                (None, UndatedPolicy::AssumeNow) => now,
                (None, UndatedPolicy::Exclude) => {
                    undated += 1;
                    continue;
                }
            };

            if published >= cutoff {
                recent.push((published, article));
            } else {
                too_old += 1;
                let hours_ago = (now - published).num_minutes() as f64 / 60.0;
                debug!("Skipped (too old): '{}' - {:.1} hours ago", article.title, hours_ago);
            }
        }

        // sort_by is stable, so ties stay in fetch order
        recent.sort_by(|a, b| b.0.cmp(&a.0));

        let in_window = recent.len();
        let selected: Vec<Article> = recent
            .into_iter()
            .take(policy.max_articles)
            .map(|(_, article)| article.clone())
            .collect();

        info!(
            in_window,
            too_old,
            undated,
            selected = selected.len(),
            budget = policy.max_articles,
            "Selected articles from the last {} hours",
            policy.lookback_hours
        );

        selected
    }
}
