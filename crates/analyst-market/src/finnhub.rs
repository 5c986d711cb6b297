//! Finnhub company-news client

use crate::error::{MarketError, Result};
use analyst_core::{NewsItem, Symbol};
use chrono::{DateTime, NaiveDate, Utc};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

const BASE_URL: &str = "https://finnhub.io/api/v1";

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Finnhub API client
#[derive(Debug, Clone)]
pub struct FinnhubClient {
    client: Client,
    api_key: String,
    rate_limiter: SharedRateLimiter,
}

/// One article from `company-news`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FinnhubNewsArticle {
    pub headline: String,
    pub source: String,
    pub url: String,
    pub summary: String,
    /// Unix seconds
    pub datetime: i64,
}

impl FinnhubNewsArticle {
    pub fn to_news_item(&self) -> NewsItem {
        NewsItem {
            title: self.headline.trim().to_string(),
            publisher: Some(self.source.clone()).filter(|s| !s.is_empty()),
            url: Some(self.url.clone()).filter(|u| !u.is_empty()),
            published_at: DateTime::<Utc>::from_timestamp(self.datetime, 0)
                .filter(|_| self.datetime > 0),
        }
    }
}

impl FinnhubClient {
    /// Create a new Finnhub client
    ///
    /// # Arguments
    /// * `api_key` - Finnhub API key
    /// * `rate_limit` - Maximum requests per minute (free tier: 60)
    /// * `timeout` - HTTP timeout per request
    pub fn new(api_key: impl Into<String>, rate_limit: u32, timeout: Duration) -> Result<Self> {
        let quota = Quota::per_minute(NonZeroU32::new(rate_limit).unwrap_or(NonZeroU32::MIN));
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    /// Raw `company-news` articles between two dates (inclusive)
    #[instrument(skip(self), fields(symbol = %symbol))]
    pub async fn company_news(
        &self,
        symbol: &Symbol,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<FinnhubNewsArticle>> {
        self.rate_limiter.until_ready().await;

        let from = from.format("%Y-%m-%d").to_string();
        let to = to.format("%Y-%m-%d").to_string();
        let response = self
            .client
            .get(format!("{BASE_URL}/company-news"))
            .query(&[
                ("symbol", symbol.as_str()),
                ("from", from.as_str()),
                ("to", to.as_str()),
                ("token", self.api_key.as_str()),
            ])
            .send()
            .await?;

        match response.status().as_u16() {
            429 => {
                return Err(MarketError::RateLimitExceeded {
                    provider: "Finnhub".to_string(),
                });
            }
            status if !(200..300).contains(&status) => {
                return Err(MarketError::Finnhub(format!("HTTP error: {status}")));
            }
            _ => {}
        }

        let articles: Vec<FinnhubNewsArticle> = response.json().await?;
        debug!("received {} articles", articles.len());
        Ok(articles)
    }

    /// Most recent headlines, newest first, capped at `limit`
    pub async fn recent_headlines(
        &self,
        symbol: &Symbol,
        lookback_days: i64,
        limit: usize,
    ) -> Result<Vec<NewsItem>> {
        let to = Utc::now().date_naive();
        let from = to - chrono::Duration::days(lookback_days);
        let articles = self.company_news(symbol, from, to).await?;
        Ok(select_headlines(articles, limit))
    }
}

fn select_headlines(mut articles: Vec<FinnhubNewsArticle>, limit: usize) -> Vec<NewsItem> {
    articles.retain(|a| !a.headline.trim().is_empty());
    articles.sort_by(|a, b| b.datetime.cmp(&a.datetime));
    articles
        .iter()
        .take(limit)
        .map(FinnhubNewsArticle::to_news_item)
        .collect()
}
