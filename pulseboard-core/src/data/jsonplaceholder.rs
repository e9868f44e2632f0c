//! JSONPlaceholder adapter: engagement chart from `/posts`, channel split from
//! `/users`.
//!
//! Posts are grouped per author; each of the first ten authors becomes one of
//! the last ten days. Revenue and users carry random jitter on top of the
//! post-count baseline, so two calls return different values.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;
use tracing::debug;

use super::provider::{ChannelSource, ChartSource, FetchResult};
use super::transport::{decode, JsonTransport};
use crate::domain::{into_daily_series, ChannelSlice, ChartPoint};
use crate::rng::Jitter;

pub const JSONPLACEHOLDER_SOURCE: &str = "jsonplaceholder";
pub const JSONPLACEHOLDER_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

const CHANNEL_NAMES: [&str; 5] = ["Google Ads", "Facebook", "Instagram", "LinkedIn", "Other"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Post {
    user_id: u64,
}

#[derive(Debug, Deserialize)]
struct User {
    #[allow(dead_code)]
    id: u64,
}

pub struct JsonPlaceholderSource {
    transport: Arc<dyn JsonTransport>,
    base_url: String,
    days: usize,
    jitter: Jitter,
    today: Option<NaiveDate>,
}

impl JsonPlaceholderSource {
    pub fn new(transport: Arc<dyn JsonTransport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            days: 10,
            jitter: Jitter::default(),
            today: None,
        }
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.jitter = Jitter::new(seed);
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn posts_url(&self) -> String {
        format!("{}/posts", self.base_url)
    }

    pub fn users_url(&self) -> String {
        format!("{}/users", self.base_url)
    }

    fn build_chart(&self, posts: Vec<Post>) -> Vec<ChartPoint> {
        let mut per_author: BTreeMap<u64, usize> = BTreeMap::new();
        for post in posts {
            *per_author.entry(post.user_id).or_default() += 1;
        }

        let today = self.today.unwrap_or_else(|| Utc::now().date_naive());
        let points = per_author
            .values()
            .take(self.days)
            .enumerate()
            .map(|(i, &count)| {
                let day = today - Duration::days((self.days - 1 - i) as i64);
                let base_revenue = count as f64 * 5_000.0;
                let base_users = count as f64 * 100.0;
                ChartPoint::new(
                    day,
                    base_revenue + self.jitter.uniform(0.0, 10_000.0),
                    base_users + self.jitter.uniform(0.0, 200.0),
                    (base_users * 0.15).round(),
                    (base_users * 8.0).round(),
                    (base_users * 0.8).round(),
                )
            })
            .collect();
        into_daily_series(points)
    }

    fn build_channels(user_count: usize) -> Vec<ChannelSlice> {
        if user_count == 0 {
            return Vec::new();
        }
        CHANNEL_NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let value = ((user_count as f64 - (i * 2) as f64) * 3.5).round();
                ChannelSlice::new(*name, value, ChannelSlice::palette_color(i))
            })
            .collect()
    }
}

#[async_trait]
impl ChartSource for JsonPlaceholderSource {
    fn name(&self) -> &str {
        JSONPLACEHOLDER_SOURCE
    }

    async fn fetch_chart(&self) -> FetchResult<ChartPoint> {
        let body = self.transport.get_json(&self.posts_url()).await?;
        let posts: Vec<Post> = decode(JSONPLACEHOLDER_SOURCE, body)?;
        let points = self.build_chart(posts);
        debug!(source = JSONPLACEHOLDER_SOURCE, points = points.len(), "chart fetched");
        Ok(points)
    }
}

#[async_trait]
impl ChannelSource for JsonPlaceholderSource {
    fn name(&self) -> &str {
        JSONPLACEHOLDER_SOURCE
    }

    async fn fetch_channels(&self) -> FetchResult<ChannelSlice> {
        let body = self.transport.get_json(&self.users_url()).await?;
        let users: Vec<User> = decode(JSONPLACEHOLDER_SOURCE, body)?;
        Ok(Self::build_channels(users.len()))
    }
}
