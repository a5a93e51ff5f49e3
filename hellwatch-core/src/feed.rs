//! Match-history feed client.
//!
//! Thin async wrapper over the public game-info API. The engine itself never
//! performs I/O; this client materializes event lists for it. There is no
//! retry or backoff: a failed request is logged and the battle (or page) is
//! skipped until the next cycle.

use crate::battle::Battle;
use crate::config::WatcherConfig;
use crate::error::Result;
use crate::item::Item;
use crate::models::{BattleSummary, KillEvent};
use chrono::Duration;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("hellwatch/", env!("CARGO_PKG_VERSION"));

pub struct FeedClient {
    http: reqwest::Client,
    render_api_url: String,
    battles_limit: usize,
    max_age: Duration,
    max_pages: usize,
    rate_limit_delay: StdDuration,
}

impl FeedClient {
    pub fn new(config: &WatcherConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(config.request_timeout_seconds))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            render_api_url: config.render_api_url.clone(),
            battles_limit: config.battles_limit,
            max_age: Duration::minutes(config.battles_max_age_minutes),
            max_pages: config.max_pages,
            rate_limit_delay: StdDuration::from_millis(config.rate_limit_delay_ms),
        })
    }

    /// The HTTP client, shared with webhook delivery.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Page the recent-battles listing until the fetched window spans more
    /// than the configured age, the feed runs dry, or the page cap is hit.
    pub async fn recent_battles(&self, base_url: &str) -> Result<Vec<BattleSummary>> {
        let mut battles: Vec<BattleSummary> = Vec::new();
        for page in 0..self.max_pages {
            let url = format!(
                "{}/battles?limit={}&sort=recent&offset={}",
                base_url,
                self.battles_limit,
                page * self.battles_limit
            );
            let page_battles: Vec<BattleSummary> = self.get_json(&url).await?;
            if page_battles.is_empty() {
                break;
            }
            battles.extend(page_battles);
            debug!("{} battles fetched after page {}", battles.len(), page);
            if spans_age_window(&battles, self.max_age) {
                break;
            }
            tokio::time::sleep(self.rate_limit_delay).await;
        }
        Ok(battles)
    }

    pub async fn battle_summary(&self, base_url: &str, battle_id: i64) -> Result<BattleSummary> {
        self.get_json(&format!("{}/battles/{}", base_url, battle_id))
            .await
    }

    pub async fn battle_events(&self, base_url: &str, battle_id: i64) -> Result<Vec<KillEvent>> {
        self.get_json(&format!("{}/events/battle/{}", base_url, battle_id))
            .await
    }

    /// Fetch one item icon into the on-disk cache and return its path. A
    /// cached icon is returned without touching the network.
    pub async fn item_icon(&self, cache_dir: &Path, item: &Item) -> Result<PathBuf> {
        let path = icon_cache_path(cache_dir, item);
        if path.exists() {
            return Ok(path);
        }

        let url = format!(
            "{}/{}.png?count=1&quality={}",
            self.render_api_url, item.type_id, item.quality
        );
        let response = self.http.get(&url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;

        std::fs::create_dir_all(cache_dir)?;
        std::fs::write(&path, &bytes)?;
        debug!("cached item icon {:?}", path);
        Ok(path)
    }

    /// Cache icons for every item a battle's roster wears. Failures are
    /// logged and leave a blank cell in the scorecard.
    pub async fn cache_battle_icons(&self, cache_dir: &Path, battle: &Battle) {
        for player in &battle.players {
            for (_, item) in player.equipment.slots() {
                if let Some(item) = item {
                    if let Err(e) = self.item_icon(cache_dir, item).await {
                        warn!("failed to fetch icon for {}: {}", item.type_id, e);
                    }
                }
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.json::<T>().await?)
    }
}

/// Where an item icon lives in the cache. Keyed by the raw compound
/// identifier plus quality, matching the renderer's lookup.
pub fn icon_cache_path(cache_dir: &Path, item: &Item) -> PathBuf {
    cache_dir.join(format!("{}&{}.png", item.type_id, item.quality))
}

/// True once the difference between the newest and oldest start time in the
/// listing exceeds `max_age`.
fn spans_age_window(battles: &[BattleSummary], max_age: Duration) -> bool {
    let times = battles.iter().map(|b| b.start_time);
    match (times.clone().min(), times.max()) {
        (Some(oldest), Some(newest)) => newest - oldest > max_age,
        _ => false,
    }
}
