use rand::Rng;
use rand::seq::SliceRandom;
use std::sync::Arc;
use tracing::{info, warn};

use crate::constants::constants;
use crate::error::SearchError;
use crate::youtube::{VideoRecord, VideoSearch};

/// Uniform in-place shuffle (Fisher–Yates).
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
  items.shuffle(rng);
}

/// Rotate `pool` left by `offset` (taken modulo its length).
fn rotated(pool: &[String], offset: usize) -> Vec<String> {
  if pool.is_empty() {
    return Vec::new();
  }
  let offset = offset % pool.len();
  pool[offset..].iter().chain(&pool[..offset]).cloned().collect()
}

fn epoch_millis() -> i64 {
  chrono::Utc::now().timestamp_millis()
}

/// Chooses which health keywords to query and shapes the combined result set.
///
/// Randomness and the clock are injected so selection is reproducible in tests.
pub struct ContentSelector<R: Rng> {
  search: Arc<dyn VideoSearch>,
  rng: R,
  clock: fn() -> i64,
}

impl<R: Rng + Send> ContentSelector<R> {
  pub fn new(search: Arc<dyn VideoSearch>, rng: R) -> Self {
    Self { search, rng, clock: epoch_millis }
  }

  #[cfg(test)]
  pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
    self.clock = clock;
    self
  }

  /// Rotate the keyword pool by a time-derived offset, shuffle, take the feed's keyword count.
  pub fn select_keywords(&mut self) -> Vec<String> {
    let pool = &constants().health_keywords;
    if pool.is_empty() {
      return Vec::new();
    }
    let offset = (self.clock)().rem_euclid(pool.len() as i64) as usize;
    let mut keywords = rotated(pool, offset);
    shuffle(&mut keywords, &mut self.rng);
    keywords.truncate(constants().feed_keyword_count);
    keywords
  }

  /// Random health feed: a few keyword searches run one after another, merged and cut down.
  ///
  /// The first failing search aborts the whole feed.
  pub async fn pick_random_health_content(&mut self) -> Result<Vec<VideoRecord>, SearchError> {
    let c = constants();
    let keywords = self.select_keywords();
    info!(keywords = ?keywords, "selector: fetching random health content");

    let mut videos = Vec::new();
    for keyword in &keywords {
      videos.extend(self.search.search(keyword, c.feed_per_query_limit).await?);
    }

    shuffle(&mut videos, &mut self.rng);
    videos.truncate(c.feed_final_count);
    info!(videos = videos.len(), "selector: random feed ready");
    Ok(videos)
  }

  /// Search `query`, falling back once to a random pool keyword when nothing comes back,
  /// then shuffle and cut to `target_count`.
  pub async fn pick_for_query(&mut self, query: &str, target_count: usize) -> Result<Vec<VideoRecord>, SearchError> {
    let fetch = (target_count as u32).saturating_mul(constants().query_fetch_multiplier);
    let mut videos = self.search.search(query, fetch).await?;

    if videos.is_empty() {
      let alternatives: Vec<&String> = constants().health_keywords.iter().filter(|k| k.as_str() != query).collect();
      if let Some(retry) = alternatives.choose(&mut self.rng).map(|k| k.to_string()) {
        warn!(query = %query, retry = %retry, "selector: no results, retrying with another keyword");
        videos = self.search.search(&retry, fetch).await?;
      }
    }

    shuffle(&mut videos, &mut self.rng);
    videos.truncate(target_count);
    Ok(videos)
  }
}
