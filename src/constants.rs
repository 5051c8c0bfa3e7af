//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!` so it's always available,
//! with no runtime file I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

use crate::category::CategoryDefinition;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  pub api_base_url: String,

  // Search request shaping
  pub exclusion_suffix: String,
  pub overfetch_multiplier: u32,
  pub max_results_cap: u32,
  pub region_code: String,
  pub relevance_language: String,
  pub video_duration: String,
  pub video_definition: String,
  pub safe_search: String,
  pub search_timeout_secs: u64,
  pub details_timeout_secs: u64,

  // Random feed
  pub feed_keyword_count: usize,
  pub feed_per_query_limit: u32,
  pub feed_final_count: usize,
  pub query_fetch_multiplier: u32,

  // Category search
  pub category_keyword_count: usize,
  pub category_query_suffix: String,

  pub health_keywords: Vec<String>,
  pub categories: Vec<CategoryDefinition>,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; a malformed file fails every test run.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}
