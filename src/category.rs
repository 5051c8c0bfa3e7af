use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;

use crate::constants::constants;
use crate::error::SearchError;
use crate::youtube::{VideoRecord, VideoSearch};

/// Id of the synthetic category that stands for "no filter".
pub const ALL_CATEGORY_ID: &str = "all";

/// A named keyword grouping used to bias searches. Static for the life of the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDefinition {
  pub id: String,
  pub name: String,
  pub icon: String,
  pub color: String,
  pub keywords: Vec<String>,
  pub trending: bool,
}

impl CategoryDefinition {
  pub fn all() -> Self {
    Self {
      id: ALL_CATEGORY_ID.to_string(),
      name: "All".to_string(),
      icon: "✨".to_string(),
      color: "bg-gradient-to-r from-purple-500 to-pink-500".to_string(),
      keywords: Vec::new(),
      trending: false,
    }
  }

  pub fn is_all(&self) -> bool {
    self.id == ALL_CATEGORY_ID
  }
}

/// The fixed health categories, in display order.
pub fn health_categories() -> &'static [CategoryDefinition] {
  &constants().categories
}

/// Look up a category by id. `"all"` resolves to the synthetic catch-all.
pub fn find_category(id: &str) -> Option<CategoryDefinition> {
  let id = id.trim().to_lowercase();
  if id == ALL_CATEGORY_ID {
    return Some(CategoryDefinition::all());
  }
  health_categories().iter().find(|c| c.id == id).cloned()
}

/// Queries derived from the leading keywords of a category.
fn category_queries(category: &CategoryDefinition) -> Vec<String> {
  let c = constants();
  category
    .keywords
    .iter()
    .take(c.category_keyword_count)
    .map(|keyword| format!("{} {}", keyword, c.category_query_suffix))
    .collect()
}

/// Keep the first occurrence of each id, preserving order.
pub fn dedupe_by_id(videos: Vec<VideoRecord>) -> Vec<VideoRecord> {
  let mut seen = HashSet::new();
  videos.into_iter().filter(|v| seen.insert(v.id.clone())).collect()
}

/// Search each derived category query in turn, merge, dedupe and cap at `max_results`.
pub async fn search_by_category<S: VideoSearch + ?Sized>(
  search: &S,
  category: &CategoryDefinition,
  max_results: usize,
) -> Result<Vec<VideoRecord>, SearchError> {
  let queries = category_queries(category);
  if queries.is_empty() {
    return Ok(Vec::new());
  }
  info!(category = %category.name, queries = queries.len(), "category: searching");

  let per_query = max_results.div_ceil(queries.len()) as u32;
  let mut all_videos = Vec::new();
  for query in &queries {
    info!(query = %query, "category: search");
    all_videos.extend(search.search(query, per_query).await?);
  }

  let mut unique = dedupe_by_id(all_videos);
  info!(category = %category.name, unique = unique.len(), "category: found unique videos");
  unique.truncate(max_results);
  Ok(unique)
}

/// Case-insensitive substring match of any category keyword against title,
/// description and tags. The catch-all category matches everything.
pub fn matches_category(video: &VideoRecord, category: &CategoryDefinition) -> bool {
  if category.is_all() {
    return true;
  }
  let title = video.title.to_lowercase();
  let description = video.description.to_lowercase();
  let tags: Vec<String> = video.tags.iter().map(|t| t.to_lowercase()).collect();
  category.keywords.iter().map(|k| k.to_lowercase()).any(|needle| {
    title.contains(&needle) || description.contains(&needle) || tags.iter().any(|t| t.contains(&needle))
  })
}

pub fn filter_by_category<'a>(videos: &'a [VideoRecord], category: &CategoryDefinition) -> Vec<&'a VideoRecord> {
  videos.iter().filter(|v| matches_category(v, category)).collect()
}
