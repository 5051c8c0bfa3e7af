use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::category::{self, CategoryDefinition};
use crate::error::SearchError;
use crate::selector::ContentSelector;
use crate::youtube::{VideoRecord, VideoSearch};

// --- Types ---

pub type FetchResult = Result<Vec<VideoRecord>, SearchError>;

/// A user intent that replaces the display list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
  /// Initial load and refresh.
  Random,
  /// Search box; an empty outcome is terminal.
  Query { query: String, count: usize },
  /// Category chip; the "all" chip falls back to the random feed.
  Category { category: CategoryDefinition, count: usize },
}

impl FetchRequest {
  pub fn label(&self) -> String {
    match self {
      FetchRequest::Random => "random health feed".to_string(),
      FetchRequest::Query { query, .. } => format!("\"{}\"", query),
      FetchRequest::Category { category, .. } => category.name.clone(),
    }
  }
}

/// What the display shows. Loading always resolves to one of the other three.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
  Idle,
  Loading,
  Content,
  Empty,
  Error(String),
}

async fn run_request(search: Arc<dyn VideoSearch>, request: FetchRequest) -> FetchResult {
  match request {
    FetchRequest::Random => ContentSelector::new(search, StdRng::from_entropy()).pick_random_health_content().await,
    FetchRequest::Query { query, count } => {
      let videos = ContentSelector::new(search, StdRng::from_entropy()).pick_for_query(&query, count).await?;
      if videos.is_empty() {
        return Err(SearchError::NoResults(format!("\"{}\"", query)));
      }
      Ok(videos)
    }
    FetchRequest::Category { category, count } if category.is_all() => {
      info!(count, "app: all category selected, loading random feed");
      ContentSelector::new(search, StdRng::from_entropy()).pick_random_health_content().await
    }
    FetchRequest::Category { category, count } => category::search_by_category(&*search, &category, count).await,
  }
}

// --- App State ---

/// Owns the display list and guards it against overlapping fetches.
///
/// At most one fetch is in flight; a trigger while busy is ignored. The list
/// is replaced wholesale when a fetch completes.
pub struct App {
  pub videos: Vec<VideoRecord>,
  pub view: ViewState,
  pub status_message: Option<String>,
  /// Local keyword filter applied on top of the fetched list.
  pub category_filter: Option<CategoryDefinition>,
  search: Arc<dyn VideoSearch>,
  fetch_rx: Option<oneshot::Receiver<FetchResult>>,
  last_request: Option<FetchRequest>,
}

impl App {
  pub fn new(search: Arc<dyn VideoSearch>) -> Self {
    Self {
      videos: Vec::new(),
      view: ViewState::Idle,
      status_message: None,
      category_filter: None,
      search,
      fetch_rx: None,
      last_request: None,
    }
  }

  pub fn is_busy(&self) -> bool {
    self.fetch_rx.is_some()
  }

  /// Start a fetch unless one is already running. Returns whether it started.
  pub fn trigger(&mut self, request: FetchRequest) -> bool {
    if self.is_busy() {
      warn!(request = %request.label(), "app: fetch already in flight, ignoring");
      return false;
    }
    info!(request = %request.label(), "app: fetching");
    self.view = ViewState::Loading;
    self.status_message = Some(format!("Loading {}…", request.label()));
    self.last_request = Some(request.clone());

    let search = Arc::clone(&self.search);
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(run_request(search, request).await);
    });
    self.fetch_rx = Some(rx);
    true
  }

  /// Re-run the last request (the error state's retry action).
  pub fn retry(&mut self) -> bool {
    match self.last_request.clone() {
      Some(request) => self.trigger(request),
      None => false,
    }
  }

  /// Wait for the in-flight fetch (if any) and apply its outcome.
  pub async fn settle(&mut self) {
    let Some(rx) = self.fetch_rx.take() else {
      return;
    };
    match rx.await {
      Ok(result) => self.apply(result),
      Err(_) => {
        warn!("app: fetch task ended without a result");
        self.status_message = None;
        self.videos.clear();
        self.view = ViewState::Error("Fetch task failed.".to_string());
      }
    }
  }

  fn apply(&mut self, result: FetchResult) {
    self.status_message = None;
    match result {
      Ok(videos) if videos.is_empty() => {
        self.videos.clear();
        self.view = ViewState::Empty;
      }
      Ok(videos) => {
        info!(videos = videos.len(), "app: fetch complete");
        self.videos = videos;
        self.view = ViewState::Content;
      }
      Err(e) => {
        warn!(err = %e, "app: fetch failed");
        self.videos.clear();
        self.view = ViewState::Error(e.to_string());
      }
    }
  }

  /// Records passing the local category filter, in list order.
  pub fn visible(&self) -> Vec<&VideoRecord> {
    match &self.category_filter {
      Some(cat) => category::filter_by_category(&self.videos, cat),
      None => self.videos.iter().collect(),
    }
  }
}
