use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::constants::constants;
use crate::error::SearchError;

// --- Records ---

/// One thumbnail tier as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail {
  #[serde(default)]
  pub url: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub width: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub height: Option<u32>,
}

/// The three fixed quality tiers; any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnails {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub default: Option<Thumbnail>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub medium: Option<Thumbnail>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub high: Option<Thumbnail>,
}

impl Thumbnails {
  /// Highest available tier that carries a URL.
  pub fn best(&self) -> Option<&Thumbnail> {
    [&self.high, &self.medium, &self.default].into_iter().flatten().find(|t| !t.url.is_empty())
  }
}

/// A normalized, playable video. Never mutated after `search` returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
  pub id: String,
  pub title: String,
  pub description: String,
  pub thumbnails: Thumbnails,
  pub channel_title: String,
  pub published_at: String,
  pub view_count: String,
  pub duration: String,
  pub tags: Vec<String>,
}

// --- Wire types ---

#[derive(Debug, Deserialize)]
struct SearchListResponse {
  items: Option<Vec<SearchItem>>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
  id: Option<SearchItemId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
  video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
  items: Option<Vec<VideoItem>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
  id: Option<String>,
  snippet: Option<VideoSnippet>,
  statistics: Option<VideoStatistics>,
  content_details: Option<ContentDetails>,
  status: Option<VideoStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
  title: Option<String>,
  description: Option<String>,
  thumbnails: Option<Thumbnails>,
  channel_title: Option<String>,
  published_at: Option<String>,
  tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
  view_count: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
  duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoStatus {
  embeddable: Option<bool>,
}

/// Drop unusable detail items and apply defaults to the rest.
fn normalize_items(items: Vec<VideoItem>) -> Vec<VideoRecord> {
  items
    .into_iter()
    .filter_map(|item| {
      let id = item.id.filter(|id| !id.is_empty());
      let Some(id) = id else {
        warn!("youtube: dropping detail item without id");
        return None;
      };
      let Some(snippet) = item.snippet else {
        warn!(id = %id, "youtube: dropping detail item without snippet");
        return None;
      };
      let Some(title) = snippet.title.filter(|t| !t.is_empty()) else {
        warn!(id = %id, "youtube: dropping detail item without title");
        return None;
      };
      if item.status.and_then(|s| s.embeddable) == Some(false) {
        warn!(id = %id, title = %title, "youtube: video not embeddable");
        return None;
      }
      debug!(id = %id, title = %title, "youtube: valid video");
      Some(VideoRecord {
        id,
        title,
        description: snippet.description.unwrap_or_default(),
        thumbnails: snippet.thumbnails.unwrap_or_default(),
        channel_title: snippet.channel_title.unwrap_or_else(|| "Unknown Channel".to_string()),
        published_at: snippet.published_at.unwrap_or_default(),
        view_count: item.statistics.and_then(|s| s.view_count).unwrap_or_else(|| "0".to_string()),
        duration: item.content_details.and_then(|c| c.duration).unwrap_or_else(|| "PT0S".to_string()),
        tags: snippet.tags.unwrap_or_default(),
      })
    })
    .collect()
}

// --- Transport ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
  Search,
  Videos,
}

impl Endpoint {
  pub fn path(self) -> &'static str {
    match self {
      Endpoint::Search => "search",
      Endpoint::Videos => "videos",
    }
  }
}

/// A single GET against the Data API.
#[derive(Debug, Clone)]
pub struct ApiRequest {
  pub endpoint: Endpoint,
  pub params: Vec<(&'static str, String)>,
  pub timeout: Duration,
}

/// Raw HTTP outcome. Non-2xx statuses are returned, not raised.
#[derive(Debug, Clone)]
pub struct ApiResponse {
  pub status: u16,
  pub body: String,
}

/// The HTTP seam of the search client.
///
/// Implementations report timeouts as `RequestTimeout` and any other
/// connection-level failure as `Upstream`.
#[async_trait]
pub trait Transport: Send + Sync {
  async fn get(&self, request: &ApiRequest) -> Result<ApiResponse, SearchError>;
}

/// `reqwest`-backed transport.
pub struct HttpTransport {
  client: Client,
  base_url: String,
}

impl HttpTransport {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self { client: Client::new(), base_url: base_url.into() }
  }
}

fn map_reqwest_error(e: reqwest::Error) -> SearchError {
  if e.is_timeout() { SearchError::RequestTimeout } else { SearchError::Upstream(e.to_string()) }
}

#[async_trait]
impl Transport for HttpTransport {
  async fn get(&self, request: &ApiRequest) -> Result<ApiResponse, SearchError> {
    let url = format!("{}/{}", self.base_url.trim_end_matches('/'), request.endpoint.path());
    let response = self
      .client
      .get(&url)
      .query(&request.params)
      .timeout(request.timeout)
      .send()
      .await
      .map_err(map_reqwest_error)?;
    let status = response.status().as_u16();
    let body = response.text().await.map_err(map_reqwest_error)?;
    Ok(ApiResponse { status, body })
  }
}

// --- Client ---

/// Everything the search client needs, passed in explicitly at construction.
#[derive(Debug, Clone)]
pub struct ClientConfig {
  pub api_key: Option<String>,
  pub base_url: String,
  pub overfetch_multiplier: u32,
  pub max_results_cap: u32,
  pub search_timeout: Duration,
  pub details_timeout: Duration,
}

impl ClientConfig {
  pub fn new(api_key: Option<String>) -> Self {
    let c = constants();
    Self {
      api_key,
      base_url: c.api_base_url.clone(),
      overfetch_multiplier: c.overfetch_multiplier,
      max_results_cap: c.max_results_cap,
      search_timeout: Duration::from_secs(c.search_timeout_secs),
      details_timeout: Duration::from_secs(c.details_timeout_secs),
    }
  }

  /// The configured key, if present and not blank.
  pub fn credential(&self) -> Option<&str> {
    self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
  }
}

/// Anything that can answer a keyword search with normalized records.
#[async_trait]
pub trait VideoSearch: Send + Sync {
  async fn search(&self, query: &str, max_results: u32) -> Result<Vec<VideoRecord>, SearchError>;
}

pub struct VideoSearchClient<T: Transport = HttpTransport> {
  config: ClientConfig,
  transport: T,
}

impl VideoSearchClient<HttpTransport> {
  pub fn new(config: ClientConfig) -> Self {
    let transport = HttpTransport::new(config.base_url.clone());
    Self { config, transport }
  }
}

impl<T: Transport> VideoSearchClient<T> {
  pub fn with_transport(config: ClientConfig, transport: T) -> Self {
    Self { config, transport }
  }

  fn search_request(&self, key: &str, query: &str, max_results: u32) -> ApiRequest {
    let c = constants();
    let fetch = max_results.saturating_mul(self.config.overfetch_multiplier).min(self.config.max_results_cap);
    ApiRequest {
      endpoint: Endpoint::Search,
      params: vec![
        ("key", key.to_string()),
        ("part", "snippet".to_string()),
        ("q", format!("{} {}", query, c.exclusion_suffix)),
        ("type", "video".to_string()),
        ("maxResults", fetch.to_string()),
        ("order", "relevance".to_string()),
        ("videoDuration", c.video_duration.clone()),
        ("videoDefinition", c.video_definition.clone()),
        ("regionCode", c.region_code.clone()),
        ("relevanceLanguage", c.relevance_language.clone()),
        ("videoEmbeddable", "true".to_string()),
        ("videoSyndicated", "true".to_string()),
        ("safeSearch", c.safe_search.clone()),
      ],
      timeout: self.config.search_timeout,
    }
  }

  fn details_request(&self, key: &str, ids: &[String]) -> ApiRequest {
    ApiRequest {
      endpoint: Endpoint::Videos,
      params: vec![
        ("key", key.to_string()),
        ("part", "statistics,contentDetails,snippet,status".to_string()),
        ("id", ids.join(",")),
      ],
      timeout: self.config.details_timeout,
    }
  }

  async fn fetch<R: for<'de> Deserialize<'de>>(&self, request: &ApiRequest) -> Result<R, SearchError> {
    let response = self.transport.get(request).await?;
    if !(200..300).contains(&response.status) {
      warn!(endpoint = request.endpoint.path(), status = response.status, "youtube: request rejected");
      return Err(SearchError::from_status(response.status, &response.body));
    }
    serde_json::from_str(&response.body)
      .map_err(|e| SearchError::Upstream(format!("malformed {} response: {}", request.endpoint.path(), e)))
  }
}

#[async_trait]
impl<T: Transport> VideoSearch for VideoSearchClient<T> {
  /// Two-stage lookup: keyword search, then one batched details call.
  ///
  /// Returns at most as many records as the search produced hits; callers truncate.
  async fn search(&self, query: &str, max_results: u32) -> Result<Vec<VideoRecord>, SearchError> {
    let Some(key) = self.config.credential() else {
      warn!("youtube: no API key configured");
      return Err(SearchError::MissingCredential);
    };

    info!(query = %query, max_results, "youtube: search");
    let hits: SearchListResponse = self.fetch(&self.search_request(key, query, max_results)).await?;
    let hits = hits.items.unwrap_or_default();
    if hits.is_empty() {
      warn!(query = %query, "youtube: no videos found");
      return Ok(Vec::new());
    }

    let ids: Vec<String> =
      hits.into_iter().filter_map(|hit| hit.id.and_then(|id| id.video_id)).filter(|id| !id.is_empty()).collect();
    if ids.is_empty() {
      warn!(query = %query, "youtube: search hits carried no video ids");
      return Ok(Vec::new());
    }
    info!(query = %query, hits = ids.len(), "youtube: found videos");

    let details: VideoListResponse = self.fetch(&self.details_request(key, &ids)).await?;
    let videos = normalize_items(details.items.unwrap_or_default());
    info!(query = %query, videos = videos.len(), "youtube: processed video details");
    Ok(videos)
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use serde_json::json;
  use std::collections::VecDeque;
  use std::sync::Mutex;

  impl ApiRequest {
    fn param(&self, name: &str) -> Option<&str> {
      self.params.iter().find(|(k, _)| *k == name).map(|(_, v)| v.as_str())
    }
  }

  /// Scripted transport: pops one response per call and records every request.
  #[derive(Default)]
  pub(crate) struct MockTransport {
    responses: Mutex<VecDeque<Result<ApiResponse, SearchError>>>,
    pub(crate) calls: Mutex<Vec<ApiRequest>>,
  }

  impl MockTransport {
    pub(crate) fn push_json(&self, status: u16, body: serde_json::Value) {
      self.responses.lock().unwrap().push_back(Ok(ApiResponse { status, body: body.to_string() }));
    }

    pub(crate) fn push_err(&self, err: SearchError) {
      self.responses.lock().unwrap().push_back(Err(err));
    }

    pub(crate) fn call_count(&self) -> usize {
      self.calls.lock().unwrap().len()
    }
  }

  #[async_trait]
  impl Transport for MockTransport {
    async fn get(&self, request: &ApiRequest) -> Result<ApiResponse, SearchError> {
      self.calls.lock().unwrap().push(request.clone());
      let next = self.responses.lock().unwrap().pop_front();
      next.unwrap_or_else(|| Err(SearchError::Upstream("no scripted response".into())))
    }
  }

  fn client(transport: MockTransport) -> VideoSearchClient<MockTransport> {
    VideoSearchClient::with_transport(ClientConfig::new(Some("test-key".to_string())), transport)
  }

  fn hits(ids: &[&str]) -> serde_json::Value {
    let items: Vec<_> = ids
      .iter()
      .map(|id| json!({ "id": { "kind": "youtube#video", "videoId": id }, "snippet": { "title": id } }))
      .collect();
    json!({ "items": items })
  }

  fn detail(id: &str, title: &str, embeddable: Option<bool>) -> serde_json::Value {
    let mut item = json!({
      "id": id,
      "snippet": { "title": title, "channelTitle": "Test" },
      "statistics": { "viewCount": "100" },
      "contentDetails": { "duration": "PT5M" },
    });
    if let Some(flag) = embeddable {
      item["status"] = json!({ "embeddable": flag });
    }
    item
  }

  #[tokio::test]
  async fn morning_yoga_example() {
    let transport = MockTransport::default();
    transport.push_json(
      200,
      json!({ "items": [{ "id": { "videoId": "abc123" }, "snippet": { "title": "Morning Yoga" } }] }),
    );
    transport.push_json(200, json!({ "items": [detail("abc123", "Morning Yoga", Some(true))] }));
    let client = client(transport);

    let videos = client.search("아침 요가 루틴", 3).await.unwrap();
    assert_eq!(videos.len(), 1);
    let v = &videos[0];
    assert_eq!(v.id, "abc123");
    assert_eq!(v.title, "Morning Yoga");
    assert_eq!(v.channel_title, "Test");
    assert_eq!(v.view_count, "100");
    assert_eq!(v.duration, "PT5M");
    assert!(v.tags.is_empty());
  }

  #[tokio::test]
  async fn not_embeddable_is_dropped() {
    let transport = MockTransport::default();
    transport.push_json(200, hits(&["abc123"]));
    transport.push_json(200, json!({ "items": [detail("abc123", "Morning Yoga", Some(false))] }));

    let videos = client(transport).search("아침 요가 루틴", 3).await.unwrap();
    assert!(videos.is_empty());
  }

  #[tokio::test]
  async fn all_embeddable_hits_survive_with_defaults() {
    let transport = MockTransport::default();
    transport.push_json(200, hits(&["a", "b", "c"]));
    transport.push_json(
      200,
      json!({ "items": [
        { "id": "a", "snippet": { "title": "A" } },
        { "id": "b", "snippet": { "title": "B" }, "status": {} },
        detail("c", "C", None),
      ]}),
    );

    let videos = client(transport).search("스트레칭", 1).await.unwrap();
    assert_eq!(videos.len(), 3);
    let a = &videos[0];
    assert_eq!(a.description, "");
    assert_eq!(a.thumbnails, Thumbnails::default());
    assert_eq!(a.channel_title, "Unknown Channel");
    assert_eq!(a.published_at, "");
    assert_eq!(a.view_count, "0");
    assert_eq!(a.duration, "PT0S");
    assert!(a.tags.is_empty());
  }

  #[tokio::test]
  async fn invalid_detail_items_are_dropped() {
    let transport = MockTransport::default();
    transport.push_json(200, hits(&["a", "b", "c", "d"]));
    transport.push_json(
      200,
      json!({ "items": [
        { "snippet": { "title": "no id" } },
        { "id": "b" },
        { "id": "c", "snippet": { "title": "" } },
        { "id": "d", "snippet": { "title": "Keep", "tags": ["yoga", "morning"] } },
      ]}),
    );

    let videos = client(transport).search("요가", 2).await.unwrap();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].id, "d");
    assert_eq!(videos[0].tags, vec!["yoga".to_string(), "morning".to_string()]);
  }

  #[tokio::test]
  async fn zero_hits_is_empty_without_details_call() {
    let transport = MockTransport::default();
    transport.push_json(200, json!({ "items": [] }));
    let client = client(transport);

    let videos = client.search("없는 검색어", 5).await.unwrap();
    assert!(videos.is_empty());
    assert_eq!(client.transport.call_count(), 1);
  }

  #[tokio::test]
  async fn missing_items_field_is_empty() {
    let transport = MockTransport::default();
    transport.push_json(200, json!({ "kind": "youtube#searchListResponse" }));
    assert!(client(transport).search("q", 5).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn missing_credential_makes_no_calls() {
    for key in [None, Some(String::new()), Some("   ".to_string())] {
      let client = VideoSearchClient::with_transport(ClientConfig::new(key), MockTransport::default());
      assert_eq!(client.search("요가", 5).await, Err(SearchError::MissingCredential));
      assert_eq!(client.transport.call_count(), 0);
    }
  }

  #[tokio::test]
  async fn search_request_shape() {
    let transport = MockTransport::default();
    transport.push_json(200, hits(&["x1", "x2"]));
    transport.push_json(200, json!({ "items": [] }));
    let client = client(transport);

    client.search("명상 기초", 4).await.unwrap();
    let calls = client.transport.calls.lock().unwrap();
    assert_eq!(calls.len(), 2);

    let search = &calls[0];
    assert_eq!(search.endpoint, Endpoint::Search);
    assert_eq!(search.param("key"), Some("test-key"));
    assert_eq!(search.param("q"), Some("명상 기초 -광고 -홍보 -쇼핑"));
    assert_eq!(search.param("maxResults"), Some("12"));
    assert_eq!(search.param("videoEmbeddable"), Some("true"));
    assert_eq!(search.param("videoSyndicated"), Some("true"));
    assert_eq!(search.param("safeSearch"), Some("strict"));
    assert_eq!(search.param("regionCode"), Some("KR"));
    assert_eq!(search.timeout, Duration::from_secs(15));

    let details = &calls[1];
    assert_eq!(details.endpoint, Endpoint::Videos);
    assert_eq!(details.param("id"), Some("x1,x2"));
    assert_eq!(details.param("part"), Some("statistics,contentDetails,snippet,status"));
    assert_eq!(details.timeout, Duration::from_secs(10));
  }

  #[tokio::test]
  async fn overfetch_is_capped_at_api_limit() {
    let transport = MockTransport::default();
    transport.push_json(200, json!({ "items": [] }));
    let client = client(transport);

    client.search("요가", 20).await.unwrap();
    let calls = client.transport.calls.lock().unwrap();
    assert_eq!(calls[0].param("maxResults"), Some("50"));
  }

  #[tokio::test]
  async fn thumbnail_tier_without_url_does_not_sink_the_batch() {
    let transport = MockTransport::default();
    transport.push_json(200, hits(&["a", "b"]));
    transport.push_json(
      200,
      json!({ "items": [
        { "id": "a", "snippet": { "title": "A", "thumbnails": {
          "default": { "url": "https://i.ytimg.com/vi/a/default.jpg", "width": 120 },
          "high": { "width": 480, "height": 360 },
        } } },
        detail("b", "B", Some(true)),
      ]}),
    );

    let videos = client(transport).search("요가", 2).await.unwrap();
    assert_eq!(videos.len(), 2);
    let best = videos[0].thumbnails.best().map(|t| t.url.as_str());
    assert_eq!(best, Some("https://i.ytimg.com/vi/a/default.jpg"));
  }

  #[tokio::test]
  async fn status_403_is_quota_or_auth() {
    let transport = MockTransport::default();
    transport.push_json(403, json!({ "error": { "code": 403, "message": "quotaExceeded" } }));
    assert_eq!(client(transport).search("요가", 5).await, Err(SearchError::QuotaOrAuth));
  }

  #[tokio::test]
  async fn status_400_on_details_is_invalid_request() {
    let transport = MockTransport::default();
    transport.push_json(200, hits(&["a"]));
    transport.push_json(400, json!({ "error": { "code": 400, "message": "bad id" } }));
    assert_eq!(client(transport).search("요가", 5).await, Err(SearchError::InvalidRequest));
  }

  #[tokio::test]
  async fn timeout_propagates() {
    let transport = MockTransport::default();
    transport.push_err(SearchError::RequestTimeout);
    assert_eq!(client(transport).search("요가", 5).await, Err(SearchError::RequestTimeout));
  }

  #[tokio::test]
  async fn server_error_is_upstream() {
    let transport = MockTransport::default();
    transport.push_json(503, json!({ "error": { "code": 503, "message": "unavailable" } }));
    assert_eq!(
      client(transport).search("요가", 5).await,
      Err(SearchError::Upstream("HTTP 503: unavailable".to_string()))
    );
  }

  #[tokio::test]
  async fn malformed_body_is_upstream() {
    let transport = MockTransport::default();
    transport.responses.lock().unwrap().push_back(Ok(ApiResponse { status: 200, body: "<html>".to_string() }));
    assert!(matches!(client(transport).search("요가", 5).await, Err(SearchError::Upstream(_))));
  }

  #[test]
  fn best_thumbnail_prefers_high() {
    let thumb = |url: &str| Some(Thumbnail { url: url.to_string(), width: None, height: None });
    let t = Thumbnails { default: thumb("d"), medium: thumb("m"), high: None };
    assert_eq!(t.best().map(|t| t.url.as_str()), Some("m"));
    assert_eq!(Thumbnails::default().best(), None);
  }

  #[test]
  fn record_serializes_camel_case() {
    let record = VideoRecord {
      id: "abc123".into(),
      title: "Morning Yoga".into(),
      description: String::new(),
      thumbnails: Thumbnails::default(),
      channel_title: "Test".into(),
      published_at: String::new(),
      view_count: "100".into(),
      duration: "PT5M".into(),
      tags: Vec::new(),
    };
    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["channelTitle"], "Test");
    assert_eq!(value["viewCount"], "100");
  }
}
