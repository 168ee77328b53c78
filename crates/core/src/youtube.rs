use std::{
    path::{Path, PathBuf},
    sync::LazyLock,
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use tokio::fs;
use tracing::{info, warn};

use crate::{
    error::{Result, TrendscoutError},
    format::parse_iso8601_duration,
    types::{EngagementStats, VideoCandidate},
};

pub const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
pub const YOUTUBE_API_KEY_ENV: &str = "YOUTUBE_API_KEY";

const MAX_ATTEMPTS: u32 = 3;
const MAX_DESCRIPTION_CHARS: usize = 1000;
const MAX_TAGS: usize = 10;

static BARE_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{11}$").unwrap());
static URL_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:youtube\.com/watch\?(?:.*&)?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/shorts/)([a-zA-Z0-9_-]{11})",
    )
    .unwrap()
});

/// Extract an 11-character video id from a bare id or a watch, short-link,
/// embed or shorts URL.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    if BARE_ID.is_match(input) {
        return Some(input.to_string());
    }
    URL_ID.captures(input).map(|caps| caps[1].to_string())
}

/// Whether `id` is already a bare 11-character video id.
pub fn is_video_id(id: &str) -> bool {
    BARE_ID.is_match(id)
}

pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Readable label for a YouTube category id
pub fn category_name(category_id: &str) -> &'static str {
    match category_id {
        "1" => "Film & Animation",
        "2" => "Autos & Vehicles",
        "10" => "Music",
        "15" => "Pets & Animals",
        "17" => "Sports",
        "19" => "Travel & Events",
        "20" => "Gaming",
        "22" => "People & Blogs",
        "23" => "Comedy",
        "24" => "Entertainment",
        "25" => "News & Politics",
        "26" => "Howto & Style",
        "27" => "Education",
        "28" => "Science & Technology",
        _ => "Other",
    }
}

/// Where a run's candidate videos come from.
#[async_trait]
pub trait VideoSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_candidates(&self) -> Result<Vec<VideoCandidate>>;
}

/// Trending chart from the YouTube Data API v3.
pub struct YoutubeVideoSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    region_code: String,
    category_id: String,
    max_results: u32,
    retry_delay: Duration,
}

impl YoutubeVideoSource {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: YOUTUBE_API_BASE.to_string(),
            api_key: api_key.into(),
            region_code: "US".to_string(),
            category_id: "0".to_string(),
            max_results: 25,
            retry_delay: Duration::from_secs(1),
        }
    }

    /// Reads the key from `YOUTUBE_API_KEY`
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(YOUTUBE_API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| TrendscoutError::MissingApiKey {
                env_var: YOUTUBE_API_KEY_ENV.to_string(),
            })?;
        Ok(Self::new(api_key))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_region(mut self, region_code: impl Into<String>) -> Self {
        self.region_code = region_code.into();
        self
    }

    /// `0` means all categories.
    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = category_id.into();
        self
    }

    /// Clamped to the API's 1..=50 page size.
    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results.clamp(1, 50);
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    async fn request_page(&self) -> std::result::Result<VideoListResponse, RequestError> {
        let max_results = self.max_results.to_string();
        let response = self
            .client
            .get(format!("{}/videos", self.base_url))
            .query(&[
                ("part", "id,snippet,statistics,contentDetails"),
                ("chart", "mostPopular"),
                ("regionCode", self.region_code.as_str()),
                ("videoCategoryId", self.category_id.as_str()),
                ("maxResults", max_results.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| RequestError::Retryable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<VideoListResponse>()
                .await
                .map_err(|e| RequestError::Retryable(format!("malformed response: {e}")));
        }

        let body = response.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::FORBIDDEN {
            if body.contains("quotaExceeded") || body.contains("dailyLimitExceeded") {
                return Err(RequestError::Fatal(
                    "YouTube API quota exceeded, try again tomorrow".to_string(),
                ));
            }
            if body.contains("keyInvalid") {
                return Err(RequestError::Fatal("invalid YouTube API key".to_string()));
            }
        }
        Err(RequestError::Retryable(format!("HTTP {}: {}", status, error_reason(&body))))
    }
}

#[async_trait]
impl VideoSource for YoutubeVideoSource {
    fn name(&self) -> &'static str {
        "youtube-trending"
    }

    async fn fetch_candidates(&self) -> Result<Vec<VideoCandidate>> {
        info!(
            region = %self.region_code,
            category = %self.category_id,
            max_results = self.max_results,
            "Fetching trending videos"
        );

        let mut attempt: u32 = 0;
        let page = loop {
            match self.request_page().await {
                Ok(page) => break page,
                Err(RequestError::Fatal(reason)) => {
                    return Err(TrendscoutError::VideoSourceFailed { reason });
                }
                Err(RequestError::Retryable(reason)) if attempt + 1 < MAX_ATTEMPTS => {
                    let wait = self.retry_delay * 2u32.pow(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_attempts = MAX_ATTEMPTS,
                        wait_ms = wait.as_millis() as u64,
                        %reason,
                        "YouTube API request failed, retrying"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(RequestError::Retryable(reason)) => {
                    return Err(TrendscoutError::VideoSourceFailed {
                        reason: format!("failed after {} attempts: {}", MAX_ATTEMPTS, reason),
                    });
                }
            }
        };

        let videos: Vec<VideoCandidate> = page.items.into_iter().filter_map(to_candidate).collect();
        info!(videos = videos.len(), "Fetched trending videos");
        Ok(videos)
    }
}

enum RequestError {
    Retryable(String),
    Fatal(String),
}

fn error_reason(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["errors"][0]["reason"].as_str().map(str::to_string))
        .unwrap_or_else(|| "Unknown".to_string())
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    #[serde(default)]
    snippet: Snippet,
    #[serde(default)]
    statistics: Statistics,
    #[serde(default)]
    content_details: ContentDetails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    channel_title: String,
    #[serde(default)]
    published_at: String,
    #[serde(default)]
    category_id: String,
    #[serde(default)]
    tags: Vec<String>,
}

/// The API sends counts as decimal strings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    view_count: Option<String>,
    like_count: Option<String>,
    comment_count: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ContentDetails {
    #[serde(default)]
    duration: String,
}

fn to_candidate(item: VideoItem) -> Option<VideoCandidate> {
    let snippet = item.snippet;
    if snippet.title.trim().is_empty() || snippet.title == "Private video" {
        return None;
    }

    let uploaded_at = match DateTime::parse_from_rfc3339(&snippet.published_at) {
        Ok(ts) => ts.with_timezone(&Utc),
        Err(e) => {
            warn!(video_id = %item.id, published_at = %snippet.published_at, error = %e, "Skipping video with unparseable upload time");
            return None;
        }
    };

    let count = |value: &Option<String>| value.as_deref().and_then(|v| v.parse().ok()).unwrap_or(0);

    Some(VideoCandidate {
        title: snippet.title,
        description: snippet.description.chars().take(MAX_DESCRIPTION_CHARS).collect(),
        tags: snippet.tags.into_iter().take(MAX_TAGS).collect(),
        duration_secs: parse_iso8601_duration(&item.content_details.duration).unwrap_or(0) as f64,
        channel_name: snippet.channel_title,
        uploaded_at,
        category: category_name(&snippet.category_id).to_string(),
        stats: EngagementStats {
            view_count: count(&item.statistics.view_count),
            like_count: count(&item.statistics.like_count),
            comment_count: count(&item.statistics.comment_count),
        },
        id: item.id,
    })
}

/// Candidates read from a JSON array on disk, for offline runs.
pub struct JsonFileVideoSource {
    path: PathBuf,
}

impl JsonFileVideoSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl VideoSource for JsonFileVideoSource {
    fn name(&self) -> &'static str {
        "json-file"
    }

    async fn fetch_candidates(&self) -> Result<Vec<VideoCandidate>> {
        let json_content = fs::read_to_string(&self.path).await?;
        let mut videos: Vec<VideoCandidate> = serde_json::from_str(&json_content)?;
        // Hand-written files often carry links; anything unrecognised is left for validation.
        for video in &mut videos {
            if let Some(id) = extract_video_id(&video.id) {
                video.id = id;
            }
        }
        info!(path = %self.path.display(), videos = videos.len(), "Loaded candidates from file");
        Ok(videos)
    }
}
