#![allow(dead_code)]

use std::{
    collections::{BTreeSet, HashMap, VecDeque},
    future,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use trendscout_core::{
    EngagementStats, FetchedTranscript, LanguageTrack, ResolverConfig, SourceError,
    TranscriptSource, VideoCandidate,
};

/// Transcript source driven by a per-video script. Scripted failures are
/// returned first, in order; after that the configured tracks and texts apply.
#[derive(Default)]
pub struct FakeTranscriptSource {
    tracks: HashMap<String, Vec<LanguageTrack>>,
    texts: HashMap<(String, String), String>,
    list_failures: Mutex<HashMap<String, VecDeque<SourceError>>>,
    fetch_failures: Mutex<HashMap<(String, String), VecDeque<SourceError>>>,
    list_calls: AtomicUsize,
    fetches: Mutex<Vec<(String, String)>>,
}

impl FakeTranscriptSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tracks(mut self, video_id: &str, tracks: &[(&str, bool)]) -> Self {
        self.tracks.insert(
            video_id.to_string(),
            tracks
                .iter()
                .map(|(code, generated)| LanguageTrack::new(code, *generated))
                .collect(),
        );
        self
    }

    pub fn with_text(mut self, video_id: &str, code: &str, text: &str) -> Self {
        self.texts
            .insert((video_id.to_string(), code.to_string()), text.to_string());
        self
    }

    pub fn with_list_failures(self, video_id: &str, failures: Vec<SourceError>) -> Self {
        self.list_failures
            .lock()
            .unwrap()
            .insert(video_id.to_string(), failures.into());
        self
    }

    pub fn with_fetch_failures(self, video_id: &str, code: &str, failures: Vec<SourceError>) -> Self {
        self.fetch_failures
            .lock()
            .unwrap()
            .insert((video_id.to_string(), code.to_string()), failures.into());
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Language codes fetched for a video, in call order.
    pub fn fetched(&self, video_id: &str) -> Vec<String> {
        self.fetches
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == video_id)
            .map(|(_, code)| code.clone())
            .collect()
    }

    pub fn total_calls(&self) -> usize {
        self.list_calls() + self.fetches.lock().unwrap().len()
    }
}

#[async_trait]
impl TranscriptSource for FakeTranscriptSource {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn list_languages(&self, video_id: &str) -> Result<Vec<LanguageTrack>, SourceError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let failure = self
            .list_failures
            .lock()
            .unwrap()
            .get_mut(video_id)
            .and_then(VecDeque::pop_front);
        if let Some(e) = failure {
            return Err(e);
        }
        Ok(self.tracks.get(video_id).cloned().unwrap_or_default())
    }

    async fn fetch(
        &self,
        video_id: &str,
        track: &LanguageTrack,
    ) -> Result<FetchedTranscript, SourceError> {
        let key = (video_id.to_string(), track.code.clone());
        self.fetches.lock().unwrap().push(key.clone());

        let failure = self
            .fetch_failures
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front);
        if let Some(e) = failure {
            return Err(e);
        }
        match self.texts.get(&key) {
            Some(text) => Ok(FetchedTranscript {
                text: text.clone(),
                duration_covered_secs: 42.0,
            }),
            None => Err(SourceError::NotFound),
        }
    }
}

/// Transcript source whose calls never complete.
pub struct StalledTranscriptSource;

#[async_trait]
impl TranscriptSource for StalledTranscriptSource {
    fn name(&self) -> &'static str {
        "stalled"
    }

    async fn list_languages(&self, _video_id: &str) -> Result<Vec<LanguageTrack>, SourceError> {
        future::pending().await
    }

    async fn fetch(
        &self,
        _video_id: &str,
        _track: &LanguageTrack,
    ) -> Result<FetchedTranscript, SourceError> {
        future::pending().await
    }
}

/// Route engine logs to the test output; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .compact()
        .try_init();
}

pub fn fast_resolver_config() -> ResolverConfig {
    ResolverConfig {
        backoff_base_ms: 0,
        requests_per_second: 10_000,
        ..ResolverConfig::default()
    }
}

pub fn reference_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub fn video(
    id: &str,
    title: &str,
    channel: &str,
    duration_secs: f64,
    age_hours: i64,
) -> VideoCandidate {
    VideoCandidate {
        id: id.to_string(),
        title: title.to_string(),
        description: String::new(),
        tags: BTreeSet::new(),
        duration_secs,
        channel_name: channel.to_string(),
        uploaded_at: reference_now() - Duration::hours(age_hours),
        category: "News & Politics".to_string(),
        stats: EngagementStats::default(),
    }
}

/// Likely to have a transcript under the default vocabulary.
pub fn interview(id: &str, age_hours: i64) -> VideoCandidate {
    video(
        id,
        "Expert Interview: Climate Policy Explained",
        "Global News Network",
        1200.0,
        age_hours,
    )
}
