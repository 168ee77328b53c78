//! Tunable parameters for every engine component.
//!
//! All vocabularies and thresholds live here and are injected into the
//! components at construction. A TOML file may override any subset of them;
//! missing keys fall back to the defaults below.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{Result, TrendscoutError};

/// A versioned list of lowercase match terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordList {
    pub version: u32,
    pub terms: Vec<String>,
}

impl WordList {
    pub fn new(version: u32, terms: &[&str]) -> Self {
        Self {
            version,
            terms: terms.iter().map(|t| t.to_lowercase()).collect(),
        }
    }

    /// First term contained in `haystack`, compared case-insensitively.
    pub fn first_match(&self, haystack: &str) -> Option<&str> {
        let haystack = haystack.to_lowercase();
        self.terms
            .iter()
            .map(String::as_str)
            .filter(|term| !term.is_empty())
            .find(|term| haystack.contains(&term.to_lowercase()))
    }

    pub fn contains_word(&self, word: &str) -> bool {
        self.terms.iter().any(|t| t.eq_ignore_ascii_case(word))
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    pub short_clip_secs: f64,
    pub long_form_secs: f64,
    pub speech_title_terms: WordList,
    pub music_title_terms: WordList,
    pub education_channel_terms: WordList,
    pub music_channel_terms: WordList,
    pub speech_title_weight: i32,
    pub music_title_weight: i32,
    pub education_channel_weight: i32,
    pub music_channel_weight: i32,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            short_clip_secs: 60.0,
            long_form_secs: 1800.0,
            speech_title_terms: WordList::new(
                1,
                &[
                    "interview",
                    "explains",
                    "explained",
                    "tutorial",
                    "review",
                    "podcast",
                    "analysis",
                    "documentary",
                    "lecture",
                    "how to",
                    "discussion",
                    "debate",
                    "news",
                    "reacts",
                ],
            ),
            music_title_terms: WordList::new(
                1,
                &[
                    "official music video",
                    "official video",
                    "official audio",
                    "lyric video",
                    "lyrics",
                    "instrumental",
                    "remix",
                    "visualizer",
                    "music video",
                    "(audio)",
                ],
            ),
            education_channel_terms: WordList::new(
                1,
                &[
                    "news",
                    "academy",
                    "university",
                    "school",
                    "learn",
                    "education",
                    "science",
                    "ted",
                    "podcast",
                    "explained",
                ],
            ),
            music_channel_terms: WordList::new(
                1,
                &[
                    "vevo", "records", "music", "official", "label", "beats", "sound",
                ],
            ),
            speech_title_weight: 2,
            music_title_weight: 2,
            education_channel_weight: 1,
            music_channel_weight: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub defer_below_hours: f64,
    pub confident_after_hours: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            defer_below_hours: 2.0,
            confident_after_hours: 6.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Tried in order before falling back to any reported language.
    pub preferred_languages: Vec<String>,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub call_timeout_secs: u64,
    pub requests_per_second: u32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            preferred_languages: ["en", "en-US", "en-GB", "en-CA", "es", "pt", "hi", "fr", "de", "ja"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_attempts: 3,
            backoff_base_ms: 1000,
            call_timeout_secs: 30,
            requests_per_second: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub substantial_description_chars: usize,
    pub min_keyword_len: usize,
    pub max_keywords: usize,
    pub title_weight: u32,
    pub tag_weight: u32,
    pub description_weight: u32,
    pub min_cluster_size: usize,
    pub stop_words: WordList,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            substantial_description_chars: 200,
            min_keyword_len: 3,
            max_keywords: 10,
            title_weight: 2,
            tag_weight: 2,
            description_weight: 1,
            min_cluster_size: 2,
            stop_words: WordList::new(
                1,
                &[
                    "the", "and", "for", "with", "you", "your", "this", "that", "from", "are",
                    "was", "were", "will", "have", "has", "not", "but", "all", "can", "our",
                    "out", "about", "what", "when", "how", "who", "why", "its", "it's", "into",
                    "new", "more", "just", "get", "now", "official", "video", "http", "https",
                    "www", "com", "subscribe", "follow", "channel", "watch", "full",
                ],
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    pub predictor: PredictorConfig,
    pub retry: RetryConfig,
    pub resolver: ResolverConfig,
    pub analyzer: AnalyzerConfig,
    /// Maximum number of per-video pipelines in flight.
    pub concurrency: usize,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            predictor: PredictorConfig::default(),
            retry: RetryConfig::default(),
            resolver: ResolverConfig::default(),
            analyzer: AnalyzerConfig::default(),
            concurrency: 1,
        }
    }
}

impl AcquisitionConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AcquisitionConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file from disk
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await.map_err(|e| TrendscoutError::Config {
            reason: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// Load `path` when it exists, defaults otherwise.
    pub async fn load_or_default(path: &Path) -> Result<Self> {
        if fs::try_exists(path).await.unwrap_or(false) {
            Self::load(path).await
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |reason: &str| {
            Err(TrendscoutError::Config {
                reason: reason.to_string(),
            })
        };

        if self.concurrency == 0 {
            return fail("concurrency must be > 0");
        }
        if self.resolver.max_attempts == 0 {
            return fail("resolver.max_attempts must be > 0");
        }
        if self.resolver.requests_per_second == 0 {
            return fail("resolver.requests_per_second must be > 0");
        }
        if self.resolver.call_timeout_secs == 0 {
            return fail("resolver.call_timeout_secs must be > 0");
        }
        let thresholds = [
            ("retry.defer_below_hours", self.retry.defer_below_hours),
            ("retry.confident_after_hours", self.retry.confident_after_hours),
            ("predictor.short_clip_secs", self.predictor.short_clip_secs),
            ("predictor.long_form_secs", self.predictor.long_form_secs),
        ];
        if let Some((name, _)) = thresholds.iter().find(|(_, value)| !value.is_finite()) {
            return fail(&format!("{name} must be a finite number"));
        }
        if self.retry.defer_below_hours < 0.0
            || self.retry.defer_below_hours > self.retry.confident_after_hours
        {
            return fail("retry.defer_below_hours must be within 0..=confident_after_hours");
        }
        if self.predictor.short_clip_secs > self.predictor.long_form_secs {
            return fail("predictor.short_clip_secs must not exceed long_form_secs");
        }
        if self.analyzer.min_cluster_size == 0 {
            return fail("analyzer.min_cluster_size must be > 0");
        }
        Ok(())
    }
}
