use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A caption track a transcript source reports for a video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageTrack {
    pub code: String,
    #[serde(default)]
    pub name: String,
    pub is_generated: bool,
}

impl LanguageTrack {
    pub fn new(code: &str, is_generated: bool) -> Self {
        Self {
            code: code.to_string(),
            name: String::new(),
            is_generated,
        }
    }

    /// `en` for `en-GB`, `pt` for `pt_BR`.
    pub fn primary_subtag(&self) -> &str {
        primary_subtag(&self.code)
    }
}

pub fn primary_subtag(code: &str) -> &str {
    code.split(['-', '_']).next().unwrap_or(code)
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchedTranscript {
    pub text: String,
    /// Span covered by the caption cues, 0.0 when the source cannot tell.
    pub duration_covered_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("No transcript found")]
    NotFound,

    #[error("Transcripts are disabled for this video")]
    Disabled,

    #[error("Video is unavailable: {0}")]
    Unavailable(String),

    #[error("Rate limited by transcript source")]
    RateLimited,

    #[error("Transient transcript source failure: {0}")]
    Transient(String),
}

impl SourceError {
    /// Worth another attempt after a backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SourceError::RateLimited | SourceError::Transient(_))
    }

    /// The whole video has no reachable captions; trying other tracks is pointless.
    pub fn ends_video(&self) -> bool {
        matches!(self, SourceError::Disabled | SourceError::Unavailable(_))
    }
}

#[async_trait]
pub trait TranscriptSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Tracks in the source's own order.
    async fn list_languages(&self, video_id: &str) -> Result<Vec<LanguageTrack>, SourceError>;

    async fn fetch(
        &self,
        video_id: &str,
        track: &LanguageTrack,
    ) -> Result<FetchedTranscript, SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_subtag_strips_region() {
        assert_eq!(primary_subtag("en-GB"), "en");
        assert_eq!(primary_subtag("pt_BR"), "pt");
        assert_eq!(primary_subtag("ja"), "ja");
        assert_eq!(LanguageTrack::new("zh-Hant", true).primary_subtag(), "zh");
    }

    #[test]
    fn error_classes() {
        assert!(SourceError::RateLimited.is_retryable());
        assert!(SourceError::Transient("timeout".into()).is_retryable());
        assert!(!SourceError::NotFound.is_retryable());
        assert!(SourceError::Disabled.ends_video());
        assert!(!SourceError::NotFound.ends_video());
    }
}
