use std::{collections::BTreeSet, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::youtube::is_video_id;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoCandidate {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub duration_secs: f64,
    #[serde(default)]
    pub channel_name: String,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub stats: EngagementStats,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementStats {
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
}

impl VideoCandidate {
    /// Hours elapsed between upload and `now`, never negative.
    pub fn age_hours(&self, now: DateTime<Utc>) -> f64 {
        let seconds = (now - self.uploaded_at).num_milliseconds() as f64 / 1000.0;
        (seconds / 3600.0).max(0.0)
    }

    /// Rejects records the engine cannot reason about.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("empty video id".to_string());
        }
        if !is_video_id(&self.id) {
            return Err(format!("{:?} is not a YouTube video id", self.id));
        }
        if self.title.trim().is_empty() {
            return Err(format!("video {} has an empty title", self.id));
        }
        if !self.duration_secs.is_finite() || self.duration_secs < 0.0 {
            return Err(format!(
                "video {} has invalid duration {}",
                self.id, self.duration_secs
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationOverride {
    ShortClip,
    LongForm,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptPotentialScore {
    pub score: i32,
    pub likely_has_transcript: bool,
    pub duration_override: Option<DurationOverride>,
    /// Vocabulary hits that moved the score, e.g. `speech_title:interview`.
    pub matched: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptResult {
    pub video_id: String,
    pub language: String,
    pub text: String,
    pub is_generated: bool,
    pub word_count: usize,
    pub is_preferred_language: bool,
    #[serde(default)]
    pub duration_covered_secs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    FetchNow,
    FetchNowAcceptFailure,
    Defer { retry_after: Duration },
}

impl RetryDecision {
    pub fn should_fetch(&self) -> bool {
        !matches!(self, RetryDecision::Defer { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            RetryDecision::FetchNow => "fetch-now",
            RetryDecision::FetchNowAcceptFailure => "fetch-now-accept-failure",
            RetryDecision::Defer { .. } => "defer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCluster {
    pub label: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataAnalysis {
    pub video_id: String,
    pub keywords: Vec<String>,
    pub tag_clusters: Vec<TagCluster>,
    pub has_substantial_description: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Transcript,
    Metadata,
}

/// One record per processed video. The variant is the provenance tag, so a
/// serialized record carries either transcript fields or metadata fields,
/// never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provenance", rename_all = "snake_case")]
pub enum ContentSignal {
    Transcript(TranscriptResult),
    Metadata(MetadataAnalysis),
}

impl ContentSignal {
    pub fn video_id(&self) -> &str {
        match self {
            ContentSignal::Transcript(t) => &t.video_id,
            ContentSignal::Metadata(m) => &m.video_id,
        }
    }

    pub fn provenance(&self) -> Provenance {
        match self {
            ContentSignal::Transcript(_) => Provenance::Transcript,
            ContentSignal::Metadata(_) => Provenance::Metadata,
        }
    }

    pub fn transcript(&self) -> Option<&TranscriptResult> {
        match self {
            ContentSignal::Transcript(t) => Some(t),
            ContentSignal::Metadata(_) => None,
        }
    }

    pub fn metadata(&self) -> Option<&MetadataAnalysis> {
        match self {
            ContentSignal::Transcript(_) => None,
            ContentSignal::Metadata(m) => Some(m),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn candidate() -> VideoCandidate {
        VideoCandidate {
            id: "abc123def45".to_string(),
            title: "A title".to_string(),
            description: String::new(),
            tags: BTreeSet::new(),
            duration_secs: 300.0,
            channel_name: "Channel".to_string(),
            uploaded_at: Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap(),
            category: "Education".to_string(),
            stats: EngagementStats::default(),
        }
    }

    #[test]
    fn age_is_clamped_for_future_uploads() {
        let video = candidate();
        let before_upload = Utc.with_ymd_and_hms(2026, 10, 18, 22, 0, 0).unwrap();
        assert_eq!(video.age_hours(before_upload), 0.0);

        let later = Utc.with_ymd_and_hms(2026, 10, 19, 3, 30, 0).unwrap();
        assert!((video.age_hours(later) - 3.5).abs() < 1e-9);
    }

    #[test]
    fn validate_rejects_blank_id_and_bad_duration() {
        let mut video = candidate();
        video.id = "  ".to_string();
        assert!(video.validate().is_err());

        let mut video = candidate();
        video.duration_secs = f64::NAN;
        assert!(video.validate().is_err());

        assert!(candidate().validate().is_ok());
    }

    #[test]
    fn validate_rejects_ids_that_are_not_video_ids() {
        for id in ["not-an-id", "https://youtu.be/dQw4w9WgXcQ", "abc123def45!"] {
            let mut video = candidate();
            video.id = id.to_string();
            assert!(video.validate().is_err(), "{id} accepted");
        }
    }

    #[test]
    fn signal_fields_follow_provenance() {
        let signal = ContentSignal::Metadata(MetadataAnalysis {
            video_id: "v1".to_string(),
            keywords: vec!["climate".to_string()],
            tag_clusters: Vec::new(),
            has_substantial_description: false,
        });
        let value = serde_json::to_value(&signal).unwrap();
        assert_eq!(value["provenance"], json!("metadata"));
        assert_eq!(value["video_id"], json!("v1"));
        assert!(value.get("word_count").is_none());
        assert!(value.get("language").is_none());

        let signal = ContentSignal::Transcript(TranscriptResult {
            video_id: "v2".to_string(),
            language: "en".to_string(),
            text: "hello there".to_string(),
            is_generated: true,
            word_count: 2,
            is_preferred_language: true,
            duration_covered_secs: 4.0,
        });
        let value = serde_json::to_value(&signal).unwrap();
        assert_eq!(value["provenance"], json!("transcript"));
        assert_eq!(value["word_count"], json!(2));
        assert!(value.get("keywords").is_none());
    }
}
