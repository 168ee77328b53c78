//! Batch-level engagement figures and the virality ranking.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::VideoCandidate;

const TOP_CHANNELS: usize = 10;
const TOP_VIDEOS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountEntry {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedVideo {
    pub video_id: String,
    pub title: String,
    pub virality_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataAggregates {
    pub total_views: u64,
    pub total_likes: u64,
    pub total_comments: u64,
    /// Likes per hundred views across the batch, 0 when nothing was viewed.
    pub avg_engagement_rate: f64,
    /// Most common first, ties by name.
    pub category_counts: Vec<CountEntry>,
    pub top_channels: Vec<CountEntry>,
    pub top_videos: Vec<RankedVideo>,
}

impl MetadataAggregates {
    pub fn from_videos(videos: &[VideoCandidate], now: DateTime<Utc>) -> Self {
        let total_views = videos.iter().map(|v| v.stats.view_count).fold(0u64, u64::saturating_add);
        let total_likes = videos.iter().map(|v| v.stats.like_count).fold(0u64, u64::saturating_add);
        let total_comments = videos
            .iter()
            .map(|v| v.stats.comment_count)
            .fold(0u64, u64::saturating_add);

        let avg_engagement_rate = if total_views == 0 {
            0.0
        } else {
            total_likes as f64 / total_views as f64 * 100.0
        };

        let mut top_channels = count_by(videos.iter().map(|v| v.channel_name.as_str()));
        top_channels.truncate(TOP_CHANNELS);

        let mut top_videos: Vec<RankedVideo> = videos
            .iter()
            .map(|v| RankedVideo {
                video_id: v.id.clone(),
                title: v.title.clone(),
                virality_score: virality_score(v, now),
            })
            .collect();
        top_videos.sort_by(|a, b| b.virality_score.total_cmp(&a.virality_score));
        top_videos.truncate(TOP_VIDEOS);

        Self {
            total_views,
            total_likes,
            total_comments,
            avg_engagement_rate,
            category_counts: count_by(videos.iter().map(|v| v.category.as_str())),
            top_channels,
            top_videos,
        }
    }
}

/// Weighted reach and engagement, damped for videos older than a day and
/// never below a tenth of the undamped value.
pub fn virality_score(video: &VideoCandidate, now: DateTime<Utc>) -> f64 {
    let views = video.stats.view_count as f64;
    let likes = video.stats.like_count as f64;
    let comments = video.stats.comment_count as f64;

    let engagement_rate = (likes + comments) / views.max(1.0);
    let recency_factor = (1.0 / (video.age_hours(now) / 24.0).max(1.0)).max(0.1);

    (views * 0.4 + likes * 0.3 + comments * 0.2 + engagement_rate * views * 0.1) * recency_factor
}

fn count_by<'a>(names: impl Iterator<Item = &'a str>) -> Vec<CountEntry> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for name in names.map(str::trim).filter(|n| !n.is_empty()) {
        *counts.entry(name).or_default() += 1;
    }

    let mut entries: Vec<CountEntry> = counts
        .into_iter()
        .map(|(name, count)| CountEntry {
            name: name.to_string(),
            count,
        })
        .collect();
    // Stable sort keeps the map's name order among equal counts.
    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::types::EngagementStats;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn stats_video(age_hours: i64, views: u64, likes: u64, comments: u64) -> VideoCandidate {
        VideoCandidate {
            id: "abcdefghijk".to_string(),
            title: "A title".to_string(),
            description: String::new(),
            tags: BTreeSet::new(),
            duration_secs: 300.0,
            channel_name: "Channel".to_string(),
            uploaded_at: now() - Duration::hours(age_hours),
            category: "Education".to_string(),
            stats: EngagementStats {
                view_count: views,
                like_count: likes,
                comment_count: comments,
            },
        }
    }

    #[test]
    fn fresh_video_is_not_damped() {
        // 400 + 30 + 4 + (120 / 1000) * 1000 * 0.1
        let score = virality_score(&stats_video(6, 1000, 100, 20), now());
        assert!((score - 446.0).abs() < 1e-9, "{score}");
    }

    #[test]
    fn older_videos_decay_to_a_floor() {
        let day = virality_score(&stats_video(24, 1000, 0, 0), now());
        let two_days = virality_score(&stats_video(48, 1000, 0, 0), now());
        let month = virality_score(&stats_video(24 * 30, 1000, 0, 0), now());

        assert!((day - 400.0).abs() < 1e-9);
        assert!((two_days - 200.0).abs() < 1e-9);
        assert!((month - 40.0).abs() < 1e-9);
    }

    #[test]
    fn unviewed_batch_has_zero_engagement() {
        let aggregates = MetadataAggregates::from_videos(&[stats_video(1, 0, 5, 5)], now());
        assert_eq!(aggregates.avg_engagement_rate, 0.0);
        assert_eq!(aggregates.total_likes, 5);

        let empty = MetadataAggregates::from_videos(&[], now());
        assert_eq!(empty, MetadataAggregates::default());
    }
}
