use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use uuid::Uuid;

use crate::{
    aggregates::MetadataAggregates,
    error::Result,
    orchestrator::{BatchReport, BatchStats},
    summarize::TrendSummary,
    types::{ContentSignal, VideoCandidate},
};

/// Output of one run: the candidates, their signals, the batch counts and
/// engagement aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBrief {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// `YYYY-MM-DD` of `generated_at`
    pub date: String,
    pub summary: BatchStats,
    #[serde(default)]
    pub aggregates: MetadataAggregates,
    pub videos: Vec<VideoCandidate>,
    pub signals: Vec<ContentSignal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend_summary: Option<TrendSummary>,
}

impl DailyBrief {
    pub fn new(videos: Vec<VideoCandidate>, report: BatchReport, now: DateTime<Utc>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at: now,
            date: now.format("%Y-%m-%d").to_string(),
            summary: report.stats,
            aggregates: MetadataAggregates::from_videos(&videos, now),
            videos,
            signals: report.signals,
            trend_summary: None,
        }
    }

    pub fn with_trend_summary(mut self, summary: TrendSummary) -> Self {
        self.trend_summary = Some(summary);
        self
    }
}

/// Save a brief as pretty JSON. The file is written next to its final
/// location and renamed into place, so readers never see a partial brief.
pub async fn save_brief(brief: &DailyBrief, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let pretty_json = serde_json::to_string_pretty(brief)?;
    let tmp_path = path.with_extension(format!("json.{}.tmp", brief.run_id.simple()));
    fs::write(&tmp_path, &pretty_json).await?;
    if let Err(e) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(e.into());
    }
    Ok(())
}

/// Load a brief from a file
pub async fn load_brief(path: &Path) -> Result<DailyBrief> {
    let json_content = fs::read_to_string(path).await?;
    let brief: DailyBrief = serde_json::from_str(&json_content)?;
    Ok(brief)
}
