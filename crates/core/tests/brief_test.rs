mod common;

use std::sync::Arc;

use anyhow::Result;
use common::{
    FakeTranscriptSource, fast_resolver_config, init_tracing, interview, reference_now, video,
};
use trendscout_core::{
    AcquisitionConfig, AcquisitionOrchestrator, DailyBrief, EngagementStats, TrendSummary,
    format_brief_readable, get_brief_path, load_brief, save_brief,
};

async fn sample_brief() -> Result<DailyBrief> {
    init_tracing();
    let source = Arc::new(
        FakeTranscriptSource::new()
            .with_tracks("interview01", &[("en", false)])
            .with_text("interview01", "en", "today we talk about climate policy"),
    );
    let config = AcquisitionConfig {
        resolver: fast_resolver_config(),
        ..AcquisitionConfig::default()
    };
    let videos = vec![
        interview("interview01", 10),
        video("music000001", "Official Music Video", "", 45.0, 48),
    ];

    let report = AcquisitionOrchestrator::new(config, source)
        .process_report(&videos, reference_now())
        .await?;
    Ok(DailyBrief::new(videos, report, reference_now()))
}

#[tokio::test]
async fn brief_round_trips_through_disk() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = get_brief_path(&dir.path().join("data"));
    let brief = sample_brief().await?.with_trend_summary(TrendSummary {
        headline: "Policy talk is up".to_string(),
        themes: vec!["climate".to_string()],
        opportunities: vec![],
    });

    save_brief(&brief, &path).await?;
    let loaded = load_brief(&path).await?;

    assert_eq!(loaded, brief);
    assert_eq!(loaded.date, "2024-05-01");
    assert_eq!(loaded.summary.total, 2);

    let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())?
        .flatten()
        .filter(|entry| entry.path() != path)
        .collect();
    assert!(leftovers.is_empty(), "temporary files left behind");
    Ok(())
}

#[tokio::test]
async fn brief_json_tags_signals_with_provenance() -> Result<()> {
    let brief = sample_brief().await?;

    let value = serde_json::to_value(&brief)?;

    assert_eq!(value["signals"][0]["provenance"], "transcript");
    assert_eq!(value["signals"][0]["language"], "en");
    assert_eq!(value["signals"][1]["provenance"], "metadata");
    assert!(value["signals"][1].get("text").is_none());
    assert!(value.get("trend_summary").is_none());
    Ok(())
}

#[tokio::test]
async fn readable_brief_lists_every_video() -> Result<()> {
    let brief = sample_brief().await?;

    let text = format_brief_readable(&brief);

    assert!(text.starts_with("# Daily trend brief: 2024-05-01"));
    assert!(text.contains("Expert Interview: Climate Policy Explained"));
    assert!(text.contains("Official Music Video"));
    assert!(text.contains("Transcript: 6 words, en"));
    assert!(text.contains("1 of 2 videos were analyzed from metadata only"));
    Ok(())
}

#[tokio::test]
async fn brief_carries_engagement_aggregates() -> Result<()> {
    init_tracing();
    let mut fresh = video("fresh000001", "Rocket launch recap", "Space Daily", 600.0, 6);
    fresh.category = "Science & Technology".to_string();
    fresh.stats = EngagementStats {
        view_count: 1000,
        like_count: 100,
        comment_count: 20,
    };
    let mut stale = video("stale000001", "Budget vote explained", "Capitol Desk", 900.0, 240);
    stale.stats = EngagementStats {
        view_count: 3000,
        like_count: 50,
        comment_count: 10,
    };
    let mut quiet = video("quiet000001", "Council meeting", "Capitol Desk", 3600.0, 2);
    quiet.stats = EngagementStats {
        view_count: 0,
        like_count: 0,
        comment_count: 0,
    };
    let videos = vec![fresh, stale, quiet];

    let source = Arc::new(FakeTranscriptSource::new());
    let config = AcquisitionConfig {
        resolver: fast_resolver_config(),
        ..AcquisitionConfig::default()
    };
    let report = AcquisitionOrchestrator::new(config, source)
        .process_report(&videos, reference_now())
        .await?;
    let brief = DailyBrief::new(videos, report, reference_now());
    let aggregates = &brief.aggregates;

    assert_eq!(aggregates.total_views, 4000);
    assert_eq!(aggregates.total_likes, 150);
    assert_eq!(aggregates.total_comments, 30);
    assert!((aggregates.avg_engagement_rate - 3.75).abs() < 1e-9);

    let categories: Vec<(&str, usize)> = aggregates
        .category_counts
        .iter()
        .map(|c| (c.name.as_str(), c.count))
        .collect();
    assert_eq!(categories, vec![("News & Politics", 2), ("Science & Technology", 1)]);
    assert_eq!(aggregates.top_channels[0].name, "Capitol Desk");
    assert_eq!(aggregates.top_channels[0].count, 2);

    // The fresh clip outranks the bigger but ten-day-old one.
    let ranking: Vec<&str> = aggregates
        .top_videos
        .iter()
        .map(|v| v.video_id.as_str())
        .collect();
    assert_eq!(ranking, vec!["fresh000001", "stale000001", "quiet000001"]);

    let text = format_brief_readable(&brief);
    assert!(text.contains("**Views:** 4000 | **Likes:** 150 | **Comments:** 30 | **Engagement:** 3.75%"));
    assert!(text.contains("1. Rocket launch recap (score 446)"));
    Ok(())
}
