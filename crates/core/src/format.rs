use std::sync::LazyLock;

use regex::Regex;

use crate::{
    brief::DailyBrief,
    types::{ContentSignal, Provenance},
};

static BRACKETED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[[^\]]*\]").unwrap());
static INLINE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static CUE_TIMING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2}:)?(\d{2}):(\d{2})[.,](\d{3})\s+-->\s+(\d{1,2}:)?(\d{2}):(\d{2})[.,](\d{3})")
        .unwrap()
});
static ISO_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$").unwrap()
});

/// Format seconds as MM:SS, or H:MM:SS from one hour up
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let (hours, mins, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}", mins, secs)
    }
}

/// Parse an ISO-8601 duration such as `PT4M13S` or `P1DT2H` into seconds.
pub fn parse_iso8601_duration(duration: &str) -> Option<u64> {
    let caps = ISO_DURATION.captures(duration.trim())?;
    if duration.trim() == "P" || duration.trim().ends_with('T') {
        return None;
    }
    let part = |i: usize, unit: u64| -> Option<u64> {
        match caps.get(i) {
            Some(m) => m.as_str().parse::<u64>().ok()?.checked_mul(unit),
            None => Some(0),
        }
    };
    part(1, 86_400)?
        .checked_add(part(2, 3600)?)?
        .checked_add(part(3, 60)?)?
        .checked_add(part(4, 1)?)
}

/// Drop bracketed annotations (`[Music]`, `[Applause]`) and collapse whitespace.
pub fn clean_transcript_text(raw: &str) -> String {
    let without_annotations = BRACKETED.replace_all(raw, " ");
    without_annotations
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Convert WebVTT captions to plain text.
///
/// Returns the text and the span in seconds from the first cue start to the
/// last cue end. Inline timing/styling tags are stripped, and a cue line that
/// repeats the previous one (rolling auto-captions) is kept once.
pub fn vtt_to_text(vtt: &str) -> (String, f64) {
    let mut lines: Vec<String> = Vec::new();
    let mut first_start: Option<f64> = None;
    let mut last_end = 0.0_f64;
    let mut in_header = true;

    for raw in vtt.lines() {
        let line = raw.trim();
        if let Some(caps) = CUE_TIMING.captures(line) {
            in_header = false;
            let seconds = |h: usize, m: usize, s: usize, ms: usize| -> f64 {
                let num = |i: usize| {
                    caps.get(i)
                        .map(|m| m.as_str().trim_end_matches(':'))
                        .and_then(|v| v.parse::<f64>().ok())
                        .unwrap_or(0.0)
                };
                num(h) * 3600.0 + num(m) * 60.0 + num(s) + num(ms) / 1000.0
            };
            let start = seconds(1, 2, 3, 4);
            let end = seconds(5, 6, 7, 8);
            first_start.get_or_insert(start);
            last_end = last_end.max(end);
            continue;
        }
        if in_header || line.is_empty() || line.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }

        let text = INLINE_TAG.replace_all(line, "");
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() || lines.last() == Some(&text) {
            continue;
        }
        lines.push(text);
    }

    let covered = first_start.map(|start| (last_end - start).max(0.0)).unwrap_or(0.0);
    (lines.join(" "), covered)
}

/// Format a daily brief as human-readable markdown
pub fn format_brief_readable(brief: &DailyBrief) -> String {
    let mut output = String::new();
    let summary = &brief.summary;

    output.push_str(&format!("# Daily trend brief: {}\n\n", brief.date));

    output.push_str(&format!(
        "**Videos:** {} | **Transcripts:** {} | **Metadata only:** {} | **Deferred:** {} | **Skipped by predictor:** {}\n\n",
        summary.total,
        summary.transcript_based,
        summary.metadata_based,
        summary.deferred,
        summary.skipped_by_predictor
    ));

    let aggregates = &brief.aggregates;
    if aggregates.total_views > 0 {
        output.push_str(&format!(
            "**Views:** {} | **Likes:** {} | **Comments:** {} | **Engagement:** {:.2}%\n\n",
            aggregates.total_views,
            aggregates.total_likes,
            aggregates.total_comments,
            aggregates.avg_engagement_rate
        ));
    }
    if !aggregates.category_counts.is_empty() {
        let categories: Vec<String> = aggregates
            .category_counts
            .iter()
            .map(|c| format!("{} ({})", c.name, c.count))
            .collect();
        output.push_str(&format!("**Categories:** {}\n\n", categories.join(", ")));
    }
    if aggregates.top_videos.iter().any(|v| v.virality_score > 0.0) {
        output.push_str("## Most viral\n\n");
        for (i, ranked) in aggregates.top_videos.iter().enumerate() {
            output.push_str(&format!(
                "{}. {} (score {:.0})\n",
                i + 1,
                ranked.title,
                ranked.virality_score
            ));
        }
        output.push('\n');
    }

    if let Some(trends) = &brief.trend_summary {
        output.push_str("## Trend summary\n\n");
        output.push_str(&trends.headline);
        output.push_str("\n\n");
        for theme in &trends.themes {
            output.push_str(&format!("• {}\n", theme));
        }
        if !trends.opportunities.is_empty() {
            output.push_str("\n### Opportunities\n\n");
            for (i, opportunity) in trends.opportunities.iter().enumerate() {
                output.push_str(&format!("{}. {}\n", i + 1, opportunity));
            }
        }
        output.push('\n');
    }

    output.push_str("## Videos\n\n");
    for (video, signal) in brief.videos.iter().zip(&brief.signals) {
        output.push_str(&format!(
            "### [{}] {}\n\n",
            format_timestamp(video.duration_secs),
            video.title
        ));
        output.push_str(&format!("{} · {}\n\n", video.channel_name, video.category));
        match signal {
            ContentSignal::Transcript(t) => {
                let language = if t.is_preferred_language {
                    t.language.clone()
                } else {
                    format!("{} (fallback)", t.language)
                };
                output.push_str(&format!(
                    "Transcript: {} words, {}{}\n\n",
                    t.word_count,
                    language,
                    if t.is_generated { ", auto-generated" } else { "" }
                ));
            }
            ContentSignal::Metadata(m) => {
                if !m.keywords.is_empty() {
                    output.push_str(&format!("Keywords: {}\n", m.keywords.join(", ")));
                }
                for cluster in &m.tag_clusters {
                    output.push_str(&format!("• {}: {}\n", cluster.label, cluster.tags.join(", ")));
                }
                output.push('\n');
            }
        }
    }

    let fallback = brief
        .signals
        .iter()
        .filter(|s| s.provenance() == Provenance::Metadata)
        .count();
    if fallback > 0 {
        output.push_str(&format!(
            "_{} of {} videos were analyzed from metadata only._\n",
            fallback,
            brief.signals.len()
        ));
    }

    output
}
