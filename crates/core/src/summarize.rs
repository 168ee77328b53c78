use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    aggregates::{CountEntry, MetadataAggregates},
    error::{Result, TrendscoutError},
    types::{ContentSignal, VideoCandidate},
};

const TRANSCRIPT_EXCERPT_CHARS: usize = 1500;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Provider {
    #[default]
    Openai,
    Grok,
    Gemini,
}

pub struct ProviderConfig {
    pub api_url: &'static str,
    pub model: &'static str,
    pub env_var: &'static str,
}

impl Provider {
    pub fn config(&self) -> ProviderConfig {
        match self {
            Provider::Openai => ProviderConfig {
                api_url: "https://api.openai.com/v1/chat/completions",
                model: "gpt-4o",
                env_var: "OPENAI_API_KEY",
            },
            Provider::Grok => ProviderConfig {
                api_url: "https://api.x.ai/v1/chat/completions",
                model: "grok-4-fast",
                env_var: "XAI_API_KEY",
            },
            Provider::Gemini => ProviderConfig {
                api_url: "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions",
                model: "gemini-2.5-flash",
                env_var: "GEMINI_API_KEY",
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Openai => "OpenAI",
            Provider::Grok => "Grok",
            Provider::Gemini => "Gemini",
        }
    }

    /// Validate that the API key is set for this provider
    pub fn validate_api_key(&self) -> Result<String> {
        let config = self.config();
        std::env::var(config.env_var).map_err(|_| TrendscoutError::MissingApiKey {
            env_var: config.env_var.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub headline: String,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub opportunities: Vec<String>,
}

/// Turns a batch of signals into a short trend summary through an
/// OpenAI-compatible chat-completions endpoint.
pub struct TrendSummarizer {
    client: reqwest::Client,
    api_url: String,
    model: String,
    api_key: String,
}

impl TrendSummarizer {
    pub fn from_provider(provider: &Provider) -> Result<Self> {
        let config = provider.config();
        let api_key = provider.validate_api_key()?;
        Ok(Self::with_endpoint(config.api_url, config.model, api_key))
    }

    pub fn with_endpoint(
        api_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    pub async fn summarize(
        &self,
        videos: &[VideoCandidate],
        signals: &[ContentSignal],
        aggregates: &MetadataAggregates,
    ) -> Result<TrendSummary> {
        let system_prompt = r#"You are a trend analyst for short-form video. You receive an overview of today's trending batch followed by the videos themselves, each with either a transcript excerpt or keywords and tag clusters derived from its metadata.

You MUST output ONLY valid JSON matching this exact structure (no markdown, no explanation):
{
  "headline": "One sentence describing the dominant trend today",
  "themes": ["theme1", "theme2", "theme3"],
  "opportunities": ["opportunity1", "opportunity2"]
}

Rules:
- 3-6 themes, each a short phrase grounded in the videos provided
- 2-5 opportunities: content gaps or emerging niches worth covering
- Treat metadata-only videos as weaker evidence than transcripts
- Use the overview to judge which categories and channels carry the day
- Output ONLY the JSON, nothing else"#;

        let user_prompt = format!(
            "{}\nTrending videos ({} total):\n\n{}",
            render_overview(aggregates),
            videos.len(),
            render_batch(videos, signals)
        );

        info!(model = %self.model, videos = videos.len(), "Requesting trend summary");

        let response = self
            .client
            .post(&self.api_url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&serde_json::json!({
                "model": self.model,
                "messages": [
                    {
                        "role": "system",
                        "content": system_prompt,
                    },
                    {
                        "role": "user",
                        "content": user_prompt,
                    },
                ],
                "temperature": 0.7,
            }))
            .send()
            .await?
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;

        let content = response["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| TrendscoutError::SummaryFailed {
                reason: format!("Invalid API response: {:?}", response),
            })?;

        serde_json::from_str(strip_code_fence(content)).map_err(|e| {
            TrendscoutError::SummaryFailed {
                reason: format!("model returned malformed summary: {e}"),
            }
        })
    }
}

fn render_overview(aggregates: &MetadataAggregates) -> String {
    let counts = |entries: &[CountEntry]| {
        entries
            .iter()
            .map(|e| format!("{} ({})", e.name, e.count))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut output = String::from("OVERVIEW\n");
    output.push_str(&format!(
        "Total views: {}, likes: {}, comments: {}\n",
        aggregates.total_views, aggregates.total_likes, aggregates.total_comments
    ));
    output.push_str(&format!(
        "Average engagement: {:.2}% likes per view\n",
        aggregates.avg_engagement_rate
    ));
    output.push_str(&format!("Categories: {}\n", counts(&aggregates.category_counts)));
    output.push_str(&format!("Top channels: {}\n", counts(&aggregates.top_channels)));
    for (i, ranked) in aggregates.top_videos.iter().enumerate() {
        output.push_str(&format!(
            "Most viral #{}: \"{}\" (score {:.0})\n",
            i + 1,
            ranked.title,
            ranked.virality_score
        ));
    }
    output
}

fn render_batch(videos: &[VideoCandidate], signals: &[ContentSignal]) -> String {
    let mut output = String::new();
    for (video, signal) in videos.iter().zip(signals) {
        output.push_str(&format!(
            "• \"{}\" by {} [{}], {} views\n",
            video.title, video.channel_name, video.category, video.stats.view_count
        ));
        match signal {
            ContentSignal::Transcript(t) => {
                let excerpt: String = t.text.chars().take(TRANSCRIPT_EXCERPT_CHARS).collect();
                output.push_str(&format!("  transcript ({}): {}\n", t.language, excerpt));
            }
            ContentSignal::Metadata(m) => {
                output.push_str(&format!("  keywords: {}\n", m.keywords.join(", ")));
                for cluster in &m.tag_clusters {
                    output.push_str(&format!("  tags/{}: {}\n", cluster.label, cluster.tags.join(", ")));
                }
            }
        }
    }
    output
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}
