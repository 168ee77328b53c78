use crate::{
    config::{PredictorConfig, WordList},
    types::{DurationOverride, TranscriptPotentialScore, VideoCandidate},
};

/// Estimates whether a video is worth a transcript fetch, without touching
/// the network.
#[derive(Debug, Clone)]
pub struct Predictor {
    config: PredictorConfig,
}

impl Predictor {
    pub fn new(config: PredictorConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, video: &VideoCandidate) -> TranscriptPotentialScore {
        let cfg = &self.config;

        if video.duration_secs > cfg.long_form_secs {
            return TranscriptPotentialScore {
                score: 0,
                likely_has_transcript: true,
                duration_override: Some(DurationOverride::LongForm),
                matched: Vec::new(),
            };
        }

        let mut score = 0;
        let mut matched = Vec::new();
        let mut apply = |list: &WordList, haystack: &str, weight: i32, kind: &str| {
            if let Some(term) = list.first_match(haystack) {
                score += weight;
                matched.push(format!("{kind}:{term}"));
            }
        };

        apply(&cfg.speech_title_terms, &video.title, cfg.speech_title_weight, "speech_title");
        apply(&cfg.music_title_terms, &video.title, -cfg.music_title_weight, "music_title");
        apply(
            &cfg.education_channel_terms,
            &video.channel_name,
            cfg.education_channel_weight,
            "education_channel",
        );
        apply(
            &cfg.music_channel_terms,
            &video.channel_name,
            -cfg.music_channel_weight,
            "music_channel",
        );

        // Short clips are overwhelmingly non-speech; the score is kept for logs only.
        if video.duration_secs < cfg.short_clip_secs {
            return TranscriptPotentialScore {
                score,
                likely_has_transcript: false,
                duration_override: Some(DurationOverride::ShortClip),
                matched,
            };
        }

        TranscriptPotentialScore {
            score,
            likely_has_transcript: score > 0,
            duration_override: None,
            matched,
        }
    }
}

impl Default for Predictor {
    fn default() -> Self {
        Self::new(PredictorConfig::default())
    }
}
