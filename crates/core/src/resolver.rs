//! Language fallback resolution.
//!
//! Preferred languages are tried in configured order, then every language the
//! source reports, in the source's order. "No transcript" is an ordinary
//! `None`; transient failures are retried with backoff. Running out of attempts
//! while listing languages gives `None`; running out on one track's fetch moves
//! on to the next track. All source calls pass through one shared rate
//! limiter, so concurrent pipelines never exceed the configured request rate.

use std::{future::Future, num::NonZeroU32, sync::Arc, time::Duration};

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use tracing::{debug, info, warn};

use crate::{
    config::ResolverConfig,
    format::clean_transcript_text,
    source::{LanguageTrack, SourceError, TranscriptSource, primary_subtag},
    types::TranscriptResult,
};

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

pub struct LanguageFallbackResolver {
    source: Arc<dyn TranscriptSource>,
    config: ResolverConfig,
    limiter: Arc<DirectLimiter>,
}

impl LanguageFallbackResolver {
    pub fn new(source: Arc<dyn TranscriptSource>, config: ResolverConfig) -> Self {
        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            source,
            config,
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(per_second))),
        }
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    pub async fn resolve(&self, video_id: &str) -> Option<TranscriptResult> {
        let tracks = match self
            .call("list languages", video_id, || self.source.list_languages(video_id))
            .await
        {
            Ok(tracks) => tracks,
            Err(e) => {
                log_empty(video_id, &e);
                return None;
            }
        };

        if tracks.is_empty() {
            debug!(video_id, "Transcript source reports no languages");
            return None;
        }

        let mut attempted = vec![false; tracks.len()];

        for code in &self.config.preferred_languages {
            for index in preferred_candidates(&tracks, code) {
                if attempted[index] {
                    continue;
                }
                attempted[index] = true;
                match self.fetch_track(video_id, &tracks[index], true).await {
                    Ok(result) => return Some(result),
                    Err(e) if e.ends_video() => {
                        log_empty(video_id, &e);
                        return None;
                    }
                    Err(e) => log_track_failure(video_id, &tracks[index], &e),
                }
            }
        }

        for (index, track) in tracks.iter().enumerate() {
            if attempted[index] {
                continue;
            }
            match self.fetch_track(video_id, track, false).await {
                Ok(result) => {
                    info!(
                        video_id,
                        language = %track.code,
                        "Using fallback language"
                    );
                    return Some(result);
                }
                Err(e) if e.ends_video() => {
                    log_empty(video_id, &e);
                    return None;
                }
                Err(e) => log_track_failure(video_id, track, &e),
            }
        }

        debug!(video_id, tracks = tracks.len(), "No track yielded usable text");
        None
    }

    async fn fetch_track(
        &self,
        video_id: &str,
        track: &LanguageTrack,
        is_preferred_language: bool,
    ) -> Result<TranscriptResult, SourceError> {
        let fetched = self
            .call("fetch transcript", video_id, || self.source.fetch(video_id, track))
            .await?;

        let text = clean_transcript_text(&fetched.text);
        if text.is_empty() {
            debug!(video_id, language = %track.code, "Transcript track is empty");
            return Err(SourceError::NotFound);
        }

        let word_count = text.split_whitespace().count();
        info!(
            video_id,
            language = %track.code,
            words = word_count,
            generated = track.is_generated,
            "Transcript fetched"
        );

        Ok(TranscriptResult {
            video_id: video_id.to_string(),
            language: track.code.clone(),
            text,
            is_generated: track.is_generated,
            word_count,
            is_preferred_language,
            duration_covered_secs: fetched.duration_covered_secs,
        })
    }

    /// Run one source call under the limiter and timeout, retrying retryable
    /// failures with exponential backoff.
    async fn call<T, F, Fut>(&self, op: &str, video_id: &str, mut f: F) -> Result<T, SourceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let timeout = Duration::from_secs(self.config.call_timeout_secs);
        let mut attempt: u32 = 0;

        loop {
            self.limiter.until_ready().await;

            let outcome = match tokio::time::timeout(timeout, f()).await {
                Ok(outcome) => outcome,
                Err(_) => Err(SourceError::Transient(format!(
                    "{} timed out after {}s",
                    op, self.config.call_timeout_secs
                ))),
            };

            match outcome {
                Err(e) if e.is_retryable() && attempt + 1 < self.config.max_attempts => {
                    let factor = if e == SourceError::RateLimited { 2 } else { 1 };
                    let delay_ms = self
                        .config
                        .backoff_base_ms
                        .saturating_mul(2u64.saturating_pow(attempt))
                        .saturating_mul(factor);
                    warn!(
                        video_id,
                        op,
                        attempt = attempt + 1,
                        max_attempts = self.config.max_attempts,
                        delay_ms,
                        error = %e,
                        "Transcript source call failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

/// Tracks matching one preferred code, best first: exact code before primary
/// subtag match, human-authored before auto-generated.
fn preferred_candidates(tracks: &[LanguageTrack], code: &str) -> Vec<usize> {
    let exact: Vec<usize> = (0..tracks.len())
        .filter(|&i| tracks[i].code.eq_ignore_ascii_case(code))
        .collect();

    let mut matches = if exact.is_empty() {
        (0..tracks.len())
            .filter(|&i| tracks[i].primary_subtag().eq_ignore_ascii_case(primary_subtag(code)))
            .collect()
    } else {
        exact
    };

    // Stable sort keeps source order among equals.
    matches.sort_by_key(|&i| tracks[i].is_generated);
    matches
}

fn log_track_failure(video_id: &str, track: &LanguageTrack, e: &SourceError) {
    if e.is_retryable() {
        warn!(video_id, language = %track.code, error = %e, "Track kept failing, trying the next one");
    } else {
        debug!(video_id, language = %track.code, reason = %e, "Track yielded no transcript");
    }
}

fn log_empty(video_id: &str, e: &SourceError) {
    if e.is_retryable() {
        warn!(video_id, error = %e, "Transcript source kept failing, treating as no transcript");
    } else {
        info!(video_id, reason = %e, "No transcript available");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracks(specs: &[(&str, bool)]) -> Vec<LanguageTrack> {
        specs
            .iter()
            .map(|(code, generated)| LanguageTrack::new(code, *generated))
            .collect()
    }

    #[test]
    fn exact_match_beats_subtag_match() {
        let available = tracks(&[("en-GB", false), ("en", true)]);
        assert_eq!(preferred_candidates(&available, "en"), vec![1]);
        assert_eq!(preferred_candidates(&available, "EN-gb"), vec![0]);
    }

    #[test]
    fn subtag_match_prefers_human_tracks() {
        let available = tracks(&[("es-419", true), ("fr", false), ("es-ES", false)]);
        assert_eq!(preferred_candidates(&available, "es"), vec![2, 0]);
        assert!(preferred_candidates(&available, "de").is_empty());
    }
}
