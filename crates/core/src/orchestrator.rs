use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::{StreamExt, stream};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    config::AcquisitionConfig,
    error::{Result, TrendscoutError},
    metadata::MetadataAnalyzer,
    predictor::Predictor,
    resolver::LanguageFallbackResolver,
    retry::RetryScheduler,
    source::TranscriptSource,
    types::{ContentSignal, RetryDecision, VideoCandidate},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub total: usize,
    pub transcript_based: usize,
    pub metadata_based: usize,
    pub skipped_by_predictor: usize,
    pub deferred: usize,
    pub fetch_attempted: usize,
    /// Failed fetches for videos young enough that no transcript was expected yet.
    pub fetch_failed_accepted: usize,
    pub fetch_failed_unexpected: usize,
    pub fallback_language: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub signals: Vec<ContentSignal>,
    pub stats: BatchStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VideoOutcome {
    Transcript { preferred: bool },
    SkippedByPredictor,
    Deferred,
    FetchFailed { accepted: bool },
}

pub struct AcquisitionOrchestrator {
    predictor: Predictor,
    scheduler: RetryScheduler,
    resolver: LanguageFallbackResolver,
    analyzer: MetadataAnalyzer,
    concurrency: usize,
}

impl AcquisitionOrchestrator {
    pub fn new(config: AcquisitionConfig, source: Arc<dyn TranscriptSource>) -> Self {
        Self {
            predictor: Predictor::new(config.predictor),
            scheduler: RetryScheduler::new(config.retry),
            resolver: LanguageFallbackResolver::new(source, config.resolver),
            analyzer: MetadataAnalyzer::new(config.analyzer),
            concurrency: config.concurrency.max(1),
        }
    }

    pub fn from_parts(
        predictor: Predictor,
        scheduler: RetryScheduler,
        resolver: LanguageFallbackResolver,
        analyzer: MetadataAnalyzer,
    ) -> Self {
        Self {
            predictor,
            scheduler,
            resolver,
            analyzer,
            concurrency: 1,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// One signal per input video, in input order, judged against the current time.
    pub async fn process(&self, videos: &[VideoCandidate]) -> Result<Vec<ContentSignal>> {
        self.process_at(videos, Utc::now()).await
    }

    pub async fn process_at(
        &self,
        videos: &[VideoCandidate],
        now: DateTime<Utc>,
    ) -> Result<Vec<ContentSignal>> {
        Ok(self.process_report(videos, now).await?.signals)
    }

    /// Validates the whole batch up front; a malformed record aborts before any
    /// transcript source call is made.
    pub async fn process_report(
        &self,
        videos: &[VideoCandidate],
        now: DateTime<Utc>,
    ) -> Result<BatchReport> {
        for (index, video) in videos.iter().enumerate() {
            video
                .validate()
                .map_err(|reason| TrendscoutError::InvalidCandidate { index, reason })?;
        }

        info!(
            videos = videos.len(),
            concurrency = self.concurrency,
            source = self.resolver.source_name(),
            "Processing batch"
        );

        let results: Vec<(ContentSignal, VideoOutcome)> = stream::iter(videos)
            .map(|video| self.process_one(video, now))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut stats = BatchStats {
            total: videos.len(),
            ..BatchStats::default()
        };
        let mut signals = Vec::with_capacity(results.len());
        for (signal, outcome) in results {
            match outcome {
                VideoOutcome::Transcript { preferred } => {
                    stats.fetch_attempted += 1;
                    if !preferred {
                        stats.fallback_language += 1;
                    }
                }
                VideoOutcome::SkippedByPredictor => stats.skipped_by_predictor += 1,
                VideoOutcome::Deferred => stats.deferred += 1,
                VideoOutcome::FetchFailed { accepted } => {
                    stats.fetch_attempted += 1;
                    if accepted {
                        stats.fetch_failed_accepted += 1;
                    } else {
                        stats.fetch_failed_unexpected += 1;
                    }
                }
            }
            match signal {
                ContentSignal::Transcript(_) => stats.transcript_based += 1,
                ContentSignal::Metadata(_) => stats.metadata_based += 1,
            }
            signals.push(signal);
        }

        info!(
            total = stats.total,
            transcripts = stats.transcript_based,
            metadata = stats.metadata_based,
            deferred = stats.deferred,
            skipped = stats.skipped_by_predictor,
            "Batch processed"
        );

        Ok(BatchReport { signals, stats })
    }

    async fn process_one(
        &self,
        video: &VideoCandidate,
        now: DateTime<Utc>,
    ) -> (ContentSignal, VideoOutcome) {
        let potential = self.predictor.score(video);
        if !potential.likely_has_transcript {
            debug!(
                video_id = %video.id,
                score = potential.score,
                matched = ?potential.matched,
                "Transcript unlikely, using metadata"
            );
            return (self.metadata_signal(video), VideoOutcome::SkippedByPredictor);
        }

        let age_hours = video.age_hours(now);
        let decision = self.scheduler.decide(age_hours);
        if let RetryDecision::Defer { retry_after } = decision {
            info!(
                video_id = %video.id,
                age_hours,
                retry_after_mins = retry_after.as_secs() / 60,
                "Video too recent for a transcript, deferring to a later run"
            );
            return (self.metadata_signal(video), VideoOutcome::Deferred);
        }

        if let Some(transcript) = self.resolver.resolve(&video.id).await {
            let preferred = transcript.is_preferred_language;
            return (
                ContentSignal::Transcript(transcript),
                VideoOutcome::Transcript { preferred },
            );
        }

        let accepted = decision == RetryDecision::FetchNowAcceptFailure;
        if accepted {
            debug!(video_id = %video.id, age_hours, "No transcript yet, as expected for a young video");
        } else {
            warn!(
                video_id = %video.id,
                age_hours,
                "No transcript for a video old enough to have one, using metadata"
            );
        }
        (
            self.metadata_signal(video),
            VideoOutcome::FetchFailed { accepted },
        )
    }

    fn metadata_signal(&self, video: &VideoCandidate) -> ContentSignal {
        ContentSignal::Metadata(self.analyzer.analyze(video))
    }
}
