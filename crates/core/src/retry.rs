use std::time::Duration;

use crate::{config::RetryConfig, types::RetryDecision};

/// Maps a video's age onto a fetch decision. Stateless: a deferred video is
/// simply re-evaluated on the next run.
#[derive(Debug, Clone)]
pub struct RetryScheduler {
    config: RetryConfig,
}

impl RetryScheduler {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn decide(&self, video_age_hours: f64) -> RetryDecision {
        let age = if video_age_hours.is_finite() {
            video_age_hours.max(0.0)
        } else {
            0.0
        };

        if age < self.config.defer_below_hours {
            let remaining_hours = self.config.defer_below_hours - age;
            return RetryDecision::Defer {
                retry_after: Duration::try_from_secs_f64(remaining_hours * 3600.0)
                    .unwrap_or(Duration::MAX),
            };
        }

        if age < self.config.confident_after_hours {
            RetryDecision::FetchNowAcceptFailure
        } else {
            RetryDecision::FetchNow
        }
    }
}

impl Default for RetryScheduler {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_videos_are_deferred_until_two_hours() {
        let scheduler = RetryScheduler::default();
        assert_eq!(
            scheduler.decide(0.5),
            RetryDecision::Defer {
                retry_after: Duration::from_secs(90 * 60)
            }
        );
        assert_eq!(
            scheduler.decide(1.0),
            RetryDecision::Defer {
                retry_after: Duration::from_secs(3600)
            }
        );
    }

    #[test]
    fn band_edges() {
        let scheduler = RetryScheduler::default();
        assert_eq!(scheduler.decide(2.0), RetryDecision::FetchNowAcceptFailure);
        assert_eq!(scheduler.decide(5.99), RetryDecision::FetchNowAcceptFailure);
        assert_eq!(scheduler.decide(6.0), RetryDecision::FetchNow);
        assert_eq!(scheduler.decide(240.0), RetryDecision::FetchNow);
    }

    #[test]
    fn negative_or_nan_age_counts_as_brand_new() {
        let scheduler = RetryScheduler::default();
        let full_wait = RetryDecision::Defer {
            retry_after: Duration::from_secs(2 * 3600),
        };
        assert_eq!(scheduler.decide(-3.0), full_wait);
        assert_eq!(scheduler.decide(f64::NAN), full_wait);
        assert!(!scheduler.decide(0.0).should_fetch());
    }

    #[test]
    fn unbounded_thresholds_saturate_instead_of_panicking() {
        let scheduler = RetryScheduler::new(RetryConfig {
            defer_below_hours: f64::INFINITY,
            confident_after_hours: f64::INFINITY,
        });
        assert_eq!(
            scheduler.decide(1.0),
            RetryDecision::Defer {
                retry_after: Duration::MAX
            }
        );
    }
}
