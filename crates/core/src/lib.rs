//! Trendscout Core Library
//!
//! Transcript acquisition for trending videos with a metadata-only fallback:
//! predict which videos likely carry captions, defer the ones too young to
//! have them, resolve the best available language, and analyze metadata for
//! everything else.

pub mod aggregates;
pub mod brief;
pub mod config;
pub mod error;
pub mod format;
pub mod metadata;
pub mod orchestrator;
pub mod paths;
pub mod predictor;
pub mod resolver;
pub mod retry;
pub mod source;
pub mod summarize;
pub mod types;
pub mod youtube;
pub mod ytdlp;

// Re-export commonly used items at crate root
pub use aggregates::{CountEntry, MetadataAggregates, RankedVideo, virality_score};
pub use brief::{DailyBrief, load_brief, save_brief};
pub use config::{
    AcquisitionConfig, AnalyzerConfig, PredictorConfig, ResolverConfig, RetryConfig, WordList,
};
pub use error::{Result, TrendscoutError};
pub use format::{format_brief_readable, format_timestamp, parse_iso8601_duration};
pub use metadata::MetadataAnalyzer;
pub use orchestrator::{AcquisitionOrchestrator, BatchReport, BatchStats};
pub use paths::{get_brief_path, get_config_path, get_root_cache_dir};
pub use predictor::Predictor;
pub use resolver::LanguageFallbackResolver;
pub use retry::RetryScheduler;
pub use source::{FetchedTranscript, LanguageTrack, SourceError, TranscriptSource};
pub use summarize::{Provider, ProviderConfig, TrendSummarizer, TrendSummary};
pub use types::{
    ContentSignal, DurationOverride, EngagementStats, MetadataAnalysis, Provenance,
    RetryDecision, TagCluster, TranscriptPotentialScore, TranscriptResult, VideoCandidate,
};
pub use youtube::{
    JsonFileVideoSource, VideoSource, YoutubeVideoSource, extract_video_id, is_video_id,
};
pub use ytdlp::YtDlpTranscriptSource;
