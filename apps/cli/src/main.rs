use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use trendscout_core::{
    AcquisitionConfig, AcquisitionOrchestrator, DailyBrief, JsonFileVideoSource, Provider,
    TrendSummarizer, VideoSource, YoutubeVideoSource, YtDlpTranscriptSource, format_brief_readable,
    get_brief_path, get_config_path, save_brief,
};

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, Default, ValueEnum)]
enum CliProvider {
    #[default]
    Openai,
    Grok,
    Gemini,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Openai => Provider::Openai,
            CliProvider::Grok => Provider::Grok,
            CliProvider::Gemini => Provider::Gemini,
        }
    }
}

#[derive(Parser)]
#[command(name = "trendscout")]
#[command(
    about = "Collect trending videos, fetch transcripts where they exist, and analyze metadata where they don't"
)]
struct Cli {
    /// Read candidates from a JSON file instead of the YouTube trending chart
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Region code for the trending chart
    #[arg(short, long, default_value = "US")]
    region: String,

    /// YouTube category id ("0" for all categories)
    #[arg(long, default_value = "0")]
    category: String,

    /// Number of trending videos to fetch (1-50)
    #[arg(short = 'n', long, default_value_t = 25)]
    max_results: u32,

    /// Settings file. Defaults to the per-user config path when present.
    #[arg(short, long, env = "TRENDSCOUT_CONFIG")]
    config: Option<PathBuf>,

    /// Directory the daily brief is written to
    #[arg(short, long, default_value = "data")]
    output: PathBuf,

    /// Number of videos processed at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// Preferred transcript languages, most preferred first (e.g. "en,es,pt")
    #[arg(short, long, value_delimiter = ',')]
    langs: Vec<String>,

    /// Ask a language model for a short trend summary
    #[arg(short, long)]
    summarize: bool,

    /// AI provider for the trend summary
    #[arg(short, long, default_value = "openai")]
    provider: CliProvider,
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", style("Error:").red().bold(), message);
    std::process::exit(1);
}

async fn load_config(cli: &Cli) -> trendscout_core::Result<AcquisitionConfig> {
    let mut config = match &cli.config {
        Some(path) => AcquisitionConfig::load(path).await?,
        None => AcquisitionConfig::load_or_default(&get_config_path()).await?,
    };

    if let Some(concurrency) = cli.concurrency {
        config.concurrency = concurrency;
    }
    if !cli.langs.is_empty() {
        config.resolver.preferred_languages = cli
            .langs
            .iter()
            .map(|lang| lang.trim().to_string())
            .filter(|lang| !lang.is_empty())
            .collect();
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();

    // Validate configuration and credentials before any work
    let config = load_config(&cli).await.unwrap_or_else(|e| fail(e));

    let summarizer = if cli.summarize {
        let provider: Provider = cli.provider.clone().into();
        Some(TrendSummarizer::from_provider(&provider).unwrap_or_else(|e| fail(e)))
    } else {
        None
    };

    let video_source: Box<dyn VideoSource> = match &cli.input {
        Some(path) => Box::new(JsonFileVideoSource::new(path)),
        None => Box::new(
            YoutubeVideoSource::from_env()
                .unwrap_or_else(|e| fail(e))
                .with_region(&cli.region)
                .with_category(&cli.category)
                .with_max_results(cli.max_results),
        ),
    };

    let transcript_source = YtDlpTranscriptSource::new();
    let ytdlp_version = transcript_source
        .check_available()
        .await
        .unwrap_or_else(|e| fail(e));

    println!(
        "\n{}  {}\n",
        style("trendscout").cyan().bold(),
        style("Trend Brief").dim()
    );

    // Step 1: Collect candidates
    let spinner = create_spinner("Fetching videos...");
    let videos = video_source.fetch_candidates().await?;
    spinner.finish_with_message(format!(
        "{} Fetched {} videos {}",
        style("✓").green().bold(),
        videos.len(),
        style(format!("({})", video_source.name())).dim()
    ));

    // Step 2: Transcripts with metadata fallback
    let orchestrator = AcquisitionOrchestrator::new(config, Arc::new(transcript_source));
    let spinner = create_spinner(&format!(
        "Acquiring transcripts with yt-dlp {}...",
        ytdlp_version
    ));
    let now = Utc::now();
    let report = orchestrator.process_report(&videos, now).await?;
    spinner.finish_with_message(format!(
        "{} Transcripts: {}, metadata only: {} {}",
        style("✓").green().bold(),
        style(report.stats.transcript_based).yellow(),
        style(report.stats.metadata_based).yellow(),
        style(format!(
            "({} deferred, {} skipped)",
            report.stats.deferred, report.stats.skipped_by_predictor
        ))
        .dim()
    ));

    let mut brief = DailyBrief::new(videos, report, now);

    // Step 3: Optional trend summary
    if let Some(summarizer) = summarizer {
        let provider: Provider = cli.provider.clone().into();
        let spinner = create_spinner(&format!("Summarizing trends with {}...", provider.name()));
        match summarizer
            .summarize(&brief.videos, &brief.signals, &brief.aggregates)
            .await
        {
            Ok(summary) => {
                brief = brief.with_trend_summary(summary);
                spinner.finish_with_message(format!(
                    "{} Trend summary ({})",
                    style("✓").green().bold(),
                    provider.name()
                ));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Trend summary failed, writing brief without it");
                spinner.finish_with_message(format!(
                    "{} Trend summary skipped: {}",
                    style("!").yellow().bold(),
                    style(e).dim()
                ));
            }
        }
    }

    // Step 4: Persist
    let brief_path = get_brief_path(&cli.output);
    save_brief(&brief, &brief_path).await?;

    println!(
        "\n{} {}\n",
        style("Saved:").dim(),
        style(brief_path.display()).cyan()
    );
    println!("{}", style("─".repeat(60)).dim());

    // Human-readable output
    let readable = format_brief_readable(&brief);
    println!("{}", readable);

    Ok(())
}
