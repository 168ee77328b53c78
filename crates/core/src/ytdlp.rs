use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::{fs, process::Command};

use crate::{
    error::{Result, TrendscoutError},
    format::vtt_to_text,
    paths::get_root_cache_dir,
    source::{FetchedTranscript, LanguageTrack, SourceError, TranscriptSource},
    youtube::watch_url,
};

const SUBTITLE_FORMATS: &[&str] = &["vtt", "ttml", "srv1", "srv2", "srv3", "json3", "srt"];

/// Transcript source backed by the `yt-dlp` executable.
///
/// Reported order: human-authored subtitles first, then the original-language
/// automatic captions (`-orig`), then the remaining automatic captions, each
/// group in yt-dlp's listing order.
pub struct YtDlpTranscriptSource {
    binary: PathBuf,
    work_dir: PathBuf,
}

impl YtDlpTranscriptSource {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("yt-dlp"),
            work_dir: get_root_cache_dir().join("subtitles"),
        }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Fails when the executable cannot be run at all, so a run can abort
    /// before treating every video as transcript-less.
    pub async fn check_available(&self) -> Result<String> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .await
            .map_err(|e| TrendscoutError::Config {
                reason: format!("cannot run {}: {}", self.binary.display(), e),
            })?;

        if !output.status.success() {
            return Err(TrendscoutError::Config {
                reason: format!(
                    "{} --version failed: {}",
                    self.binary.display(),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn run(&self, args: &[&str], video_id: &str) -> std::result::Result<String, SourceError> {
        let output = Command::new(&self.binary)
            .args(args)
            .arg("--no-warnings")
            .arg(watch_url(video_id))
            .output()
            .await
            .map_err(|e| SourceError::Transient(format!("failed to run yt-dlp: {e}")))?;

        if !output.status.success() {
            return Err(classify_stderr(&String::from_utf8_lossy(&output.stderr)));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl Default for YtDlpTranscriptSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptSource for YtDlpTranscriptSource {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn list_languages(
        &self,
        video_id: &str,
    ) -> std::result::Result<Vec<LanguageTrack>, SourceError> {
        let stdout = self.run(&["--list-subs", "--skip-download"], video_id).await?;
        Ok(parse_list_subs(&stdout))
    }

    async fn fetch(
        &self,
        video_id: &str,
        track: &LanguageTrack,
    ) -> std::result::Result<FetchedTranscript, SourceError> {
        fs::create_dir_all(&self.work_dir)
            .await
            .map_err(|e| SourceError::Transient(format!("cannot create work dir: {e}")))?;
        let scratch = tempfile::Builder::new()
            .prefix("subs-")
            .tempdir_in(&self.work_dir)
            .map_err(|e| SourceError::Transient(format!("cannot create temp dir: {e}")))?;

        let output_template = scratch.path().join("%(id)s.%(ext)s");
        let output_template = output_template.to_string_lossy();
        let write_flag = if track.is_generated {
            "--write-auto-sub"
        } else {
            "--write-sub"
        };

        self.run(
            &[
                "--skip-download",
                write_flag,
                "--sub-lang",
                &track.code,
                "--sub-format",
                "vtt",
                "-o",
                &output_template,
            ],
            video_id,
        )
        .await?;

        let Some(vtt_path) = find_vtt(scratch.path()).await else {
            return Err(SourceError::NotFound);
        };
        let vtt = fs::read_to_string(&vtt_path)
            .await
            .map_err(|e| SourceError::Transient(format!("cannot read captions: {e}")))?;

        let (text, duration_covered_secs) = vtt_to_text(&vtt);
        Ok(FetchedTranscript {
            text,
            duration_covered_secs,
        })
    }
}

async fn find_vtt(dir: &Path) -> Option<PathBuf> {
    let mut entries = fs::read_dir(dir).await.ok()?;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("vtt") {
            return Some(path);
        }
    }
    None
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    None,
    Automatic,
    Subtitles,
}

/// Parse `yt-dlp --list-subs` output into tracks.
pub fn parse_list_subs(stdout: &str) -> Vec<LanguageTrack> {
    let mut manual = Vec::new();
    let mut original_auto = Vec::new();
    let mut other_auto = Vec::new();
    let mut section = Section::None;

    for line in stdout.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') {
            section = if trimmed.contains("Available automatic captions") {
                Section::Automatic
            } else if trimmed.contains("Available subtitles") {
                Section::Subtitles
            } else {
                Section::None
            };
            continue;
        }
        if section == Section::None || trimmed.is_empty() || trimmed.contains(" has no ") {
            continue;
        }

        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        let Some(format_at) = tokens
            .iter()
            .position(|t| SUBTITLE_FORMATS.contains(&t.trim_end_matches(',')))
        else {
            continue;
        };
        if format_at == 0 || tokens[0] == "Language" {
            continue;
        }

        let track = LanguageTrack {
            code: tokens[0].to_string(),
            name: tokens[1..format_at].join(" "),
            is_generated: section == Section::Automatic,
        };
        match section {
            Section::Subtitles => manual.push(track),
            _ if track.code.ends_with("-orig") => original_auto.push(track),
            _ => other_auto.push(track),
        }
    }

    manual.into_iter().chain(original_auto).chain(other_auto).collect()
}

pub fn classify_stderr(stderr: &str) -> SourceError {
    let lower = stderr.to_lowercase();
    if lower.contains("429") || lower.contains("too many requests") {
        SourceError::RateLimited
    } else if lower.contains("subtitles are disabled") || lower.contains("captions are disabled") {
        SourceError::Disabled
    } else if lower.contains("video unavailable")
        || lower.contains("private video")
        || lower.contains("has been removed")
        || lower.contains("not available")
    {
        SourceError::Unavailable(stderr.trim().lines().last().unwrap_or_default().to_string())
    } else if lower.contains("no subtitles") || lower.contains("there are no subtitles") {
        SourceError::NotFound
    } else {
        SourceError::Transient(stderr.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST_OUTPUT: &str = "\
[youtube] Extracting URL: https://www.youtube.com/watch?v=abcdefghijk
[info] Available automatic captions for abcdefghijk:
Language Name                     Formats
af       Afrikaans                vtt, ttml, srv3, srv2, srv1, json3
de-orig  German (Original)        vtt, ttml, srv3, srv2, srv1, json3
en       English                  vtt, ttml, srv3, srv2, srv1, json3
[info] Available subtitles for abcdefghijk:
Language Name                     Formats
pt-BR    Portuguese (Brazil)      vtt, ttml, srv3, srv2, srv1, json3
";

    #[test]
    fn list_subs_orders_manual_then_original_then_auto() {
        let tracks = parse_list_subs(LIST_OUTPUT);
        let codes: Vec<&str> = tracks.iter().map(|t| t.code.as_str()).collect();
        assert_eq!(codes, vec!["pt-BR", "de-orig", "af", "en"]);
        assert!(!tracks[0].is_generated);
        assert_eq!(tracks[0].name, "Portuguese (Brazil)");
        assert!(tracks[1].is_generated);
    }

    #[test]
    fn list_subs_without_captions_is_empty() {
        let output = "\
[info] abcdefghijk has no automatic captions
[info] abcdefghijk has no subtitles
";
        assert!(parse_list_subs(output).is_empty());
    }

    #[test]
    fn stderr_classification() {
        assert_eq!(
            classify_stderr("ERROR: HTTP Error 429: Too Many Requests"),
            SourceError::RateLimited
        );
        assert!(matches!(
            classify_stderr("ERROR: [youtube] abc: Video unavailable"),
            SourceError::Unavailable(_)
        ));
        assert_eq!(
            classify_stderr("ERROR: Subtitles are disabled for this video"),
            SourceError::Disabled
        );
        assert!(matches!(
            classify_stderr("ERROR: unable to download webpage: connection reset"),
            SourceError::Transient(_)
        ));
    }
}
