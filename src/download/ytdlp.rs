use std::{
    path::{Path, PathBuf},
    process::Stdio,
};

use tokio::process::Command;

use crate::download::{Downloader, MaterializeError};

pub const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// Drives `yt-dlp` to fetch a single track and extract its audio.
#[derive(Debug, Clone)]
pub struct YtDlpDownloader {
    bin: String,
    audio_format: String,
    audio_quality: String,
    rate_limit: Option<String>,
}

impl YtDlpDownloader {
    pub fn new(
        bin: impl Into<String>,
        audio_format: impl Into<String>,
        audio_quality: impl Into<String>,
        rate_limit: Option<String>,
    ) -> Self {
        Self {
            bin: bin.into(),
            audio_format: audio_format.into(),
            audio_quality: audio_quality.into(),
            rate_limit,
        }
    }

    pub fn source_url(external_id: &str) -> String {
        format!("{}{}", WATCH_URL, external_id)
    }

    fn command(&self, external_id: &str, output_stem: &Path) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.arg("--extract-audio")
            .arg("--audio-format")
            .arg(&self.audio_format)
            .arg("--audio-quality")
            .arg(&self.audio_quality)
            .arg("--format")
            .arg("bestaudio/best")
            .arg("--no-playlist")
            .arg("--no-progress")
            .arg("--no-warnings")
            .arg("--output")
            .arg(format!("{}.%(ext)s", output_stem.display()))
            .arg("--print")
            .arg("after_move:filepath");

        if let Some(rate) = &self.rate_limit {
            cmd.arg("--limit-rate").arg(rate);
        }

        cmd.arg(Self::source_url(external_id))
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

impl Downloader for YtDlpDownloader {
    async fn download(
        &self,
        external_id: &str,
        output_stem: &Path,
    ) -> Result<PathBuf, MaterializeError> {
        let output = self
            .command(external_id, output_stem)
            .output()
            .await
            .map_err(|e| MaterializeError::Download(format!("cannot run {}: {}", self.bin, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("no error output")
                .trim()
                .to_string();
            return Err(MaterializeError::Download(format!(
                "{} exited with {}: {}",
                self.bin, output.status, reason
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let printed = stdout
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(PathBuf::from);

        match printed {
            Some(path) if path.is_file() => Ok(path),
            _ => {
                // The stem may contain dots, so append rather than `with_extension`.
                let mut expected = output_stem.as_os_str().to_os_string();
                expected.push(".");
                expected.push(&self.audio_format);
                let expected = PathBuf::from(expected);
                if expected.is_file() {
                    Ok(expected)
                } else {
                    Err(MaterializeError::Download(format!(
                        "{} reported success but no file was written for {}",
                        self.bin, external_id
                    )))
                }
            }
        }
    }
}
