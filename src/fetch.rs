use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::info;
use walkdir::WalkDir;

use crate::config::FetchConfig;
use crate::error::{RedubError, Result};
use crate::media::MediaCommand;

/// Downloads a video and its English subtitles with yt-dlp
pub struct Downloader {
    config: FetchConfig,
}

impl Downloader {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }

    pub fn build_command(&self, url: &str, download_dir: &Path) -> MediaCommand {
        let mut cmd = MediaCommand::new(&self.config.binary_path, "Video download");
        if !self.config.browser.is_empty() {
            cmd = cmd.arg("--cookies-from-browser").arg(&self.config.browser);
        }

        let template = download_dir.join("%(title)s.%(ext)s");
        cmd.arg("--format").arg(&self.config.format)
            .arg("--merge-output-format").arg("mp4")
            .arg("--write-sub")
            .arg("--write-auto-sub")
            .arg("--sub-lang").arg(&self.config.sub_langs)
            .arg("--sub-format").arg("srt/vtt/best")
            .arg("--convert-subs").arg("srt")
            .arg("--output").arg(template.to_string_lossy().to_string())
            .arg("--restrict-filenames")
            .arg("--no-playlist")
            .arg(url)
    }

    /// Download into `download_dir`
    pub async fn download(&self, url: &str, download_dir: &Path) -> Result<()> {
        tokio::fs::create_dir_all(download_dir).await?;
        info!("Downloading {} into {}", url, download_dir.display());

        self.build_command(url, download_dir)
            .execute()
            .await
            .map_err(|e| RedubError::Download(e.to_string()))
    }
}

/// Newest file in `dir` (not recursive) with the given extension
pub fn find_latest_file(dir: &Path, extension: &str) -> Option<PathBuf> {
    find_latest_file_where(dir, extension, |_| true)
}

/// Like [`find_latest_file`], only considering paths accepted by `keep`
pub fn find_latest_file_where<F>(dir: &Path, extension: &str, keep: F) -> Option<PathBuf>
where
    F: Fn(&Path) -> bool,
{
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        })
        .filter(|entry| keep(entry.path()))
        .map(|entry| {
            let modified = entry
                .metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, entry.into_path())
        })
        .max_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)))
        .map(|(_, path)| path)
}
