use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{RedubError, Result};
use crate::fetch::{find_latest_file, find_latest_file_where, Downloader};
use crate::media::{MediaProcessorFactory, MediaProcessorTrait};
use crate::mix::{MixedTrack, MixerFactory};
use crate::segment::{SentenceGroup, SentenceGrouper};
use crate::subtitle::{read_srt, write_srt};
use crate::synth::{Dubber, SynthesisOutcome, Synthesizer, SynthesizerFactory};
use crate::translate::{TextTranslator, TranslationReport, TranslatorFactory};

/// What a full run should do
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Video to download first; `None` reuses the newest download
    pub url: Option<String>,
    /// Also burn the translated subtitles into a second video
    pub burn: bool,
}

/// Artifacts and reports of a full run
#[derive(Debug, Clone)]
pub struct ProcessSummary {
    pub video: PathBuf,
    pub translated_subtitles: PathBuf,
    pub dubbed_video: PathBuf,
    pub subtitled_video: Option<PathBuf>,
    pub translation: TranslationReport,
    pub dub: DubSummary,
}

/// Result of dubbing one subtitle file
#[derive(Debug, Clone)]
pub struct DubSummary {
    pub track: MixedTrack,
    /// 0-based cue positions, as in `SynthesisOutcome`
    pub dropped: Vec<usize>,
    pub skipped: Vec<usize>,
}

pub struct Workflow {
    config: Config,
    media: Arc<dyn MediaProcessorTrait>,
    translator: Option<Arc<dyn TextTranslator>>,
    synthesizer: Option<Arc<dyn Synthesizer>>,
    show_progress: bool,
}

impl Workflow {
    pub fn new(config: Config) -> Self {
        let media = MediaProcessorFactory::create_processor(config.media.clone());
        Self {
            config,
            media,
            translator: None,
            synthesizer: None,
            show_progress: true,
        }
    }

    /// Use this translation provider instead of the configured one
    pub fn with_translator(mut self, translator: Arc<dyn TextTranslator>) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Use this synthesizer instead of the configured one
    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn Synthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    pub fn with_media(mut self, media: Arc<dyn MediaProcessorTrait>) -> Self {
        self.media = media;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Verify ffmpeg answers before a long run; returns its version line
    pub async fn check_dependencies(&self) -> Result<String> {
        self.media.check_availability().await?;
        let version = self.media.get_version_info().await?;
        info!("Using {}", version);
        Ok(version)
    }

    /// Download, translate, dub, mux and optionally burn
    pub async fn process(&self, options: &ProcessOptions) -> Result<ProcessSummary> {
        let download_dir = &self.config.workspace.download_dir;
        let output_dir = &self.config.workspace.output_dir;
        fs::create_dir_all(download_dir).await?;
        fs::create_dir_all(output_dir).await?;

        self.check_dependencies().await?;

        if let Some(url) = &options.url {
            info!("Step 1: downloading video and subtitles");
            Downloader::new(self.config.fetch.clone()).download(url, download_dir).await?;
        } else {
            info!("Step 1: skipped, reusing the newest download");
        }

        let (video, subtitles) = self.locate_downloads()?;
        info!("Video file: {}", video.display());
        info!("Subtitle file: {}", subtitles.display());

        let base_name = file_stem(&video)?;
        let suffix = &self.config.workspace.target_suffix;

        info!("Step 2: translating subtitles");
        let translated = download_dir.join(format!("{}_{}.srt", base_name, suffix));
        let translation = self.translate_subtitles(&subtitles, &translated).await?;

        info!("Step 3: synthesizing and mixing the dub");
        let audio = download_dir.join(format!(
            "{}_{}.{}",
            base_name,
            suffix,
            self.config.mix.output_extension()
        ));
        let dub = self.dub(&translated, &audio).await?;

        info!("Step 4: muxing the dubbed video");
        let dubbed_video = output_dir.join(format!("{}_final.mp4", base_name));
        self.mux(&video, &dub.track.path, &dubbed_video).await?;

        let output_subtitles = output_dir.join(format!("{}_{}.srt", base_name, suffix));
        fs::copy(&translated, &output_subtitles).await?;

        let subtitled_video = if options.burn {
            info!("Step 5: burning subtitles");
            let burned = output_dir.join(format!("{}_subtitled.mp4", base_name));
            self.burn(&dubbed_video, &output_subtitles, &burned).await?;
            Some(burned)
        } else {
            None
        };

        info!("Processing complete");
        info!("Video file: {}", dubbed_video.display());
        info!("Subtitle file: {}", output_subtitles.display());

        Ok(ProcessSummary {
            video,
            translated_subtitles: output_subtitles,
            dubbed_video,
            subtitled_video,
            translation,
            dub,
        })
    }

    /// Newest video and newest source-language subtitle file in the download directory
    pub fn locate_downloads(&self) -> Result<(PathBuf, PathBuf)> {
        let download_dir = &self.config.workspace.download_dir;
        let translated_suffix = format!("_{}", self.config.workspace.target_suffix);

        let video = find_latest_file(download_dir, "mp4").ok_or_else(|| {
            RedubError::FileNotFound(format!("no .mp4 video in {}", download_dir.display()))
        })?;

        let subtitles = find_latest_file_where(download_dir, "srt", |path| {
            path.file_stem()
                .map(|stem| !stem.to_string_lossy().ends_with(&translated_suffix))
                .unwrap_or(false)
        })
        .ok_or_else(|| RedubError::FileNotFound(format!("no .srt subtitles in {}", download_dir.display())))?;

        Ok((video, subtitles))
    }

    /// Translate an SRT file into a new SRT file with the same timing
    pub async fn translate_subtitles(&self, input: &Path, output: &Path) -> Result<TranslationReport> {
        let mut cues = read_srt(input).await?;
        info!("Read {} cues from {}", cues.len(), input.display());

        let provider = match &self.translator {
            Some(translator) => Arc::clone(translator),
            None => TranslatorFactory::create_text_translator(&self.config.translate)?,
        };
        let translator = TranslatorFactory::create_translator(&self.config.translate, &self.config.segment, provider);
        let report = translator.translate_cues(&mut cues).await?;

        if !report.untranslated.is_empty() {
            warn!("{} cues kept their source text: {:?}", report.untranslated.len(), report.untranslated);
        }

        write_srt(&cues, output).await?;
        info!("Saved translated subtitles to {}", output.display());
        Ok(report)
    }

    /// Speak every cue of an SRT file and mix the clips into one track at `output`
    pub async fn dub(&self, subtitles: &Path, output: &Path) -> Result<DubSummary> {
        let cues = read_srt(subtitles).await?;

        let synthesizer = match &self.synthesizer {
            Some(synthesizer) => Arc::clone(synthesizer),
            None => SynthesizerFactory::create_synthesizer(&self.config.synth)?,
        };

        let clip_dir = output
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(format!("{}_clips", file_stem(output)?));

        let SynthesisOutcome { segments, dropped, skipped } = Dubber::new(synthesizer, &self.config.synth)
            .with_progress(self.show_progress)
            .synthesize_cues(&cues, &clip_dir)
            .await?;

        if !dropped.is_empty() {
            warn!("{} cues have no dub: {:?}", dropped.len(), dropped);
        }

        let mixer = MixerFactory::create_mixer(&self.config.mix, Arc::clone(&self.media));
        let track = mixer.mix(&segments, output).await?;

        Ok(DubSummary { track, dropped, skipped })
    }

    /// Replace the video's audio with the dubbed track
    pub async fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<()> {
        ensure_exists(video)?;
        ensure_exists(audio)?;
        create_parent(output).await?;
        self.media.mux_dub(video, audio, output).await
    }

    /// Burn subtitles into the picture
    pub async fn burn(&self, video: &Path, subtitles: &Path, output: &Path) -> Result<()> {
        ensure_exists(video)?;
        ensure_exists(subtitles)?;
        create_parent(output).await?;
        self.media.burn_subtitles(video, subtitles, output).await
    }

    /// Sentence grouping of an SRT file, as the sentence translator would see it
    pub async fn groups(&self, subtitles: &Path) -> Result<Vec<SentenceGroup>> {
        let cues = read_srt(subtitles).await?;
        let grouper = SentenceGrouper::new(self.config.segment.terminal_punctuation.chars());
        Ok(grouper.group(&cues))
    }
}

fn file_stem(path: &Path) -> Result<String> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .ok_or_else(|| RedubError::Config(format!("Invalid file name: {}", path.display())))
}

fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(RedubError::FileNotFound(path.display().to_string()))
    }
}

async fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MixBackend;
    use crate::translate::MockTextTranslator;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    const SOURCE_SRT: &str = "1\n00:00:00,000 --> 00:00:01,000\nHello there\n\n\
                              2\n00:00:01,000 --> 00:00:02,000\nmy friend.\n\n\
                              3\n00:00:02,500 --> 00:00:03,000\n\n\n\
                              4\n00:00:03,000 --> 00:00:04,000\nBye.\n";

    /// Speaks every text as 250 ms of a constant tone
    struct ToneSynthesizer;

    #[async_trait]
    impl Synthesizer for ToneSynthesizer {
        async fn synthesize(&self, text: &str, output: &Path) -> Result<()> {
            if text.contains("再见") {
                return Err(RedubError::Synthesis("voice unavailable".to_string()));
            }
            let spec = hound::WavSpec {
                channels: 1,
                sample_rate: 8_000,
                bits_per_sample: 16,
                sample_format: hound::SampleFormat::Int,
            };
            let mut writer = hound::WavWriter::create(output, spec)?;
            for _ in 0..2_000 {
                writer.write_sample(1_000i16)?;
            }
            writer.finalize()?;
            Ok(())
        }

        fn name(&self) -> &str {
            "tone"
        }
    }

    /// Reports a fixed ffmpeg version unless marked unavailable
    #[derive(Default)]
    struct VersionedMedia {
        unavailable: AtomicBool,
    }

    #[async_trait]
    impl MediaProcessorTrait for VersionedMedia {
        async fn mux_dub(&self, _: &Path, _: &Path, _: &Path) -> Result<()> {
            Ok(())
        }

        async fn burn_subtitles(&self, _: &Path, _: &Path, _: &Path) -> Result<()> {
            Ok(())
        }

        async fn mix_with_script(&self, _: &[PathBuf], _: &Path, _: &str, _: &str, _: &Path) -> Result<()> {
            Ok(())
        }

        async fn probe_duration_ms(&self, _: &Path) -> Result<u64> {
            Ok(0)
        }

        async fn check_availability(&self) -> Result<()> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(RedubError::Media("Media processor not found: ffmpeg".to_string()));
            }
            Ok(())
        }

        async fn get_version_info(&self) -> Result<String> {
            Ok("ffmpeg version 6.1.1".to_string())
        }
    }

    fn wav_config(temp: &TempDir) -> Config {
        let mut config = Config::default();
        config.workspace.download_dir = temp.path().join("downloads");
        config.workspace.output_dir = temp.path().join("output");
        config.translate.request_interval_ms = 0;
        config.mix.backend = MixBackend::Wav;
        config.synth.clip_extension = "wav".to_string();
        config
    }

    fn translating_mock() -> MockTextTranslator {
        let mut mock = MockTextTranslator::new();
        mock.expect_name().return_const("mock");
        mock.expect_translate().returning(|text| {
            Ok(match text {
                "Hello there my friend." => "你好，我的朋友。".to_string(),
                "Bye." => "再见。".to_string(),
                other => other.to_string(),
            })
        });
        mock
    }

    #[tokio::test]
    async fn translated_file_keeps_timing() {
        let temp = TempDir::new().unwrap();
        let source = temp.child("talk.srt");
        source.write_str(SOURCE_SRT).unwrap();
        let output = temp.path().join("talk_zh.srt");

        let workflow = Workflow::new(wav_config(&temp)).with_translator(Arc::new(translating_mock()));
        let report = workflow.translate_subtitles(source.path(), &output).await.unwrap();

        assert_eq!(report.translated_cues, 3);
        let cues = read_srt(&output).await.unwrap();
        assert_eq!(cues.len(), 4);
        assert_eq!(cues[0].text, "你好，");
        assert_eq!(cues[1].text, "我的朋友。");
        assert_eq!(cues[3].text, "再见。");
        assert_eq!(cues[3].start_ms, 3_000);
    }

    #[tokio::test]
    async fn dub_mixes_surviving_clips() {
        let temp = TempDir::new().unwrap();
        let translated = temp.child("talk_zh.srt");
        translated.write_str(
            "1\n00:00:00,000 --> 00:00:01,000\n你好，\n\n\
             2\n00:00:01,000 --> 00:00:02,000\n我的朋友。\n\n\
             3\n00:00:02,500 --> 00:00:03,000\n\n\n\
             4\n00:00:03,000 --> 00:00:04,000\n再见。\n",
        )
        .unwrap();
        let audio = temp.path().join("talk_zh.wav");

        let workflow = Workflow::new(wav_config(&temp))
            .with_synthesizer(Arc::new(ToneSynthesizer))
            .with_progress(false);
        let summary = workflow.dub(translated.path(), &audio).await.unwrap();

        // cue 2 starts at 1000 ms and speaks for 250 ms
        assert_eq!(summary.track.duration_ms, 1_250);
        assert_eq!(summary.track.segment_count, 2);
        assert_eq!(summary.dropped, vec![3]);
        assert_eq!(summary.skipped, vec![2]);
        assert!(temp.path().join("talk_zh_clips").join("0000.wav").exists());
    }

    #[tokio::test]
    async fn check_reports_the_ffmpeg_version() {
        let temp = TempDir::new().unwrap();
        let media = Arc::new(VersionedMedia::default());
        let workflow = Workflow::new(wav_config(&temp)).with_media(media.clone());

        assert_eq!(workflow.check_dependencies().await.unwrap(), "ffmpeg version 6.1.1");

        media.unavailable.store(true, Ordering::SeqCst);
        let err = workflow.check_dependencies().await.unwrap_err();
        assert!(matches!(err, RedubError::Media(_)));
    }

    #[tokio::test]
    async fn dub_without_any_clip_fails() {
        let temp = TempDir::new().unwrap();
        let translated = temp.child("bye.srt");
        translated.write_str("1\n00:00:00,000 --> 00:00:01,000\n再见。\n").unwrap();

        let workflow = Workflow::new(wav_config(&temp))
            .with_synthesizer(Arc::new(ToneSynthesizer))
            .with_progress(false);
        let err = workflow.dub(translated.path(), &temp.path().join("bye.wav")).await.unwrap_err();
        assert!(matches!(err, RedubError::NoSegments));
    }

    #[tokio::test]
    async fn groups_follow_sentence_ends() {
        let temp = TempDir::new().unwrap();
        let source = temp.child("talk.srt");
        source.write_str(SOURCE_SRT).unwrap();

        let groups = Workflow::new(wav_config(&temp)).groups(source.path()).await.unwrap();
        let spans: Vec<(usize, usize)> = groups.iter().map(|g| (g.start_idx, g.end_idx)).collect();
        assert_eq!(spans, vec![(0, 1), (2, 2), (3, 3)]);
        assert_eq!(groups[0].text, "Hello there my friend.");
    }

    #[test]
    fn translated_subtitles_are_not_picked_as_source() {
        let temp = TempDir::new().unwrap();
        let config = wav_config(&temp);
        let downloads = temp.child("downloads");
        downloads.create_dir_all().unwrap();
        downloads.child("talk.mp4").touch().unwrap();
        downloads.child("talk.en.srt").touch().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(20));
        downloads.child("talk_zh.srt").touch().unwrap();

        let (video, subtitles) = Workflow::new(config).locate_downloads().unwrap();
        assert!(video.ends_with("talk.mp4"));
        assert!(subtitles.ends_with("talk.en.srt"));
    }

    #[tokio::test]
    async fn mux_requires_inputs() {
        let temp = TempDir::new().unwrap();
        let workflow = Workflow::new(wav_config(&temp));
        let err = workflow
            .mux(&temp.path().join("missing.mp4"), &temp.path().join("a.mp3"), &temp.path().join("out.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, RedubError::FileNotFound(_)));
    }
}
