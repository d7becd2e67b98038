use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{RedubError, Result};

/// One timed subtitle entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    /// 1-based position as written in the subtitle file
    pub index: usize,
    pub start_ms: u64,
    pub end_ms: u64,
    /// Raw text, possibly spanning several lines
    pub text: String,
}

impl Cue {
    pub fn new<S: Into<String>>(index: usize, start_ms: u64, end_ms: u64, text: S) -> Self {
        Self {
            index,
            start_ms,
            end_ms,
            text: text.into(),
        }
    }

    /// Text on a single logical line: line breaks become spaces, outer whitespace is trimmed
    pub fn normalized_text(&self) -> String {
        normalize_text(&self.text)
    }
}

pub fn normalize_text(text: &str) -> String {
    text.replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .trim()
        .to_string()
}

/// Parse SRT content into cues
pub fn parse_srt(content: &str) -> Result<Vec<Cue>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let content = content.replace("\r\n", "\n");

    let mut cues = Vec::new();

    for (block_no, block) in split_blocks(&content).into_iter().enumerate() {
        let mut lines = block.iter();

        let first = lines.next().copied().unwrap_or_default();
        // The numeric counter is optional in practice; some writers omit it.
        let (index, timing_line) = if first.contains("-->") {
            (cues.len() + 1, first)
        } else {
            let index = first.trim().parse::<usize>().map_err(|_| {
                RedubError::Subtitle(format!("Block {}: invalid cue number '{}'", block_no + 1, first))
            })?;
            let timing = lines.next().copied().ok_or_else(|| {
                RedubError::Subtitle(format!("Block {}: missing timing line", block_no + 1))
            })?;
            (index, timing)
        };

        let (start_ms, end_ms) = parse_timing_line(timing_line)
            .map_err(|e| RedubError::Subtitle(format!("Block {}: {}", block_no + 1, e)))?;

        let text = lines.copied().collect::<Vec<_>>().join("\n");
        cues.push(Cue::new(index, start_ms, end_ms, text));
    }

    debug!("Parsed {} cues", cues.len());
    Ok(cues)
}

/// Serialize cues to SRT, renumbering from 1
pub fn format_srt(cues: &[Cue]) -> String {
    let mut srt_content = String::new();

    for (index, cue) in cues.iter().enumerate() {
        srt_content.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            index + 1,
            format_srt_time(cue.start_ms),
            format_srt_time(cue.end_ms),
            cue.text.trim()
        ));
    }

    srt_content
}

pub async fn read_srt<P: AsRef<Path>>(path: P) -> Result<Vec<Cue>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(RedubError::FileNotFound(path.display().to_string()));
    }

    info!("Reading subtitles: {}", path.display());
    let content = fs::read_to_string(path).await?;
    let cues = parse_srt(&content)?;
    info!("Loaded {} cues", cues.len());
    Ok(cues)
}

pub async fn write_srt<P: AsRef<Path>>(cues: &[Cue], path: P) -> Result<()> {
    let path = path.as_ref();
    info!("Writing SRT file: {}", path.display());

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, format_srt(cues)).await?;
    Ok(())
}

/// Format milliseconds to SRT time format (HH:MM:SS,mmm)
pub fn format_srt_time(total_milliseconds: u64) -> String {
    let hours = total_milliseconds / 3_600_000;
    let minutes = (total_milliseconds % 3_600_000) / 60_000;
    let secs = (total_milliseconds % 60_000) / 1_000;
    let millis = total_milliseconds % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

/// Parse `HH:MM:SS,mmm` (or `HH:MM:SS.mmm`) into milliseconds
pub fn parse_srt_time(value: &str) -> Result<u64> {
    let invalid = || RedubError::Subtitle(format!("invalid timestamp '{}'", value));

    let value = value.trim();
    let (clock, millis) = value.split_once([',', '.']).ok_or_else(invalid)?;

    let parts = clock
        .split(':')
        .map(|p| p.parse::<u64>().map_err(|_| invalid()))
        .collect::<Result<Vec<_>>>()?;
    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (*h, *m, *s),
        [m, s] => (0, *m, *s),
        _ => return Err(invalid()),
    };
    if minutes >= 60 || seconds >= 60 {
        return Err(invalid());
    }

    let millis_digits: String = millis.chars().take_while(|c| c.is_ascii_digit()).collect();
    if millis_digits.is_empty() || millis_digits.len() > 3 {
        return Err(invalid());
    }
    // ",5" means 500 ms
    let millis = format!("{:0<3}", millis_digits).parse::<u64>().map_err(|_| invalid())?;

    Ok(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
}

fn parse_timing_line(line: &str) -> Result<(u64, u64)> {
    let (start, rest) = line
        .split_once("-->")
        .ok_or_else(|| RedubError::Subtitle(format!("invalid timing line '{}'", line)))?;
    // Position hints such as "X1:40 X2:600" may follow the end time
    let end = rest.split_whitespace().next().unwrap_or_default();

    Ok((parse_srt_time(start)?, parse_srt_time(end)?))
}

fn split_blocks(content: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    const SAMPLE: &str = "1\n00:00:01,000 --> 00:00:02,500\nHello\n\n2\n00:00:02,500 --> 00:00:04,000\nworld,\nhow are you?\n\n";

    #[test]
    fn test_format_srt_time() {
        assert_eq!(format_srt_time(0), "00:00:00,000");
        assert_eq!(format_srt_time(65_123), "00:01:05,123");
        assert_eq!(format_srt_time(3_661_500), "01:01:01,500");
    }

    #[test]
    fn test_parse_srt_time() {
        assert_eq!(parse_srt_time("00:01:05,123").unwrap(), 65_123);
        assert_eq!(parse_srt_time("01:01:01.500").unwrap(), 3_661_500);
        assert_eq!(parse_srt_time("00:00:01,5").unwrap(), 1_500);
        assert!(parse_srt_time("00:61:00,000").is_err());
        assert!(parse_srt_time("garbage").is_err());
    }

    #[test]
    fn parses_multiline_cues() {
        let cues = parse_srt(SAMPLE).unwrap();
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0], Cue::new(1, 1_000, 2_500, "Hello"));
        assert_eq!(cues[1].text, "world,\nhow are you?");
        assert_eq!(cues[1].normalized_text(), "world, how are you?");
    }

    #[test]
    fn tolerates_bom_crlf_and_blank_runs() {
        let content = "\u{feff}1\r\n00:00:00,000 --> 00:00:01,000\r\nA\r\n\r\n\r\n\r\n2\r\n00:00:01,000 --> 00:00:02,000 X1:10 X2:20\r\nB\r\n";
        let cues = parse_srt(content).unwrap();
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[1].end_ms, 2_000);
        assert_eq!(cues[1].text, "B");
    }

    #[test]
    fn reports_malformed_block() {
        let err = parse_srt("1\nnot a timing line\ntext\n").unwrap_err();
        assert!(err.to_string().contains("Block 1"));
    }

    #[test]
    fn format_renumbers() {
        let cues = vec![Cue::new(7, 0, 1_000, "a"), Cue::new(9, 1_000, 2_000, "b ")];
        assert_eq!(
            format_srt(&cues),
            "1\n00:00:00,000 --> 00:00:01,000\na\n\n2\n00:00:01,000 --> 00:00:02,000\nb\n\n"
        );
    }

    #[tokio::test]
    async fn read_and_write_files() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("in.srt");
        input.write_str(SAMPLE).unwrap();

        let mut cues = read_srt(input.path()).await.unwrap();
        cues[0].text = "你好".to_string();

        let output = temp.child("nested/out.srt");
        write_srt(&cues, output.path()).await.unwrap();
        let written = std::fs::read_to_string(output.path()).unwrap();
        assert!(written.starts_with("1\n00:00:01,000 --> 00:00:02,500\n你好\n"));

        let missing = read_srt(temp.child("missing.srt").path()).await.unwrap_err();
        assert!(matches!(missing, RedubError::FileNotFound(_)));
    }

    #[test]
    fn blank_cues_survive_a_rewrite() {
        let temp = assert_fs::TempDir::new().unwrap();
        let path = temp.child("blank.srt");
        let cues = vec![
            Cue::new(1, 0, 1_000, "a"),
            Cue::new(2, 1_000, 2_000, ""),
            Cue::new(3, 2_000, 3_000, "c"),
        ];

        tokio_test::block_on(write_srt(&cues, path.path())).unwrap();
        let reread = tokio_test::block_on(read_srt(path.path())).unwrap();
        assert_eq!(reread, cues);
    }
}
