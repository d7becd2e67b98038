use thiserror::Error;

#[derive(Error, Debug)]
pub enum RedubError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Subtitle error: {0}")]
    Subtitle(String),

    #[error("Sentence group spans {expected} cues but {actual} texts were supplied")]
    GroupMismatch { expected: usize, actual: usize },

    #[error("Cannot split a translation across an empty group")]
    EmptyGroup,

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Speech synthesis error: {0}")]
    Synthesis(String),

    #[error("Speech synthesis timed out after {0}s")]
    SynthesisTimeout(u64),

    #[error("No audio segments to mix")]
    NoSegments,

    #[error("Mixing error: {0}")]
    Mix(String),

    #[error("Media processing error: {0}")]
    Media(String),

    #[error("Download error: {0}")]
    Download(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

pub type Result<T> = std::result::Result<T, RedubError>;
