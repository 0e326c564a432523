use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Could not read config file {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Config file {path} is not valid JSON")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid tuning value: {0}")]
    InvalidTuning(&'static str),
    #[error("There was a problem opening the audio output")]
    AudioStream(#[from] rodio::StreamError),
    #[error(transparent)]
    IO(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GameError>;
