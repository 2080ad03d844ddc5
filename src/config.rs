//! Settings resolved once at startup and handed to the pipeline.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info};

use crate::args::Args;
use crate::encoder::locate_ffmpeg;
use crate::tts::DEFAULT_BASE_URL;

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const BASE_URL_VAR: &str = "GEMINI_BASE_URL";
pub const FFMPEG_PATH_VAR: &str = "FFMPEG_PATH";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    MissingCredential(&'static str),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub voice: String,
    pub temperature: f32,
    /// `None` when no encoder could be found; reported when an encode is attempted.
    pub ffmpeg: Option<PathBuf>,
    pub bitrate: String,
    pub output: OutputSettings,
}

#[derive(Debug, Clone)]
pub struct OutputSettings {
    pub dir: PathBuf,
    pub name: String,
    pub keep_wav: bool,
}

impl Config {
    /// Reads `.env` (if any) and the process environment.
    pub fn from_env(args: &Args) -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(args, |key| std::env::var(key).ok())
    }

    pub fn from_lookup(
        args: &Args,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let api_key = lookup(API_KEY_VAR)
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingCredential(API_KEY_VAR))?;

        let base_url = lookup(BASE_URL_VAR).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let override_path = args
            .ffmpeg
            .clone()
            .or_else(|| lookup(FFMPEG_PATH_VAR).map(PathBuf::from));
        let ffmpeg = locate_ffmpeg(override_path.as_deref());
        match &ffmpeg {
            Some(path) => info!("Using encoder {}", path.display()),
            None => debug!("No encoder found at startup"),
        }

        Ok(Self {
            api_key,
            base_url,
            model: args.model.clone(),
            voice: args.voice.clone(),
            temperature: args.temperature,
            ffmpeg,
            bitrate: args.bitrate.clone(),
            output: OutputSettings {
                dir: args.out_dir.clone(),
                name: args.name.clone(),
                keep_wav: args.keep_wav,
            },
        })
    }
}
