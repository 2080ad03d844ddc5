use std::path::PathBuf;

use clap::Parser;

use crate::tts::{DEFAULT_MODEL, DEFAULT_VOICE};

/// Speak a short text with a Gemini voice and save it as Opus.
#[derive(Parser, Debug)]
pub struct Args {
    /// Text to speak
    pub content: String,

    /// Tone of voice, e.g. "excited" or "calm and slow"
    pub tone: Option<String>,

    #[clap(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    #[clap(long, default_value = DEFAULT_VOICE)]
    pub voice: String,

    #[clap(long, default_value_t = 1.0)]
    pub temperature: f32,

    /// Output file stem
    #[clap(long, default_value = "output")]
    pub name: String,

    #[clap(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Opus bitrate passed to ffmpeg
    #[clap(long, default_value = "64k")]
    pub bitrate: String,

    /// Keep the intermediate WAV after encoding
    #[clap(long)]
    pub keep_wav: bool,

    /// Path to the ffmpeg executable (overrides FFMPEG_PATH)
    #[clap(long)]
    pub ffmpeg: Option<PathBuf>,
}
