mod args;
mod audio;
mod config;
mod encoder;
mod format;
mod pipeline;
mod tts;
mod utils;
mod wav;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::args::Args;
use crate::config::Config;
use crate::encoder::FfmpegEncoder;
use crate::pipeline::SpeechRequest;
use crate::tts::GeminiClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    let request = SpeechRequest::new(&args.content, args.tone.as_deref())?;
    let config = Config::from_env(&args)?;

    let client = GeminiClient::new(
        config.api_key.clone(),
        config.model.clone(),
        config.voice.clone(),
        config.temperature,
    )
    .with_base_url(&config.base_url);
    let encoder = FfmpegEncoder::new(config.ffmpeg.clone(), &config.bitrate);

    let written = pipeline::run(&request, &config.output, &client, &encoder).await?;
    for path in &written {
        info!("Saved {}", path.display());
    }
    info!("Process complete.");
    Ok(())
}
