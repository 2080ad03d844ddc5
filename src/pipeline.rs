use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::audio::clip_duration;
use crate::config::OutputSettings;
use crate::encoder::Encoder;
use crate::tts::{ResponsePart, SpeechGenerator};
use crate::utils::{build_prompt, extension_for_mime, part_path};
use crate::wav::pcm_to_wav;

pub const DEFAULT_TONE: &str = "clear and friendly";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("nothing to say: content is empty")]
    EmptyContent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechRequest {
    content: String,
    tone: String,
}

impl SpeechRequest {
    pub fn new(content: &str, tone: Option<&str>) -> Result<Self, PipelineError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(PipelineError::EmptyContent);
        }
        let tone = tone
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TONE);
        Ok(Self {
            content: content.to_string(),
            tone: tone.to_string(),
        })
    }

    pub fn prompt(&self) -> String {
        build_prompt(&self.tone, &self.content)
    }
}

/// Generates speech for `request` and writes the deliverables, returning their paths.
pub async fn run<G, E>(
    request: &SpeechRequest,
    output: &OutputSettings,
    generator: &G,
    encoder: &E,
) -> anyhow::Result<Vec<PathBuf>>
where
    G: SpeechGenerator + Sync,
    E: Encoder + Sync,
{
    let parts = generator
        .generate(&request.prompt())
        .await
        .context("speech generation failed")?;
    info!("Received {} response part(s)", parts.len());

    let mut written = Vec::new();
    let mut audio_index = 0;
    for part in parts {
        match part {
            ResponsePart::Text(text) => info!("Model says: {}", text),
            ResponsePart::Audio { mime_type, data } => {
                let path = save_audio(output, audio_index, &mime_type, &data, encoder).await?;
                written.push(path);
                audio_index += 1;
            }
        }
    }

    if written.is_empty() {
        warn!("Response contained no audio");
    }
    Ok(written)
}

async fn save_audio<E>(
    output: &OutputSettings,
    index: usize,
    mime_type: &str,
    data: &[u8],
    encoder: &E,
) -> anyhow::Result<PathBuf>
where
    E: Encoder + Sync,
{
    if let Some(ext) = extension_for_mime(mime_type) {
        let path = part_path(&output.dir, &output.name, index, ext);
        fs::write(&path, data).with_context(|| format!("failed to write {}", path.display()))?;
        info!("Wrote {} audio to {}", mime_type, path.display());
        return Ok(path);
    }

    let (format, wav) = pcm_to_wav(mime_type, data)
        .with_context(|| format!("cannot convert {} payload to WAV", mime_type))?;
    let wav_path = part_path(&output.dir, &output.name, index, "wav");
    fs::write(&wav_path, &wav)
        .with_context(|| format!("failed to write {}", wav_path.display()))?;
    info!(
        "Wrote {} ({} Hz, {} bit, {} ch)",
        wav_path.display(),
        format.sample_rate,
        format.bits_per_sample,
        format.channels
    );
    match clip_duration(&wav_path) {
        Ok(dur) => info!("Clip duration: {:.2} seconds", dur.as_secs_f64()),
        Err(e) => warn!("Could not read back {}: {:?}", wav_path.display(), e),
    }

    let opus_path = part_path(&output.dir, &output.name, index, "opus");
    if let Err(e) = encoder.encode(&wav_path, &opus_path).await {
        error!("Encoding failed; leaving {} in place", wav_path.display());
        return Err(e.into());
    }
    info!("Opus written to {}", opus_path.display());

    if !output.keep_wav {
        fs::remove_file(&wav_path)
            .with_context(|| format!("failed to remove {}", wav_path.display()))?;
    }
    Ok(opus_path)
}
