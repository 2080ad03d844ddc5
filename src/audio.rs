use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use hound::WavReader;

/// Playback length of a WAV file, from its header and sample count.
pub fn clip_duration(path: &Path) -> anyhow::Result<Duration> {
    let reader =
        WavReader::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let spec = reader.spec();
    if spec.channels == 0 || spec.sample_rate == 0 {
        anyhow::bail!("{} has an empty format chunk", path.display());
    }
    let frames = u64::from(reader.len()) / u64::from(spec.channels);
    Ok(Duration::from_secs_f64(
        frames as f64 / f64::from(spec.sample_rate),
    ))
}
