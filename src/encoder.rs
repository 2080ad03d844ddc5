use std::env;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("no ffmpeg executable found; install ffmpeg or set FFMPEG_PATH")]
    Unavailable,
    #[error("failed to run encoder {}: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("encoder exited with {status} while writing {}", .output.display())]
    Failed { status: ExitStatus, output: PathBuf },
}

/// Turns an uncompressed audio file into a compressed one.
#[async_trait]
pub trait Encoder {
    async fn encode(&self, input: &Path, output: &Path) -> Result<(), EncodeError>;
}

#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    program: Option<PathBuf>,
    bitrate: String,
}

impl FfmpegEncoder {
    pub fn new(program: Option<PathBuf>, bitrate: impl Into<String>) -> Self {
        Self {
            program,
            bitrate: bitrate.into(),
        }
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn encode(&self, input: &Path, output: &Path) -> Result<(), EncodeError> {
        let program = self.program.as_deref().ok_or(EncodeError::Unavailable)?;
        info!("Encoding {} to Opus at {}", input.display(), output.display());

        let status = Command::new(program)
            .args(["-y", "-loglevel", "error", "-i"])
            .arg(input)
            .args(["-c:a", "libopus", "-b:a", self.bitrate.as_str()])
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|source| EncodeError::Spawn {
                path: program.to_path_buf(),
                source,
            })?;

        if !status.success() {
            error!("ffmpeg failed to encode {}", input.display());
            return Err(EncodeError::Failed {
                status,
                output: output.to_path_buf(),
            });
        }
        Ok(())
    }
}

/// Finds the encoder binary: an explicit override when it exists, otherwise
/// the first `ffmpeg` on `PATH`.
pub fn locate_ffmpeg(override_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = override_path {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        debug!("Encoder override {} does not exist; searching PATH", path.display());
    }
    let path_var = env::var_os("PATH")?;
    find_in_dirs(env::split_paths(&path_var), ffmpeg_file_name())
}

fn ffmpeg_file_name() -> &'static str {
    if cfg!(windows) { "ffmpeg.exe" } else { "ffmpeg" }
}

fn find_in_dirs(dirs: impl IntoIterator<Item = PathBuf>, name: &str) -> Option<PathBuf> {
    dirs.into_iter()
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}
