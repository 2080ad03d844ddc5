use std::path::{Path, PathBuf};

/// File extension for an already-encoded media type, or `None` when the
/// type (e.g. `audio/L16;rate=24000`) names raw samples.
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    let essence = mime.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    // WAV goes by several names and mime_guess maps only some of them.
    if matches!(
        essence.as_str(),
        "audio/wav" | "audio/x-wav" | "audio/wave" | "audio/vnd.wave"
    ) {
        return Some("wav");
    }
    let exts = mime_guess::get_mime_extensions_str(&essence)?;
    let subtype = essence.split_once('/').map(|(_, s)| s).unwrap_or_default();
    exts.iter()
        .find(|ext| **ext == subtype)
        .or_else(|| exts.first())
        .copied()
}

pub fn build_prompt(tone: &str, content: &str) -> String {
    format!("Read aloud in a {} tone:\n{}", tone, content)
}

/// `<dir>/<name>.<ext>` for the first audio part, `<dir>/<name>_<index>.<ext>` after that.
pub fn part_path(dir: &Path, name: &str, index: usize, ext: &str) -> PathBuf {
    if index == 0 {
        dir.join(format!("{}.{}", name, ext))
    } else {
        dir.join(format!("{}_{}.{}", name, index, ext))
    }
}
