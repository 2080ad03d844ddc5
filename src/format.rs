//! Audio encoding parameters carried in a codec MIME type such as
//! `audio/L16;codec=pcm;rate=24000`.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static BIT_DEPTH_SUBTYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^L(\d+)$").expect("bit depth pattern is valid"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("invalid sample rate {value:?} in audio mime type")]
    InvalidRate { value: String },
    #[error("invalid bit depth {value} in audio mime type")]
    InvalidBitDepth { value: u16 },
    #[error("payload of {len} bytes does not fit in a WAV container")]
    PayloadTooLarge { len: usize },
    #[error("{channels} ch at {sample_rate} Hz and {bits_per_sample} bit overflows the WAV header")]
    HeaderOverflow {
        channels: u16,
        sample_rate: u32,
        bits_per_sample: u16,
    },
}

/// Shape of a raw PCM payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
        }
    }
}

impl AudioFormat {
    /// Parses `type/subtype;key=value;...`.
    ///
    /// A subtype of the form `L<bits>` sets the bit depth and a `rate`
    /// parameter sets the sample rate; everything else keeps the defaults.
    /// A `rate` that is not a positive integer, a bit depth that is not a
    /// whole number of bytes, or a combination whose byte rate does not fit
    /// the header is an error instead of a silently broken header.
    pub fn from_mime(mime: &str) -> Result<Self, FormatError> {
        let mut format = Self::default();
        let mut segments = mime.split(';');

        let essence = segments.next().unwrap_or_default().trim();
        if let Some((_, subtype)) = essence.split_once('/') {
            if let Some(caps) = BIT_DEPTH_SUBTYPE.captures(subtype.trim()) {
                // Digits that overflow keep the default depth.
                if let Ok(bits) = caps[1].parse::<u16>() {
                    if bits == 0 || bits % 8 != 0 {
                        return Err(FormatError::InvalidBitDepth { value: bits });
                    }
                    format.bits_per_sample = bits;
                }
            }
        }

        for param in segments {
            let Some((key, value)) = param.split_once('=') else {
                continue;
            };
            if !key.trim().eq_ignore_ascii_case("rate") {
                continue;
            }
            let value = value.trim();
            match value.parse::<u32>() {
                Ok(rate) if rate > 0 => format.sample_rate = rate,
                _ => {
                    return Err(FormatError::InvalidRate {
                        value: value.to_string(),
                    });
                }
            }
        }

        format.validate()?;
        Ok(format)
    }

    /// Checks that the derived header fields fit their widths.
    pub fn validate(&self) -> Result<(), FormatError> {
        match (self.block_align(), self.byte_rate()) {
            (Some(_), Some(_)) => Ok(()),
            _ => Err(FormatError::HeaderOverflow {
                channels: self.channels,
                sample_rate: self.sample_rate,
                bits_per_sample: self.bits_per_sample,
            }),
        }
    }

    pub fn block_align(&self) -> Option<u16> {
        let align = u32::from(self.channels) * u32::from(self.bits_per_sample) / 8;
        u16::try_from(align).ok()
    }

    pub fn byte_rate(&self) -> Option<u32> {
        let rate = u64::from(self.sample_rate)
            * u64::from(self.channels)
            * u64::from(self.bits_per_sample)
            / 8;
        u32::try_from(rate).ok()
    }
}
