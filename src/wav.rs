use crate::format::{AudioFormat, FormatError};

pub const HEADER_LEN: usize = 44;

/// Canonical 44-byte RIFF/WAVE header for a PCM payload of `data_len` bytes.
///
/// Fails only when the format's byte rate or block align do not fit their
/// header fields, or `data_len` leaves no room for the RIFF chunk size.
pub fn wav_header(data_len: u32, format: &AudioFormat) -> Result<[u8; HEADER_LEN], FormatError> {
    let overflow = || FormatError::HeaderOverflow {
        channels: format.channels,
        sample_rate: format.sample_rate,
        bits_per_sample: format.bits_per_sample,
    };
    let byte_rate = format.byte_rate().ok_or_else(overflow)?;
    let block_align = format.block_align().ok_or_else(overflow)?;
    let chunk_size = data_len.checked_add(36).ok_or(FormatError::PayloadTooLarge {
        len: data_len as usize,
    })?;

    let mut header = [0u8; HEADER_LEN];
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&chunk_size.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes()); // PCM
    header[22..24].copy_from_slice(&format.channels.to_le_bytes());
    header[24..28].copy_from_slice(&format.sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&format.bits_per_sample.to_le_bytes());

    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_len.to_le_bytes());
    Ok(header)
}

/// Header followed by the untouched payload.
pub fn assemble_wav(format: &AudioFormat, pcm: &[u8]) -> Result<Vec<u8>, FormatError> {
    let data_len = u32::try_from(pcm.len())
        .map_err(|_| FormatError::PayloadTooLarge { len: pcm.len() })?;
    let header = wav_header(data_len, format)?;

    let mut wav = Vec::with_capacity(HEADER_LEN + pcm.len());
    wav.extend_from_slice(&header);
    wav.extend_from_slice(pcm);
    Ok(wav)
}

/// Wraps raw PCM described by `mime` (e.g. `audio/L16;rate=24000`) in a WAV container.
pub fn pcm_to_wav(mime: &str, pcm: &[u8]) -> Result<(AudioFormat, Vec<u8>), FormatError> {
    let format = AudioFormat::from_mime(mime)?;
    let wav = assemble_wav(&format, pcm)?;
    Ok((format, wav))
}
