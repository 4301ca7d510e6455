//! Raw 16-bit PCM and WAV sample I/O.
//!
//! Raw format: signed 16-bit little-endian, mono, no header.
//!   encode: s16 = trunc(x * 32767), saturating at the i16 range
//!   decode: x = s16 / 32767
//!
//! RF output is not normalized, so values past +/-1 saturate on encode
//! instead of wrapping.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use log::{debug, warn};

use crate::error::{DpdError, Result};

const FULL_SCALE: f64 = i16::MAX as f64;

/// Quantize one sample. Truncates toward zero.
#[inline]
pub fn encode_sample(sample: f64) -> i16 {
    (sample * FULL_SCALE) as i16
}

#[inline]
pub fn decode_sample(value: i16) -> f64 {
    value as f64 / FULL_SCALE
}

/// Samples to little-endian s16 bytes.
pub fn encode(samples: &[f64]) -> Vec<u8> {
    samples
        .iter()
        .flat_map(|&s| encode_sample(s).to_le_bytes())
        .collect()
}

/// Little-endian s16 bytes to samples. A trailing odd byte is dropped.
pub fn decode(bytes: &[u8]) -> Vec<f64> {
    if bytes.len() % 2 != 0 {
        warn!("raw PCM has odd length {}; ignoring last byte", bytes.len());
    }
    bytes
        .chunks_exact(2)
        .map(|pair| decode_sample(i16::from_le_bytes([pair[0], pair[1]])))
        .collect()
}

/// Stream samples to a raw PCM file. Returns the number of samples written.
///
/// Takes an iterator so a streaming modulator can go straight to disk.
pub fn write_raw<I>(path: impl AsRef<Path>, samples: I) -> Result<usize>
where
    I: IntoIterator<Item = f64>,
{
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| DpdError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    let mut count = 0usize;
    for sample in samples {
        writer
            .write_all(&encode_sample(sample).to_le_bytes())
            .map_err(|e| DpdError::io(path, e))?;
        count += 1;
    }
    writer.flush().map_err(|e| DpdError::io(path, e))?;
    debug!("wrote {count} samples to {}", path.display());
    Ok(count)
}

pub fn read_raw(path: impl AsRef<Path>) -> Result<Vec<f64>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| DpdError::io(path, e))?;
    let mut bytes = Vec::new();
    BufReader::new(file)
        .read_to_end(&mut bytes)
        .map_err(|e| DpdError::io(path, e))?;
    Ok(decode(&bytes))
}

/// 16-bit mono WAV with the same quantization as the raw format.
pub fn write_wav(path: impl AsRef<Path>, samples: &[f64], sample_rate: u32) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path.as_ref(), spec)?;
    for &s in samples {
        writer.write_sample(encode_sample(s))?;
    }
    writer.finalize()?;
    Ok(())
}
