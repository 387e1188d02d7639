//! BrainVision `.eeg` binary payload reader.
//!
//! The payload is multiplexed: samples are interleaved time-major,
//! `[t0c0, t0c1, …, t1c0, …]`, little-endian. Each value is scaled by its
//! channel's resolution and converted to volts:
//! ```text
//! data[c, t] = raw[t, c] × resolution[c] × unit_factor[c]
//! ```
use anyhow::{bail, Context, Result};
use ndarray::Array2;
use std::path::Path;

use super::header::{BinaryFormat, VhdrHeader};

/// Read the full `.eeg` payload as `[n_channels, n_times]` in volts.
pub fn read_eeg_data(path: &Path, header: &VhdrHeader) -> Result<Array2<f64>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("reading {}", path.display()))?;

    let n_ch = header.n_channels;
    let bps = header.binary_format.bytes_per_sample();
    let frame = n_ch * bps;
    if frame == 0 {
        bail!("header declares zero channels");
    }
    if bytes.len() % frame != 0 {
        bail!(
            "{}: {} bytes is not a whole number of {n_ch}-channel frames",
            path.display(),
            bytes.len()
        );
    }
    let n_t = bytes.len() / frame;
    let cals: Vec<f64> = header.channels.iter().map(|c| c.volts_per_bit()).collect();

    let mut out = Array2::<f64>::zeros((n_ch, n_t));
    match header.binary_format {
        BinaryFormat::Int16 => {
            for t in 0..n_t {
                for c in 0..n_ch {
                    let off = (t * n_ch + c) * 2;
                    let raw = i16::from_le_bytes([bytes[off], bytes[off + 1]]) as f64;
                    out[[c, t]] = raw * cals[c];
                }
            }
        }
        BinaryFormat::Float32 => {
            for t in 0..n_t {
                for c in 0..n_ch {
                    let off = (t * n_ch + c) * 4;
                    let raw = f32::from_le_bytes([
                        bytes[off],
                        bytes[off + 1],
                        bytes[off + 2],
                        bytes[off + 3],
                    ]) as f64;
                    out[[c, t]] = raw * cals[c];
                }
            }
        }
    }
    Ok(out)
}
