//! BrainVision `.vhdr` header parsing.
//!
//! The header is a small INI-style text file:
//! ```text
//! Brain Vision Data Exchange Header File Version 1.0
//! [Common Infos]
//! DataFile=sub-01_task-xx_eeg.eeg
//! MarkerFile=sub-01_task-xx_eeg.vmrk
//! DataFormat=BINARY
//! DataOrientation=MULTIPLEXED
//! NumberOfChannels=32
//! SamplingInterval=1000
//! [Binary Infos]
//! BinaryFormat=INT_16
//! [Channel Infos]
//! Ch1=Fp1,,0.1,µV
//! ```
//! `SamplingInterval` is in microseconds; per-channel `resolution` is the
//! scale factor from raw binary values to the stated unit.
use anyhow::{bail, Context, Result};

/// On-disk sample encoding of the `.eeg` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryFormat {
    Int16,
    Float32,
}

impl BinaryFormat {
    #[inline]
    pub fn bytes_per_sample(self) -> usize {
        match self {
            BinaryFormat::Int16 => 2,
            BinaryFormat::Float32 => 4,
        }
    }
}

/// One `ChN=` line from `[Channel Infos]`.
#[derive(Debug, Clone)]
pub struct ChannelSpec {
    pub name: String,
    /// Raw-value → unit scale factor. Empty field in the header means 1.
    pub resolution: f64,
    /// Unit string as written (`µV`, `mV`, …). Empty means µV.
    pub unit: String,
}

impl ChannelSpec {
    /// Scale from one raw sample to **volts**: `resolution × unit factor`.
    pub fn volts_per_bit(&self) -> f64 {
        let unit_factor = match self.unit.as_str() {
            "" | "µV" | "uV" => 1e-6,
            "mV" => 1e-3,
            "V" => 1.0,
            // Unknown unit: keep the value as written.
            _ => 1.0,
        };
        self.resolution * unit_factor
    }
}

/// Parsed `.vhdr` contents.
#[derive(Debug, Clone)]
pub struct VhdrHeader {
    pub data_file: String,
    pub marker_file: String,
    pub n_channels: usize,
    /// Sampling interval in microseconds.
    pub sampling_interval_us: f64,
    pub binary_format: BinaryFormat,
    pub channels: Vec<ChannelSpec>,
}

impl VhdrHeader {
    /// Sampling rate in Hz.
    #[inline]
    pub fn sfreq(&self) -> f64 {
        1e6 / self.sampling_interval_us
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut section = String::new();
        let mut data_file = None;
        let mut marker_file = None;
        let mut n_channels = None;
        let mut sampling_interval_us = None;
        let mut binary_format = None;
        let mut channels: Vec<(usize, ChannelSpec)> = Vec::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }
            if line.starts_with('[') && line.ends_with(']') {
                section = line[1..line.len() - 1].to_string();
                continue;
            }
            let Some((key, value)) = line.split_once('=') else { continue };
            let (key, value) = (key.trim(), value.trim());

            match section.as_str() {
                "Common Infos" => match key {
                    "DataFile" => data_file = Some(value.to_string()),
                    "MarkerFile" => marker_file = Some(value.to_string()),
                    "NumberOfChannels" => {
                        n_channels = Some(value.parse().context("NumberOfChannels")?)
                    }
                    "SamplingInterval" => {
                        sampling_interval_us = Some(value.parse().context("SamplingInterval")?)
                    }
                    "DataFormat" if !value.eq_ignore_ascii_case("BINARY") => {
                        bail!("unsupported DataFormat {value:?} (only BINARY)");
                    }
                    "DataOrientation" if !value.eq_ignore_ascii_case("MULTIPLEXED") => {
                        bail!("unsupported DataOrientation {value:?} (only MULTIPLEXED)");
                    }
                    _ => {}
                },
                "Binary Infos" => {
                    if key == "BinaryFormat" {
                        binary_format = Some(match value {
                            "INT_16" => BinaryFormat::Int16,
                            "IEEE_FLOAT_32" => BinaryFormat::Float32,
                            other => bail!("unsupported BinaryFormat {other:?}"),
                        });
                    }
                }
                "Channel Infos" => {
                    if let Some(idx) = key.strip_prefix("Ch") {
                        let idx: usize = idx.parse().with_context(|| format!("channel key {key}"))?;
                        let mut fields = value.split(',');
                        let name = fields.next().unwrap_or("").to_string();
                        let _ref = fields.next(); // reference channel, unused
                        let resolution = match fields.next().map(str::trim) {
                            None | Some("") => 1.0,
                            Some(r) => r.parse().with_context(|| format!("resolution of {key}"))?,
                        };
                        let unit = fields.next().unwrap_or("").trim().to_string();
                        channels.push((idx, ChannelSpec { name, resolution, unit }));
                    }
                }
                _ => {}
            }
        }

        let n_channels: usize = n_channels.context("missing NumberOfChannels")?;
        channels.sort_by_key(|(idx, _)| *idx);
        let channels: Vec<ChannelSpec> = channels.into_iter().map(|(_, c)| c).collect();
        if channels.len() != n_channels {
            bail!(
                "header declares {n_channels} channels but lists {}",
                channels.len()
            );
        }

        Ok(VhdrHeader {
            data_file: data_file.context("missing DataFile")?,
            marker_file: marker_file.context("missing MarkerFile")?,
            n_channels,
            sampling_interval_us: sampling_interval_us.context("missing SamplingInterval")?,
            binary_format: binary_format.context("missing BinaryFormat")?,
            channels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VHDR: &str = "\
Brain Vision Data Exchange Header File Version 1.0
; comment line
[Common Infos]
DataFile=test.eeg
MarkerFile=test.vmrk
DataFormat=BINARY
DataOrientation=MULTIPLEXED
NumberOfChannels=3
SamplingInterval=1000

[Binary Infos]
BinaryFormat=INT_16

[Channel Infos]
Ch1=Fp1,,0.1,µV
Ch2=Cz,,0.1,µV
Ch3=Oz,,,
";

    #[test]
    fn parse_minimal_header() {
        let hdr = VhdrHeader::parse(VHDR).unwrap();
        assert_eq!(hdr.data_file, "test.eeg");
        assert_eq!(hdr.marker_file, "test.vmrk");
        assert_eq!(hdr.n_channels, 3);
        approx::assert_abs_diff_eq!(hdr.sfreq(), 1000.0, epsilon = 1e-9);
        assert_eq!(hdr.binary_format, BinaryFormat::Int16);
        assert_eq!(hdr.channels[0].name, "Fp1");
        // 0.1 µV per bit.
        approx::assert_abs_diff_eq!(hdr.channels[0].volts_per_bit(), 1e-7, epsilon = 1e-15);
        // Empty resolution/unit defaults to 1 µV per bit.
        approx::assert_abs_diff_eq!(hdr.channels[2].volts_per_bit(), 1e-6, epsilon = 1e-15);
    }

    #[test]
    fn channel_count_mismatch_is_error() {
        let bad = VHDR.replace("NumberOfChannels=3", "NumberOfChannels=4");
        assert!(VhdrHeader::parse(&bad).is_err());
    }

    #[test]
    fn vectorized_orientation_rejected() {
        let bad = VHDR.replace("MULTIPLEXED", "VECTORIZED");
        assert!(VhdrHeader::parse(&bad).is_err());
    }
}
