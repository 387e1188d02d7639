//! Safetensors output for the downstream plotting/statistics toolkit.
//!
//! Epoched data is handed off as a single `.safetensors` file so the analysis
//! side can load it without this crate.
use anyhow::Result;
use std::path::Path;

use crate::epoch::{Epochs, PupilEpochs};
use crate::metadata::Metadata;

/// Minimal safetensors writer for F64, I32, and raw UTF-8 tensors.
pub struct StWriter {
    entries: Vec<(String, Vec<u8>, &'static str, Vec<usize>)>,
}

impl Default for StWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl StWriter {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn add_f64(&mut self, name: &str, data: &[f64], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "F64", shape.to_vec()));
    }

    pub fn add_i32(&mut self, name: &str, data: &[i32], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "I32", shape.to_vec()));
    }

    /// Store a string as a U8 tensor (newline-joined lists read back easily).
    pub fn add_utf8(&mut self, name: &str, text: &str) {
        let bytes = text.as_bytes().to_vec();
        let len = bytes.len();
        self.entries.push((name.to_string(), bytes, "U8", vec![len]));
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        use std::io::Write;
        let mut header_map = serde_json::Map::new();
        let mut offset: usize = 0;
        for (name, data, dtype, shape) in &self.entries {
            header_map.insert(
                name.clone(),
                serde_json::json!({
                    "dtype": dtype,
                    "shape": shape,
                    "data_offsets": [offset, offset + data.len()],
                }),
            );
            offset += data.len();
        }
        let hdr_bytes = serde_json::to_vec(&header_map)?;
        let pad = (8 - hdr_bytes.len() % 8) % 8;
        let padded: Vec<u8> = hdr_bytes
            .into_iter()
            .chain(std::iter::repeat(b' ').take(pad))
            .collect();
        let mut f = std::fs::File::create(path)?;
        f.write_all(&(padded.len() as u64).to_le_bytes())?;
        f.write_all(&padded)?;
        for (_, data, _, _) in &self.entries {
            f.write_all(data)?;
        }
        Ok(())
    }
}

/// Write trigger-locked EEG epochs: `epochs` `[E, C, T]`, the time axis,
/// sampling rate, surviving trigger indices, and channel names. When
/// `metadata` is given, each column is stored as a newline-joined
/// `meta:<name>` tensor; `kept` maps epoch rows back to metadata rows.
pub fn write_epochs(epochs: &Epochs, metadata: Option<&Metadata>, path: &Path) -> Result<()> {
    let mut w = StWriter::new();
    let shape = epochs.data.shape().to_vec();
    let flat: Vec<f64> = epochs.data.iter().copied().collect();
    w.add_f64("epochs", &flat, &shape);
    w.add_f64("times", &epochs.times(), &[shape[2]]);
    w.add_f64("sfreq", &[epochs.sfreq], &[1]);
    let kept: Vec<i32> = epochs.kept.iter().map(|&i| i as i32).collect();
    w.add_i32("kept", &kept, &[kept.len()]);
    w.add_utf8("ch_names", &epochs.ch_names.join("\n"));
    if let Some(md) = metadata {
        for col in &md.columns {
            if let Some(values) = md.column(col) {
                w.add_utf8(&format!("meta:{col}"), &values.join("\n"));
            }
        }
    }
    w.write(path)
}

/// Write pupil epochs: `pupil` `[E, T]` (proportion of baseline), time axis,
/// sampling rate, and surviving trigger indices.
pub fn write_pupil_epochs(epochs: &PupilEpochs, path: &Path) -> Result<()> {
    let mut w = StWriter::new();
    let shape = vec![epochs.data.nrows(), epochs.data.ncols()];
    let flat: Vec<f64> = epochs.data.iter().copied().collect();
    w.add_f64("pupil", &flat, &shape);
    w.add_f64("times", &epochs.times(), &[shape[1]]);
    w.add_f64("sfreq", &[epochs.sfreq], &[1]);
    let kept: Vec<i32> = epochs.kept.iter().map(|&i| i as i32).collect();
    w.add_i32("kept", &kept, &[kept.len()]);
    w.write(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_header(path: &Path) -> (serde_json::Value, Vec<u8>) {
        let bytes = std::fs::read(path).unwrap();
        let n = u64::from_le_bytes(bytes[..8].try_into().unwrap()) as usize;
        let header = serde_json::from_slice(&bytes[8..8 + n]).unwrap();
        (header, bytes[8 + n..].to_vec())
    }

    #[test]
    fn writer_layout_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.safetensors");
        let mut w = StWriter::new();
        w.add_f64("x", &[1.0, 2.0, 3.0], &[1, 3]);
        w.add_i32("n", &[3], &[1]);
        w.add_utf8("names", "Fz\nCz");
        w.write(&path).unwrap();

        let (header, data) = read_header(&path);
        assert_eq!(header["x"]["dtype"], "F64");
        assert_eq!(header["x"]["shape"], serde_json::json!([1, 3]));
        let offs = header["x"]["data_offsets"].as_array().unwrap();
        let (s, e) = (offs[0].as_u64().unwrap() as usize, offs[1].as_u64().unwrap() as usize);
        let second = f64::from_le_bytes(data[s + 8..s + 16].try_into().unwrap());
        approx::assert_abs_diff_eq!(second, 2.0, epsilon = 1e-12);
        assert_eq!(e - s, 24);
        let offs = header["names"]["data_offsets"].as_array().unwrap();
        let (s, e) = (offs[0].as_u64().unwrap() as usize, offs[1].as_u64().unwrap() as usize);
        assert_eq!(&data[s..e], b"Fz\nCz");
    }

    #[test]
    fn epochs_file_contains_expected_keys() {
        use crate::events::Event;
        use crate::raw::RawEeg;
        use ndarray::Array2;

        let raw = RawEeg::new(Array2::zeros((2, 1000)), 1000.0, vec!["Fz".into(), "Cz".into()])
            .unwrap();
        let events = vec![Event { sample: 500, code: 1 }];
        let ep = crate::epoch::epochs(&raw, &events, 1, -0.1, 0.2, false).unwrap();

        let md = Metadata::from_csv("condition\neasy\n").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("epochs.safetensors");
        write_epochs(&ep, Some(&md), &path).unwrap();
        let (header, data) = read_header(&path);
        for key in ["epochs", "times", "sfreq", "kept", "ch_names", "meta:condition"] {
            assert!(header.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(header["epochs"]["shape"], serde_json::json!([1, 2, 300]));
        let offs = header["meta:condition"]["data_offsets"].as_array().unwrap();
        let (s, e) = (offs[0].as_u64().unwrap() as usize, offs[1].as_u64().unwrap() as usize);
        assert_eq!(&data[s..e], b"easy");
    }
}
