//! Native BrainVision reader (`.vhdr` + `.vmrk` + `.eeg`).
//!
//! # Algorithm
//! 1. Parse the `.vhdr` header (channel table, binary format, sampling rate).
//! 2. Resolve the data and marker files relative to the header.
//! 3. Parse the marker table.
//! 4. Read and calibrate the binary payload into a [`RawEeg`].
pub mod data;
pub mod header;
pub mod markers;

pub use data::read_eeg_data;
pub use header::{BinaryFormat, ChannelSpec, VhdrHeader};
pub use markers::{parse_vmrk, Marker};

use anyhow::{Context, Result};
use std::path::Path;

use crate::events::Event;
use crate::raw::RawEeg;

/// Open a BrainVision recording given its `.vhdr` path.
///
/// Returns the continuous recording plus the full marker table (stimulus and
/// non-stimulus markers alike).
pub fn read_raw_brainvision(vhdr_path: &Path) -> Result<(RawEeg, Vec<Marker>)> {
    let text = read_text(vhdr_path)?;
    let header = VhdrHeader::parse(&text)
        .with_context(|| format!("parsing {}", vhdr_path.display()))?;

    let dir = vhdr_path.parent().unwrap_or_else(|| Path::new("."));
    let marker_path = dir.join(&header.marker_file);
    let data_path = dir.join(&header.data_file);

    let markers = parse_vmrk(&read_text(&marker_path)?)
        .with_context(|| format!("parsing {}", marker_path.display()))?;

    let data = read_eeg_data(&data_path, &header)?;
    let ch_names = header.channels.iter().map(|c| c.name.clone()).collect();
    let raw = RawEeg::new(data, header.sfreq(), ch_names)?;
    log::debug!(
        "brainvision: {} ch x {} samples @ {} Hz, {} markers",
        raw.n_channels(),
        raw.n_times(),
        raw.sfreq,
        markers.len()
    );
    Ok((raw, markers))
}

/// Convert stimulus markers to trigger events using a description parser.
pub fn events_from_markers(markers: &[Marker], parser: impl Fn(&str) -> Option<u8>) -> Vec<Event> {
    markers
        .iter()
        .filter_map(|m| parser(&m.description).map(|code| Event { sample: m.sample, code }))
        .collect()
}

/// Read a header/marker text file. BrainVision text is Latin-1 in the wild;
/// non-UTF-8 bytes are mapped through lossily, which preserves all ASCII
/// structure the parsers rely on.
fn read_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
