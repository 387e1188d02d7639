//! BrainVision `.vmrk` marker parsing.
//!
//! Markers live in `[Marker Infos]`, one per line:
//! ```text
//! Mk1=New Segment,,1,1,0,20230101120000000000
//! Mk2=Stimulus,S129,534,1,0
//! ```
//! Fields: type, description, position (1-based data point), size in points,
//! channel (0 = all), and an optional timestamp on new-segment markers.
use anyhow::{Context, Result};

/// One marker from the `.vmrk` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// Marker type (`Stimulus`, `Response`, `New Segment`, …).
    pub kind: String,
    /// Free-form description, e.g. `S129`.
    pub description: String,
    /// 0-based sample index (the file stores 1-based positions).
    pub sample: usize,
    /// Extent in data points.
    pub length: usize,
}

/// Parse the full `.vmrk` text.
pub fn parse_vmrk(text: &str) -> Result<Vec<Marker>> {
    let mut in_marker_section = false;
    let mut markers: Vec<(usize, Marker)> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            in_marker_section = line[1..line.len() - 1].eq_ignore_ascii_case("Marker Infos");
            continue;
        }
        if !in_marker_section {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else { continue };
        let Some(idx) = key.trim().strip_prefix("Mk") else { continue };
        let idx: usize = idx.parse().with_context(|| format!("marker key {key}"))?;

        let mut fields = value.split(',');
        let kind = fields.next().unwrap_or("").to_string();
        let description = fields.next().unwrap_or("").to_string();
        let position: usize = fields
            .next()
            .with_context(|| format!("Mk{idx}: missing position"))?
            .trim()
            .parse()
            .with_context(|| format!("Mk{idx}: position"))?;
        let length: usize = match fields.next().map(str::trim) {
            None | Some("") => 1,
            Some(l) => l.parse().with_context(|| format!("Mk{idx}: size"))?,
        };

        markers.push((
            idx,
            Marker {
                kind,
                description,
                sample: position.saturating_sub(1),
                length,
            },
        ));
    }

    markers.sort_by_key(|(idx, _)| *idx);
    Ok(markers.into_iter().map(|(_, m)| m).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VMRK: &str = "\
Brain Vision Data Exchange Marker File, Version 1.0
[Common Infos]
DataFile=test.eeg

[Marker Infos]
Mk1=New Segment,,1,1,0,20230101120000000000
Mk2=Stimulus,S129,501,1,0
Mk3=Stimulus,S  1,1001,1,0
";

    #[test]
    fn parse_markers() {
        let markers = parse_vmrk(VMRK).unwrap();
        assert_eq!(markers.len(), 3);
        assert_eq!(markers[0].kind, "New Segment");
        assert_eq!(markers[1].description, "S129");
        // Positions are converted to 0-based samples.
        assert_eq!(markers[1].sample, 500);
        assert_eq!(markers[2].sample, 1000);
    }

    #[test]
    fn lines_outside_marker_section_ignored() {
        let markers = parse_vmrk("[Common Infos]\nDataFile=x.eeg\n").unwrap();
        assert!(markers.is_empty());
    }
}
