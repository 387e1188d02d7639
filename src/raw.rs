//! Continuous-recording container — the crate's equivalent of MNE's `Raw`.
//!
//! `RawEeg` owns the full `[C, T]` signal plus the minimal metadata the rest
//! of the pipeline needs (sampling rate, channel names, annotations). Data is
//! stored in volts for EEG channels; merged eye-tracking channels keep their
//! native units (pixels, arbitrary pupil units).
use anyhow::{bail, Result};
use ndarray::{Array1, Array2, ArrayView1};

// ── Annotations ──────────────────────────────────────────────────────────

/// A single annotation: a labelled time span on the continuous recording.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Onset in seconds from the start of the recording.
    pub onset: f64,
    /// Duration in seconds (0 for point events).
    pub duration: f64,
    /// Label, e.g. `"129"` for a trigger or `"BAD_BLINK"` for an artifact.
    pub description: String,
}

/// An annotation list kept sorted by onset.
#[derive(Debug, Clone, Default)]
pub struct Annotations {
    items: Vec<Annotation>,
}

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one annotation at its sorted position.
    pub fn push(&mut self, onset: f64, duration: f64, description: impl Into<String>) {
        let idx = self.items.partition_point(|a| a.onset <= onset);
        self.items.insert(
            idx,
            Annotation {
                onset,
                duration,
                description: description.into(),
            },
        );
    }

    /// Append all annotations from `other`, re-sorting by onset.
    pub fn extend(&mut self, other: Annotations) {
        self.items.extend(other.items);
        self.sort();
    }

    fn sort(&mut self) {
        self.items
            .sort_by(|a, b| a.onset.partial_cmp(&b.onset).unwrap_or(std::cmp::Ordering::Equal));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True if any annotation whose description starts with `prefix` overlaps
    /// the half-open time span `[t0, t1)` (seconds).
    pub fn any_overlap(&self, t0: f64, t1: f64, prefix: &str) -> bool {
        self.items.iter().any(|a| {
            a.description.starts_with(prefix) && a.onset < t1 && a.onset + a.duration > t0
        })
    }

    /// Drop annotations that start at or after `tmax` seconds.
    fn truncate_after(&mut self, tmax: f64) {
        self.items.retain(|a| a.onset < tmax);
    }
}

/// Collect a batch of annotations, sorting once at the end.
impl FromIterator<Annotation> for Annotations {
    fn from_iter<I: IntoIterator<Item = Annotation>>(iter: I) -> Self {
        let mut out = Self { items: iter.into_iter().collect() };
        out.sort();
        out
    }
}

// ── RawEeg ───────────────────────────────────────────────────────────────

/// A loaded continuous recording.
#[derive(Debug, Clone)]
pub struct RawEeg {
    /// Signal, shape `[n_channels, n_times]`.
    pub data: Array2<f64>,
    /// Sampling rate in Hz.
    pub sfreq: f64,
    /// Channel names, in row order of `data`.
    pub ch_names: Vec<String>,
    /// Annotations (triggers, artifacts) on the recording.
    pub annotations: Annotations,
}

impl RawEeg {
    pub fn new(data: Array2<f64>, sfreq: f64, ch_names: Vec<String>) -> Result<Self> {
        if ch_names.len() != data.nrows() {
            bail!(
                "channel name count ({}) does not match data rows ({})",
                ch_names.len(),
                data.nrows()
            );
        }
        Ok(Self { data, sfreq, ch_names, annotations: Annotations::new() })
    }

    #[inline]
    pub fn n_channels(&self) -> usize {
        self.data.nrows()
    }

    #[inline]
    pub fn n_times(&self) -> usize {
        self.data.ncols()
    }

    #[inline]
    pub fn duration_secs(&self) -> f64 {
        self.n_times() as f64 / self.sfreq
    }

    /// Row index of the channel with the given name.
    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.ch_names.iter().position(|n| n == name)
    }

    /// View of one channel's trace by name.
    pub fn channel(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.channel_index(name).map(|i| self.data.row(i))
    }

    /// Append a channel. The trace must have exactly `n_times` samples.
    pub fn add_channel(&mut self, name: impl Into<String>, trace: Array1<f64>) -> Result<()> {
        if trace.len() != self.n_times() {
            bail!(
                "channel trace has {} samples, recording has {}",
                trace.len(),
                self.n_times()
            );
        }
        self.data
            .push_row(trace.view())
            .map_err(|e| anyhow::anyhow!("appending channel row: {e}"))?;
        self.ch_names.push(name.into());
        Ok(())
    }

    /// Truncate the recording to `[0, tmax)` seconds, dropping annotations
    /// that fall beyond the new end.
    pub fn crop(&mut self, tmax: f64) {
        let keep = ((tmax * self.sfreq) as usize).min(self.n_times());
        self.data = self.data.slice(ndarray::s![.., ..keep]).to_owned();
        self.annotations.truncate_after(tmax);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};

    fn raw_4ch() -> RawEeg {
        let data = Array2::from_shape_fn((4, 1000), |(c, t)| c as f64 + t as f64 * 1e-3);
        RawEeg::new(data, 1000.0, vec!["Fz".into(), "Cz".into(), "Pz".into(), "Oz".into()])
            .unwrap()
    }

    #[test]
    fn basic_dimensions() {
        let raw = raw_4ch();
        assert_eq!(raw.n_channels(), 4);
        assert_eq!(raw.n_times(), 1000);
        approx::assert_abs_diff_eq!(raw.duration_secs(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn channel_lookup() {
        let raw = raw_4ch();
        assert_eq!(raw.channel_index("Pz"), Some(2));
        assert_eq!(raw.channel_index("XX"), None);
        approx::assert_abs_diff_eq!(raw.channel("Cz").unwrap()[0], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn add_channel_length_checked() {
        let mut raw = raw_4ch();
        assert!(raw.add_channel("PupilSize", Array1::zeros(999)).is_err());
        raw.add_channel("PupilSize", Array1::zeros(1000)).unwrap();
        assert_eq!(raw.n_channels(), 5);
        assert_eq!(raw.channel_index("PupilSize"), Some(4));
    }

    #[test]
    fn crop_truncates_data_and_annotations() {
        let mut raw = raw_4ch();
        raw.annotations.push(0.2, 0.0, "1");
        raw.annotations.push(0.9, 0.0, "2");
        raw.crop(0.5);
        assert_eq!(raw.n_times(), 500);
        assert_eq!(raw.annotations.len(), 1);
    }

    #[test]
    fn collected_annotations_end_up_sorted() {
        let ann: Annotations = [(2.0, "130"), (0.5, "129"), (1.0, "1")]
            .into_iter()
            .map(|(onset, d)| Annotation { onset, duration: 0.0, description: d.into() })
            .collect();
        let onsets: Vec<f64> = ann.iter().map(|a| a.onset).collect();
        assert_eq!(onsets, vec![0.5, 1.0, 2.0]);
    }

    #[test]
    fn annotations_sorted_and_overlap() {
        let mut ann = Annotations::new();
        ann.push(2.0, 0.5, "BAD_BLINK");
        ann.push(1.0, 0.1, "BAD_SACCADE");
        let onsets: Vec<f64> = ann.iter().map(|a| a.onset).collect();
        assert_eq!(onsets, vec![1.0, 2.0]);
        assert!(ann.any_overlap(2.4, 3.0, "BAD"));
        assert!(!ann.any_overlap(1.2, 1.9, "BAD"));
    }
}
