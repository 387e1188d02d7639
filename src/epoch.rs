//! Trigger-locked epoching.
//!
//! Cuts `[tmin, tmax)` windows around every occurrence of one epoch trigger
//! and applies baseline correction over the pre-trigger interval. EEG epochs
//! use subtractive baseline; [`PupilEpochs`] uses divisive baseline so pupil
//! traces read as a proportion of their pre-trigger size.
use anyhow::{bail, Context, Result};
use ndarray::{s, Array2, Array3};

use crate::events::{epoch_triggers, Event};
use crate::raw::RawEeg;

/// Trigger-locked EEG epochs, shape `[n_epochs, n_channels, n_samples]`.
#[derive(Debug, Clone)]
pub struct Epochs {
    pub data: Array3<f64>,
    pub sfreq: f64,
    pub ch_names: Vec<String>,
    /// Window start relative to the trigger, in seconds (usually negative).
    pub tmin: f64,
    /// Indices (into the selected trigger list) of the epochs that survived
    /// range checks and annotation rejection.
    pub kept: Vec<usize>,
}

impl Epochs {
    pub fn n_epochs(&self) -> usize {
        self.data.shape()[0]
    }

    /// Time axis in seconds relative to the trigger.
    pub fn times(&self) -> Vec<f64> {
        let n_t = self.data.shape()[2];
        (0..n_t).map(|i| self.tmin + i as f64 / self.sfreq).collect()
    }
}

/// Cut epochs around every event with the given epoch-trigger `code`.
///
/// Windows that extend past either end of the recording are dropped. With
/// `reject_by_annotation`, windows overlapping a `BAD_*` annotation are
/// dropped too; `kept` records which triggers survived so rows can be matched
/// back to metadata.
pub fn epochs(
    raw: &RawEeg,
    events: &[Event],
    code: u8,
    tmin: f64,
    tmax: f64,
    reject_by_annotation: bool,
) -> Result<Epochs> {
    if tmax <= tmin {
        bail!("epoch window is empty: tmin={tmin}, tmax={tmax}");
    }
    let selected = epoch_triggers(events, code);
    if selected.is_empty() {
        bail!("no events with code {code}");
    }
    let n_samples = ((tmax - tmin) * raw.sfreq).round() as usize;
    let n_baseline = baseline_samples(tmin, raw.sfreq, n_samples);

    let mut windows: Vec<(usize, usize)> = Vec::new(); // (event index, start sample)
    for (i, ev) in selected.iter().enumerate() {
        let start = ev.sample as i64 + (tmin * raw.sfreq).round() as i64;
        if start < 0 || start as usize + n_samples > raw.n_times() {
            log::warn!("epoch {i} (sample {}) out of recording range, dropped", ev.sample);
            continue;
        }
        let start = start as usize;
        if reject_by_annotation {
            let t0 = start as f64 / raw.sfreq;
            let t1 = (start + n_samples) as f64 / raw.sfreq;
            if raw.annotations.any_overlap(t0, t1, "BAD") {
                log::debug!("epoch {i} overlaps a BAD annotation, dropped");
                continue;
            }
        }
        windows.push((i, start));
    }

    let mut data = Array3::<f64>::zeros((windows.len(), raw.n_channels(), n_samples));
    for (e, &(_, start)) in windows.iter().enumerate() {
        data.slice_mut(s![e, .., ..])
            .assign(&raw.data.slice(s![.., start..start + n_samples]));
    }
    subtract_baseline(&mut data, n_baseline);

    Ok(Epochs {
        data,
        sfreq: raw.sfreq,
        ch_names: raw.ch_names.clone(),
        tmin,
        kept: windows.into_iter().map(|(i, _)| i).collect(),
    })
}

/// Per-epoch, per-channel subtractive baseline over the first
/// `n_baseline` samples. No-op when the window has no pre-trigger part.
fn subtract_baseline(data: &mut Array3<f64>, n_baseline: usize) {
    if n_baseline == 0 {
        return;
    }
    let (n_e, n_c, _) = data.dim();
    for e in 0..n_e {
        for c in 0..n_c {
            let m = data
                .slice(s![e, c, ..n_baseline])
                .mean()
                .unwrap_or(0.0);
            data.slice_mut(s![e, c, ..]).mapv_inplace(|v| v - m);
        }
    }
}

fn baseline_samples(tmin: f64, sfreq: f64, n_samples: usize) -> usize {
    if tmin >= 0.0 {
        0
    } else {
        (((-tmin) * sfreq).round() as usize).min(n_samples)
    }
}

// ── PupilEpochs ──────────────────────────────────────────────────────────

/// Trigger-locked pupil-size epochs, shape `[n_epochs, n_samples]`.
///
/// Baseline is divisive: each trace is divided by its mean pre-trigger pupil
/// size, so values are proportions of baseline (1.0 = no change).
#[derive(Debug, Clone)]
pub struct PupilEpochs {
    pub data: Array2<f64>,
    pub sfreq: f64,
    pub tmin: f64,
    pub kept: Vec<usize>,
}

impl PupilEpochs {
    /// Cut pupil epochs from a merged recording. Requires the `PupilSize`
    /// channel added by the eye/EEG merge.
    pub fn from_raw(
        raw: &RawEeg,
        events: &[Event],
        code: u8,
        tmin: f64,
        tmax: f64,
    ) -> Result<Self> {
        let pupil_row = raw
            .channel_index("PupilSize")
            .context("no PupilSize channel — was the eye data merged?")?;
        // `epochs` does the window/range bookkeeping; the rows are rebuilt
        // from the raw trace below since the pupil baseline is divisive, not
        // subtractive.
        let all = epochs(raw, events, code, tmin, tmax, false)?;
        let n_e = all.n_epochs();
        let n_t = all.data.shape()[2];
        let n_baseline = baseline_samples(tmin, raw.sfreq, n_t);

        let mut data = Array2::<f64>::zeros((n_e, n_t));
        let selected = epoch_triggers(events, code);
        for (e, &kept_idx) in all.kept.iter().enumerate() {
            let ev = selected[kept_idx];
            let start = (ev.sample as i64 + (tmin * raw.sfreq).round() as i64) as usize;
            let trace = raw.data.slice(s![pupil_row, start..start + n_t]);
            let baseline = if n_baseline > 0 {
                trace.slice(s![..n_baseline]).mean().unwrap_or(1.0)
            } else {
                1.0
            };
            let denom = if baseline != 0.0 { baseline } else { 1.0 };
            for (t, &v) in trace.iter().enumerate() {
                data[[e, t]] = v / denom;
            }
        }

        Ok(PupilEpochs { data, sfreq: raw.sfreq, tmin, kept: all.kept })
    }

    pub fn n_epochs(&self) -> usize {
        self.data.nrows()
    }

    /// Time axis in seconds relative to the trigger.
    pub fn times(&self) -> Vec<f64> {
        (0..self.data.ncols())
            .map(|i| self.tmin + i as f64 / self.sfreq)
            .collect()
    }
}
