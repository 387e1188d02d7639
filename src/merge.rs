//! Merge eye-tracking data into the EEG: per-trial clock alignment, gaze and
//! pupil channels, and artifact annotations.
//!
//! The EEG trial trigger and the tracker's `start_trial` message fire at
//! slightly different moments, so trial onsets alone cannot align the two
//! clocks. The first epoch trigger, however, is sent at the same moment as
//! the first `start_phase` message (an experiment that violates this is
//! mis-programmed). The residual between the two intervals
//!
//! ```text
//! eye_offset = (first epoch trigger − trial trigger)        // EEG samples
//!            − (first phase onset − trace start) · sfreq/1000   // eye ms
//! ```
//!
//! is therefore the per-trial shift of the eye clock against the EEG clock.
use anyhow::{bail, Result};
use ndarray::Array1;

use crate::config::MergeOptions;
use crate::events::Event;
use crate::eyelink::{reconstruct_blinks, EyeTrial};
use crate::raw::{Annotations, RawEeg};

/// Channel names added to the raw by the merge.
pub const EYE_CHANNELS: [&str; 3] = ["GazeX", "GazeY", "PupilSize"];

/// Merge `trials` into `raw` as `GazeX`/`GazeY`/`PupilSize` channels and
/// annotate blinks and saccades.
///
/// Fails when the number of EEG trial triggers does not match the number of
/// eye-tracking trials.
pub fn merge_eye_into_eeg(
    raw: &mut RawEeg,
    events: &[Event],
    trials: &[EyeTrial],
    opts: &MergeOptions,
) -> Result<()> {
    let trigger_indices: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_trial_trigger())
        .map(|(i, _)| i)
        .collect();
    if trigger_indices.len() != trials.len() {
        bail!(
            "eeg has {} trial triggers but eye-tracking has {} trials",
            trigger_indices.len(),
            trials.len()
        );
    }
    log::info!("merging eye-tracking and eeg data ({} trials)", trials.len());

    let n_t = raw.n_times();
    let samples_per_ms = raw.sfreq / 1000.0;

    // Per-trial clock offset in EEG samples.
    let mut offsets: Vec<Option<i64>> = Vec::with_capacity(trials.len());
    for (i, (trial, &ev_idx)) in trials.iter().zip(&trigger_indices).enumerate() {
        let Some(&eye_t0) = trial.t.first() else {
            log::warn!("trial {i}: no trace samples, skipping");
            offsets.push(None);
            continue;
        };
        let Some(t_onset) = trial.first_phase_onset() else {
            log::warn!("trial {i}: no start_phase message, skipping");
            offsets.push(None);
            continue;
        };
        let Some(next) = events.get(ev_idx + 1) else {
            log::warn!("trial {i}: no epoch trigger after the trial trigger, skipping");
            offsets.push(None);
            continue;
        };
        let eeg_interval = (next.sample - events[ev_idx].sample) as f64;
        let eye_interval = (t_onset - eye_t0) * samples_per_ms;
        offsets.push(Some((eeg_interval - eye_interval).round() as i64));
    }
    let known: Vec<f64> = offsets.iter().flatten().map(|&o| o as f64).collect();
    if !known.is_empty() {
        log::info!(
            "trial offset (eye - eeg): {:.1} samples mean",
            known.iter().sum::<f64>() / known.len() as f64
        );
    }

    // Gaze coordinates and pupil size as channels; gaps between recordings
    // are set to the channel median.
    log::info!("adding GazeX, GazeY, and PupilSize channels");
    let mut gaze_x = vec![f64::NAN; n_t];
    let mut gaze_y = vec![f64::NAN; n_t];
    let mut pupil = vec![f64::NAN; n_t];

    for (trial, (&ev_idx, offset)) in trials.iter().zip(trigger_indices.iter().zip(&offsets)) {
        let Some(offset) = *offset else { continue };
        let start = events[ev_idx].sample as i64 + offset;
        let t0 = trial.t[0];

        // Blink-reconstructed pupil trace for the channel data.
        let mut trial_pupil = trial.pupil.clone();
        reconstruct_blinks(&trial.t, &mut trial_pupil, &trial.blinks, opts.blink_margin);

        for j in 0..trial.t.len() {
            let pos = start + ((trial.t[j] - t0) * samples_per_ms).round() as i64;
            if pos < 0 || pos as usize >= n_t {
                continue;
            }
            let pos = pos as usize;
            gaze_x[pos] = trial.x[j];
            gaze_y[pos] = trial.y[j];
            pupil[pos] = trial_pupil[j];
        }
    }
    fill_nan_with_median(&mut gaze_x);
    fill_nan_with_median(&mut gaze_y);
    fill_nan_with_median(&mut pupil);
    raw.add_channel("GazeX", Array1::from(gaze_x))?;
    raw.add_channel("GazeY", Array1::from(gaze_y))?;
    raw.add_channel("PupilSize", Array1::from(pupil))?;

    // Blinks and saccades as BAD annotations.
    log::info!("adding BAD_BLINK and BAD_SACCADE annotations");
    let mut bads = Annotations::new();
    let sfreq = raw.sfreq;
    for (trial, (&ev_idx, offset)) in trials.iter().zip(trigger_indices.iter().zip(&offsets)) {
        let Some(offset) = *offset else { continue };
        let start = events[ev_idx].sample as i64 + offset;
        let t0 = trial.t[0];
        let to_secs =
            |ms_in_trial: f64| (start as f64 + ms_in_trial * samples_per_ms) / sfreq;

        for blink in &trial.blinks {
            let dur_ms = blink.duration_ms();
            if dur_ms < opts.min_blink_dur {
                continue;
            }
            bads.push(to_secs(blink.start_ms - t0), dur_ms / 1000.0, "BAD_BLINK");
        }
        // A saccade spans from the end of fixation n to the start of
        // fixation n + 1.
        for pair in trial.fixations.windows(2) {
            let (from, to) = (&pair[0], &pair[1]);
            let dur_ms = to.start_ms - from.end_ms;
            if dur_ms < opts.min_sacc_dur {
                continue;
            }
            let size = ((from.x - to.x).powi(2) + (from.y - to.y).powi(2)).sqrt();
            if size < opts.min_sacc_size {
                continue;
            }
            bads.push(to_secs(from.end_ms - t0), dur_ms / 1000.0, "BAD_SACCADE");
        }
    }
    raw.annotations.extend(bads);
    Ok(())
}

/// Replace NaNs by the median of the non-NaN values. A fully-NaN signal
/// becomes all zeros.
fn fill_nan_with_median(signal: &mut [f64]) {
    let mut valid: Vec<f64> = signal.iter().copied().filter(|v| !v.is_nan()).collect();
    let fill = if valid.is_empty() {
        0.0
    } else {
        valid.sort_by(|a, b| a.total_cmp(b));
        let mid = valid.len() / 2;
        if valid.len() % 2 == 0 {
            (valid[mid - 1] + valid[mid]) / 2.0
        } else {
            valid[mid]
        }
    };
    for v in signal.iter_mut() {
        if v.is_nan() {
            *v = fill;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eyelink::{Blink, Fixation};
    use ndarray::Array2;

    fn raw_1khz(n_t: usize) -> RawEeg {
        RawEeg::new(
            Array2::zeros((2, n_t)),
            1000.0,
            vec!["Fz".into(), "Cz".into()],
        )
        .unwrap()
    }

    /// One trial: trigger at sample 1000, epoch trigger at 1200; eye trace
    /// starts at 5000 ms, first phase at 5150 ms. eye_offset = 200 − 150 = 50.
    fn one_trial() -> (Vec<Event>, Vec<EyeTrial>) {
        let events = vec![
            Event { sample: 1000, code: 129 },
            Event { sample: 1200, code: 1 },
        ];
        let trial = EyeTrial {
            trial_id: Some(1),
            t: (0..100).map(|i| 5000.0 + i as f64).collect(),
            x: vec![512.0; 100],
            y: vec![384.0; 100],
            pupil: (0..100).map(|i| 1000.0 + i as f64).collect(),
            phase_onsets: vec![("trial".into(), 5150.0)],
            ..EyeTrial::default()
        };
        (events, vec![trial])
    }

    #[test]
    fn trace_lands_at_offset_trial_onset() {
        let mut raw = raw_1khz(3000);
        let (events, trials) = one_trial();
        merge_eye_into_eeg(&mut raw, &events, &trials, &MergeOptions::default()).unwrap();

        assert_eq!(raw.n_channels(), 5);
        let pupil = raw.channel("PupilSize").unwrap();
        // Trace starts at 1000 + 50 and runs for 100 samples.
        approx::assert_abs_diff_eq!(pupil[1050], 1000.0, epsilon = 1e-9);
        approx::assert_abs_diff_eq!(pupil[1149], 1099.0, epsilon = 1e-9);
        // Outside the trial: median of the trace.
        approx::assert_abs_diff_eq!(pupil[0], 1049.5, epsilon = 1e-9);
    }

    #[test]
    fn trial_count_mismatch_is_error() {
        let mut raw = raw_1khz(3000);
        let (events, _) = one_trial();
        assert!(merge_eye_into_eeg(&mut raw, &events, &[], &MergeOptions::default()).is_err());
    }

    #[test]
    fn blinks_and_saccades_annotated() {
        let mut raw = raw_1khz(3000);
        let (events, mut trials) = one_trial();
        // Blink at 20–50 ms into the trace; one long and one tiny saccade.
        trials[0].blinks = vec![
            Blink { start_ms: 5020.0, end_ms: 5050.0 },
            Blink { start_ms: 5060.0, end_ms: 5065.0 }, // 5 ms < min_blink_dur
        ];
        trials[0].fixations = vec![
            Fixation { start_ms: 5000.0, end_ms: 5010.0, x: 100.0, y: 100.0 },
            Fixation { start_ms: 5030.0, end_ms: 5060.0, x: 200.0, y: 100.0 },
            Fixation { start_ms: 5075.0, end_ms: 5090.0, x: 205.0, y: 100.0 }, // 5 px < min_sacc_size
        ];
        merge_eye_into_eeg(&mut raw, &events, &trials, &MergeOptions::default()).unwrap();

        // Saccade onset (fixation end at 10 ms) precedes the blink (20 ms).
        let descriptions: Vec<&str> =
            raw.annotations.iter().map(|a| a.description.as_str()).collect();
        assert_eq!(descriptions, vec!["BAD_SACCADE", "BAD_BLINK"]);
        let blink = raw
            .annotations
            .iter()
            .find(|a| a.description == "BAD_BLINK")
            .unwrap();
        // Onset: (1050 + 20) / 1000 s, duration 30 ms.
        approx::assert_abs_diff_eq!(blink.onset, 1.070, epsilon = 1e-9);
        approx::assert_abs_diff_eq!(blink.duration, 0.030, epsilon = 1e-9);
    }

    #[test]
    fn blink_gap_reconstructed_in_channel() {
        let mut raw = raw_1khz(3000);
        let (events, mut trials) = one_trial();
        // Zero out the pupil during a blink; reconstruction should bridge it.
        for j in 40..60 {
            trials[0].pupil[j] = 0.0;
        }
        trials[0].blinks = vec![Blink { start_ms: 5040.0, end_ms: 5059.0 }];
        merge_eye_into_eeg(&mut raw, &events, &trials, &MergeOptions::default()).unwrap();
        let pupil = raw.channel("PupilSize").unwrap();
        // Mid-blink sample is interpolated between surrounding values, not 0.
        assert!(pupil[1100] > 1000.0);
    }

    #[test]
    fn median_fill() {
        let mut v = vec![f64::NAN, 1.0, 3.0, f64::NAN, 2.0];
        fill_nan_with_median(&mut v);
        approx::assert_abs_diff_eq!(v[0], 2.0, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(v[3], 2.0, epsilon = 1e-12);
    }
}
