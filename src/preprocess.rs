//! The fixed preprocessing sequence applied to a (possibly merged) raw
//! recording before epoching:
//!
//! 1. Zero-fill channels listed in [`PreprocessConfig::bad_channels`].
//! 2. Band-pass FIR filter the EEG channels (zero-phase overlap-add).
//! 3. Downsample everything to [`PreprocessConfig::target_sfreq`] and
//!    re-index the trigger events.
//! 4. Average-reference the EEG channels.
//!
//! Merged `GazeX`/`GazeY`/`PupilSize` channels are resampled along with the
//! EEG (they must stay on the same clock) but are neither filtered nor
//! referenced.
use anyhow::Result;

use crate::config::PreprocessConfig;
use crate::events::Event;
use crate::filter;
use crate::merge::EYE_CHANNELS;
use crate::raw::RawEeg;
use crate::reference;
use crate::resample;

/// Run the fixed sequence in-place. `events` is re-indexed when the
/// recording is downsampled.
pub fn preprocess_raw(
    raw: &mut RawEeg,
    events: &mut Vec<Event>,
    cfg: &PreprocessConfig,
) -> Result<()> {
    // 1. Bad channels.
    zero_bad_channels(raw, &cfg.bad_channels);

    let eeg_mask = eeg_channel_mask(&raw.ch_names);

    // 2. Band-pass.
    let kernel = match (cfg.l_freq, cfg.h_freq) {
        (Some(l), Some(h)) => Some(filter::design_bandpass(l, h, raw.sfreq)),
        (Some(l), None) => Some(filter::design_highpass(l, raw.sfreq)),
        (None, Some(h)) => Some(filter::design_lowpass(h, raw.sfreq)),
        (None, None) => None,
    };
    if let Some(h) = kernel {
        log::info!(
            "filtering {} eeg channels ({} taps)",
            eeg_mask.iter().filter(|&&b| b).count(),
            h.len()
        );
        filter::apply_fir_zero_phase(&mut raw.data, &h, &eeg_mask)?;
    }

    // 3. Downsample.
    if let Some(target) = cfg.target_sfreq {
        if (target - raw.sfreq).abs() > 1e-3 {
            log::info!("resampling {} Hz -> {} Hz", raw.sfreq, target);
            raw.data = resample::resample(&raw.data, raw.sfreq, target)?;
            *events = resample::resample_events(events, raw.sfreq, target);
            raw.sfreq = target;
        }
    }

    // 4. Average reference.
    if cfg.average_reference {
        log::info!("re-referencing to the eeg channel average");
        reference::average_reference_inplace(&mut raw.data, &eeg_mask);
    }
    Ok(())
}

/// Zero-fill channels whose normalised name appears in `bad`.
///
/// Name matching is case-insensitive and ignores spaces; names not present
/// in the recording are skipped silently.
pub fn zero_bad_channels(raw: &mut RawEeg, bad: &[String]) {
    let norm = |s: &str| s.replace(' ', "").to_lowercase();
    for bad_ch in bad {
        if let Some(idx) = raw.ch_names.iter().position(|n| norm(n) == norm(bad_ch)) {
            raw.data.row_mut(idx).fill(0.0);
        }
    }
}

/// True for every channel that is EEG (i.e. not one of the merged
/// eye-tracking channels).
pub fn eeg_channel_mask(ch_names: &[String]) -> Vec<bool> {
    ch_names
        .iter()
        .map(|n| !EYE_CHANNELS.contains(&n.as_str()))
        .collect()
}
