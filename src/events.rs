//! Trigger events and the trial/epoch trigger convention.
//!
//! Triggers are 8-bit codes recorded alongside the EEG:
//!   • trial triggers (128–255) mark trial onsets; the code encodes
//!     `128 + trial_nr % 128`, so consecutive trials carry distinct codes.
//!   • epoch triggers (1–127) mark event onsets within a trial, counting up
//!     from 1 in the order they occur.
//!
//! Code 0 is reserved by the acquisition hardware and never appears in a
//! valid stream.
use anyhow::{bail, Result};

/// Smallest code that marks a trial onset.
pub const TRIAL_TRIGGER_MIN: u8 = 128;

/// One trigger event on the EEG clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    /// Sample index into the continuous recording.
    pub sample: usize,
    /// Trigger code (1–255).
    pub code: u8,
}

impl Event {
    #[inline]
    pub fn is_trial_trigger(&self) -> bool {
        self.code >= TRIAL_TRIGGER_MIN
    }
}

/// Converts a marker description to a trigger code; `None` skips the marker.
/// Shared so configs stay cloneable while accepting capturing closures.
pub type TriggerParser = std::sync::Arc<dyn Fn(&str) -> Option<u8> + Send + Sync>;

/// Default description parser.
///
/// Understands the OpenVibe acquisition convention
/// (`OVTK_StimulationId_Label_XX`, two hex digits) and plain BrainVision
/// stimulus descriptions (`Stimulus/S  1`, `S129`, …). Anything else — new
/// segment markers, responses, comments — is skipped.
pub fn parse_trigger(description: &str) -> Option<u8> {
    if let Some(hex) = description.strip_prefix("OVTK_StimulationId_Label_") {
        return u8::from_str_radix(hex, 16).ok().filter(|&c| c != 0);
    }
    let tail = description.rsplit('/').next().unwrap_or(description);
    if let Some(num) = tail.strip_prefix('S') {
        return num.trim().parse::<u8>().ok().filter(|&c| c != 0);
    }
    None
}

/// Only the trial-onset triggers (code ≥ 128).
pub fn trial_triggers(events: &[Event]) -> Vec<Event> {
    events.iter().copied().filter(Event::is_trial_trigger).collect()
}

/// Only the epoch triggers with the given code.
pub fn epoch_triggers(events: &[Event], code: u8) -> Vec<Event> {
    events.iter().copied().filter(|e| e.code == code).collect()
}

/// Check that an event stream follows the trigger convention.
///
/// Rules:
/// 1. codes are in 1–255 (guaranteed by `u8` except for 0);
/// 2. the first event is a trial trigger;
/// 3. samples are strictly increasing;
/// 4. within each trial, epoch trigger codes are consecutive from 1.
pub fn validate_events(events: &[Event]) -> Result<()> {
    if events.is_empty() {
        bail!("event stream is empty");
    }
    if !events[0].is_trial_trigger() {
        bail!(
            "first event has code {} — a recording must start with a trial trigger (>= {})",
            events[0].code,
            TRIAL_TRIGGER_MIN
        );
    }
    let mut expected_epoch: u8 = 1;
    let mut trial_nr = 0usize;
    for (i, ev) in events.iter().enumerate() {
        if ev.code == 0 {
            bail!("event {i} has reserved code 0");
        }
        if i > 0 && ev.sample <= events[i - 1].sample {
            bail!(
                "event {i} (sample {}) does not come after event {} (sample {})",
                ev.sample,
                i - 1,
                events[i - 1].sample
            );
        }
        if ev.is_trial_trigger() {
            trial_nr += 1;
            expected_epoch = 1;
        } else {
            if ev.code != expected_epoch {
                bail!(
                    "trial {trial_nr}: expected epoch trigger {expected_epoch}, got {}",
                    ev.code
                );
            }
            expected_epoch = expected_epoch.saturating_add(1);
        }
    }
    Ok(())
}
