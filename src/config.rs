//! Configuration for reading, merging, and preprocessing.
//!
//! All fields are `pub` so callers can use struct-update syntax:
//!
//! ```
//! use eeg_eyetracking::ReadConfig;
//!
//! let cfg = ReadConfig {
//!     eeg_margin: Some(10.0),   // crop sooner than the 30 s default
//!     ..ReadConfig::default()
//! };
//! ```
use std::path::PathBuf;
use std::sync::Arc;

use crate::events::{parse_trigger, TriggerParser};

/// Configuration for [`crate::read_subject`].
#[derive(Clone)]
pub struct ReadConfig {
    /// Root folder holding the `sub-XX` directories.
    ///
    /// Default: `data`.
    pub folder: PathBuf,

    /// Converts marker descriptions to trigger codes. The default understands
    /// OpenVibe labels and BrainVision stimulus descriptions; supply your own
    /// (any closure, `Arc::new(...)`) when the acquisition software encodes
    /// triggers differently.
    pub trigger_parser: TriggerParser,

    /// Seconds of recording to keep after the last trigger; the rest is
    /// cropped to save memory. `None` disables cropping.
    ///
    /// Default: `Some(30.0)`.
    pub eeg_margin: Option<f64>,

    /// Eye/EEG merge thresholds.
    pub merge: MergeOptions,
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("data"),
            trigger_parser: Arc::new(parse_trigger),
            eeg_margin: Some(30.0),
            merge: MergeOptions::default(),
        }
    }
}

impl std::fmt::Debug for ReadConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadConfig")
            .field("folder", &self.folder)
            .field("eeg_margin", &self.eeg_margin)
            .field("merge", &self.merge)
            .finish_non_exhaustive()
    }
}

/// Thresholds for merging eye-tracking data into the EEG.
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Minimum blink duration (ms) before it is annotated as `BAD_BLINK`.
    ///
    /// Default: `10.0`.
    pub min_blink_dur: f64,

    /// Minimum saccade duration (ms) before it is annotated as `BAD_SACCADE`.
    ///
    /// Default: `10.0`.
    pub min_sacc_dur: f64,

    /// Minimum saccade amplitude (px) before it is annotated as
    /// `BAD_SACCADE`.
    ///
    /// Default: `30.0`.
    pub min_sacc_size: f64,

    /// Margin (ms) added on both sides of a blink before the pupil trace is
    /// reconstructed across it.
    ///
    /// Default: `20.0`.
    pub blink_margin: f64,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            min_blink_dur: 10.0,
            min_sacc_dur: 10.0,
            min_sacc_size: 30.0,
            blink_margin: 20.0,
        }
    }
}

/// Configuration for the fixed preprocessing sequence
/// ([`crate::preprocess::preprocess_raw`]).
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Highpass cutoff in Hz; `None` skips the highpass.
    ///
    /// Default: `Some(0.1)`.
    pub l_freq: Option<f64>,

    /// Lowpass cutoff in Hz; `None` skips the lowpass.
    ///
    /// Default: `Some(40.0)`.
    pub h_freq: Option<f64>,

    /// Target sampling rate in Hz after downsampling; `None` keeps the
    /// recording rate. Events are re-indexed to the new rate.
    ///
    /// Default: `Some(250.0)`.
    pub target_sfreq: Option<f64>,

    /// Channels to zero-fill before filtering. Matching is case-insensitive
    /// and ignores spaces.
    ///
    /// Default: empty.
    pub bad_channels: Vec<String>,

    /// Re-reference EEG channels to their common average. Merged eye channels
    /// never contribute to (or receive) the reference.
    ///
    /// Default: `true`.
    pub average_reference: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            l_freq: Some(0.1),
            h_freq: Some(40.0),
            target_sfreq: Some(250.0),
            bad_channels: vec![],
            average_reference: true,
        }
    }
}
