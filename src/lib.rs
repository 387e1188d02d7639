//! # eeg-eyetracking — combined EEG and eye-tracking loading in pure Rust
//!
//! `eeg-eyetracking` reads a BIDS-style subject folder containing a
//! BrainVision EEG recording, an EyeLink `.asc` eye-tracking export, and a
//! behavioral `.csv` log, and turns them into one coherent dataset: the eye
//! movements become extra channels on the EEG clock, blinks and saccades
//! become `BAD_*` annotations, and the behavioral log becomes per-trial
//! metadata.
//!
//! All of the signal processing (FIR design, zero-phase filtering, FFT
//! resampling) is implemented here on top of
//! [ndarray](https://crates.io/crates/ndarray) and
//! [RustFFT](https://crates.io/crates/rustfft) — no Python, no BLAS, no C
//! libraries.
//!
//! ## Pipeline overview
//!
//! ```text
//! data/sub-01/
//!   │
//!   ├─ eeg/*.vhdr              brainvision::read_raw_brainvision()
//!   │    └─ markers            events_from_markers() → trial/epoch triggers
//!   ├─ eyetracking/*.asc       eyelink::parse_asc() → per-trial traces
//!   ├─ beh/*.csv               Metadata::from_csv()
//!   │
//!   ├─ merge                   GazeX/GazeY/PupilSize channels + BAD_BLINK /
//!   │                          BAD_SACCADE annotations (per-trial alignment)
//!   ├─ preprocess_raw()        bad channels → band-pass FIR → downsample
//!   │                          (+ event re-indexing) → average reference
//!   └─ epochs()                trigger-locked [E, C, T] windows, baseline
//!        │                     corrected; PupilEpochs for divisive pupil
//!        └─→ io::write_epochs()  hand-off as .safetensors
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use eeg_eyetracking::{
//!     epochs, preprocess_raw, read_subject, PreprocessConfig, ReadConfig,
//! };
//!
//! // 1. Read everything for subject 2 from ./data/sub-02/
//! let data = read_subject(2, &ReadConfig::default()).unwrap();
//!
//! // 2. Standard preprocessing (0.1–40 Hz band-pass, 250 Hz, avg reference)
//! let mut raw = data.raw.unwrap();
//! let mut events = data.events.unwrap();
//! preprocess_raw(&mut raw, &mut events, &PreprocessConfig::default()).unwrap();
//!
//! // 3. Epoch around trigger 1, −0.1 s to +0.5 s
//! let ep = epochs(&raw, &events, 1, -0.1, 0.5, true).unwrap();
//! println!("{} epochs of shape {:?}", ep.n_epochs(), ep.data.dim());
//! ```
//!
//! Every step is also exposed individually (`brainvision`, `eyelink`,
//! `filter`, `resample`, ...) for pipelines that need to deviate from the
//! defaults.

pub mod brainvision;
pub mod config;
pub mod epoch;
pub mod events;
pub mod eyelink;
pub mod filter;
pub mod io;
pub mod merge;
pub mod metadata;
pub mod preprocess;
pub mod raw;
pub mod reference;
pub mod resample;
pub mod subject;

// ── Crate-root re-exports ─────────────────────────────────────────────────
//
// Everything a downstream user is likely to need is available directly as
// `eeg_eyetracking::Foo` without having to know the internal module layout.

// subject — the main entry point
pub use subject::{read_subject, Subject, SubjectData};

// config
pub use config::{MergeOptions, PreprocessConfig, ReadConfig};

// raw
pub use raw::{Annotation, Annotations, RawEeg};

// events
pub use events::{
    epoch_triggers, parse_trigger, trial_triggers, validate_events, Event, TriggerParser,
    TRIAL_TRIGGER_MIN,
};

// brainvision
pub use brainvision::{events_from_markers, read_raw_brainvision};

// eyelink
pub use eyelink::{parse_asc, read_eye_folder, AscOptions, Blink, EyeTrial, Fixation};

// merge
pub use merge::{merge_eye_into_eeg, EYE_CHANNELS};

// metadata
pub use metadata::Metadata;

// preprocess
pub use preprocess::{eeg_channel_mask, preprocess_raw, zero_bad_channels};

// epoch
pub use epoch::{epochs, Epochs, PupilEpochs};

// io — safetensors hand-off
pub use io::{write_epochs, write_pupil_epochs, StWriter};
