//! Top-level convenience: read all data for one subject.
//!
//! Expects a BIDS-style layout:
//! ```text
//! data/
//! └── sub-01/
//!     ├── eeg/          *.vhdr + *.vmrk + *.eeg   (BrainVision)
//!     ├── eyetracking/  *.asc                      (EyeLink export)
//!     └── beh/          *.csv                      (behavioral log)
//! ```
//! Any modality may be missing; metadata is taken from the behavioral CSV if
//! present and from the eye-tracking var messages if not.
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use crate::brainvision::{events_from_markers, read_raw_brainvision};
use crate::config::ReadConfig;
use crate::events::{validate_events, Event};
use crate::eyelink::{read_eye_folder, AscOptions};
use crate::merge::merge_eye_into_eeg;
use crate::metadata::Metadata;
use crate::raw::{Annotation, Annotations, RawEeg};

/// A subject identifier: a number (zero-padded to two digits in the folder
/// name) or a literal label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    Number(u32),
    Label(String),
}

impl Subject {
    /// BIDS directory name, e.g. `sub-03` or `sub-pilot`.
    pub fn dirname(&self) -> String {
        match self {
            Subject::Number(n) => format!("sub-{n:02}"),
            Subject::Label(l) => format!("sub-{l}"),
        }
    }
}

impl From<u32> for Subject {
    fn from(n: u32) -> Self {
        Subject::Number(n)
    }
}

impl From<&str> for Subject {
    fn from(l: &str) -> Self {
        Subject::Label(l.to_string())
    }
}

/// Everything read for one subject.
#[derive(Debug)]
pub struct SubjectData {
    /// The continuous EEG, with eye channels merged in when both modalities
    /// are present. `None` when the subject has no EEG data.
    pub raw: Option<RawEeg>,
    /// Trigger events on the EEG clock. `None` without EEG data.
    pub events: Option<Vec<Event>>,
    /// One row per trial. `None` when neither a behavioral CSV nor eye data
    /// exists.
    pub metadata: Option<Metadata>,
}

/// Read EEG, eye-tracking, and behavioral data for a single subject.
pub fn read_subject(subject: impl Into<Subject>, cfg: &ReadConfig) -> Result<SubjectData> {
    let subject = subject.into();
    let subject_path = cfg.folder.join(subject.dirname());
    log::info!("reading subject data from {}", subject_path.display());

    let eeg = read_eeg_dir(&subject_path.join("eeg"), cfg)?;
    let mut metadata = read_beh_dir(&subject_path.join("beh"))?;

    let eye_path = subject_path.join("eyetracking");
    let eye_meta = if eye_path.exists() {
        read_eye_folder(&eye_path, &AscOptions { keep_traces: false, ..AscOptions::default() })?
    } else {
        log::info!("no eye data detected");
        None
    };

    let (mut raw, events) = match eeg {
        Some((raw, events)) => (Some(raw), Some(events)),
        None => (None, None),
    };

    if let (Some(raw), Some(events), Some(_)) = (raw.as_mut(), events.as_ref(), eye_meta.as_ref())
    {
        // Re-read with full traces for the merge; the metadata pass above
        // deliberately drops them to save memory.
        let trials = read_eye_folder(&eye_path, &AscOptions::default())?
            .context("eye data disappeared between passes")?;
        merge_eye_into_eeg(raw, events, &trials, &cfg.merge)?;
    }

    if metadata.is_none() {
        if let Some(trials) = &eye_meta {
            metadata = Some(Metadata::from_eye_vars(trials));
        }
    }

    // Only the eye-tracking trial count has to line up with the EEG; a
    // behavioral log may carry extra rows (practice trials, aborted runs).
    if let (Some(events), Some(trials)) = (events.as_ref(), eye_meta.as_ref()) {
        let n_trials_eeg = events.iter().filter(|e| e.is_trial_trigger()).count();
        if n_trials_eeg != trials.len() {
            bail!(
                "eeg has {n_trials_eeg} trials but eye-tracking has {} trials",
                trials.len()
            );
        }
        log::info!("eeg and eye-tracking data have matching length");
    }

    Ok(SubjectData { raw, events, metadata })
}

/// Read the EEG directory: raw + validated events, annotations set from the
/// events, recording cropped shortly after the last trigger.
fn read_eeg_dir(eeg_path: &Path, cfg: &ReadConfig) -> Result<Option<(RawEeg, Vec<Event>)>> {
    let Some(vhdr_path) = first_with_extension(eeg_path, "vhdr")? else {
        log::info!("no eeg data detected");
        return Ok(None);
    };
    log::info!("loading eeg data from {}", vhdr_path.display());
    let (mut raw, markers) = read_raw_brainvision(&vhdr_path)?;

    log::info!("creating events from markers");
    let events = events_from_markers(&markers, cfg.trigger_parser.as_ref());
    if events.is_empty() {
        bail!("no trigger events in {}", vhdr_path.display());
    }

    if let Some(margin) = cfg.eeg_margin {
        let last = events.last().map(|e| e.sample).unwrap_or(0);
        let end = (last as f64 / raw.sfreq + margin).min(raw.duration_secs());
        log::info!("trimming eeg to 0 - {end:.1} s");
        raw.crop(end);
    }

    log::info!("validating events");
    validate_events(&events)?;

    // Triggers become point annotations so they survive alongside the BAD
    // spans added by the merge. Collected as a batch: one sort, not one per
    // trigger.
    let marks: Annotations = events
        .iter()
        .map(|ev| Annotation {
            onset: ev.sample as f64 / raw.sfreq,
            duration: 0.0,
            description: ev.code.to_string(),
        })
        .collect();
    raw.annotations.extend(marks);
    Ok(Some((raw, events)))
}

/// Read the behavioral directory into a metadata table, if present.
fn read_beh_dir(beh_path: &Path) -> Result<Option<Metadata>> {
    let Some(csv_path) = first_with_extension(beh_path, "csv")? else {
        log::info!("no behavioral data detected");
        return Ok(None);
    };
    log::info!("loading behavioral data from {}", csv_path.display());
    let text = std::fs::read_to_string(&csv_path)
        .with_context(|| format!("reading {}", csv_path.display()))?;
    Ok(Some(Metadata::from_csv(&text)?))
}

/// First file in `dir` with the given extension (sorted by name), or `None`
/// when the directory is missing or holds no such file.
fn first_with_extension(dir: &Path, ext: &str) -> Result<Option<PathBuf>> {
    if !dir.exists() {
        return Ok(None);
    }
    let mut paths: Vec<_> = std::fs::read_dir(dir)
        .with_context(|| format!("listing {}", dir.display()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|e| e.eq_ignore_ascii_case(ext)))
        .collect();
    paths.sort();
    Ok(paths.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_dirnames() {
        assert_eq!(Subject::from(3).dirname(), "sub-03");
        assert_eq!(Subject::from(12).dirname(), "sub-12");
        assert_eq!(Subject::from("pilot").dirname(), "sub-pilot");
    }

    #[test]
    fn missing_subject_dir_yields_empty_data() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ReadConfig { folder: dir.path().to_path_buf(), ..ReadConfig::default() };
        let data = read_subject(1, &cfg).unwrap();
        assert!(data.raw.is_none());
        assert!(data.events.is_none());
        assert!(data.metadata.is_none());
    }
}
