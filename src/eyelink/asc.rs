//! EyeLink `.asc` parsing.
//!
//! The ASC export is line-based. The experiment structures it with messages:
//! ```text
//! MSG 784000 start_trial 1
//! MSG 784010 start_phase trial
//! 784011    512.3   384.2  1234.0 ...
//! EBLINK R 784200 784260 60
//! EFIX R 784300 784500 200 510.0 380.0 1200
//! MSG 785000 end_phase trial
//! MSG 785005 var response_time 532
//! MSG 785010 end_trial
//! ```
//! Samples, blinks and fixations are collected while the requested phase is
//! active; `var` messages anywhere inside a trial land in the trial's var
//! table. Timestamps are tracker milliseconds.
use anyhow::{Context, Result};

/// A completed fixation (from an `EFIX` line).
#[derive(Debug, Clone, PartialEq)]
pub struct Fixation {
    pub start_ms: f64,
    pub end_ms: f64,
    /// Mean gaze position in screen pixels.
    pub x: f64,
    pub y: f64,
}

/// A blink interval (from an `EBLINK` line).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blink {
    pub start_ms: f64,
    pub end_ms: f64,
}

impl Blink {
    #[inline]
    pub fn duration_ms(&self) -> f64 {
        self.end_ms - self.start_ms
    }
}

/// All eye-tracking data for one trial.
#[derive(Debug, Clone, Default)]
pub struct EyeTrial {
    /// Trial number from the `start_trial` message, if given.
    pub trial_id: Option<i64>,
    /// Sample timestamps (ms) of the recorded phase.
    pub t: Vec<f64>,
    /// Horizontal gaze (px); NaN where the tracker lost the eye.
    pub x: Vec<f64>,
    /// Vertical gaze (px).
    pub y: Vec<f64>,
    /// Pupil size (arbitrary tracker units).
    pub pupil: Vec<f64>,
    /// `(phase name, onset ms)` for every `start_phase` inside the trial.
    pub phase_onsets: Vec<(String, f64)>,
    /// Blinks during the recorded phase.
    pub blinks: Vec<Blink>,
    /// Fixations during the recorded phase.
    pub fixations: Vec<Fixation>,
    /// Experimental variables logged with `var` messages.
    pub vars: Vec<(String, String)>,
}

impl EyeTrial {
    /// Onset (ms) of the first phase, i.e. the eye-clock time of the first
    /// epoch trigger.
    pub fn first_phase_onset(&self) -> Option<f64> {
        self.phase_onsets.first().map(|(_, t)| *t)
    }
}

/// Parse options.
#[derive(Debug, Clone)]
pub struct AscOptions {
    /// Keep sample traces (false for a metadata-only pass).
    pub keep_traces: bool,
    /// Phase whose samples/blinks/fixations are collected.
    pub phase: String,
    /// Mean-bin the traces by this factor after parsing. Merging needs the
    /// native tracker rate, so the default is `None`.
    pub downsample: Option<usize>,
}

impl Default for AscOptions {
    fn default() -> Self {
        Self { keep_traces: true, phase: "trial".into(), downsample: None }
    }
}

/// Parse the full ASC text into per-trial structures.
pub fn parse_asc(text: &str, opts: &AscOptions) -> Result<Vec<EyeTrial>> {
    let mut trials = Vec::new();
    let mut current: Option<EyeTrial> = None;
    let mut in_phase = false;
    let finish = |mut trial: EyeTrial| {
        if let Some(factor) = opts.downsample {
            trial.t = super::trace::downsample_mean(&trial.t, factor);
            trial.x = super::trace::downsample_mean(&trial.x, factor);
            trial.y = super::trace::downsample_mean(&trial.y, factor);
            trial.pupil = super::trace::downsample_mean(&trial.pupil, factor);
        }
        trial
    };

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let Some(first) = tokens.next() else { continue };

        match first {
            "MSG" => {
                let t: f64 = tokens
                    .next()
                    .with_context(|| format!("line {lineno}: MSG without timestamp"))?
                    .parse()
                    .with_context(|| format!("line {lineno}: MSG timestamp"))?;
                match tokens.next() {
                    Some("start_trial") => {
                        if let Some(done) = current.take() {
                            trials.push(finish(done));
                        }
                        let trial_id = tokens.next().and_then(|s| s.parse().ok());
                        current = Some(EyeTrial { trial_id, ..EyeTrial::default() });
                        in_phase = false;
                    }
                    Some("end_trial") => {
                        if let Some(done) = current.take() {
                            trials.push(finish(done));
                        }
                        in_phase = false;
                    }
                    Some("start_phase") => {
                        if let Some(trial) = current.as_mut() {
                            let name = tokens.next().unwrap_or("").to_string();
                            in_phase = name == opts.phase;
                            trial.phase_onsets.push((name, t));
                        }
                    }
                    Some("end_phase") => {
                        if in_phase {
                            let name = tokens.next().unwrap_or("");
                            if name == opts.phase {
                                in_phase = false;
                            }
                        }
                    }
                    Some("var") => {
                        if let Some(trial) = current.as_mut() {
                            let name = tokens
                                .next()
                                .with_context(|| format!("line {lineno}: var without name"))?
                                .to_string();
                            let value = tokens.collect::<Vec<_>>().join(" ");
                            trial.vars.push((name, value));
                        }
                    }
                    _ => {}
                }
            }
            "EBLINK" => {
                if let (Some(trial), true) = (current.as_mut(), in_phase) {
                    let _eye = tokens.next();
                    let start_ms = parse_f64(tokens.next(), lineno, "EBLINK start")?;
                    let end_ms = parse_f64(tokens.next(), lineno, "EBLINK end")?;
                    trial.blinks.push(Blink { start_ms, end_ms });
                }
            }
            "EFIX" => {
                if let (Some(trial), true) = (current.as_mut(), in_phase) {
                    let _eye = tokens.next();
                    let start_ms = parse_f64(tokens.next(), lineno, "EFIX start")?;
                    let end_ms = parse_f64(tokens.next(), lineno, "EFIX end")?;
                    let _dur = tokens.next();
                    let x = parse_f64(tokens.next(), lineno, "EFIX x")?;
                    let y = parse_f64(tokens.next(), lineno, "EFIX y")?;
                    trial.fixations.push(Fixation { start_ms, end_ms, x, y });
                }
            }
            // Sample lines start with a numeric timestamp.
            _ if first.as_bytes()[0].is_ascii_digit() => {
                if !opts.keep_traces || !in_phase {
                    continue;
                }
                let Some(trial) = current.as_mut() else { continue };
                let Ok(t) = first.parse::<f64>() else { continue };
                let x = sample_value(tokens.next());
                let y = sample_value(tokens.next());
                let pupil = sample_value(tokens.next());
                trial.t.push(t);
                trial.x.push(x);
                trial.y.push(y);
                trial.pupil.push(pupil);
            }
            // SSACC, SFIX, SBLINK, INPUT, EVENTS, … are not needed.
            _ => {}
        }
    }
    if let Some(done) = current.take() {
        trials.push(finish(done));
    }
    Ok(trials)
}

fn parse_f64(token: Option<&str>, lineno: usize, what: &str) -> Result<f64> {
    token
        .with_context(|| format!("line {lineno}: missing {what}"))?
        .parse()
        .with_context(|| format!("line {lineno}: {what}"))
}

/// Missing data is written as `.` in ASC sample lines.
fn sample_value(token: Option<&str>) -> f64 {
    match token {
        Some(".") | None => f64::NAN,
        Some(v) => v.parse().unwrap_or(f64::NAN),
    }
}
