use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use eeg_eyetracking::{
    epochs, io, preprocess_raw, read_subject, PreprocessConfig, PupilEpochs, ReadConfig, Subject,
};

#[derive(Parser)]
#[command(name = "read-subject", about = "Read and preprocess one subject's EEG + eye-tracking data")]
struct Args {
    /// Subject number or label (folder data/sub-XX)
    subject: String,

    /// Data folder containing the sub-XX directories
    #[arg(long, default_value = "data")]
    folder: PathBuf,

    /// Highpass cutoff in Hz (0 disables)
    #[arg(long, default_value_t = 0.1)]
    l_freq: f64,

    /// Lowpass cutoff in Hz (0 disables)
    #[arg(long, default_value_t = 40.0)]
    h_freq: f64,

    /// Target sampling rate in Hz (0 disables downsampling)
    #[arg(long, default_value_t = 250.0)]
    target_sfreq: f64,

    /// Channel names to zero out (comma-separated)
    #[arg(long, default_value = "")]
    bad_channels: String,

    /// Skip average referencing
    #[arg(long)]
    no_reference: bool,

    /// Epoch trigger code to cut around (skips epoching when absent)
    #[arg(long)]
    trigger: Option<u8>,

    /// Epoch window start relative to the trigger, in seconds
    #[arg(long, default_value_t = -0.1, allow_hyphen_values = true)]
    tmin: f64,

    /// Epoch window end relative to the trigger, in seconds
    #[arg(long, default_value_t = 0.5)]
    tmax: f64,

    /// Write trigger-locked EEG epochs to this .safetensors file
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write divisive-baseline pupil epochs to this .safetensors file
    #[arg(long)]
    pupil_output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let subject: Subject = match args.subject.parse::<u32>() {
        Ok(n) => Subject::Number(n),
        Err(_) => Subject::Label(args.subject.clone()),
    };

    let cfg = ReadConfig { folder: args.folder.clone(), ..ReadConfig::default() };
    let data = read_subject(subject, &cfg)?;

    let Some(mut raw) = data.raw else {
        println!("No EEG data for this subject");
        return Ok(());
    };
    let mut events = data.events.context("eeg without events")?;
    println!(
        "Loaded {} ch × {} samples @ {} Hz, {} events",
        raw.n_channels(),
        raw.n_times(),
        raw.sfreq,
        events.len()
    );
    if let Some(md) = &data.metadata {
        println!("Metadata: {} trials × {} columns", md.n_rows(), md.columns.len());
    }

    let maybe = |v: f64| if v > 0.0 { Some(v) } else { None };
    let bad: Vec<String> = if args.bad_channels.is_empty() {
        vec![]
    } else {
        args.bad_channels.split(',').map(str::to_string).collect()
    };
    let prep = PreprocessConfig {
        l_freq: maybe(args.l_freq),
        h_freq: maybe(args.h_freq),
        target_sfreq: maybe(args.target_sfreq),
        bad_channels: bad,
        average_reference: !args.no_reference,
    };
    preprocess_raw(&mut raw, &mut events, &prep)?;
    println!("Preprocessed: {} samples @ {} Hz", raw.n_times(), raw.sfreq);

    if let Some(code) = args.trigger {
        let ep = epochs(&raw, &events, code, args.tmin, args.tmax, true)?;
        println!(
            "Produced {} epochs of shape {:?} around trigger {code}",
            ep.n_epochs(),
            ep.data.dim()
        );
        if let Some(path) = &args.output {
            io::write_epochs(&ep, data.metadata.as_ref(), path)?;
            println!("Written → {}", path.display());
        }
        if let Some(path) = &args.pupil_output {
            let pe = PupilEpochs::from_raw(&raw, &events, code, args.tmin, args.tmax)?;
            io::write_pupil_epochs(&pe, path)?;
            println!("Written → {}", path.display());
        }
    }

    Ok(())
}
