/// Shared helpers: build a synthetic BIDS-style subject folder on disk.
use std::io::Write;
use std::path::Path;

/// Sampling rate of the synthetic EEG.
#[allow(unused)]
pub const SFREQ: f64 = 1000.0;
/// Samples in the synthetic recording (6 s at 1 kHz).
#[allow(unused)]
pub const N_TIMES: usize = 6000;

/// Write a complete `sub-01` folder under `root`:
///
/// * `eeg/` — 2-channel INT_16 BrainVision recording with two trials
///   (trial triggers S129 @ 1000 and S130 @ 3000, epoch triggers S1 at
///   +200 samples each);
/// * `eyetracking/` — matching 2-trial ASC export (1000 ms trace per trial,
///   one blink and one saccade in trial 1, `var condition` per trial);
/// * `beh/` — a 2-row behavioral CSV.
#[allow(unused)]
pub fn write_subject_dataset(root: &Path) {
    write_eeg(&root.join("sub-01").join("eeg"));
    write_asc(&root.join("sub-01").join("eyetracking"));
    write_beh(&root.join("sub-01").join("beh"), &["1,easy", "2,hard"]);
}

#[allow(unused)]
pub fn write_eeg(dir: &Path) {
    std::fs::create_dir_all(dir).unwrap();
    let vhdr = "\
Brain Vision Data Exchange Header File Version 1.0
[Common Infos]
DataFile=rec.eeg
MarkerFile=rec.vmrk
DataFormat=BINARY
DataOrientation=MULTIPLEXED
NumberOfChannels=2
SamplingInterval=1000

[Binary Infos]
BinaryFormat=INT_16

[Channel Infos]
Ch1=Fz,,0.1,µV
Ch2=Cz,,0.1,µV
";
    std::fs::write(dir.join("rec.vhdr"), vhdr).unwrap();

    // Positions are 1-based data points.
    let vmrk = "\
Brain Vision Data Exchange Marker File, Version 1.0
[Marker Infos]
Mk1=New Segment,,1,1,0,20240101120000000000
Mk2=Stimulus,S129,1001,1,0
Mk3=Stimulus,S  1,1201,1,0
Mk4=Stimulus,S130,3001,1,0
Mk5=Stimulus,S  1,3201,1,0
";
    std::fs::write(dir.join("rec.vmrk"), vmrk).unwrap();

    // Multiplexed little-endian INT_16: Fz is a 10 Hz sine, Cz a constant.
    let mut f = std::fs::File::create(dir.join("rec.eeg")).unwrap();
    for t in 0..N_TIMES {
        let phase = 2.0 * std::f64::consts::PI * 10.0 * t as f64 / SFREQ;
        let fz = (phase.sin() * 1000.0) as i16;
        let cz = 500i16;
        f.write_all(&fz.to_le_bytes()).unwrap();
        f.write_all(&cz.to_le_bytes()).unwrap();
    }
}

#[allow(unused)]
pub fn write_asc(dir: &Path) {
    std::fs::create_dir_all(dir).unwrap();
    let mut asc = String::from("** CONVERTED FROM rec.edf\n");
    // Tracker clocks chosen so that (phase onset − trace start) = 0 ms:
    // the per-trial eye offset is then exactly the EEG trigger interval
    // (200 samples) and each trace lands at its epoch trigger.
    for (trial, t0, condition) in [(1, 10100.0_f64, "easy"), (2, 20100.0, "hard")] {
        asc.push_str(&format!("MSG {} start_trial {trial}\n", t0 - 100.0));
        asc.push_str(&format!("MSG {t0} start_phase trial\n"));
        for j in 0..1000 {
            let t = t0 + j as f64;
            asc.push_str(&format!("{t}\t512.0\t384.0\t{}\t...\n", 1000.0 + j as f64 * 0.1));
        }
        if trial == 1 {
            // Saccade: 100 px jump over a 50 ms inter-fixation gap.
            asc.push_str(&format!(
                "EFIX R {} {} 100 300.0 300.0 1200\n",
                t0 + 50.0,
                t0 + 150.0
            ));
            asc.push_str(&format!(
                "EFIX R {} {} 100 400.0 300.0 1200\n",
                t0 + 200.0,
                t0 + 300.0
            ));
            // 40 ms blink.
            asc.push_str(&format!("EBLINK R {} {}\n", t0 + 200.0, t0 + 240.0));
        }
        asc.push_str(&format!("MSG {} end_phase trial\n", t0 + 1000.0));
        asc.push_str(&format!("MSG {} var condition {condition}\n", t0 + 1005.0));
        asc.push_str(&format!("MSG {} end_trial\n", t0 + 1010.0));
    }
    std::fs::write(dir.join("rec.asc"), asc).unwrap();
}

#[allow(unused)]
pub fn write_beh(dir: &Path, rows: &[&str]) {
    std::fs::create_dir_all(dir).unwrap();
    let mut csv = String::from("trial,condition\n");
    for row in rows {
        csv.push_str(row);
        csv.push('\n');
    }
    std::fs::write(dir.join("log.csv"), csv).unwrap();
}
