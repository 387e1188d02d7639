//! EyeLink eye-tracking input: ASC parsing and trace processing.
pub mod asc;
pub mod trace;

pub use asc::{parse_asc, AscOptions, Blink, EyeTrial, Fixation};
pub use trace::{downsample_mean, reconstruct_blinks};

use anyhow::{Context, Result};
use std::path::Path;

/// Read the first `.asc` file in `dir`, or `None` when the directory holds no
/// ASC export. Binary `.edf` files are not read directly; convert with
/// `edf2asc` first.
pub fn read_eye_folder(dir: &Path, opts: &AscOptions) -> Result<Option<Vec<EyeTrial>>> {
    let mut asc_files: Vec<_> = std::fs::read_dir(dir)
        .with_context(|| format!("listing {}", dir.display()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("asc")))
        .collect();
    asc_files.sort();
    let Some(path) = asc_files.first() else {
        return Ok(None);
    };
    log::info!("loading eye data from {}", path.display());
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let trials = parse_asc(&text, opts)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(trials))
}
