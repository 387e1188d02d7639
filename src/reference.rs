//! Average reference: subtract the mean of the EEG channels at each time
//! point from each EEG channel.
//!
//! `include[c] == false` keeps channel `c` out of the mean *and* leaves it
//! unreferenced — merged gaze/pupil channels must never shift the EEG
//! reference, nor be shifted by it.
use ndarray::Array2;

pub fn average_reference_inplace(data: &mut Array2<f64>, include: &[bool]) {
    let n_ch = data.nrows();
    let n_t = data.ncols();
    let n_inc = include.iter().filter(|&&b| b).count();
    if n_inc == 0 {
        return;
    }
    for t in 0..n_t {
        let mut sum = 0.0;
        for c in 0..n_ch {
            if include[c] {
                sum += data[[c, t]];
            }
        }
        let mean = sum / n_inc as f64;
        for c in 0..n_ch {
            if include[c] {
                data[[c, t]] -= mean;
            }
        }
    }
}
