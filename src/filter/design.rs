//! FIR filter design (Hamming-windowed sinc, MNE conventions).
//!
//! Transition bandwidths and filter lengths follow the `firwin` auto rules:
//!   • highpass: trans_bw = min(max(0.25 · l_freq, 2.0), l_freq)
//!   • lowpass:  trans_bw = min(max(0.25 · h_freq, 2.0), sfreq/2 − h_freq)
//!   • length:   ceil(3.3 / trans_bw · sfreq), rounded up to odd
use std::f64::consts::PI;

/// Transition bandwidth for a highpass at `l_freq` Hz.
pub fn highpass_trans_bandwidth(l_freq: f64) -> f64 {
    (0.25 * l_freq).max(2.0).min(l_freq)
}

/// Transition bandwidth for a lowpass at `h_freq` Hz.
pub fn lowpass_trans_bandwidth(h_freq: f64, sfreq: f64) -> f64 {
    (0.25 * h_freq).max(2.0).min(sfreq / 2.0 - h_freq)
}

/// Number of FIR taps for a given transition bandwidth, rounded up to odd
/// (odd length is required for a zero-phase linear-phase filter).
pub fn auto_filter_length(trans_bw: f64, sfreq: f64) -> usize {
    let n_raw = (3.3 / trans_bw * sfreq).ceil() as usize;
    if n_raw % 2 == 0 { n_raw + 1 } else { n_raw }
}

/// Zero-phase highpass FIR at `l_freq` Hz via spectral inversion of a
/// windowed-sinc lowpass placed at the transition-band midpoint.
pub fn design_highpass(l_freq: f64, sfreq: f64) -> Vec<f64> {
    let trans_bw = highpass_trans_bandwidth(l_freq);
    let n = auto_filter_length(trans_bw, sfreq);
    let l_stop = l_freq - trans_bw;
    let cutoff_hz = (l_stop + l_freq) / 2.0;
    firwin(n, cutoff_hz, sfreq, false)
}

/// Zero-phase lowpass FIR at `h_freq` Hz.
pub fn design_lowpass(h_freq: f64, sfreq: f64) -> Vec<f64> {
    let trans_bw = lowpass_trans_bandwidth(h_freq, sfreq);
    let n = auto_filter_length(trans_bw, sfreq);
    let cutoff_hz = h_freq + trans_bw / 2.0;
    firwin(n, cutoff_hz, sfreq, true)
}

/// Band-pass FIR: the highpass and lowpass kernels convolved into a single
/// impulse response (odd length, still linear-phase).
pub fn design_bandpass(l_freq: f64, h_freq: f64, sfreq: f64) -> Vec<f64> {
    assert!(l_freq < h_freq, "bandpass needs l_freq < h_freq");
    let hp = design_highpass(l_freq, sfreq);
    let lp = design_lowpass(h_freq, sfreq);
    convolve(&hp, &lp)
}

/// Windowed-sinc FIR design. `pass_zero = true` gives a lowpass with unit DC
/// gain; `false` spectrally inverts to a highpass.
pub fn firwin(n: usize, cutoff_hz: f64, sfreq: f64, pass_zero: bool) -> Vec<f64> {
    assert!(n % 2 == 1, "firwin requires odd N for linear-phase filter");
    let alpha = (n - 1) as f64 / 2.0;
    let nyq = sfreq / 2.0;
    let fc = cutoff_hz / nyq; // normalised [0, 1]

    let win = hamming(n);
    let mut h: Vec<f64> = (0..n)
        .map(|i| {
            let x = i as f64 - alpha;
            // sin(π·fc·x) / (π·x); limit at x=0 is fc.
            let sinc = if x == 0.0 { fc } else { (PI * fc * x).sin() / (PI * x) };
            sinc * win[i]
        })
        .collect();

    // Unit DC gain for the lowpass prototype.
    let s: f64 = h.iter().sum();
    h.iter_mut().for_each(|v| *v /= s);

    if !pass_zero {
        // Spectral inversion: highpass = delta[N/2] − lowpass.
        h.iter_mut().for_each(|v| *v = -*v);
        h[n / 2] += 1.0;
    }
    h
}

/// Hamming window of length `n`.
pub fn hamming(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}

/// Full linear convolution, length `a.len() + b.len() - 1`.
fn convolve(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &av) in a.iter().enumerate() {
        for (j, &bv) in b.iter().enumerate() {
            out[i + j] += av * bv;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_lengths_are_odd() {
        for l_freq in [0.1, 0.5, 1.0, 2.0] {
            let tb = highpass_trans_bandwidth(l_freq);
            let n = auto_filter_length(tb, 1000.0);
            assert!(n % 2 == 1, "N={n} is even for l_freq={l_freq}");
        }
        assert!(design_bandpass(1.0, 40.0, 1000.0).len() % 2 == 1);
    }

    #[test]
    fn highpass_sum_near_zero() {
        // No DC passes a highpass: taps sum to ≈ 0.
        let h = design_highpass(0.5, 256.0);
        let s: f64 = h.iter().sum();
        assert!(s.abs() < 1e-9, "highpass sum = {s}");
    }

    #[test]
    fn lowpass_dc_gain_unity() {
        let h = design_lowpass(40.0, 1000.0);
        let dc: f64 = h.iter().sum();
        approx::assert_abs_diff_eq!(dc, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn kernels_are_symmetric() {
        for h in [design_highpass(0.5, 256.0), design_lowpass(40.0, 1000.0)] {
            let n = h.len();
            for i in 0..n / 2 {
                approx::assert_abs_diff_eq!(h[i], h[n - 1 - i], epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn highpass_known_length_256hz() {
        // At 256 Hz / 0.5 Hz the auto rules give 1691 taps.
        assert_eq!(design_highpass(0.5, 256.0).len(), 1691);
    }

    #[test]
    fn bandpass_kills_dc_passes_band() {
        let h = design_bandpass(1.0, 40.0, 1000.0);
        let dc: f64 = h.iter().sum();
        assert!(dc.abs() < 1e-6, "bandpass DC gain = {dc}");
        // Gain at 10 Hz should be ≈ 1.
        let n = h.len();
        let omega = 2.0 * PI * 10.0 / 1000.0;
        let (mut re, mut im) = (0.0, 0.0);
        for (i, &v) in h.iter().enumerate() {
            let phase = omega * (i as f64 - (n - 1) as f64 / 2.0);
            re += v * phase.cos();
            im += v * phase.sin();
        }
        let gain = (re * re + im * im).sqrt();
        approx::assert_abs_diff_eq!(gain, 1.0, epsilon = 1e-3);
    }
}
