//! Trace processing: blink reconstruction and downsampling.
//!
//! The pupil trace collapses to (near) zero during blinks; downstream
//! analyses want those stretches replaced, not dropped. Reconstruction
//! interpolates linearly from just before blink onset to just after offset,
//! with a margin to cover the partial-occlusion ramps the tracker does not
//! flag.
use super::asc::Blink;

/// Linearly interpolate the signal across each blink, widened by `margin_ms`
/// on both sides. `t` and `signal` must be the same length; `t` is the sample
/// clock in ms. Blinks at the very edge of the trace are clamped to the
/// nearest valid sample.
pub fn reconstruct_blinks(t: &[f64], signal: &mut [f64], blinks: &[Blink], margin_ms: f64) {
    if t.is_empty() {
        return;
    }
    for blink in blinks {
        let lo = blink.start_ms - margin_ms;
        let hi = blink.end_ms + margin_ms;
        // First sample at or after lo, last sample at or before hi.
        let i0 = t.partition_point(|&v| v < lo);
        let i1 = t.partition_point(|&v| v <= hi);
        if i0 >= i1 {
            continue;
        }
        let left = i0.checked_sub(1);
        let right = if i1 < t.len() { Some(i1) } else { None };
        match (left, right) {
            (Some(l), Some(r)) => {
                let (t0, v0) = (t[l], signal[l]);
                let (t1, v1) = (t[r], signal[r]);
                let span = t1 - t0;
                for i in i0..i1 {
                    let frac = if span > 0.0 { (t[i] - t0) / span } else { 0.0 };
                    signal[i] = v0 + frac * (v1 - v0);
                }
            }
            // Blink touches the trace edge: hold the nearest valid value.
            (Some(l), None) => {
                let v = signal[l];
                signal[i0..i1].iter_mut().for_each(|s| *s = v);
            }
            (None, Some(r)) => {
                let v = signal[r];
                signal[i0..i1].iter_mut().for_each(|s| *s = v);
            }
            (None, None) => {}
        }
    }
}

/// Downsample by averaging consecutive bins of `factor` samples. NaNs within
/// a bin are skipped; an all-NaN bin stays NaN. Trailing samples that do not
/// fill a bin are dropped, as in fixed-length epoching.
pub fn downsample_mean(signal: &[f64], factor: usize) -> Vec<f64> {
    assert!(factor > 0, "downsample factor must be positive");
    signal
        .chunks_exact(factor)
        .map(|bin| {
            let mut sum = 0.0;
            let mut n = 0usize;
            for &v in bin {
                if !v.is_nan() {
                    sum += v;
                    n += 1;
                }
            }
            if n == 0 { f64::NAN } else { sum / n as f64 }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blink_is_interpolated() {
        let t: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let mut p = vec![10.0, 10.0, 10.0, 0.0, 0.0, 0.0, 16.0, 16.0, 16.0, 16.0];
        reconstruct_blinks(&t, &mut p, &[Blink { start_ms: 3.0, end_ms: 5.0 }], 0.0);
        // Interpolation runs from (2, 10) to (6, 16): slope 1.5 per ms.
        approx::assert_abs_diff_eq!(p[3], 11.5, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(p[4], 13.0, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(p[5], 14.5, epsilon = 1e-12);
    }

    #[test]
    fn margin_widens_the_window() {
        let t: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let mut p = vec![10.0; 10];
        p[4] = 0.0;
        p[3] = 2.0; // partial occlusion before the flagged blink
        reconstruct_blinks(&t, &mut p, &[Blink { start_ms: 4.0, end_ms: 4.0 }], 1.0);
        approx::assert_abs_diff_eq!(p[3], 10.0, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(p[4], 10.0, epsilon = 1e-12);
    }

    #[test]
    fn blink_at_trace_end_holds_last_value() {
        let t: Vec<f64> = (0..5).map(|i| i as f64).collect();
        let mut p = vec![8.0, 8.0, 8.0, 0.0, 0.0];
        reconstruct_blinks(&t, &mut p, &[Blink { start_ms: 3.0, end_ms: 4.0 }], 0.0);
        approx::assert_abs_diff_eq!(p[3], 8.0, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(p[4], 8.0, epsilon = 1e-12);
    }

    #[test]
    fn downsample_means_and_truncates() {
        let x: Vec<f64> = (0..25).map(|i| i as f64).collect();
        let y = downsample_mean(&x, 10);
        assert_eq!(y.len(), 2);
        approx::assert_abs_diff_eq!(y[0], 4.5, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(y[1], 14.5, epsilon = 1e-12);
    }

    #[test]
    fn downsample_skips_nan() {
        let x = vec![1.0, f64::NAN, 3.0, f64::NAN, f64::NAN, f64::NAN];
        let y = downsample_mean(&x, 3);
        approx::assert_abs_diff_eq!(y[0], 2.0, epsilon = 1e-12);
        assert!(y[1].is_nan());
    }
}
