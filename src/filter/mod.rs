//! Zero-phase FIR filtering: design + overlap-add application.
pub mod apply;
pub mod design;

pub use apply::{apply_fir_zero_phase, filter_1d};
pub use design::{
    auto_filter_length, design_bandpass, design_highpass, design_lowpass, firwin, hamming,
    highpass_trans_bandwidth, lowpass_trans_bandwidth,
};
