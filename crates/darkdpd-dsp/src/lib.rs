//! DarkDPD DSP library: amplifier nonlinearity and digital predistortion.
//!
//! Pure DSP math over in-memory sample buffers, plus the raw PCM / CSV
//! writers the experiment runner needs.

pub mod error;

// Amplifier models and their inverse
pub mod lut;
pub mod predistort;
pub mod transfer;

// Modulation chain
pub mod carrier;
pub mod modulator;
pub mod resampler;

// Sample and report I/O
pub mod pcm;
pub mod report;

pub use error::{DpdError, Result};
