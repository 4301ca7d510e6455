//! Phase-accumulator sine oscillator.
//!
//! The phase advances by 2*pi*freq/rate per sample and is wrapped into
//! [0, 2*pi) after every step. Without the wrap the accumulator grows without
//! bound and sin() loses precision over a long render.

use std::f64::consts::TAU;

#[derive(Debug, Clone)]
pub struct CarrierOscillator {
    phase: f64,
    phase_inc: f64,
}

impl CarrierOscillator {
    pub fn new(freq_hz: f64, sample_rate: f64) -> Self {
        debug_assert!(
            sample_rate.is_finite() && sample_rate > 0.0,
            "sample rate must be positive, got {sample_rate}"
        );
        Self {
            phase: 0.0,
            phase_inc: freq_hz * TAU / sample_rate,
        }
    }

    /// sin(phase), then advance.
    #[inline]
    pub fn next_sample(&mut self) -> f64 {
        let value = self.phase.sin();
        self.phase = (self.phase + self.phase_inc).rem_euclid(TAU);
        value
    }

    /// Current phase in radians, in [0, 2*pi).
    pub fn phase(&self) -> f64 {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

/// `num_samples` of `amplitude * sin(2*pi*freq*t)` starting at phase 0.
pub fn sine_tone(freq_hz: f64, amplitude: f64, num_samples: usize, sample_rate: f64) -> Vec<f64> {
    let mut osc = CarrierOscillator::new(freq_hz, sample_rate);
    (0..num_samples).map(|_| amplitude * osc.next_sample()).collect()
}
