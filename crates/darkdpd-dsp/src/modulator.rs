//! DSB modulator -- linear upsample, mix with carrier, optional RF stage.
//!
//! Signal flow per output sample:
//!   baseband -> linear upsample (inline) -> x carrier -> stage -> out
//!
//! "Double balanced mixer": the product carrier * v with no carrier added and
//! no sideband filtering. The stage simulates the RF amplifier: pass-through,
//! the overdriven transfer function, or predistortion followed by it.
//!
//! Output length is (N - 1) * upsample_factor (see `resampler`) and values
//! are not renormalized.

use crate::carrier::CarrierOscillator;
use crate::lut::InverseLut;
use crate::predistort::Linearized;
use crate::resampler::LinearUpsampler;
use crate::transfer::TransferFunction;

/// Rate/carrier/upsampling for one modulation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModulatorConfig {
    /// Output sample rate (Hz) -- baseband rate * upsample_factor.
    pub output_rate: f64,
    pub carrier_freq: f64,
    pub upsample_factor: usize,
}

impl ModulatorConfig {
    /// 48 kHz baseband -> 4.8 MS/s, 50 kHz carrier.
    pub fn wideband() -> Self {
        Self {
            output_rate: 4_800_000.0,
            carrier_freq: 50_000.0,
            upsample_factor: 100,
        }
    }

    /// 48 kHz baseband -> 384 kS/s, 100 kHz carrier.
    pub fn rf384() -> Self {
        Self {
            output_rate: 384_000.0,
            carrier_freq: 100_000.0,
            upsample_factor: 8,
        }
    }

    /// 48 kHz baseband -> 384 kS/s, 50 kHz carrier (RF-stage distortion runs).
    pub fn rf384_low_carrier() -> Self {
        Self {
            carrier_freq: 50_000.0,
            ..Self::rf384()
        }
    }
}

/// Per-sample processing applied after mixing.
#[derive(Clone, Copy)]
pub enum Stage<'a> {
    /// Plain DSB.
    Identity,
    /// Mixed signal through a nonlinear amplifier.
    Distort(&'a dyn TransferFunction),
    /// Predistort, then the amplifier the table was built for.
    Corrected(Linearized<'a, &'a dyn TransferFunction>),
}

impl<'a> Stage<'a> {
    pub fn corrected(amplifier: &'a dyn TransferFunction, lut: &'a InverseLut) -> Self {
        Stage::Corrected(Linearized::new(amplifier, lut))
    }

    #[inline]
    pub fn apply(&self, mixed: f64) -> f64 {
        match self {
            Stage::Identity => mixed,
            Stage::Distort(amp) => amp.transfer(mixed),
            Stage::Corrected(chain) => chain.transfer(mixed),
        }
    }
}

impl std::fmt::Debug for Stage<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Identity => f.write_str("Identity"),
            Stage::Distort(_) => f.write_str("Distort"),
            Stage::Corrected(chain) => write!(f, "Corrected({} entries)", chain.lut().len()),
        }
    }
}

/// Streaming DSB modulator. Yields the same samples as [`modulate_dsb`]
/// without materializing the (N - 1) * factor output.
#[derive(Debug, Clone)]
pub struct DsbModulator<'a> {
    baseband: LinearUpsampler<'a>,
    carrier: CarrierOscillator,
    stage: Stage<'a>,
}

impl<'a> DsbModulator<'a> {
    pub fn new(samples: &'a [f64], config: &ModulatorConfig, stage: Stage<'a>) -> Self {
        Self {
            baseband: LinearUpsampler::new(samples, config.upsample_factor),
            carrier: CarrierOscillator::new(config.carrier_freq, config.output_rate),
            stage,
        }
    }

    /// Carrier phase after the samples generated so far.
    pub fn phase(&self) -> f64 {
        self.carrier.phase()
    }
}

impl Iterator for DsbModulator<'_> {
    type Item = f64;

    #[inline]
    fn next(&mut self) -> Option<f64> {
        let input_sample = self.baseband.next()?;
        let carrier = self.carrier.next_sample();
        Some(self.stage.apply(carrier * input_sample))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.baseband.size_hint()
    }
}

impl ExactSizeIterator for DsbModulator<'_> {}

/// DSB-modulate `samples`, materializing the whole output.
pub fn modulate_dsb(samples: &[f64], config: &ModulatorConfig, stage: Stage<'_>) -> Vec<f64> {
    DsbModulator::new(samples, config, stage).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::OverdrivenAmplifier;
    use std::f64::consts::{PI, TAU};

    fn test_signal(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 0.9 * (2.0 * PI * 700.0 * i as f64 / 48_000.0).sin())
            .collect()
    }

    #[test]
    fn test_ramp_scenario() {
        let config = ModulatorConfig::rf384();
        let out = modulate_dsb(&[0.0, 1.0], &config, Stage::Identity);
        assert_eq!(out.len(), 8);
        for (j, &y) in out.iter().enumerate() {
            let expected = (2.0 * PI * 100_000.0 * j as f64 / 384_000.0).sin() * (j as f64 / 8.0);
            assert!((y - expected).abs() < 1e-12, "j={j}: {y} vs {expected}");
        }
    }

    #[test]
    fn test_output_length() {
        let input = test_signal(101);
        for config in [
            ModulatorConfig::wideband(),
            ModulatorConfig::rf384(),
            ModulatorConfig::rf384_low_carrier(),
        ] {
            let out = modulate_dsb(&input, &config, Stage::Identity);
            assert_eq!(out.len(), 100 * config.upsample_factor);
        }
    }

    #[test]
    fn test_phase_after_m_samples() {
        let input = test_signal(500);
        let config = ModulatorConfig::rf384();
        let mut modulator = DsbModulator::new(&input, &config, Stage::Identity);
        let m = modulator.by_ref().count();
        assert_eq!(m, 499 * 8);

        let expected = (TAU * config.carrier_freq * m as f64 / config.output_rate).rem_euclid(TAU);
        let diff = (modulator.phase() - expected).rem_euclid(TAU);
        let diff = diff.min(TAU - diff);
        assert!(diff <= 1e-9 * TAU, "phase {} vs {expected}", modulator.phase());
    }

    #[test]
    fn test_streaming_matches_materialized() {
        let input = test_signal(64);
        let amp = OverdrivenAmplifier::new();
        let lut = InverseLut::build_default(&amp).unwrap();
        let config = ModulatorConfig::rf384_low_carrier();

        for stage in [
            Stage::Identity,
            Stage::Distort(&amp),
            Stage::corrected(&amp, &lut),
        ] {
            let whole = modulate_dsb(&input, &config, stage);
            let streamed: Vec<f64> = DsbModulator::new(&input, &config, stage).collect();
            assert_eq!(whole, streamed, "{stage:?}");
        }
    }

    #[test]
    fn test_overdriven_stage_droops() {
        let input = test_signal(200);
        let amp = OverdrivenAmplifier::new();
        let config = ModulatorConfig::rf384_low_carrier();
        let clean = modulate_dsb(&input, &config, Stage::Identity);
        let distorted = modulate_dsb(&input, &config, Stage::Distort(&amp));

        let mut checked = 0;
        for (c, d) in clean.iter().zip(&distorted) {
            if c.abs() > 0.1 {
                assert!(d.abs() <= c.abs(), "no droop: clean {c}, distorted {d}");
                checked += 1;
            }
        }
        assert!(checked > 100);
    }

    #[test]
    fn test_corrected_stage_is_linear() {
        let input = test_signal(200);
        let amp = OverdrivenAmplifier::new();
        let lut = InverseLut::build_default(&amp).unwrap();
        let config = ModulatorConfig::rf384_low_carrier();
        let clean = modulate_dsb(&input, &config, Stage::Identity);
        let corrected = modulate_dsb(&input, &config, Stage::corrected(&amp, &lut));
        let distorted = modulate_dsb(&input, &config, Stage::Distort(&amp));

        // Corrected output tracks 0.8 * clean; raw distortion does not
        let worst = |out: &[f64]| {
            clean
                .iter()
                .zip(out)
                .map(|(c, o)| (o - 0.8 * c).abs())
                .fold(0.0f64, f64::max)
        };
        let corrected_err = worst(&corrected);
        let distorted_err = worst(&distorted);
        assert!(corrected_err < 2e-4, "corrected error {corrected_err:.3e}");
        assert!(distorted_err > 100.0 * corrected_err);
    }

    #[test]
    fn test_corrected_stage_matches_linearized_chain() {
        let input = test_signal(50);
        let amp = OverdrivenAmplifier::new();
        let lut = InverseLut::build_default(&amp).unwrap();
        let config = ModulatorConfig::rf384_low_carrier();
        let chain = Linearized::new(amp, &lut);

        let clean = modulate_dsb(&input, &config, Stage::Identity);
        let via_chain = modulate_dsb(&input, &config, Stage::Distort(&chain));
        let corrected = modulate_dsb(&input, &config, Stage::corrected(&amp, &lut));
        assert_eq!(corrected, via_chain);
        assert_eq!(
            corrected,
            clean.iter().map(|&m| chain.transfer(m)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_short_input_is_empty() {
        let config = ModulatorConfig::rf384();
        assert!(modulate_dsb(&[0.5], &config, Stage::Identity).is_empty());
        assert_eq!(DsbModulator::new(&[], &config, Stage::Identity).len(), 0);
    }
}
