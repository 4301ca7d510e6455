//! Inverse lookup table for a monotonic transfer function.
//!
//! Finding the closed-form inverse of x - k*x^3 (or anything with more odd
//! terms) is ugly, so we tabulate it instead. The output range
//! [0, f(1.0)] is split into `size - 1` equal steps; entry i holds the input
//! that drives the amplifier to step i:
//!
//!   f(LUT[i]) ~= f(1.0) * i / (size - 1)
//!
//! Each entry is found by bisection on [0, 1]. The target is linear in i,
//! so reading the table back with interpolation gives an input warp that
//! makes the amplifier's overall response a straight line from 0 to f(1.0).
//!
//! The default tolerance 1e-4 is roughly -80 dB relative error.

use log::{debug, warn};

use crate::error::{DpdError, Result};
use crate::transfer::TransferFunction;

pub const DEFAULT_SIZE: usize = 2048;
pub const DEFAULT_TOLERANCE: f64 = 1e-4;
/// Bisection halves a unit interval; 100 steps is far below f64 resolution.
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LutConfig {
    /// Number of entries (`size - 1` intervals).
    pub size: usize,
    /// Acceptable |f(x) - target| per entry. Adjacent entries are only
    /// guaranteed ordered while the target step f(1.0) / (size - 1) exceeds
    /// twice this.
    pub tolerance: f64,
    /// Bisection step cap per entry.
    pub max_iterations: u32,
}

impl Default for LutConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl LutConfig {
    fn validate(&self) -> Result<()> {
        if self.size < 2 {
            return Err(DpdError::InvalidLutConfig(format!(
                "size must be at least 2, got {}",
                self.size
            )));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(DpdError::InvalidLutConfig(format!(
                "tolerance must be finite and positive, got {}",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(DpdError::InvalidLutConfig(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// An entry whose bisection hit the iteration cap before reaching tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unconverged {
    pub index: usize,
    pub target: f64,
    /// Best input found (smallest error seen during the search).
    pub estimate: f64,
    /// |f(estimate) - target|.
    pub error: f64,
}

/// Immutable inverse table. Built once, then shared by reference.
#[derive(Debug, Clone)]
pub struct InverseLut {
    entries: Vec<f64>,
    unconverged: Vec<Unconverged>,
}

/// Outcome of one bisection search.
struct Search {
    estimate: f64,
    error: f64,
    converged: bool,
}

/// Bisect [0, 1] for f(x) = target.
///
/// Tracks the best midpoint so an exhausted search still returns something
/// usable. When the search converges the result is the converging midpoint,
/// same as an uncapped loop would produce.
fn bisect<F: TransferFunction + ?Sized>(
    transfer: &F,
    target: f64,
    tolerance: f64,
    max_iterations: u32,
) -> Search {
    let mut min = 0.0;
    let mut max = 1.0;
    let mut best = Search {
        estimate: 0.0,
        error: f64::INFINITY,
        converged: false,
    };

    for _ in 0..max_iterations {
        let mid = (min + max) / 2.0;
        let current = transfer.transfer(mid);
        if current < target {
            min = mid;
        } else {
            max = mid;
        }

        let error = (target - current).abs();
        if error <= tolerance {
            return Search {
                estimate: mid,
                error,
                converged: true,
            };
        }
        // NaN never compares less, so a NaN-producing model keeps the initial guess
        if error < best.error {
            best.estimate = mid;
            best.error = error;
        }
    }

    best
}

impl InverseLut {
    /// Tabulate the inverse of `transfer` over its output range [0, f(1.0)].
    ///
    /// Requires f(0) = 0 and f monotonic non-decreasing on [0, 1]; entry 0 is
    /// set to 0 without searching. Entries that fail to converge within
    /// `max_iterations` keep their best estimate, are logged, and show up in
    /// [`InverseLut::unconverged`].
    pub fn build<F: TransferFunction + ?Sized>(transfer: &F, config: &LutConfig) -> Result<Self> {
        config.validate()?;

        let size = config.size;
        let full_scale = transfer.transfer(1.0);
        let mut entries = vec![0.0f64; size];
        let mut unconverged = Vec::new();

        // 0 in is always 0 out
        for i in 1..size {
            let percentage = i as f64 / (size - 1) as f64;
            let target = full_scale * percentage;
            let search = bisect(transfer, target, config.tolerance, config.max_iterations);

            if !search.converged {
                warn!(
                    "LUT entry {i} did not converge after {} iterations: target {target:.6}, best {:.9}, error {:.3e}",
                    config.max_iterations, search.estimate, search.error
                );
                unconverged.push(Unconverged {
                    index: i,
                    target,
                    estimate: search.estimate,
                    error: search.error,
                });
            }
            entries[i] = search.estimate;
        }

        let lut = Self {
            entries,
            unconverged,
        };

        if !lut.is_monotonic() {
            warn!("inverse LUT is not monotonic; tolerance may be too coarse for {size} entries");
        }
        debug!(
            "built inverse LUT: {size} entries, full scale {full_scale:.6}, last entry {:.6}, {} unconverged",
            lut.last(),
            lut.unconverged.len()
        );

        Ok(lut)
    }

    /// Build with the default 2048-entry, 1e-4 configuration.
    pub fn build_default<F: TransferFunction + ?Sized>(transfer: &F) -> Result<Self> {
        Self::build(transfer, &LutConfig::default())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[f64] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.entries.get(index).copied()
    }

    /// Input that drives the amplifier to its maximum output.
    pub fn last(&self) -> f64 {
        self.entries[self.entries.len() - 1]
    }

    pub fn unconverged(&self) -> &[Unconverged] {
        &self.unconverged
    }

    pub fn is_converged(&self) -> bool {
        self.unconverged.is_empty()
    }

    /// True when entries are non-decreasing.
    pub fn is_monotonic(&self) -> bool {
        self.entries.windows(2).all(|w| w[0] <= w[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::{LinearAmplifier, OverdrivenAmplifier};

    /// Flat at 0.25 on [0.5, 1): targets above 0.25 have no preimage short of 1.0.
    struct Plateau;

    impl TransferFunction for Plateau {
        fn transfer(&self, input: f64) -> f64 {
            input.min(0.5) * 0.5 + if input >= 1.0 { 0.5 } else { 0.0 }
        }
    }

    #[test]
    fn test_entry_zero_is_zero() {
        let lut = InverseLut::build_default(&OverdrivenAmplifier::new()).unwrap();
        assert_eq!(lut.len(), DEFAULT_SIZE);
        assert_eq!(lut.entries()[0], 0.0);
    }

    #[test]
    fn test_last_entry_near_full_scale() {
        let lut = InverseLut::build_default(&OverdrivenAmplifier::new()).unwrap();
        // Target is exactly f(1.0), so the inverse is x = 1.0
        let last = lut.entries()[2047];
        assert!((last - 1.0).abs() < 1e-3, "last entry {last}");
    }

    #[test]
    fn test_every_entry_within_tolerance() {
        let amp = OverdrivenAmplifier::new();
        let config = LutConfig::default();
        let lut = InverseLut::build(&amp, &config).unwrap();
        assert!(lut.is_converged());
        for (i, &x) in lut.entries().iter().enumerate().skip(1) {
            let target = amp.max_output() * (i as f64 / (config.size - 1) as f64);
            let err = (amp.transfer(x) - target).abs();
            assert!(err <= config.tolerance, "entry {i}: error {err:.3e}");
        }
    }

    #[test]
    fn test_monotonic() {
        let lut = InverseLut::build_default(&OverdrivenAmplifier::new()).unwrap();
        assert!(lut.is_monotonic());
        assert!(lut.entries().iter().all(|&x| (0.0..=1.0).contains(&x)));
    }

    #[test]
    fn test_linear_inverse_is_identity_ramp() {
        // f(x) = 2x: target 2*i/(n-1), inverse i/(n-1)
        let config = LutConfig {
            size: 65,
            tolerance: 1e-9,
            ..LutConfig::default()
        };
        let lut = InverseLut::build(&LinearAmplifier::new(), &config).unwrap();
        for (i, &x) in lut.entries().iter().enumerate() {
            let expected = i as f64 / 64.0;
            assert!((x - expected).abs() < 1e-8, "entry {i}: {x} vs {expected}");
        }
    }

    #[test]
    fn test_unreachable_tolerance_terminates() {
        let config = LutConfig {
            size: 16,
            tolerance: 1e-6,
            max_iterations: 40,
        };
        let lut = InverseLut::build(&Plateau, &config).unwrap();
        assert!(!lut.is_converged());
        assert_eq!(lut.len(), 16);

        // Targets above 0.25 (plateau height) and below 1.0 can't be reached
        for u in lut.unconverged() {
            assert!(u.target > 0.25, "entry {} should have converged", u.index);
            assert!(u.error > config.tolerance);
            assert!(u.estimate.is_finite());
        }
        // Entry 1 (target 1/15) is on the ramp and converges
        assert!(lut.unconverged().iter().all(|u| u.index != 1));
    }

    #[test]
    fn test_iteration_cap_reports_best_estimate() {
        // A single bisection step cannot get within 1e-4 of most targets
        let config = LutConfig {
            size: 8,
            tolerance: 1e-4,
            max_iterations: 1,
        };
        let lut = InverseLut::build(&OverdrivenAmplifier::new(), &config).unwrap();
        assert!(!lut.unconverged().is_empty());
        for u in lut.unconverged() {
            assert_eq!(u.estimate, 0.5, "one step only ever evaluates the midpoint");
            assert_eq!(lut.entries()[u.index], u.estimate);
        }
    }

    #[test]
    fn test_rejects_bad_config() {
        let amp = OverdrivenAmplifier::new();
        for config in [
            LutConfig { size: 1, ..LutConfig::default() },
            LutConfig { tolerance: 0.0, ..LutConfig::default() },
            LutConfig { tolerance: f64::NAN, ..LutConfig::default() },
            LutConfig { max_iterations: 0, ..LutConfig::default() },
        ] {
            let result = InverseLut::build(&amp, &config);
            assert!(
                matches!(result, Err(DpdError::InvalidLutConfig(_))),
                "accepted {config:?}"
            );
        }
    }

    #[test]
    fn test_two_entry_table() {
        let lut = InverseLut::build(
            &OverdrivenAmplifier::new(),
            &LutConfig { size: 2, ..LutConfig::default() },
        )
        .unwrap();
        assert_eq!(lut.len(), 2);
        assert_eq!(lut.get(0), Some(0.0));
        assert!((lut.last() - 1.0).abs() < 1e-3);
        assert_eq!(lut.get(2), None);
    }
}
