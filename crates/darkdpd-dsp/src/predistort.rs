//! Predistortion -- interpolated, sign-aware inverse-LUT lookup.
//!
//! The table covers input magnitudes [0, 1] at `size - 1` uniform steps:
//!   pos  = |x| * (size - 1)
//!   idx  = floor(pos), frac = pos - idx
//!   y    = (1 - frac) * LUT[idx] + frac * LUT[idx + 1]
//!
//! Magnitudes at or past the last table point clamp to LUT[size - 1] (no
//! extrapolation; also keeps idx + 1 in bounds). The sign is stripped before
//! lookup and re-applied after, so predistort is odd by construction.
//!
//! Feeding the result to the amplifier the table was built from gives
//!   f(predistort(x)) ~= f(1.0) * x     for |x| <= 1
//! to within the build tolerance.

use crate::lut::InverseLut;
use crate::transfer::TransferFunction;

/// Warp `input` through the inverse table.
pub fn predistort(input: f64, lut: &InverseLut) -> f64 {
    let entries = lut.entries();
    let last = entries.len() - 1;
    let magnitude = input.abs();
    let pos = magnitude * last as f64;

    let output = if pos >= last as f64 {
        // Requesting max output, cannot interpolate
        entries[last]
    } else {
        let idx = pos as usize;
        let frac = pos - idx as f64;
        (1.0 - frac) * entries[idx] + frac * entries[idx + 1]
    };

    if input < 0.0 { -output } else { output }
}

impl InverseLut {
    pub fn predistort(&self, input: f64) -> f64 {
        predistort(input, self)
    }
}

/// An amplifier driven through its inverse table: `amplifier(predistort(x))`.
#[derive(Debug, Clone, Copy)]
pub struct Linearized<'a, A> {
    amplifier: A,
    lut: &'a InverseLut,
}

impl<'a, A: TransferFunction> Linearized<'a, A> {
    pub fn new(amplifier: A, lut: &'a InverseLut) -> Self {
        Self { amplifier, lut }
    }

    pub fn lut(&self) -> &'a InverseLut {
        self.lut
    }
}

impl<A: TransferFunction> TransferFunction for Linearized<'_, A> {
    fn transfer(&self, input: f64) -> f64 {
        self.amplifier.transfer(self.lut.predistort(input))
    }
}
