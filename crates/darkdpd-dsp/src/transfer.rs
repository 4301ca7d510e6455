//! Amplifier transfer functions -- memoryless amplitude maps.
//!
//! Two fixed models:
//!   linear:     y = gain * x            (gain 2.0 = +6 dB voltage)
//!   overdriven: y = x - k * x^3         (k 0.2, IMD3 compression)
//!
//! The overdriven amp only reaches 80% output at full-scale input
//! (1 - 0.2 = 0.8), which caps the linear range predistortion can recover.
//!
//! Inversion (see `lut`) assumes f(0) = 0, f odd, and f monotonic
//! non-decreasing on [0, 1]. Nothing here checks that; a model violating it
//! produces an undefined table.

/// Linear amp voltage gain: 2x voltage = 4x power = +6 dB.
pub const LINEAR_GAIN: f64 = 2.0;

/// Cubic coefficient of the overdriven amp.
pub const OVERDRIVE_K: f64 = 0.2;

/// Memoryless input -> output amplitude mapping.
///
/// Must be evaluable for any real input; LUT construction and interpolation
/// both evaluate it outside [-1, 1].
pub trait TransferFunction {
    fn transfer(&self, input: f64) -> f64;
}

impl<T: TransferFunction + ?Sized> TransferFunction for &T {
    fn transfer(&self, input: f64) -> f64 {
        (**self).transfer(input)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearAmplifier {
    pub gain: f64,
}

impl LinearAmplifier {
    pub fn new() -> Self {
        Self { gain: LINEAR_GAIN }
    }
}

impl Default for LinearAmplifier {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferFunction for LinearAmplifier {
    fn transfer(&self, input: f64) -> f64 {
        self.gain * input
    }
}

/// Amplifier whose output droops toward full scale (third-order term).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverdrivenAmplifier {
    /// Cubic coefficient. Monotonic on [0, 1] for k <= 1/3.
    pub k: f64,
}

impl OverdrivenAmplifier {
    pub fn new() -> Self {
        Self { k: OVERDRIVE_K }
    }

    /// Largest output reachable from a full-scale input.
    pub fn max_output(&self) -> f64 {
        self.transfer(1.0)
    }
}

impl Default for OverdrivenAmplifier {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferFunction for OverdrivenAmplifier {
    fn transfer(&self, input: f64) -> f64 {
        input - self.k * input * input * input
    }
}
