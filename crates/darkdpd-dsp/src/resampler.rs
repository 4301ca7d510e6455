//! Linear-interpolation upsampler.
//!
//! Each adjacent input pair (a, b) expands to `factor` output samples at
//! fractional positions j/factor, j = 0..factor:
//!   out = a * (1 - p) + b * p
//!
//! Output length is (N - 1) * factor. The last input sample is only ever an
//! interpolation endpoint and is never emitted on its own; callers size
//! their buffers on that length, so it must stay this way.

/// Lazy upsampler over a borrowed input slice.
#[derive(Debug, Clone)]
pub struct LinearUpsampler<'a> {
    samples: &'a [f64],
    factor: usize,
    /// Index of the left sample of the current pair.
    pair: usize,
    /// Sub-sample position within the current pair.
    step: usize,
}

impl<'a> LinearUpsampler<'a> {
    /// A `factor` of 0, or fewer than two samples, yields nothing.
    pub fn new(samples: &'a [f64], factor: usize) -> Self {
        Self {
            samples,
            factor,
            pair: 0,
            step: 0,
        }
    }

    fn remaining(&self) -> usize {
        let pairs = self.samples.len().saturating_sub(1);
        if self.factor == 0 || self.pair >= pairs {
            return 0;
        }
        (pairs - self.pair) * self.factor - self.step
    }
}

impl Iterator for LinearUpsampler<'_> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.remaining() == 0 {
            return None;
        }

        let a = self.samples[self.pair];
        let b = self.samples[self.pair + 1];
        let percentage = self.step as f64 / self.factor as f64;
        let value = a * (1.0 - percentage) + b * percentage;

        self.step += 1;
        if self.step == self.factor {
            self.step = 0;
            self.pair += 1;
        }
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for LinearUpsampler<'_> {}

/// Output length for `input_len` samples at `factor`.
pub fn upsampled_len(input_len: usize, factor: usize) -> usize {
    input_len.saturating_sub(1) * factor
}

/// Upsample by `factor` with linear interpolation.
pub fn upsample_linear(samples: &[f64], factor: usize) -> Vec<f64> {
    LinearUpsampler::new(samples, factor).collect()
}
