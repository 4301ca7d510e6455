//! Transfer-curve report: the amplifier curves and the predistorted chain
//! side by side over 0..100% input, for plotting.

use std::path::Path;

use crate::error::{DpdError, Result};
use crate::lut::InverseLut;
use crate::transfer::TransferFunction;

/// Number of rows: 0%, 1%, ..., 100%.
pub const CURVE_POINTS: usize = 101;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePoint {
    pub input: f64,
    pub linear: f64,
    pub overdriven: f64,
    pub predistorted: f64,
    /// overdriven(predistorted) -- should be a straight line.
    pub corrected: f64,
}

pub fn transfer_curve(
    lut: &InverseLut,
    linear: &dyn TransferFunction,
    overdriven: &dyn TransferFunction,
) -> Vec<CurvePoint> {
    (0..CURVE_POINTS)
        .map(|i| {
            let input = i as f64 / (CURVE_POINTS - 1) as f64;
            let predistorted = lut.predistort(input);
            CurvePoint {
                input,
                linear: linear.transfer(input),
                overdriven: overdriven.transfer(input),
                predistorted,
                corrected: overdriven.transfer(predistorted),
            }
        })
        .collect()
}

pub fn to_csv(points: &[CurvePoint]) -> String {
    let mut lines = Vec::with_capacity(points.len() + 1);
    lines.push("input,linear,overdriven,predistorted,corrected".to_string());
    for p in points {
        lines.push(format!(
            "{},{},{},{},{}",
            p.input, p.linear, p.overdriven, p.predistorted, p.corrected
        ));
    }
    lines.join("\n") + "\n"
}

pub fn write_csv(path: impl AsRef<Path>, points: &[CurvePoint]) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, to_csv(points)).map_err(|e| DpdError::io(path, e))
}
