//! DPD Render: predistortion experiment runner.
//!
//! Builds the inverse LUT for the overdriven amplifier, writes the transfer
//! curve report, then renders a pure tone (and optionally a voice recording)
//! through the linear amp, the overdriven amp, predistortion, and DSB
//! modulation at 384 kS/s and 4.8 MS/s. Everything is raw s16le mono.
//!
//! Usage:
//!   dpd-render [--output-dir DIR] [--voice voice.raw] [--duration SECS] [--wav]

mod experiments;

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use darkdpd_dsp::lut::{self, LutConfig};
use env_logger::Env;
use log::info;

use experiments::RenderConfig;

/// Render amplifier-distortion and predistortion experiments to raw PCM
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory for all output artifacts
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Raw s16le 48 kHz voice recording; voice experiments run only when given
    #[arg(long, value_name = "FILE")]
    voice: Option<PathBuf>,

    /// Tone length in seconds
    #[arg(short, long, default_value_t = 10.0)]
    duration: f64,

    /// Tone frequency in Hz
    #[arg(long, default_value_t = 700.0)]
    tone_freq: f64,

    /// Inverse LUT entries
    #[arg(long, default_value_t = lut::DEFAULT_SIZE)]
    lut_size: usize,

    /// Bisection tolerance per LUT entry
    #[arg(long, default_value_t = lut::DEFAULT_TOLERANCE)]
    tolerance: f64,

    /// Bisection iteration cap per LUT entry
    #[arg(long, default_value_t = lut::DEFAULT_MAX_ITERATIONS)]
    max_iterations: u32,

    /// Skip the 4.8 MS/s renders (100x the input length)
    #[arg(long, default_value_t = false)]
    skip_wideband: bool,

    /// Also write a 48 kHz WAV next to each baseband artifact
    #[arg(long, default_value_t = false)]
    wav: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if !args.duration.is_finite() || args.duration <= 0.0 {
        bail!("duration must be positive, got {}", args.duration);
    }
    if !args.tone_freq.is_finite() || args.tone_freq <= 0.0 {
        bail!("tone frequency must be positive, got {}", args.tone_freq);
    }

    let config = RenderConfig {
        output_dir: args.output_dir,
        voice: args.voice,
        duration: args.duration,
        tone_freq: args.tone_freq,
        lut: LutConfig {
            size: args.lut_size,
            tolerance: args.tolerance,
            max_iterations: args.max_iterations,
        },
        skip_wideband: args.skip_wideband,
        wav: args.wav,
    };

    info!(
        "Rendering to {} (LUT {} entries, tolerance {:e})",
        config.output_dir.display(),
        config.lut.size,
        config.lut.tolerance
    );
    let artifacts = experiments::run(&config)?;
    for artifact in &artifacts {
        info!("  Written: {} ({} samples)", artifact.path.display(), artifact.samples);
    }
    let total: usize = artifacts.iter().map(|a| a.samples).sum();
    info!("Done: {} files, {total} samples", artifacts.len());

    Ok(())
}
