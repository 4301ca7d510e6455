//! The experiment set: every artifact the renderer produces, in order.
//!
//! Baseband artifacts are 48 kHz. Modulated artifacts are streamed to disk
//! through `DsbModulator`; the wideband runs are 100x the input length and
//! would otherwise need the whole buffer in memory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use darkdpd_dsp::carrier::sine_tone;
use darkdpd_dsp::lut::{InverseLut, LutConfig};
use darkdpd_dsp::modulator::{DsbModulator, ModulatorConfig, Stage};
use darkdpd_dsp::pcm;
use darkdpd_dsp::predistort::Linearized;
use darkdpd_dsp::report;
use darkdpd_dsp::transfer::{LinearAmplifier, OverdrivenAmplifier, TransferFunction};
use log::{debug, info, warn};

pub const BASE_SR: u32 = 48_000;

/// Amplitude of the quiet tone fed to the linear amp (stays below clipping after +6 dB).
const QUIET_AMPLITUDE: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub output_dir: PathBuf,
    /// Voice recording; `None` renders the tone experiments only.
    pub voice: Option<PathBuf>,
    pub duration: f64,
    pub tone_freq: f64,
    pub lut: LutConfig,
    pub skip_wideband: bool,
    pub wav: bool,
}

/// One written file.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub path: PathBuf,
    pub samples: usize,
}

struct Renderer<'a> {
    config: &'a RenderConfig,
    lut: &'a InverseLut,
    linear: LinearAmplifier,
    overdriven: OverdrivenAmplifier,
    artifacts: Vec<Artifact>,
}

impl Renderer<'_> {
    fn path(&self, name: &str) -> PathBuf {
        self.config.output_dir.join(name)
    }

    fn record(&mut self, path: PathBuf, samples: usize) {
        debug!("wrote {} ({samples} samples)", path.display());
        self.artifacts.push(Artifact { path, samples });
    }

    fn baseband(&mut self, name: &str, samples: &[f64]) -> Result<()> {
        let path = self.path(name);
        let n = pcm::write_raw(&path, samples.iter().copied())
            .with_context(|| format!("writing {name}"))?;
        if self.config.wav {
            let wav_path = path.with_extension("wav");
            pcm::write_wav(&wav_path, samples, BASE_SR)
                .with_context(|| format!("writing {}", wav_path.display()))?;
            self.record(wav_path, samples.len());
        }
        self.record(path, n);
        Ok(())
    }

    fn modulated(
        &mut self,
        name: &str,
        samples: &[f64],
        modulator: &ModulatorConfig,
        stage: Stage<'_>,
    ) -> Result<()> {
        if self.config.skip_wideband && *modulator == ModulatorConfig::wideband() {
            info!("  skipping {name} (wideband disabled)");
            return Ok(());
        }
        let path = self.path(name);
        let n = pcm::write_raw(&path, DsbModulator::new(samples, modulator, stage))
            .with_context(|| format!("writing {name}"))?;
        self.record(path, n);
        Ok(())
    }

    fn tone_experiments(&mut self) -> Result<()> {
        let num_samples = (self.config.duration * BASE_SR as f64).round() as usize;
        let pure = sine_tone(self.config.tone_freq, 1.0, num_samples, BASE_SR as f64);
        let quiet = sine_tone(self.config.tone_freq, QUIET_AMPLITUDE, num_samples, BASE_SR as f64);

        let wideband = ModulatorConfig::wideband();
        let rf384 = ModulatorConfig::rf384();

        info!("Pure tone: {:.0} Hz, {num_samples} samples", self.config.tone_freq);
        self.baseband("pure.raw", &pure)?;
        self.baseband("purequiet.raw", &quiet)?;
        self.modulated("pure-rf.raw", &pure, &wideband, Stage::Identity)?;
        self.modulated("pure-rf384.raw", &pure, &rf384, Stage::Identity)?;

        info!("Linear amplifier (+6 dB) on quiet tone");
        let amplified = apply(&quiet, &self.linear);
        self.baseband("amplified.raw", &amplified)?;
        self.modulated("amplified-rf.raw", &amplified, &wideband, Stage::Identity)?;

        info!("Overdriven amplifier");
        let distorted = apply(&pure, &self.overdriven);
        self.baseband("distorted.raw", &distorted)?;
        self.modulated("distorted-rf.raw", &distorted, &wideband, Stage::Identity)?;
        self.modulated("distorted-rf384.raw", &distorted, &rf384, Stage::Identity)?;

        info!("Predistortion + overdriven amplifier");
        let undistorted = apply(&pure, &Linearized::new(self.overdriven, self.lut));
        self.baseband("undistorted.raw", &undistorted)?;
        self.modulated("undistorted-rf.raw", &undistorted, &wideband, Stage::Identity)?;
        self.modulated("undistorted-rf384.raw", &undistorted, &rf384, Stage::Identity)?;

        Ok(())
    }

    fn voice_experiments(&mut self, voice: &[f64]) -> Result<()> {
        info!("Voice: {} samples", voice.len());

        let rf384 = ModulatorConfig::rf384();
        let rf_stage = ModulatorConfig::rf384_low_carrier();
        let overdriven = self.overdriven;
        let lut = self.lut;

        let voice_distort = apply(voice, &overdriven);
        self.baseband("voicedistort.raw", &voice_distort)?;
        self.modulated("voicedistort384.raw", &voice_distort, &rf384, Stage::Identity)?;
        self.modulated("rfnodistort.raw", voice, &rf384, Stage::Identity)?;

        info!("RF-stage distortion");
        self.modulated("rfdistort.raw", voice, &rf_stage, Stage::Distort(&overdriven))?;
        // Same input and stage as rfdistort; kept so the artifact set stays complete
        self.modulated("rfundistort.raw", voice, &rf_stage, Stage::Distort(&overdriven))?;
        self.modulated(
            "rfstageundistort.raw",
            voice,
            &rf_stage,
            Stage::corrected(&overdriven, lut),
        )?;

        Ok(())
    }
}

fn apply(samples: &[f64], f: &dyn TransferFunction) -> Vec<f64> {
    samples.iter().map(|&x| f.transfer(x)).collect()
}

fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating output directory {}", dir.display()))
}

/// Build the table, write the curve report, then every tone and voice artifact.
pub fn run(config: &RenderConfig) -> Result<Vec<Artifact>> {
    // Read the voice up front so a bad path fails before anything is written
    let voice = match &config.voice {
        Some(path) => Some(
            pcm::read_raw(path)
                .with_context(|| format!("reading voice file {}", path.display()))?,
        ),
        None => {
            info!("No voice file given; rendering tone experiments only");
            None
        }
    };
    ensure_dir(&config.output_dir)?;

    let overdriven = OverdrivenAmplifier::new();
    let lut = InverseLut::build(&overdriven, &config.lut).context("building inverse LUT")?;
    if !lut.is_converged() {
        warn!(
            "{} of {} LUT entries did not converge; using best estimates",
            lut.unconverged().len(),
            lut.len()
        );
    }

    let mut renderer = Renderer {
        config,
        lut: &lut,
        linear: LinearAmplifier::new(),
        overdriven,
        artifacts: Vec::new(),
    };

    let csv_path = renderer.path("functions.csv");
    let curve = report::transfer_curve(renderer.lut, &renderer.linear, &renderer.overdriven);
    report::write_csv(&csv_path, &curve).context("writing functions.csv")?;
    renderer.record(csv_path, curve.len());

    renderer.tone_experiments()?;
    if let Some(voice) = &voice {
        renderer.voice_experiments(voice)?;
    }

    Ok(renderer.artifacts)
}
