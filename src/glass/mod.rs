// src/glass/mod.rs

pub mod dipole;

use crate::display::{FrameBuffer, Rgb};
use crate::error::{Result, StimulusError};
use dipole::{dot_in_bounds, field_orientation};

pub use dipole::Dipole;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

// CONFIG ----------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Handedness {
    #[serde(alias = "cw")]
    Clockwise,
    #[serde(alias = "ccw")]
    CounterClockwise,
}

impl Handedness {
    /// Screen y grows downward, so clockwise is a negative rotation.
    pub fn sign(&self) -> f64 {
        match self {
            Handedness::Clockwise => -1.0,
            Handedness::CounterClockwise => 1.0,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Handedness::Clockwise => Handedness::CounterClockwise,
            Handedness::CounterClockwise => Handedness::Clockwise,
        }
    }
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handedness::Clockwise => write!(f, "cw"),
            Handedness::CounterClockwise => write!(f, "ccw"),
        }
    }
}

impl FromStr for Handedness {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cw" | "clockwise" => Ok(Handedness::Clockwise),
            "ccw" | "counter_clockwise" | "counterclockwise" => Ok(Handedness::CounterClockwise),
            other => Err(format!("unknown handedness '{}', expected cw or ccw", other)),
        }
    }
}

/// Everything needed to reproduce one Glass image.
///
/// `snr` and `density` are fractions in `[0, 1]` and are not clamped;
/// `angle_deg` is clamped to `[0, 90]` (0 radial, 90 concentric).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlassImageConfig {
    pub angle_deg: f64,
    pub snr: f64,
    pub density: f64,
    pub shift_px: f64,
    pub dot_radius_px: u32,
    pub handedness: Handedness,
    pub size_px: u32,
    pub seed: Option<u64>,
    pub dot_color: Rgb,
}

impl Default for GlassImageConfig {
    fn default() -> Self {
        Self {
            angle_deg: 0.0,
            snr: 0.24,
            density: 0.03,
            shift_px: 8.0,
            dot_radius_px: 2,
            handedness: Handedness::Clockwise,
            size_px: 800,
            seed: None,
            dot_color: Rgb::WHITE,
        }
    }
}

impl GlassImageConfig {
    /// Rotation applied to the radial field, signed by handedness.
    pub fn field_rotation(&self) -> f64 {
        self.angle_deg.clamp(0.0, 90.0).to_radians() * self.handedness.sign()
    }

    pub fn center(&self) -> (f64, f64) {
        let c = (self.size_px / 2) as f64;
        (c, c)
    }

    /// Inset keeping both dots of a pair on the canvas for any orientation.
    pub fn margin(&self) -> i64 {
        (self.shift_px / 2.0 + self.dot_radius_px as f64 + 1.0).ceil() as i64
    }

    /// Dipoles needed so the two dots of each cover `density` of the canvas.
    pub fn dipole_count(&self) -> usize {
        let area = self.size_px as f64 * self.size_px as f64;
        let single_dot_area = PI * (self.dot_radius_px as f64).powi(2);
        let n = (self.density * area / (2.0 * single_dot_area)).round();
        (n.max(0.0) as usize).max(1)
    }

    pub fn signal_count(&self) -> usize {
        let n = self.dipole_count();
        ((self.snr * n as f64).round().max(0.0) as usize).min(n)
    }

    fn validate(&self) -> Result<()> {
        if self.size_px == 0 {
            return Err(StimulusError::InvalidGlassConfig(
                "canvas size must be at least one pixel".to_string(),
            ));
        }
        if self.dot_radius_px == 0 {
            return Err(StimulusError::InvalidGlassConfig(
                "dot radius must be at least one pixel".to_string(),
            ));
        }
        Ok(())
    }
}

// PATTERN ---------------------------------------------------------------------

pub struct GlassPattern {
    pub image: FrameBuffer,
    /// All dipoles in draw order, clipped ones included.
    pub dipoles: Vec<Dipole>,
    /// Dipoles whose two dots were both drawn.
    pub rendered: Vec<Dipole>,
    pub seed: u64,
}

impl GlassPattern {
    pub fn clipped_count(&self) -> usize {
        self.dipoles.len() - self.rendered.len()
    }

    pub fn signal_fraction(&self) -> f64 {
        if self.dipoles.is_empty() {
            return 0.0;
        }
        self.dipoles.iter().filter(|d| d.is_signal).count() as f64 / self.dipoles.len() as f64
    }
}

/// Builds a Glass image. Without a seed a fresh one is drawn and recorded in
/// the result so the image can be regenerated.
pub fn generate(config: &GlassImageConfig) -> Result<GlassPattern> {
    let seed = config.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut pattern = generate_with_rng(config, &mut rng)?;
    pattern.seed = seed;
    Ok(pattern)
}

/// Generates one image per seed in parallel. Each image is identical to
/// `generate` with that seed.
pub fn generate_batch(base: &GlassImageConfig, seeds: &[u64]) -> Vec<Result<GlassPattern>> {
    seeds
        .par_iter()
        .map(|&seed| {
            let config = GlassImageConfig {
                seed: Some(seed),
                ..base.clone()
            };
            generate(&config)
        })
        .collect()
}

/// Draw order from `rng`: signal positions and orientations, noise positions
/// and orientations, then one shuffle.
pub fn generate_with_rng<R: Rng + ?Sized>(config: &GlassImageConfig, rng: &mut R) -> Result<GlassPattern> {
    config.validate()?;

    let size = config.size_px as i64;
    let n_total = config.dipole_count();
    let n_signal = config.signal_count();
    let n_noise = n_total - n_signal;

    let margin = config.margin();
    let (lo, hi) = (margin, size - margin - 1);

    let mut dipoles = Vec::with_capacity(n_total);

    // a margin wider than half the canvas leaves nowhere to put an anchor
    if lo <= hi {
        let center = config.center();
        let rotation = config.field_rotation();

        for _ in 0..n_signal {
            let anchor = random_anchor(rng, lo, hi);
            let orientation = match field_orientation(anchor, center, rotation) {
                Some(theta) => theta,
                None => rng.gen::<f64>() * PI,
            };
            dipoles.push(Dipole {
                anchor,
                orientation,
                is_signal: true,
            });
        }
        for _ in 0..n_noise {
            let anchor = random_anchor(rng, lo, hi);
            dipoles.push(Dipole {
                anchor,
                orientation: rng.gen::<f64>() * PI,
                is_signal: false,
            });
        }
        dipoles.shuffle(rng);
    }

    let (image, rendered) = render(config, &dipoles);

    Ok(GlassPattern {
        image,
        dipoles,
        rendered,
        seed: config.seed.unwrap_or_default(),
    })
}

fn random_anchor<R: Rng + ?Sized>(rng: &mut R, lo: i64, hi: i64) -> (f64, f64) {
    let x = rng.gen_range(lo..=hi);
    let y = rng.gen_range(lo..=hi);
    (x as f64, y as f64)
}

/// Draws every dipole whose two dots both fit; a pair with one dot off the
/// canvas is dropped entirely.
fn render(config: &GlassImageConfig, dipoles: &[Dipole]) -> (FrameBuffer, Vec<Dipole>) {
    let mut image = FrameBuffer::new(config.size_px, config.size_px);
    let radius = config.dot_radius_px as f64;
    let size = config.size_px as f64;
    let half_shift = config.shift_px / 2.0;

    let mut rendered = Vec::with_capacity(dipoles.len());
    for dipole in dipoles {
        let dots = dipole.dot_centers(half_shift);
        if !dots.iter().all(|&(x, y)| dot_in_bounds(x, y, radius, size)) {
            continue;
        }
        for (x, y) in dots {
            image.fill_disc(
                x.round() as i32,
                y.round() as i32,
                config.dot_radius_px as i32,
                config.dot_color,
            );
        }
        rendered.push(*dipole);
    }
    (image, rendered)
}
