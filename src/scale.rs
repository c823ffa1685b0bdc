//! Sheet scale: the interline and the typical thicknesses derived from it.
//!
//! Every tolerance in the crate is expressed as a fraction of the interline
//! and resolved to pixels through [`Scale::to_pixels`].

use serde::{Deserialize, Serialize};

use crate::error::LinkError;

/// Measured characteristics of one sheet, in pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scale {
    /// Vertical distance between two staff lines.
    pub interline: f64,
    /// Most frequent staff line thickness.
    pub main_fore: f64,
    /// Maximum acceptable staff line thickness.
    pub max_fore: f64,
    /// Typical stem thickness.
    pub stem_thickness: f64,
    /// Maximum acceptable stem thickness.
    pub max_stem: f64,
    /// Mean vertical distance between beams of a group, when measured.
    #[serde(default)]
    pub beam_mean_distance: Option<f64>,
    /// Standard deviation of the beam distance, when measured.
    #[serde(default)]
    pub beam_sigma_distance: Option<f64>,
}

impl Scale {
    /// Scale with thicknesses derived from the interline alone.
    pub fn new(interline: f64) -> Result<Self, LinkError> {
        if !interline.is_finite() || interline < 2.0 {
            return Err(LinkError::InvalidScale { interline });
        }
        let main_fore = (interline * 0.15).round().max(1.0);
        let stem_thickness = main_fore;
        Ok(Self {
            interline,
            main_fore,
            max_fore: (main_fore * 1.7).ceil(),
            stem_thickness,
            max_stem: (stem_thickness * 1.5).ceil() + 1.0,
            beam_mean_distance: None,
            beam_sigma_distance: None,
        })
    }

    pub fn with_fore(mut self, main: f64, max: f64) -> Self {
        self.main_fore = main;
        self.max_fore = max.max(main);
        self
    }

    pub fn with_stem(mut self, mean: f64, max: f64) -> Self {
        self.stem_thickness = mean;
        self.max_stem = max.max(mean);
        self
    }

    pub fn with_beam_distance(mut self, mean: f64, sigma: f64) -> Self {
        self.beam_mean_distance = Some(mean);
        self.beam_sigma_distance = Some(sigma);
        self
    }

    pub fn validate(&self) -> Result<(), LinkError> {
        if !self.interline.is_finite() || self.interline < 2.0 {
            return Err(LinkError::InvalidScale {
                interline: self.interline,
            });
        }
        Ok(())
    }

    /// Interline fraction rounded to whole pixels.
    #[inline]
    pub fn to_pixels(&self, frac: f64) -> i32 {
        (frac * self.interline).round() as i32
    }

    /// Interline fraction as real pixels.
    #[inline]
    pub fn to_pixels_f(&self, frac: f64) -> f64 {
        frac * self.interline
    }

    #[inline]
    pub fn pixels_to_frac(&self, pixels: f64) -> f64 {
        pixels / self.interline
    }

    /// Upper bound for the vertical distance between two beams of a group.
    pub fn max_beam_distance(&self, default_frac: f64) -> f64 {
        match (self.beam_mean_distance, self.beam_sigma_distance) {
            (Some(mean), Some(sigma)) => mean + 2.0 * sigma,
            _ => self.to_pixels_f(default_frac),
        }
    }
}

/// Interline statistics of a sheet whose staves may differ in size.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct InterlineScale {
    pub main: i32,
    pub min: i32,
    pub max: i32,
}

impl InterlineScale {
    pub fn new(main: i32, min: i32, max: i32) -> Self {
        Self { main, min, max }
    }

    pub fn uniform(main: i32) -> Self {
        Self::new(main, main, main)
    }

    #[inline]
    pub fn to_pixels(&self, frac: f64) -> i32 {
        (frac * self.main as f64).round() as i32
    }

    #[inline]
    pub fn to_pixels_f(&self, frac: f64) -> f64 {
        frac * self.main as f64
    }
}
