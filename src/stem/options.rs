use serde::{Deserialize, Serialize};

use crate::scale::Scale;
use crate::sig::GapLimits;

/// Options for the stem linker, as interline fractions unless noted.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StemOptions {
    /// Rough abscissa margin when looking for neighbours of a head.
    pub vicinity_margin: f64,
    /// Margin around the sheet slope for corner lookup areas (tangent).
    pub slope_margin: f64,
    /// Minimum stem contribution for a section near the head.
    pub min_head_section_contribution: f64,
    /// Minimum vertical distance from head to end of stem.
    pub min_stem_extension: f64,
    /// Minimum vertical distance between head and beam.
    pub min_head_beam_distance: f64,
    /// Maximum vertical distance between two consecutive grouped beams,
    /// used when the sheet scale carries no beam distance.
    pub max_beam_distance: f64,
    /// Minimum abscissa gap between two stems on the same beam.
    pub min_beam_stems_gap: f64,
    /// Maximum seed distance to the theoretical line, as ratio of stem width.
    pub max_seed_jitter: f64,
    /// Maximum section distance to the target line, as ratio of stem width.
    pub max_section_jitter: f64,
    /// Maximum vertical gap between two consecutive stem items.
    pub max_y_gap: f64,
    /// Head-stem vertical gap below which a link counts as tight.
    pub y_gap_tiny: f64,
    /// Grade boost for stems on a beam side, as ratio.
    pub side_stem_boost: f64,
    /// Minimum intrinsic grade of a stem interpretation.
    pub min_stem_grade: f64,
}

impl Default for StemOptions {
    fn default() -> Self {
        Self {
            vicinity_margin: 1.0,
            slope_margin: 0.02,
            min_head_section_contribution: 0.2,
            min_stem_extension: 0.8,
            min_head_beam_distance: 0.125,
            max_beam_distance: 1.5,
            min_beam_stems_gap: 1.0,
            max_seed_jitter: 2.0,
            max_section_jitter: 1.0,
            max_y_gap: 0.5,
            y_gap_tiny: 0.1,
            side_stem_boost: 0.5,
            min_stem_grade: 0.35,
        }
    }
}

/// Gap limits of head-stem and beam-stem connections.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConnectionOptions {
    pub head_stem: GapLimits,
    pub beam_stem: GapLimits,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            head_stem: GapLimits::default(),
            beam_stem: GapLimits {
                x_in_gap_max: 1.0,
                x_out_gap_max: 0.2,
                y_gap_max: 0.6,
                x_weight: 1.0,
                y_weight: 1.0,
                min_grade: 0.1,
            },
        }
    }
}

/// Weights and limits of the stem quality check.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckerOptions {
    /// Minimum black ratio within the stem box of typical width.
    pub min_core_ratio: f64,
    /// Maximum vertical hole inside a stem, interline fraction.
    pub max_gap: f64,
    /// Maximum deviation from the sheet vertical (tangent).
    pub max_slope_gap: f64,
    pub core_weight: f64,
    pub gap_weight: f64,
    pub slope_weight: f64,
    pub width_weight: f64,
}

impl Default for CheckerOptions {
    fn default() -> Self {
        Self {
            min_core_ratio: 0.5,
            max_gap: 0.5,
            max_slope_gap: 0.08,
            core_weight: 2.0,
            gap_weight: 2.0,
            slope_weight: 1.0,
            width_weight: 1.0,
        }
    }
}

/// Every option of the stem linker, as read from the runtime config.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinkOptions {
    pub stem: StemOptions,
    pub connections: ConnectionOptions,
    pub checker: CheckerOptions,
}

/// [`StemOptions`] and [`ConnectionOptions`] resolved to pixels.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StemParams {
    pub slope_margin: f64,
    pub max_head_out_dx: i32,
    pub max_head_in_dx: i32,
    pub max_beam_in_dx: i32,
    pub vicinity_margin: i32,
    pub max_stem_head_gap_y: i32,
    pub max_y_gap: i32,
    pub max_stem_thickness: i32,
    pub min_chunk_weight: i32,
    pub min_head_section_contribution: i32,
    pub min_stem_extension: i32,
    pub min_head_beam_distance: i32,
    pub min_beam_stems_gap: i32,
    pub max_seed_jitter: f64,
    pub max_section_jitter: f64,
    pub max_beam_distance: i32,
    /// Kept as an interline fraction, compared to relation gaps.
    pub y_gap_tiny: f64,
    pub side_stem_boost: f64,
    pub min_stem_grade: f64,
}

impl StemParams {
    pub fn resolve(options: &StemOptions, connections: &ConnectionOptions, scale: &Scale) -> Self {
        let stem_width = scale.max_stem;
        let max_beam_distance = match (scale.beam_mean_distance, scale.beam_sigma_distance) {
            (Some(_), Some(_)) => scale.max_beam_distance(options.max_beam_distance).ceil() as i32,
            _ => scale.to_pixels(options.max_beam_distance),
        };
        Self {
            slope_margin: options.slope_margin,
            max_head_out_dx: scale.to_pixels(connections.head_stem.x_out_gap_max),
            max_head_in_dx: scale.to_pixels(connections.head_stem.x_in_gap_max),
            max_beam_in_dx: scale.to_pixels(connections.beam_stem.x_in_gap_max),
            vicinity_margin: scale.to_pixels(options.vicinity_margin),
            max_stem_head_gap_y: scale.to_pixels(connections.head_stem.y_gap_max),
            max_y_gap: scale.to_pixels(options.max_y_gap),
            max_stem_thickness: stem_width.round() as i32,
            min_chunk_weight: scale.stem_thickness.round() as i32,
            min_head_section_contribution: scale.to_pixels(options.min_head_section_contribution),
            min_stem_extension: scale.to_pixels(options.min_stem_extension),
            min_head_beam_distance: scale.to_pixels(options.min_head_beam_distance),
            min_beam_stems_gap: scale.to_pixels(options.min_beam_stems_gap),
            max_seed_jitter: options.max_seed_jitter * stem_width,
            max_section_jitter: options.max_section_jitter * stem_width,
            max_beam_distance,
            y_gap_tiny: options.y_gap_tiny,
            side_stem_boost: options.side_stem_boost,
            min_stem_grade: options.min_stem_grade,
        }
    }
}
