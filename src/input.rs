//! JSON description of a segmented page, as consumed by the demo binary and
//! the integration tests.

use std::fs;
use std::path::Path;

use log::warn;
use serde::Deserialize;

use crate::error::LinkError;
use crate::geometry::{Line, Rect, Skew};
use crate::glyph::{Section, SectionId};
use crate::grid::{Filament, FilamentArena, FilamentId};
use crate::scale::{InterlineScale, Scale};
use crate::sheet::Sheet;
use crate::sig::HeadShape;
use crate::system::SystemInfo;

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInput {
    pub scale: ScaleInput,
    /// Slope of the staff lines.
    #[serde(default)]
    pub skew: f64,
    /// Page width in pixels.
    pub width: i32,
    #[serde(default)]
    pub filaments: Vec<FilamentInput>,
    #[serde(default)]
    pub systems: Vec<SystemInput>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleInput {
    pub interline: f64,
    /// Smallest and largest interline of the population, defaulting to the
    /// main one.
    pub min_interline: Option<i32>,
    pub max_interline: Option<i32>,
    pub stem_thickness: Option<f64>,
    pub max_stem: Option<f64>,
    pub beam_mean_distance: Option<f64>,
    pub beam_sigma_distance: Option<f64>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FilamentInput {
    pub id: u32,
    pub points: Vec<[f64; 2]>,
    #[serde(default = "default_thickness")]
    pub thickness: f64,
}

fn default_thickness() -> f64 {
    2.0
}

#[derive(Clone, Debug, Deserialize)]
pub struct SystemInput {
    pub id: usize,
    pub bounds: Rect,
    #[serde(default)]
    pub sections: Vec<Section>,
    /// Each seed lists the sections of its glyph.
    #[serde(default)]
    pub seeds: Vec<Vec<SectionId>>,
    #[serde(default)]
    pub heads: Vec<HeadInput>,
    #[serde(default)]
    pub beams: Vec<BeamInput>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct HeadInput {
    pub shape: HeadShape,
    pub bounds: Rect,
    #[serde(default = "default_grade")]
    pub grade: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BeamInput {
    /// Left and right ends of the median line.
    pub median: [[f64; 2]; 2],
    pub height: f64,
    #[serde(default)]
    pub hook: bool,
    #[serde(default = "default_grade")]
    pub grade: f64,
}

fn default_grade() -> f64 {
    0.8
}

pub fn load_page(path: &Path) -> Result<PageInput, LinkError> {
    let data = fs::read_to_string(path).map_err(|e| LinkError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    serde_json::from_str(&data).map_err(|e| LinkError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

impl ScaleInput {
    pub fn resolve(&self) -> Result<(Scale, InterlineScale), LinkError> {
        let mut scale = Scale::new(self.interline)?;
        if let Some(mean) = self.stem_thickness {
            let max = self.max_stem.unwrap_or(scale.max_stem);
            scale = scale.with_stem(mean, max);
        }
        if let (Some(mean), Some(sigma)) = (self.beam_mean_distance, self.beam_sigma_distance) {
            scale = scale.with_beam_distance(mean, sigma);
        }
        let main = self.interline.round() as i32;
        let interline = InterlineScale::new(
            main,
            self.min_interline.unwrap_or(main),
            self.max_interline.unwrap_or(main),
        );
        Ok((scale, interline))
    }
}

impl PageInput {
    /// Builds the sheet; the first invalid filament or scale aborts.
    pub fn into_sheet(self) -> Result<Sheet, LinkError> {
        let (scale, interline) = self.scale.resolve()?;
        let filaments = self
            .filaments
            .into_iter()
            .map(|f| Filament::new(FilamentId(f.id), f.points, f.thickness))
            .collect::<Result<Vec<_>, _>>()?;
        let systems = self.systems.into_iter().map(SystemInput::into_system).collect();
        Ok(Sheet {
            scale,
            interline,
            skew: Skew::new(self.skew),
            width: self.width,
            filaments: FilamentArena::new(filaments),
            systems,
        })
    }
}

impl SystemInput {
    pub fn into_system(self) -> SystemInfo {
        let mut system = SystemInfo::new(self.id, self.bounds, self.sections);
        for seed in &self.seeds {
            if system.add_seed(seed).is_none() {
                warn!("System#{} seed {:?} has no known section", system.id, seed);
            }
        }
        for head in self.heads {
            system.add_head(head.shape, head.bounds, head.grade);
        }
        for beam in self.beams {
            let [p1, p2] = beam.median;
            system.add_beam(Line::new(p1, p2), beam.height, beam.hook, beam.grade);
        }
        system
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_page() {
        let json = r#"{
            "scale": {
                "interline": 20.0,
                "beamMeanDistance": 22.0,
                "beamSigmaDistance": 2.0
            },
            "width": 400,
            "filaments": [ { "id": 1, "points": [[0.0, 100.0], [399.0, 100.0]] } ],
            "systems": [ {
                "id": 0,
                "bounds": { "x": 0, "y": 0, "w": 400, "h": 300 },
                "sections": [
                    {
                        "id": 7,
                        "orientation": "vertical",
                        "firstPos": 118,
                        "runs": [ { "start": 150, "length": 56 } ]
                    }
                ],
                "seeds": [[7]],
                "heads": [ {
                    "shape": "noteheadBlack",
                    "bounds": { "x": 100, "y": 200, "w": 21, "h": 16 }
                } ],
                "beams": [ { "median": [[60.0, 104.0], [200.0, 104.0]], "height": 8.0 } ]
            } ]
        }"#;
        let page: PageInput = serde_json::from_str(json).unwrap();
        let sheet = page.into_sheet().unwrap();
        assert_eq!(sheet.interline.main, 20);
        assert_eq!(sheet.scale.beam_mean_distance, Some(22.0));
        assert_eq!(sheet.filaments.len(), 1);
        let system = &sheet.systems[0];
        assert_eq!(system.seeds.len(), 1);
        assert_eq!(system.sig.vertex_count(), 2);
    }

    #[test]
    fn degenerate_filament_is_rejected() {
        let json = r#"{ "scale": { "interline": 20.0 }, "width": 100,
            "filaments": [ { "id": 3, "points": [[0.0, 10.0]] } ] }"#;
        let page: PageInput = serde_json::from_str(json).unwrap();
        assert!(matches!(page.into_sheet(), Err(LinkError::DegenerateFilament { id: 3 })));
    }

    #[test]
    fn measured_stem_thickness_overrides_derived_one() {
        let json = r#"{ "interline": 20.0, "stemThickness": 3.0, "maxStem": 5.0 }"#;
        let input: ScaleInput = serde_json::from_str(json).unwrap();
        let (scale, _) = input.resolve().unwrap();
        assert_eq!(scale.stem_thickness, 3.0);
        assert_eq!(scale.max_stem, 5.0);

        let json = r#"{ "interline": 20.0, "stemThickness": 4.0 }"#;
        let input: ScaleInput = serde_json::from_str(json).unwrap();
        let (scale, _) = input.resolve().unwrap();
        assert_eq!(scale.stem_thickness, 4.0);
        assert_eq!(scale.max_stem, 6.0);
    }

    #[test]
    fn load_page_reports_io_and_parse_failures() {
        let dir = std::env::temp_dir().join(format!("omr_linker_input_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let missing = dir.join("missing.json");
        assert!(matches!(load_page(&missing), Err(LinkError::Io { path, .. }) if path == missing));

        let broken = dir.join("broken.json");
        fs::write(&broken, "{ \"scale\": ").unwrap();
        let err = load_page(&broken).unwrap_err();
        assert!(matches!(&err, LinkError::Parse { path, .. } if *path == broken));
        assert!(err.to_string().contains("broken.json"));

        let _ = fs::remove_dir_all(&dir);
    }
}
