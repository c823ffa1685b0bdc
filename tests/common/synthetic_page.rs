use omr_linker::geometry::{Line, Rect, Skew};
use omr_linker::glyph::{Orientation, Run, Section, SectionId};
use omr_linker::grid::{Filament, FilamentArena, FilamentId};
use omr_linker::scale::{InterlineScale, Scale};
use omr_linker::sig::{HeadShape, InterId};
use omr_linker::{LinkOptions, Sheet, StemsBuilder, SystemInfo};

pub const INTERLINE: f64 = 20.0;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn scale() -> Scale {
    Scale::new(INTERLINE).expect("valid interline")
}

pub fn builder() -> StemsBuilder {
    StemsBuilder::new(&scale(), Skew::default(), &LinkOptions::default())
}

/// `count` horizontal filaments from `x0` to `x1`, `gap` pixels apart.
pub fn staff(first_id: u32, x0: f64, x1: f64, y0: f64, gap: f64, count: u32) -> Vec<Filament> {
    (0..count)
        .map(|i| {
            let y = y0 + gap * i as f64;
            Filament::new(FilamentId(first_id + i), vec![[x0, y], [x1, y]], 2.0)
                .expect("two points")
        })
        .collect()
}

/// Sheet with the given filaments and systems, interline 20, no skew.
pub fn sheet(width: i32, filaments: Vec<Filament>, systems: Vec<SystemInfo>) -> Sheet {
    Sheet {
        scale: scale(),
        interline: InterlineScale::uniform(INTERLINE as i32),
        skew: Skew::default(),
        width,
        filaments: FilamentArena::new(filaments),
        systems,
    }
}

/// Ids of the inters added through a [`SystemSketch`], in call order.
pub struct SketchIds {
    pub heads: Vec<InterId>,
    pub beams: Vec<InterId>,
}

/// Small system described with stems, heads and beams at pixel positions.
pub struct SystemSketch {
    id: usize,
    bounds: Rect,
    sections: Vec<Section>,
    seeds: Vec<Vec<SectionId>>,
    heads: Vec<(HeadShape, Rect)>,
    beams: Vec<(Line, f64)>,
    next_section: u32,
}

impl SystemSketch {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            bounds: Rect::new(0, 0, 1000, 400),
            sections: Vec::new(),
            seeds: Vec::new(),
            heads: Vec::new(),
            beams: Vec::new(),
            next_section: 0,
        }
    }

    /// Three pixel wide vertical columns covering rows `y..y + len`.
    pub fn columns(&mut self, x: i32, y: i32, len: i32) -> Vec<SectionId> {
        (0..3)
            .map(|i| {
                let id = SectionId(self.next_section);
                self.next_section += 1;
                self.sections
                    .push(Section::new(id, Orientation::Vertical, x + i, vec![Run::new(y, len)]));
                id
            })
            .collect()
    }

    /// Stem seed made of three columns.
    pub fn seed(mut self, x: i32, y: i32, len: i32) -> Self {
        let ids = self.columns(x, y, len);
        self.seeds.push(ids);
        self
    }

    /// Stem material that was not recognized as a seed.
    pub fn chunk(mut self, x: i32, y: i32, len: i32) -> Self {
        self.columns(x, y, len);
        self
    }

    /// Black head of 21 x 16 pixels.
    pub fn head(mut self, x: i32, y: i32) -> Self {
        self.heads.push((HeadShape::NoteheadBlack, Rect::new(x, y, 21, 16)));
        self
    }

    pub fn shaped_head(mut self, shape: HeadShape, bounds: Rect) -> Self {
        self.heads.push((shape, bounds));
        self
    }

    /// Horizontal beam of height 8 centered on `y`.
    pub fn beam(mut self, x0: f64, x1: f64, y: f64) -> Self {
        self.beams.push((Line::new([x0, y], [x1, y]), 8.0));
        self
    }

    pub fn build(self) -> (SystemInfo, SketchIds) {
        let mut system = SystemInfo::new(self.id, self.bounds, self.sections);
        for seed in &self.seeds {
            system.add_seed(seed).expect("seed sections exist");
        }
        let heads = self
            .heads
            .into_iter()
            .map(|(shape, bounds)| system.add_head(shape, bounds, 0.8))
            .collect();
        let beams = self
            .beams
            .into_iter()
            .map(|(median, height)| system.add_beam(median, height, false, 0.8))
            .collect();
        (system, SketchIds { heads, beams })
    }
}
