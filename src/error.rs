use std::path::PathBuf;

use crate::sig::HeadShape;

/// Failures that abort one unit of work (a head, a filament, a sheet) without
/// poisoning the rest of the run.
#[derive(Clone, Debug, PartialEq)]
pub enum LinkError {
    /// The head shape has no stem anchor descriptor.
    UnmappedShape { inter: usize, shape: HeadShape },
    /// The interpretation is no longer present in the graph.
    MissingInter { inter: usize },
    /// The interline is not usable for pixel conversions.
    InvalidScale { interline: f64 },
    /// A filament has too few points to define a position.
    DegenerateFilament { id: u32 },
    /// A page description could not be read.
    Io { path: PathBuf, message: String },
    /// A page description is not valid JSON for the expected layout.
    Parse { path: PathBuf, message: String },
}

impl std::fmt::Display for LinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkError::UnmappedShape { inter, shape } => {
                write!(f, "no stem anchors for head #{inter} of shape {shape:?}")
            }
            LinkError::MissingInter { inter } => write!(f, "inter #{inter} not found in graph"),
            LinkError::InvalidScale { interline } => {
                write!(f, "invalid interline ({interline:.3} px)")
            }
            LinkError::DegenerateFilament { id } => {
                write!(f, "filament #{id} has fewer than two points")
            }
            LinkError::Io { path, message } => {
                write!(f, "failed to read page {}: {message}", path.display())
            }
            LinkError::Parse { path, message } => {
                write!(f, "failed to parse page {}: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for LinkError {}
