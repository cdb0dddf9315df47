//! FieldMap Export Library
//!
//! Project export as a JSON document, a CSV summary and a zip bundle with
//! photos and journey photo strips.

pub mod archive;
pub mod csv;
pub mod error;
pub mod json;
pub mod photo_strip;

pub use archive::{bundle, write_bundle};
pub use csv::to_csv;
pub use error::{ExportError, ExportResult};
pub use json::{ProjectDocument, to_json};
pub use photo_strip::StripOptions;

use fieldmap_core::calibration::Calibration;
use fieldmap_core::canvas::Canvas;
use fieldmap_core::project::Project;
use fieldmap_core::scene::Scene;
use fieldmap_core::sequence::Sequences;

/// Everything an export reads.
#[derive(Debug, Clone, Copy)]
pub struct ExportInput<'a> {
    pub project: &'a Project,
    pub scene: &'a Scene,
    pub calibration: Option<&'a Calibration>,
    pub sequences: &'a Sequences,
}

impl<'a> ExportInput<'a> {
    /// Read the live content of a canvas, with the canvas' calibration taking precedence.
    pub fn new(project: &'a Project, canvas: &'a Canvas) -> Self {
        Self {
            project,
            scene: canvas.scene(),
            calibration: canvas.calibration().or(project.calibration.as_ref()),
            sequences: canvas.sequences(),
        }
    }
}
