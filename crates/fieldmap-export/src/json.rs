//! Project document: the interchange JSON.

use crate::ExportInput;
use crate::error::ExportResult;
use chrono::{DateTime, Utc};
use fieldmap_core::calibration::measure;
use fieldmap_core::sequence::SequenceId;
use fieldmap_core::shapes::{MapObject, Metadata, ProjectId, ShapeId, ShapeKind, ShapeStyle};
use kurbo::Point;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectHeader {
    pub id: ProjectId,
    pub name: String,
    /// Pixels per meter, absent when uncalibrated.
    pub pixel_to_meter_ratio: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRecord {
    pub id: ShapeId,
    #[serde(rename = "type")]
    pub kind: ShapeKind,
    pub name: String,
    pub vertices: Vec<Point>,
    /// Formatted, e.g. `"1.00 m²"`.
    pub measurement: String,
    pub style: ShapeStyle,
    pub metadata: Metadata,
}

impl ObjectRecord {
    fn new(object: &MapObject, input: &ExportInput) -> Self {
        Self {
            id: object.id,
            kind: object.kind(),
            name: object.name.clone(),
            vertices: object.vertices(),
            measurement: measure(object, input.calibration).format(),
            style: object.style.clone(),
            metadata: object.metadata.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceRecord {
    pub id: SequenceId,
    pub name: String,
    /// Only ids that still resolve to a shape.
    pub object_ids: Vec<ShapeId>,
    pub object_names_in_order: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDocument {
    pub project: ProjectHeader,
    pub objects: Vec<ObjectRecord>,
    pub sequences: Vec<SequenceRecord>,
}

impl ProjectDocument {
    pub fn build(input: &ExportInput) -> Self {
        let project = input.project;
        let objects = input
            .scene
            .objects()
            .map(|o| ObjectRecord::new(o, input))
            .collect();
        let sequences = input
            .sequences
            .iter()
            .map(|seq| {
                let resolved = seq.resolve(input.scene);
                SequenceRecord {
                    id: seq.id,
                    name: seq.name.clone(),
                    object_ids: resolved.iter().map(|o| o.id).collect(),
                    object_names_in_order: resolved.iter().map(|o| o.name.clone()).collect(),
                }
            })
            .collect();

        Self {
            project: ProjectHeader {
                id: project.id,
                name: project.name.clone(),
                pixel_to_meter_ratio: input.calibration.map(|c| c.pixels_per_meter),
                created_at: project.created_at,
                updated_at: project.updated_at,
            },
            objects,
            sequences,
        }
    }

    pub fn to_json(&self) -> ExportResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Serialize the whole project as pretty-printed JSON.
pub fn to_json(input: &ExportInput) -> ExportResult<String> {
    ProjectDocument::build(input).to_json()
}
