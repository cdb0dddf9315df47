//! Projects and saved datasets.

use crate::background::BackgroundImage;
use crate::calibration::Calibration;
use crate::shapes::ProjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type DatasetId = Uuid;

/// A mapped site: its base images and calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub calibration: Option<Calibration>,
    #[serde(default)]
    pub images: Vec<BackgroundImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            calibration: None,
            images: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn pixels_per_meter(&self) -> Option<f64> {
        self.calibration.map(|c| c.pixels_per_meter)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// An opaque saved data payload belonging to a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub id: DatasetId,
    pub project_id: ProjectId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Dataset {
    pub fn new(project_id: ProjectId, name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id,
            name: name.into(),
            created_at: Utc::now(),
            payload,
        }
    }
}
