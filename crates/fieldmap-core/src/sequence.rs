//! Journeys: ordered references to shapes.

use crate::scene::Scene;
use crate::shapes::{MapObject, ProjectId, ShapeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type SequenceId = Uuid;

/// An ordered traversal through shapes. Shapes are referenced, not owned, so
/// `object_ids` may hold ids of shapes that have since been deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sequence {
    pub id: SequenceId,
    pub project_id: ProjectId,
    pub name: String,
    pub object_ids: Vec<ShapeId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sequence {
    pub fn new(project_id: ProjectId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            project_id,
            name: name.into(),
            object_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.updated_at = Utc::now();
    }

    pub fn append(&mut self, id: ShapeId) {
        self.object_ids.push(id);
        self.updated_at = Utc::now();
    }

    /// Remove every occurrence of `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: ShapeId) -> bool {
        let before = self.object_ids.len();
        self.object_ids.retain(|o| *o != id);
        let changed = self.object_ids.len() != before;
        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }

    /// Move the entry at `from` to position `to`. Out-of-range indices are a no-op.
    pub fn move_entry(&mut self, from: usize, to: usize) -> bool {
        if from >= self.object_ids.len() || to >= self.object_ids.len() {
            return false;
        }
        let id = self.object_ids.remove(from);
        self.object_ids.insert(to, id);
        self.updated_at = Utc::now();
        true
    }

    /// The referenced shapes that still exist, in sequence order.
    pub fn resolve<'a>(&self, scene: &'a Scene) -> Vec<&'a MapObject> {
        self.object_ids.iter().filter_map(|id| scene.get(*id)).collect()
    }

    pub fn names_in_order(&self, scene: &Scene) -> Vec<String> {
        self.resolve(scene).into_iter().map(|o| o.name.clone()).collect()
    }

    /// Ids that no longer resolve.
    pub fn dangling(&self, scene: &Scene) -> Vec<ShapeId> {
        self.object_ids
            .iter()
            .copied()
            .filter(|id| !scene.contains(*id))
            .collect()
    }
}

/// All sequences of a project plus the one being recorded into.
#[derive(Debug, Clone, Default)]
pub struct Sequences {
    items: Vec<Sequence>,
    active: Option<SequenceId>,
}

impl Sequences {
    pub fn from_vec(items: Vec<Sequence>) -> Self {
        Self { items, active: None }
    }

    pub fn create(&mut self, project_id: ProjectId, name: impl Into<String>) -> SequenceId {
        let sequence = Sequence::new(project_id, name);
        let id = sequence.id;
        self.items.push(sequence);
        id
    }

    pub fn get(&self, id: SequenceId) -> Option<&Sequence> {
        self.items.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: SequenceId) -> Option<&mut Sequence> {
        self.items.iter_mut().find(|s| s.id == id)
    }

    pub fn delete(&mut self, id: SequenceId) -> Option<Sequence> {
        let idx = self.items.iter().position(|s| s.id == id)?;
        if self.active == Some(id) {
            self.active = None;
        }
        Some(self.items.remove(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sequence> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn active(&self) -> Option<SequenceId> {
        self.active
    }

    /// Choose the sequence record mode appends to. Unknown ids clear it.
    pub fn set_active(&mut self, id: Option<SequenceId>) {
        self.active = id.filter(|id| self.get(*id).is_some());
    }

    /// Append to the active sequence. Returns its id if there was one.
    pub fn append_to_active(&mut self, shape: ShapeId) -> Option<SequenceId> {
        let id = self.active?;
        self.get_mut(id)?.append(shape);
        Some(id)
    }
}
