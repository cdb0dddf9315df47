//! Editing session: a canvas bound to a project in storage.
//!
//! The canvas never waits on storage. The session collects what changed from
//! the canvas events and writes it back on [`Session::flush`].

use crate::canvas::{Canvas, CanvasEvent};
use crate::config::CanvasConfig;
use crate::project::Project;
use crate::scene::Scene;
use crate::sequence::{Sequence, SequenceId, Sequences};
use crate::shapes::{MapObject, ProjectId, ShapeId};
use crate::storage::{Storage, StorageExt, StorageResult};
use std::collections::HashSet;
use std::sync::Arc;

/// Save indicator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SaveStatus {
    #[default]
    Saved,
    Dirty,
    Saving,
    Failed(String),
}

pub struct Session<S: Storage + ?Sized> {
    storage: Arc<S>,
    project: Project,
    canvas: Canvas,
    /// Shape ids present in storage as of the last successful flush.
    stored_shapes: HashSet<ShapeId>,
    dirty_shapes: HashSet<ShapeId>,
    dirty_sequences: HashSet<SequenceId>,
    deleted_sequences: HashSet<SequenceId>,
    project_dirty: bool,
    status: SaveStatus,
    seen_revision: u64,
}

impl<S: Storage + ?Sized> Session<S> {
    /// Create and persist a new empty project.
    pub async fn create(storage: Arc<S>, name: &str, config: CanvasConfig) -> StorageResult<Self> {
        let project = Project::new(name);
        storage.save(&project).await?;
        let seen_revision = storage.revision().await?;
        log::info!("Created project {} ({})", project.name, project.id);
        let canvas = Canvas::new(project.id, config);
        Ok(Self::with_parts(storage, project, canvas, HashSet::new(), seen_revision))
    }

    /// Load a project with its shapes and sequences.
    pub async fn open(storage: Arc<S>, project_id: ProjectId, config: CanvasConfig) -> StorageResult<Self> {
        let (project, scene, sequences) = load_content(storage.as_ref(), project_id).await?;
        let seen_revision = storage.revision().await?;
        let stored_shapes = scene.objects().map(|o| o.id).collect();
        log::info!(
            "Opened project {} with {} shapes and {} sequences",
            project.name,
            scene.len(),
            sequences.len()
        );
        let canvas = Canvas::from_parts(scene, project.calibration, sequences, config);
        Ok(Self::with_parts(storage, project, canvas, stored_shapes, seen_revision))
    }

    fn with_parts(
        storage: Arc<S>,
        project: Project,
        canvas: Canvas,
        stored_shapes: HashSet<ShapeId>,
        seen_revision: u64,
    ) -> Self {
        Self {
            storage,
            project,
            canvas,
            stored_shapes,
            dirty_shapes: HashSet::new(),
            dirty_sequences: HashSet::new(),
            deleted_sequences: HashSet::new(),
            project_dirty: false,
            status: SaveStatus::Saved,
            seen_revision,
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Mutable canvas access. Call [`Session::collect_changes`] afterwards.
    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    pub fn status(&self) -> &SaveStatus {
        &self.status
    }

    pub fn is_dirty(&self) -> bool {
        self.project_dirty
            || !self.dirty_shapes.is_empty()
            || !self.dirty_sequences.is_empty()
            || !self.deleted_sequences.is_empty()
            || self.has_deleted_shapes()
    }

    fn has_deleted_shapes(&self) -> bool {
        self.stored_shapes.iter().any(|id| !self.canvas.scene().contains(*id))
    }

    /// Drain canvas events, marking what needs saving. Returns the events for the UI.
    pub fn collect_changes(&mut self) -> Vec<CanvasEvent> {
        let events = self.canvas.drain_events();
        for event in &events {
            match event {
                CanvasEvent::ShapeCreated(id) | CanvasEvent::ShapeUpdated(id) => {
                    self.dirty_shapes.insert(*id);
                }
                CanvasEvent::HistoryRestored => {
                    // Any shape may have changed; deletions are found by diffing at flush.
                    self.dirty_shapes.extend(self.canvas.scene().objects().map(|o| o.id));
                }
                CanvasEvent::CalibrationChanged(_) | CanvasEvent::ImagesChanged => {
                    self.project_dirty = true;
                }
                CanvasEvent::SequenceChanged(id) => {
                    self.deleted_sequences.remove(id);
                    self.dirty_sequences.insert(*id);
                }
                CanvasEvent::SequenceDeleted(id) => {
                    self.dirty_sequences.remove(id);
                    self.deleted_sequences.insert(*id);
                }
                CanvasEvent::ShapeDeleted(_)
                | CanvasEvent::SelectionChanged(_)
                | CanvasEvent::LineCompleted { .. }
                | CanvasEvent::CalibrationPending(_)
                | CanvasEvent::ToolChanged(_) => {}
            }
        }
        if self.is_dirty() && self.status != SaveStatus::Saving {
            self.status = SaveStatus::Dirty;
        }
        events
    }

    /// Write pending changes. On failure the in-memory state is kept and retried next flush.
    pub async fn flush(&mut self) -> StorageResult<()> {
        self.collect_changes();
        if !self.is_dirty() {
            return Ok(());
        }
        self.status = SaveStatus::Saving;
        match self.write_changes().await {
            Ok(()) => {
                self.status = SaveStatus::Saved;
                log::debug!("Saved project {}", self.project.id);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to save project {}: {}", self.project.id, e);
                self.status = SaveStatus::Failed(e.to_string());
                Err(e)
            }
        }
    }

    async fn write_changes(&mut self) -> StorageResult<()> {
        let storage = self.storage.clone();

        if self.project_dirty {
            self.project.calibration = self.canvas.calibration().copied();
            self.project.images = self.canvas.scene().images().to_vec();
            self.project.touch();
            storage.save(&self.project).await?;
            self.project_dirty = false;
        }

        let dirty: Vec<ShapeId> = self.dirty_shapes.iter().copied().collect();
        for id in dirty {
            if let Some(object) = self.canvas.scene().get(id) {
                storage.save(object).await?;
                self.stored_shapes.insert(id);
            }
            self.dirty_shapes.remove(&id);
        }

        let deleted: Vec<ShapeId> = self
            .stored_shapes
            .iter()
            .copied()
            .filter(|id| !self.canvas.scene().contains(*id))
            .collect();
        for id in deleted {
            storage.remove::<MapObject>(id).await?;
            self.stored_shapes.remove(&id);
        }

        let dirty: Vec<SequenceId> = self.dirty_sequences.iter().copied().collect();
        for id in dirty {
            if let Some(sequence) = self.canvas.sequences().get(id) {
                storage.save(sequence).await?;
            }
            self.dirty_sequences.remove(&id);
        }

        let deleted: Vec<SequenceId> = self.deleted_sequences.iter().copied().collect();
        for id in deleted {
            storage.remove::<Sequence>(id).await?;
            self.deleted_sequences.remove(&id);
        }

        self.seen_revision = storage.revision().await?;
        Ok(())
    }

    /// Pick up changes written by someone else. Unsaved local edits win:
    /// a dirty session is not reloaded. Returns whether the canvas was replaced.
    pub async fn reconcile(&mut self) -> StorageResult<bool> {
        let revision = self.storage.revision().await?;
        if revision == self.seen_revision {
            return Ok(false);
        }
        self.collect_changes();
        if self.is_dirty() {
            log::warn!("Storage changed under unsaved edits; keeping local state");
            return Ok(false);
        }
        let (project, scene, sequences) = load_content(self.storage.as_ref(), self.project.id).await?;
        log::info!("Reloading project {} at revision {}", project.id, revision);
        self.stored_shapes = scene.objects().map(|o| o.id).collect();
        self.canvas.replace_content(scene, project.calibration, sequences);
        self.canvas.drain_events();
        self.project = project;
        self.seen_revision = revision;
        Ok(true)
    }

    /// Flush and end the session.
    pub async fn close(mut self) -> StorageResult<()> {
        self.flush().await?;
        log::info!("Closed project {}", self.project.id);
        Ok(())
    }
}

async fn load_content<S: Storage + ?Sized>(
    storage: &S,
    project_id: ProjectId,
) -> StorageResult<(Project, Scene, Sequences)> {
    let project: Project = storage.load(project_id).await?;
    let mut objects: Vec<MapObject> = storage.load_all(Some(project_id)).await?;
    // Storage order is arbitrary; insertion order is creation order.
    objects.sort_by_key(|o| o.created_at);
    let mut sequences: Vec<Sequence> = storage.load_all(Some(project_id)).await?;
    sequences.sort_by_key(|s| s.created_at);
    let scene = Scene::from_parts(project_id, objects, project.images.clone());
    Ok((project, scene, Sequences::from_vec(sequences)))
}
