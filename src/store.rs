//! The external project store and two implementations of it.

use futures::future::{FutureExt, LocalBoxFuture};
use log::{debug, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::StoreError;
use crate::util::time;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId(pub String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A project record as the store keeps it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    /// Logical canvas size, fixed at creation
    pub width: u32,
    pub height: u32,
    pub original_image_url: Option<String>,
    /// Latest processed image, if any transformation was applied
    pub current_image_url: Option<String>,
    /// Serialized scene blob
    pub canvas_state: Option<String>,
    /// CDN transformation parameters for `current_image_url`
    pub active_transformations: Option<String>,
    #[serde(default)]
    pub background_removed: bool,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Project {
    pub fn new(id: ProjectId, title: impl Into<String>, width: u32, height: u32) -> Self {
        let now = time::timestamp_secs();
        Self {
            id,
            title: title.into(),
            width,
            height,
            original_image_url: None,
            current_image_url: None,
            canvas_state: None,
            active_transformations: None,
            background_removed: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.original_image_url = Some(url.into());
        self
    }

    /// The image to show when there is no saved scene
    pub fn display_image_url(&self) -> Option<&str> {
        self.current_image_url
            .as_deref()
            .or(self.original_image_url.as_deref())
    }
}

/// Partial update of a project. `None` leaves a field alone; for optional
/// fields `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectPatch {
    pub canvas_state: Option<String>,
    pub current_image_url: Option<Option<String>>,
    pub active_transformations: Option<Option<String>>,
    pub background_removed: Option<bool>,
}

impl ProjectPatch {
    pub fn scene(blob: String) -> Self {
        Self {
            canvas_state: Some(blob),
            ..Self::default()
        }
    }

    pub fn apply(self, project: &mut Project) {
        if let Some(state) = self.canvas_state {
            project.canvas_state = Some(state);
        }
        if let Some(url) = self.current_image_url {
            project.current_image_url = url;
        }
        if let Some(transformations) = self.active_transformations {
            project.active_transformations = transformations;
        }
        if let Some(removed) = self.background_removed {
            project.background_removed = removed;
        }
        project.updated_at = time::timestamp_secs();
    }
}

/// Where project records live. Single writer per project is assumed.
pub trait ProjectStore {
    fn get<'a>(&'a self, id: &'a ProjectId) -> LocalBoxFuture<'a, Result<Project, StoreError>>;

    fn update<'a>(
        &'a self,
        id: &'a ProjectId,
        patch: ProjectPatch,
    ) -> LocalBoxFuture<'a, Result<(), StoreError>>;
}

/// In-process store. Records every accepted patch and can be told to reject
/// writes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    projects: Mutex<HashMap<ProjectId, Project>>,
    writes: Mutex<Vec<(ProjectId, ProjectPatch)>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, project: Project) {
        self.projects.lock().insert(project.id.clone(), project);
    }

    pub fn project(&self, id: &ProjectId) -> Option<Project> {
        self.projects.lock().get(id).cloned()
    }

    /// Patches accepted so far, oldest first
    pub fn writes(&self) -> Vec<(ProjectId, ProjectPatch)> {
        self.writes.lock().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().len()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl ProjectStore for MemoryStore {
    fn get<'a>(&'a self, id: &'a ProjectId) -> LocalBoxFuture<'a, Result<Project, StoreError>> {
        async move {
            self.project(id)
                .ok_or_else(|| StoreError::NotFound(id.clone()))
        }
        .boxed_local()
    }

    fn update<'a>(
        &'a self,
        id: &'a ProjectId,
        patch: ProjectPatch,
    ) -> LocalBoxFuture<'a, Result<(), StoreError>> {
        async move {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StoreError::Rejected("writes disabled".to_owned()));
            }
            let mut projects = self.projects.lock();
            let project = projects
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(id.clone()))?;
            patch.clone().apply(project);
            self.writes.lock().push((id.clone(), patch));
            Ok(())
        }
        .boxed_local()
    }
}

/// One pretty-printed JSON file per project in a directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, id: &ProjectId) -> PathBuf {
        // Keep ids from escaping the directory
        let name: String = id
            .0
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.json"))
    }

    fn read(&self, id: &ProjectId) -> Result<Project, StoreError> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(StoreError::NotFound(id.clone()));
        }
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    fn write(&self, project: &Project) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(project)?;
        let path = self.path_for(&project.id);
        write_atomically(&path, &json)?;
        debug!("Wrote project {} to {}", project.id, path.display());
        Ok(())
    }

    /// Create or overwrite a project record
    pub fn insert(&self, project: &Project) -> Result<(), StoreError> {
        self.write(project)
    }
}

/// Write to a sibling temp file, then rename over the target
fn write_atomically(path: &Path, contents: &str) -> std::io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents)?;
    if let Err(e) = fs::rename(&tmp, path) {
        warn!("Rename of {} failed: {}", tmp.display(), e);
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

impl ProjectStore for JsonFileStore {
    fn get<'a>(&'a self, id: &'a ProjectId) -> LocalBoxFuture<'a, Result<Project, StoreError>> {
        async move { self.read(id) }.boxed_local()
    }

    fn update<'a>(
        &'a self,
        id: &'a ProjectId,
        patch: ProjectPatch,
    ) -> LocalBoxFuture<'a, Result<(), StoreError>> {
        async move {
            let mut project = self.read(id)?;
            patch.apply(&mut project);
            self.write(&project)
        }
        .boxed_local()
    }
}
