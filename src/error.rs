use thiserror::Error;

use crate::state::ToolMode;
use crate::store::ProjectId;

/// An image could not be fetched or decoded. The operation that asked for it
/// is aborted and the scene is left as it was.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("image not found: {0}")]
    NotFound(String),

    #[error("failed to read image {url}: {source}")]
    Io {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: image::ImageError,
    },

    #[error("image {url} has zero size")]
    Empty { url: String },
}

/// A persisted scene blob could not be turned back into a scene.
#[derive(Debug, Error)]
pub enum DeserializationError {
    #[error("malformed scene blob: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("scene blob version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("scene blob is {found_width}x{found_height}, project is {width}x{height}")]
    DimensionMismatch {
        width: u32,
        height: u32,
        found_width: u32,
        found_height: u32,
    },

    #[error("scene blob contains duplicate object id {0}")]
    DuplicateObject(String),
}

/// Failures reported by a [`crate::store::ProjectStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("project {0} not found")]
    NotFound(ProjectId),

    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store record is invalid: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store rejected the update: {0}")]
    Rejected(String),
}

/// Saving the scene failed. The in-memory scene stays authoritative.
#[derive(Debug, Error)]
pub enum PersistenceWriteError {
    #[error("failed to serialize scene: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to save project {project}: {source}")]
    Store {
        project: ProjectId,
        #[source]
        source: StoreError,
    },

    #[error("session for project {0} is closed")]
    Closed(ProjectId),
}

/// A tool mode could not do what was asked. Never fatal, usually shown as a
/// notice.
#[derive(Debug, Error, PartialEq)]
pub enum TransitionError {
    #[error("{mode} needs an image on the canvas")]
    NoTargetImage { mode: ToolMode },

    #[error("{mode} is already active")]
    AlreadyActive { mode: ToolMode },

    #[error("switch to {mode} first")]
    ModeNotActive { mode: ToolMode },
}

#[derive(Debug, Error, PartialEq)]
pub enum CropError {
    #[error("no crop in progress")]
    NotActive,

    #[error("crop target is no longer on the canvas")]
    TargetMissing,

    #[error("crop region {width}x{height} does not cover the image")]
    InvalidRegion { width: f32, height: f32 },
}

/// The image transformation service failed.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("no source image to transform")]
    NoSource,

    #[error("transformation service failed: {0}")]
    Service(String),
}

/// Umbrella error for session level operations
#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Deserialization(#[from] DeserializationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    PersistenceWrite(#[from] PersistenceWriteError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Crop(#[from] CropError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("project has no original image to reset to")]
    NoOriginalImage,

    #[error("no image on the canvas")]
    NoImage,

    #[error("the editing session is closed")]
    Closed,
}

pub type EditorResult<T> = Result<T, EditorError>;
