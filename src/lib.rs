#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod config;
pub mod element;
pub mod error;
pub mod event;
pub mod id_generator;
pub mod image;
pub mod notice;
pub mod scene;
pub mod state;
pub mod store;
pub mod tool;
pub mod util;
pub mod viewport;

pub use app::PhotoEditorApp;
pub use config::EditorConfig;
pub use element::{ObjectId, VisualObject};
pub use error::{EditorError, EditorResult};
pub use notice::{Notice, NoticeLevel};
pub use scene::Scene;
pub use state::{EditorServices, EditorSession, PersistenceSynchronizer, ToolMode, ToolModeMachine};
pub use viewport::Viewport;
