mod editor_state;
pub mod context;
mod persistence;

pub use context::{EditorServices, EditorSession};
pub use editor_state::{ToolMode, ToolModeMachine};
pub use persistence::PersistenceSynchronizer;
