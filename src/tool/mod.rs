pub mod types;
mod trait_def;

pub use trait_def::Tool;
pub use types::ToolType;

// Re-export specific tool implementations
pub use types::adjust::AdjustTool;
pub use types::background::BackgroundTool;
pub use types::crop::{ASPECT_RATIOS, AspectPreset, CropSession, CropSettings, CropSnapshot};
pub use types::text::TextTool;
