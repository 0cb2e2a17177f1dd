//! Tools module - the preview tool boundary
//!
//! One tool is recognized: `get_preview`, which renders an animation script
//! to raster frames.

pub mod preview;

pub use preview::{
    preview_tool_definition, ManimInvoker, PreviewArgs, PreviewInvoker, PreviewOutcome,
    PREVIEW_TOOL_NAME,
};
