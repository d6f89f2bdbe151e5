pub mod render;

pub use render::{FrameStats, FrameView, SkiaRenderer, render_bone_pixmap};
