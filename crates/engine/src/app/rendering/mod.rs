mod raster;
mod renderer;

pub use renderer::Renderer;

/// Output surface size in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

pub const PLACEHOLDER_HALF_SIZE_PX: f32 = 5.0;
