mod frame_source;
mod sampler;

pub use frame_source::{Frame, FrameSource, ImageSequence, DEFAULT_FPS};
pub use sampler::{SpatialColorSampler, DEFAULT_SAMPLE_SCALE};
