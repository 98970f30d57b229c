//! Shared contract types for neural-field
//!
//! Everything that crosses the boundary between the producers (audio
//! extractor, video sampler), the particle engine and the drawing backend
//! lives here so the engine never depends on a concrete backend.

pub mod audio;
pub mod color;
pub mod draw;
pub mod field;
pub mod rect;

pub use audio::MusicState;
pub use color::{Color, Rgb};
pub use draw::{BlendMode, DrawCommand, RecordingSurface, Surface};
pub use field::ColorField;
pub use rect::{Point, Viewport};
