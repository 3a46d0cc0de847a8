//! Freehand doodle canvas: smoothed, textured strokes with replay-based undo.

pub mod color;
pub mod engine;
pub mod export;
pub mod jitter;
pub mod stroke;
pub mod surface;

pub use color::Color;
pub use engine::{
    render_strokes, CanvasEngine, PointerEvent, StrokeFeedback, CANVAS_HEIGHT,
    GLOW_FADE_DELAY_MS, GLOW_PER_WIDTH,
};
pub use export::{flatten_on_white, EXPORT_FILE_NAME};
pub use jitter::Jitter;
pub use stroke::{PathSegment, Stroke, StrokePoint, StrokeStyle};
pub use surface::{RasterSurface, Surface};
