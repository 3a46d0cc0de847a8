use serde::Serialize;

use super::Color;

pub type Point = [f32; 2];

/// One pointer sample in surface-local logical coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokePoint {
    pub x: f32,
    pub y: f32,
    pub time_ms: f64,
}

impl StrokePoint {
    pub fn position(&self) -> Point {
        [self.x, self.y]
    }
}

/// Paint settings captured when a stroke begins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StrokeStyle {
    pub color: Color,
    pub width: f32,
}

impl StrokeStyle {
    pub fn new(color: Color, width: f32) -> Self {
        Self {
            color,
            width: width.max(0.5),
        }
    }
}

/// Geometry of one rendered piece of a stroke, exactly as it was drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum PathSegment {
    Quadratic {
        from: Point,
        control: Point,
        to: Point,
        width: f32,
    },
    Line {
        from: Point,
        to: Point,
        width: f32,
    },
}

const CURVE_STEPS: usize = 16;

impl PathSegment {
    pub fn width(&self) -> f32 {
        match *self {
            PathSegment::Quadratic { width, .. } | PathSegment::Line { width, .. } => width,
        }
    }

    /// Polyline approximation of the segment.
    pub fn flatten(&self) -> Vec<Point> {
        match *self {
            PathSegment::Line { from, to, .. } => vec![from, to],
            PathSegment::Quadratic { from, control, to, .. } => (0..=CURVE_STEPS)
                .map(|i| {
                    let t = i as f32 / CURVE_STEPS as f32;
                    let inv = 1.0 - t;
                    [
                        inv * inv * from[0] + 2.0 * inv * t * control[0] + t * t * to[0],
                        inv * inv * from[1] + 2.0 * inv * t * control[1] + t * t * to[1],
                    ]
                })
                .collect(),
        }
    }
}

pub fn midpoint(a: Point, b: Point) -> Point {
    [(a[0] + b[0]) / 2.0, (a[1] + b[1]) / 2.0]
}

/// A finished freehand stroke. Never mutated after it enters history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stroke {
    points: Vec<StrokePoint>,
    style: StrokeStyle,
    path: Vec<PathSegment>,
    glow: f32,
}

impl Stroke {
    pub(crate) fn new(
        points: Vec<StrokePoint>,
        style: StrokeStyle,
        path: Vec<PathSegment>,
        glow: f32,
    ) -> Self {
        Self {
            points,
            style,
            path,
            glow,
        }
    }

    pub fn points(&self) -> &[StrokePoint] {
        &self.points
    }

    pub fn style(&self) -> StrokeStyle {
        self.style
    }

    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    /// Halo blur the stroke was drawn with.
    pub fn glow(&self) -> f32 {
        self.glow
    }
}
