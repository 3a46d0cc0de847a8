use serde::Serialize;

use super::{
    stroke::midpoint, Jitter, PathSegment, Stroke, StrokePoint, StrokeStyle, Surface,
};

const ENABLE_LOGS: bool = false;

use crate::{log_debug, log_info};

/// Logical height of the doodle area; width follows the container.
pub const CANVAS_HEIGHT: u32 = 400;
/// Glow radius per unit of stroke width while a stroke is live.
pub const GLOW_PER_WIDTH: f32 = 1.5;
/// How long the glow lingers after the pointer lifts.
pub const GLOW_FADE_DELAY_MS: f64 = 600.0;

/// Pointer sample as delivered by the host, in surface-local logical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub x: f32,
    pub y: f32,
    pub time_ms: f64,
}

impl PointerEvent {
    pub fn new(x: f32, y: f32, time_ms: f64) -> Self {
        Self { x, y, time_ms }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokeFeedback {
    /// True only for the very first stroke this engine sees.
    pub first_stroke: bool,
}

struct ActiveStroke {
    points: Vec<StrokePoint>,
    style: StrokeStyle,
    path: Vec<PathSegment>,
    glow: f32,
}

/// Freehand drawing with authoritative undo: the surface is always
/// reproducible by replaying `history` onto a blank buffer.
pub struct CanvasEngine<S: Surface> {
    surface: S,
    history: Vec<Stroke>,
    active: Option<ActiveStroke>,
    jitter: Jitter,
    glow_fade_at_ms: Option<f64>,
    has_drawn: bool,
}

impl<S: Surface> CanvasEngine<S> {
    pub fn new(surface: S, jitter: Jitter) -> Self {
        Self {
            surface,
            history: Vec::new(),
            active: None,
            jitter,
            glow_fade_at_ms: None,
            has_drawn: false,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn history(&self) -> &[Stroke] {
        &self.history
    }

    pub fn is_drawing(&self) -> bool {
        self.active.is_some()
    }

    pub fn glow_pending(&self) -> bool {
        self.glow_fade_at_ms.is_some()
    }

    pub fn begin_stroke(&mut self, event: PointerEvent, style: StrokeStyle) -> StrokeFeedback {
        if self.active.is_some() {
            // Lost the previous pointer-up; close that stroke first.
            self.end_stroke(event.time_ms);
        }

        let glow = style.width * GLOW_PER_WIDTH;
        self.glow_fade_at_ms = None;
        self.surface.set_glow(glow);

        self.active = Some(ActiveStroke {
            points: vec![StrokePoint {
                x: event.x,
                y: event.y,
                time_ms: event.time_ms,
            }],
            style,
            path: Vec::new(),
            glow,
        });

        let first_stroke = !self.has_drawn;
        self.has_drawn = true;
        StrokeFeedback { first_stroke }
    }

    /// Append a sample and render only the newest smoothed piece.
    pub fn extend_stroke(&mut self, event: PointerEvent) {
        let Some(active) = self.active.as_mut() else {
            return;
        };

        active.points.push(StrokePoint {
            x: event.x,
            y: event.y,
            time_ms: event.time_ms,
        });

        let n = active.points.len();
        if n < 3 {
            return;
        }

        let p0 = active.points[n - 3].position();
        let p1 = active.points[n - 2].position();
        let p2 = active.points[n - 1].position();
        let width = active.style.width;

        let segment = PathSegment::Quadratic {
            from: midpoint(p0, p1),
            control: self.jitter.perturb(p1, width),
            to: midpoint(p1, p2),
            width: self.jitter.width(width),
        };

        self.surface.stroke_segment(&segment, active.style.color);
        active.path.push(segment);
    }

    /// Pointer up, cancel or leave. Returns true if a stroke was committed.
    pub fn end_stroke(&mut self, time_ms: f64) -> bool {
        let Some(mut active) = self.active.take() else {
            return false;
        };

        self.glow_fade_at_ms = Some(time_ms + GLOW_FADE_DELAY_MS);

        if active.points.len() < 2 {
            return false;
        }

        if active.path.is_empty() {
            // Two samples never reach the curve renderer; draw them as a line.
            let segment = PathSegment::Line {
                from: active.points[0].position(),
                to: active.points[1].position(),
                width: active.style.width,
            };
            self.surface.stroke_segment(&segment, active.style.color);
            active.path.push(segment);
        }

        log_debug!(
            "stroke committed: {} points, {} segments",
            active.points.len(),
            active.path.len()
        );
        self.history
            .push(Stroke::new(active.points, active.style, active.path, active.glow));
        true
    }

    /// Fire the glow fade once its delay has passed.
    pub fn advance_timers(&mut self, now_ms: f64) {
        if let Some(fade_at) = self.glow_fade_at_ms {
            if now_ms >= fade_at {
                self.surface.set_glow(0.0);
                self.glow_fade_at_ms = None;
            }
        }
    }

    /// Remove the latest committed stroke and rebuild the surface from what
    /// remains. A stroke still in progress is kept and painted back on top.
    pub fn undo(&mut self) -> bool {
        if self.history.pop().is_none() {
            return false;
        }
        self.redraw();
        if let Some(active) = &self.active {
            let glow = self.surface.glow();
            self.surface.set_glow(active.glow);
            for segment in &active.path {
                self.surface.stroke_segment(segment, active.style.color);
            }
            self.surface.set_glow(glow);
        }
        true
    }

    pub fn clear(&mut self) {
        self.active = None;
        self.history.clear();
        self.surface.clear();
    }

    /// Match the container width at the given pixel density. The retained
    /// history is replayed onto the new buffer. Returns false when nothing
    /// changed.
    pub fn resize(&mut self, container_width: f32, density: f32) -> bool {
        let logical_width = container_width.max(1.0).floor() as u32;
        let (width, height) = self.surface.logical_size();
        if width == logical_width
            && height == CANVAS_HEIGHT
            && (self.surface.density() - density).abs() < f32::EPSILON
        {
            return false;
        }

        let glow = self.surface.glow();
        self.surface.resize(logical_width, CANVAS_HEIGHT, density);
        self.active = None;
        self.redraw();
        self.surface.set_glow(glow);

        log_info!(
            "canvas resized to {}x{} @{}x, replayed {} strokes",
            logical_width,
            CANVAS_HEIGHT,
            density,
            self.history.len()
        );
        true
    }

    /// Clear and replay every stroke in order with its own frozen style.
    pub fn redraw(&mut self) {
        self.surface.clear();
        render_strokes(&mut self.surface, &self.history);
    }

    /// Drop the in-progress stroke and any pending glow timer.
    pub fn teardown(&mut self) {
        self.active = None;
        self.glow_fade_at_ms = None;
        self.surface.set_glow(0.0);
    }
}

/// Render `strokes` onto `surface` in order, each with the glow it was drawn
/// with. The surface is not cleared and its own glow setting is restored.
pub fn render_strokes<S: Surface>(surface: &mut S, strokes: &[Stroke]) {
    let glow = surface.glow();
    for stroke in strokes {
        surface.set_glow(stroke.glow());
        let color = stroke.style().color;
        for segment in stroke.path() {
            surface.stroke_segment(segment, color);
        }
    }
    surface.set_glow(glow);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Color, RasterSurface};

    fn engine(jitter: Jitter) -> CanvasEngine<RasterSurface> {
        CanvasEngine::new(RasterSurface::new(200, CANVAS_HEIGHT, 1.0), jitter)
    }

    fn draw(
        engine: &mut CanvasEngine<RasterSurface>,
        points: &[(f32, f32)],
        style: StrokeStyle,
        t0: f64,
    ) {
        let (x, y) = points[0];
        engine.begin_stroke(PointerEvent::new(x, y, t0), style);
        for (i, &(x, y)) in points.iter().enumerate().skip(1) {
            engine.extend_stroke(PointerEvent::new(x, y, t0 + i as f64 * 16.0));
        }
        engine.end_stroke(t0 + points.len() as f64 * 16.0);
    }

    fn red(width: f32) -> StrokeStyle {
        StrokeStyle::new(Color::from_hex("#FF0000").unwrap(), width)
    }

    #[test]
    fn single_stroke_then_undo_is_blank() {
        let mut engine = engine(Jitter::disabled());
        draw(
            &mut engine,
            &[(20.0, 20.0), (40.0, 30.0), (60.0, 40.0), (80.0, 50.0), (100.0, 60.0)],
            red(5.0),
            0.0,
        );
        assert_eq!(engine.history().len(), 1);
        assert!(!engine.surface().is_blank());

        assert!(engine.undo());
        assert_eq!(engine.history().len(), 0);
        assert!(engine.surface().is_blank());
        assert!(!engine.undo());
    }

    #[test]
    fn undo_matches_replay_of_remaining_strokes() {
        let mut engine = engine(Jitter::seeded(5));
        draw(&mut engine, &[(10.0, 10.0), (50.0, 80.0), (90.0, 20.0), (120.0, 90.0)], red(6.0), 0.0);
        draw(
            &mut engine,
            &[(20.0, 200.0), (60.0, 180.0), (100.0, 220.0)],
            StrokeStyle::new(Color::rgb(0, 128, 255), 3.0),
            1000.0,
        );
        draw(&mut engine, &[(30.0, 300.0), (150.0, 310.0), (170.0, 380.0)], red(12.0), 2000.0);
        engine.undo();

        let mut fresh = RasterSurface::new(200, CANVAS_HEIGHT, 1.0);
        render_strokes(&mut fresh, engine.history());
        assert_eq!(engine.surface().pixels(), fresh.pixels());
    }

    #[test]
    fn undo_all_equals_clear() {
        let mut engine = engine(Jitter::seeded(9));
        for i in 0..4 {
            let y = 40.0 + i as f32 * 60.0;
            draw(&mut engine, &[(10.0, y), (60.0, y + 10.0), (120.0, y)], red(4.0), i as f64 * 500.0);
        }
        assert_eq!(engine.history().len(), 4);
        for _ in 0..4 {
            engine.undo();
        }

        let mut cleared = self::engine(Jitter::disabled());
        cleared.clear();
        assert_eq!(engine.surface().pixels(), cleared.surface().pixels());
        assert!(engine.surface().is_blank());
    }

    #[test]
    fn style_is_frozen_per_stroke() {
        let mut engine = engine(Jitter::disabled());
        let mut style = red(8.0);
        draw(&mut engine, &[(10.0, 50.0), (100.0, 50.0), (190.0, 50.0)], style, 0.0);
        style.color = Color::rgb(0, 255, 0);
        style.width = 2.0;
        draw(&mut engine, &[(10.0, 150.0), (100.0, 150.0), (190.0, 150.0)], style, 100.0);

        assert_eq!(engine.history()[0].style().color, Color::rgb(255, 0, 0));
        assert_eq!(engine.history()[0].style().width, 8.0);

        engine.redraw();
        let first = engine.surface().pixel_at(100.0, 50.0).unwrap();
        assert_eq!(first, [255, 0, 0, 255]);
    }

    #[test]
    fn short_strokes() {
        let mut engine = engine(Jitter::disabled());

        // A tap never becomes a stroke.
        engine.begin_stroke(PointerEvent::new(5.0, 5.0, 0.0), red(5.0));
        assert!(!engine.end_stroke(10.0));
        assert!(engine.history().is_empty());

        // Two samples commit as a straight line.
        engine.begin_stroke(PointerEvent::new(10.0, 100.0, 20.0), red(5.0));
        engine.extend_stroke(PointerEvent::new(60.0, 100.0, 36.0));
        assert!(engine.end_stroke(40.0));
        assert!(matches!(engine.history()[0].path()[0], PathSegment::Line { .. }));
        assert!(engine.surface().pixel_at(35.0, 100.0).is_some_and(|p| p[3] == 255));
    }

    #[test]
    fn incremental_segments_follow_sample_count() {
        let mut engine = engine(Jitter::disabled());
        draw(
            &mut engine,
            &[(0.0, 0.0), (10.0, 10.0), (20.0, 0.0), (30.0, 10.0), (40.0, 0.0)],
            red(5.0),
            0.0,
        );
        let stroke = &engine.history()[0];
        assert_eq!(stroke.points().len(), 5);
        assert_eq!(stroke.path().len(), 3);
        match stroke.path()[0] {
            PathSegment::Quadratic { from, control, to, .. } => {
                assert_eq!(from, [5.0, 5.0]);
                assert_eq!(control, [10.0, 10.0]);
                assert_eq!(to, [15.0, 5.0]);
            }
            _ => panic!("expected a curve"),
        }
    }

    #[test]
    fn first_stroke_feedback_fires_once() {
        let mut engine = engine(Jitter::disabled());
        let first = engine.begin_stroke(PointerEvent::new(1.0, 1.0, 0.0), red(3.0));
        engine.end_stroke(1.0);
        let second = engine.begin_stroke(PointerEvent::new(1.0, 1.0, 2.0), red(3.0));
        assert!(first.first_stroke);
        assert!(!second.first_stroke);
    }

    #[test]
    fn glow_fades_after_delay() {
        let mut engine = engine(Jitter::disabled());
        engine.begin_stroke(PointerEvent::new(1.0, 1.0, 0.0), red(4.0));
        assert_eq!(engine.surface().glow(), 4.0 * GLOW_PER_WIDTH);
        engine.extend_stroke(PointerEvent::new(20.0, 20.0, 16.0));
        engine.end_stroke(100.0);

        engine.advance_timers(100.0 + GLOW_FADE_DELAY_MS - 1.0);
        assert!(engine.glow_pending());
        engine.advance_timers(100.0 + GLOW_FADE_DELAY_MS);
        assert!(!engine.glow_pending());
        assert_eq!(engine.surface().glow(), 0.0);
    }

    #[test]
    fn resize_replays_history_at_new_density() {
        let mut engine = engine(Jitter::disabled());
        draw(&mut engine, &[(20.0, 50.0), (80.0, 50.0), (150.0, 50.0)], red(6.0), 0.0);

        assert!(!engine.resize(200.0, 1.0));
        assert!(engine.resize(240.0, 2.0));
        assert_eq!(engine.surface().pixels().dimensions(), (480, 800));
        assert_eq!(engine.history().len(), 1);
        assert_eq!(engine.surface().pixel_at(80.0, 50.0), Some([255, 0, 0, 255]));
    }

    #[test]
    fn undo_mid_stroke_keeps_the_live_stroke_replayable() {
        let mut engine = engine(Jitter::seeded(3));
        draw(&mut engine, &[(10.0, 40.0), (90.0, 60.0), (180.0, 40.0)], red(6.0), 0.0);

        let blue = StrokeStyle::new(Color::rgb(0, 0, 255), 4.0);
        engine.begin_stroke(PointerEvent::new(20.0, 200.0, 500.0), blue);
        for i in 1..=5 {
            let x = 20.0 + i as f32 * 20.0;
            let y = 200.0 + (i % 2) as f32 * 15.0;
            engine.extend_stroke(PointerEvent::new(x, y, 500.0 + i as f64 * 16.0));
        }
        assert!(engine.undo());
        assert!(engine.is_drawing());
        engine.extend_stroke(PointerEvent::new(150.0, 230.0, 620.0));
        engine.extend_stroke(PointerEvent::new(170.0, 210.0, 636.0));
        assert!(engine.end_stroke(650.0));

        assert_eq!(engine.history().len(), 1);
        let mut fresh = RasterSurface::new(200, CANVAS_HEIGHT, 1.0);
        render_strokes(&mut fresh, engine.history());
        assert_eq!(engine.surface().pixels(), fresh.pixels());
    }

    #[test]
    fn undo_keeps_halo_of_remaining_strokes() {
        let mut engine = engine(Jitter::disabled());
        draw(&mut engine, &[(10.0, 50.0), (100.0, 50.0), (190.0, 50.0)], red(4.0), 0.0);
        // Body radius 2, halo radius 5.
        let halo = engine.surface().pixel_at(100.0, 54.0).unwrap();
        assert!(halo[3] > 0 && halo[3] < 255);

        draw(&mut engine, &[(10.0, 300.0), (100.0, 300.0), (190.0, 300.0)], red(4.0), 1000.0);
        engine.advance_timers(5000.0);
        assert!(engine.undo());
        assert_eq!(engine.surface().pixel_at(100.0, 54.0), Some(halo));
        assert_eq!(engine.surface().glow(), 0.0);
    }

    #[test]
    fn teardown_drops_pending_work() {
        let mut engine = engine(Jitter::disabled());
        engine.begin_stroke(PointerEvent::new(1.0, 1.0, 0.0), red(4.0));
        engine.extend_stroke(PointerEvent::new(2.0, 2.0, 1.0));
        engine.teardown();
        assert!(!engine.is_drawing());
        assert!(!engine.glow_pending());
        assert!(engine.history().is_empty());
    }
}
