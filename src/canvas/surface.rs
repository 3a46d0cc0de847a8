use image::{Rgba, RgbaImage};

use super::{stroke::Point, Color, PathSegment};

/// Drawing context the canvas engine renders into. All coordinates are in
/// logical units; implementations own the mapping to device pixels.
pub trait Surface {
    /// Reallocate the backing buffer for the new size. Contents are lost.
    fn resize(&mut self, logical_width: u32, logical_height: u32, density: f32);
    fn logical_size(&self) -> (u32, u32);
    fn density(&self) -> f32;
    fn clear(&mut self);
    /// Soft halo drawn under subsequent segments. `blur == 0` turns it off.
    fn set_glow(&mut self, blur: f32);
    fn glow(&self) -> f32;
    fn stroke_segment(&mut self, segment: &PathSegment, color: Color);
}

const GLOW_ALPHA: f32 = 0.2;

/// In-memory bitmap surface. The backing buffer is
/// `logical size × density` pixels so strokes stay crisp on dense displays.
#[derive(Clone)]
pub struct RasterSurface {
    logical_width: u32,
    logical_height: u32,
    density: f32,
    glow_blur: f32,
    pixels: RgbaImage,
}

impl RasterSurface {
    pub fn new(logical_width: u32, logical_height: u32, density: f32) -> Self {
        let mut surface = Self {
            logical_width: 0,
            logical_height: 0,
            density: 1.0,
            glow_blur: 0.0,
            pixels: RgbaImage::new(1, 1),
        };
        surface.resize(logical_width, logical_height, density);
        surface
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.pixels().all(|p| p.0[3] == 0)
    }

    /// Pixel at a logical coordinate.
    pub fn pixel_at(&self, x: f32, y: f32) -> Option<[u8; 4]> {
        let px = (x * self.density).floor();
        let py = (y * self.density).floor();
        if px < 0.0 || py < 0.0 {
            return None;
        }
        let (px, py) = (px as u32, py as u32);
        (px < self.pixels.width() && py < self.pixels.height())
            .then(|| self.pixels.get_pixel(px, py).0)
    }

    fn to_device(&self, p: Point) -> Point {
        [p[0] * self.density, p[1] * self.density]
    }

    /// Paint every device pixel whose center lies within `radius` of the
    /// polyline. Each pixel is blended at most once per call.
    fn fill_polyline(&mut self, points: &[Point], radius: f32, color: Color) {
        if points.is_empty() || color.a == 0 {
            return;
        }

        let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
        let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
        for p in points {
            min_x = min_x.min(p[0]);
            min_y = min_y.min(p[1]);
            max_x = max_x.max(p[0]);
            max_y = max_y.max(p[1]);
        }

        let width = self.pixels.width() as f32;
        let height = self.pixels.height() as f32;
        let x0 = (min_x - radius).floor().max(0.0);
        let y0 = (min_y - radius).floor().max(0.0);
        let x1 = (max_x + radius).ceil().min(width - 1.0);
        let y1 = (max_y + radius).ceil().min(height - 1.0);
        if x0 > x1 || y0 > y1 {
            return;
        }

        let radius_sq = radius * radius;
        for py in y0 as u32..=y1 as u32 {
            for px in x0 as u32..=x1 as u32 {
                let center = [px as f32 + 0.5, py as f32 + 0.5];
                let covered = if points.len() == 1 {
                    distance_sq(center, points[0]) <= radius_sq
                } else {
                    points
                        .windows(2)
                        .any(|w| segment_distance_sq(center, w[0], w[1]) <= radius_sq)
                };
                if covered {
                    blend(self.pixels.get_pixel_mut(px, py), color);
                }
            }
        }
    }
}

impl Surface for RasterSurface {
    fn resize(&mut self, logical_width: u32, logical_height: u32, density: f32) {
        let density = if density.is_finite() && density > 0.0 {
            density
        } else {
            1.0
        };
        self.logical_width = logical_width.max(1);
        self.logical_height = logical_height.max(1);
        self.density = density;

        let device_width = (self.logical_width as f32 * density).round().max(1.0) as u32;
        let device_height = (self.logical_height as f32 * density).round().max(1.0) as u32;
        self.pixels = RgbaImage::new(device_width, device_height);
    }

    fn logical_size(&self) -> (u32, u32) {
        (self.logical_width, self.logical_height)
    }

    fn density(&self) -> f32 {
        self.density
    }

    fn clear(&mut self) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    fn set_glow(&mut self, blur: f32) {
        self.glow_blur = blur.max(0.0);
    }

    fn glow(&self) -> f32 {
        self.glow_blur
    }

    fn stroke_segment(&mut self, segment: &PathSegment, color: Color) {
        let points: Vec<Point> = segment
            .flatten()
            .into_iter()
            .map(|p| self.to_device(p))
            .collect();
        let radius = (segment.width() * self.density / 2.0).max(0.5);

        if self.glow_blur > 0.0 {
            let halo = radius + self.glow_blur * self.density / 2.0;
            self.fill_polyline(&points, halo, color.with_alpha(GLOW_ALPHA));
        }
        self.fill_polyline(&points, radius, color);
    }
}

fn distance_sq(a: Point, b: Point) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx * dx + dy * dy
}

fn segment_distance_sq(p: Point, a: Point, b: Point) -> f32 {
    let ab = [b[0] - a[0], b[1] - a[1]];
    let len_sq = ab[0] * ab[0] + ab[1] * ab[1];
    if len_sq <= f32::EPSILON {
        return distance_sq(p, a);
    }
    let t = (((p[0] - a[0]) * ab[0] + (p[1] - a[1]) * ab[1]) / len_sq).clamp(0.0, 1.0);
    distance_sq(p, [a[0] + t * ab[0], a[1] + t * ab[1]])
}

/// Source-over compositing of `src` onto `dst`.
fn blend(dst: &mut Rgba<u8>, src: Color) {
    let sa = src.a as f32 / 255.0;
    let da = dst.0[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }

    let channel = |s: u8, d: u8| -> u8 {
        let value = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
        value.round().clamp(0.0, 255.0) as u8
    };

    *dst = Rgba([
        channel(src.r, dst.0[0]),
        channel(src.g, dst.0[1]),
        channel(src.b, dst.0[2]),
        (out_a * 255.0).round() as u8,
    ]);
}
