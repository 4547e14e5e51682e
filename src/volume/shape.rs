//! Planar shapes used for spot disks and region outlines.
//!
//! Pixel `(col, row)` is centered at `(col, row)`; a pixel belongs to a shape
//! when its center lies inside the shape.

use nalgebra::Point2;
use ndarray::ArrayView2;

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Axis-aligned rectangle covering `[x, x + width) × [y, y + height)`.
    Rectangle {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    /// Axis-aligned ellipse.
    Ellipse {
        center: Point2<f64>,
        radius_x: f64,
        radius_y: f64,
    },
    Disk {
        center: Point2<f64>,
        radius: f64,
    },
    /// Closed polygon, even-odd fill rule.
    Polygon(Vec<Point2<f64>>),
}

impl Shape {
    pub fn disk(x: f64, y: f64, radius: f64) -> Self {
        Shape::Disk {
            center: Point2::new(x, y),
            radius,
        }
    }

    pub fn rectangle(x: f64, y: f64, width: f64, height: f64) -> Self {
        Shape::Rectangle {
            x,
            y,
            width,
            height,
        }
    }

    pub fn polygon(vertices: &[(f64, f64)]) -> Self {
        Shape::Polygon(vertices.iter().map(|&(x, y)| Point2::new(x, y)).collect())
    }

    pub fn is_rectangle(&self) -> bool {
        matches!(self, Shape::Rectangle { .. })
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        match self {
            Shape::Rectangle {
                x: rx,
                y: ry,
                width,
                height,
            } => x >= *rx && x < rx + width && y >= *ry && y < ry + height,
            Shape::Ellipse {
                center,
                radius_x,
                radius_y,
            } => {
                if *radius_x <= 0.0 || *radius_y <= 0.0 {
                    return false;
                }
                let dx = (x - center.x) / radius_x;
                let dy = (y - center.y) / radius_y;
                dx * dx + dy * dy <= 1.0
            }
            Shape::Disk { center, radius } => {
                let dx = x - center.x;
                let dy = y - center.y;
                dx * dx + dy * dy <= radius * radius
            }
            Shape::Polygon(vertices) => polygon_contains(vertices, x, y),
        }
    }

    /// Bounding box as `(min_x, min_y, max_x, max_y)`.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        match self {
            Shape::Rectangle {
                x,
                y,
                width,
                height,
            } => (*x, *y, x + width, y + height),
            Shape::Ellipse {
                center,
                radius_x,
                radius_y,
            } => (
                center.x - radius_x,
                center.y - radius_y,
                center.x + radius_x,
                center.y + radius_y,
            ),
            Shape::Disk { center, radius } => (
                center.x - radius,
                center.y - radius,
                center.x + radius,
                center.y + radius,
            ),
            Shape::Polygon(vertices) => vertices.iter().fold(
                (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
                |(x0, y0, x1, y1), p| (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y)),
            ),
        }
    }

    pub fn centroid(&self) -> Point2<f64> {
        match self {
            Shape::Rectangle {
                x,
                y,
                width,
                height,
            } => Point2::new(x + width / 2.0, y + height / 2.0),
            Shape::Ellipse { center, .. } | Shape::Disk { center, .. } => *center,
            Shape::Polygon(vertices) => polygon_centroid(vertices),
        }
    }

    /// Pixel coordinates `(col, row)` of a `width × height` plane covered by the shape.
    pub fn pixels(&self, width: usize, height: usize) -> Vec<(usize, usize)> {
        let (x0, y0, x1, y1) = self.bounds();
        if width == 0 || height == 0 || !(x0 <= x1 && y0 <= y1) {
            return Vec::new();
        }
        let col_start = x0.ceil().max(0.0) as usize;
        let row_start = y0.ceil().max(0.0) as usize;
        if x1 < 0.0 || y1 < 0.0 || col_start >= width || row_start >= height {
            return Vec::new();
        }
        let col_end = (x1.floor() as usize).min(width - 1);
        let row_end = (y1.floor() as usize).min(height - 1);

        let mut out = Vec::new();
        for row in row_start..=row_end {
            for col in col_start..=col_end {
                if self.contains(col as f64, row as f64) {
                    out.push((col, row));
                }
            }
        }
        out
    }

    /// Pixel statistics of `plane` (indexed `[row, col]`) inside the shape.
    pub fn stats(&self, plane: &ArrayView2<'_, f32>) -> PixelStats {
        let (height, width) = plane.dim();
        let mut stats = PixelStats::default();
        for (col, row) in self.pixels(width, height) {
            stats.push(plane[[row, col]] as f64);
        }
        stats
    }
}

/// Unweighted accumulator over sampled pixel values.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PixelStats {
    pub count: usize,
    pub sum: f64,
    pub sum_sq: f64,
}

impl PixelStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.sum_sq += value * value;
    }

    /// Mean value; 0.0 when no pixel was sampled.
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    /// Sample standard deviation; 0.0 with fewer than two pixels.
    pub fn std_dev(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        let n = self.count as f64;
        let var = (self.sum_sq - self.sum * self.sum / n) / (n - 1.0);
        var.max(0.0).sqrt()
    }
}

fn polygon_contains(vertices: &[Point2<f64>], x: f64, y: f64) -> bool {
    if vertices.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let (a, b) = (vertices[i], vertices[j]);
        if (a.y > y) != (b.y > y) {
            let x_cross = a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y);
            if x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

fn polygon_centroid(vertices: &[Point2<f64>]) -> Point2<f64> {
    if vertices.is_empty() {
        return Point2::origin();
    }
    let n = vertices.len();
    let mut area2 = 0.0;
    let (mut cx, mut cy) = (0.0, 0.0);
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        let cross = a.x * b.y - b.x * a.y;
        area2 += cross;
        cx += (a.x + b.x) * cross;
        cy += (a.y + b.y) * cross;
    }
    if area2.abs() < f64::EPSILON {
        // Degenerate outline: fall back to the vertex average.
        let sum = vertices
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        return Point2::new(sum.0 / n as f64, sum.1 / n as f64);
    }
    Point2::new(cx / (3.0 * area2), cy / (3.0 * area2))
}
