//! Polar geometry of the sensory radar chart.
//!
//! A [`RadarPolygon`] lives in angle/radius space: one vertex per category,
//! evenly spaced around the circle, plus a closing vertex that repeats the
//! first one.  [`RadarPolygon::project`] maps the vertices onto a page area
//! for drawing.

use std::f64::consts::TAU;

use crate::config::ChartConfig;
use crate::model::LotAggregate;

/// A vertex in polar coordinates; `angle` is in radians.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PolarVertex {
    /// Angle in radians, measured counter-clockwise from the positive x axis.
    pub angle: f64,
    /// Distance from the center in score units.
    pub radius: f64,
}

/// A point in page space, in millimetres, with y growing downwards.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    /// Horizontal offset from the left edge of the drawing area.
    pub x: f64,
    /// Vertical offset from the top edge of the drawing area.
    pub y: f64,
}

impl Point {
    /// Creates a point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns the point at `angle` and `distance` from `self`.
    pub fn polar_offset(self, angle: f64, distance: f64) -> Self {
        Self::new(
            self.x + distance * angle.cos(),
            self.y - distance * angle.sin(),
        )
    }
}

/// Score range mapped onto the chart radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadialScale {
    min: f64,
    max: f64,
}

impl RadialScale {
    /// Creates a scale mapping `min` to the center and `max` to the outer ring.
    ///
    /// The bounds are swapped when given in reverse.
    pub fn new(min: f64, max: f64) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Returns the score at the center.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Returns the score at the outer ring.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Maps `score` into `[0, 1]`, clamping values outside the range.
    pub fn normalize(&self, score: f64) -> f64 {
        let span = self.max - self.min;
        if span <= f64::EPSILON {
            return 1.0;
        }
        ((score - self.min) / span).clamp(0.0, 1.0)
    }

    /// Returns the scores of `rings` evenly spaced grid rings, outermost last.
    pub fn ring_values(&self, rings: usize) -> Vec<f64> {
        let step = (self.max - self.min) / rings.max(1) as f64;
        (1..=rings).map(|ring| self.min + step * ring as f64).collect()
    }
}

impl From<&ChartConfig> for RadialScale {
    fn from(config: &ChartConfig) -> Self {
        Self::new(config.scale_min, config.scale_max)
    }
}

/// Angle of axis `index` out of `count` evenly spaced axes.
pub fn axis_angle(index: usize, count: usize) -> f64 {
    TAU * index as f64 / count as f64
}

/// Closed radar polygon of one lot.
#[derive(Clone, Debug, PartialEq)]
pub struct RadarPolygon {
    lot_id: String,
    labels: Vec<String>,
    vertices: Vec<PolarVertex>,
}

impl RadarPolygon {
    /// Builds the polygon of `aggregate`.
    ///
    /// Vertex `i` sits at angle `2π·i/N` with the mean of category `i` as
    /// radius; vertex `N` repeats vertex `0` so the outline is closed.
    pub fn build(aggregate: &LotAggregate) -> Self {
        let count = aggregate.len();
        let mut vertices: Vec<PolarVertex> = aggregate
            .means()
            .iter()
            .enumerate()
            .map(|(index, (_, mean))| PolarVertex {
                angle: axis_angle(index, count),
                radius: *mean,
            })
            .collect();
        if let Some(first) = vertices.first().copied() {
            vertices.push(first);
        }

        Self {
            lot_id: aggregate.lot_id().to_owned(),
            labels: aggregate.means().iter().map(|(name, _)| name.clone()).collect(),
            vertices,
        }
    }

    /// Returns the lot identifier.
    pub fn lot_id(&self) -> &str {
        &self.lot_id
    }

    /// Returns the category labels, one per axis.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Returns the number of axes.
    pub fn axis_count(&self) -> usize {
        self.labels.len()
    }

    /// Returns all vertices including the closing one.
    pub fn vertices(&self) -> &[PolarVertex] {
        &self.vertices
    }

    /// Maps the vertices onto a circle of `max_radius` millimetres around `center`.
    pub fn project(&self, center: Point, max_radius: f64, scale: RadialScale) -> Vec<Point> {
        self.vertices
            .iter()
            .map(|vertex| center.polar_offset(vertex.angle, max_radius * scale.normalize(vertex.radius)))
            .collect()
    }
}

/// Closed outline of a regular polygon with `count` corners, used for grid rings.
pub fn ring_outline(center: Point, radius: f64, count: usize) -> Vec<Point> {
    (0..=count)
        .map(|index| center.polar_offset(axis_angle(index % count.max(1), count.max(1)), radius))
        .collect()
}

/// Copies of `outline` shrunk toward `center`, `step` millimetres apart.
///
/// Stroking every copy covers the inside of a star-shaped outline, which
/// stands in for a fill operation.  The last copy is `outline` itself.
pub fn fill_outlines(center: Point, outline: &[Point], step: f64) -> Vec<Vec<Point>> {
    let reach = outline
        .iter()
        .map(|point| (point.x - center.x).hypot(point.y - center.y))
        .fold(0.0_f64, f64::max);
    if reach <= 0.0 || step <= 0.0 {
        return Vec::new();
    }

    let passes = (reach / step).ceil() as usize;
    (1..=passes)
        .map(|pass| {
            let factor = pass as f64 / passes as f64;
            outline
                .iter()
                .map(|point| {
                    Point::new(
                        center.x + (point.x - center.x) * factor,
                        center.y + (point.y - center.y) * factor,
                    )
                })
                .collect()
        })
        .collect()
}
