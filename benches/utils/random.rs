//! Random segment generators for the benches and the unit tests.
#![allow(dead_code)]

use std::f64::consts::PI;

use geo::{rotate::RotatePoint, Coordinate, Line, Rect};

use rand::Rng;
use rand_distr::Standard;

#[inline]
pub fn uniform_point<R: Rng>(rng: &mut R, bounds: Rect<f64>) -> Coordinate<f64> {
    let coords: [f64; 2] = rng.sample(Standard);
    let dims = bounds.max() - bounds.min();
    Coordinate {
        x: bounds.min().x + dims.x * coords[0],
        y: bounds.min().y + dims.y * coords[1],
    }
}

/// Segment between two independent uniform points of `bounds`.
#[inline]
pub fn uniform_line<R: Rng>(rng: &mut R, bounds: Rect<f64>) -> Line<f64> {
    Line::new(uniform_point(rng, bounds), uniform_point(rng, bounds))
}

/// Segment of the given length, starting at a uniform point of
/// `bounds`, in a uniform direction. The far end may leave `bounds`.
#[inline]
pub fn uniform_line_with_length<R: Rng>(
    rng: &mut R,
    bounds: Rect<f64>,
    length: f64,
) -> Line<f64> {
    let start = uniform_point(rng, bounds);
    let line = Line::new(start, start + (length, 0.).into());
    let angle = rng.sample::<f64, _>(Standard) * 2. * PI;
    line.rotate_around_point(angle, start.into())
}

/// Non-degenerate segment with integer end points in `0..=size` on both
/// axes.
///
/// Small grids produce many shared end points, T-junctions, collinear
/// overlaps, and crossings of three or more segments at one point.
pub fn grid_line<R: Rng>(rng: &mut R, size: i32) -> Line<f64> {
    let mut point = || Coordinate {
        x: rng.gen_range(0..=size) as f64,
        y: rng.gen_range(0..=size) as f64,
    };
    loop {
        let (start, end) = (point(), point());
        if start != end {
            return Line::new(start, end);
        }
    }
}
