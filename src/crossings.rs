use geo::Coordinate;

use crate::{Crossable, Sweep, SweepError, SweepOptions};

/// Find all intersection points of a collection of line segments.
///
/// Returns every point where two of the input segments cross or touch,
/// sorted by `x` and then by `y`, each point exactly once no matter how
/// many segments pass through it. Parallel and collinear pairs never
/// contribute a point, and neither does an end point shared by both
/// segments touching there; see [`find_intersections_with`] to report
/// those too.
///
/// Runs in O((n + k) log(n)) time, where `k` is the number of
/// intersections.
///
/// # Errors
///
/// Fails with [`SweepError`] if any segment has zero length or a
/// non-finite coordinate.
///
/// ```rust
/// use line_crossings::find_intersections;
///
/// let input = vec![
///     ((0., 0.), (6., 6.)),
///     ((0., 6.), (6., 0.)),
///     ((0., 1.), (6., 2.)),
/// ];
/// let points = find_intersections(input).unwrap();
/// // All pairs intersect at distinct points.
/// assert_eq!(points.len(), 3);
/// assert_eq!(points[1].x_y(), (3., 3.));
/// ```
pub fn find_intersections<C, I>(input: I) -> Result<Vec<Coordinate<C::Scalar>>, SweepError>
where
    C: Crossable,
    I: IntoIterator<Item = C>,
{
    find_intersections_with(input, SweepOptions::default())
}

/// Same as [`find_intersections`], with explicit [`SweepOptions`].
pub fn find_intersections_with<C, I>(
    input: I,
    options: SweepOptions,
) -> Result<Vec<Coordinate<C::Scalar>>, SweepError>
where
    C: Crossable,
    I: IntoIterator<Item = C>,
{
    Ok(Sweep::with_options(input, options)?.run())
}
