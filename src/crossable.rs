use geo::{Coordinate, GeoFloat, Line};

/// Interface for types that can be processed to detect crossings.
///
/// Implemented for [`Line`], for two [`Coordinate`]s and for a pair of
/// `(x, y)` tuples. References to a `Crossable` are also `Crossable`,
/// so a sweep can borrow its input:
///
/// ```rust
/// use geo::Line;
/// use line_crossings::find_intersections;
///
/// let lines = vec![
///     Line::from([(0., 0.), (2., 2.)]),
///     Line::from([(0., 2.), (2., 0.)]),
/// ];
/// let points = find_intersections(&lines).unwrap();
/// assert_eq!(points.len(), 1);
/// ```
pub trait Crossable {
    type Scalar: GeoFloat;

    /// The segment to sweep. End points may be given in any order.
    fn line(&self) -> Line<Self::Scalar>;
}

impl<T: GeoFloat> Crossable for Line<T> {
    type Scalar = T;

    #[inline]
    fn line(&self) -> Line<T> {
        *self
    }
}

impl<T: GeoFloat> Crossable for [Coordinate<T>; 2] {
    type Scalar = T;

    #[inline]
    fn line(&self) -> Line<T> {
        Line::new(self[0], self[1])
    }
}

impl<T: GeoFloat> Crossable for ((T, T), (T, T)) {
    type Scalar = T;

    #[inline]
    fn line(&self) -> Line<T> {
        Line::new(self.0, self.1)
    }
}

impl<'a, C: Crossable> Crossable for &'a C {
    type Scalar = C::Scalar;

    #[inline]
    fn line(&self) -> Line<C::Scalar> {
        C::line(*self)
    }
}
