//! Circle-circle intersection in the plane.

use nalgebra::Point2;

/// Outcome of intersecting two circles.
///
/// `None` is a normal geometric outcome (disjoint, nested, or coincident
/// circles), not an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intersection {
    /// The circles do not meet in a finite set of points.
    None,
    /// The circles touch at a single point.
    One(Point2<f64>),
    /// The circles cross at two points.
    Two(Point2<f64>, Point2<f64>),
}

impl Intersection {
    /// Number of solutions.
    pub fn len(&self) -> usize {
        match self {
            Intersection::None => 0,
            Intersection::One(_) => 1,
            Intersection::Two(..) => 2,
        }
    }

    /// True if there is no solution.
    pub fn is_empty(&self) -> bool {
        matches!(self, Intersection::None)
    }

    /// The solution farthest from `reference`.
    ///
    /// When both solutions are equally far, the second one is returned.
    pub fn farthest_from(&self, reference: &Point2<f64>) -> Option<Point2<f64>> {
        match *self {
            Intersection::None => None,
            Intersection::One(p) => Some(p),
            Intersection::Two(p, q) => {
                if (p - reference).norm_squared() > (q - reference).norm_squared() {
                    Some(p)
                } else {
                    Some(q)
                }
            }
        }
    }
}

/// Intersect the circle of radius `r0` around `c0` with the circle of radius
/// `r1` around `c1`.
///
/// With `d` the distance between the centres, the chord midpoint lies at
/// `a = (r0² - r1² + d²) / 2d` along the centre line and the solutions are
/// offset from it by `h = sqrt(r0² - a²)` perpendicular to that line. The
/// first solution is `(x2 + h·dy/d, y2 - h·dx/d)`.
///
/// # Example
///
/// ```
/// use drapeflat::algo::unfold::{circle_intersection, Intersection};
/// use nalgebra::Point2;
///
/// let far = circle_intersection(&Point2::new(0.0, 0.0), 1.0, &Point2::new(20.0, 0.0), 1.0);
/// assert_eq!(far, Intersection::None);
/// ```
pub fn circle_intersection(c0: &Point2<f64>, r0: f64, c1: &Point2<f64>, r1: f64) -> Intersection {
    let delta = c1 - c0;
    let d = delta.norm();

    if d > r0 + r1 || d < (r0 - r1).abs() || d == 0.0 {
        return Intersection::None;
    }

    let a = (r0 * r0 - r1 * r1 + d * d) / (2.0 * d);
    let mid = c0 + delta * (a / d);

    let h2 = r0 * r0 - a * a;
    if h2 <= 0.0 {
        return Intersection::One(mid);
    }

    let h = h2.sqrt();
    let offset = nalgebra::Vector2::new(h * delta.y / d, -h * delta.x / d);
    Intersection::Two(mid + offset, mid - offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_two_solutions() {
        let hit = circle_intersection(&Point2::new(0.0, 0.0), 5.0, &Point2::new(5.0, 0.0), 5.0);
        let Intersection::Two(p, q) = hit else {
            panic!("expected two solutions, got {:?}", hit);
        };
        let h = 75.0_f64.sqrt() / 2.0;
        assert_relative_eq!(p, Point2::new(2.5, -h), epsilon = 1e-12);
        assert_relative_eq!(q, Point2::new(2.5, h), epsilon = 1e-12);
        assert_relative_eq!(h, 4.330127, epsilon = 1e-6);
    }

    #[test]
    fn test_touching_circles() {
        // Centres exactly r0 + r1 apart.
        let hit = circle_intersection(&Point2::new(0.0, 0.0), 5.0, &Point2::new(10.0, 0.0), 5.0);
        assert_eq!(hit, Intersection::One(Point2::new(5.0, 0.0)));
        assert_eq!(hit.len(), 1);
    }

    #[test]
    fn test_no_solution_cases() {
        let origin = Point2::new(0.0, 0.0);
        // Disjoint.
        assert!(circle_intersection(&origin, 1.0, &Point2::new(20.0, 0.0), 1.0).is_empty());
        // One inside the other.
        assert!(circle_intersection(&origin, 5.0, &Point2::new(1.0, 0.0), 1.0).is_empty());
        // Same circle.
        assert!(circle_intersection(&origin, 2.0, &origin, 2.0).is_empty());
        // Concentric, different radii.
        assert!(circle_intersection(&origin, 2.0, &origin, 3.0).is_empty());
    }

    #[test]
    fn test_solutions_lie_on_both_circles() {
        let c0 = Point2::new(1.5, -2.0);
        let c1 = Point2::new(4.0, 3.0);
        let (r0, r1) = (4.0, 3.5);
        let Intersection::Two(p, q) = circle_intersection(&c0, r0, &c1, r1) else {
            panic!("expected two solutions");
        };
        for s in [p, q] {
            assert_relative_eq!((s - c0).norm(), r0, epsilon = 1e-12);
            assert_relative_eq!((s - c1).norm(), r1, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_farthest_from() {
        let hit = Intersection::Two(Point2::new(0.0, 1.0), Point2::new(0.0, -1.0));
        assert_eq!(hit.farthest_from(&Point2::new(0.0, 0.5)), Some(Point2::new(0.0, -1.0)));
        assert_eq!(hit.farthest_from(&Point2::new(0.0, -0.5)), Some(Point2::new(0.0, 1.0)));
        // Equidistant: the second solution wins.
        assert_eq!(hit.farthest_from(&Point2::new(3.0, 0.0)), Some(Point2::new(0.0, -1.0)));
        assert_eq!(Intersection::None.farthest_from(&Point2::origin()), None);
    }
}
