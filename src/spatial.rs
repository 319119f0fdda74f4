//! Nearest-vertex queries over a fixed point set.
//!
//! [`SpatialIndex`] wraps a k-d tree built once over a vertex block and
//! answers "which indexed point is closest to P" in logarithmic time.
//! Results are deterministic: when several points are equally close, the
//! one with the lowest index wins.

use std::collections::HashMap;

use kiddo::{ImmutableKdTree, SquaredEuclidean};
use nalgebra::Point3;

use crate::error::{MeshError, Result};

/// Balanced tree over the distinct positions. Any number of them may share
/// a coordinate on one axis.
type Tree = ImmutableKdTree<f64, 3>;

/// Result of a nearest-point query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest {
    /// Index of the closest point in the indexed set.
    pub index: usize,
    /// Euclidean distance to it.
    pub distance: f64,
}

/// A k-d tree over a set of 3D points.
///
/// # Example
///
/// ```
/// use drapeflat::spatial::SpatialIndex;
/// use nalgebra::Point3;
///
/// let points = [Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 0.0, 0.0)];
/// let index = SpatialIndex::build(&points).unwrap();
///
/// let hit = index.nearest(&Point3::new(7.0, 0.0, 0.0));
/// assert_eq!(hit.index, 1);
/// assert_eq!(hit.distance, 3.0);
/// ```
pub struct SpatialIndex {
    tree: Tree,
    /// Lowest input index of each distinct position, by tree item.
    first_index: Vec<usize>,
    len: usize,
}

impl SpatialIndex {
    /// Build an index over `points`. Point `i` is reported as index `i`.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::EmptyInput`] if `points` is empty.
    pub fn build(points: &[Point3<f64>]) -> Result<Self> {
        if points.is_empty() {
            return Err(MeshError::EmptyInput);
        }

        // Each distinct position is stored once, under its lowest index.
        let mut seen: HashMap<[u64; 3], usize> = HashMap::with_capacity(points.len());
        let mut positions = Vec::with_capacity(points.len());
        let mut first_index = Vec::with_capacity(points.len());
        for (i, p) in points.iter().enumerate() {
            seen.entry(position_key(p)).or_insert_with(|| {
                positions.push([p.x, p.y, p.z]);
                first_index.push(i);
                first_index.len() - 1
            });
        }
        if positions.len() < points.len() {
            log::debug!(
                "spatial index: {} of {} points are duplicates",
                points.len() - positions.len(),
                points.len()
            );
        }

        Ok(Self {
            tree: Tree::new_from_slice(&positions),
            first_index,
            len: points.len(),
        })
    }

    /// Number of indexed points.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false: an index cannot be built over an empty set.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Find the indexed point closest to `point`.
    ///
    /// Ties are broken by the lowest index.
    pub fn nearest(&self, point: &Point3<f64>) -> Nearest {
        let query = [point.x, point.y, point.z];

        // The tree orders equidistant neighbours arbitrarily, so widen the
        // query until it returns at least one point strictly farther than
        // the best distance (or everything).
        let distinct = self.first_index.len();
        let mut k = distinct.min(4);
        loop {
            let n = std::num::NonZero::new(k).expect("index is never empty");
            let hits = self.tree.nearest_n::<SquaredEuclidean>(&query, n);
            let best = hits
                .iter()
                .map(|h| h.distance)
                .fold(f64::INFINITY, f64::min);
            let tied = hits.iter().filter(|h| h.distance == best);
            let index = tied
                .clone()
                .map(|h| self.first_index[h.item as usize])
                .min()
                .unwrap_or(0);

            if tied.count() < hits.len() || k == distinct {
                return Nearest {
                    index,
                    distance: best.sqrt(),
                };
            }
            k = (k * 2).min(distinct);
        }
    }
}

/// Hash key of a position. Both zeros map to the same key.
fn position_key(p: &Point3<f64>) -> [u64; 3] {
    [p.x, p.y, p.z].map(|c| if c == 0.0 { 0.0_f64.to_bits() } else { c.to_bits() })
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn brute_force(points: &[Point3<f64>], q: &Point3<f64>) -> Nearest {
        let mut best = Nearest {
            index: 0,
            distance: f64::INFINITY,
        };
        for (i, p) in points.iter().enumerate() {
            let d = (p - q).norm();
            if d < best.distance {
                best = Nearest { index: i, distance: d };
            }
        }
        best
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            SpatialIndex::build(&[]),
            Err(MeshError::EmptyInput)
        ));
    }

    #[test]
    fn test_four_point_avatar() {
        let avatar = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let index = SpatialIndex::build(&avatar).unwrap();
        assert_eq!(index.len(), 4);

        let queries = [
            (Point3::new(-0.2, -0.1, 0.0), 0),
            (Point3::new(0.9, 0.2, 0.1), 1),
            (Point3::new(0.1, 1.3, -0.2), 2),
            (Point3::new(0.2, 0.1, 0.8), 3),
        ];
        for (q, expected) in queries {
            let hit = index.nearest(&q);
            assert_eq!(hit.index, expected, "query {:?}", q);
            assert_relative_eq!(hit.distance, (avatar[expected] - q).norm());
        }
    }

    #[test]
    fn test_ties_pick_lowest_index() {
        // Query sits exactly between points 1 and 2; points 3 and 0 are
        // duplicates of each other.
        let points = [
            Point3::new(5.0, 5.0, 5.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(5.0, 5.0, 5.0),
        ];
        let index = SpatialIndex::build(&points).unwrap();

        assert_eq!(index.nearest(&Point3::origin()).index, 1);
        assert_eq!(index.nearest(&Point3::new(5.0, 5.0, 5.0)).index, 0);
    }

    #[test]
    fn test_many_equidistant_points() {
        // More tied neighbours than the first query width.
        let axes = [
            Point3::new(0.0, 0.0, -1.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, -1.0, 0.0),
        ];
        let points: Vec<Point3<f64>> = std::iter::once(Point3::new(9.0, 9.0, 9.0))
            .chain(axes.iter().cycle().take(12).copied())
            .collect();
        let index = SpatialIndex::build(&points).unwrap();

        let hit = index.nearest(&Point3::origin());
        assert_eq!(hit.index, 1);
        assert_eq!(hit.distance, 1.0);
    }

    #[test]
    fn test_matches_brute_force() {
        // Deterministic pseudo-random cloud.
        let mut state = 0x2545_f491_u64;
        let mut next = || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((state >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
        };
        let points: Vec<Point3<f64>> = (0..500).map(|_| Point3::new(next(), next(), next())).collect();
        let queries: Vec<Point3<f64>> = (0..100).map(|_| Point3::new(next(), next(), next())).collect();

        let index = SpatialIndex::build(&points).unwrap();
        for q in &queries {
            let hit = index.nearest(q);
            let expected = brute_force(&points, q);
            assert_eq!(hit.index, expected.index);
            assert_relative_eq!(hit.distance, expected.distance, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_planar_point_set() {
        // 1600 points on z = 0, far more than fit in one leaf.
        let points: Vec<Point3<f64>> = (0..40)
            .flat_map(|j| (0..40).map(move |i| Point3::new(i as f64, j as f64, 0.0)))
            .collect();
        let index = SpatialIndex::build(&points).unwrap();
        assert_eq!(index.len(), 1600);

        let hit = index.nearest(&Point3::new(12.2, 30.9, 0.5));
        assert_eq!(hit.index, 31 * 40 + 12);
        assert_relative_eq!(hit.distance, (0.04_f64 + 0.01 + 0.25).sqrt(), epsilon = 1e-12);

        for q in [Point3::new(-3.0, 5.0, 1.0), Point3::new(39.4, 0.2, -2.0)] {
            assert_eq!(index.nearest(&q).index, brute_force(&points, &q).index);
        }
    }

    #[test]
    fn test_duplicate_points() {
        let mut points = vec![Point3::new(1.0, 2.0, 3.0); 300];
        points.push(Point3::new(-1.0, 0.0, 0.0));
        points.extend(std::iter::repeat(Point3::new(-0.0, 0.0, 0.0)).take(300));
        points.push(Point3::new(0.0, 0.0, 0.0));
        let index = SpatialIndex::build(&points).unwrap();
        assert_eq!(index.len(), 602);

        assert_eq!(index.nearest(&Point3::new(1.0, 2.0, 2.9)).index, 0);
        assert_eq!(index.nearest(&Point3::new(-0.9, 0.0, 0.0)).index, 300);
        let hit = index.nearest(&Point3::new(0.1, 0.0, 0.0));
        assert_eq!(hit.index, 301);
        assert_relative_eq!(hit.distance, 0.1);
    }
}
