//! Garment grading between avatars.
//!
//! Grading moves a garment draped on a source avatar onto a target avatar of
//! a different size or shape. Each garment vertex is attached to its nearest
//! source-avatar vertex; the graded position is the *same* avatar vertex on
//! the target plus the original garment-to-body offset. The local offset
//! geometry is preserved exactly, no global scale factor is involved.
//!
//! Both avatars must be the same body mesh (same vertex layout) at different
//! sizes. Only equal vertex counts are checked.
//!
//! # Example
//!
//! ```no_run
//! use drapeflat::algo::grade::{grade, GradeOptions};
//! use drapeflat::io;
//!
//! let source = io::load("avatar_m.obj").unwrap();
//! let target = io::load("avatar_xl.obj").unwrap();
//! let garment = io::load("shirt_on_m.obj").unwrap();
//!
//! let graded = grade(&source, &target, &garment, &GradeOptions::default()).unwrap();
//! io::save(&graded, "shirt_on_xl.obj").unwrap();
//! ```

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use crate::error::{MeshError, Result};
use crate::mesh::Mesh;
use crate::spatial::SpatialIndex;

use super::Progress;

/// Garment vertices are graded in chunks of this size between progress reports.
const CHUNK_SIZE: usize = 4096;

/// Options for garment grading.
#[derive(Debug, Clone)]
pub struct GradeOptions {
    /// Whether to use parallel execution (default: true).
    pub parallel: bool,

    /// Translate both avatars so their lowest point sits at `y = 0` before
    /// grading. The garment moves with the source avatar. The graded garment
    /// is returned in the grounded target frame. Default: false.
    pub ground: bool,
}

impl Default for GradeOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            ground: false,
        }
    }
}

impl GradeOptions {
    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set whether both avatars are moved to the ground plane first.
    pub fn with_ground(mut self, ground: bool) -> Self {
        self.ground = ground;
        self
    }
}

/// How one garment vertex is attached to the source avatar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correspondence {
    /// Index of the nearest source-avatar vertex.
    pub avatar_vertex: usize,
    /// Distance from the garment vertex to that avatar vertex.
    pub distance: f64,
    /// Garment vertex minus avatar vertex.
    pub displacement: Vector3<f64>,
}

/// Attach every garment vertex to its nearest source-avatar vertex.
///
/// # Errors
///
/// Returns [`MeshError::EmptyInput`] if the avatar has no vertices.
pub fn find_correspondences(
    avatar: &Mesh,
    garment: &Mesh,
    parallel: bool,
) -> Result<Vec<Correspondence>> {
    let index = SpatialIndex::build(avatar.vertices())?;
    let correspondences = correspond(&index, avatar.vertices(), garment.vertices(), parallel);
    log::debug!(
        "matched {} garment vertices against {} avatar vertices",
        correspondences.len(),
        avatar.num_vertices()
    );
    Ok(correspondences)
}

fn correspond(
    index: &SpatialIndex,
    avatar: &[Point3<f64>],
    garment: &[Point3<f64>],
    parallel: bool,
) -> Vec<Correspondence> {
    let attach = |g: &Point3<f64>| {
        let hit = index.nearest(g);
        Correspondence {
            avatar_vertex: hit.index,
            distance: hit.distance,
            displacement: g - avatar[hit.index],
        }
    };

    if parallel {
        garment.par_iter().map(attach).collect()
    } else {
        garment.iter().map(attach).collect()
    }
}

/// Grade a garment from `source` onto `target`.
///
/// The output reuses the garment's faces, normals and texture coordinates;
/// only vertex positions change.
///
/// # Errors
///
/// - [`MeshError::TopologyMismatch`] if the avatars have different vertex counts
/// - [`MeshError::EmptyInput`] if the source avatar has no vertices
pub fn grade(source: &Mesh, target: &Mesh, garment: &Mesh, options: &GradeOptions) -> Result<Mesh> {
    grade_with_progress(source, target, garment, options, &Progress::none())
}

/// Grade a garment with progress reporting.
///
/// See [`grade`] for details.
pub fn grade_with_progress(
    source: &Mesh,
    target: &Mesh,
    garment: &Mesh,
    options: &GradeOptions,
    progress: &Progress,
) -> Result<Mesh> {
    if source.num_vertices() != target.num_vertices() {
        return Err(MeshError::TopologyMismatch {
            source_vertices: source.num_vertices(),
            target_vertices: target.num_vertices(),
        });
    }

    let grounded;
    let (source, target, garment) = if options.ground {
        grounded = ground(source, target, garment);
        (&grounded.0, &grounded.1, &grounded.2)
    } else {
        (source, target, garment)
    };

    let index = SpatialIndex::build(source.vertices())?;
    let target_vertices = target.vertices();
    let total = garment.num_vertices();

    let mut graded: Vec<Point3<f64>> = Vec::with_capacity(total);
    for chunk in garment.vertices().chunks(CHUNK_SIZE) {
        let matches = correspond(&index, source.vertices(), chunk, options.parallel);
        graded.extend(
            matches
                .iter()
                .map(|c| target_vertices[c.avatar_vertex] + c.displacement),
        );
        progress.report(graded.len(), total, "Grading");
    }

    log::debug!(
        "graded {} garment vertices onto a {}-vertex avatar",
        total,
        target.num_vertices()
    );

    garment.with_vertices(graded)
}

/// Move both avatars to the ground plane, carrying the garment with the source.
fn ground(source: &Mesh, target: &Mesh, garment: &Mesh) -> (Mesh, Mesh, Mesh) {
    let lift = |mesh: &Mesh| Vector3::new(0.0, -mesh.min_y().unwrap_or(0.0), 0.0);
    let source_lift = lift(source);
    let target_lift = lift(target);
    log::debug!(
        "grounding avatars: source lift {:.6}, target lift {:.6}",
        source_lift.y,
        target_lift.y
    );
    (
        source.translated(source_lift),
        target.translated(target_lift),
        garment.translated(source_lift),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Face;
    use approx::assert_relative_eq;
    use nalgebra::Point2;

    /// A small closed "body": an octahedron around `center` with radius `r`.
    fn avatar(center: Point3<f64>, r: f64) -> Mesh {
        let dirs = [
            Vector3::x(),
            -Vector3::x(),
            Vector3::y(),
            -Vector3::y(),
            Vector3::z(),
            -Vector3::z(),
        ];
        let vertices = dirs.iter().map(|d| center + d * r).collect();
        let faces = [
            [0, 2, 4],
            [2, 1, 4],
            [1, 3, 4],
            [3, 0, 4],
            [2, 0, 5],
            [1, 2, 5],
            [3, 1, 5],
            [0, 3, 5],
        ];
        Mesh::from_triangles(vertices, &faces).unwrap()
    }

    fn garment_around(avatar: &Mesh, offset: f64) -> Mesh {
        // One garment vertex floating just outside each avatar vertex.
        let vertices = avatar
            .vertices()
            .iter()
            .map(|p| p + p.coords.normalize() * offset)
            .collect();
        Mesh::from_attributes(
            vertices,
            vec![Face::triangle(1, 3, 5), Face::triangle(3, 2, 5)],
            vec![Vector3::z(); 6],
            vec![Point2::new(0.25, 0.75); 6],
        )
        .unwrap()
    }

    #[test]
    fn test_grade_onto_same_avatar_is_identity() {
        let body = avatar(Point3::origin(), 1.0);
        let garment = Mesh::from_triangles(body.vertices().to_vec(), &[[0, 2, 4]]).unwrap();

        let graded = grade(&body, &body, &garment, &GradeOptions::default()).unwrap();
        assert_eq!(graded.vertices(), garment.vertices());
    }

    #[test]
    fn test_grade_preserves_offsets() {
        let small = avatar(Point3::origin(), 1.0);
        let large = avatar(Point3::origin(), 2.0);
        let garment = garment_around(&small, 0.1);

        let graded = grade(&small, &large, &garment, &GradeOptions::default()).unwrap();

        for (i, p) in graded.vertices().iter().enumerate() {
            // Offset from the matching body vertex is carried over verbatim.
            let offset = p - large.vertices()[i];
            let original = garment.vertices()[i] - small.vertices()[i];
            assert_relative_eq!(offset, original, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_grade_keeps_faces_normals_texcoords() {
        let small = avatar(Point3::origin(), 1.0);
        let large = avatar(Point3::new(0.0, 0.5, 0.0), 1.5);
        let garment = garment_around(&small, 0.05);

        let graded = grade(&small, &large, &garment, &GradeOptions::default()).unwrap();
        assert_eq!(graded.faces(), garment.faces());
        assert_eq!(graded.normals(), garment.normals());
        assert_eq!(graded.texcoords(), garment.texcoords());
        assert_eq!(graded.index_base(), garment.index_base());
    }

    #[test]
    fn test_avatar_with_symmetry_plane() {
        // 600 body vertices on x = 0.
        let sheet = |scale: f64| -> Mesh {
            let vertices = (0..20)
                .flat_map(|j| (0..30).map(move |i| Point3::new(0.0, j as f64 * scale, i as f64 * scale)))
                .collect();
            Mesh::from_triangles(vertices, &[]).unwrap()
        };
        let source = sheet(1.0);
        let target = sheet(1.5);

        let offset = Vector3::new(0.05, 0.0, 0.0);
        let picked: Vec<usize> = (0..source.num_vertices()).step_by(7).collect();
        let garment = Mesh::from_triangles(
            picked.iter().map(|&i| source.vertices()[i] + offset).collect(),
            &[],
        )
        .unwrap();

        let graded = grade(&source, &target, &garment, &GradeOptions::default()).unwrap();
        for (p, &i) in graded.vertices().iter().zip(&picked) {
            assert_relative_eq!(*p, target.vertices()[i] + offset, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let small = avatar(Point3::origin(), 1.0);
        let large = avatar(Point3::origin(), 1.3);
        let garment = garment_around(&small, 0.2);

        let par = grade(&small, &large, &garment, &GradeOptions::default()).unwrap();
        let seq = grade(&small, &large, &garment, &GradeOptions::default().sequential()).unwrap();
        assert_eq!(par.vertices(), seq.vertices());
    }

    #[test]
    fn test_vertex_order_independent() {
        let small = avatar(Point3::origin(), 1.0);
        let large = avatar(Point3::origin(), 1.7);
        let garment = garment_around(&small, 0.1);

        let reversed: Vec<_> = garment.vertices().iter().rev().copied().collect();
        let shuffled = Mesh::from_triangles(reversed, &[]).unwrap();

        let a = grade(&small, &large, &garment, &GradeOptions::default()).unwrap();
        let b = grade(&small, &large, &shuffled, &GradeOptions::default()).unwrap();

        let n = a.num_vertices();
        for i in 0..n {
            assert_eq!(a.vertices()[i], b.vertices()[n - 1 - i]);
        }
    }

    #[test]
    fn test_topology_mismatch() {
        let body = avatar(Point3::origin(), 1.0);
        let other = Mesh::from_triangles(body.vertices()[..5].to_vec(), &[]).unwrap();
        let garment = garment_around(&body, 0.1);

        let result = grade(&body, &other, &garment, &GradeOptions::default());
        assert!(matches!(
            result,
            Err(MeshError::TopologyMismatch {
                source_vertices: 6,
                target_vertices: 5
            })
        ));
    }

    #[test]
    fn test_empty_avatar() {
        let empty = Mesh::default();
        let garment = garment_around(&avatar(Point3::origin(), 1.0), 0.1);
        let result = grade(&empty, &empty, &garment, &GradeOptions::default());
        assert!(matches!(result, Err(MeshError::EmptyInput)));
    }

    #[test]
    fn test_ground_aligns_feet() {
        let small = avatar(Point3::new(0.0, 3.0, 0.0), 1.0);
        let large = avatar(Point3::new(0.0, -4.0, 0.0), 2.0);
        let garment = garment_around(&avatar(Point3::origin(), 1.0), 0.1)
            .translated(Vector3::new(0.0, 3.0, 0.0));

        let options = GradeOptions::default().with_ground(true);
        let graded = grade(&small, &large, &garment, &options).unwrap();

        // Garment vertex 3 hangs 0.1 below the source's lowest vertex; after
        // grounding it sits 0.1 below the grounded target's lowest vertex.
        assert_relative_eq!(graded.vertices()[3].y, -0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_correspondences() {
        let body = avatar(Point3::origin(), 1.0);
        let garment = garment_around(&body, 0.5);
        let matches = find_correspondences(&body, &garment, false).unwrap();

        assert_eq!(matches.len(), 6);
        for (i, c) in matches.iter().enumerate() {
            assert_eq!(c.avatar_vertex, i);
            assert_relative_eq!(c.distance, 0.5, epsilon = 1e-12);
            assert_relative_eq!(c.displacement.norm(), 0.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_progress_reaches_total() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let body = avatar(Point3::origin(), 1.0);
        let garment = garment_around(&body, 0.1);
        let last = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&last);
        let progress = Progress::new(move |current, _, _| seen.store(current, Ordering::Relaxed));

        grade_with_progress(&body, &body, &garment, &GradeOptions::default(), &progress).unwrap();
        assert_eq!(last.load(Ordering::Relaxed), 6);
    }
}
