//! Placing the seed face.

use nalgebra::Point2;

use crate::error::{MeshError, Result};
use crate::mesh::{FaceId, Mesh};

/// Lay a triangle flat in its own plane.
///
/// The first corner lands on the origin and the second on the positive x
/// axis; the third gets a positive y coordinate. This is the rigid motion
/// taking the face normal onto the z axis, with z dropped afterwards, so all
/// three edge lengths are kept.
///
/// # Errors
///
/// Returns [`MeshError::DegenerateFace`] if the triangle has zero area (see
/// [`Mesh::face_normal`]) and
/// [`MeshError::UnsupportedTopology`] if the face is not a triangle.
pub fn project_face(mesh: &Mesh, face: FaceId) -> Result<[Point2<f64>; 3]> {
    let [i, j, k] = mesh.triangle(face)?;
    let p0 = mesh.position(i);
    let e1 = mesh.position(j) - p0;
    let e2 = mesh.position(k) - p0;

    let normal = mesh
        .face_normal(face)?
        .ok_or(MeshError::DegenerateFace { face: face.index() })?;

    let e1_len = e1.norm();
    let x_axis = e1 / e1_len;
    let y_axis = normal.cross(&x_axis);

    Ok([
        Point2::origin(),
        Point2::new(e1_len, 0.0),
        Point2::new(e2.dot(&x_axis), e2.dot(&y_axis)),
    ])
}
