//! Cell connectivity types and their reference cells.
//!
//! A connectivity stores the global vertex indices of a single cell and knows how to produce
//! the connectivity of each of its (local) faces. The local face numbering established here is
//! the `local_facet` index used throughout the crate.
use crate::Real;
use nalgebra::{convert, OPoint, Point2, Point3, U2, U3};
use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, DimName};
use serde::{Deserialize, Serialize};

pub trait Connectivity: Clone {
    type FaceConnectivity: Connectivity;

    fn num_faces(&self) -> usize;
    fn get_face_connectivity(&self, index: usize) -> Option<Self::FaceConnectivity>;

    fn vertex_indices(&self) -> &[usize];
}

impl Connectivity for () {
    type FaceConnectivity = ();

    fn num_faces(&self) -> usize {
        0
    }

    fn get_face_connectivity(&self, _index: usize) -> Option<Self::FaceConnectivity> {
        None
    }

    fn vertex_indices(&self) -> &[usize] {
        const EMPTY_SLICE: &[usize] = &[];
        EMPTY_SLICE
    }
}

pub trait ConnectivityMut: Connectivity {
    fn vertex_indices_mut(&mut self) -> &mut [usize];
}

/// A cell connectivity with an associated reference cell.
///
/// The local vertices of face `i` are given by `local_face_vertices(i)`, and the face connectivity
/// returned by [`Connectivity::get_face_connectivity`] must list the global vertices in exactly
/// this order.
pub trait ReferenceCellConnectivity<T>: Connectivity
where
    T: Real,
    DefaultAllocator: Allocator<T, Self::ReferenceDim>,
{
    type ReferenceDim: DimName;

    /// The vertices of the reference cell, in the local vertex order of the connectivity.
    fn reference_vertices() -> Vec<OPoint<T, Self::ReferenceDim>>;

    /// Local vertex indices of the given local face, or `None` if the index is out of bounds.
    fn local_face_vertices(local_face: usize) -> Option<&'static [usize]>;
}

fn reference_point2<T: Real>(x: f64, y: f64) -> Point2<T> {
    Point2::new(convert(x), convert(y))
}

fn reference_point3<T: Real>(x: f64, y: f64, z: f64) -> Point3<T> {
    Point3::new(convert(x), convert(y), convert(z))
}

/// Two-node segment embedded in 2D. Serves as the facet of 2D cells.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment2d2Connectivity(pub [usize; 2]);

impl Connectivity for Segment2d2Connectivity {
    type FaceConnectivity = ();

    fn num_faces(&self) -> usize {
        0
    }

    fn get_face_connectivity(&self, _index: usize) -> Option<Self::FaceConnectivity> {
        None
    }

    fn vertex_indices(&self) -> &[usize] {
        &self.0
    }
}

/// Three-node triangle embedded in 3D. Serves as the facet of tetrahedra.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tri3d3Connectivity(pub [usize; 3]);

impl Connectivity for Tri3d3Connectivity {
    type FaceConnectivity = ();

    fn num_faces(&self) -> usize {
        0
    }

    fn get_face_connectivity(&self, _index: usize) -> Option<Self::FaceConnectivity> {
        None
    }

    fn vertex_indices(&self) -> &[usize] {
        &self.0
    }
}

/// Connectivity for a two-dimensional Tri3 element.
///
/// The reference triangle has vertices `(-1, -1)`, `(1, -1)` and `(-1, 1)`. Face `i` connects
/// vertex `i` with vertex `i + 1` (modulo 3).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tri3d2Connectivity(pub [usize; 3]);

static TRI_FACES: [[usize; 2]; 3] = [[0, 1], [1, 2], [2, 0]];

impl Connectivity for Tri3d2Connectivity {
    type FaceConnectivity = Segment2d2Connectivity;

    fn num_faces(&self) -> usize {
        3
    }

    fn get_face_connectivity(&self, index: usize) -> Option<Self::FaceConnectivity> {
        let [a, b] = TRI_FACES.get(index)?;
        Some(Segment2d2Connectivity([self.0[*a], self.0[*b]]))
    }

    fn vertex_indices(&self) -> &[usize] {
        &self.0
    }
}

impl ConnectivityMut for Tri3d2Connectivity {
    fn vertex_indices_mut(&mut self) -> &mut [usize] {
        &mut self.0
    }
}

impl<T: Real> ReferenceCellConnectivity<T> for Tri3d2Connectivity {
    type ReferenceDim = U2;

    fn reference_vertices() -> Vec<Point2<T>> {
        vec![
            reference_point2(-1.0, -1.0),
            reference_point2(1.0, -1.0),
            reference_point2(-1.0, 1.0),
        ]
    }

    fn local_face_vertices(local_face: usize) -> Option<&'static [usize]> {
        TRI_FACES.get(local_face).map(|face| face.as_slice())
    }
}

/// Connectivity for a two-dimensional Quad4 element.
///
/// The reference element is `[-1, 1]^2`, with vertices numbered counter-clockwise starting from
/// the bottom left corner:
///
/// ```text
/// 3_________2
/// |         |
/// |         |
/// |         |
/// 0_________1
/// ```
///
/// Face `i` connects vertex `i` with vertex `i + 1` (modulo 4).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quad4d2Connectivity(pub [usize; 4]);

static QUAD_FACES: [[usize; 2]; 4] = [[0, 1], [1, 2], [2, 3], [3, 0]];

impl Connectivity for Quad4d2Connectivity {
    type FaceConnectivity = Segment2d2Connectivity;

    fn num_faces(&self) -> usize {
        4
    }

    fn get_face_connectivity(&self, index: usize) -> Option<Self::FaceConnectivity> {
        let [a, b] = QUAD_FACES.get(index)?;
        Some(Segment2d2Connectivity([self.0[*a], self.0[*b]]))
    }

    fn vertex_indices(&self) -> &[usize] {
        &self.0
    }
}

impl ConnectivityMut for Quad4d2Connectivity {
    fn vertex_indices_mut(&mut self) -> &mut [usize] {
        &mut self.0
    }
}

impl<T: Real> ReferenceCellConnectivity<T> for Quad4d2Connectivity {
    type ReferenceDim = U2;

    fn reference_vertices() -> Vec<Point2<T>> {
        vec![
            reference_point2(-1.0, -1.0),
            reference_point2(1.0, -1.0),
            reference_point2(1.0, 1.0),
            reference_point2(-1.0, 1.0),
        ]
    }

    fn local_face_vertices(local_face: usize) -> Option<&'static [usize]> {
        QUAD_FACES.get(local_face).map(|face| face.as_slice())
    }
}

/// Connectivity for a Tet4 element.
///
/// The reference tetrahedron has vertices `(-1, -1, -1)`, `(1, -1, -1)`, `(-1, 1, -1)` and
/// `(-1, -1, 1)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tet4Connectivity(pub [usize; 4]);

// Faces are oriented so that their normals point out of the cell
static TET_FACES: [[usize; 3]; 4] = [[0, 2, 1], [0, 1, 3], [1, 2, 3], [0, 3, 2]];

impl Connectivity for Tet4Connectivity {
    type FaceConnectivity = Tri3d3Connectivity;

    fn num_faces(&self) -> usize {
        4
    }

    fn get_face_connectivity(&self, index: usize) -> Option<Self::FaceConnectivity> {
        let [a, b, c] = TET_FACES.get(index)?;
        Some(Tri3d3Connectivity([self.0[*a], self.0[*b], self.0[*c]]))
    }

    fn vertex_indices(&self) -> &[usize] {
        &self.0
    }
}

impl ConnectivityMut for Tet4Connectivity {
    fn vertex_indices_mut(&mut self) -> &mut [usize] {
        &mut self.0
    }
}

impl<T: Real> ReferenceCellConnectivity<T> for Tet4Connectivity {
    type ReferenceDim = U3;

    fn reference_vertices() -> Vec<Point3<T>> {
        vec![
            reference_point3(-1.0, -1.0, -1.0),
            reference_point3(1.0, -1.0, -1.0),
            reference_point3(-1.0, 1.0, -1.0),
            reference_point3(-1.0, -1.0, 1.0),
        ]
    }

    fn local_face_vertices(local_face: usize) -> Option<&'static [usize]> {
        TET_FACES.get(local_face).map(|face| face.as_slice())
    }
}
