use crate::connectivity::{
    Connectivity, ConnectivityMut, Quad4d2Connectivity, Tet4Connectivity, Tri3d2Connectivity,
};
use eyre::eyre;
use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, DimName, OPoint, OVector, RealField, Scalar, U2, U3};
use serde::{Deserialize, Serialize};
use std::iter::once;

pub mod procedural;
mod topology;

pub use topology::*;

/// Index-based data structure for conforming meshes (i.e. no hanging nodes).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>"))]
pub struct Mesh<T: Scalar, D, Connectivity>
where
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    #[serde(bound(
        serialize = "<DefaultAllocator as Allocator<T, D>>::Buffer: Serialize",
        deserialize = "<DefaultAllocator as Allocator<T, D>>::Buffer: Deserialize<'de>"
    ))]
    vertices: Vec<OPoint<T, D>>,
    #[serde(bound(
        serialize = "Connectivity: Serialize",
        deserialize = "Connectivity: Deserialize<'de>"
    ))]
    connectivity: Vec<Connectivity>,
}

pub type Mesh2d<T, Connectivity> = Mesh<T, U2, Connectivity>;
pub type Mesh3d<T, Connectivity> = Mesh<T, U3, Connectivity>;

pub type TriangleMesh2d<T> = Mesh2d<T, Tri3d2Connectivity>;
pub type QuadMesh2d<T> = Mesh2d<T, Quad4d2Connectivity>;
pub type Tet4Mesh<T> = Mesh3d<T, Tet4Connectivity>;

impl<T, D, Connectivity> Mesh<T, D, Connectivity>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    pub fn vertices_mut(&mut self) -> &mut [OPoint<T, D>] {
        &mut self.vertices
    }

    pub fn vertices(&self) -> &[OPoint<T, D>] {
        &self.vertices
    }

    pub fn connectivity(&self) -> &[Connectivity] {
        &self.connectivity
    }

    pub fn num_cells(&self) -> usize {
        self.connectivity.len()
    }

    /// Construct a mesh from vertices and connectivity.
    ///
    /// The connectivity is expected to only reference vertices that are in bounds. Routines
    /// operating on the mesh are permitted to panic if this is not the case. Use
    /// [`Mesh::try_from_vertices_and_connectivity`] for untrusted input.
    pub fn from_vertices_and_connectivity(vertices: Vec<OPoint<T, D>>, connectivity: Vec<Connectivity>) -> Self {
        Self { vertices, connectivity }
    }
}

impl<T, D, C> Mesh<T, D, C>
where
    T: Scalar,
    D: DimName,
    C: Connectivity,
    DefaultAllocator: Allocator<T, D>,
{
    /// Construct a mesh from vertices and connectivity, checking that every vertex index
    /// referenced by the connectivity is in bounds.
    pub fn try_from_vertices_and_connectivity(vertices: Vec<OPoint<T, D>>, connectivity: Vec<C>) -> eyre::Result<Self> {
        for (cell_index, cell) in connectivity.iter().enumerate() {
            if let Some(&v) = cell
                .vertex_indices()
                .iter()
                .find(|&&v| v >= vertices.len())
            {
                return Err(eyre!(
                    "cell {} references vertex {}, but the mesh only has {} vertices",
                    cell_index,
                    v,
                    vertices.len()
                ));
            }
        }
        Ok(Self::from_vertices_and_connectivity(vertices, connectivity))
    }

    /// Computes the facet numbering and facet-cell connectivity of the mesh.
    pub fn compute_facet_topology(&self) -> FacetTopology {
        FacetTopology::from_connectivity(&self.connectivity)
    }

    /// Collects the vertices of the given cell, in local vertex order.
    pub fn cell_vertices(&self, cell_index: usize) -> Option<Vec<OPoint<T, D>>> {
        let cell = self.connectivity.get(cell_index)?;
        cell.vertex_indices()
            .iter()
            .map(|&v| self.vertices.get(v).cloned())
            .collect()
    }
}

impl<T, D, C> Mesh<T, D, C>
where
    T: RealField,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    /// Translates all vertices of the mesh by the given translation vector.
    pub fn translate(&mut self, translation: &OVector<T, D>) {
        self.transform_vertices(|p| *p += translation);
    }

    /// Transform all vertices of the mesh by the given transformation function.
    pub fn transform_vertices<F>(&mut self, mut transformation: F)
    where
        F: FnMut(&mut OPoint<T, D>),
    {
        for p in &mut self.vertices {
            transformation(p);
        }
    }
}

impl<T, D, C> Mesh<T, D, C>
where
    T: Scalar,
    D: DimName,
    C: ConnectivityMut,
    DefaultAllocator: Allocator<T, D>,
{
    /// Returns a new mesh in which only the desired cells are kept, in the given order.
    /// The vertices are removed or relabeled as necessary, preserving their relative order.
    pub fn keep_cells(&self, cell_indices: &[usize]) -> eyre::Result<Self> {
        // Each entry is true if this vertex should be kept, false otherwise
        let mut vertex_keep_table = vec![false; self.vertices.len()];
        for &cell_index in cell_indices {
            let cell = self
                .connectivity
                .get(cell_index)
                .ok_or_else(|| eyre!("cannot keep cell {}: mesh only has {} cells", cell_index, self.num_cells()))?;
            for &vertex_index in cell.vertex_indices() {
                *vertex_keep_table
                    .get_mut(vertex_index)
                    .ok_or_else(|| eyre!("cell {} references vertex {} out of bounds", cell_index, vertex_index))? =
                    true;
            }
        }

        let mut old_to_new_label_map = vec![usize::MAX; self.vertices.len()];
        let mut relabeled_vertices = Vec::new();
        for (old_index, _) in vertex_keep_table.iter().enumerate().filter(|(_, keep)| **keep) {
            old_to_new_label_map[old_index] = relabeled_vertices.len();
            relabeled_vertices.push(self.vertices[old_index].clone());
        }

        let relabeled_cells = cell_indices
            .iter()
            .map(|&i| {
                let mut cell = self.connectivity[i].clone();
                for index in cell.vertex_indices_mut() {
                    *index = old_to_new_label_map[*index];
                }
                cell
            })
            .collect();

        Ok(Mesh::from_vertices_and_connectivity(relabeled_vertices, relabeled_cells))
    }

    /// Appends the vertices and cells of another mesh to this mesh.
    ///
    /// Cells of `other` are numbered after the existing cells, and their vertex indices are
    /// offset accordingly. No vertices are merged, so the two parts are topologically disjoint.
    pub fn append(&mut self, other: &Self) {
        let offset = self.vertices.len();
        self.vertices.extend(other.vertices.iter().cloned());
        self.connectivity
            .extend(other.connectivity.iter().cloned().map(|mut cell| {
                for index in cell.vertex_indices_mut() {
                    *index += offset;
                }
                cell
            }));
    }
}

impl<T> QuadMesh2d<T>
where
    T: RealField,
{
    /// Splits each quadrilateral along its 0-2 diagonal.
    pub fn split_into_triangles(self) -> TriangleMesh2d<T> {
        let triangles = self
            .connectivity()
            .iter()
            .flat_map(|&Quad4d2Connectivity([a, b, c, d])| {
                once(Tri3d2Connectivity([a, b, c])).chain(once(Tri3d2Connectivity([a, c, d])))
            })
            .collect();

        TriangleMesh2d::from_vertices_and_connectivity(self.vertices, triangles)
    }
}
