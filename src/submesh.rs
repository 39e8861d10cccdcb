//! Meshes derived from the cells adjacent to a set of facets.
use crate::connectivity::{Connectivity, ConnectivityMut};
use crate::mesh::{ActiveFacet, FacetTopology, Mesh};
use eyre::eyre;
use fenris_nested_vec::NestedVec;
use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, DimName, Scalar};

/// The cells of a parent mesh that are adjacent to a given set of facets.
///
/// Besides the extracted mesh itself, a sub mesh keeps two index maps:
///
/// - the *facet map*, which maps every facet of the sub mesh to the pair
///   `[submesh cell, local facet]` of the first cell attached to it,
/// - the *parent cell map*, which maps every cell of the sub mesh to its index in the parent.
///
/// Parent cells are stored sorted in ascending order, and the local facet numbering of each
/// cell is the same as in the parent mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct SubMesh<T, D, C>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    mesh: Mesh<T, D, C>,
    topology: FacetTopology,
    facet_map: NestedVec<usize>,
    parent_cells: Vec<usize>,
}

impl<T, D, C> SubMesh<T, D, C>
where
    T: Scalar,
    D: DimName,
    C: ConnectivityMut,
    DefaultAllocator: Allocator<T, D>,
{
    pub fn from_active_facets(parent: &Mesh<T, D, C>, facets: &[ActiveFacet]) -> eyre::Result<Self> {
        let mut parent_cells: Vec<_> = facets.iter().map(|facet| facet.cell).collect();
        parent_cells.sort_unstable();
        parent_cells.dedup();

        let facet_exists = |facet: &ActiveFacet| {
            parent
                .connectivity()
                .get(facet.cell)
                .map(|cell| facet.local_facet < cell.num_faces())
                .unwrap_or(false)
        };
        if let Some(facet) = facets.iter().find(|facet| !facet_exists(facet)) {
            return Err(eyre!("active facet {} does not exist in the parent mesh", facet));
        }

        let mesh = parent.keep_cells(&parent_cells)?;
        let topology = mesh.compute_facet_topology();

        let mut facet_map = NestedVec::new();
        for facet_index in 0..topology.num_facets() {
            let pairs = topology
                .facet_cells(facet_index)
                .expect("Facet index is in bounds");
            facet_map.push(&pairs[0..2]);
        }

        Ok(Self {
            mesh,
            topology,
            facet_map,
            parent_cells,
        })
    }
}

impl<T, D, C> SubMesh<T, D, C>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    pub fn mesh(&self) -> &Mesh<T, D, C> {
        &self.mesh
    }

    pub fn topology(&self) -> &FacetTopology {
        &self.topology
    }

    /// Map from sub mesh facet to `[submesh cell, local facet]`.
    pub fn facet_map(&self) -> &NestedVec<usize> {
        &self.facet_map
    }

    /// Map from sub mesh cell to parent mesh cell.
    pub fn parent_cells(&self) -> &[usize] {
        &self.parent_cells
    }

    pub fn num_facets(&self) -> usize {
        self.facet_map.len()
    }

    pub fn num_cells(&self) -> usize {
        self.parent_cells.len()
    }

    /// Returns the parent mesh cell that the given sub mesh facet belongs to.
    pub fn facet_parent_cell(&self, submesh_facet: usize) -> Option<usize> {
        let pair = self.facet_map.get(submesh_facet)?;
        self.parent_cells.get(pair[0]).copied()
    }

    /// Returns the sub mesh cell corresponding to a parent mesh cell, if it is part of the sub mesh.
    pub fn submesh_cell(&self, parent_cell: usize) -> Option<usize> {
        self.parent_cells.binary_search(&parent_cell).ok()
    }

    /// Returns the sub mesh facet corresponding to a local facet of a parent mesh cell.
    ///
    /// This is the index space used by facet link maps.
    pub fn facet_index(&self, parent_cell: usize, local_facet: usize) -> Option<usize> {
        let cell = self.submesh_cell(parent_cell)?;
        self.topology.facet_of(ActiveFacet::new(cell, local_facet))
    }
}
