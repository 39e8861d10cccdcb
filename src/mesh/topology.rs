use crate::connectivity::Connectivity;
use eyre::eyre;
use fenris_nested_vec::NestedVec;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A facet of a cell, identified by the cell index and the local index of the facet within
/// the cell.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActiveFacet {
    pub cell: usize,
    pub local_facet: usize,
}

impl ActiveFacet {
    pub fn new(cell: usize, local_facet: usize) -> Self {
        Self { cell, local_facet }
    }
}

impl fmt::Display for ActiveFacet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(cell {}, local facet {})", self.cell, self.local_facet)
    }
}

/// Facet numbering and facet-to-cell connectivity of a mesh.
///
/// Facets are numbered in the order in which they are first encountered when visiting the
/// local faces of each cell in turn. Two local faces are the same facet if they reference the
/// same set of vertices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetTopology {
    /// For each facet, the flattened `(cell, local_facet)` pairs of all adjacent cells.
    facet_cells: NestedVec<usize>,
    /// For each cell, the facet index of each local face.
    cell_facets: NestedVec<usize>,
}

impl FacetTopology {
    pub fn from_connectivity<C: Connectivity>(connectivity: &[C]) -> Self {
        let mut facet_lookup = FxHashMap::default();
        let mut facet_cells: Vec<Vec<usize>> = Vec::new();
        let mut cell_facets = NestedVec::new();
        let mut sorted_vertices = Vec::new();

        for (cell_index, cell) in connectivity.iter().enumerate() {
            let mut appender = cell_facets.begin_array();
            for local_index in 0..cell.num_faces() {
                let face = cell
                    .get_face_connectivity(local_index)
                    .expect("Local face index is in bounds");
                sorted_vertices.clear();
                sorted_vertices.extend_from_slice(face.vertex_indices());
                sorted_vertices.sort_unstable();

                let facet_index = *facet_lookup
                    .entry(sorted_vertices.clone())
                    .or_insert_with(|| {
                        facet_cells.push(Vec::new());
                        facet_cells.len() - 1
                    });
                facet_cells[facet_index].extend_from_slice(&[cell_index, local_index]);
                appender.push_single(facet_index);
            }
        }

        Self {
            facet_cells: NestedVec::from(facet_cells),
            cell_facets,
        }
    }

    pub fn num_facets(&self) -> usize {
        self.facet_cells.len()
    }

    pub fn num_cells(&self) -> usize {
        self.cell_facets.len()
    }

    /// Returns the flattened `(cell, local_facet)` pairs of the cells adjacent to the facet.
    pub fn facet_cells(&self, facet_index: usize) -> Option<&[usize]> {
        self.facet_cells.get(facet_index)
    }

    /// Returns the facet index of each local face of the given cell.
    pub fn cell_facets(&self, cell_index: usize) -> Option<&[usize]> {
        self.cell_facets.get(cell_index)
    }

    /// Returns the facet index of the given local face of a cell.
    pub fn facet_of(&self, facet: ActiveFacet) -> Option<usize> {
        self.cell_facets(facet.cell)?
            .get(facet.local_facet)
            .copied()
    }

    /// A facet is exterior if exactly one cell is attached to it.
    pub fn is_exterior(&self, facet_index: usize) -> bool {
        self.facet_cells(facet_index)
            .map(|pairs| pairs.len() == 2)
            .unwrap_or(false)
    }

    /// Returns the (sorted) indices of all exterior facets.
    pub fn exterior_facets(&self) -> Vec<usize> {
        (0..self.num_facets())
            .filter(|&facet| self.is_exterior(facet))
            .collect()
    }

    /// Converts facet indices into `(cell, local_facet)` pairs.
    ///
    /// Fails if any of the facets is out of bounds or is not an exterior facet of the mesh.
    pub fn exterior_facet_pairs(&self, facets: &[usize]) -> eyre::Result<Vec<ActiveFacet>> {
        facets
            .iter()
            .map(|&facet_index| {
                let pairs = self.facet_cells(facet_index).ok_or_else(|| {
                    eyre!(
                        "facet {} is out of bounds: mesh has {} facets",
                        facet_index,
                        self.num_facets()
                    )
                })?;
                match pairs {
                    &[cell, local_facet] => Ok(ActiveFacet { cell, local_facet }),
                    _ => Err(eyre!(
                        "facet {} is not an exterior facet: it is attached to {} cells",
                        facet_index,
                        pairs.len() / 2
                    )),
                }
            })
            .collect()
    }
}
