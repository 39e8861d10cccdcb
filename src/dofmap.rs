//! Cell-to-dof maps.
use crate::connectivity::Connectivity;
use crate::mesh::Mesh;
use eyre::eyre;
use fenris_nested_vec::NestedVec;
use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, DimName, Scalar};

/// Maps each cell of a mesh to its (blocked) degrees of freedom.
///
/// Dof indices returned by `cell_dofs` are *block* indices: block dof `d` owns the scalar
/// entries `block_size * d + k` for `k` in `0 .. block_size` of global vectors and matrices.
pub trait DofMap {
    fn num_cells(&self) -> usize;

    /// The number of block dofs.
    fn num_dofs(&self) -> usize;

    fn block_size(&self) -> usize;

    /// Block dofs of the given cell.
    ///
    /// Panics if the cell index is out of bounds.
    fn cell_dofs(&self, cell_index: usize) -> &[usize];

    /// The size of global vectors (and the row/column count of global matrices).
    fn num_scalar_dofs(&self) -> usize {
        self.block_size() * self.num_dofs()
    }
}

impl<'a, Map: DofMap + ?Sized> DofMap for &'a Map {
    fn num_cells(&self) -> usize {
        (**self).num_cells()
    }

    fn num_dofs(&self) -> usize {
        (**self).num_dofs()
    }

    fn block_size(&self) -> usize {
        (**self).block_size()
    }

    fn cell_dofs(&self, cell_index: usize) -> &[usize] {
        (**self).cell_dofs(cell_index)
    }
}

/// A dof map with an explicitly stored list of dofs per cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellDofMap {
    cell_dofs: NestedVec<usize>,
    num_dofs: usize,
    block_size: usize,
}

impl CellDofMap {
    pub fn try_from_cell_dofs(cell_dofs: NestedVec<usize>, num_dofs: usize, block_size: usize) -> eyre::Result<Self> {
        if block_size == 0 {
            return Err(eyre!("block size must be positive"));
        }
        if let Some(dof) = cell_dofs
            .iter_array_elements()
            .find(|&&dof| dof >= num_dofs)
        {
            return Err(eyre!("cell dof {} is out of bounds ({} dofs)", dof, num_dofs));
        }
        Ok(Self {
            cell_dofs,
            num_dofs,
            block_size,
        })
    }

    /// Creates the dof map of a vertex-based (Lagrange P1/Q1) space on the given mesh:
    /// the block dofs of a cell are its vertex indices.
    pub fn from_mesh_vertices<T, D, C>(mesh: &Mesh<T, D, C>, block_size: usize) -> eyre::Result<Self>
    where
        T: Scalar,
        D: DimName,
        C: Connectivity,
        DefaultAllocator: Allocator<T, D>,
    {
        let mut cell_dofs = NestedVec::new();
        for cell in mesh.connectivity() {
            cell_dofs.push(cell.vertex_indices());
        }
        Self::try_from_cell_dofs(cell_dofs, mesh.vertices().len(), block_size)
    }
}

impl DofMap for CellDofMap {
    fn num_cells(&self) -> usize {
        self.cell_dofs.len()
    }

    fn num_dofs(&self) -> usize {
        self.num_dofs
    }

    fn block_size(&self) -> usize {
        self.block_size
    }

    fn cell_dofs(&self, cell_index: usize) -> &[usize] {
        self.cell_dofs
            .get(cell_index)
            .expect("Cell index must be in bounds")
    }
}
