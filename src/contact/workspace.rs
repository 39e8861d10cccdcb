use crate::Real;
use nalgebra::{DMatrix, DVector};

/// Scratch buffers for matrix assembly, sized once for the largest linked cell count.
#[derive(Debug)]
pub(crate) struct MatrixWorkspace<T: Real> {
    pub coordinates: Vec<T>,
    pub blocks: Vec<DMatrix<T>>,
    pub cell_indices: Vec<usize>,
    pub linked_indices: Vec<usize>,
}

impl<T: Real> MatrixWorkspace<T> {
    pub fn new(num_coordinates: usize, max_links: usize, block_dim: usize) -> Self {
        Self {
            coordinates: vec![T::zero(); num_coordinates],
            blocks: vec![DMatrix::zeros(block_dim, block_dim); 3 * max_links + 1],
            cell_indices: Vec::with_capacity(block_dim),
            linked_indices: Vec::with_capacity(block_dim),
        }
    }
}

/// Scratch buffers for vector assembly, sized once for the largest linked cell count.
#[derive(Debug)]
pub(crate) struct VectorWorkspace<T: Real> {
    pub coordinates: Vec<T>,
    pub blocks: Vec<DVector<T>>,
}

impl<T: Real> VectorWorkspace<T> {
    pub fn new(num_coordinates: usize, max_links: usize, block_dim: usize) -> Self {
        Self {
            coordinates: vec![T::zero(); num_coordinates],
            blocks: vec![DVector::zeros(block_dim); max_links + 1],
        }
    }
}
