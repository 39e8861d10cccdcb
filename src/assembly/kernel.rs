use nalgebra::{DMatrix, DVector};

/// Per-facet data handed to a contact kernel.
#[derive(Debug, Clone, Copy)]
pub struct KernelInput<'a, T> {
    /// Packed coefficients of the facet (one stride of the global coefficient buffer).
    pub coefficients: &'a [T],
    pub constants: &'a [T],
    /// Coordinates of the nodes of the facet's cell, three entries per node. Unused trailing
    /// components are zero.
    pub coordinates: &'a [T],
    pub local_facet: usize,
    /// Facet permutation information. Always zero: permutations are not accounted for.
    pub permutation: u8,
    pub num_linked_cells: usize,
}

/// Computes the local matrix blocks of a single contact facet.
///
/// The kernel receives `3 * num_linked_cells + 1` zeroed square blocks of dimension
/// `block_size * dofs_per_cell`. Block `0` couples the facet's cell with itself. For linked cell
/// `j`, blocks `3j + 1`, `3j + 2` and `3j + 3` hold the (cell, linked), (linked, cell) and
/// (linked, linked) couplings. Row and column `block_size * n + k` of a block correspond to
/// component `k` of local node `n`.
pub trait MatrixKernel<T> {
    fn compute_blocks(&self, blocks: &mut [DMatrix<T>], input: &KernelInput<T>) -> eyre::Result<()>;
}

/// Computes the local vector blocks of a single contact facet.
///
/// The kernel receives `num_linked_cells + 1` zeroed blocks of length
/// `block_size * dofs_per_cell`: block `0` belongs to the facet's cell and block `j + 1` to
/// linked cell `j`.
pub trait VectorKernel<T> {
    fn compute_blocks(&self, blocks: &mut [DVector<T>], input: &KernelInput<T>) -> eyre::Result<()>;
}

impl<T, F> MatrixKernel<T> for F
where
    F: Fn(&mut [DMatrix<T>], &KernelInput<T>) -> eyre::Result<()>,
{
    fn compute_blocks(&self, blocks: &mut [DMatrix<T>], input: &KernelInput<T>) -> eyre::Result<()> {
        self(blocks, input)
    }
}

impl<T, F> VectorKernel<T> for F
where
    F: Fn(&mut [DVector<T>], &KernelInput<T>) -> eyre::Result<()>,
{
    fn compute_blocks(&self, blocks: &mut [DVector<T>], input: &KernelInput<T>) -> eyre::Result<()> {
        self(blocks, input)
    }
}
