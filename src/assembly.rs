//! Local element tensors, contact kernels and insertion of local blocks into global operators.
mod insert;
mod kernel;

pub use insert::*;
pub use kernel::*;

/// Expands block dof indices into scalar indices.
///
/// Block dof `d` becomes the scalar indices `block_size * d + k` for `k` in `0 .. block_size`,
/// which matches the layout of the rows and columns of local element tensors.
pub fn expand_block_indices(block_dofs: &[usize], block_size: usize, output: &mut Vec<usize>) {
    output.clear();
    output.extend(
        block_dofs
            .iter()
            .flat_map(|&dof| (0..block_size).map(move |k| block_size * dof + k)),
    );
}
