use crate::Real;
use eyre::eyre;
use nalgebra::{DMatrix, DMatrixView, Scalar};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

/// Additive insertion of dense local blocks into a global matrix.
///
/// Entry `(i, j)` of `block` is added to the global entry `(rows[i], cols[j])`. Implementations
/// must tolerate any number of calls touching the same global entries, and must sum the
/// contributions.
pub trait MatrixInserter<T> {
    fn add_block(&mut self, rows: &[usize], cols: &[usize], block: DMatrixView<T>) -> eyre::Result<()>;
}

impl<'a, T, M> MatrixInserter<T> for &'a mut M
where
    M: ?Sized + MatrixInserter<T>,
{
    fn add_block(&mut self, rows: &[usize], cols: &[usize], block: DMatrixView<T>) -> eyre::Result<()> {
        (**self).add_block(rows, cols, block)
    }
}

fn check_block_dimensions<T: Scalar>(rows: &[usize], cols: &[usize], block: &DMatrixView<T>) -> eyre::Result<()> {
    if block.nrows() != rows.len() || block.ncols() != cols.len() {
        Err(eyre!(
            "block of size {}x{} does not match {} row and {} column indices",
            block.nrows(),
            block.ncols(),
            rows.len(),
            cols.len()
        ))
    } else {
        Ok(())
    }
}

/// Adds the block into the existing entries of the matrix.
///
/// Every targeted entry must already be present in the sparsity pattern, otherwise an error is
/// returned. Entries visited before the missing entry was encountered have already been updated.
impl<T: Real> MatrixInserter<T> for CsrMatrix<T> {
    fn add_block(&mut self, rows: &[usize], cols: &[usize], block: DMatrixView<T>) -> eyre::Result<()> {
        check_block_dimensions(rows, cols, &block)?;
        let nrows = self.nrows();
        for (local_row, &global_row) in rows.iter().enumerate() {
            let mut csr_row = self
                .get_row_mut(global_row)
                .ok_or_else(|| eyre!("row {} is out of bounds ({} rows)", global_row, nrows))?;
            let (column_indices, values) = csr_row.cols_and_values_mut();
            for (local_col, &global_col) in cols.iter().enumerate() {
                // Column indices of a CSR row are sorted
                let idx = column_indices
                    .binary_search(&global_col)
                    .map_err(|_| eyre!("entry ({}, {}) is not part of the sparsity pattern", global_row, global_col))?;
                values[idx] += block[(local_row, local_col)];
            }
        }
        Ok(())
    }
}

/// Pushes every entry of the block as a triplet. Duplicates are summed on conversion to
/// a compressed format.
impl<T: Real> MatrixInserter<T> for CooMatrix<T> {
    fn add_block(&mut self, rows: &[usize], cols: &[usize], block: DMatrixView<T>) -> eyre::Result<()> {
        check_block_dimensions(rows, cols, &block)?;
        if let Some(&r) = rows.iter().find(|&&r| r >= self.nrows()) {
            return Err(eyre!("row {} is out of bounds ({} rows)", r, self.nrows()));
        }
        if let Some(&c) = cols.iter().find(|&&c| c >= self.ncols()) {
            return Err(eyre!("column {} is out of bounds ({} columns)", c, self.ncols()));
        }
        for (local_col, &global_col) in cols.iter().enumerate() {
            for (local_row, &global_row) in rows.iter().enumerate() {
                self.push(global_row, global_col, block[(local_row, local_col)]);
            }
        }
        Ok(())
    }
}

impl<T: Real> MatrixInserter<T> for DMatrix<T> {
    fn add_block(&mut self, rows: &[usize], cols: &[usize], block: DMatrixView<T>) -> eyre::Result<()> {
        check_block_dimensions(rows, cols, &block)?;
        if let Some(&r) = rows.iter().find(|&&r| r >= self.nrows()) {
            return Err(eyre!("row {} is out of bounds ({} rows)", r, self.nrows()));
        }
        if let Some(&c) = cols.iter().find(|&&c| c >= self.ncols()) {
            return Err(eyre!("column {} is out of bounds ({} columns)", c, self.ncols()));
        }
        for (local_col, &global_col) in cols.iter().enumerate() {
            for (local_row, &global_row) in rows.iter().enumerate() {
                self[(global_row, global_col)] += block[(local_row, local_col)];
            }
        }
        Ok(())
    }
}
