//! Construction of sparsity patterns from blocks of coupled dofs.
use crate::dofmap::DofMap;
use eyre::eyre;
use itertools::iproduct;
use nalgebra_sparse::pattern::SparsityPattern;
use rayon::slice::ParallelSliceMut;

fn scalar_indices(block_dofs: &[usize], block_size: usize) -> impl Iterator<Item = usize> + Clone + '_ {
    block_dofs
        .iter()
        .flat_map(move |&dof| (0..block_size).map(move |k| block_size * dof + k))
}

/// Collects matrix entries and turns them into a CSR sparsity pattern.
///
/// Entries may be inserted any number of times and in any order. Duplicates are removed when
/// the pattern is assembled.
#[derive(Debug, Clone)]
pub struct SparsityPatternBuilder {
    num_rows: usize,
    num_cols: usize,
    entries: Vec<(usize, usize)>,
}

impl SparsityPatternBuilder {
    pub fn new(num_rows: usize, num_cols: usize) -> Self {
        Self {
            num_rows,
            num_cols,
            entries: Vec::new(),
        }
    }

    /// Creates a builder for the square operator on the given dof map, populated with the
    /// couplings between all dofs of each cell.
    pub fn from_dofmap(dofmap: &(impl ?Sized + DofMap)) -> Self {
        let n = dofmap.num_scalar_dofs();
        let mut builder = Self::new(n, n);
        let bs = dofmap.block_size();
        let num_entries: usize = (0..dofmap.num_cells())
            .map(|cell| {
                let m = bs * dofmap.cell_dofs(cell).len();
                m * m
            })
            .sum();
        builder.entries.reserve(num_entries);

        for cell in 0..dofmap.num_cells() {
            let dofs = dofmap.cell_dofs(cell);
            builder.insert_blocks(dofs, dofs, bs);
        }
        builder
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    /// Inserts every entry `(r, c)` with `r` in `rows` and `c` in `cols`.
    pub fn insert(&mut self, rows: &[usize], cols: &[usize]) {
        self.entries
            .extend(iproduct!(rows.iter().copied(), cols.iter().copied()));
    }

    /// Inserts all entries coupling the block dofs in `rows` with the block dofs in `cols`.
    pub fn insert_blocks(&mut self, rows: &[usize], cols: &[usize], block_size: usize) {
        self.entries.extend(iproduct!(
            scalar_indices(rows, block_size),
            scalar_indices(cols, block_size)
        ));
    }

    /// Sorts and deduplicates the inserted entries and produces the final pattern.
    ///
    /// Fails if any entry is out of bounds.
    pub fn assemble(mut self) -> eyre::Result<SparsityPattern> {
        self.entries.par_sort_unstable();
        self.entries.dedup();

        if let Some(&(i, j)) = self
            .entries
            .iter()
            .find(|&&(i, j)| i >= self.num_rows || j >= self.num_cols)
        {
            return Err(eyre!(
                "entry ({}, {}) is out of bounds for a {}x{} pattern",
                i,
                j,
                self.num_rows,
                self.num_cols
            ));
        }

        let mut row_offsets = Vec::with_capacity(self.num_rows + 1);
        let mut column_indices = Vec::with_capacity(self.entries.len());
        row_offsets.push(0);

        let mut current_row = 0;
        for (i, j) in self.entries {
            while i > current_row {
                row_offsets.push(column_indices.len());
                current_row += 1;
            }
            column_indices.push(j);
        }

        // Fill out offsets for remaining empty rows
        while row_offsets.len() < self.num_rows + 1 {
            row_offsets.push(column_indices.len());
        }

        SparsityPattern::try_from_offsets_and_indices(self.num_rows, self.num_cols, row_offsets, column_indices)
            .map_err(|err| eyre!("failed to construct sparsity pattern: {}", err))
    }
}
