use crate::dofmap::DofMap;
use crate::submesh::SubMesh;
use eyre::eyre;
use fenris_nested_vec::NestedVec;
use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, DimName, Scalar};
use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};

/// Computes the parent mesh cells linked to a facet.
///
/// Each entry of `links` is a facet of the opposite sub mesh. It is mapped to the sub mesh cell
/// it belongs to, and from there to the parent mesh cell. The result is written to
/// `linked_cells`, sorted in ascending order and without duplicates. An empty list of links
/// produces an empty set of linked cells.
pub fn resolve_linked_cells<T, D, C>(
    links: &[usize],
    opposite: &SubMesh<T, D, C>,
    linked_cells: &mut Vec<usize>,
) -> eyre::Result<()>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    linked_cells.clear();
    for &link in links {
        let parent_cell = opposite.facet_parent_cell(link).ok_or_else(|| {
            eyre!(
                "linked facet {} is out of bounds: opposite sub mesh has {} facets",
                link,
                opposite.num_facets()
            )
        })?;
        linked_cells.push(parent_cell);
    }
    linked_cells.sort_unstable();
    linked_cells.dedup();
    Ok(())
}

/// Resolves the linked cells of every facet in parallel.
///
/// Entry `i` of the returned arena holds the linked cells of facet `i`, as computed by
/// [`resolve_linked_cells`].
pub fn resolve_linked_cell_arena<T, D, C>(
    facet_links: &NestedVec<usize>,
    opposite: &SubMesh<T, D, C>,
) -> eyre::Result<NestedVec<usize>>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
    SubMesh<T, D, C>: Sync,
{
    let linked_cells = (0..facet_links.len())
        .into_par_iter()
        .with_min_len(64)
        .map(|facet| -> eyre::Result<Vec<usize>> {
            let links = facet_links
                .get(facet)
                .expect("Facet index is in bounds");
            let mut linked_cells = Vec::with_capacity(links.len());
            resolve_linked_cells(links, opposite, &mut linked_cells)?;
            Ok(linked_cells)
        })
        .collect::<eyre::Result<Vec<_>>>()?;
    Ok(NestedVec::from(linked_cells))
}

/// Gathers the block dofs of all given cells into `linked_dofs`, sorted and without duplicates.
pub fn gather_linked_dofs(dofmap: &(impl ?Sized + DofMap), linked_cells: &[usize], linked_dofs: &mut Vec<usize>) {
    linked_dofs.clear();
    for &cell in linked_cells {
        linked_dofs.extend_from_slice(dofmap.cell_dofs(cell));
    }
    linked_dofs.sort_unstable();
    linked_dofs.dedup();
}
