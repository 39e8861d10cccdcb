//! Two-surface contact bookkeeping and assembly.
//!
//! A [`ContactManager`] tracks a pair of tagged boundary surfaces of a mesh. For each surface it
//! keeps the active facets, a [`SubMesh`] of the cells adjacent to them and, once supplied, a
//! facet link map relating every active facet to facets of the opposite surface's sub mesh.
//! Linked facets are resolved to parent mesh cells when the links are set, so that assembly
//! only has to look up a slice per facet.
use crate::assembly::{expand_block_indices, KernelInput, MatrixInserter, MatrixKernel, VectorKernel};
use crate::connectivity::{Connectivity, ConnectivityMut, ReferenceCellConnectivity};
use crate::dofmap::DofMap;
use crate::mesh::{ActiveFacet, Mesh};
use crate::mesh_tags::MeshTags;
use crate::quadrature::{reference_facet_quadrature, FacetQuadrature};
use crate::sparsity::SparsityPatternBuilder;
use crate::submesh::SubMesh;
use crate::Real;
use eyre::{eyre, WrapErr};
use fenris_nested_vec::NestedVec;
use log::{debug, warn};
use nalgebra::allocator::Allocator;
use nalgebra::storage::StorageMut;
use nalgebra::{DMatrixView, DVector, DVectorViewMut, DefaultAllocator, DimName, Dyn, Matrix, U1};
use nalgebra_sparse::pattern::SparsityPattern;
use nalgebra_sparse::CsrMatrix;
use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
use std::cell::RefCell;
use thread_local::ThreadLocal;

mod linked;
mod workspace;

pub use linked::*;

use workspace::{MatrixWorkspace, VectorWorkspace};

/// Number of coordinate entries stored per node in the coordinate buffer passed to kernels.
pub const COORDINATE_STRIDE: usize = 3;

/// Returns the index of the other surface of a contact pair.
///
/// Surface indices are `0` and `1`.
pub fn opposite(surface: usize) -> usize {
    debug_assert!(surface < 2, "surface index must be 0 or 1");
    1 - surface
}

fn check_surface(surface: usize) -> eyre::Result<()> {
    if surface < 2 {
        Ok(())
    } else {
        Err(eyre!("invalid surface index {}: must be 0 or 1", surface))
    }
}

/// Bookkeeping for a pair of contact surfaces on a mesh.
///
/// Surface `s` is identified by `surfaces()[s]`, the tag its facets carry in the facet markers
/// the manager was created from.
#[derive(Debug)]
pub struct ContactManager<'a, T, D, C, Map>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    mesh: &'a Mesh<T, D, C>,
    dofmap: &'a Map,
    surfaces: [i32; 2],
    dofs_per_cell: usize,
    nodes_per_cell: usize,
    active_facets: [Vec<ActiveFacet>; 2],
    submeshes: [SubMesh<T, D, C>; 2],
    facet_links: [Option<NestedVec<usize>>; 2],
    linked_cells: [Option<NestedVec<usize>>; 2],
    max_links: [usize; 2],
    quadrature: Option<FacetQuadrature<T, D>>,
}

impl<'a, T, D, C, Map> ContactManager<'a, T, D, C, Map>
where
    T: Real,
    D: DimName,
    C: ConnectivityMut,
    Map: DofMap,
    DefaultAllocator: Allocator<T, D>,
{
    /// Creates a contact manager for the facets tagged with `surfaces[0]` and `surfaces[1]`.
    ///
    /// `markers` must tag the facets of `mesh` as numbered by
    /// [`Mesh::compute_facet_topology`]. Every tagged facet of either surface must be an exterior
    /// facet of the mesh. A surface without any tagged facets is allowed.
    pub fn new(mesh: &'a Mesh<T, D, C>, markers: &MeshTags, surfaces: [i32; 2], dofmap: &'a Map) -> eyre::Result<Self> {
        if surfaces[0] == surfaces[1] {
            return Err(eyre!("contact surfaces must have distinct tags, got {} twice", surfaces[0]));
        }
        if D::dim() > COORDINATE_STRIDE {
            return Err(eyre!("geometric dimension {} is not supported", D::dim()));
        }
        if dofmap.num_cells() != mesh.num_cells() {
            return Err(eyre!(
                "dof map has {} cells, but mesh has {} cells",
                dofmap.num_cells(),
                mesh.num_cells()
            ));
        }

        let dofs_per_cell = uniform_cell_size((0..dofmap.num_cells()).map(|cell| dofmap.cell_dofs(cell).len()))
            .ok_or_else(|| eyre!("all cells must have the same number of dofs"))?;
        let nodes_per_cell = uniform_cell_size(
            mesh.connectivity()
                .iter()
                .map(|cell| cell.vertex_indices().len()),
        )
        .ok_or_else(|| eyre!("all cells must have the same number of nodes"))?;

        let topology = mesh.compute_facet_topology();
        if markers.num_entities() != topology.num_facets() {
            return Err(eyre!(
                "facet markers are defined on {} entities, but mesh has {} facets",
                markers.num_entities(),
                topology.num_facets()
            ));
        }

        let extract_surface = |surface: usize| -> eyre::Result<(Vec<ActiveFacet>, SubMesh<T, D, C>)> {
            let tag = surfaces[surface];
            let facets = markers.find(tag);
            let active_facets = topology
                .exterior_facet_pairs(&facets)
                .wrap_err_with(|| format!("invalid facets on contact surface {} (tag {})", surface, tag))?;
            if active_facets.is_empty() {
                warn!("Contact surface {} (tag {}) has no facets.", surface, tag);
            }
            let submesh = SubMesh::from_active_facets(mesh, &active_facets)?;
            debug!(
                "Contact surface {} (tag {}): {} facets, {} cells, {} sub mesh facets.",
                surface,
                tag,
                active_facets.len(),
                submesh.num_cells(),
                submesh.num_facets()
            );
            Ok((active_facets, submesh))
        };

        let (facets0, submesh0) = extract_surface(0)?;
        let (facets1, submesh1) = extract_surface(1)?;

        // A surface without facets needs no links
        let empty_links = |facets: &[ActiveFacet]| facets.is_empty().then(NestedVec::new);

        Ok(Self {
            mesh,
            dofmap,
            surfaces,
            dofs_per_cell,
            nodes_per_cell,
            facet_links: [empty_links(&facets0), empty_links(&facets1)],
            linked_cells: [empty_links(&facets0), empty_links(&facets1)],
            active_facets: [facets0, facets1],
            submeshes: [submesh0, submesh1],
            max_links: [0, 0],
            quadrature: None,
        })
    }

    /// Sets the facet link map of the given surface.
    ///
    /// Entry `i` of `links` lists facets of the opposite surface's sub mesh (see
    /// [`SubMesh::facet_index`]) that active facet `i` of `surface` is in contact with. Any
    /// previously set links are replaced.
    pub fn set_facet_links(&mut self, surface: usize, links: NestedVec<usize>) -> eyre::Result<()>
    where
        SubMesh<T, D, C>: Sync,
    {
        check_surface(surface)?;
        let num_facets = self.active_facets[surface].len();
        if links.len() != num_facets {
            return Err(eyre!(
                "facet link map has {} entries, but surface {} has {} facets",
                links.len(),
                surface,
                num_facets
            ));
        }

        let linked_cells = resolve_linked_cell_arena(&links, &self.submeshes[opposite(surface)])
            .wrap_err_with(|| format!("invalid facet links for surface {}", surface))?;
        let max_links = linked_cells
            .iter()
            .map(<[usize]>::len)
            .max()
            .unwrap_or(0);
        debug!(
            "Set facet links on contact surface {}: {} linked cells in total, at most {} per facet.",
            surface,
            linked_cells.iter_array_elements().count(),
            max_links
        );

        self.facet_links[surface] = Some(links);
        self.linked_cells[surface] = Some(linked_cells);
        self.max_links[surface] = max_links;
        Ok(())
    }

    /// Sets the polynomial degree of the facet quadrature rule used by contact kernels.
    pub fn set_quadrature_degree(&mut self, degree: usize) -> eyre::Result<()>
    where
        C: ReferenceCellConnectivity<T, ReferenceDim = D>,
    {
        let quadrature = reference_facet_quadrature::<T, C>(degree)?;
        debug!(
            "Contact quadrature of degree {} with {} points per facet.",
            degree,
            quadrature.num_points()
        );
        self.quadrature = Some(quadrature);
        Ok(())
    }
}

fn uniform_cell_size(mut sizes: impl Iterator<Item = usize>) -> Option<usize> {
    match sizes.next() {
        None => Some(0),
        Some(first) => sizes.all(|size| size == first).then_some(first),
    }
}

impl<'a, T, D, C, Map> ContactManager<'a, T, D, C, Map>
where
    T: Real,
    D: DimName,
    Map: DofMap,
    DefaultAllocator: Allocator<T, D>,
{
    pub fn mesh(&self) -> &'a Mesh<T, D, C> {
        self.mesh
    }

    pub fn dofmap(&self) -> &'a Map {
        self.dofmap
    }

    /// The tags of the two surfaces.
    pub fn surfaces(&self) -> [i32; 2] {
        self.surfaces
    }

    /// Active facets of a surface.
    ///
    /// Panics if `surface` is not `0` or `1`.
    pub fn active_facets(&self, surface: usize) -> &[ActiveFacet] {
        &self.active_facets[surface]
    }

    pub fn num_facets(&self, surface: usize) -> usize {
        self.active_facets[surface].len()
    }

    pub fn submesh(&self, surface: usize) -> &SubMesh<T, D, C> {
        &self.submeshes[surface]
    }

    pub fn facet_links(&self, surface: usize) -> Option<&NestedVec<usize>> {
        self.facet_links[surface].as_ref()
    }

    /// Parent mesh cells linked to the given active facet, sorted and without duplicates.
    ///
    /// Returns `None` if no links have been set for the surface or the facet is out of bounds.
    pub fn linked_cells(&self, surface: usize, facet: usize) -> Option<&[usize]> {
        self.linked_cells[surface].as_ref()?.get(facet)
    }

    /// The largest number of linked cells of any facet of the surface.
    pub fn max_links(&self, surface: usize) -> usize {
        self.max_links[surface]
    }

    pub fn reference_facet_quadrature(&self) -> Option<&FacetQuadrature<T, D>> {
        self.quadrature.as_ref()
    }

    /// The number of coefficient entries required per facet by contact kernels.
    ///
    /// With `nq` quadrature points per facet, geometric dimension `gdim`, `ndofs` block dofs per
    /// cell with block size `bs`, and `max_links` the largest number of linked cells of any
    /// facet on either surface, the size is
    /// `3 + nq * (2 * gdim + ndofs * bs * max_links + bs) + ndofs * bs`.
    ///
    /// Fails if no quadrature degree has been set.
    pub fn coefficients_size(&self) -> eyre::Result<usize> {
        let quadrature = self
            .quadrature
            .as_ref()
            .ok_or_else(|| eyre!("quadrature degree must be set before computing coefficient sizes"))?;
        let nq = quadrature.num_points();
        let gdim = D::dim();
        let bs = self.dofmap.block_size();
        let ndofs = self.dofs_per_cell;
        let max_links = self.max_links[0].max(self.max_links[1]);
        Ok(3 + nq * (2 * gdim + ndofs * bs * max_links + bs) + ndofs * bs)
    }

    fn linked_cell_arena(&self, surface: usize) -> eyre::Result<&NestedVec<usize>> {
        self.linked_cells[surface]
            .as_ref()
            .ok_or_else(|| eyre!("facet links have not been set for surface {}", surface))
    }

    /// Builds the sparsity pattern of a contact operator.
    ///
    /// The pattern contains all couplings within each cell of the mesh, and for every active
    /// facet of both surfaces the couplings between the dofs of the facet's cell and the dofs of
    /// its linked cells, in both directions.
    ///
    /// Fails if facet links are missing for a surface with active facets.
    pub fn build_matrix_pattern(&self) -> eyre::Result<SparsityPattern> {
        let bs = self.dofmap.block_size();
        let mut builder = SparsityPatternBuilder::from_dofmap(self.dofmap);
        let mut linked_dofs = Vec::new();

        for surface in 0..2 {
            let arena = self.linked_cell_arena(surface)?;
            for (facet, linked_cells) in self.active_facets[surface].iter().zip(arena.iter()) {
                let cell_dofs = self.dofmap.cell_dofs(facet.cell);
                gather_linked_dofs(self.dofmap, linked_cells, &mut linked_dofs);
                builder.insert_blocks(cell_dofs, &linked_dofs, bs);
                builder.insert_blocks(&linked_dofs, cell_dofs, bs);
            }
        }

        let pattern = builder.assemble()?;
        debug!(
            "Built contact sparsity pattern: {}x{} with {} non-zeros.",
            pattern.major_dim(),
            pattern.minor_dim(),
            pattern.nnz()
        );
        Ok(pattern)
    }

    /// Creates a zero-valued CSR matrix with the pattern of [`build_matrix_pattern`](Self::build_matrix_pattern).
    pub fn create_matrix(&self) -> eyre::Result<CsrMatrix<T>> {
        let pattern = self.build_matrix_pattern()?;
        let values = vec![T::zero(); pattern.nnz()];
        CsrMatrix::try_from_pattern_and_values(pattern, values)
            .map_err(|err| eyre!("failed to create contact matrix: {}", err))
    }

    fn check_assembly_input(
        &self,
        origin_surface: usize,
        coefficients: &[T],
        coefficient_stride: usize,
    ) -> eyre::Result<&NestedVec<usize>> {
        check_surface(origin_surface)?;
        let arena = self.linked_cell_arena(origin_surface)?;
        let required = self.active_facets[origin_surface].len() * coefficient_stride;
        if coefficients.len() < required {
            return Err(eyre!(
                "coefficient buffer has {} entries, but {} facets with stride {} require {}",
                coefficients.len(),
                self.active_facets[origin_surface].len(),
                coefficient_stride,
                required
            ));
        }
        Ok(arena)
    }

    fn num_coordinates(&self) -> usize {
        COORDINATE_STRIDE * self.nodes_per_cell
    }

    fn block_dim(&self) -> usize {
        self.dofmap.block_size() * self.dofs_per_cell
    }

    fn pack_cell_coordinates(&self, cell: usize, coordinates: &mut [T])
    where
        C: Connectivity,
    {
        coordinates.fill(T::zero());
        let vertex_indices = self.mesh.connectivity()[cell].vertex_indices();
        for (node, &vertex) in vertex_indices.iter().enumerate() {
            let x = &self.mesh.vertices()[vertex];
            for k in 0..D::dim() {
                coordinates[COORDINATE_STRIDE * node + k] = x[k];
            }
        }
    }

    /// Assembles the contact matrix contribution of all active facets of `origin_surface`.
    ///
    /// For each facet, the kernel is called with the facet's slice of `coefficients`
    /// (`coefficient_stride` entries per facet, in active facet order) and the blocks are added
    /// to `inserter` in the order: cell/cell, then for each linked cell the cell/linked,
    /// linked/cell and linked/linked blocks.
    ///
    /// Fails if links are missing for the surface, if the coefficient buffer is too short, or if
    /// the kernel or the inserter fails. In the latter case, contributions of earlier facets
    /// remain in the matrix.
    pub fn assemble_matrix<K>(
        &self,
        inserter: &mut impl MatrixInserter<T>,
        origin_surface: usize,
        kernel: &K,
        coefficients: &[T],
        coefficient_stride: usize,
        constants: &[T],
    ) -> eyre::Result<()>
    where
        K: ?Sized + MatrixKernel<T>,
        C: Connectivity,
    {
        let arena = self.check_assembly_input(origin_surface, coefficients, coefficient_stride)?;
        let bs = self.dofmap.block_size();
        let facets = &self.active_facets[origin_surface];
        debug!(
            "Assembling contact matrix over {} facets of surface {}.",
            facets.len(),
            origin_surface
        );

        let mut ws = MatrixWorkspace::new(self.num_coordinates(), self.max_links[origin_surface], self.block_dim());
        for (i, (facet, linked_cells)) in facets.iter().zip(arena.iter()).enumerate() {
            let num_linked = linked_cells.len();
            self.pack_cell_coordinates(facet.cell, &mut ws.coordinates);

            let blocks = &mut ws.blocks[..3 * num_linked + 1];
            for block in blocks.iter_mut() {
                block.fill(T::zero());
            }
            let input = KernelInput {
                coefficients: &coefficients[i * coefficient_stride..(i + 1) * coefficient_stride],
                constants,
                coordinates: &ws.coordinates,
                local_facet: facet.local_facet,
                permutation: 0,
                num_linked_cells: num_linked,
            };
            kernel
                .compute_blocks(blocks, &input)
                .wrap_err_with(|| format!("contact kernel failed on facet {} of surface {}", i, origin_surface))?;

            expand_block_indices(self.dofmap.cell_dofs(facet.cell), bs, &mut ws.cell_indices);
            inserter.add_block(&ws.cell_indices, &ws.cell_indices, DMatrixView::from(&ws.blocks[0]))?;
            for (j, &linked_cell) in linked_cells.iter().enumerate() {
                expand_block_indices(self.dofmap.cell_dofs(linked_cell), bs, &mut ws.linked_indices);
                inserter.add_block(
                    &ws.cell_indices,
                    &ws.linked_indices,
                    DMatrixView::from(&ws.blocks[3 * j + 1]),
                )?;
                inserter.add_block(
                    &ws.linked_indices,
                    &ws.cell_indices,
                    DMatrixView::from(&ws.blocks[3 * j + 2]),
                )?;
                inserter.add_block(
                    &ws.linked_indices,
                    &ws.linked_indices,
                    DMatrixView::from(&ws.blocks[3 * j + 3]),
                )?;
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn compute_vector_blocks<K>(
        &self,
        ws: &mut VectorWorkspace<T>,
        facet_index: usize,
        facet: &ActiveFacet,
        linked_cells: &[usize],
        kernel: &K,
        coefficients: &[T],
        coefficient_stride: usize,
        constants: &[T],
    ) -> eyre::Result<()>
    where
        K: ?Sized + VectorKernel<T>,
        C: Connectivity,
    {
        self.pack_cell_coordinates(facet.cell, &mut ws.coordinates);
        let num_linked = linked_cells.len();
        let blocks = &mut ws.blocks[..num_linked + 1];
        for block in blocks.iter_mut() {
            block.fill(T::zero());
        }
        let offset = facet_index * coefficient_stride;
        let input = KernelInput {
            coefficients: &coefficients[offset..offset + coefficient_stride],
            constants,
            coordinates: &ws.coordinates,
            local_facet: facet.local_facet,
            permutation: 0,
            num_linked_cells: num_linked,
        };
        kernel
            .compute_blocks(blocks, &input)
            .wrap_err_with(|| format!("contact kernel failed on facet {}", facet_index))
    }

    fn scatter_vector_blocks<S>(
        &self,
        blocks: &[DVector<T>],
        facet: &ActiveFacet,
        linked_cells: &[usize],
        b: &mut Matrix<T, Dyn, U1, S>,
    ) where
        S: StorageMut<T, Dyn, U1>,
    {
        let bs = self.dofmap.block_size();
        let cells = std::iter::once(&facet.cell).chain(linked_cells);
        for (block, &cell) in blocks.iter().zip(cells) {
            for (n, &dof) in self.dofmap.cell_dofs(cell).iter().enumerate() {
                for k in 0..bs {
                    b[bs * dof + k] += block[bs * n + k];
                }
            }
        }
    }

    fn check_vector_len(&self, len: usize) -> eyre::Result<()> {
        let expected = self.dofmap.num_scalar_dofs();
        if len == expected {
            Ok(())
        } else {
            Err(eyre!(
                "vector has length {}, but the dof map has {} scalar dofs",
                len,
                expected
            ))
        }
    }

    /// Assembles the contact vector contribution of all active facets of `origin_surface` into `b`.
    ///
    /// Block `0` returned by the kernel is added to the dofs of the facet's cell and block
    /// `j + 1` to the dofs of linked cell `j`. Fails under the same conditions as
    /// [`assemble_matrix`](Self::assemble_matrix), or if `b` does not have one entry per scalar dof.
    pub fn assemble_vector<'b, K>(
        &self,
        b: impl Into<DVectorViewMut<'b, T>>,
        origin_surface: usize,
        kernel: &K,
        coefficients: &[T],
        coefficient_stride: usize,
        constants: &[T],
    ) -> eyre::Result<()>
    where
        K: ?Sized + VectorKernel<T>,
        C: Connectivity,
    {
        let mut b = b.into();
        self.check_vector_len(b.len())?;
        let arena = self.check_assembly_input(origin_surface, coefficients, coefficient_stride)?;
        let facets = &self.active_facets[origin_surface];
        debug!(
            "Assembling contact vector over {} facets of surface {}.",
            facets.len(),
            origin_surface
        );

        let mut ws = VectorWorkspace::new(self.num_coordinates(), self.max_links[origin_surface], self.block_dim());
        for (i, (facet, linked_cells)) in facets.iter().zip(arena.iter()).enumerate() {
            self.compute_vector_blocks(
                &mut ws,
                i,
                facet,
                linked_cells,
                kernel,
                coefficients,
                coefficient_stride,
                constants,
            )?;
            self.scatter_vector_blocks(&ws.blocks, facet, linked_cells, &mut b);
        }
        Ok(())
    }

    /// Parallel version of [`assemble_vector`](Self::assemble_vector).
    ///
    /// Facets are processed in parallel with a workspace per thread. Each task accumulates into
    /// its own vector and the partial results are summed before being added to `b`, so the
    /// result is identical to the sequential assembly up to floating point round-off.
    pub fn par_assemble_vector<'b, K>(
        &self,
        b: impl Into<DVectorViewMut<'b, T>>,
        origin_surface: usize,
        kernel: &K,
        coefficients: &[T],
        coefficient_stride: usize,
        constants: &[T],
    ) -> eyre::Result<()>
    where
        K: ?Sized + VectorKernel<T> + Sync,
        C: Connectivity,
        T: Send,
        Self: Sync,
    {
        let mut b = b.into();
        self.check_vector_len(b.len())?;
        let arena = self.check_assembly_input(origin_surface, coefficients, coefficient_stride)?;
        let facets = &self.active_facets[origin_surface];
        debug!(
            "Assembling contact vector in parallel over {} facets of surface {}.",
            facets.len(),
            origin_surface
        );

        let n = b.len();
        let max_links = self.max_links[origin_surface];
        let workspace: ThreadLocal<RefCell<VectorWorkspace<T>>> = ThreadLocal::new();
        let contribution = (0..facets.len())
            .into_par_iter()
            .with_min_len(16)
            .try_fold(
                || DVector::zeros(n),
                |mut partial, i| -> eyre::Result<DVector<T>> {
                    let mut ws = workspace
                        .get_or(|| RefCell::new(VectorWorkspace::new(self.num_coordinates(), max_links, self.block_dim())))
                        .borrow_mut();
                    let facet = &facets[i];
                    let linked_cells = arena.get(i).expect("Facet index is in bounds");
                    self.compute_vector_blocks(
                        &mut ws,
                        i,
                        facet,
                        linked_cells,
                        kernel,
                        coefficients,
                        coefficient_stride,
                        constants,
                    )?;
                    self.scatter_vector_blocks(&ws.blocks, facet, linked_cells, &mut partial);
                    Ok(partial)
                },
            )
            .try_reduce(|| DVector::zeros(n), |lhs, rhs| Ok(lhs + rhs))?;

        b += contribution;
        Ok(())
    }
}
