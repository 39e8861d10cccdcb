//! Bookkeeping and assembly for finite element contact problems.
//!
//! Two boundary surfaces of a mesh are tracked by a [`ContactManager`](contact::ContactManager).
//! Each surface owns a list of active facets and a [`SubMesh`](submesh::SubMesh) built from the
//! cells adjacent to them. Once a facet link map (produced by some geometric search outside of
//! this crate) has been supplied, the manager can build the sparsity pattern of the coupled
//! operator and assemble matrices and vectors whose entries connect the degrees of freedom of a
//! facet's own cell with those of the cells it is linked to on the opposite surface.
use nalgebra::RealField;

pub mod assembly;
pub mod connectivity;
pub mod contact;
pub mod dofmap;
pub mod mesh;
pub mod mesh_tags;
pub mod quadrature;
pub mod sparsity;
pub mod submesh;

pub extern crate fenris_nested_vec as nested_vec;
pub extern crate nalgebra;
pub extern crate nalgebra_sparse;

/// Trait alias for the scalar types used for geometry and assembled values.
pub trait Real: RealField + Copy {}

impl<T> Real for T where T: RealField + Copy {}
