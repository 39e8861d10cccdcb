use fenris_contact::dofmap::{CellDofMap, DofMap};
use fenris_contact::mesh::procedural::create_stacked_blocks_quad_mesh_2d;
use fenris_contact::nested_vec::NestedVec;

#[test]
fn vertex_dofmap_of_quad_mesh() {
    let mesh = create_stacked_blocks_quad_mesh_2d(5, 3, 1, 0.5);
    let dofmap = CellDofMap::from_mesh_vertices(&mesh, 2).unwrap();

    assert_eq!(dofmap.num_cells(), 8);
    assert_eq!(dofmap.num_dofs(), 20);
    assert_eq!(dofmap.block_size(), 2);
    assert_eq!(dofmap.num_scalar_dofs(), 40);
    assert_eq!(dofmap.cell_dofs(0), &[6, 7, 1, 0]);
    assert_eq!(dofmap.cell_dofs(5), &[16, 17, 13, 12]);
}

#[test]
fn invalid_dofmaps_are_rejected() {
    let cell_dofs = NestedVec::from(vec![vec![0, 1], vec![1, 2]]);
    assert!(CellDofMap::try_from_cell_dofs(cell_dofs.clone(), 2, 1).is_err());
    assert!(CellDofMap::try_from_cell_dofs(cell_dofs.clone(), 3, 0).is_err());
    assert!(CellDofMap::try_from_cell_dofs(cell_dofs, 3, 1).is_ok());
}
