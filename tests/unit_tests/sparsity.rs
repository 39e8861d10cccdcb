use fenris_contact::dofmap::CellDofMap;
use fenris_contact::mesh::procedural::create_rectangular_uniform_quad_mesh_2d;
use fenris_contact::sparsity::SparsityPatternBuilder;
use nalgebra::Vector2;

#[test]
fn builder_removes_duplicates_and_sorts() {
    let mut builder = SparsityPatternBuilder::new(3, 4);
    builder.insert(&[2, 0], &[3, 1]);
    builder.insert(&[0], &[1, 0]);
    builder.insert(&[2, 0], &[3, 1]);
    let pattern = builder.assemble().unwrap();

    assert_eq!(pattern.major_dim(), 3);
    assert_eq!(pattern.minor_dim(), 4);
    assert_eq!(pattern.major_offsets(), &[0, 3, 3, 5]);
    assert_eq!(pattern.minor_indices(), &[0, 1, 3, 1, 3]);
}

#[test]
fn builder_rejects_out_of_bounds_entries() {
    let mut builder = SparsityPatternBuilder::new(2, 2);
    builder.insert(&[1], &[2]);
    assert!(builder.assemble().is_err());
}

#[test]
fn empty_builder_gives_empty_rows() {
    let pattern = SparsityPatternBuilder::new(3, 3).assemble().unwrap();
    assert_eq!(pattern.nnz(), 0);
    assert_eq!(pattern.major_offsets(), &[0, 0, 0, 0]);
}

#[test]
fn insert_blocks_expands_block_dofs() {
    let mut builder = SparsityPatternBuilder::new(6, 6);
    builder.insert_blocks(&[2], &[0], 2);
    let pattern = builder.assemble().unwrap();
    assert_eq!(pattern.major_offsets(), &[0, 0, 0, 0, 0, 2, 4]);
    assert_eq!(pattern.minor_indices(), &[0, 1, 0, 1]);
}

#[test]
fn dofmap_pattern_couples_dofs_within_cells() {
    // 0 -- 1 -- 2
    // |    |    |
    // 3 -- 4 -- 5
    let mesh = create_rectangular_uniform_quad_mesh_2d(1.0, 2, 1, 1, &Vector2::new(0.0, 1.0));
    let dofmap = CellDofMap::from_mesh_vertices(&mesh, 1).unwrap();
    let pattern = SparsityPatternBuilder::from_dofmap(&dofmap)
        .assemble()
        .unwrap();

    assert_eq!(pattern.major_dim(), 6);
    assert_eq!(pattern.lane(0), &[0, 1, 3, 4]);
    assert_eq!(pattern.lane(1), &[0, 1, 2, 3, 4, 5]);
    assert_eq!(pattern.lane(5), &[1, 2, 4, 5]);

    let blocked = CellDofMap::from_mesh_vertices(&mesh, 3).unwrap();
    let pattern = SparsityPatternBuilder::from_dofmap(&blocked)
        .assemble()
        .unwrap();
    assert_eq!(pattern.major_dim(), 18);
    assert_eq!(pattern.lane(2), &[0, 1, 2, 3, 4, 5, 9, 10, 11, 12, 13, 14]);
    assert_eq!(pattern.nnz(), 9 * (4 * 4 + 2 * 6));
}
