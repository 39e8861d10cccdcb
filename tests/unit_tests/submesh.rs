use fenris_contact::connectivity::Quad4d2Connectivity;
use fenris_contact::mesh::procedural::create_stacked_blocks_quad_mesh_2d;
use fenris_contact::mesh::ActiveFacet;
use fenris_contact::submesh::SubMesh;

#[test]
fn submesh_of_upper_contact_facets() {
    let mesh = create_stacked_blocks_quad_mesh_2d(5, 3, 1, 0.5);
    let facets = [ActiveFacet::new(7, 0), ActiveFacet::new(5, 0), ActiveFacet::new(6, 0)];
    let submesh = SubMesh::from_active_facets(&mesh, &facets).unwrap();

    assert_eq!(submesh.parent_cells(), &[5, 6, 7]);
    assert_eq!(submesh.num_cells(), 3);
    // Three quads in a row
    assert_eq!(submesh.num_facets(), 10);
    assert_eq!(submesh.mesh().vertices().len(), 8);
    assert_eq!(submesh.mesh().connectivity()[0], Quad4d2Connectivity([4, 5, 1, 0]));

    assert_eq!(submesh.submesh_cell(6), Some(1));
    assert_eq!(submesh.submesh_cell(0), None);

    for (cell, parent) in [(0, 5), (1, 6), (2, 7)] {
        assert_eq!(
            submesh.mesh().cell_vertices(cell),
            mesh.cell_vertices(parent),
            "sub mesh cell {cell}"
        );
    }

    for facet in 0..submesh.num_facets() {
        let pair = submesh.facet_map().get(facet).unwrap();
        assert_eq!(pair.len(), 2);
        assert!(pair[0] < 3);
        assert!(pair[1] < 4);
    }

    let bottom_of_6 = submesh.facet_index(6, 0).unwrap();
    assert_eq!(submesh.facet_parent_cell(bottom_of_6), Some(6));
    assert_eq!(submesh.facet_map().get(bottom_of_6), Some([1, 0].as_slice()));

    // The edge shared by cells 5 and 6 maps to the first cell that references it
    let shared = submesh.facet_index(6, 3).unwrap();
    assert_eq!(submesh.facet_index(5, 1), Some(shared));
    assert_eq!(submesh.facet_parent_cell(shared), Some(5));

    assert_eq!(submesh.facet_index(0, 0), None);
    assert_eq!(submesh.facet_parent_cell(submesh.num_facets()), None);
}

#[test]
fn empty_submesh() {
    let mesh = create_stacked_blocks_quad_mesh_2d(2, 2, 1, 0.5);
    let submesh = SubMesh::from_active_facets(&mesh, &[]).unwrap();
    assert_eq!(submesh.num_cells(), 0);
    assert_eq!(submesh.num_facets(), 0);
    assert!(submesh.mesh().vertices().is_empty());
}

#[test]
fn submesh_rejects_invalid_facets() {
    let mesh = create_stacked_blocks_quad_mesh_2d(2, 2, 1, 0.5);
    assert!(SubMesh::from_active_facets(&mesh, &[ActiveFacet::new(0, 4)]).is_err());
    assert!(SubMesh::from_active_facets(&mesh, &[ActiveFacet::new(4, 0)]).is_err());
}
