use fenris_contact::connectivity::Quad4d2Connectivity;
use fenris_contact::contact::{gather_linked_dofs, resolve_linked_cell_arena, resolve_linked_cells};
use fenris_contact::dofmap::CellDofMap;
use fenris_contact::mesh::procedural::create_stacked_blocks_quad_mesh_2d;
use fenris_contact::mesh::{ActiveFacet, QuadMesh2d};
use fenris_contact::nested_vec::NestedVec;
use fenris_contact::submesh::SubMesh;
use nalgebra::U2;
use proptest::collection::vec;
use proptest::prelude::*;

fn upper_submesh() -> (QuadMesh2d<f64>, SubMesh<f64, U2, Quad4d2Connectivity>) {
    let mesh = create_stacked_blocks_quad_mesh_2d(5, 3, 1, 0.5);
    let facets: Vec<_> = (5..8).map(|cell| ActiveFacet::new(cell, 0)).collect();
    let submesh = SubMesh::from_active_facets(&mesh, &facets).unwrap();
    (mesh, submesh)
}

#[test]
fn links_to_the_same_cell_are_merged() {
    let (_, submesh) = upper_submesh();
    let bottom = submesh.facet_index(5, 0).unwrap();
    let left = submesh.facet_index(5, 3).unwrap();
    let far = submesh.facet_index(7, 0).unwrap();

    let mut linked_cells = vec![42];
    resolve_linked_cells(&[far, left, bottom], &submesh, &mut linked_cells).unwrap();
    assert_eq!(linked_cells, vec![5, 7]);

    resolve_linked_cells(&[], &submesh, &mut linked_cells).unwrap();
    assert!(linked_cells.is_empty());
}

#[test]
fn out_of_range_link_is_an_error() {
    let (_, submesh) = upper_submesh();
    let mut linked_cells = Vec::new();
    assert!(resolve_linked_cells(&[0, submesh.num_facets()], &submesh, &mut linked_cells).is_err());

    let links = NestedVec::from(vec![vec![0], vec![submesh.num_facets() + 3]]);
    assert!(resolve_linked_cell_arena(&links, &submesh).is_err());
}

#[test]
fn gather_linked_dofs_merges_shared_vertices() {
    let (mesh, _) = upper_submesh();
    let dofmap = CellDofMap::from_mesh_vertices(&mesh, 2).unwrap();
    let mut linked_dofs = Vec::new();
    gather_linked_dofs(&dofmap, &[5, 6], &mut linked_dofs);
    assert_eq!(linked_dofs, vec![12, 13, 14, 16, 17, 18]);

    gather_linked_dofs(&dofmap, &[], &mut linked_dofs);
    assert!(linked_dofs.is_empty());
}

proptest! {
    #[test]
    fn linked_cells_are_sorted_unique_parent_cells(
        links in vec(vec(0..10usize, 0..6), 0..20)
    ) {
        let (_, submesh) = upper_submesh();
        prop_assume!(submesh.num_facets() == 10);
        let facet_links = NestedVec::from(links.clone());
        let arena = resolve_linked_cell_arena(&facet_links, &submesh).unwrap();
        prop_assert_eq!(arena.len(), links.len());

        let mut expected = Vec::new();
        for (facet_links, linked_cells) in links.iter().zip(arena.iter()) {
            resolve_linked_cells(facet_links, &submesh, &mut expected).unwrap();
            prop_assert_eq!(linked_cells, expected.as_slice());
            prop_assert!(linked_cells.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(linked_cells.len() <= facet_links.len());
            for cell in linked_cells {
                prop_assert!(submesh.parent_cells().contains(cell));
            }
        }
    }
}
