use fenris_contact::connectivity::{Connectivity, Quad4d2Connectivity, Tet4Connectivity};
use fenris_contact::mesh::procedural::{create_rectangular_uniform_quad_mesh_2d, create_stacked_blocks_quad_mesh_2d};
use fenris_contact::mesh::{ActiveFacet, QuadMesh2d, Tet4Mesh};
use nalgebra::{Point2, Point3, Vector2};
use proptest::prelude::*;

fn two_quads() -> QuadMesh2d<f64> {
    // 0 -- 1 -- 2
    // |    |    |
    // 3 -- 4 -- 5
    create_rectangular_uniform_quad_mesh_2d(1.0, 2, 1, 1, &Vector2::new(0.0, 1.0))
}

#[test]
fn rectangular_quad_mesh_numbering() {
    let mesh = two_quads();
    assert_eq!(mesh.vertices().len(), 6);
    assert_eq!(mesh.vertices()[0], Point2::new(0.0, 1.0));
    assert_eq!(mesh.vertices()[5], Point2::new(2.0, 0.0));
    assert_eq!(
        mesh.connectivity(),
        &[Quad4d2Connectivity([3, 4, 1, 0]), Quad4d2Connectivity([4, 5, 2, 1])]
    );
}

#[test]
fn facet_topology_of_two_quads() {
    let mesh = two_quads();
    let topology = mesh.compute_facet_topology();

    assert_eq!(topology.num_cells(), 2);
    assert_eq!(topology.num_facets(), 7);
    assert_eq!(topology.cell_facets(0), Some([0, 1, 2, 3].as_slice()));
    assert_eq!(topology.cell_facets(1), Some([4, 5, 6, 1].as_slice()));

    // The shared edge 1-4 is local facet 1 of cell 0 and local facet 3 of cell 1
    assert_eq!(topology.facet_cells(1), Some([0, 1, 1, 3].as_slice()));
    assert!(!topology.is_exterior(1));
    assert!(!topology.is_exterior(7));
    assert_eq!(topology.exterior_facets(), vec![0, 2, 3, 4, 5, 6]);

    assert_eq!(topology.facet_of(ActiveFacet::new(1, 3)), Some(1));
    assert_eq!(topology.facet_of(ActiveFacet::new(1, 4)), None);
    assert_eq!(topology.facet_of(ActiveFacet::new(2, 0)), None);
}

#[test]
fn exterior_facet_pairs_rejects_interior_and_out_of_bounds_facets() {
    let topology = two_quads().compute_facet_topology();

    let pairs = topology.exterior_facet_pairs(&[6, 0]).unwrap();
    assert_eq!(pairs, vec![ActiveFacet::new(1, 2), ActiveFacet::new(0, 0)]);

    assert!(topology.exterior_facet_pairs(&[1]).is_err());
    assert!(topology.exterior_facet_pairs(&[0, 7]).is_err());
    assert!(topology.exterior_facet_pairs(&[]).unwrap().is_empty());
}

#[test]
fn facet_topology_of_two_tets() {
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(0.0, 0.0, -1.0),
    ];
    let cells = vec![Tet4Connectivity([0, 1, 2, 3]), Tet4Connectivity([0, 2, 1, 4])];
    let mesh = Tet4Mesh::try_from_vertices_and_connectivity(vertices, cells).unwrap();
    let topology = mesh.compute_facet_topology();

    assert_eq!(topology.num_facets(), 7);
    assert_eq!(topology.exterior_facets().len(), 6);
    // The shared triangle 0-1-2 is face 0 of both cells
    assert_eq!(topology.facet_cells(0), Some([0, 0, 1, 0].as_slice()));
}

#[test]
fn try_from_vertices_and_connectivity_checks_vertex_indices() {
    let vertices = vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(1.0, 1.0)];
    let cells = vec![Quad4d2Connectivity([0, 1, 2, 3])];
    assert!(QuadMesh2d::try_from_vertices_and_connectivity(vertices, cells).is_err());
}

#[test]
fn keep_cells_relabels_vertices_in_order() {
    let mesh = two_quads();
    let kept = mesh.keep_cells(&[1]).unwrap();

    assert_eq!(
        kept.vertices(),
        &[
            Point2::new(1.0, 1.0),
            Point2::new(2.0, 1.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0)
        ]
    );
    assert_eq!(kept.connectivity(), &[Quad4d2Connectivity([2, 3, 1, 0])]);
    assert_eq!(kept.cell_vertices(0), mesh.cell_vertices(1));

    assert!(mesh.keep_cells(&[2]).is_err());
}

#[test]
fn stacked_blocks_are_disjoint() {
    let mesh = create_stacked_blocks_quad_mesh_2d(5, 3, 1, 0.5);
    assert_eq!(mesh.num_cells(), 8);
    assert_eq!(mesh.vertices().len(), 12 + 8);

    // The top face of the lower body is at y = 0, the bottom face of the upper body at y = 0.5
    let lower_top = mesh.connectivity()[0].get_face_connectivity(2).unwrap();
    assert!(lower_top
        .vertex_indices()
        .iter()
        .all(|&v| mesh.vertices()[v].y == 0.0));
    let upper_bottom = mesh.connectivity()[5].get_face_connectivity(0).unwrap();
    assert!(upper_bottom
        .vertex_indices()
        .iter()
        .all(|&v| mesh.vertices()[v].y == 0.5));

    let topology = mesh.compute_facet_topology();
    // 5 cells: 16 facets, 3 cells: 10 facets
    assert_eq!(topology.num_facets(), 26);
}

#[test]
fn split_into_triangles_preserves_vertices() {
    let mesh = two_quads();
    let num_vertices = mesh.vertices().len();
    let triangles = mesh.split_into_triangles();
    assert_eq!(triangles.num_cells(), 4);
    assert_eq!(triangles.vertices().len(), num_vertices);
    // 7 quad edges plus one diagonal per quad
    assert_eq!(triangles.compute_facet_topology().num_facets(), 9);
}

proptest! {
    #[test]
    fn uniform_quad_mesh_facet_counts(units_x in 1..5usize, units_y in 1..5usize, cells_per_unit in 1..3usize) {
        let mesh = create_rectangular_uniform_quad_mesh_2d(1.0, units_x, units_y, cells_per_unit, &Vector2::zeros());
        let nx = units_x * cells_per_unit;
        let ny = units_y * cells_per_unit;
        let topology = mesh.compute_facet_topology();

        prop_assert_eq!(mesh.num_cells(), nx * ny);
        prop_assert_eq!(topology.num_facets(), nx * (ny + 1) + ny * (nx + 1));
        prop_assert_eq!(topology.exterior_facets().len(), 2 * (nx + ny));
    }
}

#[test]
fn translate_moves_all_vertices() {
    let mut mesh = two_quads();
    mesh.translate(&Vector2::new(1.0, -2.0));
    assert_eq!(mesh.vertices()[0], Point2::new(1.0, -1.0));
    assert_eq!(mesh.vertices()[5], Point2::new(3.0, -2.0));
}
