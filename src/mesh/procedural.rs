//! Basic procedural mesh generation routines.
use crate::connectivity::Quad4d2Connectivity;
use crate::mesh::QuadMesh2d;
use nalgebra::{Point2, RealField, Vector2};

/// Generates an axis-aligned rectangular uniform mesh given a unit length,
/// dimensions as multipliers of the unit length and the number of cells per unit length.
///
/// Vertices are numbered row by row starting from `top_left`, and cells are numbered row by row
/// from the top. Each quad lists its vertices counter-clockwise starting from the bottom left.
pub fn create_rectangular_uniform_quad_mesh_2d<T>(
    unit_length: T,
    units_x: usize,
    units_y: usize,
    cells_per_unit: usize,
    top_left: &Vector2<T>,
) -> QuadMesh2d<T>
where
    T: RealField,
{
    if cells_per_unit == 0 || units_x == 0 || units_y == 0 {
        QuadMesh2d::from_vertices_and_connectivity(Vec::new(), Vec::new())
    } else {
        let mut vertices = Vec::new();
        let mut cells = Vec::new();

        let cells_per_unit_as_t = T::from_usize(cells_per_unit).expect("Must be able to fit usize in T");
        let cell_size = unit_length / cells_per_unit_as_t;
        let num_cells_x = units_x * cells_per_unit;
        let num_cells_y = units_y * cells_per_unit;

        let to_global_vertex_index = |i, j| (num_cells_x + 1) * j + i;

        for j in 0..=num_cells_y {
            for i in 0..=num_cells_x {
                let i_as_t = T::from_usize(i).expect("Must be able to fit usize in T");
                let j_as_t = T::from_usize(j).expect("Must be able to fit usize in T");
                let v = top_left + Vector2::new(i_as_t, -j_as_t) * cell_size.clone();
                vertices.push(Point2::from(v));
            }
        }

        for j in 0..num_cells_y {
            for i in 0..num_cells_x {
                cells.push(Quad4d2Connectivity([
                    to_global_vertex_index(i, j + 1),
                    to_global_vertex_index(i + 1, j + 1),
                    to_global_vertex_index(i + 1, j),
                    to_global_vertex_index(i, j),
                ]));
            }
        }

        QuadMesh2d::from_vertices_and_connectivity(vertices, cells)
    }
}

/// Creates two disjoint rectangular bodies stacked on top of each other.
///
/// The lower body covers `[0, units_x_lower] x [-1, 0]` and the upper body covers
/// `[0, units_x_upper] x [gap, gap + 1]`, both with unit cell size scaled by
/// `1 / cells_per_unit`. The cells of the lower body come first. The two bodies share no
/// vertices, so the top of the lower body and the bottom of the upper body are both exterior
/// boundaries and form a natural pair of contact surfaces.
pub fn create_stacked_blocks_quad_mesh_2d<T>(
    units_x_lower: usize,
    units_x_upper: usize,
    cells_per_unit: usize,
    gap: T,
) -> QuadMesh2d<T>
where
    T: RealField,
{
    let mut mesh =
        create_rectangular_uniform_quad_mesh_2d(T::one(), units_x_lower, 1, cells_per_unit, &Vector2::zeros());
    let upper = create_rectangular_uniform_quad_mesh_2d(
        T::one(),
        units_x_upper,
        1,
        cells_per_unit,
        &Vector2::new(T::zero(), gap + T::one()),
    );
    mesh.append(&upper);
    mesh
}
