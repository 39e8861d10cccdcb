//! Quadrature rules on the facets of reference cells.
use crate::connectivity::ReferenceCellConnectivity;
use crate::Real;
use eyre::eyre;
use fenris_quadrature::{polyquad, univariate};
use nalgebra::allocator::Allocator;
use nalgebra::{convert, DefaultAllocator, DimName, OPoint};

/// A quadrature rule for the facets of a reference cell.
///
/// The same rule is used for every facet. Weights refer to the parametric domain of the
/// reference facet: `[0, 1]` for segments and the unit triangle for triangles, so they sum to
/// 1 and 1/2 respectively. Points are given for each local facet in the coordinates of the
/// reference cell.
#[derive(Debug, Clone, PartialEq)]
pub struct FacetQuadrature<T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    degree: usize,
    weights: Vec<T>,
    points: Vec<Vec<OPoint<T, D>>>,
}

impl<T, D> FacetQuadrature<T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn weights(&self) -> &[T] {
        &self.weights
    }

    /// Number of quadrature points per facet.
    pub fn num_points(&self) -> usize {
        self.weights.len()
    }

    pub fn num_facets(&self) -> usize {
        self.points.len()
    }

    /// Quadrature points on the given local facet, in reference cell coordinates.
    pub fn facet_points(&self, local_facet: usize) -> Option<&[OPoint<T, D>]> {
        self.points.get(local_facet).map(Vec::as_slice)
    }
}

/// Parametric rule `(weights, barycentric-like parameters)` on a reference facet.
type FacetRule = (Vec<f64>, Vec<Vec<f64>>);

fn segment_rule(degree: usize) -> FacetRule {
    // Gauss with n points is exact for polynomials of degree 2n - 1
    let num_points = degree / 2 + 1;
    let (weights, points) = univariate::gauss(num_points);
    let weights = weights.into_iter().map(|w| 0.5 * w).collect();
    let params = points
        .into_iter()
        .map(|[xi]| vec![0.5 * (xi + 1.0)])
        .collect();
    (weights, params)
}

fn triangle_rule(degree: usize) -> eyre::Result<FacetRule> {
    // polyquad rules live on the triangle (-1, -1), (1, -1), (-1, 1)
    let (weights, points) = polyquad::triangle(degree)
        .map_err(|err| eyre!("no triangle quadrature of degree {} available: {}", degree, err))?;
    let weights = weights.into_iter().map(|w| 0.25 * w).collect();
    let params = points
        .into_iter()
        .map(|[x, y]| vec![0.5 * (x + 1.0), 0.5 * (y + 1.0)])
        .collect();
    Ok((weights, params))
}

/// Builds a facet quadrature rule of the given polynomial degree for the reference cell of `C`.
pub fn reference_facet_quadrature<T, C>(degree: usize) -> eyre::Result<FacetQuadrature<T, C::ReferenceDim>>
where
    T: Real,
    C: ReferenceCellConnectivity<T>,
    DefaultAllocator: Allocator<T, C::ReferenceDim>,
{
    let reference_vertices = C::reference_vertices();
    let (weights, params) = match C::local_face_vertices(0).map(<[usize]>::len) {
        Some(2) => segment_rule(degree),
        Some(3) => triangle_rule(degree)?,
        Some(n) => return Err(eyre!("unsupported reference facet with {} vertices", n)),
        None => (Vec::new(), Vec::new()),
    };

    let mut points = Vec::new();
    let mut local_facet = 0;
    while let Some(face_vertices) = C::local_face_vertices(local_facet) {
        // x = v0 + sum_k s_k (v_{k+1} - v0)
        let v0 = &reference_vertices[face_vertices[0]];
        let facet_points = params
            .iter()
            .map(|param| {
                let mut x = v0.clone();
                for (s, &vertex) in param.iter().zip(&face_vertices[1..]) {
                    let edge = &reference_vertices[vertex] - v0;
                    x += edge * convert::<f64, T>(*s);
                }
                x
            })
            .collect();
        points.push(facet_points);
        local_facet += 1;
    }

    Ok(FacetQuadrature {
        degree,
        weights: weights.into_iter().map(convert).collect(),
        points,
    })
}
