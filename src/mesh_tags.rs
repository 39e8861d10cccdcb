//! Integer markers attached to mesh facets.
use crate::connectivity::Connectivity;
use crate::mesh::{FacetTopology, Mesh};
use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, DimName, OPoint, Scalar};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

/// Integer values attached to a subset of the facets of a mesh.
///
/// Tagged facet indices are stored sorted and without duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshTags {
    num_entities: usize,
    indices: Vec<usize>,
    values: Vec<i32>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MeshTagsError {
    IndexOutOfBounds { index: usize, num_entities: usize },
    ConflictingValues { index: usize, first: i32, second: i32 },
}

impl fmt::Display for MeshTagsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndexOutOfBounds { index, num_entities } => {
                write!(f, "tagged entity {index} is out of bounds ({num_entities} entities)")
            }
            Self::ConflictingValues { index, first, second } => {
                write!(f, "entity {index} is tagged with both {first} and {second}")
            }
        }
    }
}

impl Error for MeshTagsError {}

impl MeshTags {
    /// Creates tags from `(entity index, value)` pairs.
    ///
    /// Repeated pairs are accepted, but an entity tagged with two different values is an error.
    pub fn try_from_pairs<I>(num_entities: usize, pairs: I) -> Result<Self, MeshTagsError>
    where
        I: IntoIterator<Item = (usize, i32)>,
    {
        let mut pairs: Vec<_> = pairs.into_iter().collect();
        pairs.sort_unstable();
        pairs.dedup();

        if let Some(&(index, _)) = pairs.last() {
            if index >= num_entities {
                return Err(MeshTagsError::IndexOutOfBounds { index, num_entities });
            }
        }

        if let Some(window) = pairs.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(MeshTagsError::ConflictingValues {
                index: window[0].0,
                first: window[0].1,
                second: window[1].1,
            });
        }

        let (indices, values) = pairs.into_iter().unzip();
        Ok(Self {
            num_entities,
            indices,
            values,
        })
    }

    /// Tags exterior facets of a mesh by evaluating a function on the vertices of each facet.
    ///
    /// Facets for which `marker` returns `None` are left untagged.
    pub fn mark_exterior_facets<T, D, C, F>(mesh: &Mesh<T, D, C>, topology: &FacetTopology, mut marker: F) -> Self
    where
        T: Scalar,
        D: DimName,
        C: Connectivity,
        F: FnMut(&[OPoint<T, D>]) -> Option<i32>,
        DefaultAllocator: Allocator<T, D>,
    {
        let mut facet_vertices = Vec::new();
        let mut indices = Vec::new();
        let mut values = Vec::new();
        for facet_index in topology.exterior_facets() {
            let pairs = topology
                .facet_cells(facet_index)
                .expect("Exterior facet must be in bounds");
            let face = mesh.connectivity()[pairs[0]]
                .get_face_connectivity(pairs[1])
                .expect("Local facet index from topology is in bounds");
            facet_vertices.clear();
            facet_vertices.extend(
                face.vertex_indices()
                    .iter()
                    .map(|&v| mesh.vertices()[v].clone()),
            );
            if let Some(value) = marker(&facet_vertices) {
                indices.push(facet_index);
                values.push(value);
            }
        }

        Self {
            num_entities: topology.num_facets(),
            indices,
            values,
        }
    }

    pub fn num_entities(&self) -> usize {
        self.num_entities
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn values(&self) -> &[i32] {
        &self.values
    }

    /// Returns the sorted indices of all entities tagged with `value`.
    pub fn find(&self, value: i32) -> Vec<usize> {
        self.indices
            .iter()
            .zip(&self.values)
            .filter(|(_, &v)| v == value)
            .map(|(&index, _)| index)
            .collect()
    }
}
