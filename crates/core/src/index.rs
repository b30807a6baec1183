use crate::traits::VectorIndex;
use crate::{IndexError, Neighbor};
use std::cmp::Ordering;

/// Exact brute-force index under squared Euclidean distance. Vectors are kept
/// in one contiguous row-major buffer.
#[derive(Debug, Clone)]
pub struct FlatL2Index {
    dimensions: usize,
    data: Vec<f32>,
}

pub fn squared_l2(left: &[f32], right: &[f32]) -> f32 {
    left.iter()
        .zip(right.iter())
        .map(|(a, b)| {
            let delta = a - b;
            delta * delta
        })
        .sum()
}

fn by_distance_then_id(left: &Neighbor, right: &Neighbor) -> Ordering {
    left.distance
        .total_cmp(&right.distance)
        .then(left.id.cmp(&right.id))
}

impl VectorIndex for FlatL2Index {
    fn build(vectors: Vec<Vec<f32>>) -> Result<Self, IndexError> {
        let dimensions = vectors.first().map(Vec::len).ok_or(IndexError::Empty)?;
        if dimensions == 0 {
            return Err(IndexError::ZeroDimension);
        }

        let mut data = Vec::with_capacity(dimensions * vectors.len());
        for (position, vector) in vectors.into_iter().enumerate() {
            if vector.len() != dimensions {
                return Err(IndexError::RaggedVectors {
                    position,
                    expected: dimensions,
                    actual: vector.len(),
                });
            }
            data.extend(vector);
        }

        Ok(Self { dimensions, data })
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError> {
        if query.len() != self.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions,
                actual: query.len(),
            });
        }

        let k = k.min(self.len());
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut neighbors: Vec<Neighbor> = self
            .rows()
            .enumerate()
            .map(|(id, row)| Neighbor {
                id,
                distance: squared_l2(row, query),
            })
            .collect();

        if k < neighbors.len() {
            neighbors.select_nth_unstable_by(k - 1, by_distance_then_id);
            neighbors.truncate(k);
        }
        neighbors.sort_by(by_distance_then_id);

        Ok(neighbors)
    }

    fn len(&self) -> usize {
        self.data.len() / self.dimensions
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn vector(&self, id: usize) -> Option<&[f32]> {
        let start = id.checked_mul(self.dimensions)?;
        self.data.get(start..start + self.dimensions)
    }
}

impl FlatL2Index {
    fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.dimensions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Result<FlatL2Index, IndexError> {
        FlatL2Index::build(vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 3.0],
            vec![-1.0, 0.0],
            vec![5.0, 5.0],
        ])
    }

    #[test]
    fn empty_build_fails() {
        assert_eq!(FlatL2Index::build(Vec::new()).err(), Some(IndexError::Empty));
    }

    #[test]
    fn zero_dimension_vectors_are_rejected() {
        let result = FlatL2Index::build(vec![Vec::new(), Vec::new()]);
        assert_eq!(result.err(), Some(IndexError::ZeroDimension));
    }

    #[test]
    fn ragged_vectors_are_rejected() {
        let result = FlatL2Index::build(vec![vec![1.0, 2.0], vec![1.0]]);
        assert_eq!(
            result.err(),
            Some(IndexError::RaggedVectors {
                position: 1,
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn exact_match_comes_first() -> Result<(), IndexError> {
        let index = sample()?;
        let hits = index.search(&[0.0, 3.0], 3)?;
        assert_eq!(hits[0], Neighbor { id: 2, distance: 0.0 });
        assert!(hits.windows(2).all(|pair| pair[0].distance <= pair[1].distance));
        Ok(())
    }

    #[test]
    fn ties_break_on_lower_id() -> Result<(), IndexError> {
        let index = sample()?;
        let hits = index.search(&[0.0, 0.0], 3)?;
        let ids: Vec<_> = hits.iter().map(|hit| hit.id).collect();
        assert_eq!(ids, vec![0, 1, 3]);
        assert_eq!(hits[1].distance, hits[2].distance);
        Ok(())
    }

    #[test]
    fn k_is_clamped_to_index_size() -> Result<(), IndexError> {
        let index = sample()?;
        let hits = index.search(&[4.0, 4.0], 50)?;
        assert_eq!(hits.len(), 5);
        assert_eq!(hits[0].id, 4);
        assert_eq!(hits[0].distance, 2.0);
        assert!(index.search(&[4.0, 4.0], 0)?.is_empty());
        Ok(())
    }

    #[test]
    fn partial_selection_matches_full_sort() -> Result<(), IndexError> {
        let vectors: Vec<Vec<f32>> = (0..40)
            .map(|seed| vec![((seed * 7) % 11) as f32, ((seed * 3) % 5) as f32])
            .collect();
        let index = FlatL2Index::build(vectors)?;
        let full = index.search(&[2.0, 1.0], index.len())?;
        let top = index.search(&[2.0, 1.0], 6)?;
        assert_eq!(top.as_slice(), &full[..6]);
        Ok(())
    }

    #[test]
    fn query_dimension_is_checked() -> Result<(), IndexError> {
        let index = sample()?;
        assert_eq!(
            index.search(&[1.0, 2.0, 3.0], 1).err(),
            Some(IndexError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        );
        Ok(())
    }

    #[test]
    fn stored_vectors_are_addressable_by_id() -> Result<(), IndexError> {
        let index = sample()?;
        assert_eq!(index.len(), 5);
        assert_eq!(index.dimensions(), 2);
        assert_eq!(index.vector(3), Some(&[-1.0, 0.0][..]));
        assert_eq!(index.vector(5), None);
        Ok(())
    }
}
