use ght_core::{Descriptor, Match, Norm};
use rayon::prelude::*;

use crate::{MatchError, MatchResult};

/// Exhaustive nearest-neighbour search over descriptor sets
#[derive(Debug, Clone, Copy)]
pub struct BruteForceMatcher {
    norm: Norm,
}

impl BruteForceMatcher {
    pub fn new(norm: Norm) -> Self {
        Self { norm }
    }

    pub fn norm(&self) -> Norm {
        self.norm
    }

    /// Checks that `norm` fits the descriptor type and both sets share one dimension
    pub fn validate<D: Descriptor>(&self, query: &[D], train: &[D]) -> MatchResult<()> {
        if self.norm == Norm::Hamming && !D::BINARY {
            return Err(MatchError::UnsupportedNorm(self.norm));
        }

        let mut dims = query.iter().chain(train).map(Descriptor::dim);
        if let Some(expected) = dims.next() {
            if let Some(found) = dims.find(|&d| d != expected) {
                return Err(MatchError::DimensionMismatch { expected, found });
            }
        }
        Ok(())
    }

    /// For each query descriptor, up to `k` train candidates sorted by ascending distance.
    ///
    /// Equal distances keep the train index that was encountered first.
    pub fn knn_match<D: Descriptor>(
        &self,
        query: &[D],
        train: &[D],
        k: usize,
    ) -> MatchResult<Vec<Vec<Match>>> {
        if k == 0 {
            return Err(MatchError::InvalidK(k));
        }
        self.validate(query, train)?;

        if train.is_empty() {
            return Ok(vec![Vec::new(); query.len()]);
        }

        let norm = self.norm;
        Ok(query
            .par_iter()
            .enumerate()
            .map(|(qi, q)| {
                let mut best: Vec<Match> = Vec::with_capacity(k + 1);
                for (ti, t) in train.iter().enumerate() {
                    let d = q.distance(t, norm);
                    if best.len() == k && d >= best[k - 1].distance {
                        continue;
                    }
                    // Insert after every candidate at the same distance
                    let pos = best.partition_point(|m| m.distance <= d);
                    best.insert(pos, Match::new(qi, ti, d));
                    best.truncate(k);
                }
                best
            })
            .collect())
    }
}
