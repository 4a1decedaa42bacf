use ght_core::{Descriptor, FilterPolicy, Match, MatchConfig};

use crate::knn::BruteForceMatcher;
use crate::{MatchError, MatchResult};

/// Turns two descriptor sets into a list of unambiguous template→scene matches
#[derive(Debug, Clone)]
pub struct CorrespondenceFilter {
    policy: FilterPolicy,
    max_distance: Option<f32>,
}

impl CorrespondenceFilter {
    /// Creates a filter after checking the policy parameters
    pub fn new(policy: FilterPolicy) -> MatchResult<Self> {
        match policy {
            FilterPolicy::RatioTest { ratio } if !(ratio > 0.0 && ratio <= 1.0) => {
                return Err(MatchError::InvalidRatio(ratio));
            }
            FilterPolicy::CrossCheck { k: 0 } => return Err(MatchError::InvalidK(0)),
            _ => {}
        }
        Ok(Self { policy, max_distance: None })
    }

    pub fn from_config(cfg: &MatchConfig) -> MatchResult<Self> {
        Ok(Self::new(cfg.policy)?.with_max_distance(cfg.max_distance))
    }

    /// Drop accepted matches whose distance exceeds `max_distance`
    pub fn with_max_distance(mut self, max_distance: Option<f32>) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn policy(&self) -> FilterPolicy {
        self.policy
    }

    /// Filtered matches with `query_idx` into `template` and `train_idx` into `scene`
    pub fn filter<D: Descriptor>(
        &self,
        matcher: &BruteForceMatcher,
        template: &[D],
        scene: &[D],
    ) -> MatchResult<Vec<Match>> {
        if template.is_empty() || scene.is_empty() {
            log::debug!("empty descriptor set, no correspondences");
            return Ok(Vec::new());
        }

        let mut matches = match self.policy {
            FilterPolicy::RatioTest { ratio } => ratio_test(matcher, template, scene, ratio)?,
            FilterPolicy::CrossCheck { k } => cross_check(matcher, template, scene, k)?,
        };

        if let Some(limit) = self.max_distance {
            matches.retain(|m| m.distance <= limit);
        }

        log::debug!(
            "{:?}: kept {} of {} template descriptors",
            self.policy,
            matches.len(),
            template.len()
        );
        Ok(matches)
    }
}

fn ratio_test<D: Descriptor>(
    matcher: &BruteForceMatcher,
    template: &[D],
    scene: &[D],
    ratio: f32,
) -> MatchResult<Vec<Match>> {
    let knn = matcher.knn_match(template, scene, 2)?;
    Ok(knn
        .into_iter()
        .filter_map(|candidates| match candidates.as_slice() {
            // Written as a product so a zero second distance rejects instead of dividing
            [first, second] if first.distance < ratio * second.distance => Some(*first),
            _ => None,
        })
        .collect())
}

fn cross_check<D: Descriptor>(
    matcher: &BruteForceMatcher,
    template: &[D],
    scene: &[D],
    k: usize,
) -> MatchResult<Vec<Match>> {
    let forward = matcher.knn_match(template, scene, k)?;
    let backward = matcher.knn_match(scene, template, k)?;

    Ok(forward
        .iter()
        .filter_map(|candidates| {
            candidates.iter().copied().find(|fwd| {
                backward[fwd.train_idx]
                    .iter()
                    .any(|bwd| bwd.train_idx == fwd.query_idx)
            })
        })
        .collect())
}
