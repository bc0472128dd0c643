//! Reciprocal Rank Fusion.
//!
//! `score(id) = sum over ranked lists l of 1 / (k + rank_l(id) + 1)`,
//! with `rank_l(id)` the 0-indexed position of `id` in list `l`, and
//! ids absent from a list simply not contributing a term for it.

/// Tuning for [`reciprocal_rank_fusion`].
#[derive(Debug, Clone, Copy)]
pub struct RrfConfig {
    /// The `k` constant; larger values flatten the influence of rank.
    pub k: u32,
}

impl Default for RrfConfig {
    fn default() -> Self {
        Self { k: 60 }
    }
}

/// Fuses multiple ranked id lists into one score per id, sorted
/// descending by fused score (ties broken by first-seen order across
/// `ranked_lists`, for determinism).
#[must_use]
pub fn reciprocal_rank_fusion(ranked_lists: &[&[String]], config: RrfConfig) -> Vec<(String, f64)> {
    let mut scores: Vec<(String, f64)> = Vec::new();
    let mut index = std::collections::HashMap::new();

    for list in ranked_lists {
        for (rank, id) in list.iter().enumerate() {
            let contribution = 1.0 / (f64::from(config.k) + rank as f64 + 1.0);
            if let Some(&i) = index.get(id) {
                let (_, score): &mut (String, f64) = &mut scores[i];
                *score += contribution;
            } else {
                index.insert(id.clone(), scores.len());
                scores.push((id.clone(), contribution));
            }
        }
    }

    scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scores
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(s: &[&str]) -> Vec<String> {
        s.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn single_list_first_rank_scores_one_over_k_plus_one() {
        let list = ids(&["a", "b", "c"]);
        let fused = reciprocal_rank_fusion(&[&list], RrfConfig::default());
        assert!((fused[0].1 - 1.0 / 61.0).abs() < 1e-9);
    }

    #[test]
    fn agreement_across_lists_boosts_score() {
        let dense = ids(&["a", "b", "c"]);
        let sparse = ids(&["a", "c", "b"]);
        let fused = reciprocal_rank_fusion(&[&dense, &sparse], RrfConfig::default());
        assert_eq!(fused[0].0, "a");
    }

    #[test]
    fn fusion_is_deterministic() {
        let dense = ids(&["a", "b"]);
        let sparse = ids(&["b", "a"]);
        let first = reciprocal_rank_fusion(&[&dense, &sparse], RrfConfig::default());
        let second = reciprocal_rank_fusion(&[&dense, &sparse], RrfConfig::default());
        assert_eq!(first, second);
    }

    #[test]
    fn smaller_k_increases_rank_sensitivity() {
        let list = ids(&["a", "b"]);
        let loose = reciprocal_rank_fusion(&[&list], RrfConfig { k: 60 });
        let tight = reciprocal_rank_fusion(&[&list], RrfConfig { k: 1 });
        let loose_gap = loose[0].1 - loose[1].1;
        let tight_gap = tight[0].1 - tight[1].1;
        assert!(tight_gap > loose_gap);
    }
}
