//! Auto-priority re-ranking (§4.5.8): the progress-mode step function and
//! the balanced-mode periodic re-score.

use crate::priority::Priority;
use std::collections::HashMap;
use std::hash::Hash;

/// The default interval between balanced-mode re-scoring passes.
pub const AUTOPRIO_INTERVAL_MS: u64 = 10 * 60 * 1000;

/// Progress-mode auto-priority (§4.5.8): a step function of percent done.
/// A paused file/bundle is never passed here - callers check
/// `!priority.is_paused()` first (§9 Open Question 1: a forced pause is
/// never touched by auto-priority).
#[must_use]
pub fn progress_priority(percent_done: f64) -> Priority {
    if percent_done >= 80.0 {
        Priority::Highest
    } else if percent_done >= 50.0 {
        Priority::High
    } else if percent_done >= 20.0 {
        Priority::Normal
    } else {
        Priority::Low
    }
}

/// One candidate's inputs to a balanced-mode re-score pass (§4.5.8): its
/// measured transfer speed and current source count.
#[derive(Clone, Copy, Debug)]
pub struct BalancedCandidate<Id> {
    /// The bundle or file identifier this score applies to.
    pub id: Id,
    /// Current measured transfer speed, bytes/sec.
    pub speed: f64,
    /// Current source count.
    pub sources: u32,
}

/// Runs one balanced-mode re-score pass (§4.5.8): `points =
/// 100*(speed/max_speed) + 100*(sources/max_sources)`, sorted and split
/// into three equal groups mapped to `{High, Normal, Low}`, with ties
/// sharing a rank (never splitting two equally-scored candidates across a
/// group boundary).
///
/// Returns an empty map - "keep the previous priority" - when fewer than
/// three distinct scores are present, since there's no meaningful 3-way
/// split to make (§4.5.8: "Bundles/files not matching enough unique
/// scores keep their previous priority").
pub fn balanced_priorities<Id: Copy + Eq + Hash>(candidates: &[BalancedCandidate<Id>]) -> HashMap<Id, Priority> {
    if candidates.is_empty() {
        return HashMap::new();
    }

    let max_speed = candidates.iter().map(|c| c.speed).fold(0.0_f64, f64::max).max(f64::MIN_POSITIVE);
    let max_sources = candidates.iter().map(|c| c.sources).max().unwrap_or(0).max(1);

    let mut scored: Vec<(Id, f64)> = candidates
        .iter()
        .map(|c| {
            let score = 100.0 * (c.speed / max_speed) + 100.0 * (f64::from(c.sources) / f64::from(max_sources));
            (c.id, score)
        })
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let unique_scores = {
        let mut scores: Vec<f64> = scored.iter().map(|(_, s)| *s).collect();
        scores.dedup_by(|a, b| (*a - *b).abs() < f64::EPSILON);
        scores.len()
    };
    if unique_scores < 3 {
        return HashMap::new();
    }

    let total = scored.len();
    let third = total.div_ceil(3);
    let mut result = HashMap::with_capacity(total);
    let mut index = 0;
    for group_priority in [Priority::High, Priority::Normal, Priority::Low] {
        if index >= total {
            break;
        }
        let mut end = (index + third).min(total);
        // Extend the group so a tie at the boundary never splits across
        // two priority groups.
        while end < total && (scored[end].1 - scored[end - 1].1).abs() < f64::EPSILON {
            end += 1;
        }
        for (id, _) in &scored[index..end] {
            result.insert(*id, group_priority);
        }
        index = end;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_mode_follows_the_spec_step_function() {
        assert_eq!(progress_priority(0.0), Priority::Low);
        assert_eq!(progress_priority(19.9), Priority::Low);
        assert_eq!(progress_priority(20.0), Priority::Normal);
        assert_eq!(progress_priority(49.9), Priority::Normal);
        assert_eq!(progress_priority(50.0), Priority::High);
        assert_eq!(progress_priority(79.9), Priority::High);
        assert_eq!(progress_priority(80.0), Priority::Highest);
        assert_eq!(progress_priority(100.0), Priority::Highest);
    }

    #[test]
    fn balanced_mode_splits_into_three_equal_groups() {
        let candidates = vec![
            BalancedCandidate { id: 1, speed: 1000.0, sources: 10 },
            BalancedCandidate { id: 2, speed: 800.0, sources: 8 },
            BalancedCandidate { id: 3, speed: 600.0, sources: 6 },
            BalancedCandidate { id: 4, speed: 400.0, sources: 4 },
            BalancedCandidate { id: 5, speed: 200.0, sources: 2 },
            BalancedCandidate { id: 6, speed: 100.0, sources: 1 },
        ];
        let result = balanced_priorities(&candidates);
        assert_eq!(result[&1], Priority::High);
        assert_eq!(result[&2], Priority::High);
        assert_eq!(result[&5], Priority::Low);
        assert_eq!(result[&6], Priority::Low);
    }

    #[test]
    fn too_few_unique_scores_keeps_previous_priority() {
        let candidates = vec![
            BalancedCandidate { id: 1, speed: 100.0, sources: 1 },
            BalancedCandidate { id: 2, speed: 100.0, sources: 1 },
        ];
        assert!(balanced_priorities(&candidates).is_empty());
    }

    #[test]
    fn tied_scores_never_split_across_a_group_boundary() {
        let candidates = vec![
            BalancedCandidate { id: 1, speed: 100.0, sources: 10 },
            BalancedCandidate { id: 2, speed: 50.0, sources: 5 },
            BalancedCandidate { id: 3, speed: 50.0, sources: 5 },
            BalancedCandidate { id: 4, speed: 10.0, sources: 1 },
        ];
        let result = balanced_priorities(&candidates);
        assert_eq!(result[&2], result[&3]);
    }
}
