// src/scores/aggregate.rs
//! Critic / audience means over normalized scores.
//!
//! Every present source counts once; a source's own vote count stays opaque.

use serde::Serialize;

use super::{NormalizedScore, ScoreKind};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AggregateResult {
    pub critic: Option<f64>,
    pub audience: Option<f64>,
    pub critic_count: usize,
    pub audience_count: usize,
}

/// Arithmetic mean of the present values, rounded to one decimal and kept
/// inside `[min, max]` of those values. Returns `(None, 0)` when nothing is
/// present.
pub fn mean_of<I>(values: I) -> (Option<f64>, usize)
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut sum = 0.0f64;
    let mut n = 0usize;
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values.into_iter().flatten() {
        sum += v;
        n += 1;
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if n == 0 {
        return (None, 0);
    }
    (Some(round1(sum / n as f64).clamp(lo, hi)), n)
}

pub fn aggregate(scores: &[NormalizedScore]) -> AggregateResult {
    let side = |kind: ScoreKind| {
        mean_of(
            scores
                .iter()
                .filter(move |s| s.source.kind() == kind)
                .map(|s| s.value),
        )
    };
    let (critic, critic_count) = side(ScoreKind::Critic);
    let (audience, audience_count) = side(ScoreKind::Audience);
    AggregateResult {
        critic,
        audience,
        critic_count,
        audience_count,
    }
}

/// Ties to even on the exact binary value: 7.25 → 7.2, 0.35 → 0.3.
fn round1(x: f64) -> f64 {
    format!("{x:.1}").parse().unwrap_or(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scores::SourceId;

    #[test]
    fn empty_and_all_null_give_none() {
        assert_eq!(mean_of(Vec::<Option<f64>>::new()), (None, 0));
        assert_eq!(mean_of(vec![None, None]), (None, 0));
    }

    #[test]
    fn mean_of_two() {
        assert_eq!(mean_of(vec![Some(7.0), None, Some(9.0)]), (Some(8.0), 2));
    }

    #[test]
    fn halves_round_to_even() {
        assert_eq!(mean_of(vec![Some(7.0), Some(7.5)]), (Some(7.2), 2));
        assert_eq!(round1(0.35), 0.3);
        assert_eq!(round1(7.35), 7.3);
        assert_eq!(round1(7.75), 7.8);
        assert_eq!(round1(5.666), 5.7);
    }

    #[test]
    fn mean_stays_within_input_range() {
        let sets: [&[f64]; 5] = [
            &[0.0, 10.0, 3.3],
            &[6.7, 6.7, 6.7],
            &[9.1, 8.3, 7.5, 5.8],
            &[0.8],
            &[7.04, 7.04],
        ];
        for set in sets {
            let (m, n) = mean_of(set.iter().copied().map(Some));
            let m = m.unwrap();
            let lo = set.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = set.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            assert_eq!(n, set.len());
            assert!(m >= lo && m <= hi, "{m} not in [{lo}, {hi}]");
        }
    }

    #[test]
    fn splits_by_kind() {
        let scores = [
            NormalizedScore {
                source: SourceId::Metacritic,
                value: Some(7.5),
            },
            NormalizedScore {
                source: SourceId::RottenTomatoes,
                value: None,
            },
            NormalizedScore {
                source: SourceId::ImdbUsers,
                value: Some(8.5),
            },
            NormalizedScore {
                source: SourceId::CinemaScore,
                value: Some(7.5),
            },
        ];
        let agg = aggregate(&scores);
        assert_eq!(agg.critic, Some(7.5));
        assert_eq!(agg.critic_count, 1);
        assert_eq!(agg.audience, Some(8.0));
        assert_eq!(agg.audience_count, 2);
    }
}
