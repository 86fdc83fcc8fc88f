//! Recommendation synthesis
//!
//! Deterministic, rule-ordered recommendation strings derived from a
//! finished comparison. Same comparison in, same strings out.

use crate::persona::capitalize;
use crate::stats::Comparison;
use crate::types::{Variant, Winner};

/// Build the ranked recommendation list for a comparison.
///
/// Rule order:
/// 1. Winner statement, when the result is significant.
/// 2. One line per persona whose |delta| exceeds `delta_threshold`,
///    strongest first.
/// 3. A split-preference note when personas disagree on direction.
/// 4. An inconclusive fallback when the result is not significant.
pub fn recommend(comparison: &Comparison, delta_threshold: f64) -> Vec<String> {
    let mut recommendations = Vec::new();

    if comparison.significant {
        let winner = match comparison.winner {
            Winner::A => "A",
            Winner::B => "B",
            Winner::Tie => "neither",
        };
        recommendations.push(format!(
            "Variant {} performs better overall ({:.1}% higher average persona score); use it for the broader campaign.",
            winner,
            comparison.confidence_pct.abs()
        ));
    }

    let mut strong: Vec<_> = comparison
        .deltas
        .iter()
        .filter(|d| d.delta.abs() > delta_threshold)
        .collect();
    strong.sort_by(|a, b| {
        b.delta
            .abs()
            .partial_cmp(&a.delta.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    for delta in &strong {
        recommendations.push(format!(
            "{} strongly prefers variant {} (score difference {:.1} points).",
            capitalize(&delta.persona),
            delta.preferred,
            delta.delta.abs()
        ));
    }

    let prefers_a = comparison
        .deltas
        .iter()
        .any(|d| d.delta != 0.0 && d.preferred == Variant::A);
    let prefers_b = comparison
        .deltas
        .iter()
        .any(|d| d.delta != 0.0 && d.preferred == Variant::B);
    if prefers_a && prefers_b {
        recommendations.push(
            "Persona preferences are split between the variants; consider targeting each variant at its receptive segment."
                .to_string(),
        );
    }

    if !comparison.significant {
        recommendations.push(
            "Results are inconclusive; consider testing additional variants or a larger persona sample."
                .to_string(),
        );
    }

    recommendations
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{compare, ComparisonPolicy};
    use crate::types::PersonaVerdict;

    fn verdicts(variant: Variant, scores: &[(&str, f64)]) -> Vec<PersonaVerdict> {
        scores
            .iter()
            .map(|(persona, score)| PersonaVerdict::new(*persona, variant, *score, "r"))
            .collect()
    }

    fn panel() -> Vec<String> {
        vec!["sarah".to_string(), "jake".to_string(), "robert".to_string()]
    }

    fn scenario() -> Comparison {
        let a = verdicts(Variant::A, &[("sarah", 35.0), ("jake", 55.0), ("robert", 40.0)]);
        let b = verdicts(Variant::B, &[("sarah", 65.0), ("jake", 50.0), ("robert", 60.0)]);
        compare(&a, &b, &panel(), &ComparisonPolicy::default())
    }

    #[test]
    fn test_significant_winner_statement_first() {
        let recs = recommend(&scenario(), 15.0);

        assert!(recs[0].contains("Variant B performs better"));
        assert!(recs[0].contains("25.7%"));
    }

    #[test]
    fn test_strong_deltas_ranked() {
        let recs = recommend(&scenario(), 15.0);

        // Sarah (+30) and Robert (+20) cross the threshold, Jake (-5) does not
        assert!(recs[1].contains("Sarah"));
        assert!(recs[1].contains("variant B"));
        assert!(recs[1].contains("30.0"));
        assert!(recs[2].contains("Robert"));
        assert!(recs[2].contains("20.0"));
        assert!(!recs.iter().any(|r| r.contains("Jake")));
    }

    #[test]
    fn test_split_preference_statement() {
        let recs = recommend(&scenario(), 15.0);

        // Jake prefers A while sarah/robert prefer B
        assert!(recs.iter().any(|r| r.contains("split")));
    }

    #[test]
    fn test_inconclusive_fallback() {
        let a = verdicts(Variant::A, &[("sarah", 50.0), ("jake", 51.0)]);
        let b = verdicts(Variant::B, &[("sarah", 51.0), ("jake", 52.0)]);
        let cmp = compare(&a, &b, &panel(), &ComparisonPolicy::default());

        let recs = recommend(&cmp, 15.0);

        assert!(!recs.iter().any(|r| r.contains("performs better")));
        assert!(recs.last().unwrap().contains("inconclusive"));
    }

    #[test]
    fn test_deterministic_output() {
        let first = recommend(&scenario(), 15.0);
        let second = recommend(&scenario(), 15.0);
        assert_eq!(first, second);
    }

    #[test]
    fn test_tie_has_no_winner_statement() {
        let a = verdicts(Variant::A, &[("sarah", 50.0), ("jake", 50.0)]);
        let b = verdicts(Variant::B, &[("sarah", 50.0), ("jake", 50.0)]);
        let cmp = compare(&a, &b, &panel(), &ComparisonPolicy::default());

        let recs = recommend(&cmp, 15.0);

        assert_eq!(recs.len(), 1);
        assert!(recs[0].contains("inconclusive"));
    }
}
