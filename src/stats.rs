//! Two-sample comparison
//!
//! Pure reduction from the two variants' verdicts to winner, confidence,
//! significance, and per-persona deltas. No randomness, no IO.

use crate::types::{PersonaDelta, PersonaVerdict, Variant, VariantAggregate, Winner};

/// Thresholds governing the comparison
#[derive(Debug, Clone)]
pub struct ComparisonPolicy {
    /// Relative gap (percent) the confidence must exceed for significance
    pub significance_threshold_pct: f64,

    /// Minimum successful verdicts per variant for significance
    pub min_sample_count: usize,

    /// Denominator floor guarding against division by zero
    pub epsilon: f64,
}

impl Default for ComparisonPolicy {
    fn default() -> Self {
        Self {
            significance_threshold_pct: 10.0,
            min_sample_count: 2,
            epsilon: 1e-9,
        }
    }
}

/// Output of comparing the two variants
#[derive(Debug, Clone)]
pub struct Comparison {
    pub aggregate_a: VariantAggregate,
    pub aggregate_b: VariantAggregate,

    /// Variant with the higher mean; exact equality is a tie
    pub winner: Winner,

    /// Signed relative gap in percent, positive when B leads
    pub confidence_pct: f64,

    /// Whether the gap and sample counts clear the policy thresholds
    pub significant: bool,

    /// Per-persona deltas (B minus A), declaration order, only for
    /// personas with a verdict on both variants
    pub deltas: Vec<PersonaDelta>,
}

/// Compare the two variants' verdicts.
///
/// `persona_order` is the declared panel order; deltas come out in that
/// order regardless of evaluation completion order.
pub fn compare(
    verdicts_a: &[PersonaVerdict],
    verdicts_b: &[PersonaVerdict],
    persona_order: &[String],
    policy: &ComparisonPolicy,
) -> Comparison {
    let aggregate_a = VariantAggregate::from_verdicts(verdicts_a);
    let aggregate_b = VariantAggregate::from_verdicts(verdicts_b);

    let mean_a = aggregate_a.average_score;
    let mean_b = aggregate_b.average_score;

    let winner = if mean_a == mean_b {
        Winner::Tie
    } else if mean_b > mean_a {
        Winner::B
    } else {
        Winner::A
    };

    let denominator = mean_a.max(mean_b).max(policy.epsilon);
    let confidence_pct = (mean_b - mean_a) / denominator * 100.0;

    let significant = confidence_pct.abs() > policy.significance_threshold_pct
        && aggregate_a.sample_count >= policy.min_sample_count
        && aggregate_b.sample_count >= policy.min_sample_count;

    let deltas = persona_order
        .iter()
        .filter_map(|persona| {
            let a = aggregate_a.persona_scores.get(persona)?;
            let b = aggregate_b.persona_scores.get(persona)?;
            let delta = b - a;
            Some(PersonaDelta {
                persona: persona.clone(),
                delta,
                preferred: if delta > 0.0 { Variant::B } else { Variant::A },
            })
        })
        .collect();

    Comparison {
        aggregate_a,
        aggregate_b,
        winner,
        confidence_pct,
        significant,
        deltas,
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
