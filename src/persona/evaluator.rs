//! Persona evaluator
//!
//! Turns a scorer's raw breakdown into a final verdict: applies the
//! persona's behavioral bias around the neutral midpoint, clamps to
//! [0,100], and writes a short rationale from the top contributions.

use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{ImageDescription, PersonaVerdict, Variant};

use super::scorer::{ScoreBreakdown, Scorer, NEUTRAL_SCORE};
use super::{capitalize, PersonaProfile};

/// Evaluates one (persona, description) pair into a verdict
pub struct PersonaEvaluator {
    scorer: Arc<dyn Scorer>,
}

impl PersonaEvaluator {
    pub fn new(scorer: Arc<dyn Scorer>) -> Self {
        Self { scorer }
    }

    /// Evaluate one persona against one variant's description
    pub async fn evaluate(
        &self,
        profile: &PersonaProfile,
        description: &ImageDescription,
        variant: Variant,
    ) -> Result<PersonaVerdict> {
        let breakdown = self
            .scorer
            .score(profile, description)
            .await
            .map_err(|e| Error::evaluation(&profile.name, variant, e.to_string()))?;

        if breakdown.matched_attributes == 0 {
            debug!(persona = %profile.name, variant = %variant, "No scoring signal, neutral verdict");
            return Ok(PersonaVerdict::new(
                &profile.name,
                variant,
                NEUTRAL_SCORE,
                format!(
                    "{} found nothing in this image that speaks to their priorities; neutral response.",
                    capitalize(&profile.name)
                ),
            ));
        }

        let biased =
            NEUTRAL_SCORE + (breakdown.raw_score - NEUTRAL_SCORE) * profile.bias.amplification();
        let rationale = build_rationale(profile, &breakdown);

        debug!(
            persona = %profile.name,
            variant = %variant,
            raw = breakdown.raw_score,
            biased,
            "Persona verdict"
        );

        Ok(PersonaVerdict::new(&profile.name, variant, biased, rationale))
    }
}

/// Build a short rationale citing the top one or two contributions
fn build_rationale(profile: &PersonaProfile, breakdown: &ScoreBreakdown) -> String {
    let top: Vec<String> = breakdown
        .contributions
        .iter()
        .take(2)
        .map(|c| {
            let direction = if c.amount >= 0.0 { "+" } else { "-" };
            format!("{} ({}{:.2})", c.factor, direction, c.amount.abs())
        })
        .collect();

    if top.is_empty() {
        format!(
            "{} reacts as a {} buyer with no single factor standing out.",
            capitalize(&profile.name),
            profile.bias
        )
    } else {
        format!(
            "{} responds mainly to {} as a {} buyer.",
            capitalize(&profile.name),
            top.join(" and "),
            profile.bias
        )
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
