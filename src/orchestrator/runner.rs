//! Pipeline runner
//!
//! Owns the describe -> evaluate -> aggregate sequence for one test run.
//! Evaluations run concurrently under a semaphore; results are reordered
//! into persona declaration order before any aggregation, so the final
//! report never depends on task completion order.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::describer::SharedDescriber;
use crate::error::{Error, Result};
use crate::persona::{PersonaEvaluator, PersonaProfile};
use crate::recommend::recommend;
use crate::stats::{compare, ComparisonPolicy};
use crate::types::{
    AbTestResult, EvaluationFailure, ImageDescription, ImageRef, PersonaVerdict, Variant,
    VariantReports,
};

/// Result of one orchestrated run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// The final report
    pub result: AbTestResult,

    /// All successful verdicts in persona declaration order (A before B
    /// per persona), for detailed display
    pub verdicts: Vec<PersonaVerdict>,
}

/// Drives one complete A/B test run
pub struct Orchestrator {
    describer: SharedDescriber,
    evaluator: Arc<PersonaEvaluator>,
    policy: ComparisonPolicy,
    delta_threshold: f64,
    max_concurrent: usize,
}

impl Orchestrator {
    pub fn new(
        describer: SharedDescriber,
        evaluator: Arc<PersonaEvaluator>,
        policy: ComparisonPolicy,
        delta_threshold: f64,
        max_concurrent: usize,
    ) -> Self {
        Self {
            describer,
            evaluator,
            policy,
            delta_threshold,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Run a full A/B test over the given images and persona panel
    pub async fn run(
        &self,
        image_a: &ImageRef,
        image_b: &ImageRef,
        personas: &[PersonaProfile],
    ) -> Result<RunOutcome> {
        if personas.is_empty() {
            return Err(Error::pipeline_aborted("no personas selected for the run"));
        }

        let run_id = Uuid::new_v4();
        info!(
            %run_id,
            image_a = %image_a,
            image_b = %image_b,
            personas = personas.len(),
            "Starting A/B test run"
        );

        // Both descriptions must exist before any evaluation starts
        let (description_a, description_b) = tokio::try_join!(
            self.describer.describe(Variant::A, image_a),
            self.describer.describe(Variant::B, image_b),
        )
        .map_err(|e| match e {
            Error::DescriptionUnavailable { .. } => {
                Error::pipeline_aborted(format!("image description failed: {}", e))
            }
            other => other,
        })?;

        for (variant, description) in [(Variant::A, &description_a), (Variant::B, &description_b)] {
            if description.is_degenerate() {
                warn!(
                    %variant,
                    "description carries no attributes; personas will respond neutrally"
                );
            }
        }

        let description_a = Arc::new(description_a);
        let description_b = Arc::new(description_b);

        let mut results = self
            .fan_out(personas, description_a, description_b)
            .await;

        // Pair results back up in declaration order
        let mut verdicts_a = Vec::new();
        let mut verdicts_b = Vec::new();
        let mut all_verdicts = Vec::new();
        let mut failures = Vec::new();

        for (idx, profile) in personas.iter().enumerate() {
            let result_a = take_result(&mut results, idx, Variant::A, &profile.name);
            let result_b = take_result(&mut results, idx, Variant::B, &profile.name);

            match (result_a, result_b) {
                (Ok(a), Ok(b)) => {
                    all_verdicts.push(a.clone());
                    all_verdicts.push(b.clone());
                    verdicts_a.push(a);
                    verdicts_b.push(b);
                }
                (Ok(a), Err(e)) => {
                    warn!(persona = %profile.name, variant = %Variant::B, error = %e, "Evaluation failed");
                    all_verdicts.push(a.clone());
                    verdicts_a.push(a);
                    failures.push(EvaluationFailure {
                        persona: profile.name.clone(),
                        variant: Some(Variant::B),
                        reason: failure_reason(&e),
                    });
                }
                (Err(e), Ok(b)) => {
                    warn!(persona = %profile.name, variant = %Variant::A, error = %e, "Evaluation failed");
                    all_verdicts.push(b.clone());
                    verdicts_b.push(b);
                    failures.push(EvaluationFailure {
                        persona: profile.name.clone(),
                        variant: Some(Variant::A),
                        reason: failure_reason(&e),
                    });
                }
                (Err(ea), Err(eb)) => {
                    warn!(persona = %profile.name, error_a = %ea, error_b = %eb, "Persona excluded, both variants failed");
                    failures.push(EvaluationFailure {
                        persona: profile.name.clone(),
                        variant: None,
                        reason: format!(
                            "both variants failed: A: {}; B: {}",
                            failure_reason(&ea),
                            failure_reason(&eb)
                        ),
                    });
                }
            }
        }

        // A variant with zero verdicts cannot be aggregated
        if verdicts_a.is_empty() {
            return Err(Error::InsufficientData { variant: Variant::A });
        }
        if verdicts_b.is_empty() {
            return Err(Error::InsufficientData { variant: Variant::B });
        }

        let persona_order: Vec<String> = personas.iter().map(|p| p.name.clone()).collect();
        let comparison = compare(&verdicts_a, &verdicts_b, &persona_order, &self.policy);
        let recommendations = recommend(&comparison, self.delta_threshold);

        info!(
            %run_id,
            winner = %comparison.winner,
            confidence = comparison.confidence_pct,
            significant = comparison.significant,
            failures = failures.len(),
            "A/B test run finished"
        );

        Ok(RunOutcome {
            result: AbTestResult {
                winner: comparison.winner,
                confidence_score: comparison.confidence_pct,
                statistically_significant: comparison.significant,
                variants: VariantReports {
                    a: comparison.aggregate_a,
                    b: comparison.aggregate_b,
                },
                recommendations,
                failures,
            },
            verdicts: all_verdicts,
        })
    }

    /// Spawn all (persona, variant) evaluations under the concurrency cap
    /// and collect every outcome, keyed by (persona index, variant index).
    async fn fan_out(
        &self,
        personas: &[PersonaProfile],
        description_a: Arc<ImageDescription>,
        description_b: Arc<ImageDescription>,
    ) -> BTreeMap<(usize, usize), Result<PersonaVerdict>> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();

        for (idx, profile) in personas.iter().enumerate() {
            for variant in Variant::both() {
                let description = match variant {
                    Variant::A => Arc::clone(&description_a),
                    Variant::B => Arc::clone(&description_b),
                };
                let profile = profile.clone();
                let evaluator = Arc::clone(&self.evaluator);
                let semaphore = Arc::clone(&semaphore);

                tasks.spawn(async move {
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => {
                            return (
                                idx,
                                variant.index(),
                                Err(Error::Internal("evaluation pool closed".to_string())),
                            )
                        }
                    };
                    debug!(persona = %profile.name, variant = %variant, "Evaluating");
                    let result = evaluator.evaluate(&profile, &description, variant).await;
                    (idx, variant.index(), result)
                });
            }
        }

        let mut results = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, variant_idx, result)) => {
                    results.insert((idx, variant_idx), result);
                }
                Err(e) => {
                    warn!(error = %e, "Evaluation task aborted");
                }
            }
        }
        results
    }
}

/// Pull one (persona, variant) outcome out of the result map.
/// A missing entry means the task panicked or was aborted.
fn take_result(
    results: &mut BTreeMap<(usize, usize), Result<PersonaVerdict>>,
    idx: usize,
    variant: Variant,
    persona: &str,
) -> Result<PersonaVerdict> {
    results
        .remove(&(idx, variant.index()))
        .unwrap_or_else(|| {
            Err(Error::evaluation(
                persona,
                variant,
                "evaluation task did not complete",
            ))
        })
}

/// Extract a concise reason from an evaluation error
fn failure_reason(error: &Error) -> String {
    match error {
        Error::EvaluationError { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
