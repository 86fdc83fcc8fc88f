//! Persona scoring
//!
//! The Scorer trait is the compute seam between a persona profile and an
//! image description. The default AffinityScorer is local and pure; a
//! MockScorer supports score pinning and failure injection in tests.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::types::ImageDescription;

use super::{attribute_affinities, DecisionFactor, PersonaProfile};

/// Neutral midpoint of the score scale
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Gain applied to the summed factor signal when mapping to [0,100]
const SIGNAL_GAIN: f64 = 100.0;

/// One factor's aggregate contribution to a raw score
#[derive(Debug, Clone, PartialEq)]
pub struct FactorContribution {
    pub factor: DecisionFactor,
    pub amount: f64,
}

/// Raw scoring output before bias shaping
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    /// Unbiased score centered on 50
    pub raw_score: f64,

    /// Per-factor contributions, sorted by descending magnitude
    pub contributions: Vec<FactorContribution>,

    /// Number of attributes that produced any signal for this persona
    pub matched_attributes: usize,
}

/// Compute seam for persona scoring
#[async_trait]
pub trait Scorer: Send + Sync {
    /// Score one image description through one persona's decision weights
    async fn score(
        &self,
        profile: &PersonaProfile,
        description: &ImageDescription,
    ) -> Result<ScoreBreakdown>;
}

// ─────────────────────────────────────────────────────────────────
// Affinity Scorer
// ─────────────────────────────────────────────────────────────────

/// Default scorer: weighted sum over the attribute affinity table
#[derive(Debug, Default, Clone)]
pub struct AffinityScorer;

impl AffinityScorer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Scorer for AffinityScorer {
    async fn score(
        &self,
        profile: &PersonaProfile,
        description: &ImageDescription,
    ) -> Result<ScoreBreakdown> {
        let mut per_factor: HashMap<DecisionFactor, f64> = HashMap::new();
        let mut matched_attributes = 0usize;

        for attribute in &description.attributes {
            let affinities = attribute_affinities(&attribute.tag);
            let confidence = attribute
                .confidence
                .map(|c| c.clamp(0.0, 1.0) as f64)
                .unwrap_or(1.0);

            let mut matched = false;
            for (factor, affinity) in affinities {
                let weight = profile.weight(*factor);
                if weight == 0.0 {
                    continue;
                }
                matched = true;
                *per_factor.entry(*factor).or_insert(0.0) += weight * affinity * confidence;
            }
            if matched {
                matched_attributes += 1;
            }
        }

        let signal: f64 = per_factor.values().sum();
        let raw_score = NEUTRAL_SCORE + SIGNAL_GAIN * signal;

        let mut contributions: Vec<FactorContribution> = per_factor
            .into_iter()
            .map(|(factor, amount)| FactorContribution { factor, amount })
            .collect();
        contributions.sort_by(|a, b| {
            b.amount
                .abs()
                .partial_cmp(&a.amount.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(ScoreBreakdown {
            raw_score,
            contributions,
            matched_attributes,
        })
    }
}

// ─────────────────────────────────────────────────────────────────
// Mock Scorer
// ─────────────────────────────────────────────────────────────────

/// Mock scorer with pinned scores and failure injection.
/// Keys are (persona name, description caption).
pub struct MockScorer {
    scores: RwLock<HashMap<(String, String), f64>>,
    failures: RwLock<HashMap<(String, String), String>>,
    delay: RwLock<Option<Duration>>,
}

impl MockScorer {
    pub fn new() -> Self {
        Self {
            scores: RwLock::new(HashMap::new()),
            failures: RwLock::new(HashMap::new()),
            delay: RwLock::new(None),
        }
    }

    /// Pin a raw score for a (persona, caption) pair
    pub fn with_score(self, persona: &str, caption: &str, score: f64) -> Self {
        self.scores
            .write()
            .insert((persona.to_string(), caption.to_string()), score);
        self
    }

    /// Inject a failure for a (persona, caption) pair
    pub fn with_failure(self, persona: &str, caption: &str, message: &str) -> Self {
        self.failures
            .write()
            .insert((persona.to_string(), caption.to_string()), message.to_string());
        self
    }

    /// Delay every score call, for cancellation and timeout tests
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.write() = Some(delay);
        self
    }
}

impl Default for MockScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Scorer for MockScorer {
    async fn score(
        &self,
        profile: &PersonaProfile,
        description: &ImageDescription,
    ) -> Result<ScoreBreakdown> {
        let delay = *self.delay.read();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let key = (profile.name.clone(), description.caption.clone());

        if let Some(message) = self.failures.read().get(&key) {
            return Err(Error::Internal(message.clone()));
        }

        let raw_score = self
            .scores
            .read()
            .get(&key)
            .copied()
            .unwrap_or(NEUTRAL_SCORE);

        Ok(ScoreBreakdown {
            raw_score,
            contributions: vec![],
            matched_attributes: 1,
        })
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
