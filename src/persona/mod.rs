//! Consumer persona profiles and scoring
//!
//! A persona is a weighted bundle of purchase-decision factors plus a
//! behavioral bias. The scorer matches image attributes against those
//! factors; the evaluator turns the raw signal into a final verdict.

mod affinity;
mod evaluator;
mod profile;
mod scorer;

pub use affinity::attribute_affinities;
pub use evaluator::PersonaEvaluator;
pub use profile::{
    all_builtin, by_name, capitalize, BehaviorBias, DecisionFactor, FactorWeight, PersonaProfile,
};
pub use scorer::{AffinityScorer, FactorContribution, MockScorer, ScoreBreakdown, Scorer};
