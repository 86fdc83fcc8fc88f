//! Persona profiles
//!
//! Defines the consumer persona data model and the three built-in
//! profiles the simulator ships with.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How strongly a persona's reactions deviate from neutral
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BehaviorBias {
    /// Dampens reactions; hard to impress, hard to put off
    Conservative,
    /// Amplifies reactions in both directions
    Impulsive,
    /// Slightly dampens reactions; deliberate decision-maker
    Cautious,
}

impl BehaviorBias {
    /// Multiplier applied to the distance from the neutral score
    pub fn amplification(&self) -> f64 {
        match self {
            BehaviorBias::Conservative => 0.6,
            BehaviorBias::Impulsive => 1.4,
            BehaviorBias::Cautious => 0.8,
        }
    }
}

impl fmt::Display for BehaviorBias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BehaviorBias::Conservative => "conservative",
            BehaviorBias::Impulsive => "impulsive",
            BehaviorBias::Cautious => "cautious",
        };
        write!(f, "{}", s)
    }
}

/// A purchase-decision factor a persona can weigh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecisionFactor {
    ValueForMoney,
    Safety,
    FamilyBenefit,
    Durability,
    Convenience,
    Status,
    Style,
    Performance,
    SocialProof,
    Novelty,
    Quality,
    Simplicity,
    Health,
    Necessity,
}

impl DecisionFactor {
    /// Stable kebab-case identifier
    pub fn slug(&self) -> &'static str {
        match self {
            DecisionFactor::ValueForMoney => "value-for-money",
            DecisionFactor::Safety => "safety",
            DecisionFactor::FamilyBenefit => "family-benefit",
            DecisionFactor::Durability => "durability",
            DecisionFactor::Convenience => "convenience",
            DecisionFactor::Status => "status",
            DecisionFactor::Style => "style",
            DecisionFactor::Performance => "performance",
            DecisionFactor::SocialProof => "social-proof",
            DecisionFactor::Novelty => "novelty",
            DecisionFactor::Quality => "quality",
            DecisionFactor::Simplicity => "simplicity",
            DecisionFactor::Health => "health",
            DecisionFactor::Necessity => "necessity",
        }
    }
}

impl fmt::Display for DecisionFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

/// One weighted decision factor in a profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorWeight {
    pub factor: DecisionFactor,
    pub weight: f64,
}

impl FactorWeight {
    pub fn new(factor: DecisionFactor, weight: f64) -> Self {
        Self { factor, weight }
    }
}

/// A consumer persona: identity, spending limits, and decision weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaProfile {
    /// Lowercase unique name (e.g. "sarah")
    pub name: String,

    /// One-line description of who this persona is
    pub archetype: String,

    /// Reaction shape applied to the raw score
    pub bias: BehaviorBias,

    /// Monthly discretionary budget in dollars
    pub monthly_budget: u32,

    /// Largest single purchase this persona would consider
    pub max_single_purchase: u32,

    /// Decision factors and their weights (sum to 1.0 for built-ins)
    pub factors: Vec<FactorWeight>,
}

impl PersonaProfile {
    /// The weight this persona gives a factor (0.0 when absent)
    pub fn weight(&self, factor: DecisionFactor) -> f64 {
        self.factors
            .iter()
            .find(|fw| fw.factor == factor)
            .map(|fw| fw.weight)
            .unwrap_or(0.0)
    }
}

impl FromStr for PersonaProfile {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        by_name(s).ok_or_else(|| format!("Unknown persona '{}'", s))
    }
}

// ─────────────────────────────────────────────────────────────────
// Built-in Personas
// ─────────────────────────────────────────────────────────────────

/// Sarah: budget-conscious parent of two, cautious buyer
pub fn sarah() -> PersonaProfile {
    PersonaProfile {
        name: "sarah".to_string(),
        archetype: "Budget-conscious parent of two looking for safe, practical buys".to_string(),
        bias: BehaviorBias::Cautious,
        monthly_budget: 200,
        max_single_purchase: 100,
        factors: vec![
            FactorWeight::new(DecisionFactor::Safety, 0.25),
            FactorWeight::new(DecisionFactor::ValueForMoney, 0.25),
            FactorWeight::new(DecisionFactor::FamilyBenefit, 0.20),
            FactorWeight::new(DecisionFactor::Durability, 0.15),
            FactorWeight::new(DecisionFactor::Convenience, 0.10),
            FactorWeight::new(DecisionFactor::Necessity, 0.05),
        ],
    }
}

/// Jake: young professional chasing status and the latest trends
pub fn jake() -> PersonaProfile {
    PersonaProfile {
        name: "jake".to_string(),
        archetype: "Young professional drawn to trends, style, and status".to_string(),
        bias: BehaviorBias::Impulsive,
        monthly_budget: 800,
        max_single_purchase: 500,
        factors: vec![
            FactorWeight::new(DecisionFactor::Status, 0.25),
            FactorWeight::new(DecisionFactor::Style, 0.20),
            FactorWeight::new(DecisionFactor::Performance, 0.20),
            FactorWeight::new(DecisionFactor::Novelty, 0.15),
            FactorWeight::new(DecisionFactor::SocialProof, 0.10),
            FactorWeight::new(DecisionFactor::Convenience, 0.10),
        ],
    }
}

/// Robert: retiree on a fixed income valuing quality and simplicity
pub fn robert() -> PersonaProfile {
    PersonaProfile {
        name: "robert".to_string(),
        archetype: "Retiree on a fixed income who values quality and simplicity".to_string(),
        bias: BehaviorBias::Conservative,
        monthly_budget: 150,
        max_single_purchase: 75,
        factors: vec![
            FactorWeight::new(DecisionFactor::ValueForMoney, 0.25),
            FactorWeight::new(DecisionFactor::Necessity, 0.20),
            FactorWeight::new(DecisionFactor::Quality, 0.20),
            FactorWeight::new(DecisionFactor::Health, 0.15),
            FactorWeight::new(DecisionFactor::Simplicity, 0.10),
            FactorWeight::new(DecisionFactor::Durability, 0.10),
        ],
    }
}

/// All built-in personas, in declaration order
pub fn all_builtin() -> Vec<PersonaProfile> {
    vec![sarah(), jake(), robert()]
}

/// Look up a built-in persona by name (case-insensitive)
pub fn by_name(name: &str) -> Option<PersonaProfile> {
    let name = name.trim().to_lowercase();
    all_builtin().into_iter().find(|p| p.name == name)
}

/// Capitalize a persona name for display in rationales and recommendations
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
