//! Attribute-to-factor affinity table
//!
//! Maps image attribute tags to the decision factors they speak to.
//! Affinities are in [-1, 1]; negative values mean the tag actively
//! repels personas who care about that factor (e.g. "luxury" vs
//! value-for-money).

use super::DecisionFactor;

use DecisionFactor::*;

/// (tag, [(factor, affinity)]) pairs. Lookup is by normalized tag.
const AFFINITY_TABLE: &[(&str, &[(DecisionFactor, f64)])] = &[
    // Family and safety
    ("family-safe", &[(Safety, 0.9), (FamilyBenefit, 0.8)]),
    ("family", &[(FamilyBenefit, 0.9)]),
    ("child-friendly", &[(Safety, 0.8), (FamilyBenefit, 0.9)]),
    ("certified", &[(Safety, 0.9), (Quality, 0.5)]),
    // Price positioning
    ("budget", &[(ValueForMoney, 0.9)]),
    ("discount", &[(ValueForMoney, 0.8)]),
    ("value", &[(ValueForMoney, 0.9)]),
    ("premium", &[(Status, 0.9), (Quality, 0.6), (ValueForMoney, -0.4)]),
    ("luxury", &[(Status, 1.0), (ValueForMoney, -0.6)]),
    ("exclusive", &[(Status, 0.8), (SocialProof, 0.4)]),
    // Social signals
    ("trending", &[(SocialProof, 0.9), (Novelty, 0.7)]),
    ("popular", &[(SocialProof, 0.8)]),
    ("latest", &[(Novelty, 0.9), (Status, 0.5)]),
    // Complexity
    ("high-tech", &[(Performance, 0.8), (Novelty, 0.7), (Simplicity, -0.6)]),
    ("complex", &[(Simplicity, -0.8)]),
    ("simple", &[(Simplicity, 0.9)]),
    ("easy", &[(Simplicity, 0.8), (Convenience, 0.6)]),
    ("traditional", &[(Simplicity, 0.6)]),
    // Build quality
    ("durable", &[(Durability, 0.9), (Quality, 0.6)]),
    ("quality", &[(Quality, 0.9)]),
    ("reliable", &[(Quality, 0.7), (Durability, 0.6)]),
    ("practical", &[(ValueForMoney, 0.6), (Convenience, 0.6), (Necessity, 0.5)]),
    // Convenience
    ("convenient", &[(Convenience, 0.9)]),
    ("time-saving", &[(Convenience, 0.8), (FamilyBenefit, 0.4)]),
    // Health
    ("health", &[(Health, 0.9), (Necessity, 0.5)]),
    ("wellness", &[(Health, 0.8)]),
    ("comfort", &[(Health, 0.6), (Quality, 0.4)]),
    // Style and performance
    ("stylish", &[(Style, 0.9)]),
    ("sleek", &[(Style, 0.7), (Status, 0.4)]),
    ("sporty", &[(Performance, 0.7), (Style, 0.6)]),
    ("fast", &[(Performance, 0.8), (Convenience, 0.5)]),
    // Necessity
    ("essential", &[(Necessity, 0.9)]),
];

/// Look up the factor affinities for an attribute tag.
///
/// Tags are matched after lowercasing and converting spaces/underscores
/// to hyphens. Unknown tags return an empty slice and contribute no
/// signal.
pub fn attribute_affinities(tag: &str) -> &'static [(DecisionFactor, f64)] {
    let normalized = tag.trim().to_lowercase().replace([' ', '_'], "-");
    AFFINITY_TABLE
        .iter()
        .find(|(key, _)| *key == normalized)
        .map(|(_, affinities)| *affinities)
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_tag() {
        let affinities = attribute_affinities("family-safe");
        assert_eq!(affinities.len(), 2);
        assert!(affinities.contains(&(Safety, 0.9)));
    }

    #[test]
    fn test_normalized_lookup() {
        assert_eq!(
            attribute_affinities("Family Safe"),
            attribute_affinities("family-safe")
        );
        assert_eq!(
            attribute_affinities("high_tech"),
            attribute_affinities("high-tech")
        );
    }

    #[test]
    fn test_unknown_tag_is_empty() {
        assert!(attribute_affinities("holographic").is_empty());
    }

    #[test]
    fn test_negative_affinities() {
        let luxury = attribute_affinities("luxury");
        assert!(luxury
            .iter()
            .any(|(f, a)| *f == ValueForMoney && *a < 0.0));
    }

    #[test]
    fn test_affinities_in_range() {
        for (tag, affinities) in AFFINITY_TABLE {
            for (_, a) in affinities.iter() {
                assert!((-1.0..=1.0).contains(a), "{} affinity out of range", tag);
            }
        }
    }
}
