//! Core data model for the A/B testing pipeline.
//!
//! Everything here is immutable once produced: descriptions are owned by one
//! run, verdicts are consumed only by the comparator, and the final report is
//! safe to serialize and hand to callers.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

// ─────────────────────────────────────────────────────────────────
// Variant
// ─────────────────────────────────────────────────────────────────

/// One of the two marketing image candidates being compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Variant {
    A,
    B,
}

impl Variant {
    /// Both variants, in report order.
    pub fn both() -> [Variant; 2] {
        [Variant::A, Variant::B]
    }

    /// Stable index used when reordering fan-out results.
    pub fn index(&self) -> usize {
        match self {
            Variant::A => 0,
            Variant::B => 1,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::A => write!(f, "A"),
            Variant::B => write!(f, "B"),
        }
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(Variant::A),
            "B" => Ok(Variant::B),
            _ => Err(format!("Unknown variant '{}'. Valid: A, B", s)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Image Reference
// ─────────────────────────────────────────────────────────────────

/// Image file extensions the describer accepts for local paths.
const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

/// A reference to a marketing image: an http(s) URL or a local file path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageRef {
    Url(Url),
    Path(PathBuf),
}

impl ImageRef {
    /// Parse and validate an image reference.
    ///
    /// URLs must use http or https. Local paths must carry a supported image
    /// extension; existence is checked later, when the file is read.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid_image(input, "empty reference"));
        }

        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            let url = Url::parse(trimmed)
                .map_err(|e| Error::invalid_image(trimmed, format!("malformed URL: {}", e)))?;
            return Ok(ImageRef::Url(url));
        }

        if trimmed.contains("://") {
            return Err(Error::invalid_image(
                trimmed,
                "unsupported URL scheme (only http and https are accepted)",
            ));
        }

        let path = PathBuf::from(shellexpand::tilde(trimmed).as_ref());
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()) => {
                Ok(ImageRef::Path(path))
            }
            Some(ext) => Err(Error::invalid_image(
                trimmed,
                format!("unsupported image format '.{}'", ext),
            )),
            None => Err(Error::invalid_image(trimmed, "missing file extension")),
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRef::Url(url) => write!(f, "{}", url),
            ImageRef::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Image Description
// ─────────────────────────────────────────────────────────────────

/// One detected attribute of a marketing image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAttribute {
    /// Lowercase kebab-case tag (e.g. "family-safe", "premium").
    pub tag: String,

    /// Detection confidence in [0,1], when the describer reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl ImageAttribute {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            confidence: None,
        }
    }

    pub fn with_confidence(tag: impl Into<String>, confidence: f32) -> Self {
        Self {
            tag: tag.into(),
            confidence: Some(confidence),
        }
    }
}

/// Structured description of one image, produced by the describer capability.
///
/// Owned by the orchestrator for the duration of one test run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageDescription {
    /// Free-text caption of the image.
    pub caption: String,

    /// Detected tags/attributes, used by persona scoring.
    #[serde(default)]
    pub attributes: Vec<ImageAttribute>,
}

impl ImageDescription {
    pub fn new(caption: impl Into<String>, attributes: Vec<ImageAttribute>) -> Self {
        Self {
            caption: caption.into(),
            attributes,
        }
    }

    /// True when the description carries no usable attributes.
    pub fn is_degenerate(&self) -> bool {
        self.attributes.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────
// Persona Verdict
// ─────────────────────────────────────────────────────────────────

/// One persona's judgment of one variant. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaVerdict {
    /// Persona name (matches `PersonaProfile::name`).
    pub persona: String,

    /// Which variant this verdict judges.
    pub variant: Variant,

    /// Conversion-likelihood proxy in [0,100]. Producers clamp.
    pub score: f64,

    /// Short rationale citing the top contributing factors.
    pub rationale: String,
}

impl PersonaVerdict {
    pub fn new(
        persona: impl Into<String>,
        variant: Variant,
        score: f64,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            persona: persona.into(),
            variant,
            score: score.clamp(0.0, 100.0),
            rationale: rationale.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Variant Aggregate
// ─────────────────────────────────────────────────────────────────

/// Per-variant rollup of all successful verdicts. Derived, never created
/// independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantAggregate {
    /// Arithmetic mean of the variant's verdict scores.
    pub average_score: f64,

    /// Per-persona score map (keys sorted for stable serialization).
    pub persona_scores: BTreeMap<String, f64>,

    /// Number of verdicts that fed this aggregate.
    pub sample_count: usize,
}

impl VariantAggregate {
    /// Build the aggregate from a variant's successful verdicts.
    pub fn from_verdicts(verdicts: &[PersonaVerdict]) -> Self {
        let persona_scores: BTreeMap<String, f64> = verdicts
            .iter()
            .map(|v| (v.persona.clone(), v.score))
            .collect();
        let sample_count = verdicts.len();
        let average_score = if sample_count == 0 {
            0.0
        } else {
            verdicts.iter().map(|v| v.score).sum::<f64>() / sample_count as f64
        };

        Self {
            average_score,
            persona_scores,
            sample_count,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Deltas and Failures
// ─────────────────────────────────────────────────────────────────

/// Score delta for a persona present in both variants (`score_b - score_a`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaDelta {
    pub persona: String,
    pub delta: f64,
    pub preferred: Variant,
}

/// A recorded evaluation failure.
///
/// `variant` is absent when the persona failed for both variants and was
/// excluded from the test entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationFailure {
    pub persona: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<Variant>,

    pub reason: String,
}

// ─────────────────────────────────────────────────────────────────
// Final Report
// ─────────────────────────────────────────────────────────────────

/// Outcome of the two-sample comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    A,
    B,
    #[serde(rename = "tie")]
    Tie,
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Winner::A => write!(f, "A"),
            Winner::B => write!(f, "B"),
            Winner::Tie => write!(f, "tie"),
        }
    }
}

/// Both variants' aggregates, keyed "A"/"B" in serialized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantReports {
    #[serde(rename = "A")]
    pub a: VariantAggregate,

    #[serde(rename = "B")]
    pub b: VariantAggregate,
}

/// The final immutable A/B test report. The sole externally visible artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbTestResult {
    /// Which variant won, derived deterministically from the aggregates.
    pub winner: Winner,

    /// Signed relative percentage gap between the aggregate means
    /// (positive when B leads).
    pub confidence_score: f64,

    /// True when the gap and both sample counts clear the configured
    /// thresholds.
    pub statistically_significant: bool,

    /// Per-variant aggregates.
    pub variants: VariantReports,

    /// Ranked, human-readable recommendation strings.
    pub recommendations: Vec<String>,

    /// Evaluation failures, in persona-declaration order.
    pub failures: Vec<EvaluationFailure>,
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_roundtrip() {
        assert_eq!("a".parse::<Variant>().unwrap(), Variant::A);
        assert_eq!("B".parse::<Variant>().unwrap(), Variant::B);
        assert!("C".parse::<Variant>().is_err());
        assert_eq!(serde_json::to_string(&Variant::A).unwrap(), "\"A\"");
    }

    #[test]
    fn test_image_ref_url() {
        let r = ImageRef::parse("https://example.com/banner.jpg").unwrap();
        assert!(matches!(r, ImageRef::Url(_)));

        // URLs without an extension are fine; many CDNs use query-driven URLs
        let r = ImageRef::parse("https://images.example.com/photo?w=800").unwrap();
        assert!(matches!(r, ImageRef::Url(_)));
    }

    #[test]
    fn test_image_ref_path() {
        let r = ImageRef::parse("assets/hero.png").unwrap();
        assert!(matches!(r, ImageRef::Path(_)));
    }

    #[test]
    fn test_image_ref_rejects_bad_input() {
        assert!(ImageRef::parse("").is_err());
        assert!(ImageRef::parse("ftp://example.com/x.png").is_err());
        assert!(ImageRef::parse("notes.txt").is_err());
        assert!(ImageRef::parse("no-extension").is_err());
    }

    #[test]
    fn test_verdict_clamps_score() {
        let v = PersonaVerdict::new("sarah", Variant::A, 130.0, "r");
        assert_eq!(v.score, 100.0);
        let v = PersonaVerdict::new("sarah", Variant::A, -5.0, "r");
        assert_eq!(v.score, 0.0);
    }

    #[test]
    fn test_aggregate_from_verdicts() {
        let verdicts = vec![
            PersonaVerdict::new("sarah", Variant::A, 35.0, "r"),
            PersonaVerdict::new("jake", Variant::A, 55.0, "r"),
            PersonaVerdict::new("robert", Variant::A, 40.0, "r"),
        ];
        let agg = VariantAggregate::from_verdicts(&verdicts);
        assert_eq!(agg.sample_count, 3);
        assert!((agg.average_score - 43.333).abs() < 0.01);
        assert_eq!(agg.persona_scores["jake"], 55.0);
    }

    #[test]
    fn test_aggregate_empty() {
        let agg = VariantAggregate::from_verdicts(&[]);
        assert_eq!(agg.sample_count, 0);
        assert_eq!(agg.average_score, 0.0);
    }

    #[test]
    fn test_winner_serialization() {
        assert_eq!(serde_json::to_string(&Winner::Tie).unwrap(), "\"tie\"");
        assert_eq!(serde_json::to_string(&Winner::B).unwrap(), "\"B\"");
    }

    #[test]
    fn test_result_json_shape() {
        let result = AbTestResult {
            winner: Winner::B,
            confidence_score: 25.7,
            statistically_significant: true,
            variants: VariantReports {
                a: VariantAggregate::from_verdicts(&[]),
                b: VariantAggregate::from_verdicts(&[]),
            },
            recommendations: vec!["Variant B performs better".to_string()],
            failures: vec![EvaluationFailure {
                persona: "jake".to_string(),
                variant: Some(Variant::A),
                reason: "scorer timeout".to_string(),
            }],
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["winner"], "B");
        assert!(json["variants"]["A"].is_object());
        assert!(json["variants"]["B"].is_object());
        assert_eq!(json["failures"][0]["variant"], "A");
    }

    #[test]
    fn test_failure_without_variant_omits_field() {
        let failure = EvaluationFailure {
            persona: "jake".to_string(),
            variant: None,
            reason: "both variants failed".to_string(),
        };
        let json = serde_json::to_value(&failure).unwrap();
        assert!(json.get("variant").is_none());
    }
}
