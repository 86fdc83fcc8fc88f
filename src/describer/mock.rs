//! Mock describer for testing
//!
//! Provides a deterministic ImageDescriber implementation with canned
//! responses and failure injection.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::types::{ImageAttribute, ImageDescription, ImageRef, Variant};

use super::ImageDescriber;

/// Tag vocabulary for generated descriptions
const TAG_VOCABULARY: &[&str] = &[
    "family-safe",
    "premium",
    "budget",
    "durable",
    "stylish",
    "high-tech",
    "simple",
    "trending",
    "practical",
    "quality",
];

/// Failure mode to inject for a given image reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    /// Transient description failure (as if the API were down)
    Unavailable,
    /// Permanent reference failure (as if the file were unreadable)
    InvalidReference,
}

/// Mock implementation of ImageDescriber for testing
pub struct MockDescriber {
    responses: RwLock<HashMap<String, ImageDescription>>,
    failures: RwLock<HashMap<String, MockFailure>>,
    call_count: RwLock<u32>,
}

impl MockDescriber {
    /// Create a new mock describer with no canned responses.
    /// Unknown references get a deterministic generated description.
    pub fn new() -> Self {
        Self {
            responses: RwLock::new(HashMap::new()),
            failures: RwLock::new(HashMap::new()),
            call_count: RwLock::new(0),
        }
    }

    /// Register a canned description for an image reference
    pub fn with_response(self, image: &ImageRef, description: ImageDescription) -> Self {
        self.responses
            .write()
            .insert(image.to_string(), description);
        self
    }

    /// Register a failure for an image reference
    pub fn with_failure(self, image: &ImageRef, failure: MockFailure) -> Self {
        self.failures.write().insert(image.to_string(), failure);
        self
    }

    /// Number of describe calls made
    pub fn call_count(&self) -> u32 {
        *self.call_count.read()
    }

    /// Generate a deterministic description from the reference string
    fn generate_description(&self, key: &str) -> ImageDescription {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        let hash = hasher.finalize();

        // Pick 3 distinct tags driven by the hash bytes. The stride is
        // coprime with the vocabulary size, so the indices never repeat.
        let start = hash[0] as usize % TAG_VOCABULARY.len();
        let stride = [1, 3, 7, 9][hash[1] as usize % 4];
        let attributes = (0..3)
            .map(|k| {
                let idx = (start + k * stride) % TAG_VOCABULARY.len();
                let confidence = 0.5 + (hash[k + 8] as f32 / 255.0) * 0.5;
                ImageAttribute::with_confidence(TAG_VOCABULARY[idx], confidence)
            })
            .collect();

        ImageDescription::new(format!("Generated description of {}", key), attributes)
    }
}

impl Default for MockDescriber {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageDescriber for MockDescriber {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn describe(&self, variant: Variant, image: &ImageRef) -> Result<ImageDescription> {
        *self.call_count.write() += 1;
        let key = image.to_string();

        if let Some(failure) = self.failures.read().get(&key) {
            return match failure {
                MockFailure::Unavailable => Err(Error::description_unavailable(
                    variant,
                    "mock vision backend unavailable",
                )),
                MockFailure::InvalidReference => {
                    Err(Error::invalid_image(key, "mock unreadable reference"))
                }
            };
        }

        if let Some(description) = self.responses.read().get(&key) {
            return Ok(description.clone());
        }

        Ok(self.generate_description(&key))
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
