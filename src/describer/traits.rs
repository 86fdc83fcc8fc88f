//! Describer trait definition
//!
//! Defines the ImageDescriber trait that all description backends implement.
//! The trait is object-safe so the orchestrator can hold any backend behind
//! dynamic dispatch.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ImageDescription, ImageRef, Variant};

/// Core trait for image description backends
#[async_trait]
pub trait ImageDescriber: Send + Sync {
    /// Get the backend name (e.g., "openai", "mock")
    fn name(&self) -> &'static str;

    /// Describe one variant's image.
    ///
    /// Implementations retry transient failures internally; an error from
    /// this method means the image could not be described at all. The
    /// variant is carried through so failures identify which candidate
    /// they belong to.
    async fn describe(&self, variant: Variant, image: &ImageRef) -> Result<ImageDescription>;
}

/// Type alias for a shared describer reference
pub type SharedDescriber = Arc<dyn ImageDescriber>;
