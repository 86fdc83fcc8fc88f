//! Image description backends
//!
//! The describer turns an image reference into a structured description
//! (caption + attributes) that persona scoring consumes. Two backends are
//! provided: an OpenAI-compatible vision API client and a deterministic
//! mock for testing.

mod mock;
mod openai;
mod traits;

pub use mock::{MockDescriber, MockFailure};
pub use openai::OpenAiDescriber;
pub use traits::{ImageDescriber, SharedDescriber};
