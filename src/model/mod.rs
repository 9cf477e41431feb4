//! Neural network architecture and artifact storage

pub mod mlp;
pub mod store;

pub use mlp::{OutcomeNet, OutcomeNetConfig};
pub use store::{ArtifactManifest, ModelStore};
