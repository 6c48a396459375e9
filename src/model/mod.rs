//! Model artifacts: the opaque fit/predict surface, versioned storage, and
//! the atomically swappable serving reference.

pub mod artifact;
pub mod logistic;
pub mod store;

pub use artifact::{ModelArtifact, Prediction, DEFAULT_THRESHOLD};
pub use store::{ActiveModel, ArtifactStore};
