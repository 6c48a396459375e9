//! Feature engineering: versioned schema and the serving/training transform.

pub mod schema;
pub mod transform;

pub use schema::FeatureSchema;
pub use transform::{FeatureTransform, FeatureVector};
