//! Classifier trait definition.

use async_trait::async_trait;

use super::{Classification, ClassificationRequest};
use crate::error::ClassificationError;

/// Core trait for section classifiers.
///
/// Implementations must be provider-agnostic from the caller's side: every
/// provider failure is mapped onto a [`ClassificationError`] variant.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Returns the provider ID.
    fn id(&self) -> &str;

    /// Returns the model used for classification.
    fn model(&self) -> &str;

    /// Classify one section.
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<Classification, ClassificationError>;
}
