//! Dense-probability backend: a local model emitting one score per label.
//!
//! There is no file loader here. A program embedding the locator loads its
//! model however it likes, wraps it in [`DenseClassifier`] and hands
//! [`DenseClassifier::shared`] to `AppState::new` or calls `classify`
//! directly. The `classifier` config section only selects hosted backends.

use std::sync::Arc;

use super::{ClassProbabilities, ImageTensor, InferenceError, VisualClassifier};

/// A loaded model handle. Loading (file format, interpreter, device) is the
/// owner's concern; this crate only calls `predict`.
pub trait DenseModel: Send + Sync {
    /// One score per label, in vocabulary order.
    fn predict(&self, input: &ImageTensor) -> Result<Vec<f32>, InferenceError>;
}

impl<F> DenseModel for F
where
    F: Fn(&ImageTensor) -> Result<Vec<f32>, InferenceError> + Send + Sync,
{
    fn predict(&self, input: &ImageTensor) -> Result<Vec<f32>, InferenceError> {
        self(input)
    }
}

/// Adapts a [`DenseModel`] and its label vocabulary to [`VisualClassifier`].
pub struct DenseClassifier<M> {
    model: Arc<M>,
    labels: Vec<String>,
    top_k: Option<usize>,
}

impl<M: DenseModel> DenseClassifier<M> {
    pub fn new(model: Arc<M>, labels: Vec<String>) -> Self {
        Self {
            model,
            labels,
            top_k: None,
        }
    }

    /// Report only the `k` highest-scoring labels.
    pub fn with_top_k(mut self, top_k: Option<usize>) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl<M: DenseModel + 'static> DenseClassifier<M> {
    /// Erase the model type for injection into the serving layer.
    pub fn shared(self) -> Arc<dyn VisualClassifier> {
        Arc::new(self)
    }
}

impl<M: DenseModel> VisualClassifier for DenseClassifier<M> {
    fn backend(&self) -> &'static str {
        "dense"
    }

    fn try_classify(&self, image: &ImageTensor) -> Result<ClassProbabilities, InferenceError> {
        let scores = self.model.predict(image)?;
        if scores.len() != self.labels.len() {
            return Err(InferenceError::Model(format!(
                "model returned {} scores for {} labels",
                scores.len(),
                self.labels.len()
            )));
        }

        let mut probs: ClassProbabilities = self
            .labels
            .iter()
            .zip(scores)
            .map(|(label, s)| (label.as_str(), f64::from(s)))
            .collect();
        if let Some(k) = self.top_k {
            probs.retain_top(k);
        }
        Ok(probs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<String> {
        ["Main Gate", "PU Block", "Architecture Block", "Cross road"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn fixed(scores: Vec<f32>) -> impl Fn(&ImageTensor) -> Result<Vec<f32>, InferenceError> {
        move |_: &ImageTensor| Ok(scores.clone())
    }

    #[test]
    fn test_maps_scores_to_labels() {
        let classifier = DenseClassifier::new(Arc::new(fixed(vec![0.7, 0.1, 0.15, 0.05])), labels());
        let probs = classifier.classify(&ImageTensor::blank());
        assert_eq!(probs.len(), 4);
        assert_eq!(probs.top().map(|(l, _)| l), Some("Main Gate"));
        assert!((probs.get("Cross road").unwrap() - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_top_k_truncation() {
        let classifier = DenseClassifier::new(Arc::new(fixed(vec![0.1, 0.6, 0.25, 0.05])), labels())
            .with_top_k(Some(3));
        let probs = classifier.classify(&ImageTensor::blank());
        let kept: Vec<_> = probs.iter().map(|(l, _)| l).collect();
        assert_eq!(kept, vec!["PU Block", "Architecture Block", "Main Gate"]);
    }

    #[test]
    fn test_length_mismatch_is_model_error() {
        let classifier = DenseClassifier::new(Arc::new(fixed(vec![0.5, 0.5])), labels());
        assert!(matches!(
            classifier.try_classify(&ImageTensor::blank()),
            Err(InferenceError::Model(_))
        ));
        assert!(classifier.classify(&ImageTensor::blank()).is_empty());
    }

    #[test]
    fn test_model_failure_degrades_to_empty() {
        let failing = |_: &ImageTensor| -> Result<Vec<f32>, InferenceError> {
            Err(InferenceError::Model("interpreter not initialised".into()))
        };
        let classifier = DenseClassifier::new(Arc::new(failing), labels());
        assert!(classifier.classify(&ImageTensor::blank()).is_empty());
    }

    #[test]
    fn test_shared_handle() {
        let classifier = DenseClassifier::new(Arc::new(fixed(vec![0.2, 0.3, 0.4, 0.1])), labels())
            .with_top_k(Some(1))
            .shared();
        assert_eq!(classifier.backend(), "dense");
        assert_eq!(classifier.model_id(), None);
        let probs = classifier.classify(&ImageTensor::blank());
        assert_eq!(probs.len(), 1);
        assert_eq!(probs.top().map(|(l, _)| l), Some("Architecture Block"));
    }

    #[test]
    fn test_raw_scores_are_clamped_not_renormalized() {
        let classifier = DenseClassifier::new(Arc::new(fixed(vec![1.4, 0.0, 0.0, 0.3])), labels());
        let probs = classifier.classify(&ImageTensor::blank());
        assert_eq!(probs.get("Main Gate"), Some(1.0));
        assert!((probs.get("Cross road").unwrap() - 0.3).abs() < 1e-6);
    }
}
