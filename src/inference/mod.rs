//! Visual inference: turns one image tensor into a label → probability map.
//!
//! Backends differ in what they return (a dense score per label, or a ranked
//! list from a hosted API). Each one implements [`VisualClassifier`] and
//! normalizes its output into [`ClassProbabilities`]. A backend failure is
//! never fatal: [`VisualClassifier::classify`] logs it and yields an empty
//! map, which the fusion stage reads as "no AI signal".

pub mod dense;
pub mod remote;
pub mod tensor;

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{ClassifierBackend, ClassifierSettings};

pub use dense::{DenseClassifier, DenseModel};
pub use remote::RemoteClassifier;
pub use tensor::ImageTensor;

// ─── Errors ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("invalid image tensor: {0}")]
    InvalidTensor(String),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid classifier response: {0}")]
    InvalidResponse(String),
    #[error("model error: {0}")]
    Model(String),
    #[error("classifier misconfigured: {0}")]
    Config(String),
}

// ─── Probability map ────────────────────────────────────────────

/// Clamp to [0, 1]; NaN becomes 0.
pub(crate) fn clamp_unit(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}

/// Label → probability, in insertion order.
///
/// Values are clamped to [0, 1] on the way in but never renormalized, so
/// they need not sum to 1.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassProbabilities {
    entries: Vec<(String, f64)>,
}

impl ClassProbabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a label's probability. An existing label keeps its position.
    pub fn insert(&mut self, label: impl Into<String>, probability: f64) {
        let label = label.into();
        let p = clamp_unit(probability);
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some(slot) => slot.1 = p,
            None => self.entries.push((label, p)),
        }
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries.iter().find(|(l, _)| l == label).map(|(_, p)| *p)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(l, p)| (l.as_str(), *p))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest-probability label; the earlier entry wins a tie.
    pub fn top(&self) -> Option<(&str, f64)> {
        let mut best: Option<(&str, f64)> = None;
        for (l, p) in self.iter() {
            if best.map_or(true, |(_, b)| p > b) {
                best = Some((l, p));
            }
        }
        best
    }

    /// Keep only the `k` most probable labels, highest first.
    pub fn retain_top(&mut self, k: usize) {
        // Stable sort keeps insertion order among equal probabilities.
        self.entries
            .sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        self.entries.truncate(k);
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for ClassProbabilities {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (label, p) in iter {
            map.insert(label, p);
        }
        map
    }
}

impl Serialize for ClassProbabilities {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, p) in &self.entries {
            map.serialize_entry(label, p)?;
        }
        map.end()
    }
}

// ─── Classifier abstraction ─────────────────────────────────────

/// A loaded visual classifier. Implementations must tolerate concurrent
/// calls; the handle is shared read-only across requests.
pub trait VisualClassifier: Send + Sync {
    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;

    fn model_id(&self) -> Option<&str> {
        None
    }

    fn try_classify(&self, image: &ImageTensor) -> Result<ClassProbabilities, InferenceError>;

    /// Classify, degrading any backend failure to an empty map.
    fn classify(&self, image: &ImageTensor) -> ClassProbabilities {
        match self.try_classify(image) {
            Ok(probs) => probs,
            Err(e) => {
                warn!(backend = self.backend(), error = %e, "visual classification failed, AI signal dropped");
                ClassProbabilities::new()
            }
        }
    }
}

/// Build the process-wide classifier once at startup.
///
/// Returns `Ok(None)` when no backend is configured.
pub fn build_classifier(
    settings: &ClassifierSettings,
) -> Result<Option<Arc<dyn VisualClassifier>>, InferenceError> {
    match settings.backend {
        ClassifierBackend::None => {
            info!("no visual classifier configured, predictions will use GPS only");
            Ok(None)
        }
        ClassifierBackend::Remote => {
            let endpoint = settings
                .endpoint
                .as_deref()
                .ok_or_else(|| InferenceError::Config("remote backend requires 'endpoint'".into()))?;
            let model_id = settings
                .model_id
                .as_deref()
                .ok_or_else(|| InferenceError::Config("remote backend requires 'model_id'".into()))?;

            let classifier = RemoteClassifier::new(
                endpoint,
                model_id,
                settings.api_key.clone(),
                Duration::from_secs(settings.timeout_secs),
            )
            .with_top_k(settings.top_k);

            info!(endpoint, model_id, "remote visual classifier ready");
            Ok(Some(Arc::new(classifier)))
        }
    }
}
