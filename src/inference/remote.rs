//! Hosted classification API backend (Roboflow-style).
//!
//! Request: `POST {endpoint}/{model_id}?api_key=…` with the base64 image as
//! the body. Response: a ranked `predictions` list, or just `top` and
//! `confidence` for single-label models.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{ClassProbabilities, ImageTensor, InferenceError, VisualClassifier};

#[derive(Debug, Deserialize)]
struct RemoteResponse {
    #[serde(default)]
    predictions: Vec<RemotePrediction>,
    #[serde(default)]
    top: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RemotePrediction {
    #[serde(alias = "class_name")]
    class: String,
    confidence: f64,
}

impl RemoteResponse {
    fn into_probabilities(self, top_k: Option<usize>) -> ClassProbabilities {
        let mut probs: ClassProbabilities = if self.predictions.is_empty() {
            match (self.top, self.confidence) {
                (Some(label), Some(c)) => std::iter::once((label, c)).collect(),
                _ => ClassProbabilities::new(),
            }
        } else {
            self.predictions
                .into_iter()
                .map(|p| (p.class, p.confidence))
                .collect()
        };
        if let Some(k) = top_k {
            probs.retain_top(k);
        }
        probs
    }
}

/// Client for a hosted image classification model.
pub struct RemoteClassifier {
    agent: ureq::Agent,
    endpoint: String,
    model_id: String,
    api_key: Option<String>,
    top_k: Option<usize>,
}

impl RemoteClassifier {
    pub fn new(endpoint: &str, model_id: &str, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model_id: model_id.trim_matches('/').to_string(),
            api_key,
            top_k: None,
        }
    }

    pub fn with_top_k(mut self, top_k: Option<usize>) -> Self {
        self.top_k = top_k;
        self
    }

    fn url(&self) -> String {
        format!("{}/{}", self.endpoint, self.model_id)
    }
}

impl VisualClassifier for RemoteClassifier {
    fn backend(&self) -> &'static str {
        "remote"
    }

    fn model_id(&self) -> Option<&str> {
        Some(&self.model_id)
    }

    fn try_classify(&self, image: &ImageTensor) -> Result<ClassProbabilities, InferenceError> {
        let body = STANDARD.encode(image.to_png()?);

        let mut request = self
            .agent
            .post(&self.url())
            .set("Content-Type", "application/x-www-form-urlencoded");
        if let Some(key) = &self.api_key {
            request = request.query("api_key", key);
        }

        // Error text from ureq can echo the URL, which carries the key.
        let response = request.send_string(&body).map_err(|e| match e {
            ureq::Error::Status(code, _) => InferenceError::Network(format!("HTTP {}", code)),
            ureq::Error::Transport(t) => InferenceError::Network(t.kind().to_string()),
        })?;

        let parsed: RemoteResponse = response
            .into_json()
            .map_err(|e| InferenceError::InvalidResponse(e.to_string()))?;
        debug!(model_id = %self.model_id, predictions = parsed.predictions.len(), "remote classification done");

        Ok(parsed.into_probabilities(self.top_k))
    }
}
