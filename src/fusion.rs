//! Weighted fusion of the AI and GPS signals into one ranked decision.
//!
//! Each modality adds `normalized_weight × confidence` to the score of the
//! landmark(s) it names. Scores are decision scores, not a posterior: they do
//! not sum to 1. The highest score wins; on an exact tie the landmark that
//! was scored first wins, and the GPS landmark is always scored first.

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::inference::{clamp_unit, ClassProbabilities};
use crate::location::ProximityResult;

// ─── Weights ────────────────────────────────────────────────────

/// Relative modality weights. Only the ratio matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FusionWeights {
    pub gps: u32,
    pub ai: u32,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self { gps: 40, ai: 60 }
    }
}

impl FusionWeights {
    pub const fn new(gps: u32, ai: u32) -> Self {
        Self { gps, ai }
    }

    /// `(gps, ai)` scaled to sum to 1. Both zero counts as 50/50.
    pub fn normalized(&self) -> (f64, f64) {
        let (gps, ai) = if self.gps == 0 && self.ai == 0 {
            (50.0, 50.0)
        } else {
            (f64::from(self.gps), f64::from(self.ai))
        };
        let total = gps + ai;
        (gps / total, ai / total)
    }
}

// ─── Result types ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    Hybrid,
    AiOnly,
    GpsOnly,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hybrid => write!(f, "hybrid"),
            Self::AiOnly => write!(f, "ai-only"),
            Self::GpsOnly => write!(f, "gps-only"),
        }
    }
}

/// Landmark → accumulated score, in the order landmarks were first scored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationScores {
    entries: Vec<(String, f64)>,
}

impl LocationScores {
    fn add(&mut self, name: &str, score: f64) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 += score,
            None => self.entries.push((name.to_string(), score)),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, s)| *s)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(n, s)| (n.as_str(), *s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest score; earliest entry wins ties.
    fn best(&self) -> Option<(&str, f64)> {
        let mut best: Option<(&str, f64)> = None;
        for (n, s) in self.iter() {
            if best.map_or(true, |(_, b)| s > b) {
                best = Some((n, s));
            }
        }
        best
    }
}

impl Serialize for LocationScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, score) in &self.entries {
            map.serialize_entry(name, score)?;
        }
        map.end()
    }
}

/// The fused decision with its provenance.
///
/// Contribution percentages describe the winner's score only: each is the
/// share that modality supplied to it, 0 if it did not score the winner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FusionResult {
    pub final_location: String,
    pub final_confidence: f64,
    #[serde(rename = "gps_contribution")]
    pub gps_contribution_percent: f64,
    #[serde(rename = "ai_contribution")]
    pub ai_contribution_percent: f64,
    pub method: Method,
    pub location_scores: LocationScores,
}

// ─── Fusion ─────────────────────────────────────────────────────

/// Combine the two signals. `None` when neither carries anything.
///
/// An empty probability map and a proximity result without a landmark name
/// both count as absent.
pub fn fuse(
    ai: Option<&ClassProbabilities>,
    gps: Option<&ProximityResult>,
    weights: FusionWeights,
) -> Option<FusionResult> {
    let ai = ai.filter(|p| !p.is_empty());
    let gps = gps.and_then(|g| g.name.as_deref().map(|name| (name, clamp_unit(g.confidence))));
    if ai.is_none() && gps.is_none() {
        return None;
    }

    let (norm_gps, norm_ai) = weights.normalized();

    let mut scores = LocationScores::default();
    if let Some((name, confidence)) = gps {
        scores.add(name, norm_gps * confidence);
    }
    if let Some(probs) = ai {
        for (label, p) in probs.iter() {
            scores.add(label, norm_ai * p);
        }
    }

    let (best, final_confidence) = scores.best()?;
    let final_location = best.to_string();

    let share = |part: f64| {
        if final_confidence > 0.0 {
            part / final_confidence * 100.0
        } else {
            0.0
        }
    };
    let gps_contribution_percent = match gps {
        Some((name, confidence)) if name == final_location => share(norm_gps * confidence),
        _ => 0.0,
    };
    let ai_contribution_percent = ai
        .and_then(|p| p.get(&final_location))
        .map_or(0.0, |p| share(norm_ai * p));

    let method = match (ai.is_some(), gps.is_some()) {
        (true, true) => Method::Hybrid,
        (true, false) => Method::AiOnly,
        _ => Method::GpsOnly,
    };

    Some(FusionResult {
        final_location,
        final_confidence,
        gps_contribution_percent,
        ai_contribution_percent,
        method,
        location_scores: scores,
    })
}
