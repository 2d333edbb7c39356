//! Outward-facing prediction records.
//!
//! The JSON field names here are consumed by existing clients and must not
//! change. The `method` field doubles as the variant tag.

use serde::Serialize;
use thiserror::Error;

use crate::fusion::{fuse, FusionResult, FusionWeights, Method};
use crate::geo::Coordinate;
use crate::inference::ClassProbabilities;
use crate::location::ProximityResult;

/// Neither modality produced a usable signal. Maps to a client error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("either an image or GPS coordinates are required")]
pub struct NoSignalError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiData {
    pub predicted_class: String,
    pub probabilities: ClassProbabilities,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HybridOutcome {
    pub predicted_class: String,
    pub confidence: f64,
    pub probabilities: ClassProbabilities,
    pub hybrid_prediction: FusionResult,
    pub gps_data: ProximityResult,
    pub ai_data: AiData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiOnlyOutcome {
    pub predicted_class: String,
    pub confidence: f64,
    pub probabilities: ClassProbabilities,
    pub ai_data: AiData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpsOnlyOutcome {
    pub predicted_class: String,
    pub confidence: f64,
    pub distance: f64,
    pub coordinates: Option<Coordinate>,
    pub gps_data: ProximityResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "kebab-case")]
pub enum OutcomeRecord {
    Hybrid(HybridOutcome),
    AiOnly(AiOnlyOutcome),
    GpsOnly(GpsOnlyOutcome),
}

impl OutcomeRecord {
    pub fn method(&self) -> Method {
        match self {
            Self::Hybrid(_) => Method::Hybrid,
            Self::AiOnly(_) => Method::AiOnly,
            Self::GpsOnly(_) => Method::GpsOnly,
        }
    }

    pub fn predicted_class(&self) -> &str {
        match self {
            Self::Hybrid(o) => &o.predicted_class,
            Self::AiOnly(o) => &o.predicted_class,
            Self::GpsOnly(o) => &o.predicted_class,
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            Self::Hybrid(o) => o.confidence,
            Self::AiOnly(o) => o.confidence,
            Self::GpsOnly(o) => o.confidence,
        }
    }
}

/// Pick the record shape from which signals are usable.
///
/// Both signals plus a fused result give `Hybrid`. If the fused result is
/// missing the AI signal is reported on its own.
pub fn assemble(
    ai: Option<&ClassProbabilities>,
    gps: Option<&ProximityResult>,
    fused: Option<FusionResult>,
) -> Result<OutcomeRecord, NoSignalError> {
    let ai = ai.filter(|p| !p.is_empty());
    let gps = gps.filter(|g| !g.is_degenerate());

    match (ai, gps, fused) {
        (Some(ai), Some(gps), Some(fused)) => Ok(OutcomeRecord::Hybrid(HybridOutcome {
            predicted_class: fused.final_location.clone(),
            confidence: fused.final_confidence,
            probabilities: ai.clone(),
            hybrid_prediction: fused,
            gps_data: gps.clone(),
            ai_data: ai_data(ai).ok_or(NoSignalError)?,
        })),
        (Some(ai), _, _) => {
            let (label, p) = ai.top().ok_or(NoSignalError)?;
            Ok(OutcomeRecord::AiOnly(AiOnlyOutcome {
                predicted_class: label.to_string(),
                confidence: p,
                probabilities: ai.clone(),
                ai_data: ai_data(ai).ok_or(NoSignalError)?,
            }))
        }
        (None, Some(gps), _) => {
            let name = gps.name.clone().ok_or(NoSignalError)?;
            Ok(OutcomeRecord::GpsOnly(GpsOnlyOutcome {
                predicted_class: name,
                confidence: gps.confidence,
                distance: gps.distance_m,
                coordinates: gps.coordinates,
                gps_data: gps.clone(),
            }))
        }
        (None, None, _) => Err(NoSignalError),
    }
}

fn ai_data(ai: &ClassProbabilities) -> Option<AiData> {
    let (label, _) = ai.top()?;
    Some(AiData {
        predicted_class: label.to_string(),
        probabilities: ai.clone(),
    })
}

/// Fuse and assemble in one step.
pub fn locate(
    ai: Option<&ClassProbabilities>,
    gps: Option<&ProximityResult>,
    weights: FusionWeights,
) -> Result<OutcomeRecord, NoSignalError> {
    let fused = fuse(ai, gps, weights);
    assemble(ai, gps, fused)
}
