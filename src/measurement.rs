//! Measurement derivation from a fused pose.
//!
//! Each measurement is a fixed, documented combination of landmark pairs.
//! Absolute lengths scale the fused normalized coordinates by a calibration
//! factor derived from the ear-to-ear span, whose real-world proportion is
//! configured rather than observed (absolute scale is not recoverable from
//! photos without a size reference). Ratios need no calibration, so a pose
//! with unresolved ears still yields its ratio measurements.

use crate::{
    config::FusionConfig,
    constants::{EPSILON, MEASUREMENT_METHOD_VERSION},
    fusion::{FusedLandmark, FusedPose},
    landmarks::BodyLandmark,
};
use chrono::{DateTime, Utc};
use nalgebra::distance;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Named measurements in the fixed derivation schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementKind {
    /// Left shoulder to right shoulder
    ShoulderWidth,
    /// Left hip to right hip
    HipWidth,
    /// Shoulder midpoint to hip midpoint
    TorsoLength,
    /// Left shoulder to elbow to wrist, summed
    ArmLength,
    /// Left hip to knee to ankle, summed
    LegLength,
    /// Shoulder width over hip width; no calibration required
    ShoulderToHipRatio,
}

impl MeasurementKind {
    /// All measurements in the schema, in canonical order
    pub const ALL: [Self; 6] = [
        Self::ShoulderWidth,
        Self::HipWidth,
        Self::TorsoLength,
        Self::ArmLength,
        Self::LegLength,
        Self::ShoulderToHipRatio,
    ];
}

/// Unit of a derived measurement value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Centimeters,
    Ratio,
}

/// One derived measurement with its unit and confidence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Derived value
    pub value: f64,
    /// Unit of the value
    pub unit: Unit,
    /// Minimum confidence among the landmarks the value depends on (0.0-1.0)
    pub confidence: f64,
}

/// Persisted measurement record.
///
/// Contains no pixel data and no reversible encoding of the source images.
/// A later capture supersedes the record rather than mutating it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// Record identifier
    pub id: Uuid,
    /// Opaque subject identifier, not linked to raw imagery
    pub subject: String,
    /// Present measurements; absent kinds are unknown, never zero
    pub measurements: BTreeMap<MeasurementKind, Measurement>,
    /// Overall capture confidence (0.0-1.0)
    pub confidence: f64,
    /// Derivation timestamp
    pub derived_at: DateTime<Utc>,
    /// Derivation method version
    pub method_version: String,
}

impl MeasurementRecord {
    /// Look up a measurement; `None` means unknown, not zero
    #[must_use]
    pub fn get(&self, kind: MeasurementKind) -> Option<&Measurement> {
        self.measurements.get(&kind)
    }
}

/// Derive the measurement schema from a fused pose
///
/// Measurements whose dependent landmarks are unresolved are omitted rather
/// than estimated with a default. Absolute lengths additionally require the
/// ear-to-ear calibration pair to be resolved.
#[must_use]
pub fn derive(pose: &FusedPose, subject: &str, config: &FusionConfig) -> MeasurementRecord {
    let calibration = calibration_factor(pose, config);
    let mut measurements = BTreeMap::new();

    for &kind in &MeasurementKind::ALL {
        if let Some(measurement) = derive_one(pose, kind, calibration) {
            measurements.insert(kind, measurement);
        }
    }

    log::debug!(
        "derived {} of {} measurements for subject {} (confidence {:.3})",
        measurements.len(),
        MeasurementKind::ALL.len(),
        subject,
        pose.global_confidence
    );

    MeasurementRecord {
        id: Uuid::new_v4(),
        subject: subject.to_string(),
        measurements,
        confidence: pose.global_confidence,
        derived_at: Utc::now(),
        method_version: MEASUREMENT_METHOD_VERSION.to_string(),
    }
}

/// Centimeters per normalized unit, from the ear-to-ear reference span
fn calibration_factor(pose: &FusedPose, config: &FusionConfig) -> Option<(f64, f64)> {
    let left = pose.resolved(BodyLandmark::LeftEar)?;
    let right = pose.resolved(BodyLandmark::RightEar)?;
    let span = distance(&left.position(), &right.position());
    if span < EPSILON {
        return None;
    }
    let confidence = left.confidence.min(right.confidence);
    Some((config.reference_span_cm / span, confidence))
}

fn derive_one(pose: &FusedPose, kind: MeasurementKind, calibration: Option<(f64, f64)>) -> Option<Measurement> {
    match kind {
        MeasurementKind::ShoulderWidth => scaled_span(
            pose,
            &[(BodyLandmark::LeftShoulder, BodyLandmark::RightShoulder)],
            calibration,
        ),
        MeasurementKind::HipWidth => scaled_span(
            pose,
            &[(BodyLandmark::LeftHip, BodyLandmark::RightHip)],
            calibration,
        ),
        MeasurementKind::TorsoLength => {
            let (scale, scale_conf) = calibration?;
            let ls = pose.resolved(BodyLandmark::LeftShoulder)?;
            let rs = pose.resolved(BodyLandmark::RightShoulder)?;
            let lh = pose.resolved(BodyLandmark::LeftHip)?;
            let rh = pose.resolved(BodyLandmark::RightHip)?;
            let shoulder_mid = nalgebra::center(&ls.position(), &rs.position());
            let hip_mid = nalgebra::center(&lh.position(), &rh.position());
            let confidence = [ls, rs, lh, rh]
                .iter()
                .map(|l| l.confidence)
                .fold(scale_conf, f64::min);
            Some(Measurement {
                value: distance(&shoulder_mid, &hip_mid) * scale,
                unit: Unit::Centimeters,
                confidence,
            })
        }
        MeasurementKind::ArmLength => scaled_span(
            pose,
            &[
                (BodyLandmark::LeftShoulder, BodyLandmark::LeftElbow),
                (BodyLandmark::LeftElbow, BodyLandmark::LeftWrist),
            ],
            calibration,
        ),
        MeasurementKind::LegLength => scaled_span(
            pose,
            &[
                (BodyLandmark::LeftHip, BodyLandmark::LeftKnee),
                (BodyLandmark::LeftKnee, BodyLandmark::LeftAnkle),
            ],
            calibration,
        ),
        MeasurementKind::ShoulderToHipRatio => {
            let ls = pose.resolved(BodyLandmark::LeftShoulder)?;
            let rs = pose.resolved(BodyLandmark::RightShoulder)?;
            let lh = pose.resolved(BodyLandmark::LeftHip)?;
            let rh = pose.resolved(BodyLandmark::RightHip)?;
            let shoulders = distance(&ls.position(), &rs.position());
            let hips = distance(&lh.position(), &rh.position());
            if hips < EPSILON {
                return None;
            }
            let confidence = [ls, rs, lh, rh].iter().map(|l| l.confidence).fold(1.0, f64::min);
            Some(Measurement {
                value: shoulders / hips,
                unit: Unit::Ratio,
                confidence,
            })
        }
    }
}

/// Sum of calibrated segment lengths; `None` when any dependency is unresolved
fn scaled_span(
    pose: &FusedPose,
    segments: &[(BodyLandmark, BodyLandmark)],
    calibration: Option<(f64, f64)>,
) -> Option<Measurement> {
    let (scale, scale_conf) = calibration?;
    let mut total = 0.0;
    let mut confidence = scale_conf;

    for &(a, b) in segments {
        let from = pose.resolved(a)?;
        let to = pose.resolved(b)?;
        total += distance(&from.position(), &to.position());
        confidence = confidence.min(from.confidence).min(to.confidence);
    }

    Some(Measurement {
        value: total * scale,
        unit: Unit::Centimeters,
        confidence,
    })
}
