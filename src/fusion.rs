//! Multi-angle landmark fusion.
//!
//! Combines per-angle landmark sets into one consolidated pose. Inputs are
//! canonicalized by angle label before any arithmetic, so the result is
//! bit-identical no matter what order the sets were supplied in.

use crate::{
    config::FusionConfig,
    constants::{DISAGREEMENT_AGREEMENT_CAP, NUM_BODY_LANDMARKS},
    landmarks::{AngleLabel, BodyLandmark, LandmarkPoint, LandmarkSet},
    Error, Result,
};
use nalgebra::Point3;
use std::collections::{BTreeMap, BTreeSet};

/// One landmark consolidated across angles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusedLandmark {
    /// Consolidated horizontal position
    pub x: f64,
    /// Consolidated vertical position
    pub y: f64,
    /// Consolidated depth estimate
    pub z: f64,
    /// Combined detection confidence across angles (0.0-1.0)
    pub confidence: f64,
    /// Cross-angle agreement score (0.0-1.0); low when angles disagreed
    pub agreement: f64,
}

impl FusedLandmark {
    /// Position as a point for distance computations
    #[must_use]
    pub fn position(&self) -> Point3<f64> {
        Point3::new(self.x, self.y, self.z)
    }
}

/// One consolidated pose per subject
#[derive(Debug, Clone)]
pub struct FusedPose {
    /// Resolved landmarks keyed by name
    pub landmarks: BTreeMap<BodyLandmark, FusedLandmark>,
    /// Landmarks undetected in more than half the supplied angles
    pub unresolved: BTreeSet<BodyLandmark>,
    /// Mean per-landmark confidence penalized by unresolved landmarks (0.0-1.0)
    pub global_confidence: f64,
    /// Number of distinct angles that contributed
    pub angle_count: usize,
}

impl FusedPose {
    /// Look up a resolved landmark
    #[must_use]
    pub fn resolved(&self, landmark: BodyLandmark) -> Option<&FusedLandmark> {
        self.landmarks.get(&landmark)
    }
}

/// Fuse per-angle landmark sets into one consolidated pose
///
/// Per landmark: confidence-weighted average across the angles that detected
/// it. A landmark undetected in more than half the supplied angles is marked
/// unresolved instead of being interpolated. When angle positions disagree
/// beyond the configured tolerance, the front angle wins if present, else the
/// angle with the highest aggregate confidence, and the agreement score is
/// capped low instead of averaging outliers.
///
/// # Errors
///
/// Returns an error if:
/// - No sets are supplied or two sets share an angle label (`InvalidInput`)
/// - Global confidence falls below the configured minimum
///   (`FusionInsufficientData`)
pub fn fuse(sets: &[LandmarkSet], config: &FusionConfig) -> Result<FusedPose> {
    if sets.is_empty() {
        return Err(Error::InvalidInput("no landmark sets to fuse".to_string()));
    }

    // Canonicalize: key by angle so iteration order is fixed regardless of
    // the order the caller supplied the sets in.
    let mut by_angle: BTreeMap<AngleLabel, &LandmarkSet> = BTreeMap::new();
    for set in sets {
        if by_angle.insert(set.angle, set).is_some() {
            return Err(Error::InvalidInput(format!(
                "duplicate angle label: {}",
                set.angle
            )));
        }
    }

    let supplied = by_angle.len();
    let mut landmarks = BTreeMap::new();
    let mut unresolved = BTreeSet::new();
    let mut confidence_sum = 0.0;

    for &landmark in &BodyLandmark::ALL {
        let contributions: Vec<(AngleLabel, &LandmarkSet, LandmarkPoint)> = by_angle
            .iter()
            .filter_map(|(&angle, &set)| set.points.get(&landmark).map(|&p| (angle, set, p)))
            .collect();

        // Undetected in more than half the supplied angles: unresolved,
        // never interpolated.
        if (supplied - contributions.len()) * 2 > supplied || contributions.is_empty() {
            unresolved.insert(landmark);
            continue;
        }

        let fused = fuse_landmark(&contributions, config);
        confidence_sum += fused.confidence;
        landmarks.insert(landmark, fused);
    }

    // Mean over the full schema: unresolved landmarks contribute zero, which
    // is the penalty for leaving them unresolved.
    let global_confidence = confidence_sum / NUM_BODY_LANDMARKS as f64;

    if global_confidence < config.min_global_confidence {
        return Err(Error::FusionInsufficientData {
            confidence: global_confidence,
            minimum: config.min_global_confidence,
        });
    }

    Ok(FusedPose {
        landmarks,
        unresolved,
        global_confidence,
        angle_count: supplied,
    })
}

fn fuse_landmark(
    contributions: &[(AngleLabel, &LandmarkSet, LandmarkPoint)],
    config: &FusionConfig,
) -> FusedLandmark {
    // Combined confidence accumulates evidence: each extra observation can
    // only raise it, which is what makes adding an angle safe.
    let mut miss = 1.0;
    for (_, _, p) in contributions {
        miss *= 1.0 - p.confidence;
    }
    let confidence = 1.0 - miss;

    let spread = max_pairwise_distance(contributions);

    if spread > config.tolerance && contributions.len() > 1 {
        // Disagreement beyond tolerance: pick one angle instead of averaging
        // outliers. Front wins if it contributed, else the angle with the
        // highest aggregate confidence (canonical angle order breaks ties).
        let chosen = contributions
            .iter()
            .find(|(angle, _, _)| *angle == AngleLabel::Front)
            .unwrap_or_else(|| {
                contributions
                    .iter()
                    .max_by(|(a1, s1, _), (a2, s2, _)| {
                        s1.aggregate_confidence()
                            .partial_cmp(&s2.aggregate_confidence())
                            .unwrap_or(std::cmp::Ordering::Equal)
                            .then(a2.cmp(a1))
                    })
                    .unwrap_or(&contributions[0])
            });
        let p = chosen.2;
        return FusedLandmark {
            x: p.x,
            y: p.y,
            z: p.z,
            confidence,
            agreement: DISAGREEMENT_AGREEMENT_CAP,
        };
    }

    let weight_sum: f64 = contributions.iter().map(|(_, _, p)| p.confidence).sum();
    let (mut x, mut y, mut z) = (0.0, 0.0, 0.0);
    for (_, _, p) in contributions {
        x += p.x * p.confidence;
        y += p.y * p.confidence;
        z += p.z * p.confidence;
    }
    x /= weight_sum;
    y /= weight_sum;
    z /= weight_sum;

    let agreement = (1.0 - spread / config.tolerance).clamp(0.0, 1.0);

    FusedLandmark {
        x,
        y,
        z,
        confidence,
        agreement,
    }
}

fn max_pairwise_distance(contributions: &[(AngleLabel, &LandmarkSet, LandmarkPoint)]) -> f64 {
    let mut spread = 0.0f64;
    for (i, (_, _, a)) in contributions.iter().enumerate() {
        for (_, _, b) in &contributions[i + 1..] {
            let d = nalgebra::distance(
                &Point3::new(a.x, a.y, a.z),
                &Point3::new(b.x, b.y, b.z),
            );
            spread = spread.max(d);
        }
    }
    spread
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: f64, y: f64, confidence: f64) -> LandmarkPoint {
        LandmarkPoint {
            x,
            y,
            z: 0.0,
            confidence,
        }
    }

    fn full_set(angle: AngleLabel, confidence: f64) -> LandmarkSet {
        let points = BodyLandmark::ALL
            .iter()
            .map(|&l| (l, point(0.5, 0.5, confidence)))
            .collect();
        LandmarkSet { angle, points }
    }

    #[test]
    fn test_single_angle_fuses() {
        let pose = fuse(&[full_set(AngleLabel::Front, 0.9)], &FusionConfig::default()).unwrap();
        assert_eq!(pose.angle_count, 1);
        assert!(pose.unresolved.is_empty());
        assert!((pose.global_confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_duplicate_angle_rejected() {
        let sets = vec![full_set(AngleLabel::Front, 0.9), full_set(AngleLabel::Front, 0.8)];
        assert!(matches!(
            fuse(&sets, &FusionConfig::default()),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_permutation_independence() {
        let front = full_set(AngleLabel::Front, 0.9);
        let mut left = full_set(AngleLabel::Left, 0.7);
        left.points.insert(BodyLandmark::Nose, point(0.52, 0.48, 0.6));
        let back = full_set(AngleLabel::Back, 0.5);

        let config = FusionConfig::default();
        let a = fuse(&[front.clone(), left.clone(), back.clone()], &config).unwrap();
        let b = fuse(&[back, front, left], &config).unwrap();

        assert_eq!(a.landmarks, b.landmarks);
        assert_eq!(a.unresolved, b.unresolved);
        assert!(a.global_confidence == b.global_confidence);
    }

    #[test]
    fn test_undetected_in_majority_is_unresolved() {
        let front = full_set(AngleLabel::Front, 0.9);
        let mut left = full_set(AngleLabel::Left, 0.9);
        let mut right = full_set(AngleLabel::Right, 0.9);
        left.points.remove(&BodyLandmark::LeftWrist);
        right.points.remove(&BodyLandmark::LeftWrist);

        let pose = fuse(&[front, left, right], &FusionConfig::default()).unwrap();
        assert!(pose.unresolved.contains(&BodyLandmark::LeftWrist));
        assert!(pose.resolved(BodyLandmark::LeftWrist).is_none());
    }

    #[test]
    fn test_disagreement_prefers_front() {
        let mut front = full_set(AngleLabel::Front, 0.8);
        let mut left = full_set(AngleLabel::Left, 0.9);
        front.points.insert(BodyLandmark::Nose, point(0.30, 0.20, 0.8));
        // Mirrored far beyond tolerance
        left.points.insert(BodyLandmark::Nose, point(0.70, 0.20, 0.9));

        let pose = fuse(&[left, front], &FusionConfig::default()).unwrap();
        let nose = pose.resolved(BodyLandmark::Nose).unwrap();
        assert!((nose.x - 0.30).abs() < 1e-9, "front position must win");
        assert!(nose.agreement <= DISAGREEMENT_AGREEMENT_CAP);
    }

    #[test]
    fn test_added_angle_never_lowers_confidence() {
        let config = FusionConfig::default();
        let single = fuse(&[full_set(AngleLabel::Front, 0.6)], &config).unwrap();
        let dual = fuse(
            &[full_set(AngleLabel::Front, 0.6), full_set(AngleLabel::Left, 0.3)],
            &config,
        )
        .unwrap();
        assert!(dual.global_confidence >= single.global_confidence);
    }

    #[test]
    fn test_insufficient_confidence_fails() {
        let err = fuse(&[full_set(AngleLabel::Front, 0.28)], &FusionConfig::default()).unwrap_err();
        assert!(matches!(err, Error::FusionInsufficientData { .. }));
    }
}
