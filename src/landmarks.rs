//! Body landmark types and the landmark extraction adapter.
//!
//! Pose estimation itself is an external capability behind the [`PoseBackend`]
//! trait; this module wraps a backend with the validation the pipeline
//! requires (subject presence, confidence floor, deadline) and owns the
//! process-wide backend registry.

use crate::{config::CaptureConfig, constants::NUM_BODY_LANDMARKS, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::Instant;

/// Camera angle a capture image was taken from.
///
/// Ordering is canonical: fusion iterates angles in this order so its output
/// does not depend on the order inputs were supplied in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleLabel {
    /// Subject facing the camera
    Front,
    /// Subject's left side toward the camera
    Left,
    /// Subject's right side toward the camera
    Right,
    /// Subject facing away from the camera
    Back,
}

impl fmt::Display for AngleLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Front => "front",
            Self::Left => "left",
            Self::Right => "right",
            Self::Back => "back",
        };
        write!(f, "{name}")
    }
}

/// Named body landmarks the pose backend is expected to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyLandmark {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl BodyLandmark {
    /// All landmarks in canonical order
    pub const ALL: [Self; NUM_BODY_LANDMARKS] = [
        Self::Nose,
        Self::LeftEye,
        Self::RightEye,
        Self::LeftEar,
        Self::RightEar,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
    ];
}

/// One detected landmark position in normalized image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    /// Horizontal position, 0.0 = left edge, 1.0 = right edge
    pub x: f64,
    /// Vertical position, 0.0 = top edge, 1.0 = bottom edge
    pub y: f64,
    /// Depth estimate relative to the hip midpoint, backend-defined scale
    pub z: f64,
    /// Per-point detection confidence (0.0-1.0)
    pub confidence: f64,
}

/// Landmarks detected in a single angle image
#[derive(Debug, Clone)]
pub struct LandmarkSet {
    /// Angle the source image was tagged with
    pub angle: AngleLabel,
    /// Detected points keyed by landmark name
    pub points: BTreeMap<BodyLandmark, LandmarkPoint>,
}

impl LandmarkSet {
    /// Mean confidence over detected points, 0.0 when empty
    #[must_use]
    pub fn aggregate_confidence(&self) -> f64 {
        if self.points.is_empty() {
            return 0.0;
        }
        self.points.values().map(|p| p.confidence).sum::<f64>() / self.points.len() as f64
    }
}

/// External pose estimation capability.
///
/// Implementations must be deterministic for a given image byte sequence and
/// backend version. An empty detection list means no usable skeleton was
/// found; it is not an error at this level.
pub trait PoseBackend: Send + Sync {
    /// Detect body landmarks in a raster image
    fn detect(&self, image: &[u8]) -> Result<Vec<(BodyLandmark, LandmarkPoint)>>;

    /// Backend identifier recorded for reproducibility
    fn version(&self) -> &str;
}

/// Adapter wrapping a pose backend with pipeline validation.
///
/// A single call is a single attempt: the adapter never retries internally.
pub struct LandmarkExtractor {
    backend: Arc<dyn PoseBackend>,
    config: CaptureConfig,
}

impl LandmarkExtractor {
    /// Create an extractor around a pose backend
    #[must_use]
    pub fn new(backend: Arc<dyn PoseBackend>, config: CaptureConfig) -> Self {
        Self { backend, config }
    }

    /// Create an extractor using the process-wide registered backend
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if no backend has been initialized.
    pub fn from_registry(config: CaptureConfig) -> Result<Self> {
        Ok(Self::new(registered_backend()?, config))
    }

    /// Extract a validated landmark set from one angle image
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The backend call exceeds the configured deadline (`ExtractionTimeout`)
    /// - The backend reports no skeleton (`NoSubjectDetected`)
    /// - Too few landmarks clear the confidence floor (`LowConfidenceDetection`)
    pub fn extract(&self, image: &[u8], angle: AngleLabel) -> Result<LandmarkSet> {
        let started = Instant::now();
        let detections = self.backend.detect(image)?;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        if elapsed_ms > self.config.extractor_timeout_ms {
            return Err(Error::ExtractionTimeout {
                elapsed_ms,
                limit_ms: self.config.extractor_timeout_ms,
            });
        }

        if detections.is_empty() {
            return Err(Error::NoSubjectDetected {
                angle: angle.to_string(),
            });
        }

        let mut points = BTreeMap::new();
        for (landmark, point) in detections {
            if point.confidence >= self.config.confidence_floor {
                points.insert(landmark, point);
            }
        }

        let required =
            (self.config.min_detected_fraction * NUM_BODY_LANDMARKS as f64).ceil() as usize;
        if points.len() < required {
            return Err(Error::LowConfidenceDetection {
                detected: points.len(),
                expected: NUM_BODY_LANDMARKS,
                required,
            });
        }

        log::debug!(
            "extracted {} landmarks from {} angle (backend {})",
            points.len(),
            angle,
            self.backend.version()
        );

        Ok(LandmarkSet { angle, points })
    }
}

// Process-wide backend handle, initialized once at startup and torn down at
// shutdown instead of living as an ad hoc global.
static BACKEND: RwLock<Option<Arc<dyn PoseBackend>>> = RwLock::new(None);

/// Register the process-wide pose backend
pub fn init_backend(backend: Arc<dyn PoseBackend>) {
    log::info!("initializing pose backend {}", backend.version());
    *BACKEND.write().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(backend);
}

/// Tear down the process-wide pose backend
pub fn shutdown_backend() {
    log::info!("shutting down pose backend");
    *BACKEND.write().unwrap_or_else(std::sync::PoisonError::into_inner) = None;
}

/// Fetch the registered backend
///
/// # Errors
///
/// Returns `Error::InvalidInput` if `init_backend` has not been called.
pub fn registered_backend() -> Result<Arc<dyn PoseBackend>> {
    BACKEND
        .read()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .clone()
        .ok_or_else(|| Error::InvalidInput("no pose backend initialized".to_string()))
}
