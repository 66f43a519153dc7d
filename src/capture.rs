//! Privacy Guard: scoped ownership of raw capture imagery.
//!
//! Raw image bytes and derived measurements live in separate trust domains.
//! The guard owns the bytes for exactly one analysis request and guarantees
//! they are zeroed and released on every exit path, including extractor
//! failures, fusion failures and unwinds. Nothing downstream of measurement
//! derivation can reach the pixels.

use crate::{
    config::Config,
    fusion,
    landmarks::{AngleLabel, LandmarkExtractor, LandmarkSet},
    measurement::{self, MeasurementRecord},
    Error, Result,
};
use std::collections::BTreeSet;

/// One raw angle-tagged capture image
pub struct AngleImage {
    /// Angle the image was taken from
    pub angle: AngleLabel,
    bytes: Vec<u8>,
}

impl AngleImage {
    /// Take ownership of raw image bytes
    #[must_use]
    pub fn new(angle: AngleLabel, bytes: Vec<u8>) -> Self {
        Self { angle, bytes }
    }

    /// Raw byte length
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the image carries no bytes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Ephemeral, in-memory owner of one request's raw images.
///
/// Never persisted and never shared between requests. `release` zeroes every
/// backing buffer before freeing it; `Drop` guarantees the same on unwinds,
/// so cancellation cannot bypass disposal.
pub struct CaptureSession {
    images: Vec<AngleImage>,
    released: bool,
}

impl CaptureSession {
    /// Take exclusive ownership of the request's raw images
    #[must_use]
    pub fn new(images: Vec<AngleImage>) -> Self {
        Self {
            images,
            released: false,
        }
    }

    /// Total raw bytes currently held
    #[must_use]
    pub fn retained_bytes(&self) -> usize {
        self.images.iter().map(AngleImage::len).sum()
    }

    /// Distinct angle labels present
    #[must_use]
    pub fn distinct_angles(&self) -> usize {
        self.images.iter().map(|i| i.angle).collect::<BTreeSet<_>>().len()
    }

    fn images(&self) -> &[AngleImage] {
        &self.images
    }

    /// Zero and free every raw buffer
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        for image in &mut self.images {
            image.bytes.iter_mut().for_each(|b| *b = 0);
            image.bytes = Vec::new();
        }
        self.images.clear();
        self.released = true;
        log::debug!("capture session released, 0 bytes retained");
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.release();
    }
}

/// Disposal outcome reported alongside a capture result
#[derive(Debug, Clone, Copy)]
pub struct CaptureAudit {
    /// Raw bytes still held after the pipeline finished; always zero
    pub retained_bytes: usize,
    /// Whether the session's release step ran
    pub released: bool,
}

/// Runs the full capture pipeline under one scoped acquisition
pub struct PrivacyGuard {
    extractor: LandmarkExtractor,
    config: Config,
}

impl PrivacyGuard {
    /// Create a guard around a landmark extractor
    #[must_use]
    pub fn new(extractor: LandmarkExtractor, config: Config) -> Self {
        Self { extractor, config }
    }

    /// Run extract, fuse and derive under one scoped acquisition.
    ///
    /// All raw image buffers are released before this returns, on success and
    /// on every failure path alike. A single distinct angle is accepted as a
    /// degraded capture with its confidence capped.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No images are supplied (`InsufficientAngles`)
    /// - Two images share an angle label (`InvalidInput`)
    /// - Extraction or fusion fails (see [`LandmarkExtractor::extract`] and
    ///   [`fusion::fuse`]); no record is written in that case
    pub fn scoped_capture(&self, subject: &str, images: Vec<AngleImage>) -> Result<MeasurementRecord> {
        let (result, audit) = self.scoped_capture_audited(subject, images);
        debug_assert!(audit.released && audit.retained_bytes == 0);
        result
    }

    /// Like [`Self::scoped_capture`], additionally reporting the disposal
    /// outcome for audit trails
    pub fn scoped_capture_audited(
        &self,
        subject: &str,
        images: Vec<AngleImage>,
    ) -> (Result<MeasurementRecord>, CaptureAudit) {
        let mut session = CaptureSession::new(images);
        log::debug!(
            "capture session opened for subject {subject}: {} images, {} bytes",
            session.images().len(),
            session.retained_bytes()
        );

        let result = self.run_pipeline(subject, &session);

        session.release();
        let audit = CaptureAudit {
            retained_bytes: session.retained_bytes(),
            released: true,
        };
        (result, audit)
    }

    fn run_pipeline(&self, subject: &str, session: &CaptureSession) -> Result<MeasurementRecord> {
        if session.images().is_empty() {
            return Err(Error::InsufficientAngles);
        }

        let mut seen = BTreeSet::new();
        for image in session.images() {
            if !seen.insert(image.angle) {
                return Err(Error::InvalidInput(format!(
                    "duplicate angle label: {}",
                    image.angle
                )));
            }
        }

        let mut sets: Vec<LandmarkSet> = Vec::with_capacity(session.images().len());
        for image in session.images() {
            sets.push(self.extractor.extract(&image.bytes, image.angle)?);
        }

        let mut pose = fusion::fuse(&sets, &self.config.fusion)?;

        // Single-photo captures are accepted but never trusted beyond the cap
        if session.distinct_angles() < 2 {
            pose.global_confidence = pose
                .global_confidence
                .min(self.config.capture.single_angle_confidence_cap);
            log::debug!(
                "single-angle capture for subject {subject}, confidence capped at {:.3}",
                pose.global_confidence
            );
        }

        Ok(measurement::derive(&pose, subject, &self.config.fusion))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{BodyLandmark, LandmarkPoint, PoseBackend};
    use std::sync::Arc;

    struct UniformBackend {
        confidence: f64,
    }

    impl PoseBackend for UniformBackend {
        fn detect(&self, _image: &[u8]) -> Result<Vec<(BodyLandmark, LandmarkPoint)>> {
            Ok(BodyLandmark::ALL
                .iter()
                .enumerate()
                .map(|(i, &l)| {
                    (
                        l,
                        LandmarkPoint {
                            x: 0.3 + 0.02 * i as f64,
                            y: 0.05 + 0.05 * i as f64,
                            z: 0.0,
                            confidence: self.confidence,
                        },
                    )
                })
                .collect())
        }

        fn version(&self) -> &str {
            "uniform-test"
        }
    }

    fn guard(confidence: f64) -> PrivacyGuard {
        let config = Config::default();
        let extractor = LandmarkExtractor::new(
            Arc::new(UniformBackend { confidence }),
            config.capture.clone(),
        );
        PrivacyGuard::new(extractor, config)
    }

    #[test]
    fn test_empty_capture_is_insufficient_angles() {
        let (result, audit) = guard(0.9).scoped_capture_audited("s", vec![]);
        assert!(matches!(result, Err(Error::InsufficientAngles)));
        assert_eq!(audit.retained_bytes, 0);
    }

    #[test]
    fn test_duplicate_angles_rejected() {
        let images = vec![
            AngleImage::new(AngleLabel::Front, vec![1, 2, 3]),
            AngleImage::new(AngleLabel::Front, vec![4, 5, 6]),
        ];
        let (result, audit) = guard(0.9).scoped_capture_audited("s", images);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert_eq!(audit.retained_bytes, 0);
    }

    #[test]
    fn test_single_angle_confidence_capped() {
        let images = vec![AngleImage::new(AngleLabel::Front, vec![1; 64])];
        let record = guard(0.9).scoped_capture("s", images).unwrap();
        assert!(record.confidence <= Config::default().capture.single_angle_confidence_cap);
    }

    #[test]
    fn test_two_angles_not_capped() {
        let images = vec![
            AngleImage::new(AngleLabel::Front, vec![1; 64]),
            AngleImage::new(AngleLabel::Left, vec![2; 64]),
        ];
        let record = guard(0.9).scoped_capture("s", images).unwrap();
        assert!(record.confidence > Config::default().capture.single_angle_confidence_cap);
    }

    #[test]
    fn test_session_release_zeroes_buffers() {
        let mut session = CaptureSession::new(vec![
            AngleImage::new(AngleLabel::Front, vec![7; 128]),
            AngleImage::new(AngleLabel::Back, vec![9; 256]),
        ]);
        assert_eq!(session.retained_bytes(), 384);
        session.release();
        assert_eq!(session.retained_bytes(), 0);
        // Idempotent
        session.release();
        assert_eq!(session.retained_bytes(), 0);
    }
}
