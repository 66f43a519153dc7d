//! Error types for the stylist core library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Capture request carried no usable angle images
    #[error("insufficient angles: at least one angle image is required")]
    InsufficientAngles,

    /// Pose backend reported no usable skeleton in the image
    #[error("no subject detected in {angle} image")]
    NoSubjectDetected {
        /// Angle label of the offending image
        angle: String,
    },

    /// Too few landmarks cleared the confidence floor
    #[error("low confidence detection: {detected} of {expected} landmarks above floor, need {required}")]
    LowConfidenceDetection {
        /// Landmarks that cleared the floor
        detected: usize,
        /// Landmarks the backend is expected to produce
        expected: usize,
        /// Minimum count required by the configured fraction
        required: usize,
    },

    /// Pose backend exceeded the configured deadline
    #[error("landmark extraction timed out after {elapsed_ms}ms (limit {limit_ms}ms)")]
    ExtractionTimeout {
        /// Observed wall time in milliseconds
        elapsed_ms: u64,
        /// Configured limit in milliseconds
        limit_ms: u64,
    },

    /// Fused pose confidence fell below the persistence threshold
    #[error("fusion confidence {confidence:.3} below minimum {minimum:.3}")]
    FusionInsufficientData {
        /// Global confidence of the fused pose
        confidence: f64,
        /// Configured minimum
        minimum: f64,
    },

    /// Garment classifier could not produce a category
    #[error("garment classification failed: {0}")]
    ClassificationFailed(String),

    /// Invalid input parameters provided
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Image decoding or processing failed
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
