//! Constants used throughout the library

/// Number of body landmarks the pose backend is expected to produce
pub const NUM_BODY_LANDMARKS: usize = 17;

/// Version string recorded on every derived measurement record
pub const MEASUREMENT_METHOD_VERSION: &str = "derive-v1";

/// Per-point confidence floor below which a detection is discarded
pub const DEFAULT_CONFIDENCE_FLOOR: f64 = 0.25;

/// Minimum fraction of expected landmarks that must clear the floor
pub const DEFAULT_MIN_DETECTED_FRACTION: f64 = 0.5;

/// Extractor call deadline in milliseconds
pub const DEFAULT_EXTRACTOR_TIMEOUT_MS: u64 = 5_000;

/// Positional disagreement tolerance between angles, in normalized coordinates
pub const DEFAULT_FUSION_TOLERANCE: f64 = 0.08;

/// Minimum global confidence required to persist a measurement record
pub const DEFAULT_MIN_GLOBAL_CONFIDENCE: f64 = 0.3;

/// Confidence ceiling for single-angle (degraded) captures
pub const DEFAULT_SINGLE_ANGLE_CAP: f64 = 0.4;

/// Agreement ceiling applied when angles disagree beyond tolerance
pub const DISAGREEMENT_AGREEMENT_CAP: f64 = 0.25;

/// Real-world ear-to-ear span used for scale calibration, in centimeters
pub const DEFAULT_REFERENCE_SPAN_CM: f64 = 16.0;

/// Temperature below which outerwear becomes mandatory, in Celsius
pub const DEFAULT_COLD_THRESHOLD_C: f64 = 12.0;

/// Temperature above which warm garments are penalized, in Celsius
pub const DEFAULT_HEAT_THRESHOLD_C: f64 = 26.0;

/// Default number of outfit combinations returned
pub const DEFAULT_TOP_K: usize = 5;

/// Default weight of per-item fit scores in the combination score
pub const DEFAULT_FIT_WEIGHT: f64 = 0.6;

/// Default weight of per-item weather scores in the combination score
pub const DEFAULT_WEATHER_WEIGHT: f64 = 0.4;

/// Default penalty subtracted per clashing item pair
pub const DEFAULT_CLASH_PENALTY: f64 = 0.15;

/// Fraction of image border sampled when estimating background color
pub const BACKGROUND_BORDER_FRACTION: f64 = 0.04;

/// Minimum foreground pixel count for pattern classification
pub const MIN_PATTERN_PIXELS: usize = 400;

/// Numeric precision epsilon
pub const EPSILON: f64 = 1e-10;
