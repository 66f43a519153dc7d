//! Body measurement and outfit recommendation core.
//!
//! This library implements the two subsystems with real algorithmic content
//! behind a personal stylist application:
//! - a multi-angle body-measurement pipeline: pose landmarks from several
//!   photo angles are fused into one consistent estimate and converted into a
//!   fixed schema of body measurements, with raw imagery disposed of on every
//!   exit path
//! - an outfit recommendation engine: derived measurements, wardrobe
//!   attribute records and an external weather signal are scored into a
//!   deterministic, ranked list of outfit combinations with per-item fit
//!   prediction
//!
//! Pose estimation and garment classification are external capabilities
//! behind the [`landmarks::PoseBackend`] and [`clothing::GarmentClassifier`]
//! traits; any concrete model satisfying them is swappable without touching
//! fusion or recommendation logic.
//!
//! The capture pipeline runs as:
//! 1. [`capture::PrivacyGuard`] takes exclusive ownership of the raw images
//! 2. [`landmarks::LandmarkExtractor`] produces one validated landmark set
//!    per angle
//! 3. [`fusion::fuse`] consolidates the sets into a single pose
//! 4. [`measurement::derive`] converts the pose into a persisted
//!    [`measurement::MeasurementRecord`]
//! 5. the guard zeroes and releases every raw buffer before returning,
//!    regardless of outcome
//!
//! # Examples
//!
//! ## Capturing measurements
//!
//! ```no_run
//! use stylist_core::capture::{AngleImage, PrivacyGuard};
//! use stylist_core::config::Config;
//! use stylist_core::landmarks::{AngleLabel, LandmarkExtractor};
//!
//! # fn main() -> stylist_core::Result<()> {
//! // A pose backend must have been registered at startup
//! let config = Config::default();
//! let extractor = LandmarkExtractor::from_registry(config.capture.clone())?;
//! let guard = PrivacyGuard::new(extractor, config);
//!
//! let images = vec![
//!     AngleImage::new(AngleLabel::Front, std::fs::read("front.jpg")?),
//!     AngleImage::new(AngleLabel::Left, std::fs::read("left.jpg")?),
//! ];
//! let record = guard.scoped_capture("subject-1", images)?;
//! println!("confidence: {:.2}", record.confidence);
//! # Ok(())
//! # }
//! ```
//!
//! ## Recommending outfits
//!
//! ```no_run
//! use stylist_core::config::Config;
//! use stylist_core::recommend::{recommend, Occasion, WeatherContext};
//!
//! # fn main() -> stylist_core::Result<()> {
//! # let measurements: stylist_core::measurement::MeasurementRecord = unimplemented!();
//! # let wardrobe: Vec<stylist_core::clothing::ClothingAttributeRecord> = vec![];
//! let weather = WeatherContext {
//!     temp_min_c: 8.0,
//!     temp_max_c: 14.0,
//!     precipitation: true,
//!     wind_kph: 20.0,
//! };
//! let config = Config::default();
//! let result = recommend(&measurements, &wardrobe, &weather, Occasion::Casual, &config.recommend);
//! for outfit in &result {
//!     println!("{:?} scored {:.2}", outfit.items, outfit.combined_score);
//! }
//! # Ok(())
//! # }
//! ```

/// Privacy Guard owning raw capture imagery for one request
pub mod capture;

/// Clothing attribute extraction from garment photos
pub mod clothing;

/// Configuration management
pub mod config;

/// Constants used throughout the library
pub mod constants;

/// Error types and result handling
pub mod error;

/// Multi-angle landmark fusion
pub mod fusion;

/// Body landmark types and the extraction adapter
pub mod landmarks;

/// Measurement derivation from a fused pose
pub mod measurement;

/// Outfit recommendation and fit prediction
pub mod recommend;

/// Trait seams toward the persistence layer
pub mod store;

pub use error::{Error, Result};
