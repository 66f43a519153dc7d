//! Clothing attribute extraction.
//!
//! Independent of the body pipeline: one garment photo in, one attribute
//! record out. Category classification is an external capability behind
//! [`GarmentClassifier`]; color, pattern and size estimation run in-crate on
//! the decoded pixels. Pattern classification failing degrades the record
//! (pattern = unknown) instead of failing the call.

use crate::{
    constants::{BACKGROUND_BORDER_FRACTION, MIN_PATTERN_PIXELS},
    Result,
};
use chrono::{DateTime, Utc};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Wardrobe category slot a garment occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClothingCategory {
    Top,
    Bottom,
    Outerwear,
    Footwear,
    Accessory,
}

impl ClothingCategory {
    /// All categories in canonical order
    pub const ALL: [Self; 5] = [
        Self::Top,
        Self::Bottom,
        Self::Outerwear,
        Self::Footwear,
        Self::Accessory,
    ];
}

/// Coarse color family used for clash rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorFamily {
    Red,
    Orange,
    Yellow,
    Green,
    Cyan,
    Blue,
    Purple,
    Pink,
    Brown,
    Black,
    White,
    Gray,
}

/// Pattern classification of a garment surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternClass {
    Solid,
    Striped,
    Checked,
    Graphic,
    Unknown,
}

/// Coarse relative size bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeBucket {
    Small,
    Medium,
    Large,
}

/// External garment classification capability
pub trait GarmentClassifier: Send + Sync {
    /// Classify the garment category with a confidence (0.0-1.0)
    fn classify(&self, image: &[u8]) -> Result<(ClothingCategory, f64)>;

    /// Classifier identifier recorded for reproducibility
    fn version(&self) -> &str;
}

/// Persisted attribute record for one wardrobe item.
///
/// Recomputed (replaced) if the item is re-analyzed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClothingAttributeRecord {
    /// Item identifier supplied at ingestion
    pub id: String,
    /// Classified category
    pub category: ClothingCategory,
    /// Dominant color families, ordered by prevalence
    pub colors: Vec<ColorFamily>,
    /// Pattern classification; `Unknown` when that sub-step degraded
    pub pattern: PatternClass,
    /// Coarse size estimate from the garment's bounding-box proportions
    pub size_estimate: SizeBucket,
    /// Confidence of the size estimate alone (0.0-1.0)
    pub size_confidence: f64,
    /// Formality level, 0 = athletic/loungewear through 4 = formal
    pub formality: u8,
    /// Insulation rating (0.0 = lightweight, 1.0 = heavy winter)
    pub warmth: f64,
    /// Whether the item is rated for precipitation
    pub waterproof: bool,
    /// Overall record confidence (0.0-1.0)
    pub confidence: f64,
    /// True when a sub-step degraded instead of failing the call
    pub degraded: bool,
    /// Analysis timestamp
    pub analyzed_at: DateTime<Utc>,
}

/// Clothing attribute extractor
pub struct ClothingAnalyzer {
    classifier: Arc<dyn GarmentClassifier>,
}

// Record confidence reduction applied when a sub-step degraded
const DEGRADED_CONFIDENCE_FACTOR: f64 = 0.75;

// Foreground/background color distance threshold in RGB space
const FOREGROUND_DISTANCE: f64 = 60.0;

// Below this foreground share, assume the garment fills the whole frame
const MIN_FOREGROUND_SHARE: f64 = 0.05;

impl ClothingAnalyzer {
    /// Create an analyzer around a garment classifier
    #[must_use]
    pub fn new(classifier: Arc<dyn GarmentClassifier>) -> Self {
        Self { classifier }
    }

    /// Analyze one garment photo into an attribute record
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The image bytes cannot be decoded
    /// - The classifier capability fails (category is a required signal)
    pub fn analyze(&self, item_id: &str, image_bytes: &[u8]) -> Result<ClothingAttributeRecord> {
        let (category, category_confidence) = self.classifier.classify(image_bytes)?;

        let rgb = image::load_from_memory(image_bytes)?.to_rgb8();
        let mask = ForegroundMask::compute(&rgb);

        let colors = dominant_colors(&rgb, &mask);

        let (pattern, degraded) = match classify_pattern(&rgb, &mask) {
            Some(pattern) => (pattern, false),
            None => (PatternClass::Unknown, true),
        };

        let (size_estimate, size_confidence) = estimate_size(&mask);

        let confidence = if degraded {
            category_confidence * DEGRADED_CONFIDENCE_FACTOR
        } else {
            category_confidence
        };

        if degraded {
            log::warn!("pattern classification degraded for item {item_id}");
        }

        // Weather traits start from category defaults; the wardrobe layer may
        // adjust them from user input before persisting.
        let (warmth, formality) = category_defaults(category);

        Ok(ClothingAttributeRecord {
            id: item_id.to_string(),
            category,
            colors,
            pattern,
            size_estimate,
            size_confidence,
            formality,
            warmth,
            waterproof: false,
            confidence,
            degraded,
            analyzed_at: Utc::now(),
        })
    }
}

fn category_defaults(category: ClothingCategory) -> (f64, u8) {
    match category {
        ClothingCategory::Top => (0.4, 2),
        ClothingCategory::Bottom => (0.5, 2),
        ClothingCategory::Outerwear => (0.8, 2),
        ClothingCategory::Footwear => (0.5, 2),
        ClothingCategory::Accessory => (0.2, 2),
    }
}

/// Foreground mask from border-sampled background color
struct ForegroundMask {
    mask: Vec<bool>,
    width: u32,
    count: usize,
    // Bounding box of foreground pixels (left, top, right, bottom), inclusive
    bbox: Option<(u32, u32, u32, u32)>,
}

impl ForegroundMask {
    fn compute(image: &RgbImage) -> Self {
        let (width, height) = image.dimensions();
        let border = ((width.min(height) as f64 * BACKGROUND_BORDER_FRACTION) as u32).max(1);

        // Background estimate: mean color of the border ring
        let (mut r, mut g, mut b, mut n) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
        for (x, y, pixel) in image.enumerate_pixels() {
            let on_border = x < border || y < border || x >= width - border || y >= height - border;
            if on_border {
                r += f64::from(pixel[0]);
                g += f64::from(pixel[1]);
                b += f64::from(pixel[2]);
                n += 1.0;
            }
        }
        let background = if n > 0.0 { (r / n, g / n, b / n) } else { (0.0, 0.0, 0.0) };

        let mut mask = vec![false; (width * height) as usize];
        let mut count = 0usize;
        let mut bbox: Option<(u32, u32, u32, u32)> = None;
        for (x, y, pixel) in image.enumerate_pixels() {
            let dr = f64::from(pixel[0]) - background.0;
            let dg = f64::from(pixel[1]) - background.1;
            let db = f64::from(pixel[2]) - background.2;
            if (dr * dr + dg * dg + db * db).sqrt() > FOREGROUND_DISTANCE {
                mask[(y * width + x) as usize] = true;
                count += 1;
                bbox = Some(match bbox {
                    None => (x, y, x, y),
                    Some((l, t, rgt, bot)) => (l.min(x), t.min(y), rgt.max(x), bot.max(y)),
                });
            }
        }

        let total = (width * height) as usize;
        if total > 0 && (count as f64 / total as f64) < MIN_FOREGROUND_SHARE {
            // Garment fills the frame or background removal failed: use the
            // whole image rather than a near-empty mask.
            return Self {
                mask: vec![true; total],
                width,
                count: total,
                bbox: Some((0, 0, width - 1, height - 1)),
            };
        }

        Self {
            mask,
            width,
            count,
            bbox,
        }
    }

    fn contains(&self, x: u32, y: u32) -> bool {
        self.mask[(y * self.width + x) as usize]
    }
}

/// Dominant color families over the foreground, ordered by prevalence
fn dominant_colors(image: &RgbImage, mask: &ForegroundMask) -> Vec<ColorFamily> {
    let mut counts: BTreeMap<ColorFamily, usize> = BTreeMap::new();
    for (x, y, pixel) in image.enumerate_pixels() {
        if mask.contains(x, y) {
            *counts.entry(classify_color(pixel[0], pixel[1], pixel[2])).or_insert(0) += 1;
        }
    }

    let total: usize = counts.values().sum();
    if total == 0 {
        return Vec::new();
    }

    // Keep families above 5% prevalence; BTreeMap keeps equal counts in a
    // deterministic enum order.
    let mut families: Vec<(ColorFamily, usize)> = counts
        .into_iter()
        .filter(|(_, count)| *count * 20 >= total)
        .collect();
    families.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    families.into_iter().map(|(family, _)| family).collect()
}

fn classify_color(r: u8, g: u8, b: u8) -> ColorFamily {
    let (hue, saturation, value) = rgb_to_hsv(r, g, b);

    if value < 0.18 {
        return ColorFamily::Black;
    }
    if saturation < 0.15 {
        return if value > 0.85 {
            ColorFamily::White
        } else {
            ColorFamily::Gray
        };
    }
    // Dark desaturated orange reads as brown
    if (15.0..50.0).contains(&hue) && value < 0.6 {
        return ColorFamily::Brown;
    }

    match hue {
        h if h < 15.0 || h >= 345.0 => ColorFamily::Red,
        h if h < 45.0 => ColorFamily::Orange,
        h if h < 70.0 => ColorFamily::Yellow,
        h if h < 160.0 => ColorFamily::Green,
        h if h < 200.0 => ColorFamily::Cyan,
        h if h < 255.0 => ColorFamily::Blue,
        h if h < 290.0 => ColorFamily::Purple,
        _ => ColorFamily::Pink,
    }
}

fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let r = f64::from(r) / 255.0;
    let g = f64::from(g) / 255.0;
    let b = f64::from(b) / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta.abs() < f64::EPSILON {
        0.0
    } else if (max - r).abs() < f64::EPSILON {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if (max - g).abs() < f64::EPSILON {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };

    let saturation = if max.abs() < f64::EPSILON { 0.0 } else { delta / max };

    (hue, saturation, max)
}

/// Pattern heuristics over the foreground; `None` when the foreground is too
/// small to classify
fn classify_pattern(image: &RgbImage, mask: &ForegroundMask) -> Option<PatternClass> {
    if mask.count < MIN_PATTERN_PIXELS {
        return None;
    }
    let (left, top, right, bottom) = mask.bbox?;

    // Per-row and per-column mean luminance inside the bounding box
    let mut row_means = Vec::new();
    for y in top..=bottom {
        let mut sum = 0.0;
        let mut n = 0.0;
        for x in left..=right {
            if mask.contains(x, y) {
                sum += luminance(image, x, y);
                n += 1.0;
            }
        }
        if n > 0.0 {
            row_means.push(sum / n);
        }
    }
    let mut col_means = Vec::new();
    for x in left..=right {
        let mut sum = 0.0;
        let mut n = 0.0;
        for y in top..=bottom {
            if mask.contains(x, y) {
                sum += luminance(image, x, y);
                n += 1.0;
            }
        }
        if n > 0.0 {
            col_means.push(sum / n);
        }
    }

    let mut all = Vec::with_capacity(mask.count);
    for y in top..=bottom {
        for x in left..=right {
            if mask.contains(x, y) {
                all.push(luminance(image, x, y));
            }
        }
    }

    let overall = std_dev(&all);
    let row_var = std_dev(&row_means);
    let col_var = std_dev(&col_means);

    if overall < 12.0 {
        return Some(PatternClass::Solid);
    }
    let directional = row_var.max(col_var);
    let cross = row_var.min(col_var);
    if directional > 10.0 && directional > cross * 2.5 {
        return Some(PatternClass::Striped);
    }
    if row_var > 10.0 && col_var > 10.0 {
        return Some(PatternClass::Checked);
    }
    Some(PatternClass::Graphic)
}

fn luminance(image: &RgbImage, x: u32, y: u32) -> f64 {
    let p = image.get_pixel(x, y);
    0.299 * f64::from(p[0]) + 0.587 * f64::from(p[1]) + 0.114 * f64::from(p[2])
}

fn std_dev(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let n = data.len() as f64;
    let mean = data.iter().sum::<f64>() / n;
    (data.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

/// Size bucket from the garment's proportion of the frame.
///
/// Explicitly approximate; its confidence peaks mid-bucket and drops near
/// the boundaries.
// Bounding-box aspect ratio (width / height) boundaries between size buckets
const SIZE_ASPECT_SMALL: f64 = 0.8;
const SIZE_ASPECT_LARGE: f64 = 1.25;

/// Coarse size bucket from the foreground bounding-box aspect ratio.
///
/// Relative proportion only: a cut that is wide for its length reads as a
/// larger size. The ratio is normalized to `w / (w + h)` so every bucket
/// interval is bounded and confidence falls off toward the boundaries.
fn estimate_size(mask: &ForegroundMask) -> (SizeBucket, f64) {
    let Some((left, top, right, bottom)) = mask.bbox else {
        return (SizeBucket::Medium, 0.0);
    };
    let width = f64::from(right - left + 1);
    let height = f64::from(bottom - top + 1);
    let normalized = width / (width + height);

    let small_bound = SIZE_ASPECT_SMALL / (1.0 + SIZE_ASPECT_SMALL);
    let large_bound = SIZE_ASPECT_LARGE / (1.0 + SIZE_ASPECT_LARGE);
    let (bucket, lower, upper) = if normalized < small_bound {
        (SizeBucket::Small, 0.0, small_bound)
    } else if normalized < large_bound {
        (SizeBucket::Medium, small_bound, large_bound)
    } else {
        (SizeBucket::Large, large_bound, 1.0)
    };

    let center = (lower + upper) / 2.0;
    let half = (upper - lower) / 2.0;
    let confidence = (1.0 - (normalized - center).abs() / half).clamp(0.2, 1.0);
    (bucket, confidence)
}
