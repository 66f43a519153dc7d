//! Outfit recommendation and fit prediction.
//!
//! Pure scoring over persisted records and a read-only weather context.
//! Rankings are deterministic and reproducible for identical inputs: items
//! are canonicalized by identifier before enumeration and every tie-break is
//! total.

use crate::{
    clothing::{ClothingAttributeRecord, ClothingCategory, PatternClass},
    config::{ClashRules, RecommendConfig},
    measurement::{MeasurementKind, MeasurementRecord},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Read-only external weather signal for a date and location
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WeatherContext {
    /// Daily low in Celsius
    pub temp_min_c: f64,
    /// Daily high in Celsius
    pub temp_max_c: f64,
    /// Whether precipitation is expected
    pub precipitation: bool,
    /// Expected wind speed in km/h
    pub wind_kph: f64,
}

/// Occasion the outfit is assembled for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occasion {
    Casual,
    Business,
    Formal,
    Athletic,
}

impl Occasion {
    /// Formality floor an item must meet for this occasion
    #[must_use]
    pub fn min_formality(self) -> u8 {
        match self {
            Self::Casual | Self::Athletic => 0,
            Self::Business => 2,
            Self::Formal => 3,
        }
    }

    /// Formality ceiling for this occasion
    #[must_use]
    pub fn max_formality(self) -> u8 {
        match self {
            Self::Athletic => 1,
            Self::Casual => 3,
            Self::Business | Self::Formal => 4,
        }
    }

    /// Category slots that must be filled, given the weather
    #[must_use]
    pub fn mandatory_slots(self, weather: &WeatherContext, config: &RecommendConfig) -> Vec<ClothingCategory> {
        let mut slots = vec![
            ClothingCategory::Top,
            ClothingCategory::Bottom,
            ClothingCategory::Footwear,
        ];
        let outerwear_required = self == Self::Formal
            || weather.precipitation
            || weather.temp_max_c < config.cold_threshold_c;
        if outerwear_required {
            slots.push(ClothingCategory::Outerwear);
        }
        slots
    }

    /// Category slots that may be filled or skipped
    #[must_use]
    pub fn optional_slots(self, weather: &WeatherContext, config: &RecommendConfig) -> Vec<ClothingCategory> {
        let mandatory = self.mandatory_slots(weather, config);
        let mut slots = Vec::new();
        if !mandatory.contains(&ClothingCategory::Outerwear) {
            slots.push(ClothingCategory::Outerwear);
        }
        slots.push(ClothingCategory::Accessory);
        slots
    }
}

/// One scored outfit combination; never persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutfitCandidate {
    /// Item identifiers, one per filled slot, in canonical slot order
    pub items: Vec<String>,
    /// Mean per-item fit score (0.0-1.0)
    pub fit_score: f64,
    /// Mean per-item weather suitability (0.0-1.0)
    pub weather_score: f64,
    /// Weighted combination score minus clash penalties
    pub combined_score: f64,
    /// Aggregate confidence of the fit prediction (0.0-1.0)
    pub fit_confidence: f64,
}

/// Why a recommendation run produced what it did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecommendReason {
    /// At least one viable combination was found
    Complete,
    /// A mandatory slot had no eligible item; candidates are empty
    NoViableOutfit {
        /// First mandatory slot that could not be filled
        slot: ClothingCategory,
    },
}

/// Ranked recommendation result.
///
/// Finite and restartable: `iter` may be called any number of times and
/// always yields candidates in the same descending-score order.
#[derive(Debug, Clone)]
pub struct Recommendations {
    candidates: Vec<OutfitCandidate>,
    /// Outcome reason; `NoViableOutfit` is a normal result, not an error
    pub reason: RecommendReason,
}

impl Recommendations {
    /// Iterate candidates in descending score order
    pub fn iter(&self) -> std::slice::Iter<'_, OutfitCandidate> {
        self.candidates.iter()
    }

    /// Number of candidates
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether no viable combination was found
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

impl<'a> IntoIterator for &'a Recommendations {
    type Item = &'a OutfitCandidate;
    type IntoIter = std::slice::Iter<'a, OutfitCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// Subject size-bucket boundaries, in centimeters of derived landmark span
const SHOULDER_SMALL_CM: f64 = 38.0;
const SHOULDER_LARGE_CM: f64 = 46.0;
const HIP_SMALL_CM: f64 = 30.0;
const HIP_LARGE_CM: f64 = 38.0;

// Neutral score used when a signal is unknown
const NEUTRAL_SCORE: f64 = 0.5;

// Fit confidence assigned when the relevant measurement is missing
const MISSING_MEASUREMENT_CONFIDENCE: f64 = 0.25;

// Weather penalties
const PRECIPITATION_OUTERWEAR_PENALTY: f64 = 0.3;
const PRECIPITATION_ITEM_PENALTY: f64 = 0.05;
const WIND_ACCESSORY_PENALTY: f64 = 0.1;
const STRONG_WIND_KPH: f64 = 30.0;

/// Produce ranked outfit combinations for a subject, wardrobe, weather and
/// occasion.
///
/// The result is ordered by descending combined score; ties break by higher
/// aggregate fit confidence, then lexicographically by item identifiers.
/// Finding zero viable combinations is a normal outcome reported through
/// [`RecommendReason::NoViableOutfit`].
#[must_use]
pub fn recommend(
    measurements: &MeasurementRecord,
    wardrobe: &[ClothingAttributeRecord],
    weather: &WeatherContext,
    occasion: Occasion,
    config: &RecommendConfig,
) -> Recommendations {
    // Canonicalize: partition by slot, items sorted by identifier so the
    // enumeration order never depends on wardrobe insertion order.
    let mut by_slot: BTreeMap<ClothingCategory, Vec<&ClothingAttributeRecord>> = BTreeMap::new();
    for item in wardrobe {
        if (occasion.min_formality()..=occasion.max_formality()).contains(&item.formality) {
            by_slot.entry(item.category).or_default().push(item);
        }
    }
    for items in by_slot.values_mut() {
        items.sort_by(|a, b| a.id.cmp(&b.id));
    }

    let mandatory = occasion.mandatory_slots(weather, config);
    for &slot in &mandatory {
        if by_slot.get(&slot).map_or(true, Vec::is_empty) {
            log::info!("no viable outfit: no eligible {slot:?} item for {occasion:?}");
            return Recommendations {
                candidates: Vec::new(),
                reason: RecommendReason::NoViableOutfit { slot },
            };
        }
    }

    let optional = occasion.optional_slots(weather, config);

    // Pre-score each eligible item once
    let mut scored: BTreeMap<&str, ItemScore> = BTreeMap::new();
    for items in by_slot.values() {
        for item in items {
            scored.insert(
                item.id.as_str(),
                ItemScore {
                    fit: fit_score(item, measurements),
                    weather: weather_score(item, weather, config),
                },
            );
        }
    }

    let mut combinations: Vec<Vec<&ClothingAttributeRecord>> = vec![Vec::new()];
    for &slot in &mandatory {
        combinations = extend(combinations, &by_slot[&slot], false);
    }
    for &slot in &optional {
        if let Some(items) = by_slot.get(&slot) {
            combinations = extend(combinations, items, true);
        }
    }

    let mut candidates: Vec<OutfitCandidate> = combinations
        .into_iter()
        .map(|combo| score_combination(&combo, &scored, config))
        .collect();

    candidates.sort_by(|a, b| {
        b.combined_score
            .partial_cmp(&a.combined_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                b.fit_confidence
                    .partial_cmp(&a.fit_confidence)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| a.items.cmp(&b.items))
    });
    candidates.truncate(config.top_k);

    Recommendations {
        candidates,
        reason: RecommendReason::Complete,
    }
}

struct ItemScore {
    fit: (f64, f64),
    weather: f64,
}

fn extend<'a>(
    combinations: Vec<Vec<&'a ClothingAttributeRecord>>,
    items: &[&'a ClothingAttributeRecord],
    optional: bool,
) -> Vec<Vec<&'a ClothingAttributeRecord>> {
    let mut next = Vec::new();
    for combo in combinations {
        if optional {
            next.push(combo.clone());
        }
        for &item in items {
            let mut extended = combo.clone();
            extended.push(item);
            next.push(extended);
        }
    }
    next
}

/// Fit score and confidence for one item against the measurement record.
///
/// A missing measurement yields a neutral score with reduced confidence; it
/// never disqualifies the item.
fn fit_score(item: &ClothingAttributeRecord, measurements: &MeasurementRecord) -> (f64, f64) {
    use crate::clothing::SizeBucket;

    let relevant = match item.category {
        ClothingCategory::Top | ClothingCategory::Outerwear => Some((
            MeasurementKind::ShoulderWidth,
            SHOULDER_SMALL_CM,
            SHOULDER_LARGE_CM,
        )),
        ClothingCategory::Bottom => Some((MeasurementKind::HipWidth, HIP_SMALL_CM, HIP_LARGE_CM)),
        // No derived measurement maps onto footwear or accessories
        ClothingCategory::Footwear | ClothingCategory::Accessory => None,
    };

    let Some((kind, small, large)) = relevant else {
        return (NEUTRAL_SCORE, item.size_confidence);
    };

    let Some(measurement) = measurements.get(kind) else {
        return (NEUTRAL_SCORE, MISSING_MEASUREMENT_CONFIDENCE);
    };

    let subject_bucket = if measurement.value < small {
        SizeBucket::Small
    } else if measurement.value < large {
        SizeBucket::Medium
    } else {
        SizeBucket::Large
    };

    let distance = (subject_bucket as i8 - item.size_estimate as i8).unsigned_abs();
    let base = match distance {
        0 => 1.0,
        1 => 0.6,
        _ => 0.2,
    };

    // Pull toward neutral when the item's size estimate is unreliable
    let score = NEUTRAL_SCORE + (base - NEUTRAL_SCORE) * item.size_confidence;
    let confidence = measurement.confidence.min(item.size_confidence);
    (score, confidence)
}

/// Weather suitability for one item
fn weather_score(item: &ClothingAttributeRecord, weather: &WeatherContext, config: &RecommendConfig) -> f64 {
    let mut score = if weather.temp_max_c < config.cold_threshold_c {
        // Cold: insulation is the signal; lightweight categories suffer
        0.4 + 0.6 * item.warmth
    } else if weather.temp_min_c > config.heat_threshold_c {
        1.0 - 0.6 * item.warmth
    } else {
        1.0 - (item.warmth - 0.5).abs() * 0.4
    };

    if weather.precipitation && !item.waterproof {
        score -= if item.category == ClothingCategory::Outerwear {
            PRECIPITATION_OUTERWEAR_PENALTY
        } else {
            PRECIPITATION_ITEM_PENALTY
        };
    }

    if weather.wind_kph > STRONG_WIND_KPH && item.category == ClothingCategory::Accessory {
        score -= WIND_ACCESSORY_PENALTY;
    }

    score.clamp(0.0, 1.0)
}

fn score_combination(
    combo: &[&ClothingAttributeRecord],
    scored: &BTreeMap<&str, ItemScore>,
    config: &RecommendConfig,
) -> OutfitCandidate {
    let n = combo.len().max(1) as f64;

    let mut fit_sum = 0.0;
    let mut confidence_sum = 0.0;
    let mut weather_sum = 0.0;
    for item in combo {
        if let Some(score) = scored.get(item.id.as_str()) {
            fit_sum += score.fit.0;
            confidence_sum += score.fit.1;
            weather_sum += score.weather;
        }
    }
    let fit_score = fit_sum / n;
    let fit_confidence = confidence_sum / n;
    let weather_score = weather_sum / n;

    let mut clashes = 0usize;
    for (i, a) in combo.iter().enumerate() {
        for b in &combo[i + 1..] {
            if clash(&config.clash_rules, a, b) {
                clashes += 1;
            }
        }
    }

    let weight_sum = config.fit_weight + config.weather_weight;
    let combined_score = (config.fit_weight * fit_score + config.weather_weight * weather_score) / weight_sum
        - config.clash_penalty * clashes as f64;

    OutfitCandidate {
        items: combo.iter().map(|item| item.id.clone()).collect(),
        fit_score,
        weather_score,
        combined_score,
        fit_confidence,
    }
}

/// Pairwise color/pattern compatibility against the configured rule table
fn clash(rules: &ClashRules, a: &ClothingAttributeRecord, b: &ClothingAttributeRecord) -> bool {
    for &(p, q) in &rules.pattern_pairs {
        if (a.pattern == p && b.pattern == q) || (a.pattern == q && b.pattern == p) {
            return true;
        }
    }
    // Two different primary colors from the same group compete
    if let (Some(&ca), Some(&cb)) = (a.colors.first(), b.colors.first()) {
        if ca != cb {
            for group in &rules.color_groups {
                if group.contains(&ca) && group.contains(&cb) {
                    return true;
                }
            }
        }
    }
    false
}
