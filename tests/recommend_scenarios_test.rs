//! Outfit recommendation scenarios: occasion filtering, fit, weather


use stylist_core::clothing::{ClothingCategory, ColorFamily, SizeBucket};
use stylist_core::config::RecommendConfig;
use stylist_core::recommend::{recommend, Occasion, RecommendReason, WeatherContext};
use test_helpers::{garment, sized_record};

fn mild() -> WeatherContext {
    WeatherContext {
        temp_min_c: 15.0,
        temp_max_c: 22.0,
        precipitation: false,
        wind_kph: 10.0,
    }
}

fn rainy() -> WeatherContext {
    WeatherContext {
        temp_min_c: 15.0,
        temp_max_c: 22.0,
        precipitation: true,
        wind_kph: 10.0,
    }
}

#[test]
fn test_formal_occasion_excludes_casual_items() {
    let wardrobe = vec![
        garment("tee-1", ClothingCategory::Top, ColorFamily::White, SizeBucket::Medium, 1, 0.2, false),
        garment("shirt-1", ClothingCategory::Top, ColorFamily::White, SizeBucket::Medium, 4, 0.3, false),
        garment("slacks-1", ClothingCategory::Bottom, ColorFamily::Black, SizeBucket::Medium, 4, 0.4, false),
        garment("oxford-1", ClothingCategory::Footwear, ColorFamily::Black, SizeBucket::Medium, 4, 0.2, false),
        garment("coat-1", ClothingCategory::Outerwear, ColorFamily::Black, SizeBucket::Medium, 4, 0.6, false),
    ];
    let record = sized_record(40.0, 34.0);

    let result = recommend(&record, &wardrobe, &mild(), Occasion::Formal, &RecommendConfig::default());

    assert_eq!(result.reason, RecommendReason::Complete);
    for outfit in result.iter() {
        assert!(!outfit.items.contains(&"tee-1".to_string()));
        assert!(outfit.items.contains(&"coat-1".to_string()), "formal outfits include outerwear");
    }
}

#[test]
fn test_missing_mandatory_slot_reports_no_viable_outfit() {
    // No footwear at all
    let wardrobe = vec![
        garment("top-1", ClothingCategory::Top, ColorFamily::Blue, SizeBucket::Medium, 2, 0.3, false),
        garment("bottom-1", ClothingCategory::Bottom, ColorFamily::Gray, SizeBucket::Medium, 2, 0.4, false),
    ];
    let record = sized_record(40.0, 34.0);

    let result = recommend(&record, &wardrobe, &mild(), Occasion::Casual, &RecommendConfig::default());

    assert!(result.is_empty());
    assert_eq!(
        result.reason,
        RecommendReason::NoViableOutfit {
            slot: ClothingCategory::Footwear
        }
    );
}

#[test]
fn test_fit_prefers_matching_size() {
    let mut wardrobe = vec![
        garment("bottom-1", ClothingCategory::Bottom, ColorFamily::Gray, SizeBucket::Medium, 2, 0.4, false),
        garment("shoes-1", ClothingCategory::Footwear, ColorFamily::Black, SizeBucket::Medium, 2, 0.2, false),
    ];
    wardrobe.push(garment("top-fit", ClothingCategory::Top, ColorFamily::Blue, SizeBucket::Medium, 2, 0.3, false));
    wardrobe.push(garment("top-small", ClothingCategory::Top, ColorFamily::Blue, SizeBucket::Small, 2, 0.3, false));

    // 40 cm shoulders land in the medium bucket
    let record = sized_record(40.0, 34.0);

    let result = recommend(&record, &wardrobe, &mild(), Occasion::Casual, &RecommendConfig::default());

    let best = result.iter().next().unwrap();
    assert!(best.items.contains(&"top-fit".to_string()));
}

#[test]
fn test_precipitation_prefers_waterproof_outerwear() {
    let wardrobe = vec![
        garment("top-1", ClothingCategory::Top, ColorFamily::Blue, SizeBucket::Medium, 2, 0.3, false),
        garment("bottom-1", ClothingCategory::Bottom, ColorFamily::Gray, SizeBucket::Medium, 2, 0.4, false),
        garment("shoes-1", ClothingCategory::Footwear, ColorFamily::Black, SizeBucket::Medium, 2, 0.2, false),
        garment("rain-shell", ClothingCategory::Outerwear, ColorFamily::Green, SizeBucket::Medium, 2, 0.4, true),
        garment("wool-coat", ClothingCategory::Outerwear, ColorFamily::Brown, SizeBucket::Medium, 2, 0.8, false),
    ];
    let record = sized_record(40.0, 34.0);

    let result = recommend(&record, &wardrobe, &rainy(), Occasion::Casual, &RecommendConfig::default());

    assert_eq!(result.reason, RecommendReason::Complete);
    let best = result.iter().next().unwrap();
    assert!(best.items.contains(&"rain-shell".to_string()));
    // Rain makes outerwear mandatory, so every candidate carries one
    for outfit in result.iter() {
        let has_outerwear = outfit.items.iter().any(|id| id.contains("shell") || id.contains("coat"));
        assert!(has_outerwear);
    }
}

#[test]
fn test_wet_weather_scores_below_dry() {
    // Nothing in this wardrobe is waterproof
    let wardrobe = vec![
        garment("top-1", ClothingCategory::Top, ColorFamily::Blue, SizeBucket::Medium, 2, 0.3, false),
        garment("bottom-1", ClothingCategory::Bottom, ColorFamily::Gray, SizeBucket::Medium, 2, 0.4, false),
        garment("shoes-1", ClothingCategory::Footwear, ColorFamily::Black, SizeBucket::Medium, 2, 0.2, false),
        garment("coat-1", ClothingCategory::Outerwear, ColorFamily::Brown, SizeBucket::Medium, 2, 0.6, false),
    ];
    let record = sized_record(40.0, 34.0);
    let config = RecommendConfig::default();

    let dry = recommend(&record, &wardrobe, &mild(), Occasion::Casual, &config);
    let wet = recommend(&record, &wardrobe, &rainy(), Occasion::Casual, &config);

    let dry_best = dry.iter().next().unwrap();
    let wet_best = wet.iter().next().unwrap();
    assert!(wet_best.combined_score < dry_best.combined_score);
}

#[test]
fn test_recommendation_is_deterministic() {
    let wardrobe = vec![
        garment("top-1", ClothingCategory::Top, ColorFamily::Blue, SizeBucket::Medium, 2, 0.3, false),
        garment("top-2", ClothingCategory::Top, ColorFamily::Red, SizeBucket::Medium, 2, 0.3, false),
        garment("bottom-1", ClothingCategory::Bottom, ColorFamily::Gray, SizeBucket::Medium, 2, 0.4, false),
        garment("shoes-1", ClothingCategory::Footwear, ColorFamily::Black, SizeBucket::Medium, 2, 0.2, false),
    ];
    let record = sized_record(40.0, 34.0);
    let config = RecommendConfig::default();

    let first = recommend(&record, &wardrobe, &mild(), Occasion::Casual, &config);
    let second = recommend(&record, &wardrobe, &mild(), Occasion::Casual, &config);

    let a: Vec<_> = first.iter().map(|o| (&o.items, o.combined_score.to_bits())).collect();
    let b: Vec<_> = second.iter().map(|o| (&o.items, o.combined_score.to_bits())).collect();
    assert_eq!(a, b);
}

#[test]
fn test_top_k_truncation() {
    // Three tops, two bottoms, two shoes: 12 combinations before truncation
    let wardrobe = vec![
        garment("top-1", ClothingCategory::Top, ColorFamily::Blue, SizeBucket::Medium, 2, 0.3, false),
        garment("top-2", ClothingCategory::Top, ColorFamily::Red, SizeBucket::Medium, 2, 0.3, false),
        garment("top-3", ClothingCategory::Top, ColorFamily::Green, SizeBucket::Medium, 2, 0.3, false),
        garment("bottom-1", ClothingCategory::Bottom, ColorFamily::Gray, SizeBucket::Medium, 2, 0.4, false),
        garment("bottom-2", ClothingCategory::Bottom, ColorFamily::Black, SizeBucket::Medium, 2, 0.4, false),
        garment("shoes-1", ClothingCategory::Footwear, ColorFamily::Black, SizeBucket::Medium, 2, 0.2, false),
        garment("shoes-2", ClothingCategory::Footwear, ColorFamily::Brown, SizeBucket::Medium, 2, 0.2, false),
    ];
    let record = sized_record(40.0, 34.0);
    let config = RecommendConfig {
        top_k: 3,
        ..RecommendConfig::default()
    };

    let result = recommend(&record, &wardrobe, &mild(), Occasion::Casual, &config);
    assert_eq!(result.len(), 3);
}
