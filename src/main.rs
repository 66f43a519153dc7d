//! Command-line interface for wardrobe analysis and outfit recommendation.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use stylist_core::clothing::{ClothingAnalyzer, ClothingAttributeRecord, ClothingCategory, GarmentClassifier};
use stylist_core::config::Config;
use stylist_core::measurement::MeasurementRecord;
use stylist_core::recommend::{recommend, Occasion, RecommendReason, WeatherContext};
use stylist_core::store::{InMemoryWardrobeStore, WardrobeStore};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a garment photo into a wardrobe attribute record
    Analyze {
        /// Path to the garment image
        #[arg(short, long)]
        image: PathBuf,

        /// Item identifier for the record
        #[arg(long)]
        id: String,

        /// Garment category (top, bottom, outerwear, footwear, accessory)
        #[arg(long)]
        category: String,

        /// Wardrobe JSON file to update in place
        #[arg(short, long)]
        wardrobe: PathBuf,
    },

    /// Rank outfit combinations from a wardrobe file
    Recommend {
        /// Wardrobe JSON file
        #[arg(short, long)]
        wardrobe: PathBuf,

        /// Measurement record JSON file from a previous capture
        #[arg(short, long)]
        measurements: Option<PathBuf>,

        /// Occasion (casual, business, formal, athletic)
        #[arg(short, long, default_value = "casual")]
        occasion: String,

        /// Daily low in Celsius
        #[arg(long, default_value = "10.0")]
        temp_min: f64,

        /// Daily high in Celsius
        #[arg(long, default_value = "20.0")]
        temp_max: f64,

        /// Precipitation expected
        #[arg(long)]
        precipitation: bool,

        /// Wind speed in km/h
        #[arg(long, default_value = "10.0")]
        wind: f64,
    },

    /// Print an example configuration file
    ExampleConfig,
}

/// Classifier backed by the category the operator supplied on the command
/// line; automatic classification is an external capability
struct CliClassifier {
    category: ClothingCategory,
}

impl GarmentClassifier for CliClassifier {
    fn classify(&self, _image: &[u8]) -> stylist_core::Result<(ClothingCategory, f64)> {
        Ok((self.category, 1.0))
    }

    fn version(&self) -> &str {
        "cli-operator"
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    let config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path);
        match Config::from_file(config_path) {
            Ok(cfg) => {
                cfg.validate().context("invalid configuration")?;
                cfg
            }
            Err(e) => {
                log::warn!("Failed to load config file: {}. Using defaults.", e);
                Config::default()
            }
        }
    } else {
        Config::default()
    };

    match args.command {
        Command::Analyze {
            image,
            id,
            category,
            wardrobe,
        } => run_analyze(&image, &id, &category, &wardrobe),
        Command::Recommend {
            wardrobe,
            measurements,
            occasion,
            temp_min,
            temp_max,
            precipitation,
            wind,
        } => run_recommend(
            &config,
            &wardrobe,
            measurements.as_deref(),
            &occasion,
            WeatherContext {
                temp_min_c: temp_min,
                temp_max_c: temp_max,
                precipitation,
                wind_kph: wind,
            },
        ),
        Command::ExampleConfig => {
            print!("{}", stylist_core::config::EXAMPLE_CONFIG);
            Ok(())
        }
    }
}

fn parse_category(name: &str) -> Result<ClothingCategory> {
    Ok(match name.to_lowercase().as_str() {
        "top" => ClothingCategory::Top,
        "bottom" => ClothingCategory::Bottom,
        "outerwear" => ClothingCategory::Outerwear,
        "footwear" => ClothingCategory::Footwear,
        "accessory" => ClothingCategory::Accessory,
        other => anyhow::bail!("unknown category: {other}"),
    })
}

fn parse_occasion(name: &str) -> Result<Occasion> {
    Ok(match name.to_lowercase().as_str() {
        "casual" => Occasion::Casual,
        "business" => Occasion::Business,
        "formal" => Occasion::Formal,
        "athletic" => Occasion::Athletic,
        other => anyhow::bail!("unknown occasion: {other}"),
    })
}

fn load_wardrobe(path: &std::path::Path) -> Result<Vec<ClothingAttributeRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading wardrobe file {}", path.display()))?;
    serde_json::from_str(&content).context("parsing wardrobe file")
}

fn run_analyze(image: &std::path::Path, id: &str, category: &str, wardrobe_path: &std::path::Path) -> Result<()> {
    let category = parse_category(category)?;
    let bytes = std::fs::read(image).with_context(|| format!("reading image {}", image.display()))?;

    let analyzer = ClothingAnalyzer::new(Arc::new(CliClassifier { category }));
    let record = analyzer.analyze(id, &bytes)?;

    let store = InMemoryWardrobeStore::new();
    for item in load_wardrobe(wardrobe_path)? {
        store.upsert(item)?;
    }
    store.upsert(record.clone())?;
    let wardrobe = store.all()?;

    std::fs::write(wardrobe_path, serde_json::to_string_pretty(&wardrobe)?)
        .with_context(|| format!("writing wardrobe file {}", wardrobe_path.display()))?;

    println!("{}", serde_json::to_string_pretty(&record)?);
    info!("wardrobe now holds {} items", wardrobe.len());
    Ok(())
}

fn run_recommend(
    config: &Config,
    wardrobe_path: &std::path::Path,
    measurements_path: Option<&std::path::Path>,
    occasion: &str,
    weather: WeatherContext,
) -> Result<()> {
    let occasion = parse_occasion(occasion)?;
    let wardrobe = load_wardrobe(wardrobe_path)?;
    if wardrobe.is_empty() {
        anyhow::bail!("wardrobe file {} holds no items", wardrobe_path.display());
    }

    let measurements: MeasurementRecord = match measurements_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading measurement record {}", path.display()))?;
            serde_json::from_str(&content).context("parsing measurement record")?
        }
        None => {
            log::warn!("no measurement record supplied; fit predictions will be neutral");
            MeasurementRecord {
                id: uuid::Uuid::new_v4(),
                subject: "unknown".to_string(),
                measurements: std::collections::BTreeMap::new(),
                confidence: 0.0,
                derived_at: chrono::Utc::now(),
                method_version: stylist_core::constants::MEASUREMENT_METHOD_VERSION.to_string(),
            }
        }
    };

    let result = recommend(&measurements, &wardrobe, &weather, occasion, &config.recommend);

    match result.reason {
        RecommendReason::NoViableOutfit { slot } => {
            println!("No viable outfit: no eligible {slot:?} item for this occasion.");
        }
        RecommendReason::Complete => {
            for (rank, outfit) in result.iter().enumerate() {
                println!(
                    "#{} score {:.3} (fit {:.2}, weather {:.2}, confidence {:.2}): {}",
                    rank + 1,
                    outfit.combined_score,
                    outfit.fit_score,
                    outfit.weather_score,
                    outfit.fit_confidence,
                    outfit.items.join(" + ")
                );
            }
        }
    }
    Ok(())
}
