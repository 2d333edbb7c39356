use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use campus_locator::config::Settings;
use campus_locator::fusion::FusionWeights;
use campus_locator::geo::{format_coords, Coordinate};
use campus_locator::inference::{build_classifier, ImageTensor};
use campus_locator::location::nearest_with_cutoff;
use campus_locator::outcome::locate;
use campus_locator::server::{self, AppState};

/// Campus Locator: hybrid image + GPS landmark prediction
///
/// Examples:
///   campus-locator serve --port 5000
///   campus-locator locate --lat 12.8622 --lon 77.4389
///   campus-locator locate --image gate.jpg --lat 12.8638 --lon 77.4349 --gps-weight 30 --ai-weight 70
///   campus-locator catalog
#[derive(Parser)]
#[command(name = "campus-locator", version, about, long_about = None)]
struct Cli {
    /// Config file (TOML). Defaults to ~/.campus-locator/config.toml.
    #[arg(long, global = true, env = "CAMPUS_LOCATOR_CONFIG")]
    config: Option<PathBuf>,

    /// API key for the remote classifier. Overrides the config file.
    #[arg(long, global = true, env = "CAMPUS_LOCATOR_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP prediction server.
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long, short)]
        port: Option<u16>,
    },
    /// Predict a location once and print the result as JSON.
    Locate {
        /// Latitude (-90 to 90).
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        /// Longitude (-180 to 180).
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,
        /// Photo of the landmark.
        #[arg(long)]
        image: Option<PathBuf>,
        #[arg(long)]
        gps_weight: Option<u32>,
        #[arg(long)]
        ai_weight: Option<u32>,
    },
    /// Print the active landmark catalog as JSON.
    Catalog,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campus_locator=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(key) = cli.api_key {
        settings.classifier.api_key = Some(key);
    }

    match cli.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                settings.server.host = host;
            }
            if let Some(port) = port {
                settings.server.port = port;
            }
            serve(settings)
        }
        Command::Locate {
            lat,
            lon,
            image,
            gps_weight,
            ai_weight,
        } => locate_once(&settings, lat, lon, image, gps_weight, ai_weight),
        Command::Catalog => {
            let catalog = settings.load_catalog().context("Failed to load catalog")?;
            println!("{}", serde_json::to_string_pretty(&catalog)?);
            Ok(())
        }
    }
}

fn serve(settings: Settings) -> Result<()> {
    let catalog = settings.load_catalog().context("Failed to load catalog")?;
    info!(locations = catalog.len(), "catalog loaded");

    let classifier = build_classifier(&settings.classifier).context("Failed to initialize classifier")?;
    let state = AppState::new(settings, catalog, classifier);

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime
        .block_on(server::start(state))
        .context("Server error")
}

fn locate_once(
    settings: &Settings,
    lat: Option<f64>,
    lon: Option<f64>,
    image: Option<PathBuf>,
    gps_weight: Option<u32>,
    ai_weight: Option<u32>,
) -> Result<()> {
    let catalog = settings.load_catalog().context("Failed to load catalog")?;

    let point = match (lat, lon) {
        (Some(lat), Some(lon)) => match Coordinate::checked(lat, lon) {
            Some(c) => Some(c),
            None => bail!("Invalid coordinates. Lat: -90..90, Lon: -180..180"),
        },
        (None, None) => None,
        _ => bail!("--lat and --lon must be given together"),
    };

    let ai = match image {
        Some(path) => {
            let bytes = std::fs::read(&path).with_context(|| format!("Cannot read {}", path.display()))?;
            let tensor = ImageTensor::decode(&bytes).with_context(|| format!("Cannot decode {}", path.display()))?;
            match build_classifier(&settings.classifier).context("Failed to initialize classifier")? {
                Some(classifier) => Some(classifier.classify(&tensor)),
                None => {
                    warn!("no visual classifier configured, ignoring --image");
                    None
                }
            }
        }
        None => None,
    };

    let gps = point.map(|p| {
        eprintln!("  \u{1F4D0} {}", format_coords(p));
        nearest_with_cutoff(p, &catalog, settings.fusion.max_distance_m)
    });

    let defaults = settings.fusion.weights();
    let weights = FusionWeights::new(
        gps_weight.unwrap_or(defaults.gps),
        ai_weight.unwrap_or(defaults.ai),
    );

    let outcome = locate(ai.as_ref(), gps.as_ref(), weights)?;
    eprintln!(
        "  \u{1F4CD} {} ({}, {:.1}%)",
        outcome.predicted_class(),
        outcome.method(),
        outcome.confidence() * 100.0
    );
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
