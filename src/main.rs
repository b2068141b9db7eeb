use anyhow::{bail, Context};
use busy_routes::{
    sdk::config::{key_from_query, AppConfig},
    sdk::render::Palette,
    sdk::routes::combine::combine_datasets,
    sdk::routes::generate::{generate_dataset, Jitter, DEFAULT_JITTER_DEG},
    sdk::routing::Outcome,
    sdk::session::Session,
    sdk::transit::{HttpOverpassClient, OverpassClient, TransitNetwork},
    sdk::transit::overpass::{subway_query, NYC_BBOX},
    sdk::util::log::init_logging,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Draws the ten busiest road segments of the city, plus an optional subway overlay
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    sources: Sources,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct Sources {
    /// Merged dataset (path or URL); overrides BUSY_ROUTES_PRIMARY
    #[arg(long, global = true)]
    primary: Option<String>,

    /// Single-source dataset used when the merged one is unavailable
    #[arg(long, global = true)]
    fallback: Option<String>,

    /// OSRM server base URL
    #[arg(long, global = true)]
    osrm_url: Option<String>,

    /// Overpass interpreter URL
    #[arg(long, global = true)]
    overpass_url: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load, rank and resolve the busiest routes and write the map as GeoJSON
    Render {
        #[arg(short, long, default_value = "map.geojson")]
        out: PathBuf,

        /// Also draw the subway overlay
        #[arg(long)]
        transit: bool,

        /// Page query string, e.g. "?key=..." for the traffic tile overlay
        #[arg(long)]
        query: Option<String>,
    },
    /// Print the detail panel of the route at rank N (1-based)
    Panel {
        #[arg(short, long)]
        index: usize,
    },
    /// Fetch the subway overlay only
    Transit {
        #[arg(short, long, default_value = "subway.geojson")]
        out: PathBuf,
    },
    /// Build the sampled-geometry dataset from the top-routes CSV
    Generate {
        #[arg(long, default_value = "top100_routes.csv")]
        input: PathBuf,
        #[arg(short, long, default_value = "busy_roads.json")]
        out: PathBuf,
        /// Jitter the sampled points with this seed; straight lines when omitted
        #[arg(long)]
        seed: Option<u64>,
        /// Jitter standard deviation in degrees
        #[arg(long, default_value_t = DEFAULT_JITTER_DEG)]
        sigma: f64,
    },
    /// Merge the two ranked CSV exports into the combined dataset
    Combine {
        #[arg(long)]
        primary: PathBuf,
        #[arg(long)]
        secondary: PathBuf,
        /// Existing dataset whose sampled route points are reused
        #[arg(long, default_value = "busy_roads.json")]
        geometry: PathBuf,
        #[arg(short, long, default_value = "combined_routes.json")]
        out: PathBuf,
    },
}

fn build_config(sources: Sources, query: Option<&str>) -> AppConfig {
    let mut config = AppConfig::from_env();
    if let Some(primary) = sources.primary {
        config.primary_dataset = primary;
    }
    if let Some(fallback) = sources.fallback {
        config.fallback_dataset = fallback;
    }
    if let Some(url) = sources.osrm_url {
        config.osrm_base_url = url;
    }
    if let Some(url) = sources.overpass_url {
        config.overpass_url = url;
    }
    // a key in the page query wins over the environment
    if let Some(key) = query.and_then(key_from_query) {
        config.traffic_tile_key = Some(key);
    }
    config
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_logging();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Render {
            out,
            transit,
            query,
        } => {
            let config = build_config(cli.sources, query.as_deref());
            let mut session = Session::from_config(&config)?;
            session.init_map(config.traffic_tile_key.as_deref());

            let outcomes = session.render_routes().await?;
            let routed = outcomes
                .iter()
                .filter(|o| matches!(o, Outcome::Routed))
                .count();
            log::info!(
                "{} routes drawn ({} routed, {} approximate)",
                outcomes.len(),
                routed,
                outcomes.len() - routed
            );

            if transit {
                // a failed overlay is already on the status line
                let _ = session.toggle_transit(true).await;
            }
            if let Some(message) = session.status().message() {
                log::warn!("{}", message);
            }

            let map = session.map().context("Map was not initialised")?;
            map.write_to(&out)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            log::info!("Map written to {}", out.display());
        }
        Command::Panel { index } => {
            if index == 0 {
                bail!("Route numbers start at 1");
            }
            let config = build_config(cli.sources, None);
            let mut session = Session::from_config(&config)?;
            session.store().load().await;
            println!("{}", session.show_panel(index - 1));
        }
        Command::Transit { out } => {
            let config = build_config(cli.sources, None);
            let client = HttpOverpassClient::new(config.overpass_url.clone())?;
            let response = client.query(&subway_query(&NYC_BBOX)).await?;
            let network = TransitNetwork::assemble(&response, &Palette::default())?;
            for line in network.lines() {
                log::info!("{} [{}]: {} ways", line.label, line.color, line.ways.len());
            }
            let json = serde_json::to_string_pretty(&network.to_feature_collection())?;
            std::fs::write(&out, json)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            log::info!("Subway overlay written to {}", out.display());
        }
        Command::Generate {
            input,
            out,
            seed,
            sigma,
        } => {
            let jitter = seed.map(|seed| Jitter {
                sigma_deg: sigma,
                seed,
            });
            let written = generate_dataset(&input, &out, jitter)?;
            log::info!("Generated {} with {} routes", out.display(), written);
        }
        Command::Combine {
            primary,
            secondary,
            geometry,
            out,
        } => {
            let written = combine_datasets(&primary, &secondary, &geometry, &out)?;
            log::info!("Wrote {} routes to {}", written, out.display());
        }
    }

    Ok(())
}
