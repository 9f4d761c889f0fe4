use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use brewfinder::routes::{router, AppState};
use brewfinder::{Config, GoogleGeocoder, LocationDatabase};
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Path to the locations CSV file (id,name,address,lat,lng).
    #[arg(short, long, default_value = "data/locations.csv")]
    data: PathBuf,

    /// Optional JSON config file; defaults apply for anything omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "brewfinder=info,info".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            Config::from_file(path)?
        }
        None => Config::default(),
    };
    if let Ok(key) = std::env::var("GEOCODE_API_KEY") {
        config.geocode_api_key = Some(key);
    }

    let db = LocationDatabase::load(&args.data)?;
    info!(count = db.len()?, "location database ready");

    let geocoder = GoogleGeocoder::new(
        config.geocode_endpoint.clone(),
        config.geocode_api_key.clone().unwrap_or_default(),
    )?;

    let state = AppState {
        db,
        geocoder: Arc::new(geocoder),
        config: Arc::new(config),
    };

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for ctrl_c signal");
}
