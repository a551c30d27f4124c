use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use campdir::config::config;
use campdir::db;
use campdir::geo::{DisabledGeocoder, Geocoder, HttpGeocoder};
use campdir::handlers;
use campdir::mail::PgMailbox;
use campdir::seed;
use campdir::state::AppState;
use campdir::uploads::PhotoStore;

#[derive(Parser)]
#[command(name = "campdir")]
#[command(about = "Bootcamp directory API server")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve,

    #[command(about = "Load fixture data into the database")]
    Seed {
        #[arg(long, default_value = "fixtures", help = "Directory of fixture JSON files")]
        dir: PathBuf,
    },

    #[command(about = "Delete all rows from every table")]
    Flush,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL and friends.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campdir=debug,tower_http=debug".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = config();
    tracing::info!("starting campdir in {:?} mode", config.environment);

    let pool = db::connect().await?;
    db::migrate(&pool).await?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(pool).await,
        Commands::Seed { dir } => {
            let report = seed::seed(&pool, &dir).await?;
            tracing::info!(
                "seeded {} users, {} bootcamps, {} courses, {} reviews",
                report.users,
                report.bootcamps,
                report.courses,
                report.reviews
            );
            Ok(())
        }
        Commands::Flush => {
            seed::flush(&pool).await?;
            tracing::info!("all tables flushed");
            Ok(())
        }
    }
}

async fn serve(pool: sqlx::PgPool) -> anyhow::Result<()> {
    let geocoder: Arc<dyn Geocoder> = if config().geocoder.endpoint.is_empty() {
        tracing::warn!("no geocoder endpoint configured, address lookups disabled");
        Arc::new(DisabledGeocoder)
    } else {
        Arc::new(HttpGeocoder::from_config()?)
    };

    let state = AppState {
        mailbox: Arc::new(PgMailbox::new(pool.clone())),
        photos: PhotoStore::from_config(),
        geocoder,
        pool,
    };

    let app = handlers::router(state);

    // Allow tests or deployments to override port via env
    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(5000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
