mod error;
mod handlers;
mod inference;
mod models;
mod predict;
mod preprocess;

use std::path::PathBuf;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::inference::ModelSet;

#[derive(Parser)]
#[command(name = "neuroscan")]
#[command(about = "HTTP inference service for brain-scan classification models")]
struct Args {
    /// Server bind address
    #[arg(long, default_value = "0.0.0.0:5000")]
    bind: String,

    /// Directory holding the model artifacts
    #[arg(long, default_value = "models")]
    models_dir: PathBuf,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_target(false)
        .init();

    let models = web::Data::new(ModelSet::load(&args.models_dir));
    if models.is_empty() {
        tracing::warn!(
            "no models loaded from {}; every /predict call will be rejected",
            args.models_dir.display()
        );
    }

    tracing::info!("server running at http://{}", args.bind);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        App::new()
            .wrap(cors)
            .app_data(models.clone())
            .configure(handlers::routes)
    })
    .bind(&args.bind)?
    .run()
    .await
}
