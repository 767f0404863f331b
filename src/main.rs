use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use clap::Parser;
use streamchat::api::AppState;
use streamchat::cli::{commands::{Cli, Commands}, run_cli};
use streamchat::config::AppConfig;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match AppConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if !matches!(cli.command, Commands::Serve) {
        if let Err(e) = run_cli(cli.command, config).await {
            error!("{}", e);
            std::process::exit(1);
        }
        return Ok(());
    }

    info!("Starting streamchat proxy...");

    let host = config.server.host.clone();
    let port = config.server.port;
    let state = web::Data::new(AppState::from_config(config));

    info!("Server listening on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Cors::permissive())
            .wrap(Logger::default())
            .configure(streamchat::api::routes::configure)
    })
    .bind((host, port))?
    .run()
    .await
}
