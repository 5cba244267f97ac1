use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use distance_calculator::config::{LoggingSettings, Settings};
use distance_calculator::routes::{self, AppState};
use distance_calculator::services::{AddressCleaner, CaptchaVerifier, GeocodingClient, PostgresClient};
use distance_calculator::QueryPipeline;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingSettings) {
    // RUST_LOG takes precedence over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    match logging.format.as_str() {
        "pretty" => subscriber.pretty().init(),
        "json" => subscriber.json().init(),
        _ => subscriber.init(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;

    init_logging(&settings.logging);

    info!("Starting Distance Calculator service...");

    // One HTTP client shared by every upstream integration
    let http = reqwest::Client::builder().build().map_err(|e| {
        error!("Failed to create HTTP client: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e)
    })?;

    let captcha = CaptchaVerifier::new(http.clone(), &settings.captcha);
    let cleaner = AddressCleaner::new(http.clone(), &settings.cleaner);
    let geocoder = GeocodingClient::new(http, &settings.geocoding);

    if cleaner.is_enabled() {
        info!("Address cleaning enabled (model: {})", settings.cleaner.model);
    } else {
        info!("Address cleaning disabled, addresses are geocoded as entered");
    }

    // Initialize PostgreSQL client
    let postgres = Arc::new(PostgresClient::from_settings(&settings.database).await.map_err(|e| {
        error!("Failed to connect to PostgreSQL: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e)
    })?);

    info!("PostgreSQL client initialized");

    let pipeline = Arc::new(QueryPipeline::new(captcha, cleaner, geocoder, Arc::clone(&postgres)));

    // Build application state
    let app_state = AppState {
        pipeline,
        history: settings.history.clone(),
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    let result = HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes::<PostgresClient>)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await;

    info!("HTTP server stopped, closing database pool");
    postgres.close().await;

    result
}
