use actix_cors::Cors;
use actix_files::{Files, NamedFile};
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::sync::Arc;

mod config;
mod db;
mod handlers;
mod models;
mod services;

use config::Config;

async fn index(state: web::Data<models::AppState>) -> actix_web::Result<NamedFile> {
    let static_path = state.config.static_files_path.as_deref().unwrap_or("./static");
    Ok(NamedFile::open(format!("{}/index.html", static_path))?)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    log::info!("Starting server at {}:{}", config.host, config.port);

    if let Some(ref path) = config.static_files_path {
        log::info!("Serving static files from: {}", path);
    }

    let pool = db::connect(&config.database_url).await.map_err(|e| {
        log::error!("Failed to create database pool: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    db::run_migrations(&pool).await.map_err(|e| {
        log::error!("Failed to run migrations: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    log::info!("Database migrations completed");

    match services::tasks::seed_default_catalog(&pool).await {
        Ok(0) => {}
        Ok(count) => log::info!("Seeded catalog with {} tasks", count),
        Err(e) => log::error!("Failed to seed catalog: {}", e),
    }

    // Clean the catalog once before serving, then daily
    if let Err(e) = services::maintenance::run_maintenance(&pool).await {
        log::error!("Startup catalog cleanup failed: {}", e);
    }

    let pool_for_scheduler = Arc::new(pool.clone());
    let job_config = services::maintenance::JobConfig::from(&config);
    tokio::spawn(async move {
        services::maintenance::start_scheduler(pool_for_scheduler, job_config).await;
    });

    let app_state = web::Data::new(models::AppState {
        db: pool,
        config: config.clone(),
    });

    let static_files_path = config.static_files_path.clone();
    let allowed_origins = config.cors_origins.clone();

    HttpServer::new(move || {
        let allowed_origins = allowed_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _req_head| {
                let origin_str = origin.to_str().unwrap_or("");
                allowed_origins
                    .iter()
                    .any(|allowed| origin_str.starts_with(allowed.as_str()))
            })
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec!["Content-Type"])
            .max_age(3600);

        let mut app = App::new()
            .app_data(app_state.clone())
            .wrap(Logger::default())
            .wrap(cors)
            .configure(handlers::configure_routes);

        // Serve static files if path is configured
        if let Some(ref path) = static_files_path {
            app = app
                .service(Files::new("/assets", format!("{}/assets", path)))
                .default_service(web::route().to(index));
        }

        app
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
