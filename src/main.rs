use crate::client::api_football::ApiFootballClient;
use crate::client::rate_limiter::RateLimiter;
use crate::client::FootballDataSource;
use crate::config::config::{Config, StorageBackend};
use crate::models::response::ErrorResponse;
use crate::repository::database::Database;
use crate::repository::memory::MemoryStore;
use crate::repository::Store;
use crate::service::entity::Pagination;
use crate::service::orchestrator::Orchestrator;
use crate::service::Services;
use crate::util::real_ip_key_extractor::RealIpKeyExtractor;
use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{get, web, App, HttpResponse, HttpServer, Responder, Result};
use log::{info, warn};
use serde::Serialize;
use std::io;
use std::sync::Arc;

mod client;
mod config;
mod controller;
mod models;
mod repository;
mod service;
mod util;

#[derive(Serialize)]
pub struct Response {
    status: String,
    message: String,
}

#[get("/health")]
async fn health_check() -> impl Responder {
    let response = Response {
        status: "Success".to_string(),
        message: "Everything is working as expected".to_string(),
    };
    HttpResponse::Ok().json(response)
}

async fn not_found() -> Result<HttpResponse> {
    let response = ErrorResponse {
        detail: "Resource not found".to_string(),
        status_code: 404,
    };
    Ok(HttpResponse::NotFound().json(response))
}

pub struct AppState<S: Store> {
    pub store: S,
    pub services: Services,
    pub orchestrator: Orchestrator,
}

impl<S: Store> AppState<S> {
    pub fn new(store: S, services: Services, source: Arc<dyn FootballDataSource>) -> Self {
        AppState {
            store,
            services,
            orchestrator: Orchestrator::new(source, services),
        }
    }
}

fn startup_error<E: std::fmt::Display>(err: E) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let config = match Config::init() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Invalid configuration: {err}");
            return Err(io::Error::new(io::ErrorKind::InvalidInput, err.to_string()));
        }
    };
    log4rs::init_file(&config.log_config, Default::default()).map_err(startup_error)?;

    let limiter = Arc::new(RateLimiter::per_minute(config.api_football_rate_limit));
    let client = ApiFootballClient::new(&config, limiter).map_err(startup_error)?;
    let source: Arc<dyn FootballDataSource> = Arc::new(client);
    let services = Services::new(Pagination::new(config.max_page_size));

    match config.storage_backend {
        StorageBackend::Postgres => {
            let db = Database::new(&config).map_err(startup_error)?;
            serve(db, services, source, &config).await
        }
        StorageBackend::Memory => {
            warn!("Using the in-memory store, nothing survives a restart");
            serve(MemoryStore::new(), services, source, &config).await
        }
    }
}

async fn serve<S: Store>(
    store: S,
    services: Services,
    source: Arc<dyn FootballDataSource>,
    config: &Config,
) -> io::Result<()> {
    let app_data = web::Data::new(AppState::new(store, services, source));

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(1)
        .burst_size(30)
        .key_extractor(RealIpKeyExtractor::new(config.trusted_proxy_ip))
        .finish()
        .ok_or_else(|| startup_error("invalid inbound rate limit"))?;

    info!(
        "Listening on {}:{} ({:?} storage)",
        config.server_host, config.server_port, config.storage_backend
    );
    HttpServer::new(move || {
        App::new()
            .app_data(app_data.clone())
            .configure(controller::handler::config::<S>)
            .service(health_check)
            .default_service(web::route().to(not_found))
            .wrap(actix_web::middleware::Logger::default())
            .wrap(Governor::new(&governor_conf))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
