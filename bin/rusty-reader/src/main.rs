//! # Rusty-Reader Binary
//!
//! The entry point that assembles the application based on compile-time features.

mod config;

use actix_web::{web, App, HttpServer};
use rr_api::handlers::AppState;
use rr_api::middleware::{cors_policy, standard_middleware};
use rr_core::ContentStore;

use crate::config::AppConfig;

// Feature-gated imports: each store plugin is compiled in on demand
#[cfg(feature = "db-sqlite")]
use rr_db_sqlite::SqliteContentStore;

#[cfg(not(feature = "db-sqlite"))]
compile_error!("rusty-reader needs a content store plugin; enable the `db-sqlite` feature");

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env()?;

    // 1. Initialize the store implementation
    #[cfg(feature = "db-sqlite")]
    let store: Box<dyn ContentStore> =
        Box::new(SqliteContentStore::connect(&config.database_url, config.db_max_connections).await?);

    // 2. Wrap in AppState (dynamic dispatch keeps the API crate plugin-agnostic)
    let state = web::Data::new(AppState { store });

    log::info!("Rusty-Reader starting on http://{}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(standard_middleware())
            .wrap(cors_policy())
            .configure(rr_api::configure_routes)
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
