use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use cityshop_backend::db::connection;
use cityshop_backend::db::repository::PgCatalog;
use cityshop_backend::handlers::{self, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = connection::load_settings();
    let pool = connection::init_pool(&settings);
    connection::run_migrations(&pool);

    let catalog = Arc::new(PgCatalog::new(pool));
    let state = web::Data::new(AppState {
        categories: catalog.clone(),
        products: catalog,
    });

    tracing::info!(address = %settings.bind_address, "starting catalog server");

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .app_data(web::PayloadConfig::new(20 * 1024 * 1024))
            .configure(handlers::configure)
    })
    .bind(settings.bind_address)?
    .run()
    .await
}
