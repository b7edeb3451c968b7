mod accounts;
mod appointments;
mod auth;
mod billing;
mod config;
mod db;
mod error;
mod models;
mod payments;
mod revenue;
mod routes;
mod services;
mod state;
mod store;
mod templates;

use std::sync::Arc;

use actix_files::Files;
use actix_web::{middleware, web, App, HttpServer};

use crate::{config::Config, payments::StripeClient, state::AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(err) = run().await {
        eprintln!("Startup error: {err}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    let config = Config::load();
    let pool = db::connect(&config.database_url).await?;
    let payments = Arc::new(StripeClient::new(&config.stripe));
    let address = format!("0.0.0.0:{}", config.port);
    let state = AppState::new(pool.clone(), payments, config);

    log::info!("Starting BarberDesk on http://{address}");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(middleware::Logger::default())
            .service(Files::new("/static", "./static").prefer_utf8(true))
            .configure(routes::public::configure)
            .configure(routes::dashboard::configure)
            .configure(routes::billing::configure)
    })
    .bind(address)?
    .run()
    .await?;

    pool.close().await;
    Ok(())
}
